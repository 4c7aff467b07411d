//! WebSocket clients for Alpaca market data and trade updates

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, instrument, warn};

use super::auth::stream_auth_payload;
use super::messages::*;
use crate::common::errors::{ClientError, Result};
use crate::common::types::{OrderEventKind, OrderUpdateEvent, TickEvent};
use crate::config::types::ApiCredentials;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;
type WsRead = SplitStream<WsStream>;

/// How long to wait for the server to confirm authentication
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
/// How long to wait for a stream task to wind down on unsubscribe
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A running stream task and its stop signal
struct StreamHandle {
    shutdown: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl StreamHandle {
    async fn stop(self) {
        let _ = self.shutdown.send(()).await;
        let mut task = self.task;
        if timeout(SHUTDOWN_TIMEOUT, &mut task).await.is_err() {
            warn!("Stream task did not stop in time, aborting");
            task.abort();
        }
    }
}

/// Decoded trading stream message
#[derive(Debug, Clone, PartialEq)]
enum TradingFrame {
    Authorized,
    Unauthorized(String),
    Listening(Vec<String>),
    OrderUpdate(OrderUpdateEvent),
    Other(String),
}

/// WebSocket client for Alpaca's market data and trading streams
pub struct AlpacaStreamClient {
    /// Market data URL including the feed, e.g. `.../v2/iex`
    data_url: String,
    /// Trading stream URL
    trading_url: String,
    credentials: ApiCredentials,
    tick_stream: Mutex<Option<StreamHandle>>,
    order_stream: Mutex<Option<StreamHandle>>,
}

impl AlpacaStreamClient {
    pub fn new(data_stream_url: &str, feed: &str, trading_url: &str, credentials: ApiCredentials) -> Self {
        Self {
            data_url: format!("{}/{}", data_stream_url.trim_end_matches('/'), feed),
            trading_url: trading_url.to_string(),
            credentials,
            tick_stream: Mutex::new(None),
            order_stream: Mutex::new(None),
        }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Check whether the tick stream task is alive
    pub async fn is_streaming_ticks(&self) -> bool {
        self.tick_stream
            .lock()
            .await
            .as_ref()
            .map(|handle| !handle.task.is_finished())
            .unwrap_or(false)
    }

    async fn connect(url: &str) -> Result<(WsWrite, WsRead)> {
        info!("Connecting to Alpaca WebSocket: {}", url);
        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| ClientError::WebSocketConnection(e.to_string()))?;
        info!("WebSocket connection established");
        Ok(ws_stream.split())
    }

    // ========================================================================
    // Market Data
    // ========================================================================

    /// Connect, authenticate and subscribe to trades for `symbol`
    ///
    /// Spawns a task that forwards trades as `TickEvent`s until unsubscribed
    /// or the connection closes.
    #[instrument(skip(self, sender))]
    pub async fn subscribe_trades(&self, symbol: &str, sender: mpsc::Sender<TickEvent>) -> Result<()> {
        let mut slot = self.tick_stream.lock().await;
        if let Some(previous) = slot.take() {
            previous.stop().await;
        }

        let (mut write, mut read) = Self::connect(&self.data_url).await?;

        write
            .send(Message::Text(stream_auth_payload(&self.credentials)?))
            .await?;
        timeout(HANDSHAKE_TIMEOUT, Self::await_data_authentication(&mut read))
            .await
            .map_err(|_| ClientError::Authentication("timed out waiting for data stream auth".to_string()))??;

        let subscribe = serde_json::to_string(&DataSubscriptionMessage::subscribe(symbol))?;
        debug!("Sending subscription message: {}", subscribe);
        write.send(Message::Text(subscribe)).await?;

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let symbol = symbol.to_string();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        if let Ok(text) = serde_json::to_string(&DataSubscriptionMessage::unsubscribe(&symbol)) {
                            let _ = write.send(Message::Text(text)).await;
                        }
                        let _ = write.send(Message::Close(None)).await;
                        info!(symbol = %symbol, "Tick stream closed");
                        break;
                    }
                    msg = read.next() => {
                        let text = match msg {
                            Some(Ok(msg)) => match frame_text(msg) {
                                FrameText::Text(text) => text,
                                FrameText::Skip => continue,
                                FrameText::Closed(reason) => {
                                    info!("WebSocket closed: {:?}", reason);
                                    break;
                                }
                            },
                            Some(Err(e)) => {
                                error!("WebSocket error: {}", e);
                                break;
                            }
                            None => {
                                info!("WebSocket stream ended");
                                break;
                            }
                        };

                        match Self::parse_data_frame(&text) {
                            Ok(messages) => {
                                for message in messages {
                                    if let Some(tick) = Self::handle_data_message(message) {
                                        if sender.send(tick).await.is_err() {
                                            debug!("Tick receiver dropped");
                                            return;
                                        }
                                    }
                                }
                            }
                            Err(e) => warn!("Failed to parse message: {} - {}", e, text),
                        }
                    }
                }
            }
        });

        *slot = Some(StreamHandle {
            shutdown: shutdown_tx,
            task,
        });
        Ok(())
    }

    /// Stop the trade stream, if one is running
    pub async fn unsubscribe_trades(&self) -> Result<()> {
        if let Some(handle) = self.tick_stream.lock().await.take() {
            handle.stop().await;
        }
        Ok(())
    }

    async fn await_data_authentication(read: &mut WsRead) -> Result<()> {
        while let Some(msg) = read.next().await {
            let text = match frame_text(msg?) {
                FrameText::Text(text) => text,
                FrameText::Skip => continue,
                FrameText::Closed(reason) => {
                    return Err(ClientError::WebSocketConnection(format!(
                        "closed during handshake: {:?}",
                        reason
                    )))
                }
            };
            for message in Self::parse_data_frame(&text)? {
                match message {
                    DataStreamMessage::Success { msg } if msg == "authenticated" => return Ok(()),
                    DataStreamMessage::Error { code, msg } => {
                        return Err(ClientError::Authentication(format!("{} ({})", msg, code)))
                    }
                    other => debug!(?other, "Handshake message"),
                }
            }
        }
        Err(ClientError::WebSocketConnection(
            "stream ended during handshake".to_string(),
        ))
    }

    /// Parse a market data frame (a JSON array of messages)
    ///
    /// A frame that is not an array is an error. Elements that fail to decode
    /// are logged and dropped so the rest of the batch still gets through.
    fn parse_data_frame(text: &str) -> Result<Vec<DataStreamMessage>> {
        let elements: Vec<serde_json::Value> = serde_json::from_str(text)?;
        Ok(elements
            .into_iter()
            .filter_map(|element| match serde_json::from_value(element.clone()) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!("Dropping malformed data message: {} - {}", e, element);
                    None
                }
            })
            .collect())
    }

    fn handle_data_message(message: DataStreamMessage) -> Option<TickEvent> {
        match message {
            DataStreamMessage::Trade(trade) => Some(TickEvent {
                symbol: trade.symbol,
                price: trade.price,
                timestamp: trade.timestamp,
            }),
            DataStreamMessage::Subscription { trades } => {
                info!(?trades, "Trade subscription confirmed");
                None
            }
            DataStreamMessage::Error { code, msg } => {
                error!(code, "Market data stream error: {}", msg);
                None
            }
            DataStreamMessage::Success { msg } => {
                debug!("Market data stream: {}", msg);
                None
            }
            DataStreamMessage::Other => None,
        }
    }

    // ========================================================================
    // Trade Updates
    // ========================================================================

    /// Connect, authenticate and listen to `trade_updates`
    #[instrument(skip(self, sender))]
    pub async fn subscribe_trade_updates(&self, sender: mpsc::Sender<OrderUpdateEvent>) -> Result<()> {
        let mut slot = self.order_stream.lock().await;
        if let Some(previous) = slot.take() {
            previous.stop().await;
        }

        let (mut write, mut read) = Self::connect(&self.trading_url).await?;

        write
            .send(Message::Text(stream_auth_payload(&self.credentials)?))
            .await?;
        timeout(HANDSHAKE_TIMEOUT, Self::await_trading_authentication(&mut read))
            .await
            .map_err(|_| ClientError::Authentication("timed out waiting for trading stream auth".to_string()))??;

        let listen = serde_json::to_string(&ListenMessage::trade_updates())?;
        write.send(Message::Text(listen)).await?;

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        let _ = write.send(Message::Close(None)).await;
                        info!("Trade update stream closed");
                        break;
                    }
                    msg = read.next() => {
                        let text = match msg {
                            Some(Ok(msg)) => match frame_text(msg) {
                                FrameText::Text(text) => text,
                                FrameText::Skip => continue,
                                FrameText::Closed(reason) => {
                                    info!("WebSocket closed: {:?}", reason);
                                    break;
                                }
                            },
                            Some(Err(e)) => {
                                error!("WebSocket error: {}", e);
                                break;
                            }
                            None => {
                                info!("WebSocket stream ended");
                                break;
                            }
                        };

                        match Self::parse_trading_message(&text) {
                            Ok(TradingFrame::OrderUpdate(update)) => {
                                if sender.send(update).await.is_err() {
                                    debug!("Order update receiver dropped");
                                    return;
                                }
                            }
                            Ok(TradingFrame::Listening(streams)) => info!(?streams, "Listening"),
                            Ok(TradingFrame::Unauthorized(status)) => {
                                error!(status = %status, "Trading stream lost authorization");
                                break;
                            }
                            Ok(other) => debug!(?other, "Trading stream message"),
                            Err(e) => warn!("Failed to parse message: {} - {}", e, text),
                        }
                    }
                }
            }
        });

        *slot = Some(StreamHandle {
            shutdown: shutdown_tx,
            task,
        });
        Ok(())
    }

    /// Stop the trade update stream, if one is running
    pub async fn unsubscribe_trade_updates(&self) -> Result<()> {
        if let Some(handle) = self.order_stream.lock().await.take() {
            handle.stop().await;
        }
        Ok(())
    }

    async fn await_trading_authentication(read: &mut WsRead) -> Result<()> {
        while let Some(msg) = read.next().await {
            let text = match frame_text(msg?) {
                FrameText::Text(text) => text,
                FrameText::Skip => continue,
                FrameText::Closed(reason) => {
                    return Err(ClientError::WebSocketConnection(format!(
                        "closed during handshake: {:?}",
                        reason
                    )))
                }
            };
            match Self::parse_trading_message(&text)? {
                TradingFrame::Authorized => return Ok(()),
                TradingFrame::Unauthorized(status) => {
                    return Err(ClientError::Authentication(format!("trading stream: {}", status)))
                }
                other => debug!(?other, "Handshake message"),
            }
        }
        Err(ClientError::WebSocketConnection(
            "stream ended during handshake".to_string(),
        ))
    }

    /// Parse a trading stream message
    fn parse_trading_message(text: &str) -> Result<TradingFrame> {
        let envelope: TradingStreamEnvelope = serde_json::from_str(text)?;

        match envelope.stream.as_str() {
            "authorization" => {
                let auth: AuthorizationData = serde_json::from_value(envelope.data)?;
                if auth.status == "authorized" {
                    Ok(TradingFrame::Authorized)
                } else {
                    Ok(TradingFrame::Unauthorized(auth.status))
                }
            }
            "listening" => {
                let listening: ListenStreams = serde_json::from_value(envelope.data)?;
                Ok(TradingFrame::Listening(listening.streams))
            }
            "trade_updates" => {
                let update: TradeUpdateData = serde_json::from_value(envelope.data)?;
                Ok(TradingFrame::OrderUpdate(OrderUpdateEvent {
                    order_id: update.order.id,
                    symbol: update.order.symbol,
                    kind: OrderEventKind::from(update.event),
                    timestamp: update.timestamp.unwrap_or_else(chrono::Utc::now),
                }))
            }
            other => Ok(TradingFrame::Other(other.to_string())),
        }
    }
}

enum FrameText {
    Text(String),
    Skip,
    Closed(Option<String>),
}

/// Extract the text of a frame; the trading stream sends binary frames
fn frame_text(msg: Message) -> FrameText {
    match msg {
        Message::Text(text) => FrameText::Text(text),
        Message::Binary(bytes) => match String::from_utf8(bytes) {
            Ok(text) => FrameText::Text(text),
            Err(e) => {
                warn!("Dropping non-UTF-8 binary frame: {}", e);
                FrameText::Skip
            }
        },
        Message::Close(frame) => FrameText::Closed(frame.map(|f| f.reason.to_string())),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => FrameText::Skip,
    }
}
