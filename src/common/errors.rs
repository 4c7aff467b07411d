//! Error types for the application

use thiserror::Error;

/// Result type alias using our ClientError
pub type Result<T> = std::result::Result<T, ClientError>;

/// Result type alias for controller-level operations
pub type TradingResult<T> = std::result::Result<T, TradingError>;

/// Error type for broker gateway operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// WebSocket connection errors
    #[error("WebSocket connection error: {0}")]
    WebSocketConnection(String),

    /// WebSocket send/receive errors
    #[error("WebSocket communication error: {0}")]
    WebSocketCommunication(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Broker rejected the request
    #[error("Broker API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The broker holds no position for the symbol
    #[error("position does not exist: {0}")]
    PositionNotFound(String),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::WebSocketCommunication(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Configuration(format!("invalid URL: {}", err))
    }
}

/// Error type for the trading controller
#[derive(Error, Debug)]
pub enum TradingError {
    /// A gateway call failed
    #[error(transparent)]
    Gateway(#[from] ClientError),

    /// The requested order would not change the position
    #[error("no-op order requested")]
    NoOpOrder,

    /// An order is already working for the tracked symbol
    #[error("order {0} is still outstanding")]
    OrderOutstanding(String),

    /// Startup could not establish a known state
    #[error("startup failed while {stage}: {source}")]
    Startup {
        stage: &'static str,
        #[source]
        source: ClientError,
    },

    /// Operation called in the wrong controller state
    #[error("invalid controller state: {0}")]
    InvalidState(String),

    /// A gateway stream closed while no shutdown was requested
    #[error("{0} stream ended unexpectedly")]
    StreamEnded(&'static str),
}

impl TradingError {
    /// Returns true for outcomes that are expected and need no operator attention
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::NoOpOrder | Self::OrderOutstanding(_))
    }
}
