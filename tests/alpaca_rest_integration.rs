//! Integration tests for the Alpaca REST adapter
//!
//! The trading API is replaced by a local wiremock server:
//! ```
//! cargo test --test alpaca_rest_integration
//! ```

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use streak_trader::alpaca::rest::AlpacaRestClient;
use streak_trader::config::types::{AlpacaConfig, ApiCredentials, AppSettings};
use streak_trader::{AlpacaGateway, BrokerGateway, ClientError, OrderRequest, Side};

const KEY_ID: &str = "test-key";
const SECRET_KEY: &str = "test-secret";

/// Helper function to create a client against the mock server
fn create_test_client(server: &MockServer) -> AlpacaRestClient {
    AlpacaRestClient::new(
        &server.uri(),
        ApiCredentials::new(KEY_ID.to_string(), SECRET_KEY.to_string()),
    )
    .expect("Failed to create REST client")
}

fn create_test_gateway(server: &MockServer) -> AlpacaGateway {
    let config = AlpacaConfig {
        api_key_id: Some(KEY_ID.to_string()),
        api_secret_key: Some(SECRET_KEY.to_string()),
        rest_url: server.uri(),
        ..AlpacaConfig::default()
    };
    AlpacaGateway::new(&config, &AppSettings::default()).expect("Failed to create gateway")
}

// ============================================================================
// Account & Positions
// ============================================================================

#[tokio::test]
async fn test_get_account_sends_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/account"))
        .and(header("APCA-API-KEY-ID", KEY_ID))
        .and(header("APCA-API-SECRET-KEY", SECRET_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "acct-1",
            "equity": "1000.00",
            "multiplier": "2",
            "status": "ACTIVE",
            "buying_power": "2000.00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = create_test_gateway(&server);
    let account = gateway.get_account().await.unwrap();

    assert_eq!(account.account_id, "acct-1");
    assert_eq!(account.equity, dec!(1000.00));
    assert_eq!(account.margin_multiplier, dec!(2));
}

#[tokio::test]
async fn test_get_position() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/positions/MKL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": "MKL",
            "qty": "40",
            "avg_entry_price": "1.25",
            "market_value": "50.00"
        })))
        .mount(&server)
        .await;

    let position = create_test_gateway(&server).get_position("MKL").await.unwrap();

    assert_eq!(position.symbol, "MKL");
    assert_eq!(position.quantity, dec!(40));
}

#[tokio::test]
async fn test_missing_position_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/positions/MKL"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 40410000,
            "message": "position does not exist"
        })))
        .mount(&server)
        .await;

    let result = create_test_client(&server).get_position("MKL").await;

    assert!(
        matches!(result, Err(ClientError::PositionNotFound(ref symbol)) if symbol == "MKL"),
        "unexpected result: {:?}",
        result
    );
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_place_limit_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/orders"))
        .and(body_json(json!({
            "symbol": "MKL",
            "qty": "40",
            "side": "buy",
            "type": "limit",
            "time_in_force": "day",
            "limit_price": "1.25"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order-123",
            "client_order_id": "client-1",
            "symbol": "MKL",
            "status": "accepted",
            "side": "buy",
            "qty": "40",
            "limit_price": "1.25"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = OrderRequest::day_limit("MKL", Side::Buy, 40, dec!(1.25));
    let order_id = create_test_gateway(&server).place_order(&request).await.unwrap();

    assert_eq!(order_id, "order-123");
}

#[tokio::test]
async fn test_rejected_order_maps_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/orders"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": 40310000,
            "message": "insufficient buying power"
        })))
        .mount(&server)
        .await;

    let request = OrderRequest::day_limit("MKL", Side::Buy, 40, dec!(1.25));
    let result = create_test_client(&server).place_order(&request).await;

    match result {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "insufficient buying power");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_error_body_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/account"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let result = create_test_client(&server).get_account().await;

    assert!(matches!(
        result,
        Err(ClientError::Api { status: 502, ref message }) if message == "bad gateway"
    ));
}

#[tokio::test]
async fn test_list_open_orders_for_symbol() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/orders"))
        .and(query_param("status", "open"))
        .and(query_param("limit", "100"))
        .and(query_param("symbols", "MKL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "order-1", "symbol": "MKL", "status": "new"},
            {"id": "order-2", "symbol": "MKL", "status": "partially_filled"}
        ])))
        .mount(&server)
        .await;

    let order_ids = create_test_gateway(&server)
        .list_open_orders(Some("MKL"), 100)
        .await
        .unwrap();

    assert_eq!(order_ids, vec!["order-1", "order-2"]);
}

#[tokio::test]
async fn test_cancel_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v2/orders"))
        .respond_with(ResponseTemplate::new(207).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/orders/order-9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = create_test_gateway(&server);
    gateway.cancel_all_open_orders().await.unwrap();
    gateway.cancel_order("order-9").await.unwrap();
}

#[tokio::test]
async fn test_cancel_unknown_order_fails() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v2/orders/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 40410000,
            "message": "order not found"
        })))
        .mount(&server)
        .await;

    let result = create_test_gateway(&server).cancel_order("missing").await;

    assert!(matches!(result, Err(ClientError::Api { status: 404, .. })));
}
