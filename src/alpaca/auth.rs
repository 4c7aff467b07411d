//! Authentication utilities for the Alpaca API
//!
//! Alpaca authenticates REST calls with a key pair sent as plain headers and
//! streams with an `auth` action carrying the same pair.

use crate::alpaca::messages::StreamAuthMessage;
use crate::common::errors::{ClientError, Result};
use crate::config::types::ApiCredentials;

/// Header carrying the API key ID
pub const HEADER_API_KEY_ID: &str = "APCA-API-KEY-ID";
/// Header carrying the API secret key
pub const HEADER_API_SECRET_KEY: &str = "APCA-API-SECRET-KEY";

/// Add authentication headers to a reqwest RequestBuilder
pub fn apply_to_request(
    credentials: &ApiCredentials,
    request: reqwest::RequestBuilder,
) -> reqwest::RequestBuilder {
    request
        .header(HEADER_API_KEY_ID, &credentials.key_id)
        .header(HEADER_API_SECRET_KEY, &credentials.secret_key)
}

/// Serialized `auth` action for either stream
pub fn stream_auth_payload(credentials: &ApiCredentials) -> Result<String> {
    if credentials.key_id.is_empty() || credentials.secret_key.is_empty() {
        return Err(ClientError::Authentication(
            "API key ID and secret key must not be empty".to_string(),
        ));
    }
    let message = StreamAuthMessage::new(&credentials.key_id, &credentials.secret_key);
    Ok(serde_json::to_string(&message)?)
}
