use serde_json::Value as JsonValue;

use crate::error::BridgeError;
use crate::transport::{TransportError, TransportResponse};

const MAX_DETAIL_BYTES: usize = 256;

/// Turns a transport outcome into the decoded response or a semantic error.
pub fn classify_outcome(
    outcome: Result<TransportResponse, TransportError>,
) -> Result<JsonValue, BridgeError> {
    let response = match outcome {
        Ok(response) => response,
        Err(TransportError::Connect(detail)) => return Err(BridgeError::InvalidHost(detail)),
        Err(TransportError::Protocol(detail)) => return Err(BridgeError::Protocol(detail)),
    };

    if (200..300).contains(&response.status) {
        return serde_json::from_slice(&response.body).map_err(|err| {
            BridgeError::MalformedResponse(format!("response body is not valid json: {err}"))
        });
    }

    let detail = status_detail(&response);
    Err(match response.status {
        400 => BridgeError::MissingParams(detail),
        401 => BridgeError::SignatureError(detail),
        _ => BridgeError::InvalidEndpoint(detail),
    })
}

fn status_detail(response: &TransportResponse) -> String {
    let body = String::from_utf8_lossy(&response.body);
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {}", response.status);
    }
    let mut end = body.len().min(MAX_DETAIL_BYTES);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("HTTP {}: {}", response.status, &body[..end])
}
