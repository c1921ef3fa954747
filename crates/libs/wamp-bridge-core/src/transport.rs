use std::time::Duration;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Vec<u8>>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl OutboundRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Any completed HTTP exchange, whatever the status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No response was received: DNS, refused connection, timeout.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The peer answered with something that is not valid HTTP.
    #[error("malformed http exchange: {0}")]
    Protocol(String),
}

/// Blocking HTTP collaborator used by the caller. Implementations must abort
/// and report [`TransportError::Connect`] once `request.timeout` elapses.
pub trait Transport: Send + Sync {
    fn send(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError>;
}
