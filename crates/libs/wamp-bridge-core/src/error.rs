use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Error URI the bridge reports when a call targets a procedure nobody registered.
pub const NO_SUCH_PROCEDURE: &str = "wamp.error.no_such_procedure";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorKind {
    InvalidEndpoint,
    InvalidHost,
    MissingParams,
    SignatureError,
    NoCalleeRegistered,
    CallRuntimeError,
    Protocol,
    MalformedResponse,
    Config,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidEndpoint => "invalid_endpoint",
            Self::InvalidHost => "invalid_host",
            Self::MissingParams => "missing_params",
            Self::SignatureError => "signature_error",
            Self::NoCalleeRegistered => "no_callee_registered",
            Self::CallRuntimeError => "call_runtime_error",
            Self::Protocol => "protocol",
            Self::MalformedResponse => "malformed_response",
            Self::Config => "config",
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Malformed endpoint URL, or the bridge rejected the request with a
    /// status other than 400/401.
    #[error("invalid bridge endpoint: {0}")]
    InvalidEndpoint(String),
    /// DNS, connection or timeout failure before any response arrived.
    #[error("bridge host unreachable: {0}")]
    InvalidHost(String),
    #[error("bridge reported missing request params: {0}")]
    MissingParams(String),
    #[error("bridge rejected request signature: {0}")]
    SignatureError(String),
    #[error("no callee registered: {error}")]
    NoCalleeRegistered { error: String, value: Option<JsonValue> },
    #[error("remote procedure failed: {error}")]
    CallRuntimeError { error: String, value: Option<JsonValue> },
    /// The HTTP exchange itself broke down: bad status line, bad header,
    /// truncated body.
    #[error("bridge protocol error: {0}")]
    Protocol(String),
    /// A complete 2xx response whose payload is not what the operation needs.
    #[error("malformed bridge response: {0}")]
    MalformedResponse(String),
    #[error("invalid client config: {0}")]
    Config(String),
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEndpoint(_) => ErrorKind::InvalidEndpoint,
            Self::InvalidHost(_) => ErrorKind::InvalidHost,
            Self::MissingParams(_) => ErrorKind::MissingParams,
            Self::SignatureError(_) => ErrorKind::SignatureError,
            Self::NoCalleeRegistered { .. } => ErrorKind::NoCalleeRegistered,
            Self::CallRuntimeError { .. } => ErrorKind::CallRuntimeError,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Transport and protocol failures that `publish` may swallow when the
    /// caller was built with `silent = true`.
    pub fn is_silenceable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidEndpoint
                | ErrorKind::InvalidHost
                | ErrorKind::MissingParams
                | ErrorKind::SignatureError
                | ErrorKind::Protocol
        )
    }

    /// Result value the remote procedure attached to a business error.
    pub fn value(&self) -> Option<&JsonValue> {
        match self {
            Self::NoCalleeRegistered { value, .. } | Self::CallRuntimeError { value, .. } => {
                value.as_ref()
            }
            _ => None,
        }
    }

    /// Maps a response `error` field to the matching business error.
    pub fn from_call_error(error: String, value: Option<JsonValue>) -> Self {
        if error.contains(NO_SUCH_PROCEDURE) {
            Self::NoCalleeRegistered { error, value }
        } else {
            Self::CallRuntimeError { error, value }
        }
    }
}
