//! Signing, wire format and error taxonomy for HTTP bridge clients.

pub mod classify;
pub mod entropy;
pub mod error;
pub mod signing;
pub mod transport;
pub mod wire;

pub use classify::classify_outcome;
pub use entropy::{format_timestamp, Clock, NonceSource, OsNonce, SystemClock, MAX_NONCE};
pub use error::{BridgeError, ErrorKind, NO_SUCH_PROCEDURE};
pub use signing::{compute_signature, SignedRequestParams};
pub use transport::{Method, OutboundRequest, Transport, TransportError, TransportResponse};
pub use wire::{Arguments, BridgeResponse, CallBody, PublicationId, PublishBody};

/// `log` target shared by the bridge crates.
pub const LOG_TARGET: &str = "wamp_bridge";
