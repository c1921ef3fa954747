//! Blocking client for WAMP HTTP bridge services.
//!
//! ```no_run
//! use wamp_bridge_client::{Arguments, ClientConfig, SignedCaller};
//!
//! let caller = SignedCaller::from_config(
//!     ClientConfig::new("https://bridge.example/call").with_credentials("key", "secret"),
//! )?;
//! let sum = caller.call("com.example.add", &Arguments::new().arg(2).arg(3))?;
//! # Ok::<(), wamp_bridge_client::BridgeError>(())
//! ```

pub mod caller;
pub mod config;
pub mod http;

pub use caller::SignedCaller;
pub use config::{parse_endpoint, ClientConfig, DEFAULT_TIMEOUT};
pub use http::UreqTransport;
pub use wamp_bridge_core::{
    Arguments, BridgeError, Clock, ErrorKind, Method, NonceSource, PublicationId, Transport,
    TransportError,
};
