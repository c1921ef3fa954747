use log::{debug, error};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wamp_bridge_core::{
    classify_outcome, Arguments, BridgeError, BridgeResponse, CallBody, Clock, Method,
    NonceSource, OsNonce, OutboundRequest, PublicationId, PublishBody, SignedRequestParams,
    SystemClock, Transport, LOG_TARGET,
};
use zeroize::Zeroizing;

use crate::config::ClientConfig;
use crate::http::UreqTransport;

const INITIAL_SEQUENCE: u64 = 1;

/// Client for the HTTP bridge: calls procedures and publishes events,
/// signing requests when both a key and a secret are configured.
pub struct SignedCaller {
    endpoint: Url,
    key: String,
    secret: Zeroizing<String>,
    timeout: Duration,
    silent: bool,
    sequence: AtomicU64,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    nonces: Arc<dyn NonceSource>,
}

impl fmt::Debug for SignedCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedCaller")
            .field("endpoint", &self.endpoint.as_str())
            .field("key", &self.key)
            .field("signing", &self.signing_enabled())
            .field("timeout", &self.timeout)
            .field("silent", &self.silent)
            .field("sequence", &self.sequence())
            .finish_non_exhaustive()
    }
}

impl SignedCaller {
    /// Unsigned caller with default timeout that raises every failure.
    pub fn new(endpoint: &str) -> Result<Self, BridgeError> {
        Self::from_config(ClientConfig::new(endpoint))
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, BridgeError> {
        let endpoint = config.endpoint_url()?;
        let timeout = config.timeout()?;
        Ok(Self {
            endpoint,
            key: config.key.unwrap_or_default(),
            secret: Zeroizing::new(config.secret.unwrap_or_default()),
            timeout,
            silent: config.silent,
            sequence: AtomicU64::new(INITIAL_SEQUENCE),
            transport: Arc::new(UreqTransport::new()),
            clock: Arc::new(SystemClock),
            nonces: Arc::new(OsNonce),
        })
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_nonce_source(mut self, nonces: Arc<dyn NonceSource>) -> Self {
        self.nonces = nonces;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// Sequence number the next request will carry.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub fn signing_enabled(&self) -> bool {
        !self.key.is_empty() && !self.secret.is_empty()
    }

    /// Calls `procedure` and returns the first positional result, if any.
    ///
    /// Errors reported by the procedure itself come back as
    /// [`BridgeError::NoCalleeRegistered`] or [`BridgeError::CallRuntimeError`]
    /// and are never silenced.
    pub fn call(
        &self,
        procedure: &str,
        arguments: &Arguments,
    ) -> Result<Option<JsonValue>, BridgeError> {
        let response = self.invoke(Method::Post, Some(&CallBody::new(procedure, arguments)))?;
        let view = BridgeResponse::new(&response);
        let value = view.first_arg().cloned();
        if let Some(error) = view.error() {
            return Err(BridgeError::from_call_error(error, value));
        }
        Ok(value)
    }

    pub fn call_typed<T: DeserializeOwned>(
        &self,
        procedure: &str,
        arguments: &Arguments,
    ) -> Result<Option<T>, BridgeError> {
        self.call(procedure, arguments)?
            .map(|value| {
                serde_json::from_value(value).map_err(|err| {
                    let detail = format!("cannot decode result of {procedure}: {err}");
                    BridgeError::MalformedResponse(detail)
                })
            })
            .transpose()
    }

    /// Publishes an event to `topic` and returns the publication id.
    ///
    /// With `silent` set, transport and protocol failures are logged and
    /// reported as `Ok(None)`. A 2xx response without an integer `id` is
    /// always raised as [`BridgeError::MalformedResponse`].
    pub fn publish(
        &self,
        topic: &str,
        arguments: &Arguments,
    ) -> Result<Option<PublicationId>, BridgeError> {
        let body = PublishBody::new(topic, arguments);
        let outcome = self.invoke(Method::Post, Some(&body)).and_then(|response| {
            BridgeResponse::new(&response).publication_id().ok_or_else(|| {
                let detail = format!("publish response has no integer id: {response}");
                BridgeError::MalformedResponse(detail)
            })
        });

        match outcome {
            Ok(id) => Ok(Some(id)),
            Err(err) if err.is_silenceable() => {
                error!(target: LOG_TARGET, "couldn't publish to {topic}: {err}");
                if self.silent {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Shared request path: encodes the body, signs it when credentials are
    /// configured, sends it and classifies the outcome.
    pub fn invoke<B: Serialize + ?Sized>(
        &self,
        method: Method,
        body: Option<&B>,
    ) -> Result<JsonValue, BridgeError> {
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|err| BridgeError::Protocol(format!("cannot encode request body: {err}")))?;

        // Every request consumes a sequence number, signed or not.
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);

        let mut url = self.endpoint.clone();
        let mut headers = Vec::new();
        if let Some(body) = &body {
            debug!(target: LOG_TARGET, "params: {}", String::from_utf8_lossy(body));
            headers.push(("Content-Type".to_owned(), "application/json".to_owned()));
            if self.signing_enabled() && !body.is_empty() {
                let params = SignedRequestParams::sign(
                    body,
                    &self.key,
                    &self.secret,
                    seq,
                    self.clock.as_ref(),
                    self.nonces.as_ref(),
                )?;
                params.append_to(&mut url);
                debug!(
                    target: LOG_TARGET,
                    "signature params: seq={} nonce={} timestamp={}",
                    params.seq,
                    params.nonce,
                    params.timestamp
                );
            }
        }

        debug!(target: LOG_TARGET, "request: {} {}", method.as_str(), self.endpoint);
        let request = OutboundRequest {
            method,
            url: url.into(),
            body,
            headers,
            timeout: self.timeout,
        };
        let response = classify_outcome(self.transport.send(&request))?;
        debug!(target: LOG_TARGET, "response: {response}");
        Ok(response)
    }
}
