use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::sync::Mutex;
use time::macros::datetime;
use time::OffsetDateTime;
use wamp_bridge_core::{
    BridgeError, Clock, NonceSource, OutboundRequest, Transport, TransportError,
    TransportResponse,
};

pub type Outcome = Result<TransportResponse, TransportError>;

pub fn json_ok(value: JsonValue) -> Outcome {
    Ok(TransportResponse { status: 200, body: value.to_string().into_bytes() })
}

pub fn status(status: u16) -> Outcome {
    Ok(TransportResponse { status, body: Vec::new() })
}

pub fn connect_failure() -> Outcome {
    Err(TransportError::Connect("dns error: failed to lookup address information".to_owned()))
}

enum Script {
    Always(Outcome),
    Sequence(VecDeque<Outcome>),
}

/// In-memory transport that replays canned outcomes and records every request.
pub struct ScriptedTransport {
    script: Mutex<Script>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub fn always(outcome: Outcome) -> Self {
        Self::with_script(Script::Always(outcome))
    }

    /// Replays `outcomes` in order, then fails every further request.
    pub fn sequence(outcomes: Vec<Outcome>) -> Self {
        Self::with_script(Script::Sequence(outcomes.into()))
    }

    fn with_script(script: Script) -> Self {
        Self { script: Mutex::new(script), requests: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().expect("requests mutex poisoned").clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().expect("requests mutex poisoned").push(request.clone());
        let mut script = self.script.lock().expect("script mutex poisoned");
        match &mut *script {
            Script::Always(outcome) => outcome.clone(),
            Script::Sequence(outcomes) => outcomes.pop_front().unwrap_or_else(|| {
                Err(TransportError::Connect("scripted transport exhausted".to_owned()))
            }),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub OffsetDateTime);

impl FixedClock {
    /// 2016-05-17T10:00:00.123456Z, the instant used by the reference signature vectors.
    pub fn bridge_epoch() -> Self {
        Self(datetime!(2016-05-17 10:00:00.123456 UTC))
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> OffsetDateTime {
        self.0
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedNonce(pub u64);

impl NonceSource for FixedNonce {
    fn next_nonce(&self) -> Result<u64, BridgeError> {
        Ok(self.0)
    }
}

/// Nonce source whose entropy is gone; every draw fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingNonce;

impl NonceSource for FailingNonce {
    fn next_nonce(&self) -> Result<u64, BridgeError> {
        Err(BridgeError::SignatureError("entropy source unavailable".to_owned()))
    }
}
