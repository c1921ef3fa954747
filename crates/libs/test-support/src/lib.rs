//! Shared fixtures for bridge client tests.

pub mod bridge;
pub mod scripted;

pub use bridge::{
    emulate_bridge, unreachable_endpoint, CapturedRequest, FakeBridge, Reply, PUBLICATION_ID,
};
pub use scripted::{
    connect_failure, json_ok, status, FailingNonce, FixedClock, FixedNonce, Outcome,
    ScriptedTransport,
};
