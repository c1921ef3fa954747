use std::io::Read;
use std::time::Duration;
use wamp_bridge_core::{OutboundRequest, Transport, TransportError, TransportResponse};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const MAX_BODY_PREALLOC: usize = 64 * 1024;

/// Blocking transport backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_agent(ureq::AgentBuilder::new().timeout_connect(CONNECT_TIMEOUT).build())
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError> {
        let mut call = self
            .agent
            .request(request.method.as_str(), &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }

        let outcome = match &request.body {
            Some(body) => call.send_bytes(body),
            None => call.call(),
        };

        let response = match outcome {
            Ok(response) => response,
            // Non-2xx statuses still carry a response the caller classifies.
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => return Err(map_transport_error(&err)),
        };

        let status = response.status();
        let body = read_response_body(response)?;
        Ok(TransportResponse { status, body })
    }
}

fn map_transport_error(err: &ureq::Transport) -> TransportError {
    match err.kind() {
        ureq::ErrorKind::BadStatus
        | ureq::ErrorKind::BadHeader
        | ureq::ErrorKind::TooManyRedirects => TransportError::Protocol(err.to_string()),
        _ => TransportError::Connect(err.to_string()),
    }
}

fn read_response_body(response: ureq::Response) -> Result<Vec<u8>, TransportError> {
    // The declared length is only a capacity hint; ureq stops reading at it.
    let capacity = response
        .header("Content-Length")
        .and_then(|value| value.parse::<usize>().ok())
        .map_or(0, |length| length.min(MAX_BODY_PREALLOC));
    let mut bytes = Vec::with_capacity(capacity);
    response.into_reader().read_to_end(&mut bytes).map_err(read_error)?;
    Ok(bytes)
}

fn read_error(err: std::io::Error) -> TransportError {
    match err.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
            TransportError::Connect(format!("timed out reading response body: {err}"))
        }
        _ => TransportError::Protocol(format!("failed to read response body: {err}")),
    }
}
