//! In-process HTTP server that plays the bridge side of the protocol.

use serde_json::{json, Value as JsonValue};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;
use url::form_urlencoded;
use wamp_bridge_core::compute_signature;

const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

/// Publication id handed out by the emulated bridge.
pub const PUBLICATION_ID: u64 = 4354231544065071;

#[derive(Clone, Debug, Default)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_json(&self) -> Option<JsonValue> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[derive(Clone, Debug)]
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(value: JsonValue) -> Self {
        Self { status: 200, body: value.to_string().into_bytes() }
    }

    pub fn status(status: u16, message: &str) -> Self {
        Self { status, body: message.as_bytes().to_vec() }
    }
}

/// Serves a fixed number of requests on a loopback port, one connection each.
pub struct FakeBridge {
    addr: SocketAddr,
    worker: thread::JoinHandle<Vec<CapturedRequest>>,
}

impl FakeBridge {
    pub fn spawn<F>(requests: usize, mut handler: F) -> Self
    where
        F: FnMut(&CapturedRequest) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake bridge");
        let addr = listener.local_addr().expect("fake bridge addr");

        let worker = thread::spawn(move || {
            let mut seen = Vec::with_capacity(requests);
            for _ in 0..requests {
                let (mut stream, _) = listener.accept().expect("accept bridge client");
                stream.set_read_timeout(Some(SOCKET_TIMEOUT)).expect("read timeout");
                let request = read_http_request(&mut stream);
                let reply = handler(&request);
                write_http_response(&mut stream, &reply);
                seen.push(request);
            }
            seen
        });

        Self { addr, worker }
    }

    /// Emulates a bridge node; `secret` is the shared secret for signed paths.
    pub fn emulated(requests: usize, key: &str, secret: &str) -> Self {
        let key = key.to_owned();
        let secret = secret.to_owned();
        Self::spawn(requests, move |request| emulate_bridge(request, &key, &secret))
    }

    /// Answers a single request with `response` written verbatim, so tests can
    /// send framing a well-behaved server never would.
    pub fn raw(response: &'static [u8]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake bridge");
        let addr = listener.local_addr().expect("fake bridge addr");
        let worker = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept bridge client");
            stream.set_read_timeout(Some(SOCKET_TIMEOUT)).expect("read timeout");
            let request = read_http_request(&mut stream);
            stream.write_all(response).expect("write raw response");
            stream.flush().expect("flush response");
            vec![request]
        });
        Self { addr, worker }
    }

    /// Accepts connections but never answers, so clients hit their timeout.
    pub fn unresponsive() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake bridge");
        let addr = listener.local_addr().expect("fake bridge addr");
        let worker = thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                thread::sleep(SOCKET_TIMEOUT);
                drop(stream);
            }
            Vec::new()
        });
        Self { addr, worker }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Waits for the server to finish and returns what it received.
    pub fn join(self) -> Vec<CapturedRequest> {
        self.worker.join().expect("fake bridge thread")
    }
}

/// URL of a loopback port with nothing listening on it.
pub fn unreachable_endpoint(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let addr = listener.local_addr().expect("probe addr");
    drop(listener);
    format!("http://{addr}{path}")
}

/// Routes a request the way a bridge node configured with `test.add`,
/// `test.exception` and signed `*-signature` paths would.
pub fn emulate_bridge(request: &CapturedRequest, key: &str, secret: &str) -> Reply {
    let path = request.path.as_str();
    if path.ends_with("-signature") {
        if let Err(reply) = verify_signature(request, key, secret) {
            return reply;
        }
    }

    let Some(body) = request.body_json() else {
        return Reply::status(400, "request body must be a JSON object");
    };
    match path {
        "/call" | "/call-signature" => {
            let Some(procedure) = body.get("procedure").and_then(JsonValue::as_str) else {
                return Reply::status(400, "missing procedure");
            };
            Reply::json(dispatch_call(procedure, &body))
        }
        "/publish" | "/publish-signature" => {
            if body.get("topic").and_then(JsonValue::as_str).is_none() {
                return Reply::status(400, "missing topic");
            }
            Reply::json(json!({ "id": PUBLICATION_ID }))
        }
        _ => Reply::status(404, "no such resource"),
    }
}

fn dispatch_call(procedure: &str, body: &JsonValue) -> JsonValue {
    match procedure {
        "test.add" => {
            let args = body.get("args").and_then(JsonValue::as_array).cloned().unwrap_or_default();
            let offset = body.pointer("/kwargs/offset").and_then(JsonValue::as_i64).unwrap_or(0);
            let sum: i64 = args.iter().filter_map(JsonValue::as_i64).sum::<i64>() + offset;
            json!({ "args": [sum], "kwargs": {} })
        }
        "test.exception" => json!({
            "error": "wamp.error.runtime_error",
            "args": ["test exception raised by callee"],
        }),
        other => json!({
            "error": "wamp.error.no_such_procedure",
            "args": [format!("no callee registered for procedure '{other}'")],
        }),
    }
}

fn verify_signature(request: &CapturedRequest, key: &str, secret: &str) -> Result<(), Reply> {
    let fields =
        ["timestamp", "seq", "nonce", "signature", "key"].map(|name| request.query_value(name));
    let [Some(timestamp), Some(seq), Some(nonce), Some(signature), Some(sent_key)] = fields else {
        return Err(Reply::status(400, "missing signature params"));
    };
    let (Ok(seq), Ok(nonce)) = (seq.parse::<u64>(), nonce.parse::<u64>()) else {
        return Err(Reply::status(400, "invalid seq or nonce"));
    };
    if sent_key != key {
        return Err(Reply::status(401, "unknown key"));
    }
    let expected = compute_signature(&request.body, key, secret, seq, nonce, timestamp)
        .map_err(|err| Reply::status(401, &err.to_string()))?;
    if expected != signature {
        return Err(Reply::status(401, "invalid request signature"));
    }
    Ok(())
}

fn read_http_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut bytes = Vec::new();
    let mut header_end = None;
    let mut content_length = 0usize;

    loop {
        let mut buf = [0u8; 1024];
        let read = stream.read(&mut buf).expect("read bridge request");
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&buf[..read]);

        if header_end.is_none() {
            if let Some(pos) = find_header_end(&bytes) {
                header_end = Some(pos);
                let headers = String::from_utf8_lossy(&bytes[..pos]);
                content_length = parse_content_length(&headers);
            }
        }

        if let Some(pos) = header_end {
            if bytes.len() >= pos + 4 + content_length {
                break;
            }
        }
    }

    let header_end = header_end.expect("valid http request headers");
    let head = String::from_utf8_lossy(&bytes[..header_end]).into_owned();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let target = parts.next().unwrap_or_default();
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
        .collect();
    let body_start = header_end + 4;
    let body = bytes[body_start..(body_start + content_length).min(bytes.len())].to_vec();

    CapturedRequest {
        method,
        path: path.to_owned(),
        query: form_urlencoded::parse(query.as_bytes()).into_owned().collect(),
        headers,
        body,
    }
}

fn write_http_response(stream: &mut TcpStream, reply: &Reply) {
    let status_text = match reply.status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        _ => "Error",
    };
    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
         Connection: close\r\n\r\n",
        reply.status,
        status_text,
        reply.body.len()
    );
    stream.write_all(header.as_bytes()).expect("write response head");
    stream.write_all(&reply.body).expect("write response body");
    stream.flush().expect("flush response");
}

fn find_header_end(bytes: &[u8]) -> Option<usize> {
    bytes.windows(4).position(|window| window == b"\r\n\r\n")
}

fn parse_content_length(headers: &str) -> usize {
    headers
        .lines()
        .find_map(|line| {
            let lower = line.to_ascii_lowercase();
            lower
                .strip_prefix("content-length:")
                .and_then(|value| value.trim().parse::<usize>().ok())
        })
        .unwrap_or(0)
}
