use std::fmt;
use std::time::Duration;
use url::Url;
use wamp_bridge_core::BridgeError;

/// Request timeout applied when the config leaves `timeout_secs` unset.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Construction options for [`crate::SignedCaller`].
#[derive(Clone, PartialEq, Default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub key: Option<String>,
    pub secret: Option<String>,
    pub timeout_secs: Option<f64>,
    pub silent: bool,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &self.key)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("silent", &self.silent)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), ..Self::default() }
    }

    pub fn with_credentials(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self.secret = Some(secret.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: f64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn endpoint_url(&self) -> Result<Url, BridgeError> {
        parse_endpoint(&self.endpoint)
    }

    pub fn timeout(&self) -> Result<Duration, BridgeError> {
        match self.timeout_secs {
            None => Ok(DEFAULT_TIMEOUT),
            Some(secs) => Duration::try_from_secs_f64(secs).map_err(|_| {
                BridgeError::Config(format!(
                    "timeout_secs must be a finite non-negative number, got {secs}"
                ))
            }),
        }
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        self.endpoint_url()?;
        self.timeout()?;
        Ok(())
    }
}

/// Accepts absolute URLs that carry both a scheme and a host.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, BridgeError> {
    let url = Url::parse(endpoint.trim())
        .map_err(|err| BridgeError::InvalidEndpoint(format!("{endpoint:?}: {err}")))?;
    if url.scheme().is_empty() || url.host_str().map_or(true, str::is_empty) {
        return Err(BridgeError::InvalidEndpoint(format!("{endpoint:?}: missing scheme or host")));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wamp_bridge_core::ErrorKind;

    #[test]
    fn builder_fills_defaults() {
        let cfg = ClientConfig::new("http://localhost:8080/publish");
        assert_eq!(cfg.key, None);
        assert_eq!(cfg.secret, None);
        assert!(!cfg.silent);
        assert_eq!(cfg.timeout().expect("timeout"), DEFAULT_TIMEOUT);

        let cfg = cfg.with_credentials("client-key", "client-secret").with_timeout_secs(2.5);
        assert_eq!(cfg.timeout().expect("timeout"), Duration::from_millis(2500));
        cfg.validate().expect("valid");
    }

    #[test]
    fn negative_or_nan_timeout_is_rejected() {
        for secs in [-1.0, f64::NAN, f64::INFINITY] {
            let cfg = ClientConfig::new("http://localhost").with_timeout_secs(secs);
            assert_eq!(cfg.timeout().expect_err("bad timeout").kind(), ErrorKind::Config);
        }
    }

    #[test]
    fn endpoints_without_scheme_or_host_are_invalid() {
        let endpoints = ["not a URL", "", "localhost:8080/call", "mailto:ops@example.com", "/call"];
        for endpoint in endpoints {
            let err = parse_endpoint(endpoint).expect_err(endpoint);
            assert_eq!(err.kind(), ErrorKind::InvalidEndpoint, "{endpoint}");
        }
    }

    #[test]
    fn absolute_urls_are_accepted() {
        for endpoint in [
            "http://localhost",
            "http://localhost:8080/call",
            "https://bridge.example/publish?realm=realm1",
            "http://127.0.0.1:9000",
        ] {
            parse_endpoint(endpoint).expect(endpoint);
        }
    }

    #[test]
    fn debug_output_redacts_secret() {
        let cfg = ClientConfig::new("http://localhost").with_credentials("key", "hunter2");
        let rendered = format!("{cfg:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }
}
