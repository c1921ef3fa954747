use base64::engine::general_purpose::URL_SAFE as BASE64_URL_SAFE;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

use crate::entropy::{format_timestamp, Clock, NonceSource};
use crate::error::BridgeError;

type HmacSha256 = Hmac<Sha256>;

/// Query parameters appended to a signed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedRequestParams {
    pub timestamp: String,
    pub seq: u64,
    pub nonce: u64,
    pub signature: String,
    pub key: String,
}

impl SignedRequestParams {
    /// Signs `body` with fresh clock and nonce values.
    pub fn sign(
        body: &[u8],
        key: &str,
        secret: &str,
        seq: u64,
        clock: &dyn Clock,
        nonces: &dyn NonceSource,
    ) -> Result<Self, BridgeError> {
        let timestamp = format_timestamp(clock.now_utc())?;
        let nonce = nonces.next_nonce()?;
        let signature = compute_signature(body, key, secret, seq, nonce, &timestamp)?;
        Ok(Self { timestamp, seq, nonce, signature, key: key.to_owned() })
    }

    /// Appends `timestamp`, `seq`, `nonce`, `signature`, `key` in that order.
    pub fn append_to(&self, url: &mut Url) {
        url.query_pairs_mut()
            .append_pair("timestamp", &self.timestamp)
            .append_pair("seq", &self.seq.to_string())
            .append_pair("nonce", &self.nonce.to_string())
            .append_pair("signature", &self.signature)
            .append_pair("key", &self.key);
    }
}

/// HMAC-SHA256 keyed by `secret` over `key`, `timestamp`, `seq`, `nonce` and
/// `body`, concatenated without separators, encoded as padded base64url.
///
/// The field order is what the bridge verifies against.
pub fn compute_signature(
    body: &[u8],
    key: &str,
    secret: &str,
    seq: u64,
    nonce: u64,
    timestamp: &str,
) -> Result<String, BridgeError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|err| BridgeError::SignatureError(format!("hmac rejected secret: {err}")))?;
    mac.update(key.as_bytes());
    mac.update(timestamp.as_bytes());
    mac.update(seq.to_string().as_bytes());
    mac.update(nonce.to_string().as_bytes());
    mac.update(body);
    Ok(BASE64_URL_SAFE.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::OffsetDateTime;

    const BODY: &[u8] = br#"{"procedure":"test.add","args":[2,3],"kwargs":{"offset":10}}"#;
    const TIMESTAMP: &str = "2016-05-17T10:00:00.123456Z";

    struct StillClock;

    impl Clock for StillClock {
        fn now_utc(&self) -> OffsetDateTime {
            datetime!(2016-05-17 10:00:00.123456 UTC)
        }
    }

    struct ConstNonce(u64);

    impl NonceSource for ConstNonce {
        fn next_nonce(&self) -> Result<u64, BridgeError> {
            Ok(self.0)
        }
    }

    struct DrainedNonce;

    impl NonceSource for DrainedNonce {
        fn next_nonce(&self) -> Result<u64, BridgeError> {
            Err(BridgeError::SignatureError("entropy source unavailable".to_owned()))
        }
    }

    #[test]
    fn signature_matches_known_vector() {
        let signature = compute_signature(BODY, "key", "secret", 1, 42, TIMESTAMP).expect("sign");
        assert_eq!(signature, "jUjjugNe1Zvz1Hkc-IRUimLMhqqGajQ_rKCcfP8QBBg=");
    }

    #[test]
    fn signature_depends_on_sequence() {
        let signature = compute_signature(BODY, "key", "secret", 2, 42, TIMESTAMP).expect("sign");
        assert_eq!(signature, "a4VYQl-J_3G_mHbE4OfS_gMI19qXdYySdyimhvfRa7w=");
    }

    #[test]
    fn signature_handles_max_nonce() {
        let body = br#"{"topic":"com.example.tick","args":[1],"kwargs":{}}"#;
        let signature = compute_signature(
            body,
            "foo",
            "bar",
            7,
            crate::entropy::MAX_NONCE,
            "2024-01-02T03:04:05.000000Z",
        )
        .expect("sign");
        assert_eq!(signature, "P1SSriZAPlH1Lqh28YpkOMhSsFq1d83jmFpSRaFlBRE=");
    }

    #[test]
    fn signature_is_deterministic() {
        let first = compute_signature(BODY, "key", "secret", 9, 1234, TIMESTAMP).expect("sign");
        let second = compute_signature(BODY, "key", "secret", 9, 1234, TIMESTAMP).expect("sign");
        assert_eq!(first, second);
    }

    #[test]
    fn nonce_failure_aborts_signing() {
        let err = SignedRequestParams::sign(BODY, "key", "secret", 1, &StillClock, &DrainedNonce)
            .expect_err("no nonce");
        assert_eq!(err.kind(), crate::error::ErrorKind::SignatureError);
    }

    #[test]
    fn signed_params_append_in_bridge_order() {
        let params =
            SignedRequestParams::sign(BODY, "key", "secret", 1, &StillClock, &ConstNonce(42))
                .expect("sign");
        let mut url = Url::parse("http://localhost:8080/call-signature").expect("url");
        params.append_to(&mut url);
        assert_eq!(
            url.query(),
            Some(
                "timestamp=2016-05-17T10%3A00%3A00.123456Z&seq=1&nonce=42\
                 &signature=jUjjugNe1Zvz1Hkc-IRUimLMhqqGajQ_rKCcfP8QBBg%3D&key=key"
            )
        );
    }

    #[test]
    fn signed_params_extend_existing_query() {
        let params =
            SignedRequestParams::sign(BODY, "key", "secret", 3, &StillClock, &ConstNonce(1))
                .expect("sign");
        let mut url = Url::parse("https://bridge.example/call?realm=realm1").expect("url");
        params.append_to(&mut url);
        let query = url.query().expect("query");
        assert!(query.starts_with("realm=realm1&timestamp="));
        assert!(query.ends_with("&key=key"));
    }
}
