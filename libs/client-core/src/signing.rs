//! Signing Module — Authenticated request signing
//!
//! Provides ordered query-string serialization, timestamp injection and
//! HMAC-SHA256 request signatures for the exchange's signed endpoints.
//!
//! The signature covers the exact serialized payload, timestamp included, so
//! the query string returned by [`SignedRequest::query_string`] must be sent
//! to the exchange unchanged.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Parameter name carrying the signature. Reserved; callers may not supply it.
pub const SIGNATURE_KEY: &str = "signature";

/// Parameter name carrying the signing timestamp (unix millis).
pub const TIMESTAMP_KEY: &str = "timestamp";

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// Source of the signing timestamp.
///
/// Read once per `sign` call, never cached.
pub trait Clock {
    /// Current time in unix milliseconds.
    fn now_millis(&self) -> i64;
}

/// Local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock frozen at a given instant, for reproducible signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Wraps another clock and shifts it by a measured offset
/// (`server_millis - local_millis`), so timestamps land inside the
/// exchange's receive window even when the local clock drifts.
#[derive(Debug, Clone, Copy)]
pub struct OffsetClock<C: Clock> {
    inner: C,
    offset_millis: i64,
}

impl<C: Clock> OffsetClock<C> {
    pub fn new(inner: C, offset_millis: i64) -> Self {
        Self {
            inner,
            offset_millis,
        }
    }

    pub fn offset_millis(&self) -> i64 {
        self.offset_millis
    }
}

impl<C: Clock> Clock for OffsetClock<C> {
    fn now_millis(&self) -> i64 {
        self.inner.now_millis() + self.offset_millis
    }
}

// ---------------------------------------------------------------------------
// Request parameters
// ---------------------------------------------------------------------------

/// Ordered request parameters with unique keys.
///
/// Iteration order is insertion order and is the order used on the wire.
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParams {
    pairs: Vec<(String, String)>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Numbers and strings are both accepted via `Display`.
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a parameter, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        let key = key.into();
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Form-encode as `k1=v1&k2=v2`, in insertion order.
    pub fn to_query_string(&self) -> Result<String, SigningError> {
        serde_urlencoded::to_string(&self.pairs)
            .map_err(|e| SigningError::Encoding(e.to_string()))
    }
}

impl<K: Into<String>, V: fmt::Display> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = RequestParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

// ---------------------------------------------------------------------------
// Signed request
// ---------------------------------------------------------------------------

/// Parameters augmented with the signing timestamp and the HMAC signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRequest {
    /// Caller parameters plus the injected timestamp
    params: RequestParams,
    /// Exact bytes that were signed
    payload: String,
    /// Unix millis read from the clock at signing time
    timestamp: i64,
    /// Lowercase hex HMAC-SHA256 of `payload`
    signature: String,
}

impl SignedRequest {
    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Wire form: the signed payload followed by `&signature=<hex>`.
    pub fn query_string(&self) -> String {
        if self.payload.is_empty() {
            format!("{SIGNATURE_KEY}={}", self.signature)
        } else {
            format!("{}&{SIGNATURE_KEY}={}", self.payload, self.signature)
        }
    }
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// HMAC-SHA256 of `message` keyed with the UTF-8 bytes of `secret_key`,
/// hex-encoded in lowercase.
pub fn hmac_sha256_hex(secret_key: &str, message: &[u8]) -> Result<String, SigningError> {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|_| SigningError::InvalidKey)?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Sign a copy of `params` with `secret_key`, stamping it with `clock`.
///
/// The caller's parameters are left untouched. Fails with
/// [`SigningError::InvalidArgument`] if they already carry a signature.
pub fn sign(
    params: &RequestParams,
    secret_key: &str,
    clock: &impl Clock,
) -> Result<SignedRequest, SigningError> {
    if params.contains_key(SIGNATURE_KEY) {
        return Err(SigningError::InvalidArgument(format!(
            "key `{SIGNATURE_KEY}` must not be contained in params"
        )));
    }

    let timestamp = clock.now_millis();
    let mut stamped = params.clone();
    stamped.insert(TIMESTAMP_KEY, timestamp);

    let payload = stamped.to_query_string()?;
    let signature = hmac_sha256_hex(secret_key, payload.as_bytes())?;

    Ok(SignedRequest {
        params: stamped,
        payload,
        timestamp,
        signature,
    })
}

/// Holds the account secret and the clock used to stamp requests.
pub struct RequestSigner<C: Clock = SystemClock> {
    secret_key: String,
    clock: C,
}

impl RequestSigner<SystemClock> {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self::with_clock(secret_key, SystemClock)
    }
}

impl<C: Clock> RequestSigner<C> {
    pub fn with_clock(secret_key: impl Into<String>, clock: C) -> Self {
        Self {
            secret_key: secret_key.into(),
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sign(&self, params: &RequestParams) -> Result<SignedRequest, SigningError> {
        sign(params, &self.secret_key, &self.clock)
    }
}

impl<C: Clock> fmt::Debug for RequestSigner<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Signing module errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid signing key")]
    InvalidKey,

    #[error("Parameter encoding failed: {0}")]
    Encoding(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const SECRET: &str = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";

    fn order_params() -> RequestParams {
        RequestParams::new()
            .with("symbol", "LTCBTC")
            .with("side", "BUY")
            .with("type", "LIMIT")
            .with("timeInForce", "GTC")
            .with("quantity", 1)
            .with("price", "0.1")
            .with("recvWindow", 5000)
    }

    /// Advances by one millisecond on every read.
    struct TickingClock(Cell<i64>);

    impl Clock for TickingClock {
        fn now_millis(&self) -> i64 {
            let now = self.0.get();
            self.0.set(now + 1);
            now
        }
    }

    #[test]
    fn test_query_string_preserves_insertion_order() {
        let params = RequestParams::new().with("symbol", "BTCAUD").with("limit", 500);
        assert_eq!(params.to_query_string().unwrap(), "symbol=BTCAUD&limit=500");
    }

    #[test]
    fn test_query_string_percent_encodes() {
        let params = RequestParams::new().with("note", "a b&c=d/é");
        assert_eq!(
            params.to_query_string().unwrap(),
            "note=a+b%26c%3Dd%2F%C3%A9"
        );
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut params = RequestParams::new().with("a", 1).with("b", 2);
        params.insert("a", 3);
        assert_eq!(params.len(), 2);
        assert_eq!(params.to_query_string().unwrap(), "a=3&b=2");
    }

    #[test]
    fn test_sign_matches_reference_vector() {
        let signed = sign(&order_params(), SECRET, &FixedClock(1_499_827_319_559)).unwrap();
        assert_eq!(
            signed.payload(),
            "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1\
             &recvWindow=5000&timestamp=1499827319559"
        );
        assert_eq!(
            signed.signature(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_hmac_rfc4231_case_2() {
        let digest = hmac_sha256_hex("Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            digest,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_signature_is_64_lowercase_hex() {
        let signed = sign(&order_params(), "secret", &FixedClock(1)).unwrap();
        assert_eq!(signed.signature().len(), 64);
        assert!(signed
            .signature()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_sign_deterministic_for_fixed_clock() {
        let clock = FixedClock(1_700_000_000_000);
        let a = sign(&order_params(), "secret", &clock).unwrap();
        let b = sign(&order_params(), "secret", &clock).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.query_string(), b.query_string());
    }

    #[test]
    fn test_sign_rejects_existing_signature() {
        let params = order_params().with(SIGNATURE_KEY, "deadbeef");
        let err = sign(&params, "secret", &FixedClock(1)).unwrap_err();
        assert!(matches!(err, SigningError::InvalidArgument(_)));
    }

    #[test]
    fn test_sign_does_not_mutate_input() {
        let params = order_params();
        let before = params.clone();
        let signed = sign(&params, "secret", &FixedClock(42)).unwrap();
        assert_eq!(params, before);
        assert!(!params.contains_key(TIMESTAMP_KEY));
        assert_eq!(signed.params().get(TIMESTAMP_KEY), Some("42"));
    }

    #[test]
    fn test_timestamp_is_part_of_signed_payload() {
        let a = sign(&order_params(), "secret", &FixedClock(1)).unwrap();
        let b = sign(&order_params(), "secret", &FixedClock(2)).unwrap();
        assert_ne!(a.signature(), b.signature());
        assert!(a.payload().ends_with("&timestamp=1"));
    }

    #[test]
    fn test_caller_timestamp_replaced_in_place() {
        let params = RequestParams::new()
            .with(TIMESTAMP_KEY, 0)
            .with("symbol", "ETHAUD");
        let signed = sign(&params, "secret", &FixedClock(99)).unwrap();
        assert_eq!(signed.payload(), "timestamp=99&symbol=ETHAUD");
    }

    #[test]
    fn test_query_string_appends_signature_last() {
        let signed = sign(&RequestParams::new().with("symbol", "BTCAUD"), "k", &FixedClock(5)).unwrap();
        let query = signed.query_string();
        assert!(query.starts_with("symbol=BTCAUD&timestamp=5&signature="));
        assert!(query.ends_with(signed.signature()));
    }

    #[test]
    fn test_clock_read_per_call() {
        let signer = RequestSigner::with_clock("secret", TickingClock(Cell::new(10)));
        let first = signer.sign(&order_params()).unwrap();
        let second = signer.sign(&order_params()).unwrap();
        assert_eq!(first.timestamp(), 10);
        assert_eq!(second.timestamp(), 11);
    }

    #[test]
    fn test_offset_clock() {
        let clock = OffsetClock::new(FixedClock(1_000), -250);
        assert_eq!(clock.now_millis(), 750);
        assert_eq!(clock.offset_millis(), -250);
    }

    #[test]
    fn test_signer_debug_redacts_secret() {
        let signer = RequestSigner::new("super-secret");
        let debug = format!("{signer:?}");
        assert!(!debug.contains("super-secret"));
    }
}
