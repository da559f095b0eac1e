use crate::error::ClientError;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_BASE_URL: &str = "EXCHANGE_BASE_URL";
pub const ENV_API_KEY: &str = "EXCHANGE_API_KEY";
pub const ENV_SECRET_KEY: &str = "EXCHANGE_SECRET_KEY";
pub const ENV_TIMEOUT_SECS: &str = "EXCHANGE_TIMEOUT_SECS";
pub const ENV_RECV_WINDOW_MS: &str = "EXCHANGE_RECV_WINDOW_MS";

/// API credentials. Only the key is sent over the wire.
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials: Credentials,
    pub timeout: Duration,
    /// Sent as `recvWindow` on signed requests when set
    pub recv_window_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: Credentials::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            recv_window_ms: None,
        }
    }
}

impl ClientConfig {
    /// Load from process environment variables
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get(ENV_BASE_URL)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = match get(ENV_TIMEOUT_SECS) {
            Some(raw) => parse_number(ENV_TIMEOUT_SECS, &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(ClientError::Config(format!("{ENV_TIMEOUT_SECS} must be positive")));
        }

        let recv_window_ms = get(ENV_RECV_WINDOW_MS)
            .map(|raw| parse_number(ENV_RECV_WINDOW_MS, &raw))
            .transpose()?;

        Ok(Self {
            base_url,
            credentials: Credentials {
                api_key: get(ENV_API_KEY),
                secret_key: get(ENV_SECRET_KEY),
            },
            timeout: Duration::from_secs(timeout_secs),
            recv_window_ms,
        })
    }

    pub fn api_key(&self) -> Result<&str, ClientError> {
        self.credentials
            .api_key
            .as_deref()
            .ok_or(ClientError::MissingCredentials(ENV_API_KEY))
    }

    pub fn secret_key(&self) -> Result<&str, ClientError> {
        self.credentials
            .secret_key
            .as_deref()
            .ok_or(ClientError::MissingCredentials(ENV_SECRET_KEY))
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, ClientError> {
    raw.trim()
        .parse()
        .map_err(|e| ClientError::Config(format!("{key}={raw:?} is not a number: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ClientError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.recv_window_ms.is_none());
        assert!(matches!(config.api_key(), Err(ClientError::MissingCredentials(_))));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (ENV_BASE_URL, "https://testnet.binance.vision/"),
            (ENV_API_KEY, "key"),
            (ENV_SECRET_KEY, "secret"),
            (ENV_TIMEOUT_SECS, "3"),
            (ENV_RECV_WINDOW_MS, "5000"),
        ])
        .unwrap();
        assert_eq!(config.base_url, "https://testnet.binance.vision");
        assert_eq!(config.api_key().unwrap(), "key");
        assert_eq!(config.secret_key().unwrap(), "secret");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.recv_window_ms, Some(5000));
    }

    #[test]
    fn test_empty_value_is_unset() {
        let config = load(&[(ENV_SECRET_KEY, "  ")]).unwrap();
        assert!(config.secret_key().is_err());
    }

    #[test]
    fn test_bad_numbers_rejected() {
        assert!(matches!(load(&[(ENV_TIMEOUT_SECS, "ten")]), Err(ClientError::Config(_))));
        assert!(matches!(load(&[(ENV_TIMEOUT_SECS, "0")]), Err(ClientError::Config(_))));
        assert!(matches!(load(&[(ENV_RECV_WINDOW_MS, "-1")]), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_secret_redacted_in_debug() {
        let config = load(&[(ENV_API_KEY, "key"), (ENV_SECRET_KEY, "hunter2")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
