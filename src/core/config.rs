use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

pub const DEFAULT_BASE_URL: &str = "http://localhost:47200";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAGIC_LEN: usize = 4;

pub const ENV_BASE_URL: &str = "ENTITY_SERVER_URL";
pub const ENV_API_KEY: &str = "ENTITY_SERVER_API_KEY";
pub const ENV_HMAC_SECRET: &str = "ENTITY_SERVER_HMAC_SECRET";
pub const ENV_MAGIC_LEN: &str = "ENTITY_PACKET_MAGIC_LEN";
pub const ENV_TIMEOUT_MS: &str = "ENTITY_SERVER_TIMEOUT_MS";

/// Connection credentials for one Entity Server.
///
/// `hmac_secret` is the root key for both request signing and the packet
/// decryption key, so it is held behind [`Secret`] and never serialized.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub hmac_secret: Secret<String>,
    pub timeout_ms: u64,
    /// Length of the server's packet magic prefix. Must match the server's
    /// `packet_magic_len` byte for byte.
    pub magic_len: usize,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ClientConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ClientConfig", 5)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("hmac_secret", "[REDACTED]")?;
        state.serialize_field("timeout_ms", &self.timeout_ms)?;
        state.serialize_field("magic_len", &self.magic_len)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ClientConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ClientConfigHelper {
            base_url: String,
            api_key: String,
            hmac_secret: String,
            #[serde(default = "default_timeout_ms")]
            timeout_ms: u64,
            #[serde(default = "default_magic_len")]
            magic_len: usize,
        }

        let helper = ClientConfigHelper::deserialize(deserializer)?;
        Ok(Self::new(helper.base_url, helper.api_key, helper.hmac_secret)
            .with_timeout_ms(helper.timeout_ms)
            .with_magic_len(helper.magic_len))
    }
}

const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

const fn default_magic_len() -> usize {
    DEFAULT_MAGIC_LEN
}

impl ClientConfig {
    /// Create a configuration with default timeout and magic length
    #[must_use]
    pub fn new(base_url: String, api_key: String, hmac_secret: String) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            api_key: Secret::new(api_key),
            hmac_secret: Secret::new(hmac_secret),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            magic_len: DEFAULT_MAGIC_LEN,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `ENTITY_SERVER_URL` (optional, defaults to `http://localhost:47200`)
    /// - `ENTITY_SERVER_API_KEY`
    /// - `ENTITY_SERVER_HMAC_SECRET`
    /// - `ENTITY_PACKET_MAGIC_LEN` (optional, defaults to 4)
    /// - `ENTITY_SERVER_TIMEOUT_MS` (optional, defaults to 10000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = non_blank_var(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = non_blank_var(ENV_API_KEY)
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable(ENV_API_KEY.to_string()))?;
        let hmac_secret = non_blank_var(ENV_HMAC_SECRET)
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable(ENV_HMAC_SECRET.to_string()))?;

        let magic_len = parse_var(ENV_MAGIC_LEN, DEFAULT_MAGIC_LEN)?;
        let timeout_ms = parse_var(ENV_TIMEOUT_MS, DEFAULT_TIMEOUT_MS)?;

        let config = Self::new(base_url, api_key, hmac_secret)
            .with_timeout_ms(timeout_ms)
            .with_magic_len(magic_len);
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from a `.env` file and environment variables
    ///
    /// A missing file is not an error; the system environment is used as-is.
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env()
    }

    /// Set the request timeout (applied to both connect and read)
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the packet magic prefix length
    #[must_use]
    pub const fn with_magic_len(mut self, magic_len: usize) -> Self {
        self.magic_len = magic_len;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::InvalidConfiguration(
                "base_url must not be empty".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get HMAC secret (use carefully - exposes secret)
    pub fn hmac_secret(&self) -> &str {
        self.hmac_secret.expose_secret()
    }
}

pub(crate) fn normalize_base_url(base_url: String) -> String {
    match base_url.strip_suffix('/') {
        Some(trimmed) => trimmed.to_string(),
        None => base_url,
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    non_blank_var(name).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|_| {
            ConfigError::InvalidConfiguration(format!("{} is not a valid number: {}", name, raw))
        })
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_defaults_and_trims_slash() {
        let config = ClientConfig::new(
            "http://x/".to_string(),
            "k".to_string(),
            "s".to_string(),
        );
        assert_eq!(config.base_url, "http://x");
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.magic_len, DEFAULT_MAGIC_LEN);
        assert_eq!(config.api_key(), "k");
        assert_eq!(config.hmac_secret(), "s");
    }

    #[test]
    fn test_serialize_redacts_secrets() {
        let config = ClientConfig::new(
            "http://x".to_string(),
            "my-key".to_string(),
            "my-secret".to_string(),
        );
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("[REDACTED]"));
        assert!(!json.contains("my-key"));
        assert!(!json.contains("my-secret"));

        let debug = format!("{:?}", config);
        assert!(!debug.contains("my-secret"));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"base_url":"http://x/","api_key":"k","hmac_secret":"s","magic_len":8}"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://x");
        assert_eq!(config.magic_len, 8);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let config = ClientConfig::new("http://x".to_string(), "k".to_string(), "s".to_string())
            .with_timeout_ms(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfiguration(_))
        ));
    }

    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    /// Run `f` with exactly the given `ENTITY_*` variables set
    fn with_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for name in [ENV_BASE_URL, ENV_API_KEY, ENV_HMAC_SECRET, ENV_MAGIC_LEN, ENV_TIMEOUT_MS] {
            env::remove_var(name);
        }
        for (name, value) in vars {
            env::set_var(name, value);
        }
        f()
    }

    #[test]
    fn test_from_env_reads_all_variables() {
        let config = with_env(
            &[
                (ENV_BASE_URL, "http://entity:8080/"),
                (ENV_API_KEY, "key"),
                (ENV_HMAC_SECRET, "secret"),
                (ENV_MAGIC_LEN, "8"),
                (ENV_TIMEOUT_MS, "2500"),
            ],
            ClientConfig::from_env,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://entity:8080");
        assert_eq!(config.api_key(), "key");
        assert_eq!(config.hmac_secret(), "secret");
        assert_eq!(config.magic_len, 8);
        assert_eq!(config.timeout_ms, 2500);
    }

    #[test]
    fn test_from_env_blank_values_fall_back_to_defaults() {
        let config = with_env(
            &[
                (ENV_BASE_URL, "  "),
                (ENV_API_KEY, "key"),
                (ENV_HMAC_SECRET, "secret"),
                (ENV_MAGIC_LEN, ""),
                (ENV_TIMEOUT_MS, " "),
            ],
            ClientConfig::from_env,
        )
        .unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.magic_len, DEFAULT_MAGIC_LEN);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_from_env_missing_credentials() {
        let missing_key = with_env(&[(ENV_HMAC_SECRET, "secret")], ClientConfig::from_env);
        assert!(matches!(
            missing_key,
            Err(ConfigError::MissingEnvironmentVariable(ref name)) if name == ENV_API_KEY
        ));

        let missing_secret = with_env(&[(ENV_API_KEY, "key")], ClientConfig::from_env);
        assert!(matches!(
            missing_secret,
            Err(ConfigError::MissingEnvironmentVariable(ref name)) if name == ENV_HMAC_SECRET
        ));
    }

    #[test]
    fn test_from_env_rejects_non_numeric_values() {
        let credentials = [(ENV_API_KEY, "key"), (ENV_HMAC_SECRET, "secret")];

        let bad_magic = with_env(
            &[credentials[0], credentials[1], (ENV_MAGIC_LEN, "four")],
            ClientConfig::from_env,
        );
        assert!(matches!(bad_magic, Err(ConfigError::InvalidConfiguration(_))));

        let bad_timeout = with_env(
            &[credentials[0], credentials[1], (ENV_TIMEOUT_MS, "10s")],
            ClientConfig::from_env,
        );
        assert!(matches!(bad_timeout, Err(ConfigError::InvalidConfiguration(_))));
    }
}
