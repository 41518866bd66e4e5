//! Runtime configuration.
//!
//! Every knob comes from an environment variable with a working default, so
//! the crate runs in development with zero setup. The form-store passphrase
//! ships in client configuration: it obfuscates casual inspection of stored
//! data and is not a secrecy boundary against the device owner.

const DEFAULT_PASSPHRASE: &str = "dev-only-change-me";
const DEFAULT_RETENTION_MS: i64 = 7 * 24 * 60 * 60 * 1000;
const DEFAULT_SCHEMA_VERSION: u32 = 2;
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Settings for the persistence stack and the backend client.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Passphrase for the encrypted form snapshot.
    pub passphrase: String,
    /// Retention window for persisted form snapshots, in milliseconds.
    pub retention_ms: i64,
    /// Schema version stamped on every snapshot write.
    pub schema_version: u32,
    /// Base URL of the external backend.
    pub api_base_url: String,
}

impl StoreConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            passphrase: env_string("PETFORM_ENC_KEY", DEFAULT_PASSPHRASE),
            retention_ms: env_parse("PETFORM_TTL_MS", DEFAULT_RETENTION_MS),
            schema_version: env_parse("PETFORM_SCHEMA_VERSION", DEFAULT_SCHEMA_VERSION),
            api_base_url: env_string("API_BASE_URL", DEFAULT_API_BASE_URL),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            passphrase: DEFAULT_PASSPHRASE.into(),
            retention_ms: DEFAULT_RETENTION_MS,
            schema_version: DEFAULT_SCHEMA_VERSION,
            api_base_url: DEFAULT_API_BASE_URL.into(),
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
