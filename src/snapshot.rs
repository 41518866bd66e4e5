//! Encrypted, versioned, TTL-bound snapshot persistence for form data.
//!
//! DESIGN
//! ======
//! One snapshot is one wholesale copy of the form store's state. Writes
//! re-serialize everything, stamp the current wall-clock time and schema
//! version, seal the JSON with an AEAD under a key derived from the
//! configured passphrase, and store the result as a printable envelope
//! (`sps:v1:<nonce>:<ciphertext>`, both parts base64).
//!
//! Reads run the reverse pipeline: decrypt, gate on age against the retention
//! window, run the migration hook if the stored schema version differs, then
//! hand the payload to the consumer.
//!
//! ERROR HANDLING
//! ==============
//! A snapshot that fails to decrypt or parse is treated as absent, never as an
//! error, and the unreadable entry is removed so the next write starts clean.
//! The passphrase lives in client config; the cipher hides data from casual
//! inspection, not from the device owner.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, KeyInit, Nonce};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::StoreConfig;
use crate::storage::{LocalStore, StorageError};

/// Storage key of the encrypted pet-form snapshot.
pub const FORM_ENTRY_KEY: &str = "pet-form-secure";

const ENVELOPE_PREFIX: &str = "sps:v1:";
const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("snapshot cipher failed: {0}")]
    Cipher(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The persisted unit: arbitrary JSON state plus the writer's schema version
/// and write stamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    pub version: u32,
    pub state: Value,
    /// Epoch milliseconds of the last write. Absent only in pre-stamp data.
    #[serde(default)]
    pub updated_at_ms: Option<i64>,
}

// =============================================================================
// CODEC
// =============================================================================

/// Symmetric codec for snapshot envelopes.
pub struct SnapshotCodec {
    key: [u8; 32],
}

impl SnapshotCodec {
    /// Derive the cipher key from a passphrase.
    #[must_use]
    pub fn new(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Serialize and seal an envelope into a printable string.
    pub fn encode(&self, envelope: &SnapshotEnvelope) -> Result<String, SnapshotError> {
        let plaintext = serde_json::to_vec(envelope)?;
        let nonce_bytes: [u8; NONCE_LEN] = rand::rng().random();
        let aead = ChaCha20Poly1305::new_from_slice(&self.key)
            .map_err(|e| SnapshotError::Cipher(e.to_string()))?;
        let ciphertext = aead
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
            .map_err(|e| SnapshotError::Cipher(e.to_string()))?;
        Ok(format!(
            "{ENVELOPE_PREFIX}{}:{}",
            URL_SAFE_NO_PAD.encode(nonce_bytes),
            URL_SAFE_NO_PAD.encode(ciphertext)
        ))
    }

    /// Open a stored string. Wrong key, truncated envelope, corrupt
    /// ciphertext, and malformed JSON all read as `None`.
    #[must_use]
    pub fn decode(&self, stored: &str) -> Option<SnapshotEnvelope> {
        let rest = stored.strip_prefix(ENVELOPE_PREFIX)?;
        let (nonce_b64, ciphertext_b64) = rest.split_once(':')?;
        let nonce_raw = URL_SAFE_NO_PAD.decode(nonce_b64).ok()?;
        if nonce_raw.len() != NONCE_LEN {
            return None;
        }
        let ciphertext = URL_SAFE_NO_PAD.decode(ciphertext_b64).ok()?;
        let aead = ChaCha20Poly1305::new_from_slice(&self.key).ok()?;
        let plaintext = aead
            .decrypt(Nonce::from_slice(&nonce_raw), ciphertext.as_slice())
            .ok()?;
        serde_json::from_slice(&plaintext).ok()
    }
}

// =============================================================================
// SNAPSHOT STORE
// =============================================================================

/// Version-to-version payload transform, invoked when a stored snapshot's
/// schema version differs from the current one. The second argument is the
/// stored version. The result is re-stamped with the current version on the
/// next write.
pub type MigrateFn = Box<dyn Fn(Value, u32) -> Value + Send + Sync>;

/// Encrypted snapshot slot over one `LocalStore` key.
pub struct SnapshotStore {
    store: LocalStore,
    entry_key: String,
    codec: SnapshotCodec,
    schema_version: u32,
    retention_ms: i64,
    migrate: MigrateFn,
}

impl SnapshotStore {
    #[must_use]
    pub fn new(store: LocalStore, config: &StoreConfig) -> Self {
        Self {
            store,
            entry_key: FORM_ENTRY_KEY.to_string(),
            codec: SnapshotCodec::new(&config.passphrase),
            schema_version: config.schema_version,
            retention_ms: config.retention_ms,
            // No structural migration is enforced today; the seam exists for
            // the first real schema change.
            migrate: Box::new(|state, _from| state),
        }
    }

    #[must_use]
    pub fn with_entry_key(mut self, key: impl Into<String>) -> Self {
        self.entry_key = key.into();
        self
    }

    #[must_use]
    pub fn with_migration(mut self, migrate: MigrateFn) -> Self {
        self.migrate = migrate;
        self
    }

    /// Seal the state and overwrite the stored snapshot, stamping the current
    /// time and schema version.
    pub fn save(&self, state: &Value) -> Result<(), SnapshotError> {
        let envelope = SnapshotEnvelope {
            version: self.schema_version,
            state: state.clone(),
            updated_at_ms: Some(now_ms()),
        };
        let sealed = self.codec.encode(&envelope)?;
        self.store.set(&self.entry_key, &sealed)?;
        Ok(())
    }

    /// Load the current snapshot payload, or `None` when nothing readable and
    /// fresh is stored.
    #[must_use]
    pub fn load(&self) -> Option<Value> {
        self.load_at(now_ms())
    }

    /// `load` with an explicit clock, for deterministic retention checks.
    #[must_use]
    pub fn load_at(&self, now_ms: i64) -> Option<Value> {
        let stored = self.store.get(&self.entry_key)?;
        let Some(envelope) = self.codec.decode(&stored) else {
            // Unreadable entries self-heal: drop them so the next write
            // replaces the slot.
            self.store.remove(&self.entry_key);
            return None;
        };

        // Stamp-less data predates the stamp format: it passes the gate and
        // picks up a stamp on the next write. Age exactly at the window is
        // still fresh.
        if let Some(written_ms) = envelope.updated_at_ms {
            if now_ms - written_ms > self.retention_ms {
                self.store.remove(&self.entry_key);
                return None;
            }
        }

        let mut state = envelope.state;
        if envelope.version != self.schema_version {
            state = (self.migrate)(state, envelope.version);
        }
        Some(state)
    }

    /// Drop the stored snapshot.
    pub fn clear(&self) {
        self.store.remove(&self.entry_key);
    }
}

/// Current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    let ns = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(ns / 1_000_000).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod tests;
