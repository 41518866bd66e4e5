//! Notice and shelter-patch registries.
//!
//! The deliberately simpler sibling of the form store's persistence stack:
//! two independent collections kept as plain JSON lists in the shared store.
//! No encryption, no retention window, no versioning — this is low-sensitivity
//! administrative content. Every save broadcasts through the store's change
//! channel so other open tabs can refresh.

use serde::Serialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;
use uuid::Uuid;

use crate::shelter::ShelterPatch;
use crate::storage::LocalStore;

/// Storage key of the announcement list.
pub const NOTICE_KEY: &str = "admin-notices";
/// Storage key of the shelter patch list.
pub const PATCH_KEY: &str = "shelter-patches";

/// One announcement published by the administrative surface.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct Notice {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Creation time, RFC 3339.
    pub created_at: String,
    /// Set by the consumer surface when the resident has seen it.
    #[serde(default)]
    pub read: bool,
}

// =============================================================================
// NOTICE BOARD
// =============================================================================

/// Announcement registry, newest first.
pub struct NoticeBoard {
    store: LocalStore,
}

impl NoticeBoard {
    #[must_use]
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Load every notice; corrupt or absent data reads as an empty list.
    #[must_use]
    pub fn load_all(&self) -> Vec<Notice> {
        load_list(&self.store, NOTICE_KEY)
    }

    /// Overwrite the whole list and broadcast the change.
    pub fn save_all(&self, list: &[Notice]) {
        save_list(&self.store, NOTICE_KEY, list);
    }

    /// Publish a new notice: fresh id and timestamp, prepended, persisted.
    pub fn add(&self, title: &str, body: &str) -> Notice {
        let notice = Notice {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            body: body.to_string(),
            created_at: now_rfc3339(),
            read: false,
        };
        let mut list = self.load_all();
        list.insert(0, notice.clone());
        self.save_all(&list);
        notice
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.load_all().iter().filter(|n| !n.read).count()
    }

    /// Flag every notice as read.
    pub fn mark_all_read(&self) {
        let mut list = self.load_all();
        for notice in &mut list {
            notice.read = true;
        }
        self.save_all(&list);
    }
}

// =============================================================================
// PATCH SET
// =============================================================================

/// Shelter override registry.
pub struct PatchSet {
    store: LocalStore,
}

impl PatchSet {
    #[must_use]
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn load_all(&self) -> Vec<ShelterPatch> {
        load_list(&self.store, PATCH_KEY)
    }

    pub fn save_all(&self, list: &[ShelterPatch]) {
        save_list(&self.store, PATCH_KEY, list);
    }

    /// Merge into the existing patch for the same shelter, or prepend a new
    /// one.
    pub fn upsert(&self, patch: ShelterPatch) {
        let mut list = self.load_all();
        match list.iter_mut().find(|p| p.id == patch.id) {
            Some(existing) => existing.merge_from(&patch),
            None => list.insert(0, patch),
        }
        self.save_all(&list);
    }

    /// Drop the patch for the given shelter id, if any.
    pub fn remove(&self, id: &str) {
        let mut list = self.load_all();
        let before = list.len();
        list.retain(|p| p.id != id);
        if list.len() != before {
            self.save_all(&list);
        }
    }
}

fn load_list<T: DeserializeOwned>(store: &LocalStore, key: &str) -> Vec<T> {
    store
        .get(key)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

fn save_list<T: Serialize>(store: &LocalStore, key: &str, list: &[T]) {
    let raw = match serde_json::to_string(list) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, key, "registry serialize failed; skipping save");
            return;
        }
    };
    if let Err(e) = store.set(key, &raw) {
        warn!(error = %e, key, "registry write failed");
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::new())
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
