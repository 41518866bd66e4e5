//! Client core for a pet-friendly disaster shelter locator.
//!
//! ARCHITECTURE
//! ============
//! The UI layer on top of this crate is a thin shell: it renders forms, a map
//! with markers, and simple lists. Everything with behavior lives here:
//!
//! - `storage`: a string-keyed persistent store (the browser-storage shape)
//!   with a change broadcast so other open tabs can refresh after writes.
//! - `snapshot`: the encrypted, versioned, TTL-bound codec that wraps the
//!   store for sensitive form data.
//! - `pets`: the observable form store holding one draft pet profile plus the
//!   saved profiles, persisted through `snapshot` on every mutation.
//! - `registry`: the unencrypted notice and shelter-patch collections used by
//!   the administrative surface.
//! - `api`: the typed client for the external backend and identity provider.
//!
//! ERROR HANDLING
//! ==============
//! Persistence failures never surface to callers: corrupt or expired entries
//! read as absent and self-heal on the next write, and write failures are
//! logged and swallowed (in-memory state stays authoritative). The API client
//! is the one surface with a structured error type.

pub mod api;
pub mod config;
pub mod pets;
pub mod registry;
pub mod shelter;
pub mod snapshot;
pub mod storage;
