//! Shelter records and the local override layer.
//!
//! Shelter data is owned by the external backend; this crate never writes it
//! back. What it does own is a sparse patch layer the administrative surface
//! keeps locally: a patch carries only the display attributes it overrides,
//! and an absent field defers to whatever the backend returned.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShelterKind {
    /// Pets sheltered alongside their owners.
    Accompany,
    /// Pets sheltered in a separate companion-animal area.
    Companion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrowdLevel {
    Empty,
    Few,
    Full,
}

/// An externally-sourced shelter as rendered on the map, including the
/// attributes the local patch layer may fill in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub kind: ShelterKind,
    pub capacity: i64,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub crowd_level: Option<CrowdLevel>,
    #[serde(default)]
    pub open: Option<bool>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Local override for one shelter, keyed by the backend's shelter id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelterPatch {
    pub id: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub crowd_level: Option<CrowdLevel>,
    pub open: Option<bool>,
    pub image_url: Option<String>,
    pub note: Option<String>,
}

impl ShelterPatch {
    /// Overlay this patch onto a shelter. Ids must match; absent fields leave
    /// the shelter untouched.
    pub fn apply(&self, shelter: &mut Shelter) {
        if self.id != shelter.id {
            return;
        }
        if let Some(v) = &self.name {
            shelter.name = v.clone();
        }
        if self.address.is_some() {
            shelter.address = self.address.clone();
        }
        if self.phone.is_some() {
            shelter.phone = self.phone.clone();
        }
        if self.crowd_level.is_some() {
            shelter.crowd_level = self.crowd_level;
        }
        if self.open.is_some() {
            shelter.open = self.open;
        }
        if self.image_url.is_some() {
            shelter.image_url = self.image_url.clone();
        }
        if self.note.is_some() {
            shelter.note = self.note.clone();
        }
    }

    /// Fold a newer patch for the same shelter into this one.
    pub(crate) fn merge_from(&mut self, other: &ShelterPatch) {
        if other.name.is_some() {
            self.name = other.name.clone();
        }
        if other.address.is_some() {
            self.address = other.address.clone();
        }
        if other.phone.is_some() {
            self.phone = other.phone.clone();
        }
        if other.crowd_level.is_some() {
            self.crowd_level = other.crowd_level;
        }
        if other.open.is_some() {
            self.open = other.open;
        }
        if other.image_url.is_some() {
            self.image_url = other.image_url.clone();
        }
        if other.note.is_some() {
            self.note = other.note.clone();
        }
    }
}

/// Apply every matching patch to the fetched shelter list, for display.
pub fn overlay(shelters: &mut [Shelter], patches: &[ShelterPatch]) {
    for shelter in shelters.iter_mut() {
        let shelter_id = shelter.id.clone();
        for patch in patches.iter().filter(|p| p.id == shelter_id) {
            patch.apply(shelter);
        }
    }
}

#[cfg(test)]
#[path = "shelter_test.rs"]
mod tests;
