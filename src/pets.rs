//! Pet profile form store.
//!
//! DESIGN
//! ======
//! One in-memory store owns the single in-progress draft plus the saved
//! profiles, exposing only the enumerated mutation operations. Every mutation
//! is synchronous against memory and then persists the whole state through
//! the encrypted snapshot stack as a fire-and-forget side effect.
//!
//! ERROR HANDLING
//! ==============
//! A failed snapshot write does not roll back the in-memory mutation and does
//! not surface to the caller: the UI and the persisted copy may diverge until
//! the next successful write. That trade-off is accepted — losing a keystroke
//! of draft state beats blocking the form on storage quota.

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::snapshot::SnapshotStore;

// =============================================================================
// FORM DATA
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Dog,
    Cat,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Girl,
    Boy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeuterStatus {
    NotYet,
    Done,
}

/// The draft record: one pet profile as edited in the registration form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetForm {
    pub name: String,
    pub species: Species,
    /// Free-text species when `species` is `Other`.
    pub species_other: Option<String>,
    pub breed: String,
    pub photo_url: Option<String>,
    pub gender: Option<Gender>,
    pub birthdate: Option<String>,
    pub neutered: Option<NeuterStatus>,
    pub vaccine_cert_url: Option<String>,
    pub rabies_cert_url: Option<String>,
    pub clinic_name: Option<String>,
    pub history: Option<String>,
    pub medication: Option<String>,
    pub memo: Option<String>,
}

impl Default for PetForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            species: Species::Dog,
            species_other: None,
            breed: String::new(),
            photo_url: None,
            gender: None,
            birthdate: None,
            neutered: None,
            vaccine_cert_url: None,
            rabies_cert_url: None,
            clinic_name: None,
            history: None,
            medication: None,
            memo: None,
        }
    }
}

/// A finalized pet profile, distinguished from the draft by its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetRecord {
    pub id: String,
    #[serde(flatten)]
    pub form: PetForm,
}

/// One field-set mutation against the draft.
#[derive(Debug, Clone)]
pub enum DraftField {
    Name(String),
    Species(Species),
    SpeciesOther(Option<String>),
    Breed(String),
    PhotoUrl(Option<String>),
    Gender(Option<Gender>),
    Birthdate(Option<String>),
    Neutered(Option<NeuterStatus>),
    VaccineCertUrl(Option<String>),
    RabiesCertUrl(Option<String>),
    ClinicName(Option<String>),
    History(Option<String>),
    Medication(Option<String>),
    Memo(Option<String>),
}

/// Sparse update against a saved profile; present fields override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PetPatch {
    pub name: Option<String>,
    pub species: Option<Species>,
    pub species_other: Option<String>,
    pub breed: Option<String>,
    pub photo_url: Option<String>,
    pub gender: Option<Gender>,
    pub birthdate: Option<String>,
    pub neutered: Option<NeuterStatus>,
    pub vaccine_cert_url: Option<String>,
    pub rabies_cert_url: Option<String>,
    pub clinic_name: Option<String>,
    pub history: Option<String>,
    pub medication: Option<String>,
    pub memo: Option<String>,
}

impl PetPatch {
    fn apply_to(&self, form: &mut PetForm) {
        if let Some(v) = &self.name {
            form.name = v.clone();
        }
        if let Some(v) = self.species {
            form.species = v;
        }
        if self.species_other.is_some() {
            form.species_other = self.species_other.clone();
        }
        if let Some(v) = &self.breed {
            form.breed = v.clone();
        }
        if self.photo_url.is_some() {
            form.photo_url = self.photo_url.clone();
        }
        if self.gender.is_some() {
            form.gender = self.gender;
        }
        if self.birthdate.is_some() {
            form.birthdate = self.birthdate.clone();
        }
        if self.neutered.is_some() {
            form.neutered = self.neutered;
        }
        if self.vaccine_cert_url.is_some() {
            form.vaccine_cert_url = self.vaccine_cert_url.clone();
        }
        if self.rabies_cert_url.is_some() {
            form.rabies_cert_url = self.rabies_cert_url.clone();
        }
        if self.clinic_name.is_some() {
            form.clinic_name = self.clinic_name.clone();
        }
        if self.history.is_some() {
            form.history = self.history.clone();
        }
        if self.medication.is_some() {
            form.medication = self.medication.clone();
        }
        if self.memo.is_some() {
            form.memo = self.memo.clone();
        }
    }
}

// =============================================================================
// FORM STORE
// =============================================================================

/// Snapshot payload shape. Missing keys in older snapshots fall back to
/// defaults instead of failing the load.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct FormState {
    data: PetForm,
    pets: Vec<PetRecord>,
}

/// The observable form state container.
pub struct FormStore {
    draft: PetForm,
    pets: Vec<PetRecord>,
    snapshots: SnapshotStore,
}

impl FormStore {
    /// Hydrate from the snapshot store. Absent, expired, or structurally
    /// unusable snapshots yield the pristine defaults.
    #[must_use]
    pub fn load(snapshots: SnapshotStore) -> Self {
        let state = snapshots
            .load()
            .and_then(|value| serde_json::from_value::<FormState>(value).ok())
            .unwrap_or_default();
        Self { draft: state.data, pets: state.pets, snapshots }
    }

    #[must_use]
    pub fn draft(&self) -> &PetForm {
        &self.draft
    }

    #[must_use]
    pub fn pets(&self) -> &[PetRecord] {
        &self.pets
    }

    /// Replace one field of the draft.
    pub fn set_field(&mut self, field: DraftField) {
        match field {
            DraftField::Name(v) => self.draft.name = v,
            DraftField::Species(v) => self.draft.species = v,
            DraftField::SpeciesOther(v) => self.draft.species_other = v,
            DraftField::Breed(v) => self.draft.breed = v,
            DraftField::PhotoUrl(v) => self.draft.photo_url = v,
            DraftField::Gender(v) => self.draft.gender = v,
            DraftField::Birthdate(v) => self.draft.birthdate = v,
            DraftField::Neutered(v) => self.draft.neutered = v,
            DraftField::VaccineCertUrl(v) => self.draft.vaccine_cert_url = v,
            DraftField::RabiesCertUrl(v) => self.draft.rabies_cert_url = v,
            DraftField::ClinicName(v) => self.draft.clinic_name = v,
            DraftField::History(v) => self.draft.history = v,
            DraftField::Medication(v) => self.draft.medication = v,
            DraftField::Memo(v) => self.draft.memo = v,
        }
        self.persist();
    }

    /// Save a pet profile. With `None`, the current draft is promoted under a
    /// fresh identifier and the draft resets; with a record, it is inserted
    /// directly and the draft is untouched. Either way the stored identifier
    /// is unique among saved profiles.
    pub fn add_pet(&mut self, record: Option<PetRecord>) -> PetRecord {
        let record = match record {
            Some(mut record) => {
                let taken =
                    record.id.is_empty() || self.pets.iter().any(|p| p.id == record.id);
                if taken {
                    record.id = Uuid::new_v4().to_string();
                }
                record
            }
            None => PetRecord {
                id: Uuid::new_v4().to_string(),
                form: std::mem::take(&mut self.draft),
            },
        };
        self.pets.insert(0, record.clone());
        self.persist();
        record
    }

    /// Merge a patch into the profile with the given id. Unknown ids are a
    /// silent no-op.
    pub fn update_pet(&mut self, id: &str, patch: &PetPatch) {
        let Some(record) = self.pets.iter_mut().find(|p| p.id == id) else {
            return;
        };
        patch.apply_to(&mut record.form);
        self.persist();
    }

    /// Remove the profile with the given id. Unknown ids are a silent no-op.
    pub fn remove_pet(&mut self, id: &str) {
        let before = self.pets.len();
        self.pets.retain(|p| p.id != id);
        if self.pets.len() != before {
            self.persist();
        }
    }

    /// Replace the draft with the pristine initial form. Saved profiles are
    /// untouched.
    pub fn reset_draft(&mut self) {
        self.draft = PetForm::default();
        self.persist();
    }

    /// Drop the persisted snapshot without touching in-memory state.
    pub fn clear_persisted(&self) {
        self.snapshots.clear();
    }

    fn persist(&self) {
        let state = FormState { data: self.draft.clone(), pets: self.pets.clone() };
        let value = match serde_json::to_value(&state) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "form state serialize failed; skipping persist");
                return;
            }
        };
        if let Err(e) = self.snapshots.save(&value) {
            // In-memory state stays authoritative; the next successful write
            // overwrites whatever the store holds.
            warn!(error = %e, "form snapshot write failed");
        }
    }
}

#[cfg(test)]
#[path = "pets_test.rs"]
mod tests;
