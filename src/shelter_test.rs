use super::*;
use serde_json::json;

fn shelter(id: &str) -> Shelter {
    Shelter {
        id: id.to_string(),
        name: "Chuo Park Shelter".into(),
        address: Some("1-2-3 Chuo".into()),
        kind: ShelterKind::Accompany,
        capacity: 120,
        lat: 35.34,
        lng: 139.49,
        phone: None,
        crowd_level: None,
        open: None,
        image_url: None,
        note: None,
    }
}

// =============================================================================
// patch overlay
// =============================================================================

#[test]
fn apply_overrides_present_fields() {
    let mut s = shelter("s1");
    let patch = ShelterPatch {
        id: "s1".into(),
        name: Some("Chuo Park (annex)".into()),
        crowd_level: Some(CrowdLevel::Few),
        open: Some(true),
        ..ShelterPatch::default()
    };
    patch.apply(&mut s);
    assert_eq!(s.name, "Chuo Park (annex)");
    assert_eq!(s.crowd_level, Some(CrowdLevel::Few));
    assert_eq!(s.open, Some(true));
}

#[test]
fn apply_leaves_absent_fields_untouched() {
    let mut s = shelter("s1");
    let patch = ShelterPatch { id: "s1".into(), open: Some(false), ..ShelterPatch::default() };
    patch.apply(&mut s);
    assert_eq!(s.name, "Chuo Park Shelter");
    assert_eq!(s.address.as_deref(), Some("1-2-3 Chuo"));
    assert!(s.phone.is_none());
}

#[test]
fn apply_with_mismatched_id_is_noop() {
    let mut s = shelter("s1");
    let before = s.clone();
    let patch = ShelterPatch { id: "s2".into(), name: Some("Wrong".into()), ..ShelterPatch::default() };
    patch.apply(&mut s);
    assert_eq!(s, before);
}

#[test]
fn overlay_patches_matching_shelters_only() {
    let mut shelters = vec![shelter("s1"), shelter("s2")];
    let patches = vec![ShelterPatch {
        id: "s2".into(),
        note: Some("bring cages".into()),
        ..ShelterPatch::default()
    }];
    overlay(&mut shelters, &patches);
    assert!(shelters[0].note.is_none());
    assert_eq!(shelters[1].note.as_deref(), Some("bring cages"));
}

// =============================================================================
// patch merge
// =============================================================================

#[test]
fn merge_from_overrides_present_and_keeps_rest() {
    let mut base = ShelterPatch {
        id: "s1".into(),
        name: Some("Old name".into()),
        open: Some(true),
        ..ShelterPatch::default()
    };
    let newer = ShelterPatch {
        id: "s1".into(),
        open: Some(false),
        crowd_level: Some(CrowdLevel::Full),
        ..ShelterPatch::default()
    };
    base.merge_from(&newer);
    assert_eq!(base.name.as_deref(), Some("Old name"));
    assert_eq!(base.open, Some(false));
    assert_eq!(base.crowd_level, Some(CrowdLevel::Full));
}

// =============================================================================
// wire shape
// =============================================================================

#[test]
fn shelter_deserializes_backend_shape() {
    let s: Shelter = serde_json::from_value(json!({
        "id": "s1",
        "name": "Chuo Park Shelter",
        "address": "1-2-3 Chuo",
        "type": "accompany",
        "capacity": 120,
        "lat": 35.34,
        "lng": 139.49
    }))
    .unwrap();
    assert_eq!(s.kind, ShelterKind::Accompany);
    assert!(s.crowd_level.is_none());
}

#[test]
fn crowd_level_serializes_lowercase() {
    assert_eq!(serde_json::to_value(CrowdLevel::Empty).unwrap(), "empty");
    assert_eq!(serde_json::to_value(CrowdLevel::Few).unwrap(), "few");
    assert_eq!(serde_json::to_value(CrowdLevel::Full).unwrap(), "full");
}

#[test]
fn shelter_kind_round_trips() {
    let kind: ShelterKind = serde_json::from_value(json!("companion")).unwrap();
    assert_eq!(kind, ShelterKind::Companion);
    assert_eq!(serde_json::to_value(kind).unwrap(), "companion");
}
