use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

// =============================================================================
// token retry policy
// =============================================================================

/// Provider with a fixed current token and a countable refresh path.
struct MockTokens {
    current: Option<&'static str>,
    refreshed: Option<&'static str>,
    refresh_calls: AtomicUsize,
}

impl MockTokens {
    fn new(current: Option<&'static str>, refreshed: Option<&'static str>) -> Self {
        Self { current, refreshed, refresh_calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl TokenProvider for MockTokens {
    async fn current(&self) -> Option<String> {
        self.current.map(String::from)
    }

    async fn forced_refresh(&self) -> Option<String> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refreshed.map(String::from)
    }
}

#[tokio::test]
async fn success_does_not_refresh() {
    let tokens = MockTokens::new(Some("t1"), Some("t2"));
    let result = with_token_retry(&tokens, |token| async move { Ok(token) }).await;
    assert_eq!(result.unwrap(), "t1");
    assert_eq!(tokens.refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn expiry_refreshes_and_retries_once() {
    let tokens = MockTokens::new(Some("stale"), Some("fresh"));
    let attempts = AtomicUsize::new(0);
    let result = with_token_retry(&tokens, |token| {
        attempts.fetch_add(1, Ordering::SeqCst);
        async move {
            if token == "stale" {
                Err(ApiError::Unauthorized)
            } else {
                Ok(token)
            }
        }
    })
    .await;
    assert_eq!(result.unwrap(), "fresh");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(tokens.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn second_expiry_surfaces_unauthorized() {
    let tokens = MockTokens::new(Some("stale"), Some("also-stale"));
    let attempts = AtomicUsize::new(0);
    let result: Result<(), ApiError> = with_token_retry(&tokens, |_| {
        attempts.fetch_add(1, Ordering::SeqCst);
        async { Err(ApiError::Unauthorized) }
    })
    .await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
    // No third attempt.
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn no_session_never_calls() {
    let tokens = MockTokens::new(None, Some("fresh"));
    let attempts = AtomicUsize::new(0);
    let result: Result<(), ApiError> = with_token_retry(&tokens, |_| {
        attempts.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    })
    .await;
    assert!(matches!(result, Err(ApiError::NoSession)));
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_refresh_surfaces_unauthorized() {
    let tokens = MockTokens::new(Some("stale"), None);
    let result: Result<(), ApiError> =
        with_token_retry(&tokens, |_| async { Err(ApiError::Unauthorized) }).await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(tokens.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn other_errors_pass_through_without_refresh() {
    let tokens = MockTokens::new(Some("t1"), Some("t2"));
    let result: Result<(), ApiError> =
        with_token_retry(&tokens, |_| async { Err(ApiError::Status(500)) }).await;
    assert!(matches!(result, Err(ApiError::Status(500))));
    assert_eq!(tokens.refresh_calls.load(Ordering::SeqCst), 0);
}

// =============================================================================
// status mapping
// =============================================================================

#[test]
fn unauthorized_status_maps_to_expiry() {
    let err = check_status(reqwest::StatusCode::UNAUTHORIZED).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[test]
fn other_failures_keep_their_code() {
    let err = check_status(reqwest::StatusCode::NOT_FOUND).unwrap_err();
    assert!(matches!(err, ApiError::Status(404)));
}

#[test]
fn success_statuses_pass() {
    assert!(check_status(reqwest::StatusCode::OK).is_ok());
    assert!(check_status(reqwest::StatusCode::NO_CONTENT).is_ok());
}

// =============================================================================
// wire shapes
// =============================================================================

#[test]
fn list_response_accepts_wrapped_shape() {
    let parsed: ListResponse<String> =
        serde_json::from_value(json!({"items": ["a", "b"]})).unwrap();
    assert_eq!(parsed.into_items(), vec!["a", "b"]);
}

#[test]
fn list_response_accepts_bare_array() {
    let parsed: ListResponse<String> = serde_json::from_value(json!(["a", "b"])).unwrap();
    assert_eq!(parsed.into_items(), vec!["a", "b"]);
}

#[test]
fn list_response_empty_either_way() {
    let wrapped: ListResponse<String> = serde_json::from_value(json!({"items": []})).unwrap();
    let bare: ListResponse<String> = serde_json::from_value(json!([])).unwrap();
    assert!(wrapped.into_items().is_empty());
    assert!(bare.into_items().is_empty());
}

#[test]
fn user_profile_tolerates_missing_optionals() {
    let profile: UserProfile =
        serde_json::from_value(json!({"id": "u1", "plan": "free"})).unwrap();
    assert_eq!(profile.id, "u1");
    assert!(profile.display_name.is_none());
    assert!(profile.email.is_none());
}

#[test]
fn user_update_omits_absent_fields() {
    let update = UserUpdate { display_name: Some("Momo's human".into()), email: None };
    let json = serde_json::to_value(&update).unwrap();
    assert_eq!(json, json!({"display_name": "Momo's human"}));
}

#[test]
fn pet_create_maps_form_fields() {
    let form = PetForm {
        name: "Momo".into(),
        species: Species::Dog,
        vaccine_cert_url: Some("https://img.example/cert.png".into()),
        memo: Some("scared of thunder".into()),
        ..PetForm::default()
    };
    let payload = PetCreate::from(&form);
    assert_eq!(payload.name, "Momo");
    assert_eq!(payload.species, Species::Dog);
    assert!(payload.vaccinated);
    assert_eq!(payload.memo.as_deref(), Some("scared of thunder"));
    assert_eq!(payload.certificate_image_url.as_deref(), Some("https://img.example/cert.png"));
}

#[test]
fn pet_create_without_certificate_is_unvaccinated() {
    let form = PetForm { name: "Hana".into(), species: Species::Cat, ..PetForm::default() };
    let payload = PetCreate::from(&form);
    assert!(!payload.vaccinated);
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json, json!({"name": "Hana", "species": "cat", "vaccinated": false}));
}

// =============================================================================
// client construction
// =============================================================================

#[test]
fn base_url_drops_trailing_slash() {
    let config = StoreConfig {
        api_base_url: "https://api.example.com/".into(),
        ..StoreConfig::default()
    };
    let client = ApiClient::new(&config, Arc::new(MockTokens::new(None, None)));
    assert_eq!(client.url("/shelters"), "https://api.example.com/shelters");
}
