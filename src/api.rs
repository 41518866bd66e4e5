//! Typed client for the external backend and identity boundary.
//!
//! DESIGN
//! ======
//! The backend is REST-shaped JSON; the identity provider issues opaque
//! bearer tokens this crate forwards without interpreting. Listing endpoints
//! answer either `{ "items": [...] }` or a bare array — `ListResponse` absorbs
//! both shapes at the deserialization boundary and normalizes to one list
//! type that is all callers ever see.
//!
//! ERROR HANDLING
//! ==============
//! An unauthorized response forces one token refresh and one retry; a second
//! failure surfaces as `ApiError::Unauthorized`. There is no other retry
//! policy. Read surfaces convert errors to an empty result plus a user-facing
//! message at the UI layer, not here.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::StoreConfig;
use crate::pets::{PetForm, Species};
use crate::shelter::Shelter;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no active session")]
    NoSession,
    #[error("authorization expired")]
    Unauthorized,
    #[error("backend returned status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Source of bearer tokens. Implemented over the external identity SDK; the
/// crate never looks inside a token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// The current token, if a session exists.
    async fn current(&self) -> Option<String>;
    /// Force-refresh and return a fresh token.
    async fn forced_refresh(&self) -> Option<String>;
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Listing endpoints answer `{ items: [...] }` or a bare array. Normalize at
/// the boundary; never let the union escape it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Wrapped { items: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListResponse::Wrapped { items } | ListResponse::Bare(items) => items,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub plan: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteItem {
    pub shelter_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Pet registration payload. The backend keeps a leaner record than the local
/// form; the extra form fields stay client-side.
#[derive(Debug, Clone, Serialize)]
pub struct PetCreate {
    pub name: String,
    pub species: Species,
    pub vaccinated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_image_url: Option<String>,
}

impl From<&PetForm> for PetCreate {
    fn from(form: &PetForm) -> Self {
        Self {
            name: form.name.clone(),
            species: form.species,
            vaccinated: form.vaccine_cert_url.is_some(),
            memo: form.memo.clone(),
            certificate_image_url: form.vaccine_cert_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Hosted checkout page to hand the browser to.
    pub url: String,
}

/// Keyword/category filter for the shelter listing.
#[derive(Debug, Clone, Default)]
pub struct ShelterFilter {
    pub keyword: Option<String>,
    pub category: Option<String>,
}

// =============================================================================
// RETRY POLICY
// =============================================================================

/// Run an authorized call, retrying exactly once with a force-refreshed token
/// if the first attempt reports expiry.
pub async fn with_token_retry<T, F, Fut>(
    tokens: &dyn TokenProvider,
    call: F,
) -> Result<T, ApiError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let token = tokens.current().await.ok_or(ApiError::NoSession)?;
    match call(token).await {
        Err(ApiError::Unauthorized) => {
            let token = tokens
                .forced_refresh()
                .await
                .ok_or(ApiError::Unauthorized)?;
            call(token).await
        }
        other => other,
    }
}

fn check_status(status: reqwest::StatusCode) -> Result<(), ApiError> {
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16()));
    }
    Ok(())
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    #[must_use]
    pub fn new(config: &StoreConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `POST /auth/verify` — exchange an identity-provider token for a
    /// backend session. The response shape is backend-owned; pass it through.
    pub async fn verify_session(&self, id_token: &str) -> Result<Value, ApiError> {
        let res = self
            .http
            .post(self.url("/auth/verify"))
            .json(&serde_json::json!({ "idToken": id_token }))
            .send()
            .await?;
        check_status(res.status())?;
        Ok(res.json().await?)
    }

    /// `GET /shelters` — public listing, optionally filtered.
    pub async fn fetch_shelters(&self, filter: &ShelterFilter) -> Result<Vec<Shelter>, ApiError> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(keyword) = &filter.keyword {
            query.push(("keyword", keyword));
        }
        if let Some(category) = &filter.category {
            query.push(("category", category));
        }
        let res = self
            .http
            .get(self.url("/shelters"))
            .query(&query)
            .send()
            .await?;
        check_status(res.status())?;
        Ok(res.json::<ListResponse<Shelter>>().await?.into_items())
    }

    /// `GET /users/me`.
    pub async fn fetch_user(&self) -> Result<UserProfile, ApiError> {
        with_token_retry(self.tokens.as_ref(), |token| {
            let req = self.http.get(self.url("/users/me")).bearer_auth(token);
            async move {
                let res = req.send().await?;
                check_status(res.status())?;
                Ok(res.json().await?)
            }
        })
        .await
    }

    /// `PUT /users/me`.
    pub async fn update_user(&self, update: &UserUpdate) -> Result<UserProfile, ApiError> {
        with_token_retry(self.tokens.as_ref(), |token| {
            let req = self
                .http
                .put(self.url("/users/me"))
                .bearer_auth(token)
                .json(update);
            async move {
                let res = req.send().await?;
                check_status(res.status())?;
                Ok(res.json().await?)
            }
        })
        .await
    }

    /// `POST /users/me/pets` — register a pet profile with the backend.
    pub async fn register_pet(&self, form: &PetForm) -> Result<(), ApiError> {
        let payload = PetCreate::from(form);
        with_token_retry(self.tokens.as_ref(), |token| {
            let req = self
                .http
                .post(self.url("/users/me/pets"))
                .bearer_auth(token)
                .json(&payload);
            async move {
                let res = req.send().await?;
                check_status(res.status())
            }
        })
        .await
    }

    /// `GET /favorites` — shelter ids the user has starred.
    pub async fn list_favorites(&self) -> Result<Vec<String>, ApiError> {
        let items: Vec<FavoriteItem> = with_token_retry(self.tokens.as_ref(), |token| {
            let req = self.http.get(self.url("/favorites")).bearer_auth(token);
            async move {
                let res = req.send().await?;
                check_status(res.status())?;
                Ok(res.json::<ListResponse<FavoriteItem>>().await?.into_items())
            }
        })
        .await?;
        Ok(items.into_iter().map(|item| item.shelter_id).collect())
    }

    /// `PUT /favorites/{shelter_id}`.
    pub async fn add_favorite(&self, shelter_id: &str) -> Result<(), ApiError> {
        with_token_retry(self.tokens.as_ref(), |token| {
            let req = self
                .http
                .put(self.url(&format!("/favorites/{shelter_id}")))
                .bearer_auth(token);
            async move {
                let res = req.send().await?;
                check_status(res.status())
            }
        })
        .await
    }

    /// `DELETE /favorites/{shelter_id}`.
    pub async fn remove_favorite(&self, shelter_id: &str) -> Result<(), ApiError> {
        with_token_retry(self.tokens.as_ref(), |token| {
            let req = self
                .http
                .delete(self.url(&format!("/favorites/{shelter_id}")))
                .bearer_auth(token);
            async move {
                let res = req.send().await?;
                check_status(res.status())
            }
        })
        .await
    }

    /// `POST /premium/checkout` — create a hosted checkout session for the
    /// premium subscription.
    pub async fn create_checkout_session(&self) -> Result<CheckoutSession, ApiError> {
        with_token_retry(self.tokens.as_ref(), |token| {
            let req = self
                .http
                .post(self.url("/premium/checkout"))
                .bearer_auth(token)
                .json(&serde_json::json!({}));
            async move {
                let res = req.send().await?;
                check_status(res.status())?;
                Ok(res.json().await?)
            }
        })
        .await
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
