//! Request authorization.
//!
//! The raw `Authorization` header carries either the admin key or a nightline's API key.
//! It is resolved once per request into an [`Authorization`] that handlers match on.

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::core::{api_key, nightline};
use crate::entities::NightlineModel;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use tracing::{debug, warn};

/// Who is calling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// Presented the admin key
    Admin,
    /// Presented the key of the nightline with this id
    Owner(i32),
    /// Presented a key nobody owns
    Unauthorized,
}

impl Authorization {
    /// Resolves a presented key.
    pub async fn resolve(state: &AppState, presented: &str) -> ApiResult<Self> {
        if state
            .admin_api_key
            .as_deref()
            .is_some_and(|admin| admin == presented)
        {
            return Ok(Self::Admin);
        }
        match api_key::authenticate(&*state.db, presented).await? {
            Some(owner) => Ok(Self::Owner(owner.id)),
            None => Ok(Self::Unauthorized),
        }
    }

    /// Fails unless the caller is the admin.
    pub const fn require_admin(self) -> ApiResult<()> {
        match self {
            Self::Admin => Ok(()),
            Self::Owner(_) | Self::Unauthorized => Err(ApiError::Forbidden),
        }
    }

    /// Loads `name` if the caller may act on it: the admin for every nightline, an owner
    /// only for its own. Unknown nightlines are 404 for the admin and 403 otherwise.
    pub async fn nightline(self, state: &AppState, name: &str) -> ApiResult<NightlineModel> {
        match self {
            Self::Admin => Ok(nightline::require_nightline(&*state.db, name).await?),
            Self::Owner(id) => match nightline::get_nightline(&*state.db, name).await? {
                Some(target) if target.id == id => Ok(target),
                _ => {
                    warn!("Key of nightline {} used for '{}'", id, name);
                    Err(ApiError::Forbidden)
                }
            },
            Self::Unauthorized => Err(ApiError::Forbidden),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Authorization {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
            debug!("Request without Authorization header");
            return Err(ApiError::MissingAuthorization);
        };
        let Ok(presented) = value.to_str() else {
            return Ok(Self::Unauthorized);
        };
        Self::resolve(state, presented.trim()).await
    }
}
