//! Admin routes: nightline registry, API keys and the status catalog.

use crate::api::AppState;
use crate::api::auth::Authorization;
use crate::api::error::{ApiResult, Message};
use crate::config::statuses::StatusConfig;
use crate::core::nightline::{self, NightlineFilter, NightlineView};
use crate::core::{api_key, status};
use crate::entities::StatusModel;
use crate::errors::Error;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct KeyResponse {
    name: String,
    api_key: String,
}

/// Routes mounted under `/admin`.
pub fn route() -> Router<AppState> {
    Router::new()
        .route("/nightline/all", get(list_nightlines))
        .route(
            "/nightline/:name",
            get(show_nightline)
                .post(register_nightline)
                .delete(deregister_nightline),
        )
        .route("/nightline/:name/key", get(show_key).patch(renew_key))
        .route("/status", post(add_status))
        .route("/status/all", get(list_statuses))
        .route("/status/:name", get(show_status).delete(remove_status))
}

async fn list_nightlines(
    auth: Authorization,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<NightlineView>>> {
    auth.require_admin()?;
    Ok(Json(
        nightline::list_nightlines(&*state.db, &NightlineFilter::default()).await,
    ))
}

async fn show_nightline(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<NightlineView>> {
    auth.require_admin()?;
    Ok(Json(nightline::get_public_view(&*state.db, &name).await?))
}

async fn register_nightline(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<(StatusCode, Json<KeyResponse>)> {
    auth.require_admin()?;
    let created = nightline::register(&*state.db, &name).await?;
    let key = api_key::get_for_nightline(&*state.db, created.id)
        .await?
        .ok_or_else(|| Error::ApiKeyNotFound {
            nightline: created.name.clone(),
        })?;
    Ok((
        StatusCode::CREATED,
        Json(KeyResponse {
            name: created.name,
            api_key: key.key,
        }),
    ))
}

async fn deregister_nightline(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Message>> {
    auth.require_admin()?;
    let removed = nightline::deregister(&*state.db, state.store.as_ref(), &name).await?;
    Ok(Message::new(format!("Nightline '{}' deleted", removed.name)))
}

async fn show_key(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<KeyResponse>> {
    auth.require_admin()?;
    let target = nightline::require_nightline(&*state.db, &name).await?;
    let key = api_key::get_for_nightline(&*state.db, target.id)
        .await?
        .ok_or_else(|| Error::ApiKeyNotFound {
            nightline: target.name.clone(),
        })?;
    Ok(Json(KeyResponse {
        name: target.name,
        api_key: key.key,
    }))
}

async fn renew_key(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<KeyResponse>> {
    auth.require_admin()?;
    let target = nightline::require_nightline(&*state.db, &name).await?;
    let key = api_key::renew(&*state.db, &target).await?;
    Ok(Json(KeyResponse {
        name: target.name,
        api_key: key.key,
    }))
}

async fn list_statuses(
    auth: Authorization,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StatusModel>>> {
    auth.require_admin()?;
    Ok(Json(status::list_statuses(&*state.db).await))
}

async fn show_status(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<StatusModel>> {
    auth.require_admin()?;
    Ok(Json(status::require_status(&*state.db, &name).await?))
}

async fn add_status(
    auth: Authorization,
    State(state): State<AppState>,
    Json(definition): Json<StatusConfig>,
) -> ApiResult<(StatusCode, Json<StatusModel>)> {
    auth.require_admin()?;
    let created = status::add_status(&*state.db, &definition).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn remove_status(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Message>> {
    auth.require_admin()?;
    let removed = status::remove_status(&*state.db, state.store.as_ref(), &name).await?;
    Ok(Message::new(format!("Status '{}' deleted", removed.name)))
}
