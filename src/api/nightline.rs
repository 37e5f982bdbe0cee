//! Routes a nightline uses to manage itself.
//!
//! Every route takes the nightline's own API key or the admin key.

use crate::api::AppState;
use crate::api::auth::Authorization;
use crate::api::error::{ApiError, ApiResult, Message};
use crate::core::workflow::{self, StatusUpdate, StorySync};
use crate::core::{instagram, nightline};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{patch, post},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Largest accepted upload request
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
}

#[derive(Debug, Deserialize)]
struct StoryConfigBody {
    status: String,
    instagram_story: bool,
}

#[derive(Debug, Deserialize)]
struct NowBody {
    now: bool,
}

#[derive(Debug, Deserialize)]
struct AccountBody {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct AccountUpdateBody {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    message: String,
    status: String,
    story: StorySync,
    partial_failure: bool,
}

impl From<StatusUpdate> for StatusResponse {
    fn from(update: StatusUpdate) -> Self {
        let partial_failure = update.is_partial_failure();
        let message = if partial_failure {
            format!(
                "Status of '{}' set to '{}', but the Instagram story could not be updated",
                update.nightline.name, update.status
            )
        } else {
            format!(
                "Status of '{}' set to '{}'",
                update.nightline.name, update.status
            )
        };
        Self {
            message,
            status: update.status,
            story: update.story,
            partial_failure,
        }
    }
}

/// Routes mounted under `/nightline`.
pub fn route() -> Router<AppState> {
    Router::new()
        .route("/:name/status", patch(update_status).delete(reset_status))
        .route("/:name/status/config", patch(update_story_config))
        .route("/:name/now", patch(update_now))
        .route(
            "/:name/instagram",
            post(add_account).patch(update_account).delete(delete_account),
        )
        .route(
            "/:name/story",
            post(upload_slide)
                .delete(remove_slide)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

async fn update_status(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<StatusResponse>> {
    let target = auth.nightline(&state, &name).await?;
    let update =
        workflow::update_status(&*state.db, state.story_services(), &target.name, &body.status)
            .await?;
    Ok(Json(update.into()))
}

async fn reset_status(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let target = auth.nightline(&state, &name).await?;
    let update = workflow::reset_status(&*state.db, state.story_services(), &target.name).await?;
    Ok(Json(update.into()))
}

async fn update_story_config(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<StoryConfigBody>,
) -> ApiResult<Json<Message>> {
    let target = auth.nightline(&state, &name).await?;
    workflow::update_story_config(&*state.db, &target.name, &body.status, body.instagram_story)
        .await?;
    let switch = if body.instagram_story { "enabled" } else { "disabled" };
    Ok(Message::new(format!(
        "Instagram story {switch} for status '{}'",
        body.status
    )))
}

async fn update_now(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<NowBody>,
) -> ApiResult<Json<Message>> {
    let target = auth.nightline(&state, &name).await?;
    let updated = nightline::set_now(&*state.db, &target, body.now).await?;
    Ok(Message::new(format!(
        "Now of '{}' set to {}",
        updated.name, updated.now
    )))
}

async fn add_account(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<AccountBody>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let target = auth.nightline(&state, &name).await?;
    instagram::add_account(
        &*state.db,
        &state.cipher,
        &target,
        &body.username,
        &body.password,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Message::new(format!("Instagram account added for '{}'", target.name)),
    ))
}

async fn update_account(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<AccountUpdateBody>,
) -> ApiResult<Json<Message>> {
    let target = auth.nightline(&state, &name).await?;
    if body.username.is_none() && body.password.is_none() {
        return Err(ApiError::BadRequest(
            "Provide 'username', 'password' or both".to_string(),
        ));
    }
    if let Some(username) = &body.username {
        instagram::update_username(&*state.db, &target, username).await?;
    }
    if let Some(password) = &body.password {
        instagram::update_password(&*state.db, &state.cipher, &target, password).await?;
    }
    Ok(Message::new(format!(
        "Instagram account updated for '{}'",
        target.name
    )))
}

async fn delete_account(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Message>> {
    let target = auth.nightline(&state, &name).await?;
    instagram::delete_account(&*state.db, &target).await?;
    Ok(Message::new(format!(
        "Instagram account removed for '{}'",
        target.name
    )))
}

fn multipart_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(format!("Invalid multipart body: {e}"))
}

async fn upload_slide(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let target = auth.nightline(&state, &name).await?;

    let mut status = None;
    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("status") => status = Some(field.text().await.map_err(multipart_error)?),
            Some("image") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                image = Some((filename, data));
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }
    let status = status
        .map(|value| value.trim().to_string())
        .ok_or_else(|| ApiError::BadRequest("Missing 'status' field".to_string()))?;
    let (filename, data) =
        image.ok_or_else(|| ApiError::BadRequest("Missing 'image' field".to_string()))?;

    workflow::upload_story_slide(
        &*state.db,
        state.store.as_ref(),
        &target.name,
        &status,
        &filename,
        &data,
    )
    .await?;
    info!(
        "Story slide for '{}' uploaded by nightline '{}'",
        status, target.name
    );
    Ok((
        StatusCode::CREATED,
        Message::new(format!("Story slide uploaded for status '{status}'")),
    ))
}

async fn remove_slide(
    auth: Authorization,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<Message>> {
    let target = auth.nightline(&state, &name).await?;
    workflow::remove_story_slide(&*state.db, state.store.as_ref(), &target.name, &body.status)
        .await?;
    Ok(Message::new(format!(
        "Story slide removed for status '{}'",
        body.status
    )))
}
