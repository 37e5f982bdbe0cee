//! Status update workflows - Compose the registry steps the HTTP layer exposes.
//!
//! The status pointer is always committed before the external story is touched. When the
//! story step fails afterwards the workflow still succeeds, and the returned
//! [`StatusUpdate`] reports the failed story sync so the caller can tell the user.

use crate::{
    core::{nightline, nightline_status, status, story_slide, validation},
    crypto::PasswordCipher,
    entities::{NightlineModel, NightlineStatusModel, StatusModel, StorySlideModel},
    errors::{Error, Result},
    storage::BlobStore,
    story::StoryPublisher,
};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use tracing::{error, info, warn};

/// Collaborators needed to sync the external story.
#[derive(Clone, Copy)]
pub struct StoryServices<'a> {
    /// Story platform client
    pub publisher: &'a dyn StoryPublisher,
    /// Decrypts account passwords
    pub cipher: &'a PasswordCipher,
}

/// What happened to the external story during a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StorySync {
    /// Nothing to do for this status
    Skipped,
    /// A new story was posted
    Posted {
        /// Media id of the new story
        media_id: String,
    },
    /// The previous story was deleted
    Removed,
    /// The story step failed after the status change committed
    Failed {
        /// Error message of the failed step
        reason: String,
    },
}

/// Outcome of a status update or reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// The nightline after the workflow
    pub nightline: NightlineModel,
    /// Status the nightline is now in
    pub status: String,
    /// External story result
    pub story: StorySync,
}

impl StatusUpdate {
    /// Status committed, story sync failed.
    #[must_use]
    pub const fn is_partial_failure(&self) -> bool {
        matches!(self.story, StorySync::Failed { .. })
    }
}

fn story_failed(nightline: &str, e: &Error) -> StorySync {
    error!("Story sync for '{}' failed: {}", nightline, e);
    StorySync::Failed {
        reason: e.to_string(),
    }
}

async fn sync_story<C>(
    db: &C,
    services: StoryServices<'_>,
    updated: &NightlineModel,
    status_name: &str,
) -> StorySync
where
    C: ConnectionTrait,
{
    let enabled = match nightline::get_instagram_story_config(db, updated).await {
        Ok(enabled) => enabled,
        Err(e) => return story_failed(&updated.name, &e),
    };
    if !enabled {
        return StorySync::Skipped;
    }

    // Replace, never stack, stories
    let mut current = updated.clone();
    if current.instagram_media_id.is_some() {
        match nightline::delete_instagram_story(db, services.publisher, services.cipher, &current)
            .await
        {
            Ok(_) => current.instagram_media_id = None,
            Err(e) => warn!(
                "Could not remove previous story of '{}', posting anyway: {}",
                current.name, e
            ),
        }
    }

    match nightline::post_instagram_story(
        db,
        services.publisher,
        services.cipher,
        &current,
        status_name,
    )
    .await
    {
        Ok(nightline::StoryPost::Posted { media_id }) => StorySync::Posted { media_id },
        Ok(nightline::StoryPost::NotConfigured) => StorySync::Skipped,
        Err(e) => story_failed(&current.name, &e),
    }
}

/// Moves a nightline to `status_name` and posts the matching story if configured.
///
/// # Errors
/// Fails only when the status change itself fails ([`Error::Validation`],
/// [`Error::NightlineNotFound`], [`Error::StatusNotFound`] or a database error).
pub async fn update_status<C>(
    db: &C,
    services: StoryServices<'_>,
    nightline_name: &str,
    status_name: &str,
) -> Result<StatusUpdate>
where
    C: ConnectionTrait,
{
    validation::validate_status_name(status_name)?;
    let target = nightline::require_nightline(db, nightline_name).await?;
    let updated = nightline::set_status(db, &target, status_name).await?;

    let story = sync_story(db, services, &updated, status_name).await;
    let nightline = nightline::require_nightline(db, nightline_name).await?;
    info!(
        "Status update of '{}' to '{}' finished, story: {:?}",
        nightline_name, status_name, story
    );
    Ok(StatusUpdate {
        nightline,
        status: status_name.to_string(),
        story,
    })
}

/// Resets a nightline to `default` and removes its story.
///
/// # Errors
/// Fails only when the reset itself fails; a failed story removal is reported in the result.
pub async fn reset_status<C>(
    db: &C,
    services: StoryServices<'_>,
    nightline_name: &str,
) -> Result<StatusUpdate>
where
    C: ConnectionTrait,
{
    let target = nightline::require_nightline(db, nightline_name).await?;
    let updated = nightline::reset_status(db, &target).await?;

    let story =
        match nightline::delete_instagram_story(db, services.publisher, services.cipher, &updated)
            .await
        {
            Ok(nightline::StoryDeletion::Deleted) => StorySync::Removed,
            Ok(nightline::StoryDeletion::NothingToDelete) => StorySync::Skipped,
            Err(e) => story_failed(nightline_name, &e),
        };
    let nightline = nightline::require_nightline(db, nightline_name).await?;
    Ok(StatusUpdate {
        nightline,
        status: crate::config::DEFAULT_STATUS.to_string(),
        story,
    })
}

async fn resolve_pair<C>(
    db: &C,
    nightline_name: &str,
    status_name: &str,
) -> Result<(NightlineModel, StatusModel, NightlineStatusModel)>
where
    C: ConnectionTrait,
{
    validation::validate_status_name(status_name)?;
    let target = nightline::require_nightline(db, nightline_name).await?;
    let target_status = status::require_status(db, status_name).await?;
    let config = nightline_status::get_config(db, target.id, target_status.id)
        .await?
        .ok_or_else(|| {
            warn!(
                "Configuration row missing for nightline '{}' and status '{}'",
                nightline_name, status_name
            );
            Error::ConfigNotFound {
                nightline: nightline_name.to_string(),
                status: status_name.to_string(),
            }
        })?;
    Ok((target, target_status, config))
}

/// Turns story posting on or off for one status of a nightline.
///
/// # Errors
/// [`Error::Validation`] when enabling without a bound slide.
pub async fn update_story_config<C>(
    db: &C,
    nightline_name: &str,
    status_name: &str,
    enabled: bool,
) -> Result<NightlineStatusModel>
where
    C: ConnectionTrait,
{
    let (target, target_status, config) = resolve_pair(db, nightline_name, status_name).await?;
    if enabled && story_slide::lookup(db, &config).await?.is_none() {
        return Err(Error::validation(format!(
            "Upload a story slide for status '{status_name}' before enabling stories"
        )));
    }
    nightline_status::set_story_enabled(db, &target, &target_status, enabled).await
}

/// Stores the slide of one status of a nightline, replacing any previous one.
pub async fn upload_story_slide<C>(
    db: &C,
    store: &dyn BlobStore,
    nightline_name: &str,
    status_name: &str,
    filename: &str,
    data: &[u8],
) -> Result<StorySlideModel>
where
    C: ConnectionTrait,
{
    let (target, target_status, config) = resolve_pair(db, nightline_name, status_name).await?;
    story_slide::bind(db, store, &target, &target_status, &config, filename, data).await
}

/// Removes the slide of one status and turns story posting for it off.
pub async fn remove_story_slide<C>(
    db: &C,
    store: &dyn BlobStore,
    nightline_name: &str,
    status_name: &str,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let (target, target_status, config) = resolve_pair(db, nightline_name, status_name).await?;
    story_slide::unbind(db, store, &target, &target_status, &config).await?;
    if config.instagram_story {
        nightline_status::set_story_enabled(db, &target, &target_status, false).await?;
    }
    Ok(())
}
