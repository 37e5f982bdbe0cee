//! Nightline status configuration - Maintains one row per (nightline, status) pair.
//!
//! The row set must stay complete: whenever a nightline or a status is created, rows for
//! every counterpart are inserted in the same transaction, and whenever one is removed its
//! rows go with it. The bulk helpers here take any connection so callers can run them
//! inside their own transaction.

use crate::{
    entities::{
        Nightline, NightlineModel, NightlineStatus, NightlineStatusModel, Status, StatusModel,
        StorySlide, nightline_status, story_slide,
    },
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use tracing::{debug, info, warn};

/// Outcome of a bulk delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkDelete {
    /// Rows were removed, along with the slide rows bound to them
    Removed {
        /// Configuration rows deleted
        rows: u64,
        /// Storage paths of the slides whose rows were deleted
        slide_paths: Vec<String>,
    },
    /// Nothing matched; the row set was already incomplete
    Missing,
}

impl BulkDelete {
    /// Slide files that are no longer referenced.
    #[must_use]
    pub fn slide_paths(&self) -> &[String] {
        match self {
            Self::Removed { slide_paths, .. } => slide_paths,
            Self::Missing => &[],
        }
    }
}

/// Returns the configuration row for a (nightline, status) pair.
pub async fn get_config<C>(
    db: &C,
    nightline_id: i32,
    status_id: i32,
) -> Result<Option<NightlineStatusModel>>
where
    C: ConnectionTrait,
{
    NightlineStatus::find()
        .filter(nightline_status::Column::NightlineId.eq(nightline_id))
        .filter(nightline_status::Column::StatusId.eq(status_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns all configuration rows of a nightline.
pub async fn get_configs_for_nightline<C>(
    db: &C,
    nightline_id: i32,
) -> Result<Vec<NightlineStatusModel>>
where
    C: ConnectionTrait,
{
    NightlineStatus::find()
        .filter(nightline_status::Column::NightlineId.eq(nightline_id))
        .all(db)
        .await
        .map_err(Into::into)
}

fn default_row(nightline_id: i32, status_id: i32) -> nightline_status::ActiveModel {
    nightline_status::ActiveModel {
        nightline_id: Set(nightline_id),
        status_id: Set(status_id),
        instagram_story: Set(false),
        ..Default::default()
    }
}

async fn insert_rows<C>(db: &C, rows: Vec<nightline_status::ActiveModel>) -> Result<u64>
where
    C: ConnectionTrait,
{
    if rows.is_empty() {
        return Ok(0);
    }
    NightlineStatus::insert_many(rows)
        .exec_without_returning(db)
        .await
        .map_err(Into::into)
}

/// Inserts a disabled configuration row for `nightline` and every existing status.
///
/// Runs as one multi-row insert, so either all rows land or none.
pub async fn bulk_create_for_new_nightline<C>(db: &C, nightline: &NightlineModel) -> Result<u64>
where
    C: ConnectionTrait,
{
    let statuses = Status::find().all(db).await?;
    let rows = statuses
        .iter()
        .map(|status| default_row(nightline.id, status.id))
        .collect();
    let created = insert_rows(db, rows).await?;
    debug!(
        "Created {} status configurations for nightline '{}'",
        created, nightline.name
    );
    Ok(created)
}

/// Inserts a disabled configuration row for `status` and every existing nightline.
pub async fn bulk_create_for_new_status<C>(db: &C, status: &StatusModel) -> Result<u64>
where
    C: ConnectionTrait,
{
    let nightlines = Nightline::find().all(db).await?;
    let rows = nightlines
        .iter()
        .map(|nightline| default_row(nightline.id, status.id))
        .collect();
    let created = insert_rows(db, rows).await?;
    debug!(
        "Created {} nightline configurations for status '{}'",
        created, status.name
    );
    Ok(created)
}

async fn delete_rows<C>(db: &C, rows: Vec<NightlineStatusModel>) -> Result<BulkDelete>
where
    C: ConnectionTrait,
{
    if rows.is_empty() {
        return Ok(BulkDelete::Missing);
    }
    let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();

    // Slides reference the rows, drop them first
    let slides = StorySlide::find()
        .filter(story_slide::Column::NightlineStatusId.is_in(ids.clone()))
        .all(db)
        .await?;
    if !slides.is_empty() {
        StorySlide::delete_many()
            .filter(story_slide::Column::NightlineStatusId.is_in(ids.clone()))
            .exec(db)
            .await?;
    }

    let deleted = NightlineStatus::delete_many()
        .filter(nightline_status::Column::Id.is_in(ids))
        .exec(db)
        .await?;
    Ok(BulkDelete::Removed {
        rows: deleted.rows_affected,
        slide_paths: slides.into_iter().map(|slide| slide.path).collect(),
    })
}

/// Deletes every configuration row (and bound slide row) of `nightline`.
///
/// Zero matching rows yields [`BulkDelete::Missing`] and a warning, not an error.
pub async fn bulk_delete_for_nightline<C>(db: &C, nightline: &NightlineModel) -> Result<BulkDelete>
where
    C: ConnectionTrait,
{
    let rows = get_configs_for_nightline(db, nightline.id).await?;
    let outcome = delete_rows(db, rows).await?;
    match &outcome {
        BulkDelete::Missing => warn!(
            "No status configurations found for nightline '{}'",
            nightline.name
        ),
        BulkDelete::Removed { rows, .. } => debug!(
            "Deleted {} status configurations of nightline '{}'",
            rows, nightline.name
        ),
    }
    Ok(outcome)
}

/// Deletes every configuration row (and bound slide row) of `status`.
pub async fn bulk_delete_for_status<C>(db: &C, status: &StatusModel) -> Result<BulkDelete>
where
    C: ConnectionTrait,
{
    let rows = NightlineStatus::find()
        .filter(nightline_status::Column::StatusId.eq(status.id))
        .all(db)
        .await?;
    let outcome = delete_rows(db, rows).await?;
    match &outcome {
        BulkDelete::Missing => {
            // No rows is only drift while nightlines exist
            if Nightline::find().count(db).await? == 0 {
                debug!(
                    "No nightlines registered, nothing to delete for status '{}'",
                    status.name
                );
            } else {
                warn!(
                    "No nightline configurations found for status '{}'",
                    status.name
                );
            }
        }
        BulkDelete::Removed { rows, .. } => debug!(
            "Deleted {} nightline configurations of status '{}'",
            rows, status.name
        ),
    }
    Ok(outcome)
}

/// Turns story posting for a (nightline, status) pair on or off.
///
/// # Errors
/// Returns [`Error::InvariantViolation`] if the pair has no configuration row.
pub async fn set_story_enabled<C>(
    db: &C,
    nightline: &NightlineModel,
    status: &StatusModel,
    enabled: bool,
) -> Result<NightlineStatusModel>
where
    C: ConnectionTrait,
{
    let Some(config) = get_config(db, nightline.id, status.id).await? else {
        warn!(
            "Configuration row missing for nightline '{}' and status '{}'",
            nightline.name, status.name
        );
        return Err(Error::InvariantViolation {
            message: format!(
                "nightline '{}' has no configuration for status '{}'",
                nightline.name, status.name
            ),
        });
    };

    let mut config: nightline_status::ActiveModel = config.into();
    config.instagram_story = Set(enabled);
    let config = config.update(db).await?;
    info!(
        "Story posting for nightline '{}' and status '{}' set to {}",
        nightline.name, status.name, enabled
    );
    Ok(config)
}
