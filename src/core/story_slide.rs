//! Story slide business logic - Binds uploaded images to nightline status rows.
//!
//! A slide is stored as `{nightline}/{status}.{ext}` in the [`BlobStore`]. Replacing a
//! slide writes the new bytes to a staging file first, so a failed upload leaves the
//! previous binding intact. The row is only written once the file is in its final place,
//! and a previous file with another extension is removed last.

use crate::{
    entities::{
        NightlineModel, NightlineStatusModel, StatusModel, StorySlide, StorySlideModel,
        story_slide,
    },
    errors::{Error, Result},
    storage::{BlobStore, validate_file_extension, validate_image_content},
};
use sea_orm::{Set, prelude::*};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Returns the slide bound to a configuration row.
pub async fn lookup<C>(db: &C, config: &NightlineStatusModel) -> Result<Option<StorySlideModel>>
where
    C: ConnectionTrait,
{
    StorySlide::find()
        .filter(story_slide::Column::NightlineStatusId.eq(config.id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn discard(store: &dyn BlobStore, path: &Path) {
    if let Err(e) = store.delete(path).await {
        warn!("Could not clean up '{}': {}", path.display(), e);
    }
}

/// Stores `data` as the slide of (`nightline`, `status`) and records it on `config`.
///
/// # Errors
/// [`Error::Validation`] for a disallowed extension or content (nothing is touched), or
/// [`Error::Storage`] if the blob store fails. A failed write or move keeps the old slide.
pub async fn bind<C>(
    db: &C,
    store: &dyn BlobStore,
    nightline: &NightlineModel,
    status: &StatusModel,
    config: &NightlineStatusModel,
    filename: &str,
    data: &[u8],
) -> Result<StorySlideModel>
where
    C: ConnectionTrait,
{
    debug!(
        "Binding slide '{}' to nightline '{}' and status '{}'",
        filename, nightline.name, status.name
    );
    let extension = validate_file_extension(filename)?;
    validate_image_content(data, &extension)?;

    let namespace = store.ensure_namespace(&nightline.name).await?;
    let target_name = format!("{}.{extension}", status.name);
    let target = namespace.join(&target_name);
    let staged = namespace.join(format!("{target_name}.upload"));

    store.write(data, &staged).await?;

    let previous = store
        .exists_with_any_allowed_extension(&namespace.join(&status.name))
        .await?;
    let existing = lookup(db, config).await?;

    if let Err(e) = store.rename(&staged, &target).await {
        error!("Failed to move slide into place: {}", e);
        discard(store, &staged).await;
        return Err(e);
    }

    let path = target.to_string_lossy().into_owned();
    let slide = match existing {
        Some(existing) => {
            let mut slide: story_slide::ActiveModel = existing.into();
            slide.filename = Set(target_name);
            slide.path = Set(path);
            slide.update(db).await?
        }
        None => {
            story_slide::ActiveModel {
                filename: Set(target_name),
                path: Set(path),
                nightline_status_id: Set(config.id),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    // A file under the target name was replaced by the rename
    if let Some(stale) = previous.filter(|p| *p != target) {
        if let Err(e) = store.delete(&stale).await {
            error!("Failed to remove previous slide '{}': {}", stale.display(), e);
        }
    }
    info!("Slide '{}' saved for nightline '{}'", slide.filename, nightline.name);
    Ok(slide)
}

/// Removes the slide bound to `config`, file first, then the row.
///
/// # Errors
/// [`Error::StorySlideNotFound`] if nothing is bound; a failing file delete keeps the row.
pub async fn unbind<C>(
    db: &C,
    store: &dyn BlobStore,
    nightline: &NightlineModel,
    status: &StatusModel,
    config: &NightlineStatusModel,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let Some(slide) = lookup(db, config).await? else {
        return Err(Error::StorySlideNotFound {
            nightline: nightline.name.clone(),
            status: status.name.clone(),
        });
    };

    store.delete(Path::new(&slide.path)).await?;
    StorySlide::delete_by_id(slide.id).exec(db).await?;
    info!(
        "Slide for status '{}' of nightline '{}' removed",
        status.name, nightline.name
    );
    Ok(())
}
