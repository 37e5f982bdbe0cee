//! Nightline business logic - The registry and its status state machine.
//!
//! A nightline always points at an existing status, owns one API key and one
//! configuration row per status. Registration and deregistration keep all of that
//! consistent inside a single transaction. Status changes only move the pointer; posting
//! and deleting the external story are separate steps, composed in [`crate::core::workflow`].

use crate::{
    config::DEFAULT_STATUS,
    core::{api_key, instagram, nightline_status, status, story_slide, validation},
    crypto::PasswordCipher,
    entities::{
        ApiKey, InstagramAccount, Nightline, NightlineModel, Status, StatusModel,
        instagram_account, nightline, status as status_entity,
    },
    errors::{Error, Result},
    storage::BlobStore,
    story::StoryPublisher,
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Public view of a nightline: its status texts and the `now` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NightlineView {
    /// Nightline name
    pub name: String,
    /// Current status name
    pub status: String,
    /// German description for a scheduled shift
    pub description_de: String,
    /// English description for a scheduled shift
    pub description_en: String,
    /// German description while the shift is live
    pub description_now_de: String,
    /// English description while the shift is live
    pub description_now_en: String,
    /// Whether a volunteer is reachable right now
    pub now: bool,
}

impl NightlineView {
    /// Combines a nightline with its current status.
    #[must_use]
    pub fn new(nightline: &NightlineModel, status: &StatusModel) -> Self {
        Self {
            name: nightline.name.clone(),
            status: status.name.clone(),
            description_de: status.description_de.clone(),
            description_en: status.description_en.clone(),
            description_now_de: status.description_now_de.clone(),
            description_now_en: status.description_now_en.clone(),
            now: nightline.now,
        }
    }
}

/// Optional filters for [`list_nightlines`], combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightlineFilter {
    /// Exact current status name
    pub status: Option<String>,
    /// Language the nightline is reachable in today
    pub language: Option<validation::Language>,
    /// Value of the `now` flag
    pub now: Option<bool>,
}

/// Result of [`post_instagram_story`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryPost {
    /// The story is live and its media id was recorded
    Posted {
        /// Media id returned by the platform
        media_id: String,
    },
    /// Story posting is off for this status or no slide is bound
    NotConfigured,
}

/// Result of [`delete_instagram_story`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryDeletion {
    /// No story was recorded
    NothingToDelete,
    /// The story was deleted and the media id cleared
    Deleted,
}

/// Finds a nightline by name.
pub async fn get_nightline<C>(db: &C, name: &str) -> Result<Option<NightlineModel>>
where
    C: ConnectionTrait,
{
    Nightline::find()
        .filter(nightline::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_nightline`], but a missing nightline is [`Error::NightlineNotFound`].
pub async fn require_nightline<C>(db: &C, name: &str) -> Result<NightlineModel>
where
    C: ConnectionTrait,
{
    get_nightline(db, name)
        .await?
        .ok_or_else(|| Error::NightlineNotFound {
            name: name.to_string(),
        })
}

/// Loads a nightline together with its current status.
pub async fn get_nightline_with_status<C>(
    db: &C,
    name: &str,
) -> Result<(NightlineModel, StatusModel)>
where
    C: ConnectionTrait,
{
    let found = Nightline::find()
        .filter(nightline::Column::Name.eq(name))
        .find_also_related(Status)
        .one(db)
        .await?;
    match found {
        Some((nightline, Some(status))) => Ok((nightline, status)),
        Some((nightline, None)) => {
            error!(
                "Nightline '{}' points at missing status {}",
                nightline.name, nightline.status_id
            );
            Err(Error::InvariantViolation {
                message: format!("nightline '{}' has no valid status", nightline.name),
            })
        }
        None => Err(Error::NightlineNotFound {
            name: name.to_string(),
        }),
    }
}

/// Public view of one nightline.
pub async fn get_public_view<C>(db: &C, name: &str) -> Result<NightlineView>
where
    C: ConnectionTrait,
{
    let (nightline, status) = get_nightline_with_status(db, name).await?;
    Ok(NightlineView::new(&nightline, &status))
}

/// Registers a nightline in the `default` status, with an API key and a full set of
/// configuration rows.
///
/// The name is trimmed and lowercased first.
///
/// # Errors
/// [`Error::Validation`] for a malformed name, [`Error::NightlineAlreadyExists`] if it is
/// taken, [`Error::StatusNotFound`] if the catalog was never seeded.
pub async fn register(db: &DatabaseConnection, raw_name: &str) -> Result<NightlineModel> {
    let name = validation::normalize_nightline_name(raw_name)?;
    debug!("Registering nightline '{}'", name);

    if get_nightline(db, &name).await?.is_some() {
        warn!("Nightline '{}' already exists", name);
        return Err(Error::NightlineAlreadyExists { name });
    }

    let txn = db.begin().await?;
    let Some(default) = status::get_status(&txn, DEFAULT_STATUS).await? else {
        error!("Status '{}' is missing, seed the catalog first", DEFAULT_STATUS);
        return Err(Error::StatusNotFound {
            name: DEFAULT_STATUS.to_string(),
        });
    };

    let new_nightline = nightline::ActiveModel {
        name: Set(name.clone()),
        status_id: Set(default.id),
        now: Set(false),
        instagram_media_id: Set(None),
        status_updated_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = match new_nightline.insert(&txn).await {
        Ok(created) => created,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(Error::NightlineAlreadyExists { name });
        }
        Err(e) => {
            error!("Failed to insert nightline '{}': {}", name, e);
            return Err(e.into());
        }
    };
    api_key::create_for_nightline(&txn, created.id).await?;
    nightline_status::bulk_create_for_new_nightline(&txn, &created).await?;
    txn.commit().await?;

    info!("Nightline '{}' registered", created.name);
    Ok(created)
}

/// Removes a nightline with its configuration rows, slides, API key and account.
///
/// Slide files are deleted after the commit; failures there are only logged.
///
/// # Errors
/// [`Error::NightlineNotFound`] for an unknown name, [`Error::InvariantViolation`] if the
/// nightline has no API key (it is left in place).
pub async fn deregister(
    db: &DatabaseConnection,
    store: &dyn BlobStore,
    name: &str,
) -> Result<NightlineModel> {
    debug!("Deregistering nightline '{}'", name);
    let txn = db.begin().await?;
    let target = require_nightline(&txn, name).await?;

    let Some(credential) = api_key::get_for_nightline(&txn, target.id).await? else {
        warn!("Nightline '{}' has no API key, not removing it", name);
        return Err(Error::InvariantViolation {
            message: format!("nightline '{name}' has no API key"),
        });
    };

    let removed = nightline_status::bulk_delete_for_nightline(&txn, &target).await?;
    ApiKey::delete_by_id(credential.id).exec(&txn).await?;
    InstagramAccount::delete_many()
        .filter(instagram_account::Column::NightlineId.eq(target.id))
        .exec(&txn)
        .await?;
    Nightline::delete_by_id(target.id).exec(&txn).await?;
    txn.commit().await?;
    info!("Nightline '{}' removed", name);

    for path in removed.slide_paths() {
        if let Err(e) = store.delete(Path::new(path)).await {
            warn!("Could not remove slide of removed nightline '{}': {}", name, e);
        }
    }
    Ok(target)
}

/// Lists nightlines matching `filter`, ordered by name.
///
/// A failing query is logged and yields an empty list.
pub async fn list_nightlines<C>(db: &C, filter: &NightlineFilter) -> Vec<NightlineView>
where
    C: ConnectionTrait,
{
    let mut query = Nightline::find().find_also_related(Status);
    if let Some(name) = &filter.status {
        query = query.filter(status_entity::Column::Name.eq(name.as_str()));
    }
    if let Some(language) = filter.language {
        query = query.filter(status_entity::Column::Name.is_in(language.status_names()));
    }
    if let Some(now) = filter.now {
        query = query.filter(nightline::Column::Now.eq(now));
    }

    match query.order_by_asc(nightline::Column::Name).all(db).await {
        Ok(rows) => rows
            .into_iter()
            .filter_map(|(nightline, status)| match status {
                Some(status) => Some(NightlineView::new(&nightline, &status)),
                None => {
                    warn!("Skipping nightline '{}' without status", nightline.name);
                    None
                }
            })
            .collect(),
        Err(e) => {
            error!("Failed to list nightlines: {}", e);
            Vec::new()
        }
    }
}

/// Points `target` at the status named `status_name`.
///
/// Does not touch the external story.
///
/// # Errors
/// [`Error::StatusNotFound`] if no such status exists; the pointer stays unchanged.
pub async fn set_status<C>(
    db: &C,
    target: &NightlineModel,
    status_name: &str,
) -> Result<NightlineModel>
where
    C: ConnectionTrait,
{
    debug!("Setting status of '{}' to '{}'", target.name, status_name);
    let Some(new_status) = status::get_status(db, status_name).await? else {
        warn!(
            "Status '{}' requested for '{}' is not configured",
            status_name, target.name
        );
        return Err(Error::StatusNotFound {
            name: status_name.to_string(),
        });
    };

    let mut active: nightline::ActiveModel = target.clone().into();
    active.status_id = Set(new_status.id);
    active.status_updated_at = Set(Utc::now());
    let updated = active.update(db).await?;
    info!("Status of '{}' set to '{}'", updated.name, new_status.name);
    Ok(updated)
}

/// Sets the status of `target` back to `default`.
pub async fn reset_status<C>(db: &C, target: &NightlineModel) -> Result<NightlineModel>
where
    C: ConnectionTrait,
{
    set_status(db, target, DEFAULT_STATUS).await
}

/// Sets the `now` flag.
pub async fn set_now<C>(db: &C, target: &NightlineModel, now: bool) -> Result<NightlineModel>
where
    C: ConnectionTrait,
{
    let mut active: nightline::ActiveModel = target.clone().into();
    active.now = Set(now);
    let updated = active.update(db).await?;
    info!("'now' of '{}' set to {}", updated.name, now);
    Ok(updated)
}

/// Whether reaching the current status of `target` should post a story.
///
/// A missing configuration row reads as `false` and is logged.
pub async fn get_instagram_story_config<C>(db: &C, target: &NightlineModel) -> Result<bool>
where
    C: ConnectionTrait,
{
    match nightline_status::get_config(db, target.id, target.status_id).await? {
        Some(config) => Ok(config.instagram_story),
        None => {
            warn!(
                "No configuration for nightline '{}' and its current status {}",
                target.name, target.status_id
            );
            Ok(false)
        }
    }
}

/// Records (or clears, with `None`) the media id of the live story.
pub async fn set_story_media_id<C>(
    db: &C,
    target: &NightlineModel,
    media_id: Option<String>,
) -> Result<NightlineModel>
where
    C: ConnectionTrait,
{
    let mut active: nightline::ActiveModel = target.clone().into();
    active.instagram_media_id = Set(media_id);
    active.update(db).await.map_err(Into::into)
}

/// Posts the slide bound to (`target`, `status_name`) and records the media id.
///
/// Nothing local changes unless the platform accepted the story.
///
/// # Errors
/// [`Error::InstagramAccountNotFound`] without an account, [`Error::StatusNotFound`],
/// [`Error::ConfigNotFound`] if the pair has no row, or the publisher's error.
pub async fn post_instagram_story<C>(
    db: &C,
    publisher: &dyn StoryPublisher,
    cipher: &PasswordCipher,
    target: &NightlineModel,
    status_name: &str,
) -> Result<StoryPost>
where
    C: ConnectionTrait,
{
    let credentials = instagram::credentials(db, cipher, target).await?;
    let story_status = status::require_status(db, status_name).await?;

    let Some(config) = nightline_status::get_config(db, target.id, story_status.id).await? else {
        warn!(
            "Configuration row missing for nightline '{}' and status '{}'",
            target.name, status_name
        );
        return Err(Error::ConfigNotFound {
            nightline: target.name.clone(),
            status: status_name.to_string(),
        });
    };
    if !config.instagram_story {
        debug!("Story posting disabled for '{}' in '{}'", target.name, status_name);
        return Ok(StoryPost::NotConfigured);
    }
    let Some(slide) = story_slide::lookup(db, &config).await? else {
        warn!(
            "Story posting enabled for '{}' in '{}' but no slide is bound",
            target.name, status_name
        );
        return Ok(StoryPost::NotConfigured);
    };

    let media_id = publisher
        .post(
            Path::new(&slide.path),
            &credentials.username,
            &credentials.password,
        )
        .await
        .map_err(|e| {
            error!("Posting story for '{}' failed: {}", target.name, e);
            e
        })?;

    set_story_media_id(db, target, Some(media_id.clone()))
        .await
        .map_err(|e| {
            error!(
                "Story {} of '{}' is live but could not be recorded: {}",
                media_id, target.name, e
            );
            e
        })?;
    info!("Story {} posted for '{}'", media_id, target.name);
    Ok(StoryPost::Posted { media_id })
}

/// Deletes the live story of `target`, if any, and clears the media id.
///
/// # Errors
/// [`Error::InstagramAccountNotFound`] without an account, the publisher's error, or
/// [`Error::StoryDeletedNotRecorded`] when only the local update failed.
pub async fn delete_instagram_story<C>(
    db: &C,
    publisher: &dyn StoryPublisher,
    cipher: &PasswordCipher,
    target: &NightlineModel,
) -> Result<StoryDeletion>
where
    C: ConnectionTrait,
{
    let Some(media_id) = target.instagram_media_id.clone() else {
        debug!("No story recorded for '{}'", target.name);
        return Ok(StoryDeletion::NothingToDelete);
    };

    let credentials = instagram::credentials(db, cipher, target).await?;
    publisher
        .delete(&media_id, &credentials.username, &credentials.password)
        .await
        .map_err(|e| {
            error!("Deleting story {} of '{}' failed: {}", media_id, target.name, e);
            e
        })?;

    if let Err(e) = set_story_media_id(db, target, None).await {
        error!(
            "Story {} of '{}' deleted but media id not cleared: {}",
            media_id, target.name, e
        );
        return Err(Error::StoryDeletedNotRecorded {
            nightline: target.name.clone(),
            media_id,
        });
    }
    info!("Story {} of '{}' deleted", media_id, target.name);
    Ok(StoryDeletion::Deleted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::statuses::builtin_statuses;
    use crate::core::validation::Language;
    use crate::entities::api_key as key;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase, PaginatorTrait};

    async fn count_keys(db: &DatabaseConnection, nightline_id: i32) -> Result<u64> {
        ApiKey::find()
            .filter(key::Column::NightlineId.eq(nightline_id))
            .count(db)
            .await
            .map_err(Into::into)
    }

    #[tokio::test]
    async fn test_register_creates_key_and_configs() -> Result<()> {
        let db = setup_test_db().await?;
        let testline = register(&db, " TestLine ").await?;
        assert_eq!(testline.name, "testline");
        assert!(!testline.now);
        assert!(testline.instagram_media_id.is_none());

        let (_, current) = get_nightline_with_status(&db, "testline").await?;
        assert_eq!(current.name, DEFAULT_STATUS);
        assert_eq!(count_keys(&db, testline.id).await?, 1);
        let configs = nightline_status::get_configs_for_nightline(&db, testline.id).await?;
        assert_eq!(configs.len(), builtin_statuses().len());
        assert_completeness(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_register_conflict_and_validation() -> Result<()> {
        let db = setup_test_db().await?;
        register(&db, "testline").await?;
        assert!(matches!(
            register(&db, "TESTLINE").await,
            Err(Error::NightlineAlreadyExists { .. })
        ));
        assert!(matches!(
            register(&db, "test line").await,
            Err(Error::Validation { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_register_without_default_status_fails_cleanly() -> Result<()> {
        let db = setup_unseeded_db().await?;
        let result = register(&db, "testline").await;
        assert!(matches!(result, Err(Error::StatusNotFound { name }) if name == DEFAULT_STATUS));
        assert!(get_nightline(&db, "testline").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_deregister_removes_everything() -> Result<()> {
        let db = setup_test_db().await?;
        let store = MemoryBlobStore::default();
        let cipher = test_cipher();
        let testline = register(&db, "testline").await?;
        register(&db, "other").await?;
        instagram::add_account(&db, &cipher, &testline, "user", "pw").await?;
        let slide = bind_test_slide(&db, &store, &testline, "english").await?;

        let removed = deregister(&db, &store, "testline").await?;
        assert_eq!(removed.id, testline.id);
        assert!(get_nightline(&db, "testline").await?.is_none());
        assert_eq!(count_keys(&db, testline.id).await?, 0);
        assert!(
            nightline_status::get_configs_for_nightline(&db, testline.id)
                .await?
                .is_empty()
        );
        assert!(instagram::get_account(&db, &testline).await?.is_none());
        assert!(!store.contains(Path::new(&slide.path)));
        assert_completeness(&db).await?;

        assert!(matches!(
            deregister(&db, &store, "testline").await,
            Err(Error::NightlineNotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_deregister_without_key_is_refused() -> Result<()> {
        let db = setup_test_db().await?;
        let store = MemoryBlobStore::default();
        let testline = register(&db, "testline").await?;
        ApiKey::delete_many()
            .filter(key::Column::NightlineId.eq(testline.id))
            .exec(&db)
            .await?;

        let result = deregister(&db, &store, "testline").await;
        assert!(matches!(result, Err(Error::InvariantViolation { .. })));
        assert!(get_nightline(&db, "testline").await?.is_some());
        assert_eq!(
            nightline_status::get_configs_for_nightline(&db, testline.id)
                .await?
                .len(),
            builtin_statuses().len()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_set_status() -> Result<()> {
        let db = setup_test_db().await?;
        let testline = register(&db, "testline").await?;

        let updated = set_status(&db, &testline, "english").await?;
        assert!(updated.status_updated_at >= testline.status_updated_at);
        let (_, current) = get_nightline_with_status(&db, "testline").await?;
        assert_eq!(current.name, "english");

        let result = set_status(&db, &updated, "doesnotexist").await;
        assert!(matches!(result, Err(Error::StatusNotFound { .. })));
        let (_, current) = get_nightline_with_status(&db, "testline").await?;
        assert_eq!(current.name, "english");
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_status_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let testline = register(&db, "testline").await?;
        let testline = set_status(&db, &testline, "canceled").await?;

        let once = reset_status(&db, &testline).await?;
        let twice = reset_status(&db, &once).await?;
        assert_eq!(once.status_id, twice.status_id);
        let (_, current) = get_nightline_with_status(&db, "testline").await?;
        assert_eq!(current.name, DEFAULT_STATUS);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_now_and_public_view() -> Result<()> {
        let db = setup_test_db().await?;
        let testline = register(&db, "testline").await?;
        let testline = set_status(&db, &testline, "german").await?;
        set_now(&db, &testline, true).await?;

        let view = get_public_view(&db, "testline").await?;
        assert_eq!(view.name, "testline");
        assert_eq!(view.status, "german");
        assert!(view.now);
        assert!(!view.description_now_de.is_empty());

        assert!(matches!(
            get_public_view(&db, "unknown").await,
            Err(Error::NightlineNotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_nightlines_filters() -> Result<()> {
        let db = setup_test_db().await?;
        let aachen = register(&db, "aachen").await?;
        let bonn = register(&db, "bonn").await?;
        let koeln = register(&db, "koeln").await?;
        register(&db, "dresden").await?;
        set_status(&db, &aachen, "german").await?;
        let bonn = set_status(&db, &bonn, "german-english").await?;
        set_status(&db, &koeln, "english").await?;
        set_now(&db, &bonn, true).await?;

        let names = |views: Vec<NightlineView>| -> Vec<String> {
            views.into_iter().map(|v| v.name).collect()
        };

        let all = list_nightlines(&db, &NightlineFilter::default()).await;
        assert_eq!(names(all), ["aachen", "bonn", "dresden", "koeln"]);

        let german = NightlineFilter {
            language: Some(Language::De),
            ..Default::default()
        };
        assert_eq!(names(list_nightlines(&db, &german).await), ["aachen", "bonn"]);

        let english = NightlineFilter {
            language: Some(Language::En),
            ..Default::default()
        };
        assert_eq!(names(list_nightlines(&db, &english).await), ["bonn", "koeln"]);

        let english_now = NightlineFilter {
            language: Some(Language::En),
            now: Some(true),
            ..Default::default()
        };
        assert_eq!(names(list_nightlines(&db, &english_now).await), ["bonn"]);

        let by_status = NightlineFilter {
            status: Some("default".to_string()),
            ..Default::default()
        };
        assert_eq!(names(list_nightlines(&db, &by_status).await), ["dresden"]);

        let none = NightlineFilter {
            status: Some("canceled".to_string()),
            now: Some(false),
            ..Default::default()
        };
        assert!(list_nightlines(&db, &none).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_nightlines_degrades_to_empty() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_errors([DbErr::Custom("connection lost".to_string())])
            .into_connection();
        assert!(list_nightlines(&db, &NightlineFilter::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_story_config_defaults_and_missing_row() -> Result<()> {
        let db = setup_test_db().await?;
        let testline = register(&db, "testline").await?;
        let english = status::require_status(&db, "english").await?;
        let testline = set_status(&db, &testline, "english").await?;
        assert!(!get_instagram_story_config(&db, &testline).await?);

        nightline_status::set_story_enabled(&db, &testline, &english, true).await?;
        assert!(get_instagram_story_config(&db, &testline).await?);

        nightline_status::bulk_delete_for_nightline(&db, &testline).await?;
        assert!(!get_instagram_story_config(&db, &testline).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_post_story_requires_account() -> Result<()> {
        let db = setup_test_db().await?;
        let publisher = FakePublisher::default();
        let testline = register(&db, "testline").await?;

        let result =
            post_instagram_story(&db, &publisher, &test_cipher(), &testline, "english").await;
        assert!(matches!(
            result,
            Err(Error::InstagramAccountNotFound { .. })
        ));
        assert_eq!(publisher.post_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_post_story_not_configured() -> Result<()> {
        let db = setup_test_db().await?;
        let store = MemoryBlobStore::default();
        let publisher = FakePublisher::default();
        let cipher = test_cipher();
        let testline = register(&db, "testline").await?;
        instagram::add_account(&db, &cipher, &testline, "user", "pw").await?;

        // flag off
        let outcome = post_instagram_story(&db, &publisher, &cipher, &testline, "english").await?;
        assert_eq!(outcome, StoryPost::NotConfigured);

        // flag on, but the slide row is gone
        bind_test_slide(&db, &store, &testline, "english").await?;
        enable_story(&db, &testline, "english").await?;
        let english = status::require_status(&db, "english").await?;
        let config = nightline_status::get_config(&db, testline.id, english.id)
            .await?
            .unwrap();
        story_slide::unbind(&db, &store, &testline, &english, &config).await?;
        let outcome = post_instagram_story(&db, &publisher, &cipher, &testline, "english").await?;
        assert_eq!(outcome, StoryPost::NotConfigured);
        assert_eq!(publisher.post_count(), 0);

        let result = post_instagram_story(&db, &publisher, &cipher, &testline, "nope").await;
        assert!(matches!(result, Err(Error::StatusNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_post_story_records_media_id() -> Result<()> {
        let db = setup_test_db().await?;
        let store = MemoryBlobStore::default();
        let publisher = FakePublisher::default();
        let cipher = test_cipher();
        let testline = register(&db, "testline").await?;
        instagram::add_account(&db, &cipher, &testline, "user", "pw").await?;
        let slide = bind_test_slide(&db, &store, &testline, "english").await?;
        enable_story(&db, &testline, "english").await?;

        let outcome = post_instagram_story(&db, &publisher, &cipher, &testline, "english").await?;
        let StoryPost::Posted { media_id } = outcome else {
            unreachable!("story should have been posted");
        };
        assert_eq!(publisher.posted_paths(), [slide.path]);
        let reloaded = require_nightline(&db, "testline").await?;
        assert_eq!(reloaded.instagram_media_id, Some(media_id));
        Ok(())
    }

    #[tokio::test]
    async fn test_post_story_failure_leaves_state() -> Result<()> {
        let db = setup_test_db().await?;
        let store = MemoryBlobStore::default();
        let publisher = FakePublisher::default();
        let cipher = test_cipher();
        let testline = register(&db, "testline").await?;
        instagram::add_account(&db, &cipher, &testline, "user", "pw").await?;
        bind_test_slide(&db, &store, &testline, "english").await?;
        enable_story(&db, &testline, "english").await?;

        publisher.fail_posts(true);
        let result = post_instagram_story(&db, &publisher, &cipher, &testline, "english").await;
        assert!(matches!(result, Err(Error::StoryPublisher { .. })));
        let reloaded = require_nightline(&db, "testline").await?;
        assert!(reloaded.instagram_media_id.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_story() -> Result<()> {
        let db = setup_test_db().await?;
        let publisher = FakePublisher::default();
        let cipher = test_cipher();
        let testline = register(&db, "testline").await?;

        // nothing recorded, no account needed
        assert_eq!(
            delete_instagram_story(&db, &publisher, &cipher, &testline).await?,
            StoryDeletion::NothingToDelete
        );

        let testline = set_story_media_id(&db, &testline, Some("17890".to_string())).await?;
        assert!(matches!(
            delete_instagram_story(&db, &publisher, &cipher, &testline).await,
            Err(Error::InstagramAccountNotFound { .. })
        ));

        instagram::add_account(&db, &cipher, &testline, "user", "pw").await?;
        publisher.fail_deletes(true);
        assert!(matches!(
            delete_instagram_story(&db, &publisher, &cipher, &testline).await,
            Err(Error::StoryPublisher { .. })
        ));
        assert!(
            require_nightline(&db, "testline")
                .await?
                .instagram_media_id
                .is_some()
        );

        publisher.fail_deletes(false);
        assert_eq!(
            delete_instagram_story(&db, &publisher, &cipher, &testline).await?,
            StoryDeletion::Deleted
        );
        assert_eq!(publisher.deleted_ids(), ["17890"]);
        let reloaded = require_nightline(&db, "testline").await?;
        assert!(reloaded.instagram_media_id.is_none());
        assert_eq!(
            delete_instagram_story(&db, &publisher, &cipher, &reloaded).await?,
            StoryDeletion::NothingToDelete
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_story_not_recorded_locally() -> Result<()> {
        let cipher = test_cipher();
        let secret = cipher.encrypt("pw")?;
        let account = crate::entities::InstagramAccountModel {
            id: 1,
            nightline_id: 1,
            username: "user".to_string(),
            encrypted_password: secret.ciphertext,
            salt: secret.salt,
        };
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![account]])
            .append_exec_errors([DbErr::Custom("database is locked".to_string())])
            .into_connection();
        let publisher = FakePublisher::default();
        let mut testline = nightline_model(1, "testline", 1);
        testline.instagram_media_id = Some("17890".to_string());

        let result = delete_instagram_story(&db, &publisher, &cipher, &testline).await;
        assert!(matches!(
            result,
            Err(Error::StoryDeletedNotRecorded { media_id, .. }) if media_id == "17890"
        ));
        assert_eq!(publisher.deleted_ids(), ["17890"]);
        Ok(())
    }
}
