//! Shared test utilities for nightlight.
//!
//! This module provides helpers for setting up test databases, in-memory fakes of the
//! blob store and the story publisher, and builders for common fixtures.

#![allow(clippy::unwrap_used)]

use crate::{
    config::statuses::{StatusConfig, builtin_statuses},
    core::{nightline_status, status, story_slide},
    crypto::PasswordCipher,
    entities::{
        Nightline, NightlineModel, NightlineStatus, NightlineStatusModel, StatusModel,
        StorySlideModel, nightline, nightline_status as config_entity,
    },
    errors::{Error, Result},
    storage::{ALLOWED_IMAGE_EXTENSIONS, BlobStore},
    story::StoryPublisher,
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Creates an in-memory `SQLite` database with all tables and the built-in statuses.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = setup_unseeded_db().await?;
    status::seed_statuses(&db, &builtin_statuses()).await?;
    Ok(db)
}

/// Creates an in-memory `SQLite` database with empty tables.
pub async fn setup_unseeded_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Cipher with a fixed key password.
pub fn test_cipher() -> PasswordCipher {
    PasswordCipher::new("test-encryption-password")
}

/// Status definition with filler descriptions.
pub fn test_status_config(name: &str) -> StatusConfig {
    StatusConfig {
        name: name.to_string(),
        description_de: format!("{name} (de)"),
        description_en: format!("{name} (en)"),
        description_now_de: format!("{name} jetzt"),
        description_now_en: format!("{name} now"),
    }
}

/// Inserts a nightline row in `default` without key or configuration rows.
pub async fn insert_bare_nightline(db: &DatabaseConnection, name: &str) -> Result<NightlineModel> {
    let default = status::require_status(db, crate::config::DEFAULT_STATUS).await?;
    nightline::ActiveModel {
        name: Set(name.to_string()),
        status_id: Set(default.id),
        now: Set(false),
        instagram_media_id: Set(None),
        status_updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Status model as returned by a mocked query.
pub fn builtin_status_model(id: i32, name: &str) -> StatusModel {
    let config = test_status_config(name);
    StatusModel {
        id,
        name: config.name,
        description_de: config.description_de,
        description_en: config.description_en,
        description_now_de: config.description_now_de,
        description_now_en: config.description_now_en,
    }
}

/// Nightline model as returned by a mocked query.
pub fn nightline_model(id: i32, name: &str, status_id: i32) -> NightlineModel {
    NightlineModel {
        id,
        name: name.to_string(),
        status_id,
        now: false,
        instagram_media_id: None,
        status_updated_at: Utc::now(),
    }
}

/// Smallest byte string passing the PNG content check.
pub fn png_bytes() -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    data.extend_from_slice(b"IHDR");
    data
}

/// Smallest byte string passing the JPEG content check.
pub fn jpeg_bytes() -> Vec<u8> {
    vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10]
}

/// Binds a PNG slide to (`target`, `status_name`).
pub async fn bind_test_slide(
    db: &DatabaseConnection,
    store: &dyn BlobStore,
    target: &NightlineModel,
    status_name: &str,
) -> Result<StorySlideModel> {
    let slide_status = status::require_status(db, status_name).await?;
    let config = nightline_status::get_config(db, target.id, slide_status.id)
        .await?
        .ok_or_else(|| Error::ConfigNotFound {
            nightline: target.name.clone(),
            status: status_name.to_string(),
        })?;
    story_slide::bind(
        db,
        store,
        target,
        &slide_status,
        &config,
        "slide.png",
        &png_bytes(),
    )
    .await
}

/// Turns story posting on for (`target`, `status_name`).
pub async fn enable_story(
    db: &DatabaseConnection,
    target: &NightlineModel,
    status_name: &str,
) -> Result<NightlineStatusModel> {
    let story_status = status::require_status(db, status_name).await?;
    nightline_status::set_story_enabled(db, target, &story_status, true).await
}

/// Checks that every (nightline, status) pair has exactly one configuration row.
pub async fn assert_completeness(db: &DatabaseConnection) -> Result<()> {
    let nightlines = Nightline::find().all(db).await?;
    let statuses = status::list_statuses(db).await;
    for line in &nightlines {
        for state in &statuses {
            let rows = NightlineStatus::find()
                .filter(config_entity::Column::NightlineId.eq(line.id))
                .filter(config_entity::Column::StatusId.eq(state.id))
                .count(db)
                .await?;
            assert_eq!(rows, 1, "pair ({}, {})", line.name, state.name);
        }
    }
    let total = NightlineStatus::find().count(db).await?;
    assert_eq!(total as usize, nightlines.len() * statuses.len());
    Ok(())
}

fn fake_storage_error(action: &str, path: &Path) -> Error {
    Error::Storage {
        message: format!("Failed to {action} '{}'", path.display()),
    }
}

/// [`BlobStore`] keeping files in memory, with switchable failures.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    fail_writes: AtomicBool,
    fail_renames: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryBlobStore {
    /// Whether a file is stored at `path`.
    pub fn contains(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    /// Whether no file is stored at all.
    pub fn is_empty(&self) -> bool {
        self.files.lock().unwrap().is_empty()
    }

    /// Makes every following write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every following rename fail.
    pub fn fail_renames(&self, fail: bool) {
        self.fail_renames.store(fail, Ordering::SeqCst);
    }

    /// Makes every following delete fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn namespace_path(&self, namespace: &str) -> PathBuf {
        Path::new("/slides").join(namespace)
    }

    async fn ensure_namespace(&self, namespace: &str) -> Result<PathBuf> {
        Ok(self.namespace_path(namespace))
    }

    async fn exists_with_any_allowed_extension(&self, base_path: &Path) -> Result<Option<PathBuf>> {
        let files = self.files.lock().unwrap();
        Ok(ALLOWED_IMAGE_EXTENSIONS
            .iter()
            .map(|ext| base_path.with_extension(ext))
            .find(|candidate| files.contains_key(candidate)))
    }

    async fn write(&self, data: &[u8], path: &Path) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(fake_storage_error("write", path));
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        if self.fail_renames.load(Ordering::SeqCst) {
            return Err(fake_storage_error("move", from));
        }
        let mut files = self.files.lock().unwrap();
        let data = files
            .remove(from)
            .ok_or_else(|| fake_storage_error("move", from))?;
        files.insert(to.to_path_buf(), data);
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(fake_storage_error("remove", path));
        }
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| fake_storage_error("remove", path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| fake_storage_error("read", path))
    }
}

/// [`StoryPublisher`] recording calls, with switchable failures.
#[derive(Debug, Default)]
pub struct FakePublisher {
    next_id: AtomicU64,
    posted: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    fail_posts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FakePublisher {
    /// Number of successful posts.
    pub fn post_count(&self) -> usize {
        self.posted.lock().unwrap().len()
    }

    /// Image paths of successful posts, in order.
    pub fn posted_paths(&self) -> Vec<String> {
        self.posted.lock().unwrap().clone()
    }

    /// Media ids of successful deletes, in order.
    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    /// Makes every following post fail like a timeout.
    pub fn fail_posts(&self, fail: bool) {
        self.fail_posts.store(fail, Ordering::SeqCst);
    }

    /// Makes every following delete fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoryPublisher for FakePublisher {
    async fn post(&self, image_path: &Path, _username: &str, _password: &str) -> Result<String> {
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(Error::StoryPublisher {
                message: "Failed to post story: request timed out".to_string(),
            });
        }
        let id = 17_000 + self.next_id.fetch_add(1, Ordering::SeqCst);
        self.posted
            .lock()
            .unwrap()
            .push(image_path.to_string_lossy().into_owned());
        Ok(id.to_string())
    }

    async fn delete(&self, media_id: &str, _username: &str, _password: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Error::StoryPublisher {
                message: "Failed to delete story: 500 Internal Server Error".to_string(),
            });
        }
        self.deleted.lock().unwrap().push(media_id.to_string());
        Ok(())
    }
}
