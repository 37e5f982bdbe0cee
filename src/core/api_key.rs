//! API key business logic - Issues, looks up and rotates per-nightline access keys.
//!
//! Every nightline owns exactly one key, created together with the nightline and only
//! removed when the nightline is deregistered. Rotation rewrites the same row.

use crate::{
    entities::{ApiKey, ApiKeyModel, Nightline, NightlineModel, api_key},
    errors::{Error, Result},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use sea_orm::{Set, prelude::*};
use tracing::{debug, info, warn};

/// Random bytes drawn for a new key before encoding.
pub const DEFAULT_KEY_BYTES: usize = 256;

/// Generates a URL-safe token from `length` bytes of OS randomness.
///
/// `length` is the entropy budget in bytes, the encoded token is longer.
#[must_use]
pub fn generate(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Inserts a fresh key for `nightline_id`.
pub async fn create_for_nightline<C>(db: &C, nightline_id: i32) -> Result<ApiKeyModel>
where
    C: ConnectionTrait,
{
    let key = api_key::ActiveModel {
        key: Set(generate(DEFAULT_KEY_BYTES)),
        nightline_id: Set(nightline_id),
        ..Default::default()
    };
    key.insert(db).await.map_err(Into::into)
}

/// Returns the key of a nightline, if one exists.
pub async fn get_for_nightline<C>(db: &C, nightline_id: i32) -> Result<Option<ApiKeyModel>>
where
    C: ConnectionTrait,
{
    ApiKey::find()
        .filter(api_key::Column::NightlineId.eq(nightline_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Replaces the key of `nightline` with a new random value.
///
/// # Errors
/// Returns [`Error::ApiKeyNotFound`] if the nightline has no key row, which means the
/// nightline is in a broken state; the key is not silently recreated.
pub async fn renew<C>(db: &C, nightline: &NightlineModel) -> Result<ApiKeyModel>
where
    C: ConnectionTrait,
{
    debug!("Renewing API key for nightline '{}'", nightline.name);
    let Some(existing) = get_for_nightline(db, nightline.id).await? else {
        warn!("Nightline '{}' has no API key to renew", nightline.name);
        return Err(Error::ApiKeyNotFound {
            nightline: nightline.name.clone(),
        });
    };

    let mut key: api_key::ActiveModel = existing.into();
    key.key = Set(generate(DEFAULT_KEY_BYTES));
    let key = key.update(db).await?;
    info!("API key renewed for nightline '{}'", nightline.name);
    Ok(key)
}

/// Resolves a presented token to the nightline owning it.
pub async fn authenticate<C>(db: &C, token: &str) -> Result<Option<NightlineModel>>
where
    C: ConnectionTrait,
{
    if token.is_empty() {
        return Ok(None);
    }
    let Some(key) = ApiKey::find()
        .filter(api_key::Column::Key.eq(token))
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    Nightline::find_by_id(key.nightline_id)
        .one(db)
        .await
        .map_err(Into::into)
}
