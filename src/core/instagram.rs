//! Instagram account business logic - Credentials a nightline posts its stories with.
//!
//! Passwords are encrypted with [`PasswordCipher`] before they reach the database and
//! only decrypted when a story is posted or deleted.

use crate::{
    core::validation,
    crypto::PasswordCipher,
    entities::{InstagramAccount, InstagramAccountModel, NightlineModel, instagram_account},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use tracing::{debug, info, warn};

/// Decrypted credentials, handed to the story publisher.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account username
    pub username: String,
    /// Clear text password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Returns the account of a nightline, if configured.
pub async fn get_account<C>(db: &C, nightline: &NightlineModel) -> Result<Option<InstagramAccountModel>>
where
    C: ConnectionTrait,
{
    InstagramAccount::find()
        .filter(instagram_account::Column::NightlineId.eq(nightline.id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_account<C>(db: &C, nightline: &NightlineModel) -> Result<InstagramAccountModel>
where
    C: ConnectionTrait,
{
    get_account(db, nightline)
        .await?
        .ok_or_else(|| Error::InstagramAccountNotFound {
            nightline: nightline.name.clone(),
        })
}

/// Stores a new account for `nightline`.
///
/// # Errors
/// [`Error::InstagramAccountAlreadyExists`] if one is configured already.
pub async fn add_account<C>(
    db: &C,
    cipher: &PasswordCipher,
    nightline: &NightlineModel,
    username: &str,
    password: &str,
) -> Result<InstagramAccountModel>
where
    C: ConnectionTrait,
{
    validation::validate_instagram_credentials(username, password)?;
    if get_account(db, nightline).await?.is_some() {
        warn!("Nightline '{}' already has an Instagram account", nightline.name);
        return Err(Error::InstagramAccountAlreadyExists {
            nightline: nightline.name.clone(),
        });
    }

    let secret = cipher.encrypt(password)?;
    let account = instagram_account::ActiveModel {
        nightline_id: Set(nightline.id),
        username: Set(username.trim().to_string()),
        encrypted_password: Set(secret.ciphertext),
        salt: Set(secret.salt),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Instagram account added for nightline '{}'", nightline.name);
    Ok(account)
}

/// Changes the username of the configured account.
pub async fn update_username<C>(
    db: &C,
    nightline: &NightlineModel,
    username: &str,
) -> Result<InstagramAccountModel>
where
    C: ConnectionTrait,
{
    validation::validate_instagram_username(username)?;
    let mut account: instagram_account::ActiveModel = require_account(db, nightline).await?.into();
    account.username = Set(username.trim().to_string());
    let account = account.update(db).await?;
    info!("Instagram username updated for nightline '{}'", nightline.name);
    Ok(account)
}

/// Re-encrypts the account password under a fresh salt.
pub async fn update_password<C>(
    db: &C,
    cipher: &PasswordCipher,
    nightline: &NightlineModel,
    password: &str,
) -> Result<InstagramAccountModel>
where
    C: ConnectionTrait,
{
    validation::validate_instagram_password(password)?;
    let existing = require_account(db, nightline).await?;
    let secret = cipher.encrypt(password)?;

    let mut account: instagram_account::ActiveModel = existing.into();
    account.encrypted_password = Set(secret.ciphertext);
    account.salt = Set(secret.salt);
    let account = account.update(db).await?;
    info!("Instagram password updated for nightline '{}'", nightline.name);
    Ok(account)
}

/// Removes the configured account.
pub async fn delete_account<C>(db: &C, nightline: &NightlineModel) -> Result<()>
where
    C: ConnectionTrait,
{
    let account = require_account(db, nightline).await?;
    InstagramAccount::delete_by_id(account.id).exec(db).await?;
    info!("Instagram account removed for nightline '{}'", nightline.name);
    Ok(())
}

/// Loads and decrypts the credentials of `nightline`.
pub async fn credentials<C>(
    db: &C,
    cipher: &PasswordCipher,
    nightline: &NightlineModel,
) -> Result<Credentials>
where
    C: ConnectionTrait,
{
    debug!("Loading Instagram credentials of nightline '{}'", nightline.name);
    let account = require_account(db, nightline).await?;
    let password = cipher.decrypt(&account.encrypted_password, &account.salt)?;
    Ok(Credentials {
        username: account.username,
        password,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::nightline;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_account_lifecycle() -> Result<()> {
        let db = setup_test_db().await?;
        let cipher = test_cipher();
        let testline = nightline::register(&db, "testline").await?;

        let account = add_account(&db, &cipher, &testline, "nightline_test", "hunter2").await?;
        assert_ne!(account.encrypted_password, "hunter2");
        let creds = credentials(&db, &cipher, &testline).await?;
        assert_eq!(creds.username, "nightline_test");
        assert_eq!(creds.password, "hunter2");

        update_username(&db, &testline, "renamed").await?;
        update_password(&db, &cipher, &testline, "correct horse").await?;
        let creds = credentials(&db, &cipher, &testline).await?;
        assert_eq!(creds.username, "renamed");
        assert_eq!(creds.password, "correct horse");

        delete_account(&db, &testline).await?;
        assert!(get_account(&db, &testline).await?.is_none());
        let result = credentials(&db, &cipher, &testline).await;
        assert!(matches!(result, Err(Error::InstagramAccountNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_account_twice_conflicts() -> Result<()> {
        let db = setup_test_db().await?;
        let cipher = test_cipher();
        let testline = nightline::register(&db, "testline").await?;
        add_account(&db, &cipher, &testline, "user", "pw").await?;

        let result = add_account(&db, &cipher, &testline, "other", "pw").await;
        assert!(matches!(
            result,
            Err(Error::InstagramAccountAlreadyExists { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_updates_without_account() -> Result<()> {
        let db = setup_test_db().await?;
        let cipher = test_cipher();
        let testline = nightline::register(&db, "testline").await?;

        assert!(matches!(
            update_username(&db, &testline, "user").await,
            Err(Error::InstagramAccountNotFound { .. })
        ));
        assert!(matches!(
            update_password(&db, &cipher, &testline, "pw").await,
            Err(Error::InstagramAccountNotFound { .. })
        ));
        assert!(matches!(
            delete_account(&db, &testline).await,
            Err(Error::InstagramAccountNotFound { .. })
        ));
        assert!(matches!(
            update_username(&db, &testline, "").await,
            Err(Error::Validation { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials {
            username: "user".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
