//! Status business logic - The catalog of availability states.
//!
//! Adding a status inserts its configuration row for every registered nightline in the
//! same transaction; removing one deletes those rows (and their slides) first. A status
//! that a nightline currently points at cannot be removed, and neither can `default`.

use crate::{
    config::{DEFAULT_STATUS, statuses::StatusConfig},
    core::{nightline_status, validation},
    entities::{Nightline, Status, StatusModel, nightline, status},
    errors::{Error, Result},
    storage::BlobStore,
};
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Finds a status by its exact name.
pub async fn get_status<C>(db: &C, name: &str) -> Result<Option<StatusModel>>
where
    C: ConnectionTrait,
{
    Status::find()
        .filter(status::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_status`], but a missing status is [`Error::StatusNotFound`].
pub async fn require_status<C>(db: &C, name: &str) -> Result<StatusModel>
where
    C: ConnectionTrait,
{
    get_status(db, name)
        .await?
        .ok_or_else(|| Error::StatusNotFound {
            name: name.to_string(),
        })
}

fn validate_definition(definition: &StatusConfig) -> Result<()> {
    validation::validate_status_name(&definition.name)?;
    validation::validate_description("description_de", &definition.description_de)?;
    validation::validate_description("description_en", &definition.description_en)?;
    validation::validate_description("description_now_de", &definition.description_now_de)?;
    validation::validate_description("description_now_en", &definition.description_now_en)
}

/// Adds a status and a disabled configuration row for every existing nightline.
///
/// # Errors
/// [`Error::Validation`] for a malformed definition, [`Error::StatusAlreadyExists`] if the
/// name is taken. On any storage failure nothing is written.
pub async fn add_status(db: &DatabaseConnection, definition: &StatusConfig) -> Result<StatusModel> {
    debug!("Adding status '{}'", definition.name);
    validate_definition(definition)?;

    if get_status(db, &definition.name).await?.is_some() {
        warn!("Status '{}' already exists", definition.name);
        return Err(Error::StatusAlreadyExists {
            name: definition.name.clone(),
        });
    }

    let txn = db.begin().await?;
    let new_status = status::ActiveModel {
        name: Set(definition.name.clone()),
        description_de: Set(definition.description_de.clone()),
        description_en: Set(definition.description_en.clone()),
        description_now_de: Set(definition.description_now_de.clone()),
        description_now_en: Set(definition.description_now_en.clone()),
        ..Default::default()
    };
    let created = match new_status.insert(&txn).await {
        Ok(created) => created,
        // Lost a race against a concurrent insert
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(Error::StatusAlreadyExists {
                name: definition.name.clone(),
            });
        }
        Err(e) => {
            error!("Failed to insert status '{}': {}", definition.name, e);
            return Err(e.into());
        }
    };
    nightline_status::bulk_create_for_new_status(&txn, &created).await?;
    txn.commit().await?;

    info!("Status '{}' added", created.name);
    Ok(created)
}

/// Removes a status together with its configuration rows and slides.
///
/// Slide files are deleted from `store` after the database commit; failures there are
/// logged and do not undo the removal.
///
/// # Errors
/// [`Error::Validation`] for `default`, [`Error::StatusNotFound`] for an unknown name and
/// [`Error::StatusInUse`] while nightlines still point at the status.
pub async fn remove_status(
    db: &DatabaseConnection,
    store: &dyn BlobStore,
    name: &str,
) -> Result<StatusModel> {
    debug!("Removing status '{}'", name);
    if name == DEFAULT_STATUS {
        return Err(Error::validation(format!(
            "Status '{DEFAULT_STATUS}' cannot be removed"
        )));
    }

    let txn = db.begin().await?;
    let target = require_status(&txn, name).await?;

    let referencing = Nightline::find()
        .filter(nightline::Column::StatusId.eq(target.id))
        .order_by_asc(nightline::Column::Name)
        .all(&txn)
        .await?;
    if !referencing.is_empty() {
        let nightlines: Vec<String> = referencing.into_iter().map(|n| n.name).collect();
        warn!(
            "Refusing to remove status '{}', in use by {:?}",
            name, nightlines
        );
        return Err(Error::StatusInUse {
            name: name.to_string(),
            nightlines,
        });
    }

    let removed = nightline_status::bulk_delete_for_status(&txn, &target).await?;
    Status::delete_by_id(target.id).exec(&txn).await?;
    txn.commit().await?;
    info!("Status '{}' removed", name);

    for path in removed.slide_paths() {
        if let Err(e) = store.delete(Path::new(path)).await {
            warn!("Could not remove slide of removed status '{}': {}", name, e);
        }
    }
    Ok(target)
}

/// Lists all statuses ordered by id.
///
/// A failing query is logged and yields an empty list.
pub async fn list_statuses<C>(db: &C) -> Vec<StatusModel>
where
    C: ConnectionTrait,
{
    match Status::find().order_by_asc(status::Column::Id).all(db).await {
        Ok(statuses) => statuses,
        Err(e) => {
            error!("Failed to list statuses: {}", e);
            Vec::new()
        }
    }
}

/// Makes sure every status in `catalog` exists. Existing rows are left untouched.
///
/// Returns the number of statuses inserted; running it again returns 0.
pub async fn seed_statuses(db: &DatabaseConnection, catalog: &[StatusConfig]) -> Result<usize> {
    let mut inserted = 0;
    for definition in catalog {
        if get_status(db, &definition.name).await?.is_some() {
            debug!("Status '{}' already seeded", definition.name);
            continue;
        }
        add_status(db, definition).await?;
        inserted += 1;
    }
    if inserted > 0 {
        info!("Seeded {} statuses", inserted);
    }
    Ok(inserted)
}
