//! Database configuration module for nightlight.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! created in foreign-key order and only when missing, so restarting against an existing
//! database file is safe. Foreign keys carry no `ON DELETE` cascades: every cascade is an
//! explicit step in [`crate::core`].

use crate::entities::{
    ApiKey, InstagramAccount, Nightline, NightlineStatus, NightlineStatusColumn, Status,
    StorySlide,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

/// Default connection string used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/nightlight.sqlite?mode=rwc";

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database: {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity definitions.
///
/// Also creates the unique index guaranteeing at most one configuration row per
/// (nightline, status) pair.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    // Parents before children, the foreign keys are enforced
    create_table(db, &schema, Status).await?;
    create_table(db, &schema, Nightline).await?;
    create_table(db, &schema, ApiKey).await?;
    create_table(db, &schema, NightlineStatus).await?;
    create_table(db, &schema, StorySlide).await?;
    create_table(db, &schema, InstagramAccount).await?;

    let pair_index = Index::create()
        .name("idx_nightline_statuses_pair")
        .table(NightlineStatus)
        .col(NightlineStatusColumn::NightlineId)
        .col(NightlineStatusColumn::StatusId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&pair_index)).await?;

    info!("Database tables ensured");
    Ok(())
}
