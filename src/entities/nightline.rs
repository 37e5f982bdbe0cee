//! Nightline entity - A volunteer hotline organization and its live state.
//!
//! The row holds the current status pointer, the `now` flag and the media id of the
//! story currently posted for it, if any.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Nightline database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "nightlines")]
pub struct Model {
    /// Unique identifier for the nightline
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Unique, lowercase alphanumeric name
    #[sea_orm(unique)]
    pub name: String,
    /// ID of the current status (never null)
    pub status_id: i32,
    /// Whether a volunteer is reachable right now
    pub now: bool,
    /// Media id of the story currently posted externally, `None` when nothing is live
    pub instagram_media_id: Option<String>,
    /// When the status pointer was last written
    pub status_updated_at: DateTimeUtc,
}

/// Defines relationships between Nightline and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each nightline points at one status
    #[sea_orm(
        belongs_to = "super::status::Entity",
        from = "Column::StatusId",
        to = "super::status::Column::Id"
    )]
    Status,
    /// One API key per nightline
    #[sea_orm(has_one = "super::api_key::Entity")]
    ApiKey,
    /// One configuration row per existing status
    #[sea_orm(has_many = "super::nightline_status::Entity")]
    NightlineStatuses,
    /// Optional external account used for story posting
    #[sea_orm(has_one = "super::instagram_account::Entity")]
    InstagramAccount,
}

impl Related<super::status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Status.def()
    }
}

impl Related<super::api_key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApiKey.def()
    }
}

impl Related<super::nightline_status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NightlineStatuses.def()
    }
}

impl Related<super::instagram_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InstagramAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
