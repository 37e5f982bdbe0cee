//! API key entity - The per-nightline access credential.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// API key database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Opaque URL-safe token
    #[sea_orm(unique)]
    pub key: String,
    /// Owning nightline
    #[sea_orm(unique)]
    pub nightline_id: i32,
}

/// Defines relationships between `ApiKey` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each key belongs to exactly one nightline
    #[sea_orm(
        belongs_to = "super::nightline::Entity",
        from = "Column::NightlineId",
        to = "super::nightline::Column::Id"
    )]
    Nightline,
}

impl Related<super::nightline::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Nightline.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
