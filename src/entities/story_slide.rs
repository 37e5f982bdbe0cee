//! Story slide entity - An uploaded image bound to one nightline status row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Story slide database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storyslides")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// File name inside the nightline's namespace (e.g. `english.png`)
    pub filename: String,
    /// Full storage path of the file
    pub path: String,
    /// Configuration row this slide is bound to (1:1)
    #[sea_orm(unique)]
    pub nightline_status_id: i32,
}

/// Defines relationships between `StorySlide` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The configuration row owning this slide
    #[sea_orm(
        belongs_to = "super::nightline_status::Entity",
        from = "Column::NightlineStatusId",
        to = "super::nightline_status::Column::Id"
    )]
    NightlineStatus,
}

impl Related<super::nightline_status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NightlineStatus.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
