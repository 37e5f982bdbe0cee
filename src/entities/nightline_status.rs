//! Nightline status entity - Per (nightline, status) configuration.
//!
//! Exactly one row exists for every pair of existing nightline and existing status.
//! The row decides whether reaching the status posts a story, and owns the bound slide.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Nightline status configuration model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "nightline_statuses")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Nightline half of the pair
    pub nightline_id: i32,
    /// Status half of the pair
    pub status_id: i32,
    /// Whether switching to this status should post a story
    pub instagram_story: bool,
}

/// Defines relationships between `NightlineStatus` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Owning nightline
    #[sea_orm(
        belongs_to = "super::nightline::Entity",
        from = "Column::NightlineId",
        to = "super::nightline::Column::Id"
    )]
    Nightline,
    /// Configured status
    #[sea_orm(
        belongs_to = "super::status::Entity",
        from = "Column::StatusId",
        to = "super::status::Column::Id"
    )]
    Status,
    /// Optional bound story slide
    #[sea_orm(has_one = "super::story_slide::Entity")]
    StorySlide,
}

impl Related<super::nightline::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Nightline.def()
    }
}

impl Related<super::status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Status.def()
    }
}

impl Related<super::story_slide::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StorySlide.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
