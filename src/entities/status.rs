//! Status entity - A named availability state with bilingual descriptions.
//!
//! Every nightline points at exactly one status. Each status carries a German and an
//! English description, in a "scheduled" variant and a "currently happening" variant.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "statuses")]
pub struct Model {
    /// Unique identifier for the status
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Unique machine name (e.g., "german", "technical-issues")
    #[sea_orm(unique)]
    pub name: String,
    /// German description for a scheduled shift
    pub description_de: String,
    /// English description for a scheduled shift
    pub description_en: String,
    /// German description while the shift is live
    pub description_now_de: String,
    /// English description while the shift is live
    pub description_now_en: String,
}

/// Defines relationships between Status and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Nightlines currently pointing at this status
    #[sea_orm(has_many = "super::nightline::Entity")]
    Nightlines,
    /// Per-nightline configuration rows for this status
    #[sea_orm(has_many = "super::nightline_status::Entity")]
    NightlineStatuses,
}

impl Related<super::nightline::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Nightlines.def()
    }
}

impl Related<super::nightline_status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NightlineStatuses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
