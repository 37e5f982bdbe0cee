//! Instagram account entity - Credentials used to post stories for a nightline.
//!
//! The password is never stored in clear text: `encrypted_password` holds the
//! base64 nonce and ciphertext, `salt` the per-account key derivation salt.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Instagram account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "instagram_accounts")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Owning nightline (at most one account per nightline)
    #[sea_orm(unique)]
    pub nightline_id: i32,
    /// Account username
    pub username: String,
    /// Encrypted password
    #[serde(skip_serializing)]
    pub encrypted_password: String,
    /// Key derivation salt
    #[serde(skip_serializing)]
    pub salt: String,
}

/// Defines relationships between `InstagramAccount` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each account belongs to exactly one nightline
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
