//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod api_key;
pub mod instagram_account;
pub mod nightline;
pub mod nightline_status;
pub mod status;
pub mod story_slide;

// Re-export specific types to avoid conflicts
pub use api_key::{Column as ApiKeyColumn, Entity as ApiKey, Model as ApiKeyModel};
pub use instagram_account::{
    Column as InstagramAccountColumn, Entity as InstagramAccount, Model as InstagramAccountModel,
};
pub use nightline::{Column as NightlineColumn, Entity as Nightline, Model as NightlineModel};
pub use nightline_status::{
    Column as NightlineStatusColumn, Entity as NightlineStatus, Model as NightlineStatusModel,
};
pub use status::{Column as StatusColumn, Entity as Status, Model as StatusModel};
pub use story_slide::{
    Column as StorySlideColumn, Entity as StorySlide, Model as StorySlideModel,
};
