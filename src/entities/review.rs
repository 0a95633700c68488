//! Review entity - a rating left for either a class or a trainer.
//!
//! The target is stored as `(reviewable_type, reviewable_id)`; application code
//! works with [`crate::core::review::ReviewTarget`] instead of the raw pair.

use super::status::ReviewableType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    /// Unique identifier for the review
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Author
    pub user_id: i64,
    /// Score from 1 to 5
    pub rating: i32,
    /// Optional free text
    pub comment: String,
    /// Id of the reviewed class or trainer
    pub reviewable_id: i64,
    /// Which table `reviewable_id` points into
    pub reviewable_type: ReviewableType,
    /// When the review was created
    pub created_at: DateTimeUtc,
    /// When the review was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Review and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each review is written by one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
