//! Trainer entity - owns bookable schedule slots and receives reviews.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Trainer database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trainers")]
pub struct Model {
    /// Unique identifier for the trainer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact email, unique per trainer
    #[sea_orm(unique)]
    pub email: String,
    /// Speciality shown to members (e.g. "Strength", "Pilates")
    pub skill: String,
    /// Mean review rating, recomputed by the rating aggregator
    pub average_rating: f64,
    /// Number of reviews behind `average_rating`
    pub review_count: i32,
    /// When the trainer was created
    pub created_at: DateTimeUtc,
    /// When the trainer was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Trainer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One trainer has many schedule slots
    #[sea_orm(has_many = "super::trainer_schedule::Entity")]
    Schedules,
}

impl Related<super::trainer_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedules.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
