//! Class activity entity - a group class with a fixed capacity.
//!
//! The class row is the capacity authority for class bookings. The number of
//! participants is never stored here; it is derived by counting non-cancelled
//! bookings (see [`crate::core::class_activity::ClassActivityView`]).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Class activity database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "class_activities")]
pub struct Model {
    /// Unique identifier for the class
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g. "Morning Yoga")
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Day the class runs
    pub date: Date,
    /// Local start time
    pub start_time: Time,
    /// Local end time
    pub end_time: Time,
    /// Room or area where the class is held
    pub location: String,
    /// Maximum number of concurrent non-cancelled bookings
    pub capacity: i32,
    /// Optional cover image path
    pub image_url: Option<String>,
    /// Mean review rating, recomputed by the rating aggregator
    pub average_rating: f64,
    /// Number of reviews behind `average_rating`
    pub review_count: i32,
    /// When the class was created
    pub created_at: DateTimeUtc,
    /// When the class was last modified; also touched to take the admission lock
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `ClassActivity` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One class has many bookings
    #[sea_orm(has_many = "super::class_booking::Entity")]
    Bookings,
}

impl Related<super::class_booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
