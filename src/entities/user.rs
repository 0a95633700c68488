//! User entity - a club member who books classes and trainer slots.
//!
//! Accounts are owned by the identity collaborator; this table only carries
//! what booking responses attach.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Login email, unique per user
    #[sea_orm(unique)]
    pub email: String,
    /// When the user was created
    pub created_at: DateTimeUtc,
    /// When the user was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many class bookings
    #[sea_orm(has_many = "super::class_booking::Entity")]
    ClassBookings,
    /// One user has many trainer bookings
    #[sea_orm(has_many = "super::train_booking::Entity")]
    TrainBookings,
    /// One user writes many reviews
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::class_booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassBookings.def()
    }
}

impl Related<super::train_booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrainBookings.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
