//! Class booking entity - a user's seat in a class activity.
//!
//! Rows are never hard-deleted. Cancellation flips `status` and the seat is
//! freed implicitly because occupancy counts skip cancelled rows.

use super::status::BookingStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Class booking database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "class_bookings")]
pub struct Model {
    /// Unique identifier for the booking
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Booking user
    pub user_id: i64,
    /// Booked class
    pub class_activity_id: i64,
    /// `Confirmed` on creation, `Cancelled` after cancellation
    pub status: BookingStatus,
    /// When the booking was created
    pub created_at: DateTimeUtc,
    /// When the booking was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `ClassBooking` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each booking belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Each booking belongs to one class
    #[sea_orm(
        belongs_to = "super::class_activity::Entity",
        from = "Column::ClassActivityId",
        to = "super::class_activity::Column::Id"
    )]
    ClassActivity,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::class_activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassActivity.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
