//! Train booking entity - a user's reservation of one trainer schedule slot.
//!
//! Cancellation sets `booking_status` to `Cancelled` and stamps `deleted_at`
//! (soft delete) in the same transaction that frees the slot.

use super::status::BookingStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Train booking database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "train_bookings")]
pub struct Model {
    /// Unique identifier for the booking
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Booking user
    pub users_id: i64,
    /// Reserved slot
    pub schedule_id: i64,
    /// `Confirmed` on creation, `Cancelled` after cancellation
    pub booking_status: BookingStatus,
    /// When the reservation was made
    pub booking_date: DateTimeUtc,
    /// When the row was created
    pub created_at: DateTimeUtc,
    /// When the row was last modified
    pub updated_at: DateTimeUtc,
    /// Soft delete marker; set on cancellation
    pub deleted_at: Option<DateTimeUtc>,
}

impl Model {
    /// True while the booking holds its slot.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none() && self.booking_status != BookingStatus::Cancelled
    }
}

/// Defines relationships between `TrainBooking` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each booking belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UsersId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Each booking reserves one slot
    #[sea_orm(
        belongs_to = "super::trainer_schedule::Entity",
        from = "Column::ScheduleId",
        to = "super::trainer_schedule::Column::Id"
    )]
    Schedule,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::trainer_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
