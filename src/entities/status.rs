//! Typed status columns shared by the booking tables.
//!
//! Stored as their string values so the partial unique indexes created in
//! [`crate::config::database`] can filter on them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a class or trainer booking.
///
/// `Confirmed` is the only entry state; `Cancelled` is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum BookingStatus {
    /// Admitted and holding a seat or slot
    #[sea_orm(string_value = "Confirmed")]
    Confirmed,
    /// Released; no longer counts against capacity
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

/// Bookability of a trainer schedule slot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ScheduleStatus {
    /// No active booking references the slot
    #[sea_orm(string_value = "Available")]
    Available,
    /// Exactly one active booking references the slot
    #[sea_orm(string_value = "Booked")]
    Booked,
}

impl ScheduleStatus {
    /// Derives the displayed status from the number of active bookings on a slot.
    #[must_use]
    pub const fn from_active_bookings(active: usize) -> Self {
        if active > 0 { Self::Booked } else { Self::Available }
    }
}

/// Discriminator of the polymorphic `reviews` table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ReviewableType {
    /// Review of a class activity
    #[sea_orm(string_value = "classes")]
    Classes,
    /// Review of a trainer
    #[sea_orm(string_value = "trainers")]
    Trainers,
}
