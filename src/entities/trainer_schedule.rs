//! Trainer schedule entity - a single bookable time slot.

use super::status::ScheduleStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Trainer schedule database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trainer_schedules")]
pub struct Model {
    /// Unique identifier for the slot
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning trainer
    pub trainer_id: i64,
    /// Day the slot belongs to
    pub available_date: Date,
    /// Slot start
    pub start_time: DateTimeUtc,
    /// Slot end
    pub end_time: DateTimeUtc,
    /// Stored status; written only by the slot booking manager
    pub status: ScheduleStatus,
    /// When the slot was created
    pub created_at: DateTimeUtc,
    /// When the slot was last modified; also touched to take the admission lock
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `TrainerSchedule` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each slot belongs to one trainer
    #[sea_orm(
        belongs_to = "super::trainer::Entity",
        from = "Column::TrainerId",
        to = "super::trainer::Column::Id"
    )]
    Trainer,
    /// A slot keeps its booking history, at most one of which is active
    #[sea_orm(has_many = "super::train_booking::Entity")]
    Bookings,
}

impl Related<super::trainer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trainer.def()
    }
}

impl Related<super::train_booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
