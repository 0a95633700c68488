//! Trainer schedule slots and the by-date availability view.
//!
//! Slot status shown to callers is always derived from the active bookings on the
//! slot, never read from the stored column, so a drifted column cannot make a free
//! slot look taken (or the reverse).

use crate::{
    core::{admission, trainer::load_trainers},
    entities::{
        BookingStatus, ScheduleStatus, TrainBooking, Trainer, TrainerSchedule, train_booking,
        trainer, trainer_schedule,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, NaiveTime};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{info, instrument};

/// A slot as displayed to members and trainers.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleView {
    /// The slot, with `status` replaced by the derived value
    pub schedule: trainer_schedule::Model,
    /// Owning trainer
    pub trainer: Option<trainer::Model>,
    /// Active bookings on the slot (at most one)
    pub bookings: Vec<train_booking::Model>,
}

impl ScheduleView {
    /// Derived status of the slot.
    #[must_use]
    pub const fn status(&self) -> ScheduleStatus {
        self.schedule.status
    }
}

/// Parses a `YYYY-MM-DD` date as sent by clients.
///
/// Only the exact ten-character form is accepted; padded or unpadded variants
/// such as `"2026-11-2"` are rejected.
pub fn parse_schedule_date(value: &str) -> Result<NaiveDate> {
    let invalid = || Error::InvalidDate {
        value: value.to_string(),
    };
    if value.len() != 10 {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}

/// Creates an `Available` slot for a trainer on `available_date`.
///
/// # Errors
/// - `InvalidInput` if `end_time` is not after `start_time`
/// - `NotFound` if the trainer does not exist
pub async fn create_schedule(
    db: &DatabaseConnection,
    trainer_id: i64,
    available_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<trainer_schedule::Model> {
    admission::require_id("trainer_id", trainer_id)?;
    if end_time <= start_time {
        return Err(Error::invalid(format!(
            "Schedule end {end_time} must be after start {start_time}"
        )));
    }

    Trainer::find_by_id(trainer_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("trainer", trainer_id))?;

    let now = chrono::Utc::now();
    let schedule = trainer_schedule::ActiveModel {
        trainer_id: Set(trainer_id),
        available_date: Set(available_date),
        start_time: Set(available_date.and_time(start_time).and_utc()),
        end_time: Set(available_date.and_time(end_time).and_utc()),
        status: Set(ScheduleStatus::Available),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    schedule.insert(db).await.map_err(Into::into)
}

/// Retrieves a slot by id with its stored status.
pub async fn get_schedule_by_id(
    db: &DatabaseConnection,
    schedule_id: i64,
) -> Result<Option<trainer_schedule::Model>> {
    TrainerSchedule::find_by_id(schedule_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every slot of a trainer, earliest first.
pub async fn get_schedules_by_trainer(
    db: &DatabaseConnection,
    trainer_id: i64,
) -> Result<Vec<trainer_schedule::Model>> {
    TrainerSchedule::find()
        .filter(trainer_schedule::Column::TrainerId.eq(trainer_id))
        .order_by_asc(trainer_schedule::Column::StartTime)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns a trainer's slots for one day with status derived from active bookings.
///
/// `date` is the raw client string; anything but `YYYY-MM-DD` is `InvalidDate`.
/// An unknown trainer yields an empty list.
#[instrument(skip(db))]
pub async fn get_schedules_by_date(
    db: &DatabaseConnection,
    trainer_id: i64,
    date: &str,
) -> Result<Vec<ScheduleView>> {
    admission::require_id("trainer_id", trainer_id)?;
    let day = parse_schedule_date(date)?;

    let schedules = TrainerSchedule::find()
        .filter(trainer_schedule::Column::TrainerId.eq(trainer_id))
        .filter(trainer_schedule::Column::AvailableDate.eq(day))
        .order_by_asc(trainer_schedule::Column::StartTime)
        .all(db)
        .await?;
    into_views(db, schedules).await
}

/// Lists every slot of every trainer, earliest first, with derived status.
pub async fn list_schedules(db: &DatabaseConnection) -> Result<Vec<ScheduleView>> {
    let schedules = TrainerSchedule::find()
        .order_by_asc(trainer_schedule::Column::StartTime)
        .order_by_asc(trainer_schedule::Column::Id)
        .all(db)
        .await?;
    into_views(db, schedules).await
}

/// Moves a slot to another day or time window.
///
/// Only the date and times are written. The stored status stays as it is; it is
/// maintained by the slot booking manager alone.
///
/// # Errors
/// - `InvalidInput` if `end_time` is not after `start_time`
/// - `NotFound` if the slot does not exist
#[instrument(skip(db))]
pub async fn update_schedule(
    db: &DatabaseConnection,
    schedule_id: i64,
    available_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<trainer_schedule::Model> {
    admission::require_id("schedule_id", schedule_id)?;
    if end_time <= start_time {
        return Err(Error::invalid(format!(
            "Schedule end {end_time} must be after start {start_time}"
        )));
    }

    let schedule = TrainerSchedule::find_by_id(schedule_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("schedule", schedule_id))?;

    let mut active: trainer_schedule::ActiveModel = schedule.into();
    active.available_date = Set(available_date);
    active.start_time = Set(available_date.and_time(start_time).and_utc());
    active.end_time = Set(available_date.and_time(end_time).and_utc());
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Deletes a slot that nobody holds.
///
/// Cancelled bookings of the slot are removed with it in the same transaction.
///
/// # Errors
/// - `NotFound` if the slot does not exist
/// - `SlotAlreadyTaken` if the slot has an active booking
#[instrument(skip(db))]
pub async fn delete_schedule(db: &DatabaseConnection, schedule_id: i64) -> Result<()> {
    admission::require_id("schedule_id", schedule_id)?;

    let txn = db.begin().await?;

    // Same lock as the booking path, so no booking can land mid-delete
    let exists = admission::lock_row::<TrainerSchedule, _>(
        &txn,
        trainer_schedule::Column::Id,
        trainer_schedule::Column::UpdatedAt,
        schedule_id,
    )
    .await?;
    if !exists {
        return Err(Error::not_found("schedule", schedule_id));
    }

    let active = TrainBooking::find()
        .filter(train_booking::Column::ScheduleId.eq(schedule_id))
        .filter(train_booking::Column::DeletedAt.is_null())
        .filter(train_booking::Column::BookingStatus.ne(BookingStatus::Cancelled))
        .count(&txn)
        .await?;
    if active > 0 {
        return Err(Error::SlotAlreadyTaken { schedule_id });
    }

    TrainBooking::delete_many()
        .filter(train_booking::Column::ScheduleId.eq(schedule_id))
        .exec(&txn)
        .await?;
    TrainerSchedule::delete_by_id(schedule_id).exec(&txn).await?;
    txn.commit().await?;

    info!("Schedule deleted");
    Ok(())
}

async fn into_views(
    db: &DatabaseConnection,
    schedules: Vec<trainer_schedule::Model>,
) -> Result<Vec<ScheduleView>> {
    if schedules.is_empty() {
        return Ok(Vec::new());
    }

    let mut bookings_by_slot = load_active_bookings(db, schedules.iter().map(|s| s.id)).await?;
    let trainers = load_trainers(db, schedules.iter().map(|s| s.trainer_id)).await?;

    Ok(schedules
        .into_iter()
        .map(|mut schedule| {
            let bookings = bookings_by_slot.remove(&schedule.id).unwrap_or_default();
            schedule.status = ScheduleStatus::from_active_bookings(bookings.len());
            ScheduleView {
                trainer: trainers.get(&schedule.trainer_id).cloned(),
                schedule,
                bookings,
            }
        })
        .collect())
}

/// Loads the given slots in one query, keyed by id.
pub(crate) async fn load_schedules<C, I>(
    conn: &C,
    ids: I,
) -> Result<HashMap<i64, trainer_schedule::Model>>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = i64>,
{
    let mut ids: Vec<i64> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let schedules = TrainerSchedule::find()
        .filter(trainer_schedule::Column::Id.is_in(ids))
        .all(conn)
        .await?;
    Ok(schedules.into_iter().map(|s| (s.id, s)).collect())
}

async fn load_active_bookings<I>(
    db: &DatabaseConnection,
    schedule_ids: I,
) -> Result<HashMap<i64, Vec<train_booking::Model>>>
where
    I: IntoIterator<Item = i64>,
{
    let bookings = TrainBooking::find()
        .filter(train_booking::Column::ScheduleId.is_in(schedule_ids))
        .filter(train_booking::Column::DeletedAt.is_null())
        .filter(train_booking::Column::BookingStatus.ne(BookingStatus::Cancelled))
        .order_by_asc(train_booking::Column::Id)
        .all(db)
        .await?;

    let mut by_slot: HashMap<i64, Vec<train_booking::Model>> = HashMap::new();
    for booking in bookings {
        by_slot.entry(booking.schedule_id).or_default().push(booking);
    }
    Ok(by_slot)
}
