//! Trainer Slot Booking Manager - exclusive reservation of trainer schedule slots.
//!
//! A slot holds at most one active booking (not cancelled, not soft-deleted).
//! Creating a booking inserts the row and marks the slot `Booked` in one
//! transaction; cancelling marks the booking `Cancelled`, soft-deletes it and marks
//! the slot `Available` in one transaction. Any failed write rolls back the whole
//! step and is reported as `BookingFailed`.

use crate::{
    core::{admission, schedule::load_schedules, trainer::load_trainers, user::load_users},
    entities::{
        BookingStatus, ScheduleStatus, TrainBooking, Trainer, TrainerSchedule, User,
        train_booking, trainer, trainer_schedule, user,
    },
    errors::{Error, Result, is_unique_violation},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    DbErr, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::{debug, info, instrument};

/// A trainer booking with member, slot and trainer attached.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainBookingDetails {
    /// The booking row
    pub booking: train_booking::Model,
    /// Booking member
    pub user: Option<user::Model>,
    /// Reserved slot
    pub schedule: Option<trainer_schedule::Model>,
    /// Trainer owning the slot
    pub trainer: Option<trainer::Model>,
}

/// Active bookings on a slot: not cancelled and not soft-deleted.
fn active_on_slot(schedule_id: i64) -> Select<TrainBooking> {
    TrainBooking::find()
        .filter(train_booking::Column::ScheduleId.eq(schedule_id))
        .filter(train_booking::Column::DeletedAt.is_null())
        .filter(train_booking::Column::BookingStatus.ne(BookingStatus::Cancelled))
}

async fn set_schedule_status<C>(
    conn: &C,
    schedule_id: i64,
    status: ScheduleStatus,
    now: DateTime<Utc>,
) -> std::result::Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let result = TrainerSchedule::update_many()
        .col_expr(trainer_schedule::Column::Status, Expr::value(status))
        .col_expr(trainer_schedule::Column::UpdatedAt, Expr::value(now))
        .filter(trainer_schedule::Column::Id.eq(schedule_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Reserves a trainer slot for a member.
///
/// # Errors
/// - `InvalidInput` if either id is not positive (no store access)
/// - `SlotAlreadyTaken` if the slot already has an active booking
/// - `NotFound` if the member does not exist
/// - `BookingFailed` if the slot does not exist or the store fails; nothing is persisted
#[instrument(skip(db))]
pub async fn create_train_booking(
    db: &DatabaseConnection,
    user_id: i64,
    schedule_id: i64,
) -> Result<TrainBookingDetails> {
    admission::require_id("user_id", user_id)?;
    admission::require_id("schedule_id", schedule_id)?;

    let txn = db
        .begin()
        .await
        .map_err(admission::booking_failed("begin transaction"))?;

    // First statement of the transaction: serializes admissions in the store
    let slot_exists = admission::lock_row::<TrainerSchedule, _>(
        &txn,
        trainer_schedule::Column::Id,
        trainer_schedule::Column::UpdatedAt,
        schedule_id,
    )
    .await
    .map_err(admission::booking_failed("lock schedule"))?;

    let taken = active_on_slot(schedule_id)
        .one(&txn)
        .await
        .map_err(admission::booking_failed("check slot"))?
        .is_some();
    if taken {
        debug!("Slot already has an active booking");
        return Err(Error::SlotAlreadyTaken { schedule_id });
    }
    if !slot_exists {
        return Err(Error::BookingFailed {
            reason: format!("schedule {schedule_id} does not exist"),
        });
    }
    let member = User::find_by_id(user_id)
        .one(&txn)
        .await
        .map_err(admission::booking_failed("load member"))?;
    if member.is_none() {
        return Err(Error::not_found("user", user_id));
    }

    let now = Utc::now();
    let booking = train_booking::ActiveModel {
        users_id: Set(user_id),
        schedule_id: Set(schedule_id),
        booking_status: Set(BookingStatus::Confirmed),
        booking_date: Set(now),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            Error::SlotAlreadyTaken { schedule_id }
        } else {
            admission::booking_failed("insert booking")(err)
        }
    })?;

    set_schedule_status(&txn, schedule_id, ScheduleStatus::Booked, now)
        .await
        .map_err(admission::booking_failed("mark schedule booked"))?;

    txn.commit()
        .await
        .map_err(admission::booking_failed("commit"))?;

    info!(booking_id = booking.id, "Trainer slot booked");
    attach_one(db, booking).await
}

/// Cancels a trainer booking and frees its slot.
///
/// Cancelling an already cancelled booking is a no-op.
///
/// # Errors
/// - `BookingNotFound` if the id never existed
/// - `BookingFailed` if any of the three writes fails; none of them is persisted
#[instrument(skip(db))]
pub async fn cancel_train_booking(db: &DatabaseConnection, booking_id: i64) -> Result<()> {
    let booking = TrainBooking::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or(Error::BookingNotFound { id: booking_id })?;

    if !booking.is_active() {
        debug!("Trainer booking already cancelled");
        return Ok(());
    }

    let txn = db
        .begin()
        .await
        .map_err(admission::booking_failed("begin transaction"))?;

    admission::lock_row::<TrainerSchedule, _>(
        &txn,
        trainer_schedule::Column::Id,
        trainer_schedule::Column::UpdatedAt,
        booking.schedule_id,
    )
    .await
    .map_err(admission::booking_failed("lock schedule"))?;

    // A concurrent cancellation may have committed before the lock was taken
    let still_active = TrainBooking::find_by_id(booking_id)
        .one(&txn)
        .await
        .map_err(admission::booking_failed("reload booking"))?
        .is_some_and(|current| current.is_active());
    if !still_active {
        return Ok(());
    }

    let now = Utc::now();

    TrainBooking::update_many()
        .col_expr(
            train_booking::Column::BookingStatus,
            Expr::value(BookingStatus::Cancelled),
        )
        .col_expr(train_booking::Column::UpdatedAt, Expr::value(now))
        .filter(train_booking::Column::Id.eq(booking_id))
        .exec(&txn)
        .await
        .map_err(admission::booking_failed("mark booking cancelled"))?;

    TrainBooking::update_many()
        .col_expr(train_booking::Column::DeletedAt, Expr::value(now))
        .filter(train_booking::Column::Id.eq(booking_id))
        .exec(&txn)
        .await
        .map_err(admission::booking_failed("soft-delete booking"))?;

    set_schedule_status(&txn, booking.schedule_id, ScheduleStatus::Available, now)
        .await
        .map_err(admission::booking_failed("release schedule"))?;

    txn.commit()
        .await
        .map_err(admission::booking_failed("commit"))?;

    info!(schedule_id = booking.schedule_id, "Trainer booking cancelled");
    Ok(())
}

/// Retrieves a live (not soft-deleted) trainer booking.
///
/// # Errors
/// `BookingNotFound` if the id does not resolve to a live booking.
pub async fn get_train_booking(
    db: &DatabaseConnection,
    booking_id: i64,
) -> Result<TrainBookingDetails> {
    let booking = TrainBooking::find_by_id(booking_id)
        .filter(train_booking::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or(Error::BookingNotFound { id: booking_id })?;
    attach_one(db, booking).await
}

/// Lists a member's live trainer bookings, oldest first.
pub async fn get_bookings_by_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<TrainBookingDetails>> {
    let bookings = TrainBooking::find()
        .filter(train_booking::Column::UsersId.eq(user_id))
        .filter(train_booking::Column::DeletedAt.is_null())
        .order_by_asc(train_booking::Column::Id)
        .all(db)
        .await?;
    attach_all(db, bookings).await
}

/// Lists a customer's live trainer bookings by booking date, for display of the
/// times they already hold.
pub async fn get_customer_booked_times(
    db: &DatabaseConnection,
    customer_id: i64,
) -> Result<Vec<TrainBookingDetails>> {
    let bookings = TrainBooking::find()
        .filter(train_booking::Column::UsersId.eq(customer_id))
        .filter(train_booking::Column::DeletedAt.is_null())
        .order_by_asc(train_booking::Column::BookingDate)
        .order_by_asc(train_booking::Column::Id)
        .all(db)
        .await?;
    attach_all(db, bookings).await
}

/// Lists the distinct members holding a live booking on any of a trainer's slots.
pub async fn get_customers_by_trainer(
    db: &DatabaseConnection,
    trainer_id: i64,
) -> Result<Vec<user::Model>> {
    let user_ids: Vec<i64> = TrainBooking::find()
        .select_only()
        .column(train_booking::Column::UsersId)
        .distinct()
        .inner_join(TrainerSchedule)
        .filter(trainer_schedule::Column::TrainerId.eq(trainer_id))
        .filter(train_booking::Column::DeletedAt.is_null())
        .into_tuple::<i64>()
        .all(db)
        .await?;
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    User::find()
        .filter(user::Column::Id.is_in(user_ids))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn attach_one(
    db: &DatabaseConnection,
    booking: train_booking::Model,
) -> Result<TrainBookingDetails> {
    let user = User::find_by_id(booking.users_id).one(db).await?;
    let schedule = TrainerSchedule::find_by_id(booking.schedule_id)
        .one(db)
        .await?;
    let trainer = match &schedule {
        Some(s) => Trainer::find_by_id(s.trainer_id).one(db).await?,
        None => None,
    };
    Ok(TrainBookingDetails {
        booking,
        user,
        schedule,
        trainer,
    })
}

async fn attach_all(
    db: &DatabaseConnection,
    bookings: Vec<train_booking::Model>,
) -> Result<Vec<TrainBookingDetails>> {
    let users = load_users(db, bookings.iter().map(|b| b.users_id)).await?;
    let schedules = load_schedules(db, bookings.iter().map(|b| b.schedule_id)).await?;
    let trainers = load_trainers(db, schedules.values().map(|s| s.trainer_id)).await?;

    Ok(bookings
        .into_iter()
        .map(|booking| {
            let schedule = schedules.get(&booking.schedule_id).cloned();
            let trainer = schedule
                .as_ref()
                .and_then(|s| trainers.get(&s.trainer_id).cloned());
            TrainBookingDetails {
                user: users.get(&booking.users_id).cloned(),
                schedule,
                trainer,
                booking,
            }
        })
        .collect())
}
