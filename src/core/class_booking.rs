//! Class Capacity Manager - admission control for group-class bookings.
//!
//! A booking is admitted only if the user holds no other non-cancelled booking for
//! the class and the class still has a free seat. Occupancy is always counted from
//! the booking rows. The duplicate check, the count and the insert run in one
//! transaction that first takes the store's write lock through the class row (see
//! [`admission`]), so concurrent requests for the same class are admitted one at a
//! time and the class can never end up over capacity.

use crate::{
    core::{admission, class_activity::load_class_activities, user::load_users},
    entities::{BookingStatus, ClassActivity, ClassBooking, User, class_activity, class_booking, user},
    errors::{Error, Result, is_unique_violation},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// A class booking with the member and class attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassBookingDetails {
    /// The booking row
    pub booking: class_booking::Model,
    /// Booking member
    pub user: Option<user::Model>,
    /// Booked class
    pub class_activity: Option<class_activity::Model>,
}

/// Counts the non-cancelled bookings of a class.
pub(crate) async fn count_active_bookings<C>(conn: &C, class_activity_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    ClassBooking::find()
        .filter(class_booking::Column::ClassActivityId.eq(class_activity_id))
        .filter(class_booking::Column::Status.ne(BookingStatus::Cancelled))
        .count(conn)
        .await
        .map_err(Into::into)
}

async fn find_active_booking<C>(
    conn: &C,
    user_id: i64,
    class_activity_id: i64,
) -> Result<Option<class_booking::Model>>
where
    C: ConnectionTrait,
{
    ClassBooking::find()
        .filter(class_booking::Column::UserId.eq(user_id))
        .filter(class_booking::Column::ClassActivityId.eq(class_activity_id))
        .filter(class_booking::Column::Status.ne(BookingStatus::Cancelled))
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Books a seat in a class for a member.
///
/// # Errors
/// Checked in this order:
/// - `InvalidInput` if either id is not positive (no store access)
/// - `AlreadyBooked` if the member already holds a non-cancelled booking for the class
/// - `ClassNotFound` if the class does not exist
/// - `NotFound` if the member does not exist
/// - `CapacityExceeded` if the non-cancelled bookings already fill the class
#[instrument(skip(db))]
pub async fn create_class_booking(
    db: &DatabaseConnection,
    user_id: i64,
    class_activity_id: i64,
) -> Result<ClassBookingDetails> {
    admission::require_id("user_id", user_id)?;
    admission::require_id("class_activity_id", class_activity_id)?;

    let txn = db.begin().await?;

    // First statement of the transaction: serializes admissions in the store
    admission::lock_row::<ClassActivity, _>(
        &txn,
        class_activity::Column::Id,
        class_activity::Column::UpdatedAt,
        class_activity_id,
    )
    .await?;

    if find_active_booking(&txn, user_id, class_activity_id)
        .await?
        .is_some()
    {
        debug!("Member already holds a seat in this class");
        return Err(Error::AlreadyBooked {
            user_id,
            class_activity_id,
        });
    }

    let class = ClassActivity::find_by_id(class_activity_id)
        .one(&txn)
        .await?
        .ok_or(Error::ClassNotFound {
            id: class_activity_id,
        })?;

    if User::find_by_id(user_id).one(&txn).await?.is_none() {
        return Err(Error::not_found("user", user_id));
    }

    let participants = count_active_bookings(&txn, class_activity_id).await?;
    if participants >= u64::try_from(class.capacity).unwrap_or(0) {
        info!(participants, capacity = class.capacity, "Class is full");
        return Err(Error::CapacityExceeded {
            class_activity_id,
            capacity: class.capacity,
        });
    }

    let now = Utc::now();
    let booking = class_booking::ActiveModel {
        user_id: Set(user_id),
        class_activity_id: Set(class_activity_id),
        status: Set(BookingStatus::Confirmed),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            Error::AlreadyBooked {
                user_id,
                class_activity_id,
            }
        } else {
            err.into()
        }
    })?;

    txn.commit().await?;

    info!(
        booking_id = booking.id,
        participants = participants + 1,
        capacity = class.capacity,
        "Class booking confirmed"
    );
    attach_one(db, booking).await
}

/// Cancels a class booking, freeing its seat.
///
/// Cancelling an already cancelled booking returns it unchanged.
///
/// # Errors
/// `BookingNotFound` if the id does not resolve.
#[instrument(skip(db))]
pub async fn cancel_class_booking(
    db: &DatabaseConnection,
    booking_id: i64,
) -> Result<ClassBookingDetails> {
    let booking = ClassBooking::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or(Error::BookingNotFound { id: booking_id })?;

    if booking.status == BookingStatus::Cancelled {
        debug!("Class booking already cancelled");
        return attach_one(db, booking).await;
    }

    let mut active: class_booking::ActiveModel = booking.into();
    active.status = Set(BookingStatus::Cancelled);
    active.updated_at = Set(Utc::now());
    let booking = active.update(db).await?;

    info!(
        class_activity_id = booking.class_activity_id,
        user_id = booking.user_id,
        "Class booking cancelled"
    );
    attach_one(db, booking).await
}

/// Returns the member's non-cancelled booking for a class.
///
/// # Errors
/// `NotFound` when the member holds no active booking for the class.
pub async fn get_user_class_booking(
    db: &DatabaseConnection,
    user_id: i64,
    class_activity_id: i64,
) -> Result<ClassBookingDetails> {
    let booking = find_active_booking(db, user_id, class_activity_id)
        .await?
        .ok_or_else(|| {
            Error::not_found(
                "class booking",
                format!("user {user_id}, class {class_activity_id}"),
            )
        })?;
    attach_one(db, booking).await
}

/// Lists all non-cancelled class bookings of a member, oldest first.
pub async fn get_user_class_bookings(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<ClassBookingDetails>> {
    let bookings = ClassBooking::find()
        .filter(class_booking::Column::UserId.eq(user_id))
        .filter(class_booking::Column::Status.ne(BookingStatus::Cancelled))
        .order_by_asc(class_booking::Column::Id)
        .all(db)
        .await?;
    attach_all(db, bookings).await
}

async fn attach_one(
    db: &DatabaseConnection,
    booking: class_booking::Model,
) -> Result<ClassBookingDetails> {
    let user = User::find_by_id(booking.user_id).one(db).await?;
    let class_activity = ClassActivity::find_by_id(booking.class_activity_id)
        .one(db)
        .await?;
    Ok(ClassBookingDetails {
        booking,
        user,
        class_activity,
    })
}

async fn attach_all(
    db: &DatabaseConnection,
    bookings: Vec<class_booking::Model>,
) -> Result<Vec<ClassBookingDetails>> {
    let users = load_users(db, bookings.iter().map(|b| b.user_id)).await?;
    let classes = load_class_activities(db, bookings.iter().map(|b| b.class_activity_id)).await?;

    Ok(bookings
        .into_iter()
        .map(|booking| ClassBookingDetails {
            user: users.get(&booking.user_id).cloned(),
            class_activity: classes.get(&booking.class_activity_id).cloned(),
            booking,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]
    use super::*;
    use crate::test_utils::*;
    use std::sync::Arc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_class_booking_validation() -> Result<()> {
        // Validation must fail before the mock is asked for anything
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_class_booking(&db, 0, 1).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidInput { message: _ }));

        let result = create_class_booking(&db, 1, 0).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidInput { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_class_booking_integration() -> Result<()> {
        let (db, class) = setup_with_class(10).await?;
        let alice = create_test_user(&db, "alice@example.com").await?;

        let details = create_class_booking(&db, alice.id, class.id).await?;

        assert_eq!(details.booking.user_id, alice.id);
        assert_eq!(details.booking.class_activity_id, class.id);
        assert_eq!(details.booking.status, BookingStatus::Confirmed);
        assert_eq!(details.user, Some(alice));
        assert_eq!(details.class_activity.map(|c| c.id), Some(class.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_fill_then_reject_then_rebook() -> Result<()> {
        let (db, class) = setup_with_class(2).await?;
        let a = create_test_user(&db, "a@example.com").await?;
        let b = create_test_user(&db, "b@example.com").await?;
        let c = create_test_user(&db, "c@example.com").await?;

        let a_booking = create_class_booking(&db, a.id, class.id).await?;
        assert_eq!(count_active_bookings(&db, class.id).await?, 1);
        create_class_booking(&db, b.id, class.id).await?;
        assert_eq!(count_active_bookings(&db, class.id).await?, 2);

        let result = create_class_booking(&db, c.id, class.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::CapacityExceeded {
                capacity: 2,
                class_activity_id: _
            }
        ));

        cancel_class_booking(&db, a_booking.booking.id).await?;
        create_class_booking(&db, c.id, class.id).await?;
        assert_eq!(count_active_bookings(&db, class.id).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_booking_rejected() -> Result<()> {
        let (db, class) = setup_with_class(5).await?;
        let alice = create_test_user(&db, "alice@example.com").await?;

        create_class_booking(&db, alice.id, class.id).await?;
        let result = create_class_booking(&db, alice.id, class.id).await;

        let err = result.unwrap_err();
        assert!(matches!(err, Error::AlreadyBooked { .. }));
        assert_eq!(err.code(), "ALREADY_BOOKED");
        assert_eq!(count_active_bookings(&db, class.id).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_rebook_after_cancel_allowed() -> Result<()> {
        let (db, class) = setup_with_class(5).await?;
        let alice = create_test_user(&db, "alice@example.com").await?;

        let first = create_class_booking(&db, alice.id, class.id).await?;
        cancel_class_booking(&db, first.booking.id).await?;
        let second = create_class_booking(&db, alice.id, class.id).await?;

        assert_ne!(first.booking.id, second.booking.id);
        assert_eq!(
            get_user_class_booking(&db, alice.id, class.id).await?.booking.id,
            second.booking.id
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_create_class_booking_class_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice@example.com").await?;

        let result = create_class_booking(&db, alice.id, 999).await;
        assert!(matches!(result.unwrap_err(), Error::ClassNotFound { id: 999 }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_class_booking_unknown_member() -> Result<()> {
        let (db, class) = setup_with_class(5).await?;

        let err = create_class_booking(&db, 404, class.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "user", .. }));
        assert_eq!(err.kind(), crate::errors::ErrorKind::NotFound);
        assert_eq!(count_active_bookings(&db, class.id).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() -> Result<()> {
        let (db, class) = setup_with_class(5).await?;
        let alice = create_test_user(&db, "alice@example.com").await?;
        let booking = create_class_booking(&db, alice.id, class.id).await?;

        let first = cancel_class_booking(&db, booking.booking.id).await?;
        let second = cancel_class_booking(&db, booking.booking.id).await?;

        assert_eq!(first.booking.status, BookingStatus::Cancelled);
        assert_eq!(first.booking, second.booking);
        assert_eq!(count_active_bookings(&db, class.id).await?, 0);

        // The row is kept
        assert!(ClassBooking::find_by_id(booking.booking.id).one(&db).await?.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_unknown_booking() -> Result<()> {
        let db = setup_test_db().await?;
        let result = cancel_class_booking(&db, 404).await;
        assert!(matches!(result.unwrap_err(), Error::BookingNotFound { id: 404 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_user_class_booking_not_found() -> Result<()> {
        let (db, class) = setup_with_class(5).await?;
        let alice = create_test_user(&db, "alice@example.com").await?;

        let result = get_user_class_booking(&db, alice.id, class.id).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { entity: "class booking", key: _ }));

        let booking = create_class_booking(&db, alice.id, class.id).await?;
        cancel_class_booking(&db, booking.booking.id).await?;
        let result = get_user_class_booking(&db, alice.id, class.id).await;
        assert!(result.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_get_user_class_bookings_excludes_cancelled() -> Result<()> {
        let db = setup_test_db().await?;
        let yoga = create_test_class(&db, "Yoga", 5).await?;
        let spin = create_test_class(&db, "Spin", 5).await?;
        let pilates = create_test_class(&db, "Pilates", 5).await?;
        let alice = create_test_user(&db, "alice@example.com").await?;
        let bob = create_test_user(&db, "bob@example.com").await?;

        create_class_booking(&db, alice.id, yoga.id).await?;
        let spin_booking = create_class_booking(&db, alice.id, spin.id).await?;
        create_class_booking(&db, alice.id, pilates.id).await?;
        create_class_booking(&db, bob.id, yoga.id).await?;
        cancel_class_booking(&db, spin_booking.booking.id).await?;

        let bookings = get_user_class_bookings(&db, alice.id).await?;
        let classes: Vec<i64> = bookings.iter().map(|b| b.booking.class_activity_id).collect();
        assert_eq!(classes, vec![yoga.id, pilates.id]);
        assert!(bookings.iter().all(|b| b.user.as_ref().map(|u| u.id) == Some(alice.id)));
        assert!(bookings.iter().all(|b| b.class_activity.is_some()));

        assert!(get_user_class_bookings(&db, 999).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_store_rejects_second_active_seat() -> Result<()> {
        let (db, class) = setup_with_class(5).await?;
        let alice = create_test_user(&db, "alice@example.com").await?;
        create_class_booking(&db, alice.id, class.id).await?;

        // Bypass the manager: the partial unique index still holds
        let now = Utc::now();
        let result = class_booking::ActiveModel {
            user_id: Set(alice.id),
            class_activity_id: Set(class.id),
            status: Set(BookingStatus::Confirmed),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(is_unique_violation(&result.unwrap_err()));

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admissions_never_exceed_capacity() -> Result<()> {
        let (db, path) = setup_file_db("class-capacity").await?;
        let class = create_test_class(&db, "HIIT", 3).await?;
        let mut user_ids = Vec::new();
        for i in 0..12 {
            user_ids.push(create_test_user(&db, &format!("member{i}@example.com")).await?.id);
        }

        let handles: Vec<_> = user_ids
            .iter()
            .map(|&user_id| {
                let db = Arc::clone(&db);
                let class_id = class.id;
                tokio::spawn(async move { create_class_booking(&db, user_id, class_id).await })
            })
            .collect();

        let mut confirmed = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => confirmed += 1,
                Err(Error::CapacityExceeded { .. }) => full += 1,
                Err(other) => panic!("unexpected admission error: {other}"),
            }
        }

        assert_eq!(confirmed, 3);
        assert_eq!(full, 9);
        assert_eq!(count_active_bookings(&*db, class.id).await?, 3);

        cleanup_file_db(db, &path).await
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicates_admit_one() -> Result<()> {
        let (db, path) = setup_file_db("class-duplicates").await?;
        let class = create_test_class(&db, "Boxing", 10).await?;
        let alice = create_test_user(&db, "alice@example.com").await?;

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let db = Arc::clone(&db);
                let (user_id, class_id) = (alice.id, class.id);
                tokio::spawn(async move { create_class_booking(&db, user_id, class_id).await })
            })
            .collect();

        let mut confirmed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => confirmed += 1,
                Err(Error::AlreadyBooked { .. }) => {}
                Err(other) => panic!("unexpected admission error: {other}"),
            }
        }

        assert_eq!(confirmed, 1);
        assert_eq!(get_user_class_bookings(&db, alice.id).await?.len(), 1);

        cleanup_file_db(db, &path).await
    }
}
