//! Class activity records and their derived occupancy.
//!
//! `current_participants` is computed from non-cancelled bookings each time a class
//! is read. Nothing stores a running counter, so a failed or cancelled booking
//! can never leave the count out of step with the booking rows.

use crate::{
    core::{admission, class_booking::count_active_bookings},
    entities::{BookingStatus, ClassActivity, ClassBooking, class_activity, class_booking},
    errors::{Error, Result},
};
use chrono::{NaiveDate, NaiveTime};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};
use std::collections::HashMap;

/// Input for [`create_class_activity`].
#[derive(Debug, Clone)]
pub struct NewClassActivity {
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Day the class runs
    pub date: NaiveDate,
    /// Local start time
    pub start_time: NaiveTime,
    /// Local end time
    pub end_time: NaiveTime,
    /// Room or area
    pub location: String,
    /// Seat count; must be at least 1
    pub capacity: i32,
    /// Optional cover image path
    pub image_url: Option<String>,
}

/// A class together with its occupancy at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassActivityView {
    /// The stored class row
    pub class: class_activity::Model,
    /// Number of non-cancelled bookings
    pub current_participants: u64,
}

impl ClassActivityView {
    /// Seats still available; zero when full.
    #[must_use]
    pub fn remaining_seats(&self) -> u64 {
        u64::try_from(self.class.capacity)
            .unwrap_or(0)
            .saturating_sub(self.current_participants)
    }

    /// True when no seat is left.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.remaining_seats() == 0
    }
}

/// Creates a class activity after validating name, time range and capacity.
pub async fn create_class_activity(
    db: &DatabaseConnection,
    new_class: NewClassActivity,
) -> Result<class_activity::Model> {
    if new_class.name.trim().is_empty() {
        return Err(Error::invalid("Class name cannot be empty"));
    }
    if new_class.capacity < 1 {
        return Err(Error::invalid(format!(
            "Class capacity must be at least 1, got {}",
            new_class.capacity
        )));
    }
    if new_class.end_time <= new_class.start_time {
        return Err(Error::invalid("Class end time must be after its start time"));
    }

    let now = chrono::Utc::now();
    let class = class_activity::ActiveModel {
        name: Set(new_class.name.trim().to_string()),
        description: Set(new_class.description),
        date: Set(new_class.date),
        start_time: Set(new_class.start_time),
        end_time: Set(new_class.end_time),
        location: Set(new_class.location),
        capacity: Set(new_class.capacity),
        image_url: Set(new_class.image_url),
        average_rating: Set(0.0),
        review_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    class.insert(db).await.map_err(Into::into)
}

/// Retrieves a class with its current occupancy.
pub async fn get_class_activity(
    db: &DatabaseConnection,
    class_activity_id: i64,
) -> Result<ClassActivityView> {
    admission::require_id("class_activity_id", class_activity_id)?;

    let class = ClassActivity::find_by_id(class_activity_id)
        .one(db)
        .await?
        .ok_or(Error::ClassNotFound {
            id: class_activity_id,
        })?;
    let current_participants = count_active_bookings(db, class_activity_id).await?;

    Ok(ClassActivityView {
        class,
        current_participants,
    })
}

/// Finds a class by name on a given day; used to keep catalog seeding idempotent.
pub async fn find_class_activity(
    db: &DatabaseConnection,
    name: &str,
    date: NaiveDate,
) -> Result<Option<class_activity::Model>> {
    ClassActivity::find()
        .filter(class_activity::Column::Name.eq(name.trim()))
        .filter(class_activity::Column::Date.eq(date))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all classes by date and start time, each with its occupancy.
///
/// Occupancy for every class is fetched with a single grouped count.
pub async fn list_class_activities(db: &DatabaseConnection) -> Result<Vec<ClassActivityView>> {
    let classes = ClassActivity::find()
        .order_by_asc(class_activity::Column::Date)
        .order_by_asc(class_activity::Column::StartTime)
        .all(db)
        .await?;

    let counts: HashMap<i64, i64> = ClassBooking::find()
        .select_only()
        .column(class_booking::Column::ClassActivityId)
        .column_as(Expr::col(class_booking::Column::Id).count(), "participants")
        .filter(class_booking::Column::Status.ne(BookingStatus::Cancelled))
        .group_by(class_booking::Column::ClassActivityId)
        .into_tuple::<(i64, i64)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(classes
        .into_iter()
        .map(|class| {
            let current_participants = counts
                .get(&class.id)
                .and_then(|n| u64::try_from(*n).ok())
                .unwrap_or(0);
            ClassActivityView {
                class,
                current_participants,
            }
        })
        .collect())
}

/// Loads the given classes in one query, keyed by id.
pub(crate) async fn load_class_activities<C, I>(
    conn: &C,
    ids: I,
) -> Result<HashMap<i64, class_activity::Model>>
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

    let classes = ClassActivity::find()
        .filter(class_activity::Column::Id.is_in(ids))
        .all(conn)
        .await?;
    Ok(classes.into_iter().map(|c| (c.id, c)).collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::class_booking::{cancel_class_booking, create_class_booking};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_class_activity_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut input = test_class_input("Spin", 10);
        input.capacity = 0;
        let result = create_class_activity(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidInput { message: _ }));

        let input = test_class_input("   ", 10);
        let result = create_class_activity(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidInput { message: _ }));

        let mut input = test_class_input("Spin", 10);
        input.end_time = input.start_time;
        let result = create_class_activity(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidInput { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_class_activity_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_class_activity(&db, 999).await;
        assert!(matches!(result.unwrap_err(), Error::ClassNotFound { id: 999 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_participants_derived_from_bookings() -> Result<()> {
        let (db, class) = setup_with_class(3).await?;
        let alice = create_test_user(&db, "alice@example.com").await?;
        let bob = create_test_user(&db, "bob@example.com").await?;

        let view = get_class_activity(&db, class.id).await?;
        assert_eq!(view.current_participants, 0);
        assert_eq!(view.remaining_seats(), 3);

        let booking = create_class_booking(&db, alice.id, class.id).await?;
        create_class_booking(&db, bob.id, class.id).await?;
        assert_eq!(get_class_activity(&db, class.id).await?.current_participants, 2);

        cancel_class_booking(&db, booking.booking.id).await?;
        let view = get_class_activity(&db, class.id).await?;
        assert_eq!(view.current_participants, 1);
        assert!(!view.is_full());

        Ok(())
    }

    #[tokio::test]
    async fn test_list_class_activities_counts_per_class() -> Result<()> {
        let db = setup_test_db().await?;
        let yoga = create_test_class(&db, "Yoga", 1).await?;
        let spin = create_test_class(&db, "Spin", 5).await?;
        let alice = create_test_user(&db, "alice@example.com").await?;

        create_class_booking(&db, alice.id, yoga.id).await?;

        let views = list_class_activities(&db).await?;
        assert_eq!(views.len(), 2);
        let yoga_view = views.iter().find(|v| v.class.id == yoga.id).unwrap();
        let spin_view = views.iter().find(|v| v.class.id == spin.id).unwrap();
        assert_eq!(yoga_view.current_participants, 1);
        assert!(yoga_view.is_full());
        assert_eq!(spin_view.current_participants, 0);

        assert_eq!(
            find_class_activity(&db, "Yoga", test_day()).await?.map(|c| c.id),
            Some(yoga.id)
        );

        Ok(())
    }
}
