//! Database configuration module.
//!
//! This module handles `SQLite` connection setup and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, then the partial unique indexes that back the
//! booking invariants are added with raw statements, since `SeaORM` has no way to
//! express a filtered index on an entity.

use crate::entities::{
    ClassActivity, ClassBooking, Review, TrainBooking, Trainer, TrainerSchedule, User,
};
use crate::errors::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/fitclub.sqlite?mode=rwc";

/// At most one non-cancelled booking per (user, class).
const CLASS_BOOKING_ACTIVE_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
     idx_class_bookings_active_seat ON class_bookings (user_id, class_activity_id) \
     WHERE status <> 'Cancelled'";

/// At most one live booking per trainer slot.
const TRAIN_BOOKING_ACTIVE_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
     idx_train_bookings_active_slot ON train_bookings (schedule_id) \
     WHERE deleted_at IS NULL AND booking_status <> 'Cancelled'";

const REVIEW_TARGET_INDEX: &str = "CREATE INDEX IF NOT EXISTS \
     idx_reviews_target ON reviews (reviewable_type, reviewable_id)";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back
/// to a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    info!(url = %database_url, "Connecting to database");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Connects with an explicit pool size.
///
/// File-backed databases can use several connections; every admission path takes
/// the `SQLite` write lock first, so concurrent bookings serialize in the store.
pub async fn connect_with_pool(url: &str, max_connections: u32) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url);
    options.max_connections(max_connections).sqlx_logging(false);
    Database::connect(options).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables and indexes. Safe to run against an existing database.
///
/// Tables are created parents first so foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Trainer).await?;
    create_table(db, &schema, ClassActivity).await?;
    create_table(db, &schema, ClassBooking).await?;
    create_table(db, &schema, TrainerSchedule).await?;
    create_table(db, &schema, TrainBooking).await?;
    create_table(db, &schema, Review).await?;

    for statement in [
        CLASS_BOOKING_ACTIVE_INDEX,
        TRAIN_BOOKING_ACTIVE_INDEX,
        REVIEW_TARGET_INDEX,
    ] {
        db.execute_unprepared(statement).await?;
    }

    debug!("Schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        class_activity::Model as ClassActivityModel, class_booking::Model as ClassBookingModel,
        train_booking::Model as TrainBookingModel,
    };
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<ClassActivityModel> = ClassActivity::find().limit(1).all(&db).await?;
        let _: Vec<ClassBookingModel> = ClassBooking::find().limit(1).all(&db).await?;
        let _: Vec<TrainBookingModel> = TrainBooking::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
