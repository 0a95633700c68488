//! Shared test utilities for the booking core.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::database,
    core::{
        class_activity::{self, NewClassActivity},
        schedule, trainer, user,
    },
    entities,
    errors::{Error, Result},
};
use chrono::{NaiveDate, NaiveTime};
use sea_orm::DatabaseConnection;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed database with a connection pool, for tests that run
/// admissions from several tasks at once.
///
/// The handle is shared so each task can hold its own `Arc`. Returns it with the
/// file path to hand to [`cleanup_file_db`].
pub async fn setup_file_db(name: &str) -> Result<(Arc<DatabaseConnection>, PathBuf)> {
    let path = std::env::temp_dir().join(format!(
        "fitclub-{name}-{}.sqlite",
        std::process::id()
    ));
    remove_db_files(&path)?;

    let url = format!("sqlite://{}?mode=rwc", path.display());
    let db = database::connect_with_pool(&url, 4).await?;
    database::create_tables(&db).await?;
    Ok((Arc::new(db), path))
}

/// Closes a database created by [`setup_file_db`] and removes its files.
///
/// Every task holding a clone of the handle must have finished.
pub async fn cleanup_file_db(db: Arc<DatabaseConnection>, path: &Path) -> Result<()> {
    let db = Arc::try_unwrap(db).map_err(|_| Error::invalid("database handle is still shared"))?;
    db.close().await?;
    remove_db_files(path)
}

fn remove_db_files(path: &Path) -> Result<()> {
    for suffix in ["", "-wal", "-shm", "-journal"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        match std::fs::remove_file(&file) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
    }
    Ok(())
}

/// The day every test class and slot runs on.
pub fn test_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 2).unwrap_or_default()
}

/// A whole hour as a time of day.
pub fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap_or_default()
}

/// Creates a test member.
///
/// # Defaults
/// * `first_name`: "Test"
/// * `last_name`: "Member"
pub async fn create_test_user(db: &DatabaseConnection, email: &str) -> Result<entities::user::Model> {
    user::create_user(
        db,
        "Test".to_string(),
        "Member".to_string(),
        email.to_string(),
    )
    .await
}

/// Creates a test trainer.
///
/// # Defaults
/// * `first_name`: "Test"
/// * `last_name`: "Trainer"
/// * `skill`: "Strength"
pub async fn create_test_trainer(
    db: &DatabaseConnection,
    email: &str,
) -> Result<entities::trainer::Model> {
    trainer::create_trainer(
        db,
        "Test".to_string(),
        "Trainer".to_string(),
        email.to_string(),
        "Strength".to_string(),
    )
    .await
}

/// Class input running 09:00-10:00 on [`test_day`] in "Studio A".
pub fn test_class_input(name: &str, capacity: i32) -> NewClassActivity {
    NewClassActivity {
        name: name.to_string(),
        description: format!("{name} class"),
        date: test_day(),
        start_time: hour(9),
        end_time: hour(10),
        location: "Studio A".to_string(),
        capacity,
        image_url: None,
    }
}

/// Creates a test class from [`test_class_input`].
pub async fn create_test_class(
    db: &DatabaseConnection,
    name: &str,
    capacity: i32,
) -> Result<entities::class_activity::Model> {
    class_activity::create_class_activity(db, test_class_input(name, capacity)).await
}

/// Sets up a test environment with one class of the given capacity.
/// Returns (db, class).
pub async fn setup_with_class(
    capacity: i32,
) -> Result<(DatabaseConnection, entities::class_activity::Model)> {
    let db = setup_test_db().await?;
    let class = create_test_class(&db, "Test Class", capacity).await?;
    Ok((db, class))
}

/// Sets up a test environment with a trainer and one 09:00-10:00 slot on
/// [`test_day`]. Returns (db, trainer, schedule).
pub async fn setup_with_schedule() -> Result<(
    DatabaseConnection,
    entities::trainer::Model,
    entities::trainer_schedule::Model,
)> {
    let db = setup_test_db().await?;
    let trainer = create_test_trainer(&db, "coach@example.com").await?;
    let slot = schedule::create_schedule(&db, trainer.id, test_day(), hour(9), hour(10)).await?;
    Ok((db, trainer, slot))
}
