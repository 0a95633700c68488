//! Catalog configuration loading from config.toml
//!
//! Trainers, their schedule slots and the class timetable are declared in a TOML
//! file and seeded into the database at startup. Seeding only inserts what is
//! missing, so it is safe to run on every start.

use crate::{
    core::{
        class_activity::{self, NewClassActivity},
        schedule, trainer,
    },
    entities::{TrainerSchedule, trainer_schedule},
    errors::{Error, Result},
};
use chrono::{NaiveDate, NaiveTime};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming the catalog file
pub const CONFIG_PATH_ENV: &str = "FITCLUB_CONFIG";
/// Catalog file used when [`CONFIG_PATH_ENV`] is unset
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct CatalogConfig {
    /// Trainers to seed, each with its slots
    #[serde(default)]
    pub trainers: Vec<TrainerConfig>,
    /// Classes to seed
    #[serde(default)]
    pub classes: Vec<ClassConfig>,
}

/// Configuration for a single trainer
#[derive(Debug, Deserialize, Clone)]
pub struct TrainerConfig {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Unique email; identifies the trainer across runs
    pub email: String,
    /// Speciality shown to members
    pub skill: String,
    /// Bookable slots
    #[serde(default)]
    pub schedules: Vec<ScheduleConfig>,
}

/// A bookable slot, with `YYYY-MM-DD` date and `HH:MM` times
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    /// Day of the slot
    pub date: String,
    /// Slot start
    pub start_time: String,
    /// Slot end
    pub end_time: String,
}

/// Configuration for a single class
#[derive(Debug, Deserialize, Clone)]
pub struct ClassConfig {
    /// Display name; with `date` identifies the class across runs
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub start_time: String,
    /// `HH:MM`
    pub end_time: String,
    /// Room or area
    pub location: String,
    /// Seat count
    pub capacity: i32,
    /// Optional cover image path
    pub image_url: Option<String>,
}

/// What a seeding run inserted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Trainers inserted
    pub trainers: usize,
    /// Schedule slots inserted
    pub schedules: usize,
    /// Classes inserted
    pub classes: usize,
}

/// Loads catalog configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog config: {e}"),
    })
}

/// Path of the catalog file: `FITCLUB_CONFIG` or `./config.toml`
#[must_use]
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

/// Loads catalog configuration from [`config_path`]
pub fn load_default_config() -> Result<CatalogConfig> {
    load_config(config_path())
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| Error::Config {
        message: format!("Invalid date '{value}': {e}"),
    })
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|e| Error::Config {
            message: format!("Invalid time '{value}': {e}"),
        })
}

impl ClassConfig {
    fn to_new_class(&self) -> Result<NewClassActivity> {
        if self.capacity < 1 {
            return Err(Error::Config {
                message: format!("Class '{}' must have a positive capacity", self.name),
            });
        }
        Ok(NewClassActivity {
            name: self.name.clone(),
            description: self.description.clone(),
            date: parse_date(&self.date)?,
            start_time: parse_time(&self.start_time)?,
            end_time: parse_time(&self.end_time)?,
            location: self.location.clone(),
            capacity: self.capacity,
            image_url: self.image_url.clone(),
        })
    }
}

/// Inserts the trainers, slots and classes from `config` that are not stored yet.
pub async fn seed_catalog(db: &DatabaseConnection, config: &CatalogConfig) -> Result<SeedSummary> {
    info!(
        "Seeding catalog: {} trainers, {} classes in config",
        config.trainers.len(),
        config.classes.len()
    );
    let mut summary = SeedSummary::default();

    for cfg in &config.trainers {
        let trainer = if let Some(existing) = trainer::get_trainer_by_email(db, &cfg.email).await? {
            debug!("Trainer '{}' already exists. Skipping.", cfg.email);
            existing
        } else {
            summary.trainers += 1;
            trainer::create_trainer(
                db,
                cfg.first_name.clone(),
                cfg.last_name.clone(),
                cfg.email.clone(),
                cfg.skill.clone(),
            )
            .await?
        };

        for slot in &cfg.schedules {
            let date = parse_date(&slot.date)?;
            let start = parse_time(&slot.start_time)?;
            let end = parse_time(&slot.end_time)?;

            let exists = TrainerSchedule::find()
                .filter(trainer_schedule::Column::TrainerId.eq(trainer.id))
                .filter(trainer_schedule::Column::AvailableDate.eq(date))
                .filter(trainer_schedule::Column::StartTime.eq(date.and_time(start).and_utc()))
                .one(db)
                .await?
                .is_some();
            if exists {
                continue;
            }
            schedule::create_schedule(db, trainer.id, date, start, end).await?;
            summary.schedules += 1;
        }
    }

    for cfg in &config.classes {
        let new_class = cfg.to_new_class()?;
        if class_activity::find_class_activity(db, &new_class.name, new_class.date)
            .await?
            .is_some()
        {
            debug!("Class '{}' on {} already exists. Skipping.", cfg.name, cfg.date);
            continue;
        }
        class_activity::create_class_activity(db, new_class).await?;
        summary.classes += 1;
    }

    info!(?summary, "Catalog seeding finished");
    Ok(summary)
}
