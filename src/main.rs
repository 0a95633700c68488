use chrono::Utc;
use dotenvy::dotenv;
use fitclub_booking::{
    config::{catalog, database},
    core::{class_activity, schedule, trainer},
    errors::Result,
};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Creates the parent directory of a file-backed `SQLite` URL.
fn ensure_database_dir(url: &str) -> Result<()> {
    let Some(rest) = url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Open the database and make sure the schema exists
    ensure_database_dir(&database::get_database_url())?;
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Seed the catalog when a config file is present
    let config_path = catalog::config_path();
    if Path::new(&config_path).exists() {
        let config = catalog::load_config(&config_path)?;
        catalog::seed_catalog(&db, &config)
            .await
            .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
    } else {
        warn!("No catalog file at {}, skipping seeding.", config_path);
    }

    // 5. Report current occupancy
    for view in class_activity::list_class_activities(&db).await? {
        info!(
            "{} on {} at {}: {}/{} booked",
            view.class.name,
            view.class.date,
            view.class.start_time,
            view.current_participants,
            view.class.capacity
        );
    }

    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    for coach in trainer::list_trainers(&db).await? {
        for slot in schedule::get_schedules_by_date(&db, coach.id, &today).await? {
            info!(
                "{} {} {}-{}: {:?}",
                coach.first_name,
                coach.last_name,
                slot.schedule.start_time.format("%H:%M"),
                slot.schedule.end_time.format("%H:%M"),
                slot.status()
            );
        }
    }

    db.close().await?;
    Ok(())
}
