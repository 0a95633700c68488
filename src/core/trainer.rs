//! Trainer records: the owners of bookable schedule slots.

use crate::{
    entities::{Trainer, trainer},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::HashMap;

/// Creates a trainer with no reviews yet.
pub async fn create_trainer(
    db: &DatabaseConnection,
    first_name: String,
    last_name: String,
    email: String,
    skill: String,
) -> Result<trainer::Model> {
    let email = email.trim().to_string();
    if email.is_empty() {
        return Err(Error::invalid("Trainer email cannot be empty"));
    }

    let now = chrono::Utc::now();
    let trainer = trainer::ActiveModel {
        first_name: Set(first_name.trim().to_string()),
        last_name: Set(last_name.trim().to_string()),
        email: Set(email),
        skill: Set(skill),
        average_rating: Set(0.0),
        review_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    trainer.insert(db).await.map_err(Into::into)
}

/// Retrieves a trainer by id.
pub async fn get_trainer_by_id(
    db: &DatabaseConnection,
    trainer_id: i64,
) -> Result<Option<trainer::Model>> {
    Trainer::find_by_id(trainer_id).one(db).await.map_err(Into::into)
}

/// Finds a trainer by email; used to keep catalog seeding idempotent.
pub async fn get_trainer_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<trainer::Model>> {
    Trainer::find()
        .filter(trainer::Column::Email.eq(email.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all trainers ordered by id.
pub async fn list_trainers(db: &DatabaseConnection) -> Result<Vec<trainer::Model>> {
    Trainer::find()
        .order_by_asc(trainer::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads the given trainers in one query, keyed by id.
pub(crate) async fn load_trainers<C, I>(conn: &C, ids: I) -> Result<HashMap<i64, trainer::Model>>
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

    let trainers = Trainer::find()
        .filter(trainer::Column::Id.is_in(ids))
        .all(conn)
        .await?;
    Ok(trainers.into_iter().map(|t| (t.id, t)).collect())
}
