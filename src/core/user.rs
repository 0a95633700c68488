//! Member records used by booking responses.
//!
//! Account management belongs to the identity collaborator; this module only
//! creates and loads the rows the booking managers attach.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use std::collections::HashMap;

/// Creates a member. The email must be non-empty and is stored trimmed.
pub async fn create_user(
    db: &DatabaseConnection,
    first_name: String,
    last_name: String,
    email: String,
) -> Result<user::Model> {
    let email = email.trim().to_string();
    if email.is_empty() {
        return Err(Error::invalid("User email cannot be empty"));
    }

    let now = chrono::Utc::now();
    let user = user::ActiveModel {
        first_name: Set(first_name.trim().to_string()),
        last_name: Set(last_name.trim().to_string()),
        email: Set(email),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    user.insert(db).await.map_err(Into::into)
}

/// Retrieves a member by id.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Loads the given members in one query, keyed by id.
pub(crate) async fn load_users<C, I>(conn: &C, ids: I) -> Result<HashMap<i64, user::Model>>
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

    let users = User::find()
        .filter(user::Column::Id.is_in(ids))
        .all(conn)
        .await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}
