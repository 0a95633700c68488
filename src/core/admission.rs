//! Shared pieces of the two admission paths.
//!
//! Both booking managers follow the same shape: validate ids, open a transaction,
//! take the store's write lock by touching the capacity authority row, then
//! check-and-insert. In `SQLite` the first write of a transaction acquires the
//! database write lock, so every check that follows sees all earlier committed
//! admissions and no other admission can commit in between.

use crate::errors::{Error, Result};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    sea_query::{Expr, SimpleExpr},
};

/// Rejects zero or negative identifiers before any store access.
pub(crate) fn require_id(field: &str, id: i64) -> Result<()> {
    if id <= 0 {
        return Err(Error::invalid(format!("{field} must be a positive id, got {id}")));
    }
    Ok(())
}

/// Takes the write lock by rewriting `touched` with its own value on row `id`.
///
/// Must be the first statement of the admission transaction. Returns whether the
/// row exists.
pub(crate) async fn lock_row<E, C>(
    conn: &C,
    id_column: E::Column,
    touched: E::Column,
    id: i64,
) -> std::result::Result<bool, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let result = E::update_many()
        .col_expr(touched, SimpleExpr::from(Expr::col(touched)))
        .filter(id_column.eq(id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Wraps a store error raised inside a transactional booking write.
pub(crate) fn booking_failed(step: &'static str) -> impl FnOnce(DbErr) -> Error {
    move |err| Error::BookingFailed {
        reason: format!("{step}: {err}"),
    }
}
