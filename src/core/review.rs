//! Rating Aggregator - reviews of classes and trainers.
//!
//! Every write recomputes the target's `average_rating` and `review_count` from
//! the review rows inside the same transaction, so the stored aggregate always
//! matches the reviews that exist.

use crate::{
    core::admission,
    entities::{ClassActivity, Review, ReviewableType, Trainer, class_activity, review, trainer},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument};

/// What a review is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewTarget {
    /// A class activity, by id
    Class(i64),
    /// A trainer, by id
    Trainer(i64),
}

impl ReviewTarget {
    const fn parts(self) -> (ReviewableType, i64) {
        match self {
            Self::Class(id) => (ReviewableType::Classes, id),
            Self::Trainer(id) => (ReviewableType::Trainers, id),
        }
    }

    const fn from_parts(kind: ReviewableType, id: i64) -> Self {
        match kind {
            ReviewableType::Classes => Self::Class(id),
            ReviewableType::Trainers => Self::Trainer(id),
        }
    }

    /// Target of a stored review row.
    #[must_use]
    pub const fn of(review: &review::Model) -> Self {
        Self::from_parts(review.reviewable_type, review.reviewable_id)
    }
}

/// Aggregate shown on a class or trainer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    /// Mean rating, `0.0` without reviews
    pub average_rating: f64,
    /// Number of reviews
    pub review_count: i32,
}

fn validate_rating(rating: i32) -> Result<()> {
    if !(1..=5).contains(&rating) {
        return Err(Error::invalid(format!(
            "Rating must be between 1 and 5, got {rating}"
        )));
    }
    Ok(())
}

async fn ensure_target_exists<C>(conn: &C, target: ReviewTarget) -> Result<()>
where
    C: ConnectionTrait,
{
    match target {
        ReviewTarget::Class(id) => {
            if ClassActivity::find_by_id(id).one(conn).await?.is_none() {
                return Err(Error::ClassNotFound { id });
            }
        }
        ReviewTarget::Trainer(id) => {
            if Trainer::find_by_id(id).one(conn).await?.is_none() {
                return Err(Error::not_found("trainer", id));
            }
        }
    }
    Ok(())
}

/// Recomputes and stores the aggregate of `target` from its review rows.
async fn refresh_rating<C>(conn: &C, target: ReviewTarget) -> Result<RatingSummary>
where
    C: ConnectionTrait,
{
    let (kind, id) = target.parts();
    let ratings: Vec<i32> = Review::find()
        .select_only()
        .column(review::Column::Rating)
        .filter(review::Column::ReviewableType.eq(kind))
        .filter(review::Column::ReviewableId.eq(id))
        .into_tuple::<i32>()
        .all(conn)
        .await?;

    let review_count = i32::try_from(ratings.len())
        .map_err(|_| Error::invalid("Too many reviews to aggregate"))?;
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / f64::from(review_count)
    };

    let now = Utc::now();
    match target {
        ReviewTarget::Class(_) => {
            ClassActivity::update_many()
                .col_expr(class_activity::Column::AverageRating, Expr::value(average_rating))
                .col_expr(class_activity::Column::ReviewCount, Expr::value(review_count))
                .col_expr(class_activity::Column::UpdatedAt, Expr::value(now))
                .filter(class_activity::Column::Id.eq(id))
                .exec(conn)
                .await?;
        }
        ReviewTarget::Trainer(_) => {
            Trainer::update_many()
                .col_expr(trainer::Column::AverageRating, Expr::value(average_rating))
                .col_expr(trainer::Column::ReviewCount, Expr::value(review_count))
                .col_expr(trainer::Column::UpdatedAt, Expr::value(now))
                .filter(trainer::Column::Id.eq(id))
                .exec(conn)
                .await?;
        }
    }

    Ok(RatingSummary {
        average_rating,
        review_count,
    })
}

/// Writes a review and refreshes the target's rating.
///
/// # Errors
/// - `InvalidInput` for a non-positive id or a rating outside `1..=5`
/// - `ClassNotFound` / `NotFound` if the target does not exist
#[instrument(skip(db, comment))]
pub async fn create_review(
    db: &DatabaseConnection,
    user_id: i64,
    target: ReviewTarget,
    rating: i32,
    comment: &str,
) -> Result<review::Model> {
    admission::require_id("user_id", user_id)?;
    let (kind, target_id) = target.parts();
    admission::require_id("reviewable_id", target_id)?;
    validate_rating(rating)?;

    let txn = db.begin().await?;
    ensure_target_exists(&txn, target).await?;

    let now = Utc::now();
    let review = review::ActiveModel {
        user_id: Set(user_id),
        rating: Set(rating),
        comment: Set(comment.trim().to_string()),
        reviewable_id: Set(target_id),
        reviewable_type: Set(kind),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let summary = refresh_rating(&txn, target).await?;
    txn.commit().await?;

    info!(
        review_id = review.id,
        average = summary.average_rating,
        count = summary.review_count,
        "Review created"
    );
    Ok(review)
}

/// Changes a review's rating and comment and refreshes the target's rating.
///
/// # Errors
/// - `InvalidInput` for a rating outside `1..=5`
/// - `NotFound` if the review does not exist
#[instrument(skip(db, comment))]
pub async fn update_review(
    db: &DatabaseConnection,
    review_id: i64,
    rating: i32,
    comment: &str,
) -> Result<review::Model> {
    validate_rating(rating)?;

    let txn = db.begin().await?;
    let existing = Review::find_by_id(review_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("review", review_id))?;
    let target = ReviewTarget::of(&existing);

    let mut active: review::ActiveModel = existing.into();
    active.rating = Set(rating);
    active.comment = Set(comment.trim().to_string());
    active.updated_at = Set(Utc::now());
    let review = active.update(&txn).await?;

    refresh_rating(&txn, target).await?;
    txn.commit().await?;

    Ok(review)
}

/// Deletes a review and refreshes the target's rating.
///
/// # Errors
/// `NotFound` if the review does not exist.
#[instrument(skip(db))]
pub async fn delete_review(db: &DatabaseConnection, review_id: i64) -> Result<RatingSummary> {
    let txn = db.begin().await?;
    let existing = Review::find_by_id(review_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("review", review_id))?;
    let target = ReviewTarget::of(&existing);

    Review::delete_by_id(review_id).exec(&txn).await?;
    let summary = refresh_rating(&txn, target).await?;
    txn.commit().await?;

    info!(count = summary.review_count, "Review deleted");
    Ok(summary)
}

/// Lists a target's reviews, newest first.
pub async fn get_reviews_for(
    db: &DatabaseConnection,
    target: ReviewTarget,
) -> Result<Vec<review::Model>> {
    let (kind, id) = target.parts();
    Review::find()
        .filter(review::Column::ReviewableType.eq(kind))
        .filter(review::Column::ReviewableId.eq(id))
        .order_by_desc(review::Column::CreatedAt)
        .order_by_desc(review::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
