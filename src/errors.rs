//! Unified error type for the booking core.
//!
//! Every failure carries a stable machine-readable [`Error::code`] and a broad
//! [`ErrorKind`], so callers can render "class full" differently from "bad request"
//! without matching on message text.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Broad category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, rejected before the store is touched
    Validation,
    /// A business rule rejected the request (duplicate, full, taken)
    Conflict,
    /// A referenced entity does not exist
    NotFound,
    /// The store failed; partial effects were rolled back
    Persistence,
    /// Startup configuration could not be loaded
    Configuration,
}

/// All errors produced by the booking core and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// A required identifier was zero or another field failed validation
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input
        message: String,
    },

    /// A date string was not in `YYYY-MM-DD` form
    #[error("Invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input
        value: String,
    },

    /// The user already holds a non-cancelled booking for the class
    #[error("User {user_id} already has an active booking for class {class_activity_id}")]
    AlreadyBooked {
        /// Booking user
        user_id: i64,
        /// Target class
        class_activity_id: i64,
    },

    /// Every seat of the class is taken by a non-cancelled booking
    #[error("Class {class_activity_id} is full ({capacity} participants)")]
    CapacityExceeded {
        /// Target class
        class_activity_id: i64,
        /// Configured capacity of the class
        capacity: i32,
    },

    /// The trainer schedule slot already has an active booking
    #[error("Schedule {schedule_id} is already booked")]
    SlotAlreadyTaken {
        /// Requested slot
        schedule_id: i64,
    },

    /// The class activity does not exist
    #[error("Class activity not found: {id}")]
    ClassNotFound {
        /// Requested class id
        id: i64,
    },

    /// The booking id never existed (or is not visible)
    #[error("Booking not found: {id}")]
    BookingNotFound {
        /// Requested booking id
        id: i64,
    },

    /// Any other missing entity
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity name, e.g. `"trainer"`
        entity: &'static str,
        /// Lookup key rendered for display
        key: String,
    },

    /// A transactional booking write failed and was rolled back
    #[error("Booking failed: {reason}")]
    BookingFailed {
        /// Underlying cause
        reason: String,
    },

    /// Store failure outside of the transactional booking paths
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// I/O failure while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the broad category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } | Self::InvalidDate { .. } => ErrorKind::Validation,
            Self::AlreadyBooked { .. }
            | Self::CapacityExceeded { .. }
            | Self::SlotAlreadyTaken { .. } => ErrorKind::Conflict,
            Self::ClassNotFound { .. } | Self::BookingNotFound { .. } | Self::NotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::BookingFailed { .. } | Self::Database(_) => ErrorKind::Persistence,
            Self::Config { .. } | Self::Io(_) => ErrorKind::Configuration,
        }
    }

    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::InvalidDate { .. } => "INVALID_DATE",
            Self::AlreadyBooked { .. } => "ALREADY_BOOKED",
            Self::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            Self::SlotAlreadyTaken { .. } => "SLOT_ALREADY_TAKEN",
            Self::ClassNotFound { .. } => "CLASS_NOT_FOUND",
            Self::BookingNotFound { .. } => "BOOKING_NOT_FOUND",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::BookingFailed { .. } => "BOOKING_FAILED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Shorthand for [`Error::InvalidInput`].
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::NotFound`].
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// True when the store rejected a write because of a unique index.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
