/// Shared admission-transaction helpers
pub(crate) mod admission;
/// Class activities and their occupancy
pub mod class_activity;
/// Class Capacity Manager
pub mod class_booking;
/// Rating aggregator for classes and trainers
pub mod review;
/// Trainer schedule slots and the by-date availability view
pub mod schedule;
/// Trainer Slot Booking Manager
pub mod train_booking;
/// Trainer records
pub mod trainer;
/// Member records
pub mod user;
