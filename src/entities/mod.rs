//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod class_activity;
pub mod class_booking;
pub mod review;
pub mod status;
pub mod train_booking;
pub mod trainer;
pub mod trainer_schedule;
pub mod user;

// Re-export specific types to avoid conflicts
pub use class_activity::{
    Column as ClassActivityColumn, Entity as ClassActivity, Model as ClassActivityModel,
};
pub use class_booking::{
    Column as ClassBookingColumn, Entity as ClassBooking, Model as ClassBookingModel,
};
pub use review::{Column as ReviewColumn, Entity as Review, Model as ReviewModel};
pub use status::{BookingStatus, ReviewableType, ScheduleStatus};
pub use train_booking::{
    Column as TrainBookingColumn, Entity as TrainBooking, Model as TrainBookingModel,
};
pub use trainer::{Column as TrainerColumn, Entity as Trainer, Model as TrainerModel};
pub use trainer_schedule::{
    Column as TrainerScheduleColumn, Entity as TrainerSchedule, Model as TrainerScheduleModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
