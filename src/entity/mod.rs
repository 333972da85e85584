//! SeaORM entity definitions.

pub mod activity;
pub mod activity_attendee;
pub mod category;
pub mod user;
