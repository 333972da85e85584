//! SeaORM database migrations.
//!
//! Schema is expressed with the backend-agnostic builders so the same
//! migrations run on PostgreSQL and SQLite.

pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_users;
mod m20261001_000002_create_categories;
mod m20261001_000003_create_activities;
mod m20261001_000004_create_activity_attendees;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_users::Migration),
            Box::new(m20261001_000002_create_categories::Migration),
            Box::new(m20261001_000003_create_activities::Migration),
            Box::new(m20261001_000004_create_activity_attendees::Migration),
        ]
    }
}
