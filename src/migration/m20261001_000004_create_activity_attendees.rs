//! Migration: Create activity_attendees join table.
//!
//! Many-to-many between activities and users; rows go away with either side.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActivityAttendees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityAttendees::ActivityId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ActivityAttendees::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(ActivityAttendees::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_activity_attendees")
                            .col(ActivityAttendees::ActivityId)
                            .col(ActivityAttendees::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_attendees_activity")
                            .from(ActivityAttendees::Table, ActivityAttendees::ActivityId)
                            .to(Activities::Table, Activities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_attendees_user")
                            .from(ActivityAttendees::Table, ActivityAttendees::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activity_attendees_user")
                    .table(ActivityAttendees::Table)
                    .col(ActivityAttendees::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(ActivityAttendees::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum ActivityAttendees {
    Table,
    ActivityId,
    UserId,
    JoinedAt,
}

#[derive(DeriveIden)]
enum Activities {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
