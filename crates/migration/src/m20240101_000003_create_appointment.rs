//! Create `appointment` table with FK to `customer`.
//!
//! `assigned_to` is the owning staff member; it is not a FK because users
//! live in the identity service.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Appointment::Table)
                    .if_not_exists()
                    .col(pk_auto(Appointment::Id))
                    .col(integer(Appointment::CustomerId).not_null())
                    .col(integer_null(Appointment::AssignedTo))
                    .col(string_len(Appointment::Title, 200).not_null())
                    .col(text_null(Appointment::Description))
                    .col(string_len_null(Appointment::Location, 200))
                    .col(timestamp_with_time_zone(Appointment::ScheduledAt).not_null())
                    .col(integer(Appointment::DurationMinutes).not_null())
                    .col(string_len(Appointment::Status, 32).not_null())
                    .col(timestamp_with_time_zone(Appointment::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Appointment::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_appointment_customer")
                            .from(Appointment::Table, Appointment::CustomerId)
                            .to(Customer::Table, Customer::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Appointment::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Appointment {
    Table,
    Id,
    CustomerId,
    AssignedTo,
    Title,
    Description,
    Location,
    ScheduledAt,
    DurationMinutes,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Customer { Table, Id }
