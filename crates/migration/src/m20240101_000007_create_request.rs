//! Create `request` table with FKs to `customer` and, once converted, to the
//! resulting `appointment`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Request::Table)
                    .if_not_exists()
                    .col(pk_auto(Request::Id))
                    .col(integer(Request::CustomerId).not_null())
                    .col(integer_null(Request::AssignedTo))
                    .col(string_len(Request::Subject, 200).not_null())
                    .col(text(Request::Description).not_null())
                    .col(string_len(Request::Priority, 16).not_null())
                    .col(string_len_null(Request::Category, 100))
                    .col(integer_null(Request::AppointmentId))
                    .col(string_len(Request::Status, 32).not_null())
                    .col(timestamp_with_time_zone(Request::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Request::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_customer")
                            .from(Request::Table, Request::CustomerId)
                            .to(Customer::Table, Customer::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_appointment")
                            .from(Request::Table, Request::AppointmentId)
                            .to(Appointment::Table, Appointment::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Request::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Request {
    Table,
    Id,
    CustomerId,
    AssignedTo,
    Subject,
    Description,
    Priority,
    Category,
    AppointmentId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Customer { Table, Id }

#[derive(DeriveIden)]
enum Appointment { Table, Id }
