//! Create `customer` table.
//!
//! Root business entity; projects and appointments reference it.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customer::Table)
                    .if_not_exists()
                    .col(pk_auto(Customer::Id))
                    .col(string_len(Customer::Name, 200).not_null())
                    .col(string_len(Customer::Email, 254).unique_key().not_null())
                    .col(string_len_null(Customer::Phone, 64))
                    .col(string_len_null(Customer::Company, 200))
                    .col(integer_null(Customer::OwnerId))
                    .col(string_len(Customer::Status, 32).not_null())
                    .col(timestamp_with_time_zone(Customer::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Customer::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Customer::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Customer { Table, Id, Name, Email, Phone, Company, OwnerId, Status, CreatedAt, UpdatedAt }
