//! Create `service_item` table (the catalogue of billable services).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceItem::Table)
                    .if_not_exists()
                    .col(pk_auto(ServiceItem::Id))
                    .col(string_len(ServiceItem::Name, 200).not_null())
                    .col(text_null(ServiceItem::Description))
                    .col(string_len(ServiceItem::Category, 64).not_null())
                    .col(big_integer(ServiceItem::PriceCents).not_null())
                    .col(string_len(ServiceItem::Status, 32).not_null())
                    .col(timestamp_with_time_zone(ServiceItem::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ServiceItem::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ServiceItem::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ServiceItem { Table, Id, Name, Description, Category, PriceCents, Status, CreatedAt, UpdatedAt }
