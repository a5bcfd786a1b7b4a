//! Create `project` table with FK to `customer`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(pk_auto(Project::Id))
                    .col(integer(Project::CustomerId).not_null())
                    .col(integer_null(Project::OwnerId))
                    .col(string_len(Project::Title, 200).not_null())
                    .col(text_null(Project::Description))
                    .col(string_len(Project::Kind, 64).not_null())
                    .col(string_len(Project::Status, 32).not_null())
                    .col(timestamp_with_time_zone_null(Project::DueDate))
                    .col(timestamp_with_time_zone(Project::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Project::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_customer")
                            .from(Project::Table, Project::CustomerId)
                            .to(Customer::Table, Customer::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Project::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Project { Table, Id, CustomerId, OwnerId, Title, Description, Kind, Status, DueDate, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Customer { Table, Id }
