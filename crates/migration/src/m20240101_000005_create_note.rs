//! Create `note` table.
//!
//! Append-only free text attached to any entity through
//! (`entity_type`, `entity_id`); no FK so one table serves every entity.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Note::Table)
                    .if_not_exists()
                    .col(pk_auto(Note::Id))
                    .col(string_len(Note::EntityType, 32).not_null())
                    .col(integer(Note::EntityId).not_null())
                    .col(integer(Note::AuthorId).not_null())
                    .col(string_len(Note::AuthorName, 200).not_null())
                    .col(text(Note::Text).not_null())
                    .col(timestamp_with_time_zone(Note::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Note::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Note { Table, Id, EntityType, EntityId, AuthorId, AuthorName, Text, CreatedAt }
