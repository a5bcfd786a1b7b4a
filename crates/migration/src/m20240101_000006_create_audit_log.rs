//! Create `audit_log` table.
//!
//! One row per state-changing operation; rows are never updated or deleted.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLog::Table)
                    .if_not_exists()
                    .col(pk_auto(AuditLog::Id))
                    .col(string_len(AuditLog::EntityType, 32).not_null())
                    .col(integer(AuditLog::EntityId).not_null())
                    .col(integer(AuditLog::ActorId).not_null())
                    .col(string_len(AuditLog::ActorName, 200).not_null())
                    .col(string_len(AuditLog::Action, 64).not_null())
                    .col(text_null(AuditLog::Details))
                    .col(timestamp_with_time_zone(AuditLog::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AuditLog::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AuditLog { Table, Id, EntityType, EntityId, ActorId, ActorName, Action, Details, CreatedAt }
