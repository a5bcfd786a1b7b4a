use sea_orm_migration::prelude::*;

/// (name, table, columns)
const INDEXES: &[(&str, &str, &[&str])] = &[
    ("idx_customer_status", "customer", &["status"]),
    ("idx_customer_created", "customer", &["created_at"]),
    ("idx_project_customer", "project", &["customer_id"]),
    ("idx_project_status", "project", &["status"]),
    ("idx_appointment_customer", "appointment", &["customer_id"]),
    ("idx_appointment_status", "appointment", &["status"]),
    ("idx_appointment_scheduled", "appointment", &["scheduled_at"]),
    ("idx_service_item_status", "service_item", &["status"]),
    ("idx_request_customer", "request", &["customer_id"]),
    ("idx_request_status", "request", &["status"]),
    ("idx_request_assigned", "request", &["assigned_to"]),
    ("idx_note_entity", "note", &["entity_type", "entity_id"]),
    ("idx_audit_log_entity", "audit_log", &["entity_type", "entity_id"]),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, cols) in INDEXES {
            let mut index = Index::create();
            index.name(*name).table(Alias::new(*table));
            for col in *cols {
                index.col(Alias::new(*col));
            }
            manager.create_index(index.to_owned()).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, _) in INDEXES.iter().rev() {
            manager
                .drop_index(Index::drop().name(*name).table(Alias::new(*table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
