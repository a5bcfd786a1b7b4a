//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_customer;
mod m20240101_000002_create_project;
mod m20240101_000003_create_appointment;
mod m20240101_000004_create_service_item;
mod m20240101_000005_create_note;
mod m20240101_000006_create_audit_log;
mod m20240101_000007_create_request;
mod m20240101_000008_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_customer::Migration),
            Box::new(m20240101_000002_create_project::Migration),
            Box::new(m20240101_000003_create_appointment::Migration),
            Box::new(m20240101_000004_create_service_item::Migration),
            Box::new(m20240101_000005_create_note::Migration),
            Box::new(m20240101_000006_create_audit_log::Migration),
            Box::new(m20240101_000007_create_request::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000008_add_indexes::Migration),
        ]
    }
}
