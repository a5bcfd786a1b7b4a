#![cfg(test)]
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use migration::MigratorTrait;
use models::{appointment, customer, project};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection};

use crate::audit::Actor;

/// Fresh migrated in-memory SQLite database.
///
/// One connection only: every `sqlite::memory:` connection is its own
/// database, so the pool must not open a second one.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn actor() -> Actor {
    Actor::new(42, "Dana Ops")
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap().into()
}

pub async fn seed_customer(db: &DatabaseConnection, name: &str, email: &str) -> anyhow::Result<customer::Model> {
    let input = customer::NewCustomer {
        name: name.into(),
        email: email.into(),
        phone: None,
        company: None,
        owner_id: None,
    };
    Ok(input.into_active_model()?.insert(db).await?)
}

pub async fn seed_appointment(
    db: &DatabaseConnection,
    customer_id: i32,
    title: &str,
    scheduled_at: DateTime<FixedOffset>,
) -> anyhow::Result<appointment::Model> {
    let input = appointment::NewAppointment {
        customer_id,
        title: title.into(),
        scheduled_at,
        duration_minutes: 60,
        assigned_to: None,
        description: None,
        location: None,
    };
    Ok(input.into_active_model()?.insert(db).await?)
}

pub async fn seed_project(db: &DatabaseConnection, customer_id: i32, title: &str) -> anyhow::Result<project::Model> {
    let input = project::NewProject {
        customer_id,
        title: title.into(),
        kind: "installation".into(),
        description: None,
        owner_id: None,
        due_date: None,
    };
    Ok(input.into_active_model()?.insert(db).await?)
}
