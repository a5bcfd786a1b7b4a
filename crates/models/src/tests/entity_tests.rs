use anyhow::Result;
use chrono::{TimeZone, Utc};
use migration::MigratorTrait;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, ColumnTrait, SqlErr, TransactionTrait,
};

use crate::{appointment, customer, project};

async fn memory_db() -> Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn new_customer(name: &str, email: &str) -> customer::NewCustomer {
    customer::NewCustomer {
        name: name.into(),
        email: email.into(),
        phone: None,
        company: Some("  ".into()),
        owner_id: Some(7),
    }
}

#[tokio::test]
async fn customer_insert_assigns_id_and_initial_status() -> Result<()> {
    let db = memory_db().await?;
    let c = new_customer("Acme Corp", "Ops@Acme.io").into_active_model()?.insert(&db).await?;
    assert!(c.id > 0);
    assert_eq!(c.status, "active");
    assert_eq!(c.email, "ops@acme.io");
    assert_eq!(c.company, None);
    assert_eq!(c.created_at, c.updated_at);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_unique_violation() -> Result<()> {
    let db = memory_db().await?;
    new_customer("A", "dup@acme.io").into_active_model()?.insert(&db).await?;
    let err: DbErr = new_customer("B", "DUP@acme.io")
        .into_active_model()?
        .insert(&db)
        .await
        .unwrap_err();
    assert!(matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))));
    Ok(())
}

#[tokio::test]
async fn project_and_appointment_relate_to_customer() -> Result<()> {
    let db = memory_db().await?;
    let c = new_customer("Acme", "hq@acme.io").into_active_model()?.insert(&db).await?;
    let p = project::NewProject {
        customer_id: c.id,
        title: "Rollout".into(),
        kind: "installation".into(),
        description: None,
        owner_id: None,
        due_date: None,
    }
    .into_active_model()?
    .insert(&db)
    .await?;
    let a = appointment::NewAppointment {
        customer_id: c.id,
        title: "Kickoff".into(),
        scheduled_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap().into(),
        duration_minutes: 45,
        assigned_to: Some(3),
        description: None,
        location: Some("Site A".into()),
    }
    .into_active_model()?
    .insert(&db)
    .await?;
    assert_eq!(p.status, "planned");
    assert_eq!(a.status, "planned");

    let (found, owner) = appointment::Entity::find_by_id(a.id)
        .find_also_related(customer::Entity)
        .one(&db)
        .await?
        .unwrap();
    assert_eq!(found.title, "Kickoff");
    assert_eq!(owner.map(|o| o.name), Some("Acme".to_string()));

    let projects = c.find_related(project::Entity).all(&db).await?;
    assert_eq!(projects.len(), 1);
    Ok(())
}

#[tokio::test]
async fn rolled_back_insert_leaves_no_row() -> Result<()> {
    let db = memory_db().await?;
    let txn = db.begin().await?;
    new_customer("Ghost", "ghost@acme.io").into_active_model()?.insert(&txn).await?;
    txn.rollback().await?;
    let found = customer::Entity::find()
        .filter(customer::Column::Email.eq("ghost@acme.io"))
        .one(&db)
        .await?;
    assert!(found.is_none());
    Ok(())
}
