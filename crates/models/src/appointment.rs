use chrono::Utc;
use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::{customer, errors::ModelError, managed::ManagedEntity, managed_columns, validate};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appointment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_id: i32,
    pub assigned_to: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub scheduled_at: DateTimeWithTimeZone,
    pub duration_minutes: i32,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Customer,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Customer => Entity::belongs_to(customer::Entity)
                .from(Column::CustomerId)
                .to(customer::Column::Id)
                .into(),
        }
    }
}

impl Related<customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const STATUS_PLANNED: &str = "planned";
pub const STATUS_CONFIRMED: &str = "confirmed";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const STATUS_NO_SHOW: &str = "no_show";

/// Longest bookable slot.
pub const MAX_DURATION_MINUTES: i32 = 24 * 60;

impl ManagedEntity for Entity {
    const KIND: &'static str = "appointment";
    const STATUSES: &'static [&'static str] = &[
        STATUS_PLANNED,
        STATUS_CONFIRMED,
        STATUS_IN_PROGRESS,
        STATUS_COMPLETED,
        STATUS_CANCELLED,
        STATUS_NO_SHOW,
    ];
    // appointments are never archived, only called off
    const ARCHIVED_STATUS: &'static str = STATUS_CANCELLED;

    fn next_statuses(from: &str) -> &'static [&'static str] {
        match from {
            STATUS_PLANNED => &[STATUS_CONFIRMED, STATUS_IN_PROGRESS, STATUS_COMPLETED, STATUS_CANCELLED, STATUS_NO_SHOW],
            STATUS_CONFIRMED => &[STATUS_IN_PROGRESS, STATUS_COMPLETED, STATUS_CANCELLED, STATUS_NO_SHOW],
            STATUS_IN_PROGRESS => &[STATUS_COMPLETED, STATUS_CANCELLED],
            _ => &[],
        }
    }

    managed_columns!();
}

pub fn validate_duration(minutes: i32) -> Result<i32, ModelError> {
    if !(1..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(ModelError::Validation(format!(
            "duration_minutes must be within 1..={MAX_DURATION_MINUTES}"
        )));
    }
    Ok(minutes)
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewAppointment {
    pub customer_id: i32,
    pub title: String,
    pub scheduled_at: DateTimeWithTimeZone,
    pub duration_minutes: i32,
    #[serde(default)]
    pub assigned_to: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl NewAppointment {
    pub fn into_active_model(self) -> Result<ActiveModel, ModelError> {
        let title = validate::required("title", &self.title)?;
        validate::max_len("title", &title, 200)?;
        let duration = validate_duration(self.duration_minutes)?;
        let now: DateTimeWithTimeZone = Utc::now().into();
        Ok(ActiveModel {
            customer_id: Set(self.customer_id),
            assigned_to: Set(self.assigned_to),
            title: Set(title),
            description: Set(validate::optional(self.description)),
            location: Set(validate::optional(self.location)),
            scheduled_at: Set(self.scheduled_at),
            duration_minutes: Set(duration),
            status: Set(Entity::initial_status().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
    }
}

/// Field edits. Moving `scheduled_at` goes through reschedule instead.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AppointmentChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub assigned_to: Option<i32>,
    pub duration_minutes: Option<i32>,
}

impl AppointmentChanges {
    pub fn into_changes(self) -> Result<Vec<(Column, Value)>, ModelError> {
        let mut out = Vec::new();
        if let Some(title) = self.title {
            let title = validate::required("title", &title)?;
            validate::max_len("title", &title, 200)?;
            out.push((Column::Title, title.into()));
        }
        if let Some(description) = self.description {
            out.push((Column::Description, validate::optional(Some(description)).into()));
        }
        if let Some(location) = self.location {
            out.push((Column::Location, validate::optional(Some(location)).into()));
        }
        if let Some(assignee) = self.assigned_to {
            out.push((Column::AssignedTo, assignee.into()));
        }
        if let Some(minutes) = self.duration_minutes {
            out.push((Column::DurationMinutes, validate_duration(minutes)?.into()));
        }
        Ok(out)
    }
}
