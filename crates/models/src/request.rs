use chrono::Utc;
use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::{appointment, customer, errors::ModelError, managed::ManagedEntity, managed_columns, validate};

/// Inbound service request from a customer, worked until it is completed,
/// cancelled or converted into an appointment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "request")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_id: i32,
    pub assigned_to: Option<i32>,
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub priority: String,
    pub category: Option<String>,
    /// Set once the request has been converted.
    pub appointment_id: Option<i32>,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Customer,
    Appointment,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Customer => Entity::belongs_to(customer::Entity)
                .from(Column::CustomerId)
                .to(customer::Column::Id)
                .into(),
            Relation::Appointment => Entity::belongs_to(appointment::Entity)
                .from(Column::AppointmentId)
                .to(appointment::Column::Id)
                .into(),
        }
    }
}

impl Related<customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<appointment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appointment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_ASSIGNED: &str = "assigned";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";

pub const PRIORITIES: &[&str] = &["low", "normal", "high", "urgent"];
pub const DEFAULT_PRIORITY: &str = "normal";

impl ManagedEntity for Entity {
    const KIND: &'static str = "request";
    const STATUSES: &'static [&'static str] =
        &[STATUS_PENDING, STATUS_ASSIGNED, STATUS_IN_PROGRESS, STATUS_COMPLETED, STATUS_CANCELLED];
    const ARCHIVED_STATUS: &'static str = STATUS_CANCELLED;

    fn next_statuses(from: &str) -> &'static [&'static str] {
        match from {
            STATUS_PENDING => &[STATUS_ASSIGNED, STATUS_IN_PROGRESS, STATUS_CANCELLED],
            STATUS_ASSIGNED => &[STATUS_PENDING, STATUS_IN_PROGRESS, STATUS_COMPLETED, STATUS_CANCELLED],
            STATUS_IN_PROGRESS => &[STATUS_ASSIGNED, STATUS_COMPLETED, STATUS_CANCELLED],
            _ => &[],
        }
    }

    managed_columns!();
}

pub fn validate_priority(value: &str) -> Result<String, ModelError> {
    let v = value.trim().to_lowercase();
    if !PRIORITIES.contains(&v.as_str()) {
        return Err(ModelError::Validation(format!(
            "priority must be one of: {}",
            PRIORITIES.join(", ")
        )));
    }
    Ok(v)
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewRequest {
    pub customer_id: i32,
    pub subject: String,
    pub description: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl NewRequest {
    pub fn into_active_model(self) -> Result<ActiveModel, ModelError> {
        let subject = validate::required("subject", &self.subject)?;
        validate::max_len("subject", &subject, 200)?;
        let description = validate::required("description", &self.description)?;
        let priority = match self.priority {
            Some(p) => validate_priority(&p)?,
            None => DEFAULT_PRIORITY.to_string(),
        };
        let now: DateTimeWithTimeZone = Utc::now().into();
        Ok(ActiveModel {
            customer_id: Set(self.customer_id),
            assigned_to: Set(None),
            subject: Set(subject),
            description: Set(description),
            priority: Set(priority),
            category: Set(validate::optional(self.category)),
            appointment_id: Set(None),
            status: Set(Entity::initial_status().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
    }
}

/// Field edits. Assignment and status go through their own operations.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RequestChanges {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
}

impl RequestChanges {
    pub fn into_changes(self) -> Result<Vec<(Column, Value)>, ModelError> {
        let mut out = Vec::new();
        if let Some(subject) = self.subject {
            let subject = validate::required("subject", &subject)?;
            validate::max_len("subject", &subject, 200)?;
            out.push((Column::Subject, subject.into()));
        }
        if let Some(description) = self.description {
            out.push((Column::Description, validate::required("description", &description)?.into()));
        }
        if let Some(priority) = self.priority {
            out.push((Column::Priority, validate_priority(&priority)?.into()));
        }
        if let Some(category) = self.category {
            out.push((Column::Category, validate::optional(Some(category)).into()));
        }
        Ok(out)
    }
}

/// Appointment details supplied when a request is converted. Customer,
/// title, description and assignee are taken from the request.
#[derive(Clone, Debug, Deserialize)]
pub struct Conversion {
    pub scheduled_at: DateTimeWithTimeZone,
    #[serde(default = "default_conversion_minutes")]
    pub duration_minutes: i32,
    #[serde(default)]
    pub location: Option<String>,
    /// Kept as a note on the request.
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_conversion_minutes() -> i32 {
    60
}

pub const CONVERSION_NOTE: &str = "Converted from service request";

impl Conversion {
    pub fn appointment_for(&self, request: &Model) -> appointment::NewAppointment {
        appointment::NewAppointment {
            customer_id: request.customer_id,
            title: request.subject.clone(),
            scheduled_at: self.scheduled_at,
            duration_minutes: self.duration_minutes,
            assigned_to: request.assigned_to,
            description: Some(request.description.clone()),
            location: self.location.clone(),
        }
    }

    pub fn note(&self) -> &str {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(CONVERSION_NOTE)
    }
}
