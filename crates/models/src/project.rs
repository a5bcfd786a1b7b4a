use chrono::Utc;
use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::{customer, errors::ModelError, managed::ManagedEntity, managed_columns, validate};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_id: i32,
    pub owner_id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    /// Free-form project type, e.g. "installation" or "consulting".
    pub kind: String,
    pub status: String,
    pub due_date: Option<DateTimeWithTimeZone>,
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
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_ON_HOLD: &str = "on_hold";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const STATUS_ARCHIVED: &str = "archived";

impl ManagedEntity for Entity {
    const KIND: &'static str = "project";
    const STATUSES: &'static [&'static str] = &[
        STATUS_PLANNED,
        STATUS_ACTIVE,
        STATUS_ON_HOLD,
        STATUS_COMPLETED,
        STATUS_CANCELLED,
        STATUS_ARCHIVED,
    ];
    const ARCHIVED_STATUS: &'static str = STATUS_ARCHIVED;

    fn next_statuses(from: &str) -> &'static [&'static str] {
        match from {
            STATUS_PLANNED => &[STATUS_ACTIVE, STATUS_ON_HOLD, STATUS_CANCELLED, STATUS_ARCHIVED],
            STATUS_ACTIVE => &[STATUS_ON_HOLD, STATUS_COMPLETED, STATUS_CANCELLED],
            STATUS_ON_HOLD => &[STATUS_ACTIVE, STATUS_CANCELLED],
            STATUS_COMPLETED | STATUS_CANCELLED => &[STATUS_ARCHIVED],
            _ => &[],
        }
    }

    managed_columns!();
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewProject {
    pub customer_id: i32,
    pub title: String,
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_id: Option<i32>,
    #[serde(default)]
    pub due_date: Option<DateTimeWithTimeZone>,
}

impl NewProject {
    pub fn into_active_model(self) -> Result<ActiveModel, ModelError> {
        let title = validate::required("title", &self.title)?;
        validate::max_len("title", &title, 200)?;
        let kind = validate::required("kind", &self.kind)?;
        let now: DateTimeWithTimeZone = Utc::now().into();
        Ok(ActiveModel {
            customer_id: Set(self.customer_id),
            owner_id: Set(self.owner_id),
            title: Set(title),
            description: Set(validate::optional(self.description)),
            kind: Set(kind),
            status: Set(Entity::initial_status().to_string()),
            due_date: Set(self.due_date),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub owner_id: Option<i32>,
    pub due_date: Option<DateTimeWithTimeZone>,
}

impl ProjectChanges {
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
        if let Some(kind) = self.kind {
            out.push((Column::Kind, validate::required("kind", &kind)?.into()));
        }
        if let Some(owner) = self.owner_id {
            out.push((Column::OwnerId, owner.into()));
        }
        if let Some(due) = self.due_date {
            out.push((Column::DueDate, due.into()));
        }
        Ok(out)
    }
}
