use chrono::Utc;
use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::{appointment, errors::ModelError, managed::ManagedEntity, managed_columns, project, request, validate};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub owner_id: Option<i32>,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Project,
    Appointment,
    Request,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Project => Entity::has_many(project::Entity).into(),
            Relation::Appointment => Entity::has_many(appointment::Entity).into(),
            Relation::Request => Entity::has_many(request::Entity).into(),
        }
    }
}

impl Related<project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<appointment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appointment.def()
    }
}

impl Related<request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Request.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";
pub const STATUS_ARCHIVED: &str = "archived";

impl ManagedEntity for Entity {
    const KIND: &'static str = "customer";
    const STATUSES: &'static [&'static str] = &[STATUS_ACTIVE, STATUS_INACTIVE, STATUS_ARCHIVED];
    const ARCHIVED_STATUS: &'static str = STATUS_ARCHIVED;
    const DEPENDENT_KINDS: &'static [&'static str] =
        &[project::Entity::KIND, appointment::Entity::KIND, request::Entity::KIND];

    fn next_statuses(from: &str) -> &'static [&'static str] {
        match from {
            STATUS_ACTIVE => &[STATUS_INACTIVE, STATUS_ARCHIVED],
            STATUS_INACTIVE => &[STATUS_ACTIVE, STATUS_ARCHIVED],
            STATUS_ARCHIVED => &[STATUS_ACTIVE],
            _ => &[],
        }
    }

    managed_columns!();
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub owner_id: Option<i32>,
}

impl NewCustomer {
    pub fn into_active_model(self) -> Result<ActiveModel, ModelError> {
        let name = validate::required("name", &self.name)?;
        validate::max_len("name", &name, 200)?;
        let email = validate::email(&self.email)?;
        let now: DateTimeWithTimeZone = Utc::now().into();
        Ok(ActiveModel {
            name: Set(name),
            email: Set(email),
            phone: Set(validate::optional(self.phone)),
            company: Set(validate::optional(self.company)),
            owner_id: Set(self.owner_id),
            status: Set(Entity::initial_status().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
    }
}

/// Partial update. Blank optional text clears the column.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub owner_id: Option<i32>,
}

impl CustomerChanges {
    pub fn into_changes(self) -> Result<Vec<(Column, Value)>, ModelError> {
        let mut out = Vec::new();
        if let Some(name) = self.name {
            let name = validate::required("name", &name)?;
            validate::max_len("name", &name, 200)?;
            out.push((Column::Name, name.into()));
        }
        if let Some(email) = self.email {
            out.push((Column::Email, validate::email(&email)?.into()));
        }
        if let Some(phone) = self.phone {
            out.push((Column::Phone, validate::optional(Some(phone)).into()));
        }
        if let Some(company) = self.company {
            out.push((Column::Company, validate::optional(Some(company)).into()));
        }
        if let Some(owner) = self.owner_id {
            out.push((Column::OwnerId, owner.into()));
        }
        Ok(out)
    }
}
