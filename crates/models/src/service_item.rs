use chrono::Utc;
use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::{errors::ModelError, managed::ManagedEntity, managed_columns, validate};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_item")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price_cents: i64,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";
pub const STATUS_ARCHIVED: &str = "archived";

impl ManagedEntity for Entity {
    const KIND: &'static str = "service_item";
    const STATUSES: &'static [&'static str] = &[STATUS_ACTIVE, STATUS_INACTIVE, STATUS_ARCHIVED];
    const ARCHIVED_STATUS: &'static str = STATUS_ARCHIVED;

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

pub fn validate_price(cents: i64) -> Result<i64, ModelError> {
    if cents < 0 {
        return Err(ModelError::Validation("price_cents must be >= 0".into()));
    }
    Ok(cents)
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewServiceItem {
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewServiceItem {
    pub fn into_active_model(self) -> Result<ActiveModel, ModelError> {
        let name = validate::required("name", &self.name)?;
        validate::max_len("name", &name, 200)?;
        let category = validate::required("category", &self.category)?;
        let now: DateTimeWithTimeZone = Utc::now().into();
        Ok(ActiveModel {
            name: Set(name),
            description: Set(validate::optional(self.description)),
            category: Set(category),
            price_cents: Set(validate_price(self.price_cents)?),
            status: Set(Entity::initial_status().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ServiceItemChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
}

impl ServiceItemChanges {
    pub fn into_changes(self) -> Result<Vec<(Column, Value)>, ModelError> {
        let mut out = Vec::new();
        if let Some(name) = self.name {
            let name = validate::required("name", &name)?;
            validate::max_len("name", &name, 200)?;
            out.push((Column::Name, name.into()));
        }
        if let Some(description) = self.description {
            out.push((Column::Description, validate::optional(Some(description)).into()));
        }
        if let Some(category) = self.category {
            out.push((Column::Category, validate::required("category", &category)?.into()));
        }
        if let Some(price) = self.price_cents {
            out.push((Column::PriceCents, validate_price(price)?.into()));
        }
        Ok(out)
    }
}
