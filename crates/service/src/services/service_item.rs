use models::service_item::{self, NewServiceItem, ServiceItemChanges};

use super::EntityService;
use crate::{audit::Actor, errors::ServiceError, filter::FilterSpec};

pub type ServiceItemService = EntityService<service_item::Entity>;

pub fn filter_spec() -> FilterSpec<service_item::Entity> {
    FilterSpec::new()
        .status(service_item::Column::Status)
        .kind(service_item::Column::Category)
        .date(service_item::Column::CreatedAt)
        .search([service_item::Column::Name, service_item::Column::Description])
}

impl EntityService<service_item::Entity> {
    pub async fn create(&self, input: NewServiceItem) -> Result<service_item::Model, ServiceError> {
        self.insert(input.into_active_model()?).await
    }

    pub async fn update(
        &self,
        id: i32,
        changes: ServiceItemChanges,
        actor: &Actor,
    ) -> Result<service_item::Model, ServiceError> {
        self.update_fields(id, changes.into_changes()?, actor).await
    }
}
