use models::customer::{self, CustomerChanges, NewCustomer};
use tracing::instrument;

use super::EntityService;
use crate::{audit::Actor, errors::ServiceError, filter::FilterSpec};

pub type CustomerService = EntityService<customer::Entity>;

pub fn filter_spec() -> FilterSpec<customer::Entity> {
    FilterSpec::new()
        .status(customer::Column::Status)
        .owner(customer::Column::OwnerId)
        .date(customer::Column::CreatedAt)
        .search([customer::Column::Name, customer::Column::Email, customer::Column::Company])
}

impl EntityService<customer::Entity> {
    /// Fails with `Conflict` when the email is already registered.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(&self, input: NewCustomer) -> Result<customer::Model, ServiceError> {
        self.insert(input.into_active_model()?).await
    }

    pub async fn update(&self, id: i32, changes: CustomerChanges, actor: &Actor) -> Result<customer::Model, ServiceError> {
        self.update_fields(id, changes.into_changes()?, actor).await
    }
}
