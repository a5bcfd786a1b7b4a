use models::{
    appointment, customer,
    request::{self, Conversion, NewRequest, RequestChanges},
    ManagedEntity,
};
use sea_orm::{ActiveModelTrait, DatabaseTransaction, RelationTrait, TransactionTrait};
use tracing::{info, instrument};

use super::{ensure_customer, EntityService};
use crate::{
    audit::{self, action, Actor, LogDraft},
    errors::ServiceError,
    filter::{FilterSpec, RelatedSearch},
    repository::{apply_mutation, settle, Mutation, SeaOrmUnitOfWork, UnitOfWork},
};

pub type RequestService = EntityService<request::Entity>;

pub fn filter_spec() -> FilterSpec<request::Entity> {
    FilterSpec::new()
        .status(request::Column::Status)
        .kind(request::Column::Category)
        .owner(request::Column::AssignedTo)
        .assignee(request::Column::AssignedTo)
        .related(request::Column::CustomerId)
        .date(request::Column::CreatedAt)
        .search([request::Column::Subject, request::Column::Description])
        .related_search(RelatedSearch::new::<customer::Entity>(
            || request::Relation::Customer.def(),
            customer::Column::Name,
        ))
}

impl EntityService<request::Entity> {
    #[instrument(skip(self, input), fields(customer_id = input.customer_id))]
    pub async fn create(&self, input: NewRequest) -> Result<request::Model, ServiceError> {
        let customer_id = input.customer_id;
        let am = input.into_active_model()?;
        ensure_customer(self.repository().db(), customer_id).await?;
        self.insert(am).await
    }

    pub async fn update(&self, id: i32, changes: RequestChanges, actor: &Actor) -> Result<request::Model, ServiceError> {
        self.update_fields(id, changes.into_changes()?, actor).await
    }

    /// Hand the request to `user_id`. A pending request moves to `assigned`;
    /// one already being worked keeps its status.
    #[instrument(skip(self, note, actor), fields(actor = actor.id))]
    pub async fn assign(
        &self,
        id: i32,
        user_id: i32,
        note: Option<&str>,
        actor: &Actor,
    ) -> Result<request::Model, ServiceError> {
        let outcome = self
            .repository()
            .mutate(id, actor, |current| {
                if request::Entity::is_terminal(&current.status) {
                    return Err(ServiceError::validation(format!("cannot assign a {} request", current.status)));
                }
                if current.assigned_to == Some(user_id) {
                    return Err(ServiceError::validation(format!("request is already assigned to {user_id}")));
                }
                let from = current.assigned_to.map_or_else(|| "unassigned".to_string(), |u| u.to_string());
                let mut mutation = Mutation::new(action::ASSIGNED)
                    .set(request::Column::AssignedTo, user_id)
                    .note(note)
                    .details(format!("{from} -> {user_id}"));
                if current.status == request::STATUS_PENDING {
                    mutation = mutation.set(request::Column::Status, request::STATUS_ASSIGNED);
                }
                Ok(mutation)
            })
            .await?;
        info!(id, user_id, "request assigned");
        self.invalidate();
        Ok(outcome.record)
    }

    /// Create the appointment and close the request in one transaction.
    #[instrument(skip(self, conversion, actor), fields(actor = actor.id))]
    pub async fn convert_to_appointment(
        &self,
        id: i32,
        conversion: Conversion,
        actor: &Actor,
    ) -> Result<(request::Model, appointment::Model), ServiceError> {
        let txn = self.repository().db().begin().await?;
        let converted = convert_in(&txn, id, &conversion, actor).await;
        let (closed, booked) = settle(txn, converted).await?;
        info!(id, appointment_id = booked.id, "request converted");
        self.invalidate();
        self.invalidate_kind(appointment::Entity::KIND);
        Ok((closed, booked))
    }
}

async fn convert_in(
    txn: &DatabaseTransaction,
    id: i32,
    conversion: &Conversion,
    actor: &Actor,
) -> Result<(request::Model, appointment::Model), ServiceError> {
    let uow = SeaOrmUnitOfWork::<request::Entity>::new(txn);
    let current = uow.find(id).await?.ok_or_else(|| ServiceError::not_found(request::Entity::KIND, id))?;
    ensure_convertible(&current)?;

    let booked = conversion.appointment_for(&current).into_active_model()?.insert(txn).await?;
    audit::insert_log(
        txn,
        LogDraft {
            entity_type: appointment::Entity::KIND,
            entity_id: booked.id,
            actor: actor.clone(),
            action: action::CREATED.to_string(),
            details: Some(format!("from request {id}")),
        },
    )
    .await?;

    let outcome = apply_mutation::<request::Entity, _, _>(&uow, id, actor, |current| {
        ensure_convertible(current)?;
        Ok(Mutation::new(action::CONVERTED)
            .set(request::Column::Status, request::STATUS_COMPLETED)
            .set(request::Column::AppointmentId, booked.id)
            .note(Some(conversion.note()))
            .details(format!("{} -> {}, appointment {}", current.status, request::STATUS_COMPLETED, booked.id)))
    })
    .await?;
    Ok((outcome.record, booked))
}

fn ensure_convertible(req: &request::Model) -> Result<(), ServiceError> {
    if let Some(appointment_id) = req.appointment_id {
        return Err(ServiceError::validation(format!("request already converted to appointment {appointment_id}")));
    }
    if request::Entity::is_terminal(&req.status) {
        return Err(ServiceError::validation(format!("cannot convert a {} request", req.status)));
    }
    Ok(())
}
