use chrono::{SecondsFormat, Utc};
use models::{
    appointment::{self, AppointmentChanges, NewAppointment},
    customer, ManagedEntity,
};
use sea_orm::{prelude::DateTimeWithTimeZone, RelationTrait};
use tracing::{info, instrument};

use super::{ensure_customer, EntityService};
use crate::{
    audit::{action, Actor},
    errors::ServiceError,
    filter::{FilterSpec, RelatedSearch},
    repository::Mutation,
};

pub type AppointmentService = EntityService<appointment::Entity>;

pub fn filter_spec() -> FilterSpec<appointment::Entity> {
    FilterSpec::new()
        .status(appointment::Column::Status)
        .owner(appointment::Column::AssignedTo)
        .assignee(appointment::Column::AssignedTo)
        .related(appointment::Column::CustomerId)
        .date(appointment::Column::ScheduledAt)
        .upcoming()
        .search([appointment::Column::Title, appointment::Column::Description, appointment::Column::Location])
        .related_search(RelatedSearch::new::<customer::Entity>(
            || appointment::Relation::Customer.def(),
            customer::Column::Name,
        ))
}

impl EntityService<appointment::Entity> {
    #[instrument(skip(self, input), fields(customer_id = input.customer_id))]
    pub async fn create(&self, input: NewAppointment) -> Result<appointment::Model, ServiceError> {
        let customer_id = input.customer_id;
        let am = input.into_active_model()?;
        ensure_customer(self.repository().db(), customer_id).await?;
        self.insert(am).await
    }

    pub async fn update(
        &self,
        id: i32,
        changes: AppointmentChanges,
        actor: &Actor,
    ) -> Result<appointment::Model, ServiceError> {
        self.update_fields(id, changes.into_changes()?, actor).await
    }

    /// Cancel with a mandatory reason, kept as a note.
    pub async fn cancel(&self, id: i32, reason: &str, actor: &Actor) -> Result<appointment::Model, ServiceError> {
        if reason.trim().is_empty() {
            return Err(ServiceError::validation("cancellation reason required"));
        }
        self.change_status(id, appointment::STATUS_CANCELLED, Some(reason), actor).await
    }

    pub async fn complete(
        &self,
        id: i32,
        notes: Option<&str>,
        actor: &Actor,
    ) -> Result<appointment::Model, ServiceError> {
        self.change_status(id, appointment::STATUS_COMPLETED, notes, actor).await
    }

    /// Move a live appointment to `new_time`. The terminal-state check runs
    /// inside the transaction against the row being updated.
    #[instrument(skip(self, reason, actor), fields(actor = actor.id))]
    pub async fn reschedule(
        &self,
        id: i32,
        new_time: DateTimeWithTimeZone,
        reason: Option<&str>,
        actor: &Actor,
    ) -> Result<appointment::Model, ServiceError> {
        let new_time: DateTimeWithTimeZone = new_time.with_timezone(&Utc).into();
        let outcome = self
            .repository()
            .mutate(id, actor, |current| {
                if appointment::Entity::is_terminal(&current.status) {
                    return Err(ServiceError::validation(format!(
                        "cannot reschedule a {} appointment",
                        current.status
                    )));
                }
                if current.scheduled_at == new_time {
                    return Err(ServiceError::validation("appointment is already scheduled at that time"));
                }
                let details = format!(
                    "{} -> {}",
                    current.scheduled_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                    new_time.to_rfc3339_opts(SecondsFormat::Secs, true)
                );
                Ok(Mutation::new(action::RESCHEDULED)
                    .set(appointment::Column::ScheduledAt, new_time)
                    .note(reason)
                    .details(details))
            })
            .await?;
        info!(id, scheduled_at = %new_time, "appointment rescheduled");
        self.invalidate();
        Ok(outcome.record)
    }
}
