//! Entity services: validation, transition rules and cache invalidation on
//! top of [`EntityRepository`].
//!
//! The shared operations live on the generic [`EntityService`]; each entity
//! module adds `create`/`update` for its own input types plus any extras.

pub mod appointment;
pub mod customer;
pub mod dashboard;
pub mod project;
pub mod request;
pub mod service_item;

use std::time::Duration;

use common::pagination::{Page, PaginationRequest};
use models::{audit_log, note, ManagedEntity};
use sea_orm::{DatabaseConnection, EntityTrait, IntoActiveModel, Value};
use tracing::{info, instrument, warn};

use crate::{
    audit::{action, Actor},
    cache::TtlCache,
    errors::ServiceError,
    filter::FilterCriteria,
    repository::{status_change, EntityRepository, Mutation, StatusBreakdown},
    workflow,
};

pub use appointment::AppointmentService;
pub use customer::CustomerService;
pub use dashboard::{DashboardService, DashboardSummary};
pub use project::ProjectService;
pub use request::RequestService;
pub use service_item::ServiceItemService;

pub struct EntityService<E: ManagedEntity> {
    repo: EntityRepository<E>,
    stats: TtlCache<StatusBreakdown>,
    stats_ttl: Option<Duration>,
}

impl<E> EntityService<E>
where
    E: ManagedEntity,
    E::Model: Sync,
{
    pub fn new(repo: EntityRepository<E>, stats: TtlCache<StatusBreakdown>) -> Self {
        Self { repo, stats, stats_ttl: None }
    }

    /// Override the cache's default TTL for this entity's stats.
    pub fn with_stats_ttl(mut self, ttl: Duration) -> Self {
        self.stats_ttl = Some(ttl);
        self
    }

    pub fn repository(&self) -> &EntityRepository<E> {
        &self.repo
    }

    pub async fn list(&self, criteria: &FilterCriteria, pagination: PaginationRequest) -> Result<Page<E::Model>, ServiceError> {
        self.repo.find_all(criteria, pagination).await
    }

    pub async fn get(&self, id: i32) -> Result<E::Model, ServiceError> {
        self.repo.find_by_id_or_throw(id).await
    }

    /// Transition check and write share one transaction.
    #[instrument(skip(self, note, actor), fields(entity = E::KIND, actor = actor.id))]
    pub async fn change_status(
        &self,
        id: i32,
        status: &str,
        note: Option<&str>,
        actor: &Actor,
    ) -> Result<E::Model, ServiceError> {
        let outcome = self
            .repo
            .mutate(id, actor, |current| {
                let from = E::status_of(current);
                if let Err(e) = workflow::ensure_transition::<E>(from, status) {
                    warn!(id, from, to = status, error = %e, "transition rejected");
                    return Err(e);
                }
                Ok(status_change::<E>(current, status, note))
            })
            .await?;
        info!(id, status, "status changed");
        self.invalidate();
        Ok(outcome.record)
    }

    pub async fn add_note(&self, id: i32, text: &str, actor: &Actor) -> Result<note::Model, ServiceError> {
        self.repo.add_note(id, text, actor).await
    }

    pub async fn notes(&self, id: i32) -> Result<Vec<note::Model>, ServiceError> {
        self.repo.find_by_id_or_throw(id).await?;
        self.repo.audit().list_notes(id).await
    }

    pub async fn history(&self, id: i32) -> Result<Vec<audit_log::Model>, ServiceError> {
        self.repo.find_by_id_or_throw(id).await?;
        self.repo.audit().list_logs(id).await
    }

    /// With an actor the archive is audited; without one it is a plain
    /// soft delete. Bypasses the transition table but refuses records that
    /// are already archived or in a final state.
    pub async fn archive(&self, id: i32, actor: Option<&Actor>) -> Result<E::Model, ServiceError> {
        let record = match actor {
            Some(actor) => {
                self.repo
                    .mutate(id, actor, |current| {
                        let old = E::status_of(current);
                        workflow::ensure_archivable::<E>(old)?;
                        Ok(Mutation::new(action::ARCHIVED)
                            .set(E::status_column(), E::ARCHIVED_STATUS)
                            .details(format!("{old} -> {}", E::ARCHIVED_STATUS)))
                    })
                    .await?
                    .record
            }
            None => {
                let current = self.repo.find_by_id_or_throw(id).await?;
                workflow::ensure_archivable::<E>(E::status_of(&current))?;
                self.repo.soft_delete(id).await?
            }
        };
        self.invalidate();
        Ok(record)
    }

    /// Hard delete. Stats of cascaded child kinds are dropped as well.
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.repo.delete(id).await?;
        self.invalidate();
        for kind in E::DEPENDENT_KINDS {
            self.invalidate_kind(kind);
        }
        Ok(())
    }

    /// Status breakdown, served from cache under `"<kind>:stats"`.
    pub async fn stats(&self) -> Result<StatusBreakdown, ServiceError> {
        let key = format!("{}:stats", E::KIND);
        self.stats.get_or_execute(&key, || self.repo.count_by_status(), self.stats_ttl).await
    }

    pub(crate) async fn insert(&self, am: E::ActiveModel) -> Result<E::Model, ServiceError>
    where
        E::ActiveModel: Send,
        E::Model: IntoActiveModel<E::ActiveModel>,
    {
        let model = self.repo.create(am).await?;
        self.invalidate();
        Ok(model)
    }

    pub(crate) async fn update_fields(
        &self,
        id: i32,
        changes: Vec<(E::Column, Value)>,
        actor: &Actor,
    ) -> Result<E::Model, ServiceError> {
        let outcome = self.repo.update_fields_transactional(id, changes, actor).await?;
        self.invalidate();
        Ok(outcome.record)
    }

    fn invalidate(&self) {
        self.invalidate_kind(E::KIND);
    }

    /// Drop every cached entry under `"<kind>:"`.
    pub(crate) fn invalidate_kind(&self, kind: &str) {
        let removed = self.stats.clear(Some(&format!("{kind}:")));
        if removed > 0 {
            info!(entity = kind, removed, "stats cache invalidated");
        }
    }
}

/// Child records must point at an existing customer.
pub(crate) async fn ensure_customer(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    models::customer::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| ServiceError::not_found(<models::customer::Entity as ManagedEntity>::KIND, id))
}
