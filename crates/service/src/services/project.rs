use models::{
    customer,
    project::{self, NewProject, ProjectChanges},
};
use sea_orm::RelationTrait;
use tracing::instrument;

use super::{ensure_customer, EntityService};
use crate::{
    audit::Actor,
    errors::ServiceError,
    filter::{FilterSpec, RelatedSearch},
};

pub type ProjectService = EntityService<project::Entity>;

pub fn filter_spec() -> FilterSpec<project::Entity> {
    FilterSpec::new()
        .status(project::Column::Status)
        .kind(project::Column::Kind)
        .owner(project::Column::OwnerId)
        .related(project::Column::CustomerId)
        .date(project::Column::DueDate)
        .search([project::Column::Title, project::Column::Description])
        .related_search(RelatedSearch::new::<customer::Entity>(
            || project::Relation::Customer.def(),
            customer::Column::Name,
        ))
}

impl EntityService<project::Entity> {
    /// The referenced customer must exist.
    #[instrument(skip(self, input), fields(customer_id = input.customer_id))]
    pub async fn create(&self, input: NewProject) -> Result<project::Model, ServiceError> {
        let customer_id = input.customer_id;
        let am = input.into_active_model()?;
        ensure_customer(self.repository().db(), customer_id).await?;
        self.insert(am).await
    }

    pub async fn update(&self, id: i32, changes: ProjectChanges, actor: &Actor) -> Result<project::Model, ServiceError> {
        self.update_fields(id, changes.into_changes()?, actor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::TtlCache,
        filter::FilterCriteria,
        repository::EntityRepository,
        test_support::{actor, at, get_db, seed_customer},
    };
    use common::pagination::PaginationRequest;
    use std::time::Duration;

    fn input(customer_id: i32, title: &str, kind: &str) -> NewProject {
        NewProject {
            customer_id,
            title: title.into(),
            kind: kind.into(),
            description: None,
            owner_id: None,
            due_date: Some(at(2024, 6, 30, 17, 0, 0)),
        }
    }

    #[tokio::test]
    async fn create_requires_customer() -> anyhow::Result<()> {
        let db = get_db().await?;
        let svc: ProjectService =
            EntityService::new(EntityRepository::new(db.clone(), filter_spec()), TtlCache::new(Duration::from_secs(60)));
        let err = svc.create(input(404, "Orphan", "consulting")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "customer", id: 404 }));

        let c = seed_customer(&db, "Acme", "a@acme.io").await?;
        let p = svc.create(input(c.id, "Rollout", "installation")).await?;
        assert_eq!(p.status, "planned");
        Ok(())
    }

    #[tokio::test]
    async fn workflow_and_filters() -> anyhow::Result<()> {
        let db = get_db().await?;
        let svc: ProjectService =
            EntityService::new(EntityRepository::new(db.clone(), filter_spec()), TtlCache::new(Duration::from_secs(60)));
        let acme = seed_customer(&db, "Acme", "a@acme.io").await?;
        let globex = seed_customer(&db, "Globex", "g@globex.io").await?;
        let p = svc.create(input(acme.id, "Rollout", "installation")).await?;
        svc.create(input(globex.id, "Audit", "consulting")).await?;

        let err = svc.change_status(p.id, "completed", None, &actor()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        svc.change_status(p.id, "active", Some("kickoff done"), &actor()).await?;
        let done = svc.change_status(p.id, "completed", None, &actor()).await?;
        assert_eq!(done.status, "completed");
        assert_eq!(svc.history(p.id).await?.len(), 2);
        assert_eq!(svc.notes(p.id).await?[0].text, "kickoff done");

        let by_customer = svc
            .list(&FilterCriteria { related_id: Some(globex.id), ..Default::default() }, PaginationRequest::default())
            .await?;
        assert_eq!(by_customer.data[0].title, "Audit");

        let by_kind = svc
            .list(&FilterCriteria { kind: Some("installation".into()), ..Default::default() }, PaginationRequest::default())
            .await?;
        assert_eq!(by_kind.data.len(), 1);

        let due = svc
            .list(&FilterCriteria { date: Some("2024-06-30".into()), ..Default::default() }, PaginationRequest::default())
            .await?;
        assert_eq!(due.pagination.total_records, 2);

        let via_customer = svc.list(&FilterCriteria::search("globex"), PaginationRequest::default()).await?;
        assert_eq!(via_customer.data.len(), 1);
        Ok(())
    }
}
