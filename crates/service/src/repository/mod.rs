//! Generic repository over any [`ManagedEntity`].
//!
//! Reads go through the entity's [`FilterSpec`]; audited writes go through
//! the [`unit_of_work`] envelope so the record, its note and its log row
//! commit together.

pub mod unit_of_work;

use std::collections::BTreeMap;

use common::pagination::{Page, PaginationRequest, PaginationResult, MAX_PAGE_SIZE};
use models::{note, ManagedEntity};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IdenStatic, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Value,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    audit::{action, Actor, AuditTrail},
    errors::ServiceError,
    filter::{FilterCriteria, FilterSpec},
};

pub use unit_of_work::{apply_mutation, run_mutation, settle, Mutation, MutationOutcome, SeaOrmUnitOfWork, UnitOfWork};

/// Record count per status. Every whitelisted status is present, zero or not.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
}

pub struct EntityRepository<E: ManagedEntity> {
    db: DatabaseConnection,
    filters: FilterSpec<E>,
    audit: AuditTrail,
    max_page_size: i64,
}

impl<E: ManagedEntity> Clone for EntityRepository<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            filters: self.filters.clone(),
            audit: self.audit.clone(),
            max_page_size: self.max_page_size,
        }
    }
}

impl<E> EntityRepository<E>
where
    E: ManagedEntity,
    E::Model: Sync,
{
    pub fn new(db: DatabaseConnection, filters: FilterSpec<E>) -> Self {
        let audit = AuditTrail::new(db.clone(), E::KIND);
        Self { db, filters, audit, max_page_size: MAX_PAGE_SIZE }
    }

    pub fn with_max_page_size(mut self, max: i64) -> Self {
        self.max_page_size = max.max(1);
        self
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// One page, newest first, plus totals computed from the same predicate.
    #[instrument(skip(self, criteria), fields(entity = E::KIND, page = pagination.page, limit = pagination.limit))]
    pub async fn find_all(
        &self,
        criteria: &FilterCriteria,
        pagination: PaginationRequest,
    ) -> Result<Page<E::Model>, ServiceError> {
        let window = pagination.normalize(self.max_page_size);
        let select = self.filters.compile(criteria)?.apply(E::find());
        let rows = select
            .clone()
            .order_by_desc(E::created_at_column())
            .order_by_desc(E::id_column())
            .offset(window.skip())
            .limit(window.limit);
        let (data, total) = tokio::try_join!(rows.all(&self.db), select.count(&self.db))?;
        debug!(returned = data.len(), total, "page loaded");
        Ok(Page { data, pagination: PaginationResult::new(window, total) })
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<E::Model>, ServiceError> {
        Ok(E::find().filter(E::id_column().eq(id)).one(&self.db).await?)
    }

    pub async fn find_by_id_or_throw(&self, id: i32) -> Result<E::Model, ServiceError> {
        self.find_by_id(id).await?.ok_or_else(|| ServiceError::not_found(E::KIND, id))
    }

    pub async fn create(&self, am: E::ActiveModel) -> Result<E::Model, ServiceError>
    where
        E::ActiveModel: Send,
        E::Model: IntoActiveModel<E::ActiveModel>,
    {
        let model = am.insert(&self.db).await?;
        info!(entity = E::KIND, id = E::id_of(&model), "created");
        Ok(model)
    }

    /// Unaudited column update; stamps `updated_at`.
    pub async fn update(&self, id: i32, changes: Vec<(E::Column, Value)>) -> Result<E::Model, ServiceError> {
        let mut query = E::update_many();
        for (col, value) in changes {
            query = query.col_expr(col, Expr::value(value));
        }
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let res = query
            .col_expr(E::updated_at_column(), Expr::value(now))
            .filter(E::id_column().eq(id))
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::not_found(E::KIND, id));
        }
        self.find_by_id_or_throw(id).await
    }

    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let res = E::delete_many().filter(E::id_column().eq(id)).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::not_found(E::KIND, id));
        }
        info!(entity = E::KIND, id, "deleted");
        Ok(())
    }

    /// Move the record to the entity's archived status without auditing.
    pub async fn soft_delete(&self, id: i32) -> Result<E::Model, ServiceError> {
        let model = self.update(id, vec![(E::status_column(), E::ARCHIVED_STATUS.into())]).await?;
        info!(entity = E::KIND, id, status = E::ARCHIVED_STATUS, "soft deleted");
        Ok(model)
    }

    pub async fn count_by_status(&self) -> Result<StatusBreakdown, ServiceError> {
        let rows: Vec<(String, i64)> = E::find()
            .select_only()
            .column(E::status_column())
            .column_as(Expr::col((E::default(), E::id_column())).count(), "count")
            .group_by(E::status_column())
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut breakdown = StatusBreakdown {
            total: 0,
            by_status: E::STATUSES.iter().map(|s| (s.to_string(), 0)).collect(),
        };
        for (status, count) in rows {
            let count = u64::try_from(count).unwrap_or(0);
            breakdown.total += count;
            *breakdown.by_status.entry(status).or_insert(0) += count;
        }
        Ok(breakdown)
    }

    /// Run an audited change in its own transaction.
    pub async fn mutate<P>(&self, id: i32, actor: &Actor, plan: P) -> Result<MutationOutcome<E::Model>, ServiceError>
    where
        P: FnOnce(&E::Model) -> Result<Mutation<E>, ServiceError>,
    {
        run_mutation::<E, _, _>(&self.db, id, actor, plan).await
    }

    /// Status write, optional note and a `status_changed` log row, atomically.
    /// The value is persisted as given; transition rules live in the service.
    #[instrument(skip(self, note, actor), fields(entity = E::KIND, actor = actor.id))]
    pub async fn update_status_transactional(
        &self,
        id: i32,
        new_status: &str,
        note: Option<&str>,
        actor: &Actor,
    ) -> Result<MutationOutcome<E::Model>, ServiceError> {
        let outcome = self.mutate(id, actor, |current| Ok(status_change::<E>(current, new_status, note))).await?;
        info!(id, status = new_status, "status changed");
        Ok(outcome)
    }

    /// Audited field update; the log lists the touched columns.
    pub async fn update_fields_transactional(
        &self,
        id: i32,
        changes: Vec<(E::Column, Value)>,
        actor: &Actor,
    ) -> Result<MutationOutcome<E::Model>, ServiceError> {
        if changes.is_empty() {
            return Err(ServiceError::validation("no fields to update"));
        }
        let touched = changes.iter().map(|(c, _)| c.as_str()).collect::<Vec<_>>().join(", ");
        self.mutate(id, actor, move |_| Ok(Mutation::new(action::UPDATED).with_changes(changes).details(touched)))
            .await
    }

    pub async fn add_note(&self, id: i32, text: &str, actor: &Actor) -> Result<note::Model, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::validation("note text required"));
        }
        let outcome = self
            .mutate(id, actor, |_| Ok(Mutation::new(action::NOTE_ADDED).note(Some(text))))
            .await?;
        outcome.note.ok_or_else(|| ServiceError::validation("note text required"))
    }
}

/// The `status_changed` envelope: new status, optional note, `old -> new`.
pub fn status_change<E: ManagedEntity>(current: &E::Model, new_status: &str, note: Option<&str>) -> Mutation<E> {
    Mutation::new(action::STATUS_CHANGED)
        .set(E::status_column(), new_status)
        .note(note)
        .details(format!("{} -> {new_status}", E::status_of(current)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audit::{LogDraft, NoteDraft},
        test_support::{actor, at, get_db, seed_appointment, seed_customer},
    };
    use async_trait::async_trait;
    use chrono::Duration;
    use models::{appointment, audit_log, customer};
    use sea_orm::{prelude::DateTimeWithTimeZone, TransactionTrait};

    fn appointments(db: &DatabaseConnection) -> EntityRepository<appointment::Entity> {
        EntityRepository::new(db.clone(), crate::services::appointment::filter_spec())
    }

    #[tokio::test]
    async fn find_all_bounds_page_and_counts() -> anyhow::Result<()> {
        let db = get_db().await?;
        let c = seed_customer(&db, "Acme", "a@acme.io").await?;
        for i in 0..7 {
            seed_appointment(&db, c.id, &format!("visit {i}"), at(2024, 5, 1, 9, i, 0)).await?;
        }
        let repo = appointments(&db).with_max_page_size(5);

        let page = repo.find_all(&FilterCriteria::default(), PaginationRequest::new(1, 3)).await?;
        assert_eq!(page.data.len(), 3);
        assert_eq!(page.pagination.total_records, 7);
        assert_eq!(page.pagination.total_pages, 3);
        // newest first
        assert_eq!(page.data[0].title, "visit 6");

        let last = repo.find_all(&FilterCriteria::default(), PaginationRequest::new(3, 3)).await?;
        assert_eq!(last.data.len(), 1);

        let clamped = repo.find_all(&FilterCriteria::default(), PaginationRequest::new(0, 1000)).await?;
        assert_eq!(clamped.pagination.current_page, 1);
        assert_eq!(clamped.pagination.page_size, 5);
        assert_eq!(clamped.data.len(), 5);
        assert_eq!(clamped.pagination.total_pages, 2);

        let tiny = repo.find_all(&FilterCriteria::default(), PaginationRequest::new(1, 0)).await?;
        assert_eq!(tiny.data.len(), 1);
        assert_eq!(tiny.pagination.total_pages, 7);
        Ok(())
    }

    #[tokio::test]
    async fn empty_table_yields_zero_pages() -> anyhow::Result<()> {
        let db = get_db().await?;
        let page = appointments(&db).find_all(&FilterCriteria::default(), PaginationRequest::default()).await?;
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total_pages, 0);
        assert_eq!(page.pagination.total_records, 0);
        Ok(())
    }

    #[tokio::test]
    async fn single_date_filter_is_exact_day() -> anyhow::Result<()> {
        let db = get_db().await?;
        let c = seed_customer(&db, "Acme", "a@acme.io").await?;
        seed_appointment(&db, c.id, "before", at(2024, 4, 30, 23, 59, 59)).await?;
        seed_appointment(&db, c.id, "start", at(2024, 5, 1, 0, 0, 0)).await?;
        seed_appointment(&db, c.id, "end", at(2024, 5, 1, 23, 59, 59)).await?;
        seed_appointment(&db, c.id, "after", at(2024, 5, 2, 0, 0, 0)).await?;

        let criteria = FilterCriteria { date: Some("2024-05-01".into()), ..Default::default() };
        let page = appointments(&db).find_all(&criteria, PaginationRequest::default()).await?;
        let mut titles: Vec<_> = page.data.iter().map(|a| a.title.as_str()).collect();
        titles.sort();
        assert_eq!(titles, ["end", "start"]);
        assert_eq!(page.pagination.total_records, 2);
        Ok(())
    }

    #[tokio::test]
    async fn search_reaches_related_customer_name() -> anyhow::Result<()> {
        let db = get_db().await?;
        let acme = seed_customer(&db, "ACME Industries", "ops@acme.io").await?;
        let other = seed_customer(&db, "Globex", "it@globex.io").await?;
        let hit = seed_appointment(&db, acme.id, "Quarterly review", at(2024, 5, 1, 10, 0, 0)).await?;
        seed_appointment(&db, other.id, "Quarterly review", at(2024, 5, 1, 11, 0, 0)).await?;

        let page = appointments(&db).find_all(&FilterCriteria::search("acme"), PaginationRequest::default()).await?;
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, hit.id);
        assert_eq!(page.pagination.total_records, 1);
        Ok(())
    }

    #[tokio::test]
    async fn status_change_writes_status_note_and_log() -> anyhow::Result<()> {
        let db = get_db().await?;
        let c = seed_customer(&db, "Acme", "a@acme.io").await?;
        let a = seed_appointment(&db, c.id, "Install", at(2024, 5, 1, 9, 0, 0)).await?;
        let repo = appointments(&db);

        let out = repo.update_status_transactional(a.id, "completed", Some("done early"), &actor()).await?;
        assert_eq!(out.record.status, "completed");
        assert!(out.record.updated_at >= a.updated_at);
        assert_eq!(out.log.action, "status_changed");
        assert_eq!(out.log.details.as_deref(), Some("planned -> completed"));

        let notes = repo.audit().list_notes(a.id).await?;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].text, "done early");
        assert_eq!(notes[0].author_id, 42);
        let logs = repo.audit().list_logs(a.id).await?;
        assert_eq!(logs.len(), 1);

        // without a note only the log is written
        repo.update_status_transactional(a.id, "cancelled", Some("  "), &actor()).await?;
        assert_eq!(repo.audit().list_notes(a.id).await?.len(), 1);
        assert_eq!(repo.audit().list_logs(a.id).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn missing_record_is_not_found() -> anyhow::Result<()> {
        let db = get_db().await?;
        let repo = appointments(&db);
        let err = repo.update_status_transactional(999, "completed", None, &actor()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "appointment", id: 999 }));
        assert!(matches!(repo.find_by_id_or_throw(999).await, Err(ServiceError::NotFound { .. })));
        assert!(matches!(repo.delete(999).await, Err(ServiceError::NotFound { .. })));
        assert!(audit_log::Entity::find().all(&db).await?.is_empty());
        Ok(())
    }

    /// Delegates to the live unit of work but fails the log write.
    struct FailingLog<'t> {
        inner: SeaOrmUnitOfWork<'t, appointment::Entity>,
    }

    #[async_trait]
    impl<'t> UnitOfWork<appointment::Entity> for FailingLog<'t> {
        async fn find(&self, id: i32) -> Result<Option<appointment::Model>, ServiceError> {
            self.inner.find(id).await
        }
        async fn update(
            &self,
            id: i32,
            changes: &[(appointment::Column, Value)],
            at: DateTimeWithTimeZone,
        ) -> Result<u64, ServiceError> {
            self.inner.update(id, changes, at).await
        }
        async fn create_note(&self, draft: NoteDraft) -> Result<note::Model, ServiceError> {
            self.inner.create_note(draft).await
        }
        async fn create_log(&self, _draft: LogDraft) -> Result<audit_log::Model, ServiceError> {
            Err(ServiceError::Database("audit_log unavailable".into()))
        }
    }

    #[tokio::test]
    async fn failed_log_rolls_back_status_and_note() -> anyhow::Result<()> {
        let db = get_db().await?;
        let c = seed_customer(&db, "Acme", "a@acme.io").await?;
        let a = seed_appointment(&db, c.id, "Install", at(2024, 5, 1, 9, 0, 0)).await?;

        let txn = db.begin().await?;
        let uow = FailingLog { inner: SeaOrmUnitOfWork::new(&txn) };
        let outcome = apply_mutation::<appointment::Entity, _, _>(&uow, a.id, &actor(), |_| {
            Ok(Mutation::new(action::STATUS_CHANGED)
                .set(appointment::Column::Status, "completed")
                .note(Some("done early")))
        })
        .await;
        drop(uow);
        let err = settle(txn, outcome).await.unwrap_err();
        assert!(matches!(err, ServiceError::Database(_)));

        let repo = appointments(&db);
        let after = repo.find_by_id_or_throw(a.id).await?;
        assert_eq!(after.status, "planned");
        assert_eq!(after.updated_at, a.updated_at);
        assert!(repo.audit().list_notes(a.id).await?.is_empty());
        assert!(repo.audit().list_logs(a.id).await?.is_empty());
        Ok(())
    }

    /// Delegates to the live unit of work but fails the note write.
    struct FailingNote<'t> {
        inner: SeaOrmUnitOfWork<'t, appointment::Entity>,
    }

    #[async_trait]
    impl<'t> UnitOfWork<appointment::Entity> for FailingNote<'t> {
        async fn find(&self, id: i32) -> Result<Option<appointment::Model>, ServiceError> {
            self.inner.find(id).await
        }
        async fn update(
            &self,
            id: i32,
            changes: &[(appointment::Column, Value)],
            at: DateTimeWithTimeZone,
        ) -> Result<u64, ServiceError> {
            self.inner.update(id, changes, at).await
        }
        async fn create_note(&self, _draft: NoteDraft) -> Result<note::Model, ServiceError> {
            Err(ServiceError::Database("note table unavailable".into()))
        }
        async fn create_log(&self, draft: LogDraft) -> Result<audit_log::Model, ServiceError> {
            self.inner.create_log(draft).await
        }
    }

    #[tokio::test]
    async fn failed_note_rolls_back_status() -> anyhow::Result<()> {
        let db = get_db().await?;
        let c = seed_customer(&db, "Acme", "a@acme.io").await?;
        let a = seed_appointment(&db, c.id, "Install", at(2024, 5, 1, 9, 0, 0)).await?;

        let txn = db.begin().await?;
        let uow = FailingNote { inner: SeaOrmUnitOfWork::new(&txn) };
        let outcome = apply_mutation::<appointment::Entity, _, _>(&uow, a.id, &actor(), |current| {
            Ok(status_change::<appointment::Entity>(current, "completed", Some("done early")))
        })
        .await;
        drop(uow);
        let err = settle(txn, outcome).await.unwrap_err();
        assert!(matches!(err, ServiceError::Database(_)));

        let repo = appointments(&db);
        let after = repo.find_by_id_or_throw(a.id).await?;
        assert_eq!(after.status, "planned");
        assert_eq!(after.updated_at, a.updated_at);
        assert!(repo.audit().list_notes(a.id).await?.is_empty());
        assert!(repo.audit().list_logs(a.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn far_page_is_empty_not_an_error() -> anyhow::Result<()> {
        let db = get_db().await?;
        let c = seed_customer(&db, "Acme", "a@acme.io").await?;
        seed_appointment(&db, c.id, "visit", at(2024, 5, 1, 9, 0, 0)).await?;

        let page = appointments(&db).find_all(&FilterCriteria::default(), PaginationRequest::new(i64::MAX, 100)).await?;
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total_records, 1);
        assert_eq!(page.pagination.total_pages, 1);
        assert_eq!(page.pagination.current_page, i64::MAX as u64);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_plan_writes_nothing() -> anyhow::Result<()> {
        let db = get_db().await?;
        let c = seed_customer(&db, "Acme", "a@acme.io").await?;
        let repo: EntityRepository<customer::Entity> =
            EntityRepository::new(db.clone(), crate::services::customer::filter_spec());
        let err = repo
            .mutate(c.id, &actor(), |_| Err::<Mutation<customer::Entity>, _>(ServiceError::validation("nope")))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(repo.audit().list_logs(c.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn field_update_and_note_are_audited() -> anyhow::Result<()> {
        let db = get_db().await?;
        let c = seed_customer(&db, "Acme", "a@acme.io").await?;
        let repo: EntityRepository<customer::Entity> =
            EntityRepository::new(db.clone(), crate::services::customer::filter_spec());

        let out = repo
            .update_fields_transactional(
                c.id,
                vec![(customer::Column::Name, "Acme GmbH".into()), (customer::Column::Phone, "+49 30 1234".into())],
                &actor(),
            )
            .await?;
        assert_eq!(out.record.name, "Acme GmbH");
        assert_eq!(out.log.action, "updated");
        assert_eq!(out.log.details.as_deref(), Some("name, phone"));
        assert!(out.note.is_none());

        let n = repo.add_note(c.id, "called back", &actor()).await?;
        assert_eq!(n.entity_type, "customer");
        assert!(matches!(repo.add_note(c.id, " ", &actor()).await, Err(ServiceError::Validation(_))));
        assert!(matches!(
            repo.update_fields_transactional(c.id, vec![], &actor()).await,
            Err(ServiceError::Validation(_))
        ));

        let actions: Vec<_> = repo.audit().list_logs(c.id).await?.into_iter().map(|l| l.action).collect();
        assert_eq!(actions, ["note_added", "updated"]);
        Ok(())
    }

    #[tokio::test]
    async fn plain_crud_and_status_counts() -> anyhow::Result<()> {
        let db = get_db().await?;
        let repo: EntityRepository<customer::Entity> =
            EntityRepository::new(db.clone(), crate::services::customer::filter_spec());
        let input = customer::NewCustomer {
            name: "Acme".into(),
            email: "a@acme.io".into(),
            phone: None,
            company: None,
            owner_id: None,
        };
        let a = repo.create(input.into_active_model()?).await?;
        let b = seed_customer(&db, "Globex", "g@globex.io").await?;
        seed_customer(&db, "Initech", "i@initech.io").await?;

        let renamed = repo.update(a.id, vec![(customer::Column::Company, "Acme Holding".into())]).await?;
        assert_eq!(renamed.company.as_deref(), Some("Acme Holding"));
        let archived = repo.soft_delete(b.id).await?;
        assert_eq!(archived.status, "archived");

        let stats = repo.count_by_status().await?;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_status["active"], 2);
        assert_eq!(stats.by_status["archived"], 1);
        assert_eq!(stats.by_status["inactive"], 0);

        repo.delete(a.id).await?;
        assert!(repo.find_by_id(a.id).await?.is_none());
        assert_eq!(repo.count_by_status().await?.total, 2);
        Ok(())
    }

    #[tokio::test]
    async fn date_range_with_instants() -> anyhow::Result<()> {
        let db = get_db().await?;
        let c = seed_customer(&db, "Acme", "a@acme.io").await?;
        let base = at(2024, 5, 1, 12, 0, 0);
        for h in 0..4 {
            seed_appointment(&db, c.id, &format!("slot {h}"), base + Duration::hours(h)).await?;
        }
        let criteria = FilterCriteria {
            date_from: Some("2024-05-01T13:00:00Z".into()),
            date_to: Some("2024-05-01T14:00:00Z".into()),
            ..Default::default()
        };
        let page = appointments(&db).find_all(&criteria, PaginationRequest::default()).await?;
        assert_eq!(page.pagination.total_records, 2);
        Ok(())
    }
}
