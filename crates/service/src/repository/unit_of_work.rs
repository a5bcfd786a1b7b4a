//! The audited write envelope.
//!
//! A [`Mutation`] describes one state change (column writes, optional note,
//! log action). [`apply_mutation`] runs it against a [`UnitOfWork`]; the
//! caller owns the transaction and finishes it with [`settle`]. Either the
//! record update, the note and the log row all land, or none of them do.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;
use models::{audit_log, note, ManagedEntity};
use sea_orm::{
    prelude::DateTimeWithTimeZone, sea_query::Expr, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    TransactionTrait, Value,
};
use tracing::warn;

use crate::{
    audit::{self, Actor, LogDraft, NoteDraft},
    errors::ServiceError,
};

/// What the write envelope may do inside one transaction.
#[async_trait]
pub trait UnitOfWork<E: ManagedEntity>: Send + Sync {
    async fn find(&self, id: i32) -> Result<Option<E::Model>, ServiceError>;
    /// Apply `changes` and stamp `updated_at`; returns rows affected.
    async fn update(&self, id: i32, changes: &[(E::Column, Value)], at: DateTimeWithTimeZone) -> Result<u64, ServiceError>;
    async fn create_note(&self, draft: NoteDraft) -> Result<note::Model, ServiceError>;
    async fn create_log(&self, draft: LogDraft) -> Result<audit_log::Model, ServiceError>;
}

/// [`UnitOfWork`] bound to an open sea-orm transaction.
pub struct SeaOrmUnitOfWork<'t, E> {
    txn: &'t DatabaseTransaction,
    _entity: PhantomData<fn() -> E>,
}

impl<'t, E> SeaOrmUnitOfWork<'t, E> {
    pub fn new(txn: &'t DatabaseTransaction) -> Self {
        Self { txn, _entity: PhantomData }
    }
}

#[async_trait]
impl<'t, E> UnitOfWork<E> for SeaOrmUnitOfWork<'t, E>
where
    E: ManagedEntity,
    E::Model: Sync,
{
    async fn find(&self, id: i32) -> Result<Option<E::Model>, ServiceError> {
        Ok(E::find().filter(E::id_column().eq(id)).one(self.txn).await?)
    }

    async fn update(&self, id: i32, changes: &[(E::Column, Value)], at: DateTimeWithTimeZone) -> Result<u64, ServiceError> {
        let mut query = E::update_many();
        for (col, value) in changes {
            query = query.col_expr(*col, Expr::value(value.clone()));
        }
        let res = query
            .col_expr(E::updated_at_column(), Expr::value(at))
            .filter(E::id_column().eq(id))
            .exec(self.txn)
            .await?;
        Ok(res.rows_affected)
    }

    async fn create_note(&self, draft: NoteDraft) -> Result<note::Model, ServiceError> {
        audit::insert_note(self.txn, draft).await
    }

    async fn create_log(&self, draft: LogDraft) -> Result<audit_log::Model, ServiceError> {
        audit::insert_log(self.txn, draft).await
    }
}

/// One audited state change.
pub struct Mutation<E: EntityTrait> {
    pub action: String,
    pub changes: Vec<(E::Column, Value)>,
    pub note: Option<String>,
    pub details: Option<String>,
}

impl<E: EntityTrait> Mutation<E> {
    pub fn new(action: impl Into<String>) -> Self {
        Self { action: action.into(), changes: Vec::new(), note: None, details: None }
    }

    pub fn set(mut self, col: E::Column, value: impl Into<Value>) -> Self {
        self.changes.push((col, value.into()));
        self
    }

    pub fn with_changes(mut self, changes: Vec<(E::Column, Value)>) -> Self {
        self.changes.extend(changes);
        self
    }

    /// Blank notes are dropped.
    pub fn note(mut self, text: Option<&str>) -> Self {
        self.note = text.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string);
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct MutationOutcome<M> {
    /// Re-read after the update, inside the same transaction.
    pub record: M,
    pub note: Option<note::Model>,
    pub log: audit_log::Model,
}

/// Load, plan, write, note, log, re-read. `plan` sees the current record
/// and may reject the change.
pub async fn apply_mutation<E, U, P>(
    uow: &U,
    id: i32,
    actor: &Actor,
    plan: P,
) -> Result<MutationOutcome<E::Model>, ServiceError>
where
    E: ManagedEntity,
    U: UnitOfWork<E> + ?Sized,
    P: FnOnce(&E::Model) -> Result<Mutation<E>, ServiceError>,
{
    let current = uow.find(id).await?.ok_or_else(|| ServiceError::not_found(E::KIND, id))?;
    let mutation = plan(&current)?;

    if !mutation.changes.is_empty() {
        let affected = uow.update(id, &mutation.changes, Utc::now().into()).await?;
        if affected == 0 {
            return Err(ServiceError::not_found(E::KIND, id));
        }
    }

    let note = match mutation.note {
        Some(text) => Some(
            uow.create_note(NoteDraft { entity_type: E::KIND, entity_id: id, author: actor.clone(), text })
                .await?,
        ),
        None => None,
    };

    let log = uow
        .create_log(LogDraft {
            entity_type: E::KIND,
            entity_id: id,
            actor: actor.clone(),
            action: mutation.action,
            details: mutation.details,
        })
        .await?;

    let record = uow.find(id).await?.ok_or_else(|| ServiceError::not_found(E::KIND, id))?;
    Ok(MutationOutcome { record, note, log })
}

/// Commit on success, roll back on failure. The original error wins over a
/// failed rollback.
pub async fn settle<T>(txn: DatabaseTransaction, outcome: Result<T, ServiceError>) -> Result<T, ServiceError> {
    match outcome {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rb) = txn.rollback().await {
                warn!(error = %rb, "rollback failed");
            }
            Err(e)
        }
    }
}

/// Begin a transaction on `db`, run the envelope through a live unit of work
/// and settle it.
pub async fn run_mutation<E, C, P>(
    db: &C,
    id: i32,
    actor: &Actor,
    plan: P,
) -> Result<MutationOutcome<E::Model>, ServiceError>
where
    E: ManagedEntity,
    E::Model: Sync,
    C: TransactionTrait,
    P: FnOnce(&E::Model) -> Result<Mutation<E>, ServiceError>,
{
    let txn = db.begin().await?;
    let outcome = apply_mutation::<E, _, _>(&SeaOrmUnitOfWork::<E>::new(&txn), id, actor, plan).await;
    settle(txn, outcome).await
}
