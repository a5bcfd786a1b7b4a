//! Notes and audit log rows shared by every managed entity.
//!
//! Writers are generic over [`ConnectionTrait`] so the transactional protocol
//! and the plain service calls go through the same code.

use chrono::Utc;
use models::{audit_log, note};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// `audit_log.action` values.
pub mod action {
    pub const STATUS_CHANGED: &str = "status_changed";
    pub const UPDATED: &str = "updated";
    pub const NOTE_ADDED: &str = "note_added";
    pub const RESCHEDULED: &str = "rescheduled";
    pub const ARCHIVED: &str = "archived";
    pub const ASSIGNED: &str = "assigned";
    pub const CONVERTED: &str = "converted";
    pub const CREATED: &str = "created";
}

/// Who performed an operation. Identity is resolved upstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i32,
    pub name: String,
}

impl Actor {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }

    /// Background jobs and bootstrap code.
    pub fn system() -> Self {
        Self { id: 0, name: "system".into() }
    }
}

#[derive(Clone, Debug)]
pub struct NoteDraft {
    pub entity_type: &'static str,
    pub entity_id: i32,
    pub author: Actor,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct LogDraft {
    pub entity_type: &'static str,
    pub entity_id: i32,
    pub actor: Actor,
    pub action: String,
    pub details: Option<String>,
}

pub async fn insert_note<C: ConnectionTrait>(conn: &C, draft: NoteDraft) -> Result<note::Model, ServiceError> {
    let text = draft.text.trim();
    if text.is_empty() {
        return Err(ServiceError::validation("note text required"));
    }
    let am = note::ActiveModel {
        entity_type: Set(draft.entity_type.to_string()),
        entity_id: Set(draft.entity_id),
        author_id: Set(draft.author.id),
        author_name: Set(draft.author.name),
        text: Set(text.to_string()),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };
    Ok(am.insert(conn).await?)
}

pub async fn insert_log<C: ConnectionTrait>(conn: &C, draft: LogDraft) -> Result<audit_log::Model, ServiceError> {
    if draft.action.trim().is_empty() {
        return Err(ServiceError::validation("audit action required"));
    }
    let am = audit_log::ActiveModel {
        entity_type: Set(draft.entity_type.to_string()),
        entity_id: Set(draft.entity_id),
        actor_id: Set(draft.actor.id),
        actor_name: Set(draft.actor.name),
        action: Set(draft.action),
        details: Set(draft.details),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };
    Ok(am.insert(conn).await?)
}

/// Per-entity-type view over the `note` and `audit_log` tables.
#[derive(Clone)]
pub struct AuditTrail {
    db: DatabaseConnection,
    kind: &'static str,
}

impl AuditTrail {
    pub fn new(db: DatabaseConnection, kind: &'static str) -> Self {
        Self { db, kind }
    }

    pub async fn add_note(&self, entity_id: i32, author: &Actor, text: &str) -> Result<note::Model, ServiceError> {
        insert_note(
            &self.db,
            NoteDraft { entity_type: self.kind, entity_id, author: author.clone(), text: text.to_string() },
        )
        .await
    }

    pub async fn add_log(
        &self,
        entity_id: i32,
        actor: &Actor,
        action: &str,
        details: Option<String>,
    ) -> Result<audit_log::Model, ServiceError> {
        insert_log(
            &self.db,
            LogDraft { entity_type: self.kind, entity_id, actor: actor.clone(), action: action.to_string(), details },
        )
        .await
    }

    /// Newest first.
    pub async fn list_notes(&self, entity_id: i32) -> Result<Vec<note::Model>, ServiceError> {
        Ok(note::Entity::find()
            .filter(note::Column::EntityType.eq(self.kind))
            .filter(note::Column::EntityId.eq(entity_id))
            .order_by_desc(note::Column::CreatedAt)
            .order_by_desc(note::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Newest first.
    pub async fn list_logs(&self, entity_id: i32) -> Result<Vec<audit_log::Model>, ServiceError> {
        Ok(audit_log::Entity::find()
            .filter(audit_log::Column::EntityType.eq(self.kind))
            .filter(audit_log::Column::EntityId.eq(entity_id))
            .order_by_desc(audit_log::Column::CreatedAt)
            .order_by_desc(audit_log::Column::Id)
            .all(&self.db)
            .await?)
    }
}
