//! Metadata every repository-managed entity exposes.
//!
//! The generic repository only ever touches an entity through these hooks,
//! so it needs no knowledge of the concrete table beyond id, status and the
//! two timestamps.

use sea_orm::EntityTrait;

pub trait ManagedEntity: EntityTrait {
    /// Discriminator written to `note.entity_type` / `audit_log.entity_type`
    /// and used as cache key prefix.
    const KIND: &'static str;
    /// Whitelist of status values; the first one is assigned on create.
    const STATUSES: &'static [&'static str];
    /// Status written by `soft_delete`.
    const ARCHIVED_STATUS: &'static str;
    /// Kinds whose rows are removed with this one (FK cascade).
    const DEPENDENT_KINDS: &'static [&'static str] = &[];

    /// Statuses reachable from `from` in one step. Unknown states have none.
    fn next_statuses(from: &str) -> &'static [&'static str];

    fn id_column() -> Self::Column;
    fn status_column() -> Self::Column;
    fn created_at_column() -> Self::Column;
    fn updated_at_column() -> Self::Column;

    fn id_of(model: &Self::Model) -> i32;
    fn status_of(model: &Self::Model) -> &str;

    fn initial_status() -> &'static str {
        Self::STATUSES.first().copied().unwrap_or_default()
    }

    fn is_known_status(status: &str) -> bool {
        Self::STATUSES.contains(&status)
    }

    fn is_terminal(status: &str) -> bool {
        Self::next_statuses(status).is_empty()
    }
}

/// Implements the column/accessor hooks for entities that follow the
/// `id`/`status`/`created_at`/`updated_at` naming convention.
#[macro_export]
macro_rules! managed_columns {
    () => {
        fn id_column() -> Self::Column {
            Column::Id
        }
        fn status_column() -> Self::Column {
            Column::Status
        }
        fn created_at_column() -> Self::Column {
            Column::CreatedAt
        }
        fn updated_at_column() -> Self::Column {
            Column::UpdatedAt
        }
        fn id_of(model: &Self::Model) -> i32 {
            model.id
        }
        fn status_of(model: &Self::Model) -> &str {
            &model.status
        }
    };
}
