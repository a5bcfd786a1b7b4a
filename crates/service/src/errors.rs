use models::errors::ModelError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(String),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::Conflict(_) => 1002,
            ServiceError::NotFound { .. } => 1003,
            ServiceError::Database(_) => 1200,
        }
    }
}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => ServiceError::Conflict(msg),
            _ => ServiceError::Database(e.to_string()),
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => ServiceError::Validation(msg),
            ModelError::Db(msg) => ServiceError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ServiceError::validation("x").code(), 1001);
        assert_eq!(ServiceError::Conflict("dup".into()).code(), 1002);
        assert_eq!(ServiceError::not_found("customer", 9).code(), 1003);
        assert_eq!(ServiceError::Database("down".into()).code(), 1200);
    }

    #[test]
    fn not_found_names_entity_and_id() {
        assert_eq!(ServiceError::not_found("appointment", 42).to_string(), "appointment 42 not found");
    }

    #[test]
    fn model_errors_keep_their_class() {
        let e: ServiceError = ModelError::Validation("name required".into()).into();
        assert!(matches!(e, ServiceError::Validation(m) if m == "name required"));
        let e: ServiceError = ModelError::Db("boom".into()).into();
        assert!(matches!(e, ServiceError::Database(_)));
    }

    #[test]
    fn plain_db_errors_are_database() {
        let e: ServiceError = DbErr::Custom("connection reset".into()).into();
        assert!(matches!(e, ServiceError::Database(_)));
    }
}
