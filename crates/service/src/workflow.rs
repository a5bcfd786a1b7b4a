//! Status transition rules, driven by each entity's `next_statuses` table.

use models::ManagedEntity;

use crate::errors::ServiceError;

pub fn ensure_known<E: ManagedEntity>(status: &str) -> Result<(), ServiceError> {
    if !E::is_known_status(status) {
        return Err(ServiceError::validation(format!(
            "unknown {} status '{status}', expected one of: {}",
            E::KIND,
            E::STATUSES.join(", ")
        )));
    }
    Ok(())
}

pub fn ensure_transition<E: ManagedEntity>(from: &str, to: &str) -> Result<(), ServiceError> {
    ensure_known::<E>(to)?;
    if from == to {
        return Err(ServiceError::validation(format!("{} is already {to}", E::KIND)));
    }
    if !E::next_statuses(from).contains(&to) {
        return Err(ServiceError::validation(format!("{} cannot move from {from} to {to}", E::KIND)));
    }
    Ok(())
}

/// Archiving skips the transition table but never rewrites a final state.
pub fn ensure_archivable<E: ManagedEntity>(from: &str) -> Result<(), ServiceError> {
    if from == E::ARCHIVED_STATUS {
        return Err(ServiceError::validation(format!("{} is already {from}", E::KIND)));
    }
    if E::is_terminal(from) {
        return Err(ServiceError::validation(format!("{} is {from} and can no longer be archived", E::KIND)));
    }
    Ok(())
}
