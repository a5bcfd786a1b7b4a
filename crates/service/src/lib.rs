//! Entity access layer for the back-office: filtering, pagination,
//! audited transactional writes and a TTL cache for derived views.
//! - Entities and input validation live in `models`.
//! - Services add transition rules and cache invalidation on top of the
//!   generic repository.

pub mod audit;
pub mod cache;
pub mod errors;
pub mod filter;
pub mod registry;
pub mod repository;
pub mod services;
pub mod workflow;
#[cfg(test)]
pub mod test_support;

pub use errors::ServiceError;
pub use registry::Services;
