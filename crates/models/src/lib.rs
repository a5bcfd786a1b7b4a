pub mod errors;
pub mod db;
pub mod managed;
pub mod validate;
pub mod customer;
pub mod project;
pub mod appointment;
pub mod service_item;
pub mod request;
pub mod note;
pub mod audit_log;

pub use managed::ManagedEntity;

#[cfg(test)]
mod tests;
