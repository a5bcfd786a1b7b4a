//! Cross-crate building blocks shared by the models, service and binary crates.

pub mod pagination;
pub mod utils;
