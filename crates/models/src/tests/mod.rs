/// Entity round trips against a migrated in-memory SQLite database
pub mod entity_tests;

/// Input validation and status metadata, no database needed
pub mod input_tests;
