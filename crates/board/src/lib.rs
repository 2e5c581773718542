//! Schema, record models and SQLite store for the task-board fixture dataset.
//!
//! The store is the write-time guardian of the relational contract: foreign
//! keys, uniqueness and cascade rules live in [`database::SCHEMA`].

pub mod database;
pub mod errors;
pub mod models;

pub use database::Database;
pub use errors::StoreError;
pub use models::{DatasetCounts, MembershipRole, Priority, ProjectType, UserFootprint};
