//! SQLite persistence for generated datasets.
//!
//! The [`Seeder`] writes a validated dataset into a store whose schema has
//! already been applied, in a single transaction.

mod seeder;

pub use seeder::{SeedError, Seeder};
