pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, DbPool};
pub use fixtures::{default_rules, seed_reference_data, SeedReport};
