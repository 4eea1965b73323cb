//! guardia database layer: SurrealDB connection management, schema
//! migrations and the role, account and audit log stores.

mod connection;
mod error;
mod schema;

pub mod repository;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{applied_version, run_migrations, schema_v1};
