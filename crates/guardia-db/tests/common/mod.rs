//! Shared setup for the in-memory SurrealDB tests.

#![allow(dead_code)]

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

/// Fresh in-memory database with the schema applied.
pub async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    guardia_db::run_migrations(&db).await.unwrap();
    db
}
