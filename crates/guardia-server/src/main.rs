//! guardia bootstrap: structured logging, schema migrations and
//! built-in role seeding.

use std::process::ExitCode;
use std::sync::Arc;

use guardia_auth::{AuthConfig, PermissionCatalog, RoleSeeder};
use guardia_core::error::{GuardiaError, GuardiaResult};
use guardia_db::repository::SurrealRoleRepository;
use guardia_db::{DbConfig, DbError, DbManager};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("guardia=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "guardia bootstrap failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> GuardiaResult<()> {
    info!("Starting guardia");

    let auth_config = AuthConfig::from_env()?;
    let db_config = DbConfig::from_env()?;

    let db = DbManager::connect(&db_config)
        .await
        .map_err(|e| GuardiaError::from(DbError::from(e)))?;

    let applied = guardia_db::run_migrations(db.client()).await?;
    info!(applied, "Schema ready");

    let catalog = Arc::new(PermissionCatalog::builtin().clone());
    let report = RoleSeeder::new(SurrealRoleRepository::new(db.client().clone()), catalog)
        .seed()
        .await?;

    info!(
        created = ?report.created,
        updated = ?report.updated,
        skipped = ?report.skipped,
        dropped = report.dropped_permissions.len(),
        super_role = %auth_config.super_role,
        session_lifetime_secs = auth_config.session_lifetime_secs,
        "Built-in roles provisioned"
    );

    Ok(())
}
