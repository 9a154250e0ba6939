use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use expenseflow_core::config::{AppConfig, ConfigError, LoadOptions};
use expenseflow_core::workflow::WorkflowEngine;
use expenseflow_db::repositories::{
    RepositoryError, SqlApprovalLedgerRepository, SqlExpenseRepository, SqlRuleRepository,
};
use expenseflow_db::{connect, migrations, seed_reference_data, DbPool};
use expenseflow_notify::LogNotifier;

use crate::service::ExpenseService;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub service: Arc<ExpenseService>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("reference data seeding failed: {0}")]
    Seed(#[source] RepositoryError),
}

/// Load config, connect, migrate, seed, and assemble the service. Re-running
/// against an existing database is safe: migrations and seeding are both
/// idempotent.
pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");
    let config = AppConfig::load(options)?;

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let seeded = seed_reference_data(&db_pool).await.map_err(BootstrapError::Seed)?;
    info!(
        event_name = "system.bootstrap.reference_data_seeded",
        rules = seeded.rules_seeded,
        approvers_created = seeded.approvers_created,
        approvers_promoted = seeded.approvers_promoted,
        "reference data seeded"
    );

    let service = Arc::new(ExpenseService::new(
        Arc::new(SqlExpenseRepository::new(db_pool.clone())),
        Arc::new(SqlApprovalLedgerRepository::new(db_pool.clone())),
        Arc::new(SqlRuleRepository::new(db_pool.clone())),
        Arc::new(LogNotifier),
        WorkflowEngine::new(config.workflow.level_completion),
    ));

    Ok(Application { config, db_pool, service })
}
