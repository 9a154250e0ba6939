use crate::commands::CommandResult;
use expenseflow_core::config::{AppConfig, LoadOptions};
use expenseflow_db::{connect, migrations};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let already_applied = migrations::applied_count(&pool).await;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        let total_applied = migrations::applied_count(&pool).await;

        pool.close().await;
        Ok::<(i64, i64), (&'static str, String, u8)>((
            total_applied - already_applied,
            total_applied,
        ))
    });

    match result {
        Ok((newly_applied, total_applied)) => CommandResult::success(
            "migrate",
            format!(
                "applied {newly_applied} migration(s), {total_applied} total, on `{}`",
                config.database.url
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
