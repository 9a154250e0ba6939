use crate::commands::CommandResult;
use expenseflow_core::config::{AppConfig, LoadOptions};
use expenseflow_db::repositories::{RuleRepository, SqlRuleRepository};
use expenseflow_db::{connect, migrations, seed_reference_data, SeedReport};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
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
                "seed",
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

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let report = seed_reference_data(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;

        // Read the rule table back: a count drift means the seed did not
        // land the way it reported.
        let stored_rules = SqlRuleRepository::new(pool.clone())
            .count()
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 7u8))?;
        if stored_rules as usize != report.rules_seeded {
            return Err((
                "seed_verification",
                format!(
                    "rule table holds {stored_rules} rows, expected {}",
                    report.rules_seeded
                ),
                7u8,
            ));
        }

        pool.close().await;
        Ok::<SeedReport, (&'static str, String, u8)>(report)
    });

    match result {
        Ok(report) => CommandResult::success(
            "seed",
            format!(
                "seeded {} approval rules; created {} approver identities",
                report.rules_seeded, report.approvers_created
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
