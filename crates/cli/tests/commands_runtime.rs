use std::env;
use std::sync::{Mutex, OnceLock};

use expenseflow_cli::commands::{migrate, seed, smoke};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("EXPENSEFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");

        // A fresh in-memory database applies the full migration set.
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("applied 1 migration(s), 1 total"));
    });
}

#[test]
fn migrate_returns_config_failure_with_non_sqlite_url() {
    with_env(&[("EXPENSEFLOW_DATABASE_URL", "postgres://localhost/expenses")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_returns_rule_and_approver_counts() {
    with_env(&[("EXPENSEFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected successful seed run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("seeded 6 approval rules"));
        assert!(message.contains("created 5 approver identities"));
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    // Each run opens a fresh in-memory database, so the second run re-seeds
    // from scratch and must report the same counts as the first.
    with_env(&[("EXPENSEFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");

        let first_payload = parse_payload(&first.output);
        let second_payload = parse_payload(&second.output);
        assert_eq!(first_payload["message"], second_payload["message"]);
    });
}

#[test]
fn smoke_returns_success_report_with_valid_env() {
    with_env(&[("EXPENSEFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let result = smoke::run();
        assert_eq!(result.exit_code, 0, "expected successful smoke report");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "pass");

        let checks = payload["checks"].as_array().expect("checks array");
        let names: Vec<&str> =
            checks.iter().filter_map(|check| check["name"].as_str()).collect();
        assert_eq!(
            names,
            vec!["config_validation", "workflow_resolution", "db_connectivity", "migration_visibility"]
        );
    });
}

#[test]
fn smoke_returns_failure_when_config_invalid() {
    with_env(&[("EXPENSEFLOW_DATABASE_URL", "postgres://localhost/expenses")], || {
        let result = smoke::run();
        assert_eq!(result.exit_code, 6, "expected smoke failure code");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "fail");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn last_line(output: &str) -> &str {
    output.lines().last().unwrap_or_default()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "EXPENSEFLOW_DATABASE_URL",
        "EXPENSEFLOW_DATABASE_MAX_CONNECTIONS",
        "EXPENSEFLOW_DATABASE_TIMEOUT_SECS",
        "EXPENSEFLOW_LEVEL_COMPLETION",
        "EXPENSEFLOW_LOG_LEVEL",
        "EXPENSEFLOW_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
