use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use expenseflow_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Open a pool for the `[database]` config section. Foreign keys are enforced
/// and the journal runs in WAL mode; the busy handler and the pool acquire
/// timeout share `timeout_secs` so lock waits and pool waits give up on the
/// same horizon.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let timeout = Duration::from_secs(config.timeout_secs.max(1));
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(timeout);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(timeout)
        .connect_with(options)
        .await
}

#[cfg(test)]
mod tests {
    use expenseflow_core::config::DatabaseConfig;

    use super::connect;

    #[tokio::test]
    async fn connection_settings_follow_the_config() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            timeout_secs: 7,
        };
        let pool = connect(&config).await.expect("connect");

        let (foreign_keys,): (i64,) =
            sqlx::query_as("PRAGMA foreign_keys").fetch_one(&pool).await.expect("pragma");
        assert_eq!(foreign_keys, 1, "foreign keys must be enforced");

        let (busy_timeout,): (i64,) =
            sqlx::query_as("PRAGMA busy_timeout").fetch_one(&pool).await.expect("pragma");
        assert_eq!(busy_timeout, 7_000, "busy timeout should come from timeout_secs");
    }
}
