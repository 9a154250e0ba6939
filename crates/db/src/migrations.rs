use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Number of migration versions recorded as applied. A database the migrator
/// has never touched has no bookkeeping table yet and counts as zero.
pub async fn applied_count(pool: &DbPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use expenseflow_core::config::DatabaseConfig;

    use super::{applied_count, run_pending};
    use crate::migrations::MIGRATOR;
    use crate::{connect, DbPool};

    const MANAGED_TABLES: &[&str] = &["approval_rule", "app_user", "expense", "approval_record"];

    async fn setup() -> DbPool {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            timeout_secs: 30,
        };
        connect(&config).await.expect("connect")
    }

    #[tokio::test]
    async fn migrations_create_baseline_tables() {
        let pool = setup().await;
        run_pending(&pool).await.expect("run migrations");

        for table in MANAGED_TABLES {
            let count = sqlx::query(
                "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?1",
            )
            .bind(table)
            .fetch_one(&pool)
            .await
            .expect("check table")
            .get::<i64, _>("count");
            assert_eq!(count, 1, "table `{table}` should exist after migration");
        }
    }

    #[tokio::test]
    async fn migrations_are_reversible() {
        let pool = setup().await;
        run_pending(&pool).await.expect("run migrations");

        MIGRATOR.undo(&pool, 0).await.expect("undo migrations");

        for table in MANAGED_TABLES {
            let count = sqlx::query(
                "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?1",
            )
            .bind(table)
            .fetch_one(&pool)
            .await
            .expect("check table removed")
            .get::<i64, _>("count");
            assert_eq!(count, 0, "table `{table}` should be gone after undo");
        }
    }

    #[tokio::test]
    async fn applied_count_tracks_the_migration_run() {
        let pool = setup().await;
        assert_eq!(applied_count(&pool).await, 0, "fresh database has no applied versions");

        run_pending(&pool).await.expect("run migrations");
        assert_eq!(applied_count(&pool).await, 1);
    }
}
