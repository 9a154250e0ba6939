use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::Row;

use expenseflow_core::domain::rule::{ApprovalRule, RuleCurrency};

use super::{RepositoryError, RuleRepository};
use crate::DbPool;

pub struct SqlRuleRepository {
    pool: DbPool,
}

impl SqlRuleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_rule(row: &sqlx::sqlite::SqliteRow) -> Result<ApprovalRule, RepositoryError> {
    let amount_min: String =
        row.try_get("amount_min").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let amount_max: String =
        row.try_get("amount_max").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let currency: String =
        row.try_get("currency").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let level: i64 = row.try_get("level").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(ApprovalRule {
        department: row
            .try_get("department")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        amount_min: parse_decimal(&amount_min)?,
        amount_max: parse_decimal(&amount_max)?,
        currency: RuleCurrency::parse(&currency),
        level: level as u32,
        recipient: row
            .try_get("recipient")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
    })
}

fn parse_decimal(raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw)
        .map_err(|error| RepositoryError::Decode(format!("bad decimal `{raw}`: {error}")))
}

#[async_trait::async_trait]
impl RuleRepository for SqlRuleRepository {
    async fn matching(
        &self,
        department: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<Vec<ApprovalRule>, RepositoryError> {
        // Department narrows the scan in SQL; amount/currency match in Rust
        // because amounts are stored as decimal text.
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT department, amount_min, amount_max, currency, level, recipient
             FROM approval_rule WHERE department = ?1 COLLATE NOCASE
             ORDER BY level ASC, recipient ASC",
        )
        .bind(department.trim())
        .fetch_all(&self.pool)
        .await?;

        let rules = rows.iter().map(row_to_rule).collect::<Result<Vec<_>, _>>()?;
        Ok(rules
            .into_iter()
            .filter(|rule| rule.matches(department, amount, currency))
            .collect())
    }

    async fn replace_all(&self, rules: &[ApprovalRule]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM approval_rule").execute(&mut *tx).await?;
        for rule in rules {
            sqlx::query(
                "INSERT INTO approval_rule (department, amount_min, amount_max, currency, level, recipient)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&rule.department)
            .bind(rule.amount_min.to_string())
            .bind(rule.amount_max.to_string())
            .bind(rule.currency.as_str())
            .bind(rule.level as i64)
            .bind(&rule.recipient)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM approval_rule").fetch_one(&self.pool).await?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use expenseflow_core::config::DatabaseConfig;
    use expenseflow_core::domain::rule::{ApprovalRule, RuleCurrency};

    use super::SqlRuleRepository;
    use crate::repositories::RuleRepository;
    use crate::{connect, migrations};

    async fn setup() -> SqlRuleRepository {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            timeout_secs: 30,
        };
        let pool = connect(&config).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlRuleRepository::new(pool)
    }

    fn rules() -> Vec<ApprovalRule> {
        vec![
            ApprovalRule {
                department: "Logistics".to_string(),
                amount_min: Decimal::ZERO,
                amount_max: Decimal::new(1_000_000, 0),
                currency: RuleCurrency::Any,
                level: 1,
                recipient: "logistics.lead@example.com".to_string(),
            },
            ApprovalRule {
                department: "Logistics".to_string(),
                amount_min: Decimal::new(1000, 0),
                amount_max: Decimal::new(1_000_000, 0),
                currency: RuleCurrency::Any,
                level: 2,
                recipient: "controller@example.com".to_string(),
            },
            ApprovalRule {
                department: "HR".to_string(),
                amount_min: Decimal::ZERO,
                amount_max: Decimal::new(1_000_000, 0),
                currency: RuleCurrency::Code("USD".to_string()),
                level: 1,
                recipient: "hr.lead@example.com".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn matching_filters_by_department_amount_and_currency() {
        let repo = setup().await;
        repo.replace_all(&rules()).await.expect("seed rules");

        let matched = repo
            .matching("Logistics", Decimal::new(2500, 0), "USD")
            .await
            .expect("matching");
        assert_eq!(matched.len(), 2);

        let matched = repo
            .matching("Logistics", Decimal::new(500, 0), "USD")
            .await
            .expect("matching");
        assert_eq!(matched.len(), 1);

        let matched =
            repo.matching("HR", Decimal::new(500, 0), "EUR").await.expect("matching");
        assert!(matched.is_empty(), "currency-specific rule must not match EUR");
    }

    #[tokio::test]
    async fn replace_all_is_idempotent() {
        let repo = setup().await;
        repo.replace_all(&rules()).await.expect("first seed");
        repo.replace_all(&rules()).await.expect("second seed");

        assert_eq!(repo.count().await.expect("count"), 3);
    }
}
