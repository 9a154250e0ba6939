use sqlx::Row;

use expenseflow_core::domain::user::{Role, User, UserId};

use super::{RepositoryError, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub fn role_as_str(role: Role) -> &'static str {
    match role {
        Role::Submitter => "submitter",
        Role::Approver => "approver",
        Role::Admin => "admin",
    }
}

fn parse_role(raw: &str) -> Result<Role, RepositoryError> {
    match raw {
        "submitter" => Ok(Role::Submitter),
        "approver" => Ok(Role::Approver),
        "admin" => Ok(Role::Admin),
        other => Err(RepositoryError::Decode(format!("unknown role `{other}`"))),
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, RepositoryError> {
    let role: String = row.try_get("role").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(User {
        id: UserId(row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?),
        email: row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        display_name: row
            .try_get("display_name")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        role: parse_role(&role)?,
    })
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, email, display_name, role FROM app_user WHERE email = ?1 COLLATE NOCASE",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref row) => Ok(Some(row_to_user(row)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO app_user (id, email, display_name, role) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&user.id.0)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(role_as_str(user.role))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_role(&self, email: &str, role: Role) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE app_user SET role = ?2 WHERE email = ?1 COLLATE NOCASE")
            .bind(email.trim())
            .bind(role_as_str(role))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> =
            sqlx::query("SELECT id, email, display_name, role FROM app_user ORDER BY email ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_user).collect()
    }
}
