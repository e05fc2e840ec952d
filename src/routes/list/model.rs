use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

const DEFAULT_LIST_NAME: &str = "New List";

const LIST_COLUMNS: &str = "id, name, completed, created_at, updated_at";

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ShoppingList {
    pub id: i64,
    pub name: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateListRequest {
    pub name: Option<String>,
    pub completed: Option<bool>,
}

impl UpdateListRequest {
    pub fn validate(self) -> Result<Self, AppError> {
        if self.name.is_none() && self.completed.is_none() {
            return Err(AppError::Validation(
                "Name or completed is required".into(),
            ));
        }
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::Validation("Name must not be empty".into()));
        }
        Ok(Self {
            name: self.name.map(|n| n.trim().to_string()),
            completed: self.completed,
        })
    }
}

/// Name for a freshly created list: `New List (n)` with `n` one past the
/// highest counter already in use.
pub fn next_list_name<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
    let highest = existing
        .into_iter()
        .filter_map(|name| {
            name.strip_prefix(DEFAULT_LIST_NAME)?
                .trim()
                .strip_prefix('(')?
                .strip_suffix(')')?
                .parse::<u32>()
                .ok()
        })
        .max()
        .unwrap_or(0);

    format!("{} ({})", DEFAULT_LIST_NAME, highest.saturating_add(1))
}

impl ShoppingList {
    pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<ShoppingList>, sqlx::Error> {
        sqlx::query_as::<_, ShoppingList>(&format!(
            "SELECT {LIST_COLUMNS} FROM lists WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create_default(pool: &PgPool, user_id: Uuid) -> Result<ShoppingList, sqlx::Error> {
        let existing: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM lists WHERE user_id = $1 AND name LIKE 'New List (%)'",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let name = next_list_name(existing.iter().map(String::as_str));

        sqlx::query_as::<_, ShoppingList>(&format!(
            "INSERT INTO lists (name, user_id) VALUES ($1, $2) RETURNING {LIST_COLUMNS}"
        ))
        .bind(name)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: i64,
        req: UpdateListRequest,
    ) -> Result<Option<ShoppingList>, sqlx::Error> {
        sqlx::query_as::<_, ShoppingList>(&format!(
            "UPDATE lists SET name = COALESCE($1, name), completed = COALESCE($2, completed), \
             updated_at = now() WHERE id = $3 AND user_id = $4 RETURNING {LIST_COLUMNS}"
        ))
        .bind(req.name)
        .bind(req.completed)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM lists WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
