use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

pub const MAX_DESCRIPTION_CHARS: usize = 500;

const ITEM_COLUMNS: &str = "i.id, i.name, i.description, i.image_url, i.category_id, c.name AS category_name";

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
}

/// Payload after validation.
#[derive(Debug)]
pub struct ValidItem {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
}

impl ItemPayload {
    pub fn validate(self) -> Result<ValidItem, AppError> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::Validation("Name is required".into()))?;

        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_CHARS {
                return Err(AppError::Validation(format!(
                    "Description must be at most {} characters",
                    MAX_DESCRIPTION_CHARS
                )));
            }
        }

        Ok(ValidItem {
            name,
            description: self.description,
            image_url: self.image_url,
            category_id: self.category_id,
        })
    }
}

impl Item {
    pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<Item>, sqlx::Error> {
        sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items i \
             LEFT JOIN categories c ON c.id = i.category_id \
             WHERE i.user_id = $1 ORDER BY i.id"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find(pool: &PgPool, user_id: Uuid, id: i64) -> Result<Option<Item>, sqlx::Error> {
        sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items i \
             LEFT JOIN categories c ON c.id = i.category_id \
             WHERE i.user_id = $1 AND i.id = $2"
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, user_id: Uuid, item: ValidItem) -> Result<Item, sqlx::Error> {
        sqlx::query_as::<_, Item>(&format!(
            "WITH i AS ( \
                 INSERT INTO items (name, description, image_url, category_id, user_id) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING * \
             ) \
             SELECT {ITEM_COLUMNS} FROM i LEFT JOIN categories c ON c.id = i.category_id"
        ))
        .bind(item.name)
        .bind(item.description)
        .bind(item.image_url)
        .bind(item.category_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: i64,
        item: ValidItem,
    ) -> Result<Option<Item>, sqlx::Error> {
        sqlx::query_as::<_, Item>(&format!(
            "WITH i AS ( \
                 UPDATE items SET name = $1, description = $2, image_url = $3, category_id = $4 \
                 WHERE id = $5 AND user_id = $6 RETURNING * \
             ) \
             SELECT {ITEM_COLUMNS} FROM i LEFT JOIN categories c ON c.id = i.category_id"
        ))
        .bind(item.name)
        .bind(item.description)
        .bind(item.image_url)
        .bind(item.category_id)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Returns whether a row was removed.
    pub async fn delete(pool: &PgPool, user_id: Uuid, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
