use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

const LIST_ITEM_COLUMNS: &str = "id, list_id, item_id, name, quantity, checked, category_name";

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ListItem {
    pub id: i64,
    pub list_id: i64,
    pub item_id: Option<i64>,
    pub name: String,
    pub quantity: i32,
    pub checked: bool,
    pub category_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddListItemRequest {
    pub item_id: Option<i64>,
    pub item_name: Option<String>,
    // Sent in snake case by the client.
    #[serde(rename = "category_name")]
    pub category_name: Option<String>,
    pub list_id: Option<i64>,
}

#[derive(Debug)]
pub struct NewListItem {
    pub item_id: i64,
    pub name: String,
    pub category_name: Option<String>,
    pub list_id: i64,
}

impl AddListItemRequest {
    pub fn validate(self) -> Result<NewListItem, AppError> {
        let name = self.item_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        match (self.item_id, name, self.list_id) {
            (Some(item_id), Some(name), Some(list_id)) => Ok(NewListItem {
                item_id,
                name,
                category_name: self.category_name.filter(|c| !c.trim().is_empty()),
                list_id,
            }),
            _ => Err(AppError::Validation(
                "Item id, name, and list id are required".into(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateListItemRequest {
    pub checked: Option<bool>,
    pub quantity: Option<i32>,
}

impl UpdateListItemRequest {
    pub fn validate(self) -> Result<Self, AppError> {
        if self.checked.is_none() && self.quantity.is_none() {
            return Err(AppError::Validation(
                "Checked or quantity is required".into(),
            ));
        }
        if self.quantity.is_some_and(|q| q < 1) {
            return Err(AppError::Validation("Quantity must be at least 1".into()));
        }
        Ok(self)
    }
}

impl ListItem {
    pub async fn for_list(
        pool: &PgPool,
        user_id: Uuid,
        list_id: i64,
    ) -> Result<Vec<ListItem>, sqlx::Error> {
        sqlx::query_as::<_, ListItem>(&format!(
            "SELECT {LIST_ITEM_COLUMNS} FROM list_items \
             WHERE list_id = $1 AND user_id = $2 ORDER BY id"
        ))
        .bind(list_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Inserts only when the target list belongs to the user.
    pub async fn add(
        pool: &PgPool,
        user_id: Uuid,
        entry: NewListItem,
    ) -> Result<Option<ListItem>, sqlx::Error> {
        sqlx::query_as::<_, ListItem>(&format!(
            "INSERT INTO list_items (list_id, item_id, name, category_name, user_id) \
             SELECT l.id, $2, $3, $4, l.user_id FROM lists l WHERE l.id = $1 AND l.user_id = $5 \
             RETURNING {LIST_ITEM_COLUMNS}"
        ))
        .bind(entry.list_id)
        .bind(entry.item_id)
        .bind(entry.name)
        .bind(entry.category_name)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: i64,
        req: UpdateListItemRequest,
    ) -> Result<Option<ListItem>, sqlx::Error> {
        sqlx::query_as::<_, ListItem>(&format!(
            "UPDATE list_items SET checked = COALESCE($1, checked), quantity = COALESCE($2, quantity) \
             WHERE id = $3 AND user_id = $4 RETURNING {LIST_ITEM_COLUMNS}"
        ))
        .bind(req.checked)
        .bind(req.quantity)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM list_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
