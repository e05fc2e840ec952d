use std::collections::BTreeMap;
use std::str::FromStr;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use crate::infrastructure::InlineImage;

use super::prompt::BAD_PROMPT;

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";
const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMethod {
    Prompt,
    /// Ingredients read from a recipe page.
    Url,
    Image,
}

impl FromStr for GenerationMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prompt" => Ok(Self::Prompt),
            "url" => Ok(Self::Url),
            "image" => Ok(Self::Image),
            _ => Err(AppError::Validation("Invalid method".into())),
        }
    }
}

#[derive(Debug)]
pub struct ImageUpload {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    fn into_inline(self) -> InlineImage {
        InlineImage {
            mime_type: self
                .content_type
                .filter(|mime| mime.starts_with("image/"))
                .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
            data: STANDARD.encode(&self.bytes),
        }
    }
}

/// Fields of the `multipart/form-data` generation form.
#[derive(Debug, Default)]
pub struct GenerateRequest {
    pub prompt: String,
    pub url: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Validated generation input.
#[derive(Debug)]
pub struct GenerationInput {
    pub prompt: String,
    pub image: Option<InlineImage>,
    /// Page to read the list from, `url` method only.
    pub page_url: Option<String>,
}

fn invalid_form(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid form data: {}", e.body_text()))
}

fn validation(message: &str) -> AppError {
    AppError::Validation(message.to_string())
}

impl GenerateRequest {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut req = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "prompt" => req.prompt = field.text().await.map_err(invalid_form)?,
                "url" => req.url = Some(field.text().await.map_err(invalid_form)?),
                "image" => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(invalid_form)?;
                    req.image = Some(ImageUpload {
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                // `method` duplicates the path segment.
                _ => {}
            }
        }
        Ok(req)
    }

    pub fn validate(self, method: GenerationMethod) -> Result<GenerationInput, AppError> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(validation("Empty prompt"));
        }

        match method {
            GenerationMethod::Prompt => Ok(GenerationInput {
                prompt,
                image: None,
                page_url: None,
            }),
            GenerationMethod::Image => {
                let image = self
                    .image
                    .filter(|upload| !upload.bytes.is_empty())
                    .map(ImageUpload::into_inline)
                    .ok_or_else(|| validation("Image is required"))?;
                Ok(GenerationInput {
                    prompt: "Image".to_string(),
                    image: Some(image),
                    page_url: None,
                })
            }
            GenerationMethod::Url => {
                let raw = self
                    .url
                    .map(|url| url.trim().to_string())
                    .filter(|url| !url.is_empty())
                    .ok_or_else(|| validation("URL is required"))?;
                let url = reqwest::Url::parse(&raw).map_err(|_| validation("URL is invalid"))?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(validation("URL is invalid"));
                }
                Ok(GenerationInput {
                    prompt,
                    image: None,
                    page_url: Some(url.to_string()),
                })
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeneratedItem {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedListItem {
    pub name: String,
    pub category: String,
    pub quantity: f64,
}

impl GeneratedListItem {
    pub fn quantity(&self) -> i32 {
        self.quantity.round().clamp(1.0, i32::MAX as f64) as i32
    }

    fn category_name(&self) -> Option<&str> {
        Some(self.category.as_str()).filter(|c| *c != UNCATEGORIZED)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedList {
    pub new_categories: Vec<String>,
    pub new_items: Vec<GeneratedItem>,
    pub new_list_name: String,
    pub new_list_items: Vec<GeneratedListItem>,
}

impl GeneratedList {
    pub fn summary(&self) -> &'static str {
        if self.new_list_items.len() < self.new_items.len() {
            "List length mismatch, please double-check for accuracy"
        } else {
            "List generated successfully"
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub message: &'static str,
    pub new_list_id: Option<i64>,
}

fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if text.starts_with("```") {
        text = text.split_once('\n').map_or("", |(_, rest)| rest);
    }
    text.trim_end().strip_suffix("```").unwrap_or(text).trim()
}

/// Parses the model's text into a list, rejecting refusals and malformed output.
pub fn parse_model_output(raw: &str) -> Result<GeneratedList, AppError> {
    let text = strip_code_fence(raw);
    if text == BAD_PROMPT {
        return Err(AppError::InvalidPrompt);
    }

    let list: GeneratedList = serde_json::from_str(text).map_err(|e| {
        tracing::warn!("Unparsable generation output: {}", e);
        AppError::Generation("Invalid response structure".into())
    })?;

    if list.new_list_items.iter().any(|item| item.name == BAD_PROMPT) {
        return Err(AppError::InvalidPrompt);
    }
    if list
        .new_list_items
        .iter()
        .any(|item| item.name.trim().is_empty() || item.category.trim().is_empty())
    {
        return Err(AppError::Generation("Invalid list items structure".into()));
    }

    Ok(list)
}

/// The user's existing item and category names with their ids.
#[derive(Debug, Default)]
pub struct UserCatalog {
    items: BTreeMap<String, i64>,
    categories: BTreeMap<String, i64>,
}

impl UserCatalog {
    pub async fn load(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        let items: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM items WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(pool)
                .await?;
        let categories: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM categories WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(pool)
                .await?;

        Ok(Self {
            items: items.into_iter().map(|(id, name)| (name, id)).collect(),
            categories: categories.into_iter().map(|(id, name)| (name, id)).collect(),
        })
    }

    /// JSON prepended to the prompt so the model can reuse existing names.
    pub fn context(&self) -> String {
        json!({
            "items": self.items.keys().collect::<Vec<_>>(),
            "categories": self.categories.keys().collect::<Vec<_>>(),
        })
        .to_string()
    }

    /// Writes the generated categories, items and list. Returns the new
    /// list's id when one was created.
    pub async fn persist(
        mut self,
        conn: &mut PgConnection,
        user_id: Uuid,
        generated: &GeneratedList,
    ) -> Result<Option<i64>, sqlx::Error> {
        for name in &generated.new_categories {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO categories (name, user_id) VALUES ($1, $2) RETURNING id",
            )
            .bind(name)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;
            self.categories.insert(name.clone(), id);
        }

        for item in &generated.new_items {
            let category_id = item
                .category
                .as_ref()
                .and_then(|c| self.categories.get(c))
                .copied();
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO items (name, category_id, user_id) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(&item.name)
            .bind(category_id)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;
            self.items.insert(item.name.clone(), id);
        }

        let list_name = generated.new_list_name.trim();
        if list_name.is_empty() || generated.new_list_items.is_empty() {
            return Ok(None);
        }

        let list_id: i64 =
            sqlx::query_scalar("INSERT INTO lists (name, user_id) VALUES ($1, $2) RETURNING id")
                .bind(list_name)
                .bind(user_id)
                .fetch_one(&mut *conn)
                .await?;

        for entry in &generated.new_list_items {
            sqlx::query(
                "INSERT INTO list_items (list_id, item_id, name, quantity, category_name, user_id) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(list_id)
            .bind(self.items.get(&entry.name).copied())
            .bind(&entry.name)
            .bind(entry.quantity())
            .bind(entry.category_name())
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        }

        Ok(Some(list_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "newCategories": ["Pasta"],
        "newItems": [{"name": "Spaghetti (500g)", "category": "Pasta"}],
        "newListName": "Carbonara",
        "newListItems": [
            {"name": "Spaghetti (500g)", "category": "Pasta", "quantity": 1},
            {"name": "Eggs", "category": "Dairy", "quantity": 3.6}
        ]
    }"#;

    #[test]
    fn fenced_output_is_parsed() {
        let raw = format!("```json\n{}\n```", SAMPLE);
        let list = parse_model_output(&raw).unwrap();
        assert_eq!(list.new_list_name, "Carbonara");
        assert_eq!(list.new_list_items.len(), 2);
        assert_eq!(list.new_list_items[1].quantity(), 4);
        assert_eq!(list.summary(), "List generated successfully");
    }

    #[test]
    fn refusal_is_an_invalid_prompt() {
        assert!(matches!(
            parse_model_output("Error: bad prompt\n"),
            Err(AppError::InvalidPrompt)
        ));
        assert!(matches!(
            parse_model_output("```\nError: bad prompt\n```"),
            Err(AppError::InvalidPrompt)
        ));

        let smuggled = r#"{"newCategories":[],"newItems":[],"newListName":"x",
            "newListItems":[{"name":"Error: bad prompt","category":"x","quantity":1}]}"#;
        assert!(matches!(parse_model_output(smuggled), Err(AppError::InvalidPrompt)));
    }

    #[test]
    fn malformed_output_is_a_generation_error() {
        assert!(matches!(
            parse_model_output("here is your list!"),
            Err(AppError::Generation(_))
        ));
        assert!(matches!(
            parse_model_output(r#"{"newCategories": []}"#),
            Err(AppError::Generation(_))
        ));

        let blank_category = r#"{"newCategories":[],"newItems":[],"newListName":"x",
            "newListItems":[{"name":"Milk","category":" ","quantity":1}]}"#;
        assert!(matches!(
            parse_model_output(blank_category),
            Err(AppError::Generation(_))
        ));
    }

    #[test]
    fn fewer_list_entries_than_items_is_flagged() {
        let raw = r#"{"newCategories":[],"newItems":[{"name":"A"},{"name":"B"}],
            "newListName":"x","newListItems":[{"name":"A","category":"c","quantity":0}]}"#;
        let list = parse_model_output(raw).unwrap();
        assert_eq!(list.new_list_items[0].quantity(), 1);
        assert_eq!(
            list.summary(),
            "List length mismatch, please double-check for accuracy"
        );
    }

    #[test]
    fn uncategorized_entries_have_no_category() {
        let entry = GeneratedListItem {
            name: "Water".into(),
            category: UNCATEGORIZED.into(),
            quantity: 2.0,
        };
        assert_eq!(entry.category_name(), None);
    }

    #[test]
    fn method_is_parsed_from_path() {
        assert_eq!("prompt".parse::<GenerationMethod>().unwrap(), GenerationMethod::Prompt);
        assert_eq!("image".parse::<GenerationMethod>().unwrap(), GenerationMethod::Image);
        assert!(matches!(
            "recipe".parse::<GenerationMethod>(),
            Err(AppError::Validation(_))
        ));
    }

    fn is_validation(result: Result<GenerationInput, AppError>, expected: &str) -> bool {
        matches!(result, Err(AppError::Validation(message)) if message == expected)
    }

    #[test]
    fn method_accepts_url() {
        assert_eq!("url".parse::<GenerationMethod>().unwrap(), GenerationMethod::Url);
    }

    #[test]
    fn image_method_requires_an_image() {
        let req = GenerateRequest {
            prompt: "groceries".into(),
            ..GenerateRequest::default()
        };
        assert!(is_validation(req.validate(GenerationMethod::Image), "Image is required"));

        let empty_upload = GenerateRequest {
            prompt: "groceries".into(),
            image: Some(ImageUpload {
                content_type: Some("image/png".into()),
                bytes: Vec::new(),
            }),
            ..GenerateRequest::default()
        };
        assert!(is_validation(
            empty_upload.validate(GenerationMethod::Image),
            "Image is required"
        ));

        let blank = GenerateRequest {
            prompt: "  ".into(),
            ..GenerateRequest::default()
        };
        assert!(is_validation(blank.validate(GenerationMethod::Prompt), "Empty prompt"));
    }

    #[test]
    fn uploaded_image_is_base64_encoded() {
        let req = GenerateRequest {
            prompt: "fridge".into(),
            image: Some(ImageUpload {
                content_type: Some("image/png".into()),
                bytes: b"hello".to_vec(),
            }),
            ..GenerateRequest::default()
        };
        let input = req.validate(GenerationMethod::Image).unwrap();
        let image = input.image.unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "aGVsbG8=");
        assert_eq!(input.prompt, "Image");

        let untyped = GenerateRequest {
            prompt: "fridge".into(),
            image: Some(ImageUpload {
                content_type: Some("application/octet-stream".into()),
                bytes: b"hello".to_vec(),
            }),
            ..GenerateRequest::default()
        };
        let image = untyped.validate(GenerationMethod::Image).unwrap().image.unwrap();
        assert_eq!(image.mime_type, DEFAULT_IMAGE_MIME);
    }

    #[test]
    fn url_method_requires_a_web_url() {
        let missing = GenerateRequest {
            prompt: "dinner".into(),
            ..GenerateRequest::default()
        };
        assert!(is_validation(missing.validate(GenerationMethod::Url), "URL is required"));

        let not_web = GenerateRequest {
            prompt: "dinner".into(),
            url: Some("ftp://example.com/recipe".into()),
            ..GenerateRequest::default()
        };
        assert!(is_validation(not_web.validate(GenerationMethod::Url), "URL is invalid"));

        let recipe = GenerateRequest {
            prompt: "dinner".into(),
            url: Some(" https://example.com/pasta ".into()),
            ..GenerateRequest::default()
        };
        let input = recipe.validate(GenerationMethod::Url).unwrap();
        assert_eq!(input.page_url.as_deref(), Some("https://example.com/pasta"));
        assert!(input.image.is_none());
    }

    #[test]
    fn context_lists_names_in_order() {
        let catalog = UserCatalog {
            items: BTreeMap::from([("Milk".to_string(), 2), ("Bread".to_string(), 1)]),
            categories: BTreeMap::from([("Dairy".to_string(), 5)]),
        };
        let context: serde_json::Value = serde_json::from_str(&catalog.context()).unwrap();
        assert_eq!(context["items"], json!(["Bread", "Milk"]));
        assert_eq!(context["categories"], json!(["Dairy"]));
    }
}
