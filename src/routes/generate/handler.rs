use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
};

use crate::{
    AppState,
    error::AppError,
    infrastructure::{AuthUser, GenerationRequest},
};

use super::model::{GenerateRequest, GenerateResponse, GenerationMethod, UserCatalog, parse_model_output};
use super::prompt::system_instruction;

#[axum::debug_handler]
pub async fn generate_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(method): Path<String>,
    multipart: Multipart,
) -> Result<Json<GenerateResponse>, AppError> {
    let method: GenerationMethod = method.parse()?;
    let mut input = GenerateRequest::from_multipart(multipart).await?.validate(method)?;

    if let Some(url) = input.page_url.as_deref() {
        let content = state.pages.read_text(url).await?;
        input.prompt = format!("Page content:{}", content);
    }

    let catalog = UserCatalog::load(&state.pool, user.id).await?;
    let request = GenerationRequest {
        system_instruction: system_instruction(method),
        prompt: format!("{}\n{}", catalog.context(), input.prompt),
        image: input.image,
    };

    let raw = state.generator.generate(request).await?;
    let generated = parse_model_output(&raw)?;

    let mut tx = state.pool.begin().await?;
    let new_list_id = catalog.persist(&mut tx, user.id, &generated).await?;
    tx.commit().await?;

    tracing::info!(
        user_id = %user.id,
        ?method,
        categories = generated.new_categories.len(),
        items = generated.new_items.len(),
        list_items = generated.new_list_items.len(),
        ?new_list_id,
        "List generated"
    );

    Ok(Json(GenerateResponse {
        success: true,
        message: generated.summary(),
        new_list_id,
    }))
}
