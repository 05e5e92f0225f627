use crate::api::ApiError;
use crate::AppState;
use autofuturo_types::{ToolContext, ToolDefinition};
use axum::{
    extract::{rejection::JsonRejection, Path},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct InvokeToolRequest {
    #[serde(default)]
    pub arguments: Value,
    #[serde(flatten)]
    pub context: ToolContext,
}

/// Handler for `GET /api/tools`.
pub async fn list_tools_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<Vec<ToolDefinition>> {
    Json(state.tools.definitions())
}

/// Handler for `POST /api/tools/{name}`.
///
/// Returns the tool output as plain text, the same text the LLM receives.
pub async fn invoke_tool_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
    payload: Result<Json<InvokeToolRequest>, JsonRejection>,
) -> Result<String, ApiError> {
    let Json(request) = payload?;
    let output = state
        .tools
        .invoke(&name, &request.context, &request.arguments)
        .await?;
    Ok(output)
}
