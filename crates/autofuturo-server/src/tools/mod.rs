//! Function tools exposed to the LLM runtime.
//!
//! Each tool returns plain text that is fed back to the model. Failures
//! inside a tool never escape as errors; they become a message the model can
//! relay to the caller. Only lookup and argument validation fail at this
//! level.

mod end_call;
mod knowledge;
mod transfer;

pub use end_call::{EndCallTool, PendingHangups};
pub use knowledge::KnowledgeSearchTool;
pub use transfer::TransferCallTool;

use async_trait::async_trait;
use autofuturo_types::{ToolContext, ToolDefinition};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn definition(&self) -> ToolDefinition;

    /// Runs the tool. `args` has already been validated against
    /// [`Tool::definition`].
    async fn call(&self, ctx: &ToolContext, args: &Value) -> String;
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

/// Checks `args` against the `required` list and string-typed properties of
/// the definition's schema.
pub fn validate_args(definition: &ToolDefinition, args: &Value) -> Result<(), String> {
    let params = &definition.parameters;
    if !args.is_object() && !args.is_null() {
        return Err("arguments must be a JSON object".to_string());
    }

    if let Some(required) = params.get("required").and_then(Value::as_array) {
        for key in required.iter().filter_map(Value::as_str) {
            if matches!(args.get(key), None | Some(Value::Null)) {
                return Err(format!("missing required argument: {key}"));
            }
        }
    }

    if let Some(properties) = params.get("properties").and_then(Value::as_object) {
        for (key, schema) in properties {
            let wants_string = schema.get("type").and_then(Value::as_str) == Some("string");
            if let Some(value) = args.get(key) {
                if wants_string && !value.is_string() && !value.is_null() {
                    return Err(format!("argument {key} must be a string"));
                }
            }
        }
    }
    Ok(())
}

/// Builds the JSON schema of a tool taking only string arguments, all
/// required.
pub(crate) fn string_parameters(params: &[(&str, &str)]) -> Value {
    let properties: serde_json::Map<String, Value> = params
        .iter()
        .map(|(name, description)| {
            (
                name.to_string(),
                serde_json::json!({ "type": "string", "description": description }),
            )
        })
        .collect();
    let required: Vec<&str> = params.iter().map(|(name, _)| *name).collect();
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|t| t.name()))
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool. A tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validates `args` and runs the named tool.
    ///
    /// # Errors
    ///
    /// [`ToolError::UnknownTool`] when nothing is registered under `name`,
    /// [`ToolError::InvalidArguments`] when `args` do not match the schema.
    pub async fn invoke(
        &self,
        name: &str,
        ctx: &ToolContext,
        args: &Value,
    ) -> Result<String, ToolError> {
        let tool = self
            .find(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        validate_args(&tool.definition(), args).map_err(|reason| ToolError::InvalidArguments {
            tool: name.to_string(),
            reason,
        })?;

        tracing::debug!(tool = name, room = ?ctx.room_name, "invoking tool");
        Ok(tool.call(ctx, args).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".into(),
                description: "repite el texto".into(),
                parameters: string_parameters(&[("texto", "texto a repetir")]),
            }
        }

        async fn call(&self, _ctx: &ToolContext, args: &Value) -> String {
            args["texto"].as_str().unwrap_or_default().to_string()
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        registry
    }

    #[test]
    fn string_parameters_marks_every_field_required() {
        let schema = string_parameters(&[("pregunta", "consulta")]);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["pregunta"]["type"], "string");
        assert_eq!(schema["required"], json!(["pregunta"]));
    }

    #[test]
    fn validate_args_rejects_missing_and_mistyped() {
        let def = Echo.definition();
        assert!(validate_args(&def, &json!({})).is_err());
        assert!(validate_args(&def, &json!({"texto": null})).is_err());
        assert!(validate_args(&def, &json!({"texto": 42})).is_err());
        assert!(validate_args(&def, &json!(["hola"])).is_err());
        assert!(validate_args(&def, &json!({"texto": "hola"})).is_ok());
    }

    #[test]
    fn validate_args_accepts_anything_without_schema() {
        let def = ToolDefinition {
            name: "noop".into(),
            description: String::new(),
            parameters: json!({}),
        };
        assert!(validate_args(&def, &json!({})).is_ok());
        assert!(validate_args(&def, &Value::Null).is_ok());
    }

    #[tokio::test]
    async fn invoke_dispatches_by_name() {
        let out = registry()
            .invoke("echo", &ToolContext::default(), &json!({"texto": "hola"}))
            .await
            .unwrap();
        assert_eq!(out, "hola");
    }

    #[tokio::test]
    async fn invoke_rejects_unknown_tool() {
        let err = registry()
            .invoke("nada", &ToolContext::default(), &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "nada"));
    }

    #[tokio::test]
    async fn invoke_rejects_invalid_arguments() {
        let err = registry()
            .invoke("echo", &ToolContext::default(), &json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("texto"));
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = registry();
        registry.register(Arc::new(Echo));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.definitions()[0].name, "echo");
    }
}
