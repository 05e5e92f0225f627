use super::{string_parameters, Tool};
use async_trait::async_trait;
use autofuturo_knowledge::KnowledgeBase;
use autofuturo_types::{ToolContext, ToolDefinition};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub const NAME: &str = "buscar_en_base_de_conocimiento";

const DESCRIPTION: &str = "Usa siempre esta herramienta para obtener información de la base de \
conocimiento y generar una respuesta al usuario. Devuelve referencias numeradas con la \
información encontrada.";

const QUESTION_DESCRIPTION: &str = "Texto en lenguaje natural donde el usuario expresa su \
consulta. Ejemplos: \"¿Tienen financiamiento?\", \"¿Tienen la RAV4?\", \"¿Dónde se encuentra \
la concesionaria?\"";

/// Answers general questions from the dealership's knowledge base.
pub struct KnowledgeSearchTool {
    knowledge: Arc<KnowledgeBase>,
}

impl KnowledgeSearchTool {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }
}

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: NAME.to_string(),
            description: DESCRIPTION.to_string(),
            parameters: string_parameters(&[("pregunta", QUESTION_DESCRIPTION)]),
        }
    }

    async fn call(&self, ctx: &ToolContext, args: &Value) -> String {
        let question = args["pregunta"].as_str().unwrap_or_default();
        info!(room = ?ctx.room_name, question, "knowledge base query");
        self.knowledge.search(question).await
    }
}
