use crate::embedder::Embedder;
use crate::error::KnowledgeError;
use crate::format::format_references;
use crate::store::{MatchRecord, VectorStore};
use serde_json::Map;
use std::sync::Arc;
use tracing::{error, info};

/// Returned when no store is configured.
pub const NOT_CONFIGURED_MESSAGE: &str = "La base de conocimiento no está configurada. Por favor, contacta con nuestro servicio al cliente para obtener información.";

/// Returned when the store finds nothing for the question.
pub const NO_RESULTS_MESSAGE: &str = "No encontré información específica sobre tu consulta. Te recomiendo contactar directamente con nuestro servicio al cliente para obtener una respuesta más precisa.";

/// Returned when embedding or searching fails.
pub const APOLOGY_MESSAGE: &str = "Lo siento, estoy teniendo problemas para consultar la información. Por favor, intenta de nuevo o contacta con nuestro servicio al cliente.";

/// Embedding model and result-count settings for a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalSettings {
    pub embedding_model: String,
    /// Must match the dimensionality the stored embeddings were built with.
    pub embedding_dimensions: usize,
    /// Maximum number of matches requested from the store.
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
            top_k: 3,
        }
    }
}

/// The knowledge-base lookup behind the assistant's search tool.
///
/// Client handles are shared read-only; each call to [`search`](Self::search)
/// performs its own two round trips and keeps no state between calls.
#[derive(Clone)]
pub struct KnowledgeBase {
    embedder: Arc<dyn Embedder>,
    store: Option<Arc<dyn VectorStore>>,
    settings: RetrievalSettings,
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("configured", &self.store.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl KnowledgeBase {
    /// Creates a knowledge base. Pass `None` as `store` when the backing
    /// database is not configured; searches then answer with
    /// [`NOT_CONFIGURED_MESSAGE`] without touching the network.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Option<Arc<dyn VectorStore>>,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            settings,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Answers a question with reference blocks from the knowledge base.
    ///
    /// Never fails: every outcome is text meant for the LLM. Dropping the
    /// returned future abandons any request still in flight.
    pub async fn search(&self, question: &str) -> String {
        let Some(store) = self.store.as_deref() else {
            return NOT_CONFIGURED_MESSAGE.to_string();
        };

        match self.lookup(store, question).await {
            Ok(records) if records.is_empty() => {
                info!("no relevant knowledge base results for query");
                NO_RESULTS_MESSAGE.to_string()
            }
            Ok(records) => {
                info!(matches = records.len(), "knowledge base query answered");
                format_references(&records)
            }
            Err(e) => {
                error!(error = %e, "knowledge base query failed");
                APOLOGY_MESSAGE.to_string()
            }
        }
    }

    async fn lookup(
        &self,
        store: &dyn VectorStore,
        question: &str,
    ) -> Result<Vec<MatchRecord>, KnowledgeError> {
        let embedding = self
            .embedder
            .embed(
                question,
                &self.settings.embedding_model,
                self.settings.embedding_dimensions,
            )
            .await?;

        store
            .match_documents(&embedding, self.settings.top_k, &Map::new())
            .await
    }
}
