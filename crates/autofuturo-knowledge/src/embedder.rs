use crate::error::{decode_json, KnowledgeError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default base URL of the OpenAI REST API.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Turns text into an embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds `input` with `model`, asking for `dimensions` components.
    async fn embed(
        &self,
        input: &str,
        model: &str,
        dimensions: usize,
    ) -> Result<Vec<f32>, KnowledgeError>;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: [&'a str; 1],
    model: &'a str,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedding client for the OpenAI `/embeddings` endpoint.
///
/// Works against any server that speaks the same wire format, selected with
/// `base_url`.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiEmbedder {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(
        &self,
        input: &str,
        model: &str,
        dimensions: usize,
    ) -> Result<Vec<f32>, KnowledgeError> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            input: [input],
            model,
            dimensions,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let parsed: EmbeddingResponse = decode_json("embedding service", response).await?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| KnowledgeError::MalformedResponse {
                service: "embedding service",
                reason: "response contained no embeddings".to_string(),
            })?;

        if embedding.len() != dimensions {
            tracing::warn!(
                expected = dimensions,
                actual = embedding.len(),
                "embedding dimensionality differs from configuration"
            );
        }

        Ok(embedding)
    }
}
