use crate::error::{decode_json, KnowledgeError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the similarity-search procedure exposed by the knowledge base.
pub const DEFAULT_MATCH_FUNCTION: &str = "match_documents";

/// One passage returned by the similarity search.
///
/// The store may omit any field; formatting substitutes placeholders. The
/// score is whatever the store's distance metric produces and is not
/// assumed to be cosine similarity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub similarity: Option<f64>,
    #[serde(default)]
    pub content: Option<String>,
}

/// A hosted similarity-search procedure.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns at most `match_count` records closest to `query_embedding`,
    /// ordered by descending similarity.
    async fn match_documents(
        &self,
        query_embedding: &[f32],
        match_count: usize,
        filter: &Map<String, Value>,
    ) -> Result<Vec<MatchRecord>, KnowledgeError>;
}

#[derive(Serialize)]
struct MatchRequest<'a> {
    query_embedding: &'a [f32],
    match_count: usize,
    filter: &'a Map<String, Value>,
}

/// Supabase PostgREST client calling an RPC such as `match_documents`.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    url: String,
    api_key: String,
    function: String,
}

impl SupabaseStore {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            function: function.into(),
        }
    }

    /// Full URL of the RPC endpoint.
    pub fn rpc_url(&self) -> String {
        format!("{}/rest/v1/rpc/{}", self.url, self.function)
    }
}

#[async_trait]
impl VectorStore for SupabaseStore {
    async fn match_documents(
        &self,
        query_embedding: &[f32],
        match_count: usize,
        filter: &Map<String, Value>,
    ) -> Result<Vec<MatchRecord>, KnowledgeError> {
        let request = MatchRequest {
            query_embedding,
            match_count,
            filter,
        };

        let response = self
            .client
            .post(self.rpc_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        // PostgREST answers `null` for a set-returning function with no rows
        // on some versions.
        let records: Option<Vec<MatchRecord>> = decode_json("vector store", response).await?;
        Ok(records.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_url_includes_function_name() {
        let store = SupabaseStore::new(
            reqwest::Client::new(),
            "https://abc.supabase.co/",
            "key",
            DEFAULT_MATCH_FUNCTION,
        );
        assert_eq!(
            store.rpc_url(),
            "https://abc.supabase.co/rest/v1/rpc/match_documents"
        );
    }

    #[test]
    fn match_record_tolerates_missing_fields() {
        let records: Vec<MatchRecord> =
            serde_json::from_str(r#"[{"id": 7, "similarity": 0.81, "content": "x"}, {}, {"id": null}]"#)
                .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, Some(Value::from(7)));
        assert_eq!(records[1], MatchRecord::default());
        assert_eq!(records[2].id, None);
    }

    #[test]
    fn request_body_has_empty_filter() {
        let filter = Map::new();
        let embedding = [0.25_f32, -0.5];
        let body = serde_json::to_value(MatchRequest {
            query_embedding: &embedding,
            match_count: 3,
            filter: &filter,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"query_embedding": [0.25, -0.5], "match_count": 3, "filter": {}})
        );
    }
}
