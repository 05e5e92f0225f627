use thiserror::Error;

/// Errors raised while talking to the embedding service or the store.
///
/// These never leave [`crate::KnowledgeBase::search`]; they are logged and
/// replaced by the apology message.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("malformed {service} response: {reason}")]
    MalformedResponse {
        service: &'static str,
        reason: String,
    },
}

/// Reads a response body and decodes it as JSON, turning non-2xx statuses
/// into [`KnowledgeError::Status`].
pub(crate) async fn decode_json<T: serde::de::DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T, KnowledgeError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(KnowledgeError::Status {
            service,
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| KnowledgeError::MalformedResponse {
        service,
        reason: e.to_string(),
    })
}
