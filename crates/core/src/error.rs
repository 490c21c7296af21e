//! Error taxonomy for collaborator calls
//!
//! Every variant is caught by the composer and turned into a fixed,
//! language-matched reply. Nothing here ever reaches the messaging gateway.

/// Failure of an external collaborator or of local storage
#[derive(Debug, thiserror::Error)]
pub enum JarvisError {
    /// Network error, timeout or non-2xx status
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// The collaborator answered but returned nothing usable
    #[error("empty result: {0}")]
    EmptyResult(String),

    /// The response did not have the expected shape
    #[error("unexpected response shape: {0}")]
    ParseFailure(String),

    /// A credential required by the chosen branch is not configured
    #[error("missing configuration: {0}")]
    ConfigMissing(&'static str),

    /// Conversation history could not be read or written
    #[error("history storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for JarvisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            JarvisError::ParseFailure(err.to_string())
        } else {
            JarvisError::CollaboratorUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for JarvisError {
    fn from(err: serde_json::Error) -> Self {
        JarvisError::ParseFailure(err.to_string())
    }
}

impl From<std::io::Error> for JarvisError {
    fn from(err: std::io::Error) -> Self {
        JarvisError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JarvisError>;

/// Turn a non-2xx response into `CollaboratorUnavailable`, keeping the body for logs
pub(crate) async fn check_status(
    service: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(JarvisError::CollaboratorUnavailable(format!(
        "{} error {}: {}",
        service, status, body
    )))
}
