//! Domain service for reading suggestions and book summaries.
//!
//! Suggestions come from a text-generation collaborator when one is
//! configured, and from built-in tables otherwise. Both sit behind the same
//! [`BookAdvisor`] trait so callers never know which one answered.

use thiserror::Error;

/// Errors from an advisor backend.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Text generation is not configured")]
    NotConfigured,

    #[error("Request to model {model} failed: {message}")]
    Request { model: String, message: String },

    #[error("Model {model} rejected the request: {status} - {body}")]
    Rejected {
        model: String,
        status: u16,
        body: String,
    },

    #[error("Model {model} returned no text")]
    EmptyResponse { model: String },
}

/// One method per prompt style.
#[async_trait::async_trait]
pub trait BookAdvisor: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Suggests books for a mood described in free text.
    async fn recommend(&self, mood: &str) -> Result<String, AdvisorError>;

    /// Summarises the book with the given title.
    async fn describe(&self, title: &str) -> Result<String, AdvisorError>;
}

/// Rejects blank prompts before they reach any backend.
pub fn require_text<'a>(value: &'a str, what: &str) -> Result<&'a str, AdvisorError> {
    if value.trim().is_empty() {
        return Err(AdvisorError::Validation(format!("Please enter {what}")));
    }
    Ok(value)
}
