//! Backend request/result types and the `TextGenerator` capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::generation::category::QuestionCategory;

/// Sampling parameters sent with every backend call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackendParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl BackendParams {
    /// Question generation wants varied wording.
    pub const QUESTION: BackendParams = BackendParams {
        max_tokens: 500,
        temperature: 0.7,
    };

    /// Classification must be as deterministic as the backend allows.
    pub const CLASSIFICATION: BackendParams = BackendParams {
        max_tokens: 10,
        temperature: 0.0,
    };
}

/// What a request is asking the backend to choose between.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Selector {
    Question { category: QuestionCategory },
    Rubric { size: usize },
}

/// One rendered backend call. Built per call and consumed by the generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub selector: Selector,
    pub params: BackendParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Success,
    /// The backend answered but the parser could not find everything it expected.
    Malformed,
    /// The backend could not be reached or rejected the call.
    RequestFailed,
}

/// Raw backend text tagged with how the call went.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub status: GenerationStatus,
    pub text: String,
    pub error: Option<String>,
}

impl GenerationResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            status: GenerationStatus::Success,
            text: text.into(),
            error: None,
        }
    }

    pub fn request_failed(reason: impl Into<String>) -> Self {
        Self {
            status: GenerationStatus::RequestFailed,
            text: String::new(),
            error: Some(reason.into()),
        }
    }

    pub fn is_request_failed(&self) -> bool {
        self.status == GenerationStatus::RequestFailed
    }
}

/// The generation backend as seen by the batch pipeline.
///
/// Implementations make exactly one backend call per `generate` and never
/// return an error: transport and API failures come back as
/// `GenerationStatus::RequestFailed` so one bad call can't abort a batch.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult;
}
