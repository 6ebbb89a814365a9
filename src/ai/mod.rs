//! Reasoning service integration
//!
//! Every call to the generative-language model goes through
//! [`ReasoningService`]. The Gemini client talks to the real API, the mock is
//! used by tests and local harnesses.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiReasoningClient;
pub use mock::{MockReasoningClient, MockReply};

use crate::models::GroundingSource;
use crate::schema::Schema;
use crate::Result;
use async_trait::async_trait;

/// Which of the three call shapes a request is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Generate,
    GapCheck,
    Refine,
}

/// Fully specified request: prompt plus the shape expected back.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    pub kind: TaskKind,
    pub prompt: String,
    /// `None` for free-text replies.
    pub schema: Option<Schema>,
    pub web_search: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceReply {
    pub text: String,
    pub grounding_sources: Vec<GroundingSource>,
}

impl ServiceReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            grounding_sources: Vec::new(),
        }
    }
}

#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn generate(&self, request: &ServiceRequest) -> Result<ServiceReply>;
}
