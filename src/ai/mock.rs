use super::{ReasoningService, ServiceReply, ServiceRequest, TaskKind};
use crate::models::GroundingSource;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Canned reply for [`MockReasoningClient`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Text {
        text: String,
        grounding_sources: Vec<GroundingSource>,
    },
    /// Fails the call the way a transport error would.
    Fail(String),
}

#[derive(Clone)]
pub struct MockReasoningClient {
    replies: Arc<Mutex<Vec<MockReply>>>,
    requests: Arc<Mutex<Vec<ServiceRequest>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockReasoningClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push(MockReply::Text {
            text: text.into(),
            grounding_sources: Vec::new(),
        });
        self
    }

    pub fn with_grounded_reply(
        self,
        text: impl Into<String>,
        grounding_sources: Vec<GroundingSource>,
    ) -> Self {
        self.replies.lock().unwrap().push(MockReply::Text {
            text: text.into(),
            grounding_sources,
        });
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(MockReply::Fail(message.into()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_requests(&self) -> Vec<ServiceRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn default_reply(request: &ServiceRequest) -> ServiceReply {
        let text = match request.kind {
            TaskKind::Generate => serde_json::json!({
                "mode": "generate",
                "suggested_skills": ["Communication", "Leadership"],
                "suggested_sections": [
                    { "title": "Summary", "content": "Results-driven professional." },
                    { "title": "Experience", "content": "[Company] - [Role]" }
                ],
                "theme": "corporate",
                "niche_summary": "Professional"
            })
            .to_string(),
            TaskKind::GapCheck => serde_json::json!({
                "mode": "check",
                "skill_gaps": [{
                    "skill": "Kubernetes",
                    "courses": [
                        { "course_name": "K8s Basics", "platform": "Coursera", "url": "https://example.com/1" },
                        { "course_name": "K8s in Depth", "platform": "Udemy", "url": "https://example.com/2" },
                        { "course_name": "CKA Prep", "platform": "edX", "url": "https://example.com/3" }
                    ]
                }]
            })
            .to_string(),
            TaskKind::Refine => "Refined section text.".to_string(),
        };
        ServiceReply::text(text)
    }
}

impl Default for MockReasoningClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReasoningService for MockReasoningClient {
    async fn generate(&self, request: &ServiceRequest) -> Result<ServiceReply> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.requests.lock().unwrap().push(request.clone());

        let replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Ok(Self::default_reply(request));
        }

        let index = (count - 1) % replies.len();
        match &replies[index] {
            MockReply::Text {
                text,
                grounding_sources,
            } => Ok(ServiceReply {
                text: text.clone(),
                grounding_sources: grounding_sources.clone(),
            }),
            MockReply::Fail(message) => Err(Error::AiProvider(message.clone())),
        }
    }
}
