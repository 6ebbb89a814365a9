use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, GoogleSearch,
    Part, Tool,
};
use crate::ai::{ReasoningService, ServiceReply, ServiceRequest, TaskKind};
use crate::models::{Config, GroundingSource, ModelRoster};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

const UNTITLED_SOURCE: &str = "Source";

pub struct GeminiReasoningClient {
    http: GeminiHttpClient,
    models: ModelRoster,
}

impl GeminiReasoningClient {
    pub fn new(api_key: String, models: ModelRoster, timeout: Duration) -> Self {
        Self::new_with_client(api_key, models, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        models: ModelRoster,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, timeout, client),
            models,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let client = Self::new(
            config.gemini_api_key.clone(),
            config.models.clone(),
            config.request_timeout,
        );
        match &config.gemini_base_url {
            Some(base_url) => client.with_base_url(base_url.clone()),
            None => client,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    fn model_for(&self, kind: TaskKind) -> &str {
        match kind {
            TaskKind::Generate => &self.models.generate,
            TaskKind::GapCheck => &self.models.gap_check,
            TaskKind::Refine => &self.models.refine,
        }
    }

    fn build_request(request: &ServiceRequest) -> GenerateContentRequest {
        let generation_config = request.schema.as_ref().map(|schema| GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema.clone()),
        });

        let tools = if request.web_search {
            vec![Tool {
                google_search: GoogleSearch::default(),
            }]
        } else {
            Vec::new()
        };

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt.clone()),
                }],
            }],
            generation_config,
            tools,
        }
    }

    /// Concatenates every text part of the first candidate.
    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let content = response.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn extract_grounding(response: &GenerateContentResponse) -> Vec<GroundingSource> {
        response
            .candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|metadata| {
                metadata
                    .grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .filter_map(|web| {
                        let uri = web.uri.clone()?;
                        let title = web
                            .title
                            .clone()
                            .filter(|t| !t.trim().is_empty())
                            .unwrap_or_else(|| UNTITLED_SOURCE.to_string());
                        Some(GroundingSource { title, uri })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReasoningService for GeminiReasoningClient {
    async fn generate(&self, request: &ServiceRequest) -> Result<ServiceReply> {
        let model = self.model_for(request.kind);
        tracing::info!(
            "Calling Gemini for {:?} (model: {}, search: {})",
            request.kind,
            model,
            request.web_search
        );

        let body = Self::build_request(request);
        let response: GenerateContentResponse = self.http.generate_content(model, &body).await?;

        let text = Self::extract_text(&response)
            .ok_or_else(|| Error::AiProvider("No text in Gemini response".to_string()))?;
        let grounding_sources = Self::extract_grounding(&response);

        tracing::debug!(
            "Gemini replied with {} chars and {} grounding sources",
            text.len(),
            grounding_sources.len()
        );

        Ok(ServiceReply {
            text,
            grounding_sources,
        })
    }
}
