//! Application orchestration for one CLI run.
//!
//! Drives a [`Session`] through a generate or gap-check task and hands back
//! the rendered result.

use crate::ai::{GeminiReasoningClient, ReasoningService, ServiceReply};
use crate::document::{RefinementOutcome, EMAIL_FIELD, PHONE_FIELD};
use crate::ingest::{PageTextExtractor, PdfExtractor};
use crate::models::{Config, TaskMode, Theme};
use crate::render;
use crate::session::{Completion, PendingRefinement, Session};
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub goal: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub theme: Option<Theme>,
    /// Section titles to refine after generation.
    pub refine: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum TextSource {
    File(PathBuf),
    Inline(String),
}

#[derive(Debug, Clone)]
pub struct GapCheckOptions {
    pub cv: TextSource,
    pub job_description: TextSource,
    /// Zero-based gap indices whose full course lists are shown.
    pub expand: Vec<usize>,
}

/// What a generate run produced.
#[derive(Debug, Clone)]
pub struct GeneratedCv {
    pub html: String,
    pub summary: String,
    /// Sections whose refinement did not apply, with the reason.
    pub refinement_failures: Vec<(String, String)>,
}

pub struct App {
    session: Session,
    extractor: Box<dyn PageTextExtractor>,
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses that
    /// need to inject mocks.
    pub fn with_services(
        service: Arc<dyn ReasoningService>,
        extractor: Box<dyn PageTextExtractor>,
    ) -> Self {
        Self {
            session: Session::new(service),
            extractor,
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;
        info!(
            "Reasoning models: generate={}, gap_check={}, refine={}",
            config.models.generate, config.models.gap_check, config.models.refine
        );
        let service = Arc::new(GeminiReasoningClient::from_config(&config));
        Ok(Self::with_services(service, Box::new(PdfExtractor)))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn generate(&mut self, options: GenerateOptions) -> Result<GeneratedCv> {
        self.session.switch_mode(TaskMode::Generate);
        self.session.set_goal(options.goal.clone());

        match self.session.submit().await? {
            Completion::Applied => {}
            Completion::Failed(e) => return Err(e),
            Completion::Stale => {
                return Err(Error::Invariant("generation reply was discarded".to_string()))
            }
        }

        let document = self.session.document_mut();
        if let Some(name) = &options.name {
            document.set_user_name(name);
        }
        if let Some(location) = &options.location {
            document.set_user_location(location);
        }
        if let Some(email) = &options.email {
            document.set_contact_field(EMAIL_FIELD, email);
        }
        if let Some(phone) = &options.phone {
            document.set_contact_field(PHONE_FIELD, phone);
        }
        if let Some(theme) = options.theme {
            document.set_theme(theme);
        }

        let refinement_failures = self.refine_sections(&options.refine).await?;

        let headline = self.session.niche_summary().unwrap_or_default().to_string();
        let document = self.session.document();
        Ok(GeneratedCv {
            html: render::print_html(document, &headline),
            summary: render::draft_summary_text(document, &headline),
            refinement_failures,
        })
    }

    /// Refines the given sections concurrently, one request per section.
    ///
    /// Every title is checked before any request starts, and every started
    /// refinement is settled before this returns.
    async fn refine_sections(&mut self, titles: &[String]) -> Result<Vec<(String, String)>> {
        let mut unique: Vec<&String> = Vec::with_capacity(titles.len());
        for title in titles {
            if self.session.document().section(title).is_none() {
                return Err(Error::UnknownSection(title.clone()));
            }
            if !unique.contains(&title) {
                unique.push(title);
            }
        }

        let mut failures = Vec::new();
        let mut outstanding: HashMap<String, PendingRefinement> = HashMap::new();
        let mut in_flight = JoinSet::new();

        for title in unique {
            let Some(pending) = self.session.begin_refinement(title)? else {
                continue;
            };
            outstanding.insert(title.clone(), pending.clone());
            let service = self.session.service();
            in_flight.spawn(async move {
                let reply = service.generate(pending.request()).await;
                (pending, reply)
            });
        }

        while let Some(joined) = in_flight.join_next().await {
            let (pending, reply) = match joined {
                Ok(settled) => settled,
                Err(e) => {
                    warn!("Refinement task did not finish: {}", e);
                    continue;
                }
            };
            let title = pending.title().to_string();
            outstanding.remove(&title);
            if let Some(failure) = self.settle_refinement(pending, reply) {
                failures.push(failure);
            }
        }

        // Tasks that panicked never handed their ticket back.
        for (_, pending) in outstanding {
            let reply = Err(Error::Refinement("refinement task aborted".to_string()));
            if let Some(failure) = self.settle_refinement(pending, reply) {
                failures.push(failure);
            }
        }

        Ok(failures)
    }

    fn settle_refinement(
        &mut self,
        pending: PendingRefinement,
        reply: Result<ServiceReply>,
    ) -> Option<(String, String)> {
        let title = pending.title().to_string();
        match self.session.complete_refinement(pending, reply) {
            RefinementOutcome::Applied => {
                info!("Refined section '{}'", title);
                None
            }
            RefinementOutcome::Failed(e) => {
                warn!("Could not refine section '{}': {}", title, e);
                Some((title, e.to_string()))
            }
            RefinementOutcome::Superseded | RefinementOutcome::Stale => None,
        }
    }

    fn load_text(&mut self, source: &TextSource, is_cv: bool) -> Result<String> {
        match source {
            TextSource::Inline(text) => Ok(text.clone()),
            TextSource::File(path) if is_cv => {
                self.session.load_cv_file(path, self.extractor.as_ref())?;
                Ok(self.session.cv_text().to_string())
            }
            TextSource::File(path) => crate::ingest::ingest_file(path, self.extractor.as_ref()),
        }
    }

    pub async fn gap_check(&mut self, options: GapCheckOptions) -> Result<String> {
        self.session.switch_mode(TaskMode::GapCheck);

        let cv = self.load_text(&options.cv, true)?;
        self.session.set_cv_text(cv);
        let job_description = self.load_text(&options.job_description, false)?;
        self.session.set_job_description(job_description);

        match self.session.submit().await? {
            Completion::Applied => {}
            Completion::Failed(e) => return Err(e),
            Completion::Stale => {
                return Err(Error::Invariant("gap check reply was discarded".to_string()))
            }
        }

        for index in options.expand {
            if !self.session.gap_view().is_expanded(index) {
                self.session.toggle_gap(index);
            }
        }

        let report = self
            .session
            .gap_report()
            .ok_or_else(|| Error::Invariant("gap check produced no report".to_string()))?;
        Ok(render::gap_report_text(report, self.session.gap_view()))
    }
}
