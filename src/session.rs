//! Session state machine.
//!
//! A [`Session`] owns the form inputs, the request state of the latest task,
//! the editable document and the gap-report view state. Each task and each
//! refinement is split into a `begin_*` step that validates and marks state,
//! and a `complete_*` step that applies a reply. Replies carry the generation
//! they were issued under and are dropped if the session has moved on.

use crate::adapter;
use crate::ai::{ReasoningService, ServiceReply, ServiceRequest};
use crate::document::{DocumentModel, RefinementOutcome, RefinementTicket};
use crate::ingest::{self, PageTextExtractor};
use crate::models::{CareerTaskRequest, Course, GapReport, TaskMode, TaskOutcome};
use crate::task;
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// State of the most recent top-level task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiRequestState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub result: Option<TaskOutcome>,
}

/// Per-gap expansion flags for a gap report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GapView {
    expanded: Vec<bool>,
}

impl GapView {
    pub fn new(gap_count: usize) -> Self {
        Self {
            expanded: vec![false; gap_count],
        }
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.get(index).copied().unwrap_or(false)
    }

    /// Flips one gap's flag and returns the new value; out of range is ignored.
    pub fn toggle(&mut self, index: usize) -> bool {
        match self.expanded.get_mut(index) {
            Some(flag) => {
                *flag = !*flag;
                *flag
            }
            None => false,
        }
    }

    /// Courses to show for gap `index`: all when expanded, else the first.
    pub fn visible_courses<'a>(&self, report: &'a GapReport, index: usize) -> &'a [Course] {
        let Some(gap) = report.gaps.get(index) else {
            return &[];
        };
        if self.is_expanded(index) {
            &gap.courses
        } else {
            &gap.courses[..gap.courses.len().min(1)]
        }
    }
}

/// A submitted task waiting for its reply.
#[derive(Debug, Clone)]
pub struct PendingTask {
    generation: u64,
    request: ServiceRequest,
}

impl PendingTask {
    pub fn request(&self) -> &ServiceRequest {
        &self.request
    }
}

#[derive(Debug)]
pub enum Completion {
    /// The result is installed in the session.
    Applied,
    /// The task failed; the message is in the request state.
    Failed(Error),
    /// The session moved on before the reply arrived; nothing changed.
    Stale,
}

/// A section refinement waiting for its reply.
#[derive(Debug, Clone)]
pub struct PendingRefinement {
    ticket: RefinementTicket,
    request: ServiceRequest,
}

impl PendingRefinement {
    pub fn title(&self) -> &str {
        self.ticket.title()
    }

    pub fn request(&self) -> &ServiceRequest {
        &self.request
    }
}

pub struct Session {
    id: Uuid,
    service: Arc<dyn ReasoningService>,
    mode: TaskMode,
    goal: String,
    cv_text: String,
    job_description: String,
    state: UiRequestState,
    document: DocumentModel,
    gap_view: GapView,
    generation: u64,
}

impl Session {
    pub fn new(service: Arc<dyn ReasoningService>) -> Self {
        let id = Uuid::new_v4();
        debug!("Created session {}", id);
        Self {
            id,
            service,
            mode: TaskMode::default(),
            goal: String::new(),
            cv_text: String::new(),
            job_description: String::new(),
            state: UiRequestState::default(),
            document: DocumentModel::new(),
            gap_view: GapView::default(),
            generation: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn service(&self) -> Arc<dyn ReasoningService> {
        Arc::clone(&self.service)
    }

    pub fn mode(&self) -> TaskMode {
        self.mode
    }

    /// Switching tabs drops the current result and document and orphans any
    /// in-flight task.
    pub fn switch_mode(&mut self, mode: TaskMode) {
        info!("[{}] Switching to {:?}", self.id, mode);
        self.mode = mode;
        self.generation += 1;
        self.state.is_loading = false;
        self.state.result = None;
        self.document.reset();
        self.gap_view = GapView::default();
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn set_goal(&mut self, goal: impl Into<String>) {
        self.goal = goal.into();
    }

    pub fn cv_text(&self) -> &str {
        &self.cv_text
    }

    pub fn set_cv_text(&mut self, cv_text: impl Into<String>) {
        self.cv_text = cv_text.into();
    }

    pub fn job_description(&self) -> &str {
        &self.job_description
    }

    pub fn set_job_description(&mut self, job_description: impl Into<String>) {
        self.job_description = job_description.into();
    }

    /// Replaces the CV text with the file's contents; on failure the current
    /// text is kept and the error returned for display.
    pub fn load_cv_file(&mut self, path: &Path, extractor: &dyn PageTextExtractor) -> Result<()> {
        match ingest::ingest_file(path, extractor) {
            Ok(text) => {
                self.cv_text = text;
                Ok(())
            }
            Err(e) => {
                warn!("[{}] Could not load CV file: {}", self.id, e);
                Err(e)
            }
        }
    }

    pub fn state(&self) -> &UiRequestState {
        &self.state
    }

    pub fn document(&self) -> &DocumentModel {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut DocumentModel {
        &mut self.document
    }

    pub fn gap_report(&self) -> Option<&GapReport> {
        match &self.state.result {
            Some(TaskOutcome::Gaps(report)) => Some(report),
            _ => None,
        }
    }

    pub fn gap_view(&self) -> &GapView {
        &self.gap_view
    }

    pub fn toggle_gap(&mut self, index: usize) -> bool {
        self.gap_view.toggle(index)
    }

    /// Headline of the installed draft, if any.
    pub fn niche_summary(&self) -> Option<&str> {
        if self.document.is_empty() {
            None
        } else {
            Some(self.document.headline())
        }
    }

    pub fn current_request(&self) -> CareerTaskRequest {
        match self.mode {
            TaskMode::Generate => CareerTaskRequest::Generate {
                goal: self.goal.clone(),
            },
            TaskMode::GapCheck => CareerTaskRequest::GapCheck {
                cv: self.cv_text.clone(),
                job_description: self.job_description.clone(),
            },
        }
    }

    /// Validates the inputs and marks a task as in flight.
    ///
    /// Nothing changes when this returns an error.
    pub fn begin_task(&mut self) -> Result<PendingTask> {
        if self.state.is_loading {
            return Err(Error::TaskInFlight);
        }

        let request = task::build(&self.current_request())?;

        self.generation += 1;
        self.state = UiRequestState {
            is_loading: true,
            error: None,
            result: None,
        };
        self.document.invalidate_refinements();

        info!(
            "[{}] Started {:?} task (generation {})",
            self.id, request.kind, self.generation
        );

        Ok(PendingTask {
            generation: self.generation,
            request,
        })
    }

    pub fn complete_task(
        &mut self,
        pending: PendingTask,
        reply: Result<ServiceReply>,
    ) -> Completion {
        if pending.generation != self.generation {
            debug!(
                "[{}] Dropping reply for generation {} (current {})",
                self.id, pending.generation, self.generation
            );
            return Completion::Stale;
        }

        self.state.is_loading = false;

        let outcome = reply.and_then(|reply| match self.mode {
            TaskMode::Generate => adapter::decode_draft(&reply.text).map(TaskOutcome::Draft),
            TaskMode::GapCheck => {
                adapter::decode_gap_report(&reply.text, reply.grounding_sources)
                    .map(TaskOutcome::Gaps)
            }
        });

        match outcome {
            Ok(outcome) => {
                match &outcome {
                    TaskOutcome::Draft(draft) => {
                        self.document.install_draft(draft);
                        info!(
                            "[{}] Installed draft with {} sections",
                            self.id,
                            draft.sections.len()
                        );
                    }
                    TaskOutcome::Gaps(report) => {
                        self.gap_view = GapView::new(report.gaps.len());
                        info!("[{}] Gap report with {} gaps", self.id, report.gaps.len());
                    }
                }
                self.state.result = Some(outcome);
                Completion::Applied
            }
            Err(e) => {
                warn!("[{}] Task failed: {}", self.id, e);
                self.state.error = Some(e.user_message());
                Completion::Failed(e)
            }
        }
    }

    /// Runs the current task against the service.
    ///
    /// Returns `Err` only when the task could not start; failures of the task
    /// itself come back as [`Completion::Failed`].
    pub async fn submit(&mut self) -> Result<Completion> {
        let pending = self.begin_task()?;
        let reply = self.service.generate(pending.request()).await;
        Ok(self.complete_task(pending, reply))
    }

    /// Marks `title` as refining. A blank goal makes this a no-op.
    pub fn begin_refinement(&mut self, title: &str) -> Result<Option<PendingRefinement>> {
        if self.goal.trim().is_empty() {
            debug!("[{}] Skipping refinement of '{}': no goal set", self.id, title);
            return Ok(None);
        }

        let ticket = self.document.begin_refinement(title)?;
        let current = self.document.section(title).unwrap_or_default();
        let request = task::build_refinement(title, current, &self.goal);

        Ok(Some(PendingRefinement { ticket, request }))
    }

    pub fn complete_refinement(
        &mut self,
        pending: PendingRefinement,
        reply: Result<ServiceReply>,
    ) -> RefinementOutcome {
        let text = reply.and_then(|reply| adapter::decode_refinement(&reply.text));
        let outcome = self.document.finish_refinement(pending.ticket, text);
        debug!("[{}] Refinement finished: {:?}", self.id, outcome);
        outcome
    }

    pub async fn refine(&mut self, title: &str) -> Result<Option<RefinementOutcome>> {
        let Some(pending) = self.begin_refinement(title)? else {
            return Ok(None);
        };
        let reply = self.service.generate(pending.request()).await;
        Ok(Some(self.complete_refinement(pending, reply)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockReasoningClient, TaskKind};
    use crate::ingest::test_support::{FailingExtractor, FixedPages};
    use crate::models::{GroundingSource, Theme};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn draft_payload(sections: &[(&str, &str)]) -> String {
        let sections: Vec<_> = sections
            .iter()
            .map(|(title, content)| json!({ "title": title, "content": content }))
            .collect();
        json!({
            "mode": "generate",
            "suggested_skills": ["Kotlin", "Android"],
            "suggested_sections": sections,
            "theme": "tech",
            "niche_summary": "Senior Android Engineer"
        })
        .to_string()
    }

    fn gap_payload(gaps: usize, courses: usize) -> String {
        let gaps: Vec<_> = (0..gaps)
            .map(|g| {
                let courses: Vec<_> = (0..courses)
                    .map(|c| {
                        json!({
                            "course_name": format!("Course {}-{}", g, c),
                            "platform": "edX",
                            "url": format!("https://example.com/{}/{}", g, c)
                        })
                    })
                    .collect();
                json!({ "skill": format!("Skill {}", g), "courses": courses })
            })
            .collect();
        json!({ "mode": "check", "skill_gaps": gaps }).to_string()
    }

    fn generate_session(mock: MockReasoningClient) -> Session {
        let mut session = Session::new(Arc::new(mock));
        session.set_goal("Senior Android Engineer at Spotify");
        session
    }

    fn gap_session(mock: MockReasoningClient) -> Session {
        let mut session = Session::new(Arc::new(mock));
        session.switch_mode(TaskMode::GapCheck);
        session.set_cv_text("Java developer, 5 years");
        session.set_job_description("Kotlin, Compose, CI/CD");
        session
    }

    fn titles(session: &Session) -> Vec<String> {
        session.document().titles().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn test_generate_installs_document_matching_draft() {
        let mock = MockReasoningClient::new().with_reply(draft_payload(&[
            ("Summary", "Builds apps."),
            ("Experience", "Spotify."),
        ]));
        let mut session = generate_session(mock);

        let completion = session.submit().await.unwrap();

        assert!(matches!(completion, Completion::Applied));
        assert!(!session.state().is_loading);
        assert!(session.state().error.is_none());
        assert_eq!(session.niche_summary(), Some("Senior Android Engineer"));
        assert_eq!(titles(&session), vec!["Summary", "Experience"]);
        assert_eq!(session.document().section("Experience"), Some("Spotify."));
        assert_eq!(session.document().skills(), ["Kotlin", "Android"]);
    }

    #[tokio::test]
    async fn test_zero_sections_leaves_result_empty() {
        let mock = MockReasoningClient::new().with_reply(draft_payload(&[]));
        let mut session = generate_session(mock);

        let completion = session.submit().await.unwrap();

        assert!(matches!(completion, Completion::Failed(Error::EmptyGeneration)));
        assert!(session.state().result.is_none());
        assert_eq!(
            session.state().error.as_deref(),
            Some(crate::error::EMPTY_GENERATION_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_malformed_reply_keeps_previous_document() {
        let mock = MockReasoningClient::new()
            .with_reply(draft_payload(&[("Summary", "First draft.")]))
            .with_reply("{ this is not json");
        let mut session = generate_session(mock);

        session.submit().await.unwrap();
        session.document_mut().set_user_name("Jo Park");

        let completion = session.submit().await.unwrap();

        assert!(matches!(completion, Completion::Failed(Error::MalformedResponse(_))));
        assert_eq!(session.state().error.as_deref(), Some(crate::error::RETRY_MESSAGE));
        assert!(session.state().result.is_none());
        assert_eq!(session.document().section("Summary"), Some("First draft."));
        assert_eq!(session.document().user_name(), "JO PARK");
    }

    #[tokio::test]
    async fn test_failed_regeneration_keeps_headline_with_document() {
        let mock = MockReasoningClient::new()
            .with_reply(draft_payload(&[("Summary", "First draft.")]))
            .with_reply("{ truncated");
        let mut session = generate_session(mock);

        session.submit().await.unwrap();
        let completion = session.submit().await.unwrap();

        assert!(matches!(completion, Completion::Failed(_)));
        assert!(session.state().result.is_none());
        assert_eq!(session.document().section("Summary"), Some("First draft."));
        assert_eq!(session.niche_summary(), Some("Senior Android Engineer"));

        session.switch_mode(TaskMode::GapCheck);
        assert_eq!(session.niche_summary(), None);
    }

    #[tokio::test]
    async fn test_transport_error_is_surfaced_verbatim() {
        let mock = MockReasoningClient::new().with_failure("Gemini API error (status 503): overloaded");
        let mut session = generate_session(mock);

        let completion = session.submit().await.unwrap();

        assert!(matches!(completion, Completion::Failed(ref e) if e.is_transport()));
        assert!(session
            .state()
            .error
            .as_deref()
            .unwrap()
            .contains("status 503"));
    }

    #[tokio::test]
    async fn test_blank_goal_fails_before_any_call() {
        let mock = MockReasoningClient::new();
        let probe = mock.clone();
        let mut session = Session::new(Arc::new(mock));

        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, Error::InputValidation(_)));
        assert_eq!(probe.get_call_count(), 0);
        assert_eq!(session.state(), &UiRequestState::default());
    }

    #[test]
    fn test_second_submission_rejected_while_loading() {
        let mut session = generate_session(MockReasoningClient::new());

        let _pending = session.begin_task().unwrap();
        assert!(session.state().is_loading);

        assert!(matches!(session.begin_task(), Err(Error::TaskInFlight)));
    }

    #[test]
    fn test_begin_task_clears_previous_outcome() {
        let mut session = generate_session(MockReasoningClient::new());
        let pending = session.begin_task().unwrap();
        session.complete_task(pending, Ok(ServiceReply::text("nope")));
        assert!(session.state().error.is_some());

        let _pending = session.begin_task().unwrap();
        assert_eq!(
            session.state(),
            &UiRequestState {
                is_loading: true,
                error: None,
                result: None,
            }
        );
    }

    #[test]
    fn test_reply_after_mode_switch_is_discarded() {
        let mut session = generate_session(MockReasoningClient::new());
        let pending = session.begin_task().unwrap();

        session.switch_mode(TaskMode::GapCheck);

        let completion = session.complete_task(
            pending,
            Ok(ServiceReply::text(draft_payload(&[("Summary", "late")]))),
        );
        assert!(matches!(completion, Completion::Stale));
        assert!(session.state().result.is_none());
        assert!(!session.state().is_loading);
        assert!(session.document().is_empty());
    }

    #[tokio::test]
    async fn test_gap_check_builds_report_and_view() {
        let sources = vec![GroundingSource {
            title: "edX".to_string(),
            uri: "https://edx.org".to_string(),
        }];
        let mock = MockReasoningClient::new().with_grounded_reply(gap_payload(4, 3), sources.clone());
        let probe = mock.clone();
        let mut session = gap_session(mock);

        let completion = session.submit().await.unwrap();
        assert!(matches!(completion, Completion::Applied));
        assert_eq!(probe.get_requests()[0].kind, TaskKind::GapCheck);

        let report = session.gap_report().unwrap().clone();
        assert_eq!(report.gaps.len(), 4);
        assert_eq!(report.grounding_sources, sources);

        assert!(session.toggle_gap(1));

        let view = session.gap_view();
        for index in 0..4 {
            let shown = view.visible_courses(&report, index).len();
            if index == 1 {
                assert_eq!(shown, 3);
            } else {
                assert_eq!(shown, 1);
            }
        }
    }

    #[test]
    fn test_gap_view_toggle_and_bounds() {
        let mut view = GapView::new(2);
        assert!(!view.is_expanded(0));
        assert!(view.toggle(0));
        assert!(!view.toggle(0));
        assert!(!view.toggle(7));
        assert!(!view.is_expanded(7));
    }

    #[tokio::test]
    async fn test_refinement_without_goal_is_noop() {
        let mock = MockReasoningClient::new().with_reply(draft_payload(&[("Summary", "x")]));
        let probe = mock.clone();
        let mut session = generate_session(mock);
        session.submit().await.unwrap();

        session.set_goal("");
        let outcome = session.refine("Summary").await.unwrap();

        assert!(outcome.is_none());
        assert_eq!(probe.get_call_count(), 1);
        assert!(!session.document().is_refining("Summary"));
    }

    #[tokio::test]
    async fn test_refine_replaces_only_that_section() {
        let mock = MockReasoningClient::new()
            .with_reply(draft_payload(&[("Summary", "x"), ("Experience", "y")]))
            .with_reply("  Polished summary.  ");
        let probe = mock.clone();
        let mut session = generate_session(mock);
        session.submit().await.unwrap();

        let outcome = session.refine("Summary").await.unwrap().unwrap();

        assert!(matches!(outcome, RefinementOutcome::Applied));
        assert_eq!(session.document().section("Summary"), Some("Polished summary."));
        assert_eq!(session.document().section("Experience"), Some("y"));
        let refine_request = &probe.get_requests()[1];
        assert_eq!(refine_request.kind, TaskKind::Refine);
        assert!(refine_request.prompt.contains("Spotify"));
    }

    #[tokio::test]
    async fn test_failed_refinement_keeps_text_and_clears_flag() {
        let mock = MockReasoningClient::new()
            .with_reply(draft_payload(&[("Summary", "keep me")]))
            .with_failure("timeout");
        let mut session = generate_session(mock);
        session.submit().await.unwrap();

        let outcome = session.refine("Summary").await.unwrap().unwrap();

        assert!(matches!(outcome, RefinementOutcome::Failed(_)));
        assert_eq!(session.document().section("Summary"), Some("keep me"));
        assert!(!session.document().is_refining("Summary"));
        assert!(session.state().error.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_refinements_do_not_interfere() {
        let mock = MockReasoningClient::new().with_reply(draft_payload(&[("A", "a"), ("B", "b")]));
        let mut session = generate_session(mock);
        session.submit().await.unwrap();

        let a = session.begin_refinement("A").unwrap().unwrap();
        let b = session.begin_refinement("B").unwrap().unwrap();

        session.complete_refinement(a, Ok(ServiceReply::text("a2")));
        assert!(!session.document().is_refining("A"));
        assert!(session.document().is_refining("B"));

        session.complete_refinement(b, Ok(ServiceReply::text("b2")));
        assert!(!session.document().is_refining("B"));
        assert_eq!(session.document().section("A"), Some("a2"));
        assert_eq!(session.document().section("B"), Some("b2"));
    }

    #[tokio::test]
    async fn test_double_refinement_in_arrival_order() {
        let mock = MockReasoningClient::new().with_reply(draft_payload(&[("A", "a")]));
        let mut session = generate_session(mock);
        session.submit().await.unwrap();

        let first = session.begin_refinement("A").unwrap().unwrap();
        let second = session.begin_refinement("A").unwrap().unwrap();

        session.complete_refinement(first, Ok(ServiceReply::text("first")));
        session.complete_refinement(second, Ok(ServiceReply::text("second")));

        assert_eq!(session.document().section("A"), Some("second"));
        assert!(!session.document().is_refining("A"));
    }

    #[tokio::test]
    async fn test_double_refinement_out_of_order_last_issued_wins() {
        let mock = MockReasoningClient::new().with_reply(draft_payload(&[("A", "a")]));
        let mut session = generate_session(mock);
        session.submit().await.unwrap();

        let first = session.begin_refinement("A").unwrap().unwrap();
        let second = session.begin_refinement("A").unwrap().unwrap();

        let late = session.complete_refinement(second, Ok(ServiceReply::text("second")));
        assert!(matches!(late, RefinementOutcome::Applied));
        let early = session.complete_refinement(first, Ok(ServiceReply::text("first")));
        assert!(matches!(early, RefinementOutcome::Superseded));

        assert_eq!(session.document().section("A"), Some("second"));
        assert!(!session.document().is_refining("A"));
    }

    #[tokio::test]
    async fn test_refinement_in_flight_when_new_task_starts_is_stale() {
        let mock = MockReasoningClient::new().with_reply(draft_payload(&[("A", "a")]));
        let mut session = generate_session(mock);
        session.submit().await.unwrap();

        let pending = session.begin_refinement("A").unwrap().unwrap();
        session.submit().await.unwrap();

        let outcome = session.complete_refinement(pending, Ok(ServiceReply::text("late")));
        assert!(matches!(outcome, RefinementOutcome::Stale));
        assert_eq!(session.document().section("A"), Some("a"));
    }

    #[tokio::test]
    async fn test_theme_switch_keeps_content() {
        let mock = MockReasoningClient::new().with_reply(draft_payload(&[("A", "a")]));
        let mut session = generate_session(mock);
        session.submit().await.unwrap();
        let before = session.document().clone();

        session.document_mut().set_theme(Theme::Creative);

        assert_eq!(session.document().theme(), Theme::Creative);
        assert_eq!(session.document().sections(), before.sections());
        assert_eq!(session.document().skills(), before.skills());
    }

    #[test]
    fn test_load_cv_file_failure_keeps_existing_text() {
        let mut session = gap_session(MockReasoningClient::new());
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();

        let err = session
            .load_cv_file(file.path(), &FailingExtractor)
            .unwrap_err();

        assert!(matches!(err, Error::Extraction(_)));
        assert_eq!(session.cv_text(), "Java developer, 5 years");
    }

    #[test]
    fn test_load_cv_file_replaces_text() {
        let mut session = gap_session(MockReasoningClient::new());
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        let extractor = FixedPages(vec!["Alpha".to_string(), "Beta".to_string()]);

        session.load_cv_file(file.path(), &extractor).unwrap();

        assert_eq!(session.cv_text(), "Alpha\nBeta");
    }
}
