//! Builds service requests for career tasks and declares the reply shapes.

use crate::ai::{ServiceRequest, TaskKind};
use crate::models::{CareerTaskRequest, Theme};
use crate::prompts;
use crate::schema::Schema;
use crate::Result;

/// Courses requested per skill gap.
pub const COURSES_PER_GAP: usize = 3;

/// Reply contract for CV generation.
///
/// An empty `suggested_sections` list passes this schema on purpose; it is
/// reported as an empty generation by the adapter.
pub fn generate_schema() -> Schema {
    let themes: Vec<&str> = Theme::ALL.iter().map(Theme::as_str).collect();
    Schema::object([
        ("mode", Schema::string()),
        ("suggested_skills", Schema::array(Schema::string())),
        (
            "suggested_sections",
            Schema::array(Schema::object([
                ("title", Schema::string()),
                ("content", Schema::string()),
            ])),
        ),
        ("theme", Schema::one_of(&themes)),
        ("niche_summary", Schema::string()),
    ])
}

/// Reply contract for skill-gap analysis.
pub fn gap_check_schema() -> Schema {
    let course = Schema::object([
        ("course_name", Schema::string()),
        ("platform", Schema::string()),
        ("url", Schema::string()),
    ]);
    let gap = Schema::object([
        ("skill", Schema::string()),
        ("courses", Schema::array_of_at_least(course, COURSES_PER_GAP)),
    ]);
    Schema::object([
        ("mode", Schema::string()),
        ("skill_gaps", Schema::array_of_at_least(gap, 1)),
    ])
}

pub fn build(request: &CareerTaskRequest) -> Result<ServiceRequest> {
    request.validate()?;

    let built = match request {
        CareerTaskRequest::Generate { goal } => ServiceRequest {
            kind: TaskKind::Generate,
            prompt: prompts::render(prompts::GENERATE, &[("goal", goal.trim())]),
            schema: Some(generate_schema()),
            web_search: false,
        },
        CareerTaskRequest::GapCheck {
            cv,
            job_description,
        } => ServiceRequest {
            kind: TaskKind::GapCheck,
            prompt: prompts::render(
                prompts::GAP_CHECK,
                &[("cv", cv.trim()), ("jd", job_description.trim())],
            ),
            schema: Some(gap_check_schema()),
            web_search: true,
        },
    };
    Ok(built)
}

/// Free-text request scoped to a single section.
pub fn build_refinement(title: &str, current_text: &str, goal: &str) -> ServiceRequest {
    ServiceRequest {
        kind: TaskKind::Refine,
        prompt: prompts::render(
            prompts::REFINE,
            &[
                ("section", title),
                ("goal", goal.trim()),
                ("content", current_text),
            ],
        ),
        schema: None,
        web_search: false,
    }
}
