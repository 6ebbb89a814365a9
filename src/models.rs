//! Data models and structures
//!
//! Defines the career task requests, the drafts and gap reports produced by
//! the reasoning service, and the environment configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// The tab a session is on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TaskMode {
    #[default]
    #[serde(rename = "generate")]
    Generate,
    #[serde(rename = "check")]
    GapCheck,
}

/// One top-level request to the reasoning service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CareerTaskRequest {
    Generate { goal: String },
    GapCheck { cv: String, job_description: String },
}

impl CareerTaskRequest {
    pub fn mode(&self) -> TaskMode {
        match self {
            CareerTaskRequest::Generate { .. } => TaskMode::Generate,
            CareerTaskRequest::GapCheck { .. } => TaskMode::GapCheck,
        }
    }

    /// Rejects blank required fields before anything is sent.
    pub fn validate(&self) -> crate::Result<()> {
        fn require(value: &str, field: &str) -> crate::Result<()> {
            if value.trim().is_empty() {
                return Err(crate::Error::InputValidation(format!("{} is required", field)));
            }
            Ok(())
        }

        match self {
            CareerTaskRequest::Generate { goal } => require(goal, "career goal"),
            CareerTaskRequest::GapCheck {
                cv,
                job_description,
            } => {
                require(cv, "CV text")?;
                require(job_description, "job description")
            }
        }
    }
}

/// Visual palette family suggested by the service and switchable by the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Tech,
    Corporate,
    Creative,
    Medical,
    Finance,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::Tech,
        Theme::Corporate,
        Theme::Creative,
        Theme::Medical,
        Theme::Finance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Tech => "tech",
            Theme::Corporate => "corporate",
            Theme::Creative => "creative",
            Theme::Medical => "medical",
            Theme::Finance => "finance",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Theme::ALL.iter().map(Theme::as_str).collect();
                format!("Unknown theme '{}'. Expected one of: {}", s, names.join(", "))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionDraft {
    pub title: String,
    pub content: String,
}

/// CV structure proposed by the service before any user edits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedDraft {
    #[serde(rename = "suggested_skills")]
    pub skills: Vec<String>,
    #[serde(rename = "suggested_sections")]
    pub sections: Vec<SectionDraft>,
    pub theme: Theme,
    pub niche_summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    pub course_name: String,
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillGap {
    pub skill: String,
    pub courses: Vec<Course>,
}

/// Provenance citation returned by a search-augmented call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GapReport {
    #[serde(rename = "skill_gaps")]
    pub gaps: Vec<SkillGap>,
    #[serde(default)]
    pub grounding_sources: Vec<GroundingSource>,
}

/// Outcome of the most recent successful task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Draft(GeneratedDraft),
    Gaps(GapReport),
}

impl TaskOutcome {
    pub fn mode(&self) -> TaskMode {
        match self {
            TaskOutcome::Draft(_) => TaskMode::Generate,
            TaskOutcome::Gaps(_) => TaskMode::GapCheck,
        }
    }
}

// Configuration
pub const DEFAULT_GENERATE_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_GAP_CHECK_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_REFINE_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Which Gemini model serves each kind of call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRoster {
    pub generate: String,
    pub gap_check: String,
    pub refine: String,
}

impl Default for ModelRoster {
    fn default() -> Self {
        Self {
            generate: DEFAULT_GENERATE_MODEL.to_string(),
            gap_check: DEFAULT_GAP_CHECK_MODEL.to_string(),
            refine: DEFAULT_REFINE_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: Option<String>,
    pub models: ModelRoster,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let gemini_api_key = non_empty("GEMINI_API_KEY")
            .or_else(|| non_empty("API_KEY"))
            .ok_or_else(|| crate::Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let defaults = ModelRoster::default();
        let models = ModelRoster {
            generate: non_empty("GENERATE_MODEL").unwrap_or(defaults.generate),
            gap_check: non_empty("GAP_CHECK_MODEL").unwrap_or(defaults.gap_check),
            refine: non_empty("REFINE_MODEL").unwrap_or(defaults.refine),
        };

        let request_timeout = match non_empty("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                crate::Error::Config(format!("REQUEST_TIMEOUT_SECS must be an integer, got '{}'", raw))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            gemini_api_key,
            gemini_base_url: non_empty("GEMINI_BASE_URL"),
            models,
            request_timeout: Duration::from_secs(request_timeout),
        })
    }
}
