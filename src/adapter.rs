//! Turns raw service replies into typed drafts and gap reports.
//!
//! Every function here is pure: a caller only mutates its models after one of
//! these returns `Ok`, so a bad reply can never leave half a result installed.

use crate::models::{GapReport, GeneratedDraft, GroundingSource};
use crate::schema::Schema;
use crate::task;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;

fn parse_payload(payload: &str) -> Result<Value> {
    serde_json::from_str(payload.trim()).map_err(|e| {
        tracing::warn!("Service reply is not valid JSON: {}", e);
        Error::MalformedResponse(e.to_string())
    })
}

fn decode_against<T: DeserializeOwned>(schema: &Schema, value: Value) -> Result<T> {
    schema.validate(&value).map_err(|violation| {
        tracing::warn!("Service reply violates schema: {}", violation);
        Error::SchemaViolation(violation.to_string())
    })?;
    serde_json::from_value(value).map_err(|e| Error::SchemaViolation(e.to_string()))
}

pub fn decode_draft(payload: &str) -> Result<GeneratedDraft> {
    let value = parse_payload(payload)?;
    let draft: GeneratedDraft = decode_against(&task::generate_schema(), value)?;

    if draft.sections.is_empty() {
        return Err(Error::EmptyGeneration);
    }

    let mut seen = HashSet::new();
    for section in &draft.sections {
        if !seen.insert(section.title.as_str()) {
            return Err(Error::SchemaViolation(format!(
                "duplicate section title '{}'",
                section.title
            )));
        }
    }

    Ok(draft)
}

pub fn decode_gap_report(
    payload: &str,
    grounding_sources: Vec<GroundingSource>,
) -> Result<GapReport> {
    let value = parse_payload(payload)?;
    let mut report: GapReport = decode_against(&task::gap_check_schema(), value)?;
    report.grounding_sources = grounding_sources;
    Ok(report)
}

/// Refinements are free text; only surrounding whitespace is dropped.
pub fn decode_refinement(payload: &str) -> Result<String> {
    let text = payload.trim();
    if text.is_empty() {
        return Err(Error::Refinement("service returned empty text".to_string()));
    }
    Ok(text.to_string())
}
