//! ElevateCV - AI-assisted CV drafting and skill-gap analysis
//!
//! Drafts a CV structure from a career goal, or compares an existing CV with a
//! job description and recommends courses for the missing skills. The
//! reasoning is delegated to Gemini; this crate owns the request/response
//! contract and the editable document state.

pub mod adapter;
pub mod ai;
pub mod app;
pub mod document;
pub mod error;
pub mod ingest;
pub mod models;
pub mod prompts;
pub mod render;
pub mod schema;
pub mod session;
pub mod task;

pub use error::{Error, Result};
