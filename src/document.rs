//! Editable CV document held for the length of a session.
//!
//! The document starts from a generated draft and then diverges under user
//! edits and section refinements. Refinements are tracked per section title
//! with their own tokens so that sections never wait on each other.

use crate::models::{GeneratedDraft, Theme};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_USER_NAME: &str = "YOUR FULL NAME";
pub const DEFAULT_USER_LOCATION: &str = "City, Country";
pub const EMAIL_FIELD: &str = "email";
pub const PHONE_FIELD: &str = "phone";
const DEFAULT_EMAIL: &str = "CONTACT@DOMAIN.COM";
const DEFAULT_PHONE: &str = "+1 (555) 000-0000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub text: String,
}

/// Handle for one in-flight refinement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinementTicket {
    title: String,
    epoch: u64,
    token: u64,
}

impl RefinementTicket {
    pub fn title(&self) -> &str {
        &self.title
    }
}

#[derive(Debug)]
pub enum RefinementOutcome {
    /// The section now holds the refined text.
    Applied,
    /// The call failed; the section keeps its previous text.
    Failed(Error),
    /// A later refinement of the same section was issued; this result was dropped.
    Superseded,
    /// The document was reset or regenerated since the refinement started.
    Stale,
}

#[derive(Debug, Clone)]
pub struct DocumentModel {
    user_name: String,
    user_location: String,
    contact_fields: BTreeMap<String, String>,
    sections: Vec<Section>,
    skills: Vec<String>,
    headline: String,
    refining: HashMap<String, u64>,
    selected_theme: Theme,
    epoch: u64,
    next_token: u64,
}

impl Default for DocumentModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentModel {
    pub fn new() -> Self {
        let contact_fields = BTreeMap::from([
            (EMAIL_FIELD.to_string(), DEFAULT_EMAIL.to_string()),
            (PHONE_FIELD.to_string(), DEFAULT_PHONE.to_string()),
        ]);

        Self {
            user_name: DEFAULT_USER_NAME.to_string(),
            user_location: DEFAULT_USER_LOCATION.to_string(),
            contact_fields,
            sections: Vec::new(),
            skills: Vec::new(),
            headline: String::new(),
            refining: HashMap::new(),
            selected_theme: Theme::default(),
            epoch: 0,
            next_token: 0,
        }
    }

    pub fn from_draft(draft: &GeneratedDraft) -> Self {
        let mut document = Self::new();
        document.install_draft(draft);
        document
    }

    /// Replaces sections, skills, headline and theme with the draft's.
    ///
    /// A title repeated in the draft keeps its first position and takes the
    /// later content. Identity and contact fields are left as the user set them.
    pub fn install_draft(&mut self, draft: &GeneratedDraft) {
        let mut sections: Vec<Section> = Vec::with_capacity(draft.sections.len());
        for entry in &draft.sections {
            match sections.iter_mut().find(|s| s.title == entry.title) {
                Some(existing) => existing.text = entry.content.clone(),
                None => sections.push(Section {
                    title: entry.title.clone(),
                    text: entry.content.clone(),
                }),
            }
        }

        self.sections = sections;
        self.skills = draft.skills.clone();
        self.headline = draft.niche_summary.clone();
        self.selected_theme = draft.theme;
        self.invalidate_refinements();
    }

    /// Back to an empty document with default identity fields.
    pub fn reset(&mut self) {
        let epoch = self.epoch;
        *self = Self::new();
        self.epoch = epoch + 1;
    }

    /// Drops every in-flight refinement; their results will be discarded.
    pub fn invalidate_refinements(&mut self) {
        self.epoch += 1;
        self.refining.clear();
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Names are displayed in capitals, so they are stored that way.
    pub fn set_user_name(&mut self, name: &str) {
        self.user_name = name.to_uppercase();
    }

    pub fn user_location(&self) -> &str {
        &self.user_location
    }

    pub fn set_user_location(&mut self, location: &str) {
        self.user_location = location.to_string();
    }

    pub fn contact_fields(&self) -> &BTreeMap<String, String> {
        &self.contact_fields
    }

    pub fn contact_field(&self, name: &str) -> Option<&str> {
        self.contact_fields.get(name).map(String::as_str)
    }

    pub fn set_contact_field(&mut self, name: &str, value: &str) {
        self.contact_fields
            .insert(name.to_string(), value.to_string());
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, title: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.text.as_str())
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.title.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn edit_section(&mut self, title: &str, text: &str) -> Result<()> {
        let section = self
            .sections
            .iter_mut()
            .find(|s| s.title == title)
            .ok_or_else(|| Error::UnknownSection(title.to_string()))?;
        section.text = text.to_string();
        Ok(())
    }

    /// Niche summary of the installed draft; empty before the first draft.
    pub fn headline(&self) -> &str {
        &self.headline
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn theme(&self) -> Theme {
        self.selected_theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.selected_theme = theme;
    }

    pub fn is_refining(&self, title: &str) -> bool {
        self.refining.contains_key(title)
    }

    /// Marks `title` as refining and returns the ticket its result must present.
    ///
    /// Starting a second refinement of the same title supersedes the first.
    pub fn begin_refinement(&mut self, title: &str) -> Result<RefinementTicket> {
        if self.section(title).is_none() {
            return Err(Error::UnknownSection(title.to_string()));
        }

        self.next_token += 1;
        let token = self.next_token;
        self.refining.insert(title.to_string(), token);

        Ok(RefinementTicket {
            title: title.to_string(),
            epoch: self.epoch,
            token,
        })
    }

    pub fn finish_refinement(
        &mut self,
        ticket: RefinementTicket,
        result: Result<String>,
    ) -> RefinementOutcome {
        if ticket.epoch != self.epoch {
            tracing::debug!("Discarding refinement of '{}' from an older document", ticket.title);
            return RefinementOutcome::Stale;
        }

        if self.refining.get(&ticket.title) != Some(&ticket.token) {
            tracing::debug!("Discarding superseded refinement of '{}'", ticket.title);
            return RefinementOutcome::Superseded;
        }

        self.refining.remove(&ticket.title);

        match result {
            Ok(text) => match self.edit_section(&ticket.title, &text) {
                Ok(()) => RefinementOutcome::Applied,
                Err(e) => RefinementOutcome::Failed(e),
            },
            Err(e) => {
                tracing::warn!("Refinement of '{}' failed: {}", ticket.title, e);
                RefinementOutcome::Failed(e)
            }
        }
    }
}
