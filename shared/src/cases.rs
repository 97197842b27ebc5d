use serde::{Deserialize, Serialize};

use crate::api::{CaseDraft, CaseId, CaseListResponse, CaseSummary, DownloadLinks};
use crate::error::AppError;

pub const MAX_CASE_TITLE_LEN: usize = 200;

/// The case list as last loaded from the server, plus the user's choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseCatalog {
    cases: Vec<CaseSummary>,
    selected: Option<CaseId>,
    /// Links for the most recently authored case, keyed by its id.
    downloads: Option<(CaseId, DownloadLinks)>,
    loaded: bool,
}

impl CaseCatalog {
    /// Replaces the list and picks the active case, taking the first listed
    /// of `prefer`, the previous selection and the server default, and
    /// otherwise the first entry.
    pub fn replace(&mut self, list: CaseListResponse, prefer: Option<&CaseId>) -> Option<&CaseId> {
        let contains = |id: &CaseId| list.cases.iter().any(|c| &c.id == id);

        let selected = prefer
            .filter(|id| contains(id))
            .cloned()
            .or_else(|| self.selected.take().filter(|id| contains(id)))
            .or_else(|| list.default_case_id.clone().filter(|id| contains(id)))
            .or_else(|| list.cases.first().map(|c| c.id.clone()));

        self.cases = list.cases;
        self.selected = selected;
        self.loaded = true;
        self.selected.as_ref()
    }

    /// Returns `false` and keeps the current selection if `id` is not listed.
    pub fn select(&mut self, id: &CaseId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.selected = Some(id.clone());
        true
    }

    #[must_use]
    pub fn get(&self, id: &CaseId) -> Option<&CaseSummary> {
        self.cases.iter().find(|c| &c.id == id)
    }

    #[must_use]
    pub fn label_for(&self, id: &CaseId) -> Option<&str> {
        self.get(id).map(CaseSummary::display_label)
    }

    #[must_use]
    pub fn selected(&self) -> Option<&CaseId> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn cases(&self) -> &[CaseSummary] {
        &self.cases
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn set_downloads(&mut self, case_id: CaseId, links: DownloadLinks) {
        self.downloads = Some((case_id, links));
    }

    /// Forgets the authored-case links unless they belong to `case_id`.
    pub fn retain_downloads_for(&mut self, case_id: Option<&CaseId>) {
        if self.downloads.as_ref().map(|(id, _)| id) != case_id {
            self.downloads = None;
        }
    }

    #[must_use]
    pub fn downloads(&self) -> Option<&DownloadLinks> {
        self.downloads.as_ref().map(|(_, links)| links)
    }
}

impl CaseDraft {
    /// Every field is required; the title is also length-limited.
    pub fn validate(&self) -> Result<(), AppError> {
        let fields = [
            ("title", &self.title),
            ("history_text", &self.history_text),
            ("exam_text", &self.exam_text),
            ("assigned_diagnosis", &self.assigned_diagnosis),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("{field} is required"))
                    .with_context("field", field));
            }
        }
        if self.title.chars().count() > MAX_CASE_TITLE_LEN {
            return Err(AppError::validation(format!(
                "title must be at most {MAX_CASE_TITLE_LEN} characters"
            ))
            .with_context("field", "title"));
        }
        Ok(())
    }
}
