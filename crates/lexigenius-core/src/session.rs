//! Review session: one analysis result plus the user's decisions and form input.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assembler::{self, Block};
use crate::clause::{Clause, Decision, Edit, ReviewedEdit, accepted_edits};
use crate::error::WorkflowError;
use crate::resolver::{self, PlaceholderSet};
use crate::value::{self, FormValue, FormValues};

/// Where the workflow stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    Suggested,
    Done,
}

/// How a placeholder should be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Date,
}

/// A required placeholder presented as a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub filled: bool,
}

/// Check the inputs needed before an analysis request may be sent.
pub fn ensure_inputs(document_name: &str, scenario: &str) -> Result<(), WorkflowError> {
    if document_name.trim().is_empty() {
        return Err(WorkflowError::MissingDocument);
    }
    if scenario.trim().is_empty() {
        return Err(WorkflowError::MissingScenario);
    }
    Ok(())
}

/// Whether a placeholder takes a calendar date.
pub fn is_date_field(name: &str) -> bool {
    name.to_lowercase().contains("date")
}

/// Human label for a placeholder: underscores become spaces and each word
/// starts upper-case. `start_date` → `Start Date`.
pub fn field_label(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.chars() {
        let c = if c == '_' { ' ' } else { c };
        let is_word = c.is_ascii_alphanumeric();
        if is_word && !in_word {
            label.push(c.to_ascii_uppercase());
        } else {
            label.push(c);
        }
        in_word = is_word;
    }
    label
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub document_name: String,
    pub scenario: String,
    pub stage: Stage,
    clauses: Vec<Clause>,
    edits: Vec<ReviewedEdit>,
    #[serde(default)]
    values: FormValues,
}

impl Session {
    /// Start a session from one analysis response.
    ///
    /// Every edit starts pending. Edits that refer to a clause id not in
    /// `clauses` are dropped with a warning.
    pub fn new(
        document_name: impl Into<String>,
        scenario: impl Into<String>,
        clauses: Vec<Clause>,
        edits: Vec<Edit>,
    ) -> Self {
        let known: HashSet<&str> = clauses.iter().map(|c| c.id.as_str()).collect();
        let edits: Vec<ReviewedEdit> = edits
            .into_iter()
            .filter(|edit| match edit.referenced_clause_id() {
                Some(id) if !known.contains(id) => {
                    warn!(action = edit.action(), clause_id = id, "dropping suggestion for unknown clause");
                    false
                }
                _ => true,
            })
            .map(ReviewedEdit::new)
            .collect();

        Self {
            document_name: document_name.into(),
            scenario: scenario.into(),
            stage: Stage::Suggested,
            clauses,
            edits,
            values: FormValues::new(),
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn edits(&self) -> &[ReviewedEdit] {
        &self.edits
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Accepted edits in list order.
    pub fn accepted(&self) -> Vec<&Edit> {
        accepted_edits(&self.edits).collect()
    }

    /// Record a decision on the edit at `index` (zero-based).
    pub fn review(&mut self, index: usize, decision: Decision) -> Result<(), WorkflowError> {
        let len = self.edits.len();
        let edit = self.edits.get_mut(index).ok_or(WorkflowError::NoSuchEdit {
            position: index + 1,
            len,
        })?;
        edit.review(decision);
        debug!(index, status = edit.status().as_str(), "suggestion reviewed");
        self.reopen();
        Ok(())
    }

    pub fn review_all(&mut self, decision: Decision) {
        for edit in &mut self.edits {
            edit.review(decision);
        }
        self.reopen();
    }

    pub fn pending_count(&self) -> usize {
        self.edits.iter().filter(|e| e.is_pending()).count()
    }

    /// True once no edit is pending. A session without suggestions counts as reviewed.
    pub fn all_reviewed(&self) -> bool {
        self.pending_count() == 0
    }

    pub fn placeholders(&self) -> PlaceholderSet {
        resolver::resolve_placeholders(&self.clauses, &self.edits)
    }

    pub fn form_fields(&self) -> Vec<FormField> {
        self.placeholders()
            .iter()
            .map(|name| FormField {
                name: name.to_string(),
                label: field_label(name),
                kind: if is_date_field(name) {
                    FieldKind::Date
                } else {
                    FieldKind::Text
                },
                filled: value::filled(&self.values, name).is_some(),
            })
            .collect()
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: FormValue) {
        self.values.insert(name.into(), value);
        self.reopen();
    }

    /// Set a value from raw user input, parsing dates for date fields.
    pub fn set_input(&mut self, name: &str, raw: &str) -> Result<(), WorkflowError> {
        let value = if is_date_field(name) && !raw.trim().is_empty() {
            FormValue::parse_date(raw)?
        } else {
            FormValue::text(raw)
        };
        self.set_value(name, value);
        Ok(())
    }

    pub fn clear_value(&mut self, name: &str) -> bool {
        let removed = self.values.remove(name).is_some();
        if removed {
            self.reopen();
        }
        removed
    }

    /// Required placeholders without a non-empty value, in form order.
    pub fn missing_values(&self) -> Vec<String> {
        self.placeholders()
            .iter()
            .filter(|name| value::filled(&self.values, name).is_none())
            .map(str::to_string)
            .collect()
    }

    /// Clause ids whose accepted edits disagree: two Modifies, or a Modify
    /// and a Remove. Repeated Removes of one clause agree and are not listed.
    pub fn conflicts(&self) -> Vec<String> {
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        let mut order = Vec::new();
        for edit in accepted_edits(&self.edits) {
            let (id, is_modify) = match edit {
                Edit::Modify {
                    target_clause_id, ..
                } => (target_clause_id.as_str(), true),
                Edit::Remove {
                    target_clause_id, ..
                } => (target_clause_id.as_str(), false),
                Edit::Add { .. } => continue,
            };
            let (modifies, removes) = counts.entry(id).or_insert((0, 0));
            let was_conflict = *modifies >= 2 || (*modifies >= 1 && *removes >= 1);
            if is_modify {
                *modifies += 1;
            } else {
                *removes += 1;
            }
            let is_conflict = *modifies >= 2 || (*modifies >= 1 && *removes >= 1);
            if is_conflict && !was_conflict {
                order.push(id.to_string());
            }
        }
        order
    }

    /// Guard before final generation.
    pub fn ensure_ready(&self) -> Result<(), WorkflowError> {
        let pending = self.pending_count();
        if pending > 0 {
            return Err(WorkflowError::PendingEdits { count: pending });
        }
        if let Some(clause_id) = self.conflicts().into_iter().next() {
            return Err(WorkflowError::ConflictingEdits { clause_id });
        }
        let missing = self.missing_values();
        if !missing.is_empty() {
            return Err(WorkflowError::UnfilledPlaceholders { names: missing });
        }
        Ok(())
    }

    pub fn assemble(&self) -> Vec<Block> {
        assembler::assemble(&self.clauses, &self.edits, &self.values)
    }

    pub fn mark_done(&mut self) {
        self.stage = Stage::Done;
    }

    /// Discard the analysis result, decisions and form values.
    pub fn reset(&mut self) {
        *self = Session::default();
    }

    fn reopen(&mut self) {
        if self.stage == Stage::Done {
            self.stage = Stage::Suggested;
        }
    }
}
