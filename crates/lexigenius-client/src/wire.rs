//! Wire types exchanged with the analysis and generation services.

use std::collections::{BTreeMap, HashSet};

use lexigenius_core::{Clause, Edit, FormValues};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Sentinel action the analysis service uses to report a failure.
pub const ERROR_ACTION: &str = "ERROR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireClause {
    pub clause_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause_title: Option<String>,
    pub text: String,
}

impl From<WireClause> for Clause {
    fn from(w: WireClause) -> Self {
        let clause = Clause::new(w.clause_id, w.text);
        match w.clause_title {
            Some(title) => clause.with_title(title),
            None => clause,
        }
    }
}

impl From<&Clause> for WireClause {
    fn from(c: &Clause) -> Self {
        WireClause {
            clause_id: c.id.clone(),
            clause_title: c.title.clone(),
            text: c.text.clone(),
        }
    }
}

/// A suggestion as the service sends it: one flat shape for every action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireSuggestion {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_clause_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_clause: Option<WireClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WireSuggestion {
    pub fn is_error(&self) -> bool {
        self.action.eq_ignore_ascii_case(ERROR_ACTION)
    }

    /// Convert into the typed edit, checking the fields each action needs.
    ///
    /// An ADD anchor comes from `after_clause_id`, falling back to `clause_id`.
    pub fn into_edit(self) -> Result<Edit, ServiceError> {
        let action = self.action.to_ascii_uppercase();
        let rationale = self.reason.unwrap_or_default();
        let missing = |field: &str| ServiceError::Decode(format!("{action} suggestion without `{field}`"));

        match action.as_str() {
            "MODIFY" => Ok(Edit::Modify {
                target_clause_id: self.clause_id.ok_or_else(|| missing("clause_id"))?,
                original_text: self.original_text.unwrap_or_default(),
                new_text: self.new_text.ok_or_else(|| missing("new_text"))?,
                rationale,
            }),
            "ADD" => Ok(Edit::Add {
                after_clause_id: self.after_clause_id.or(self.clause_id),
                new_clause: self.new_clause.ok_or_else(|| missing("new_clause"))?.into(),
                rationale,
            }),
            "REMOVE" => Ok(Edit::Remove {
                target_clause_id: self.clause_id.ok_or_else(|| missing("clause_id"))?,
                original_text: self.original_text.unwrap_or_default(),
                rationale,
            }),
            _ => Err(ServiceError::Decode(format!(
                "unknown suggestion action {:?}",
                self.action
            ))),
        }
    }
}

impl From<&Edit> for WireSuggestion {
    fn from(edit: &Edit) -> Self {
        let mut wire = WireSuggestion {
            action: edit.action().to_string(),
            reason: Some(edit.rationale().to_string()),
            ..Default::default()
        };
        match edit {
            Edit::Modify {
                target_clause_id,
                original_text,
                new_text,
                ..
            } => {
                wire.clause_id = Some(target_clause_id.clone());
                wire.original_text = Some(original_text.clone());
                wire.new_text = Some(new_text.clone());
            }
            Edit::Add {
                after_clause_id,
                new_clause,
                ..
            } => {
                wire.after_clause_id = after_clause_id.clone();
                wire.new_clause = Some(new_clause.into());
            }
            Edit::Remove {
                target_clause_id,
                original_text,
                ..
            } => {
                wire.clause_id = Some(target_clause_id.clone());
                wire.original_text = Some(original_text.clone());
            }
        }
        wire
    }
}

/// Body of a successful `POST /api/analyze`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(rename = "originalDoc", default)]
    pub original_doc: Vec<WireClause>,
    #[serde(default)]
    pub suggestions: Vec<WireSuggestion>,
}

impl AnalysisResponse {
    /// Convert into clauses and edits.
    ///
    /// An `ERROR` sentinel anywhere in the suggestions fails the whole
    /// response with its reason. Clause ids must be non-empty and unique.
    pub fn into_parts(self) -> Result<(Vec<Clause>, Vec<Edit>), ServiceError> {
        if let Some(sentinel) = self.suggestions.iter().find(|s| s.is_error()) {
            let reason = sentinel
                .reason
                .clone()
                .unwrap_or_else(|| "analysis failed".to_string());
            return Err(ServiceError::Analysis(reason));
        }

        let mut seen = HashSet::new();
        for clause in &self.original_doc {
            if clause.clause_id.trim().is_empty() {
                return Err(ServiceError::Decode(format!(
                    "clause without an id: {:?}",
                    clause.text
                )));
            }
            if !seen.insert(clause.clause_id.as_str()) {
                return Err(ServiceError::Decode(format!(
                    "duplicate clause id {:?}",
                    clause.clause_id
                )));
            }
        }

        let clauses = self.original_doc.into_iter().map(Clause::from).collect();
        let edits = self
            .suggestions
            .into_iter()
            .map(WireSuggestion::into_edit)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((clauses, edits))
    }
}

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub form_values: BTreeMap<String, String>,
    pub accepted_suggestions: Vec<WireSuggestion>,
    pub filename: String,
}

impl GenerateRequest {
    pub fn new<'a>(
        values: &FormValues,
        accepted: impl IntoIterator<Item = &'a Edit>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            form_values: wire_values(values),
            accepted_suggestions: accepted.into_iter().map(WireSuggestion::from).collect(),
            filename: filename.into(),
        }
    }
}

/// Form values as the services expect them: rendered strings, empties omitted.
pub fn wire_values(values: &FormValues) -> BTreeMap<String, String> {
    values
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.clone(), v.render()))
        .collect()
}

/// Error body shape: `{"error": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Pull a human-readable message out of a non-success response body.
pub(crate) fn server_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => body.trim().to_string(),
    }
}
