//! User-supplied placeholder values.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// Long-form calendar date, e.g. "January 5, 2025".
const LONG_DATE: &str = "%B %-d, %Y";

/// Accepted input spellings for date fields.
const DATE_INPUTS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%B %d %Y", "%d %B %Y"];

/// A value typed into a placeholder field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FormValue {
    Text(String),
    Date(NaiveDate),
}

/// Placeholder name → value. Ordered so session files diff cleanly.
pub type FormValues = BTreeMap<String, FormValue>;

impl FormValue {
    pub fn text(s: impl Into<String>) -> Self {
        FormValue::Text(s.into())
    }

    /// Empty text counts as "not filled in"; a date is always filled.
    pub fn is_empty(&self) -> bool {
        match self {
            FormValue::Text(s) => s.is_empty(),
            FormValue::Date(_) => false,
        }
    }

    /// The form substituted into the document.
    pub fn render(&self) -> String {
        match self {
            FormValue::Text(s) => s.clone(),
            FormValue::Date(d) => d.format(LONG_DATE).to_string(),
        }
    }

    /// Parse a date typed on the command line.
    pub fn parse_date(input: &str) -> Result<Self, WorkflowError> {
        let trimmed = input.trim();
        DATE_INPUTS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
            .map(FormValue::Date)
            .ok_or_else(|| WorkflowError::InvalidDate(input.to_string()))
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Look up a value that is present and non-empty.
pub fn filled<'a>(values: &'a FormValues, name: &str) -> Option<&'a FormValue> {
    values.get(name).filter(|v| !v.is_empty())
}

/// Split a `NAME=VALUE` assignment at the first `=`.
///
/// The name is trimmed; the value is kept verbatim so deliberate spacing survives.
pub fn parse_assignment(input: &str) -> Result<(&str, &str), WorkflowError> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| WorkflowError::InvalidAssignment(input.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(WorkflowError::InvalidAssignment(input.to_string()));
    }
    Ok((name, value))
}
