//! Final document assembly: apply accepted edits and substitute placeholder values.

use serde::{Deserialize, Serialize};

use crate::clause::{Clause, Edit, ReviewedEdit, accepted_edits};
use crate::token::{self, Segment};
use crate::value::{self, FormValues};

/// Where an emitted block's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockSource {
    Original,
    Modified,
    Added,
}

/// A run of output text within a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Run {
    Plain { text: String },
    /// A placeholder replaced by its rendered value.
    Filled { placeholder: String, text: String },
    /// A placeholder with no value, kept as the literal `[name]`.
    Unresolved { placeholder: String, text: String },
}

impl Run {
    pub fn text(&self) -> &str {
        match self {
            Run::Plain { text } | Run::Filled { text, .. } | Run::Unresolved { text, .. } => text,
        }
    }
}

/// One paragraph of the assembled document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The original clause id, or the new clause's id for added blocks.
    pub clause_id: String,
    pub source: BlockSource,
    pub runs: Vec<Run>,
}

impl Block {
    fn new(clause_id: &str, source: BlockSource, text: &str, values: &FormValues) -> Self {
        Self {
            clause_id: clause_id.to_string(),
            source,
            runs: substitute(text, values),
        }
    }

    /// The block's full text with substitutions applied.
    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }

    /// Placeholders in this block that had no value.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.runs.iter().filter_map(|r| match r {
            Run::Unresolved { placeholder, .. } => Some(placeholder.as_str()),
            _ => None,
        })
    }
}

/// Replace every token that has a non-empty value; leave the rest verbatim.
pub fn substitute(text: &str, values: &FormValues) -> Vec<Run> {
    token::segments(text)
        .into_iter()
        .map(|seg| match seg {
            Segment::Text(t) => Run::Plain { text: t.to_string() },
            Segment::Token { name, raw } => match value::filled(values, name) {
                Some(v) => Run::Filled {
                    placeholder: name.to_string(),
                    text: v.render(),
                },
                None => Run::Unresolved {
                    placeholder: name.to_string(),
                    text: raw.to_string(),
                },
            },
        })
        .collect()
}

/// Rebuild the document from the original clauses and the accepted edits.
///
/// Pending and rejected edits are treated as not accepted. Each clause is
/// dropped by an accepted Remove, replaced by the first accepted Modify, or
/// kept; accepted Adds anchored to it follow in list order. Unanchored Adds
/// are appended at the end in list order.
pub fn assemble(clauses: &[Clause], edits: &[ReviewedEdit], values: &FormValues) -> Vec<Block> {
    let accepted: Vec<&Edit> = accepted_edits(edits).collect();
    let mut blocks = Vec::with_capacity(clauses.len());

    for clause in clauses {
        let removed = accepted.iter().any(|e| {
            matches!(e, Edit::Remove { target_clause_id, .. } if *target_clause_id == clause.id)
        });

        if !removed {
            let replacement = accepted.iter().find_map(|e| match e {
                Edit::Modify {
                    target_clause_id,
                    new_text,
                    ..
                } if *target_clause_id == clause.id => Some(new_text.as_str()),
                _ => None,
            });
            blocks.push(match replacement {
                Some(new_text) => Block::new(&clause.id, BlockSource::Modified, new_text, values),
                None => Block::new(&clause.id, BlockSource::Original, &clause.text, values),
            });
        }

        for edit in &accepted {
            if let Edit::Add {
                after_clause_id: Some(anchor),
                new_clause,
                ..
            } = edit
                && *anchor == clause.id
            {
                blocks.push(Block::new(
                    &new_clause.id,
                    BlockSource::Added,
                    &new_clause.text,
                    values,
                ));
            }
        }
    }

    for edit in &accepted {
        if let Edit::Add {
            after_clause_id: None,
            new_clause,
            ..
        } = edit
        {
            blocks.push(Block::new(
                &new_clause.id,
                BlockSource::Added,
                &new_clause.text,
                values,
            ));
        }
    }

    blocks
}
