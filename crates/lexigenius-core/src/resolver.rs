//! Placeholder resolution over the effective document.
//!
//! The effective document is the clause list after applying only accepted
//! edits. Pending and rejected edits contribute nothing, and a pending or
//! rejected Modify/Remove leaves its target clause in the scan.

use std::collections::HashSet;

use crate::clause::{Clause, Edit, ReviewedEdit, accepted_edits};
use crate::token;

/// Distinct placeholder names in first-discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderSet {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl PlaceholderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `name` unless already present. Returns whether it was new.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.seen.contains(name) {
            return false;
        }
        self.seen.insert(name.to_string());
        self.names.push(name.to_string());
        true
    }

    /// Insert every token found in `text`.
    pub fn scan(&mut self, text: &str) {
        for name in token::names(text) {
            self.insert(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.names
    }
}

impl<'a> IntoIterator for &'a PlaceholderSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

/// Compute the placeholders that still need a value.
///
/// Scan order: every original clause not superseded by an accepted
/// Modify/Remove, then the accepted Modify and Add edits in list order.
pub fn resolve_placeholders(clauses: &[Clause], edits: &[ReviewedEdit]) -> PlaceholderSet {
    let superseded: HashSet<&str> = accepted_edits(edits)
        .filter_map(Edit::target_clause_id)
        .collect();

    let mut set = PlaceholderSet::new();

    for clause in clauses {
        if !superseded.contains(clause.id.as_str()) {
            set.scan(&clause.text);
        }
    }

    for edit in accepted_edits(edits) {
        match edit {
            Edit::Modify { new_text, .. } => set.scan(new_text),
            Edit::Add { new_clause, .. } => set.scan(&new_clause.text),
            Edit::Remove { .. } => {}
        }
    }

    set
}
