//! Split a plain-text document into clauses.
//!
//! Each non-blank line becomes one clause. Ids number lines by position,
//! blank ones included, so `clause_003` is always the third line of the source.

use crate::clause::Clause;

/// Format a 1-based paragraph position as a clause id: `3` → `clause_003`.
pub fn clause_id(position: usize) -> String {
    format!("clause_{position:03}")
}

pub fn clauses_from_text(text: &str) -> Vec<Clause> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let trimmed = line.trim();
            (!trimmed.is_empty()).then(|| Clause::new(clause_id(i + 1), trimmed))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_count_blank_lines() {
        let clauses = clauses_from_text("Title\n\n  First clause [A].  \r\n\nSecond.");
        let ids: Vec<_> = clauses.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["clause_001", "clause_003", "clause_005"]);
        assert_eq!(clauses[1].text, "First clause [A].");
    }

    #[test]
    fn blank_document_has_no_clauses() {
        assert!(clauses_from_text(" \n\t\n").is_empty());
    }

    #[test]
    fn ids_widen_past_999() {
        assert_eq!(clause_id(7), "clause_007");
        assert_eq!(clause_id(1234), "clause_1234");
    }
}
