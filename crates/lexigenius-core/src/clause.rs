//! Clause and edit types shared by the resolver, the assembler, and the service client.

use serde::{Deserialize, Serialize};

/// An ordered, immutable unit of original document content.
///
/// Identity is `id`; position in the clause list defines document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
}

impl Clause {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            text: text.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A proposed change to the clause sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Edit {
    /// Replace the text of an existing clause.
    Modify {
        target_clause_id: String,
        original_text: String,
        new_text: String,
        rationale: String,
    },
    /// Insert a new clause after `after_clause_id`, or at the end when `None`.
    Add {
        after_clause_id: Option<String>,
        new_clause: Clause,
        rationale: String,
    },
    /// Drop an existing clause.
    Remove {
        target_clause_id: String,
        original_text: String,
        rationale: String,
    },
}

impl Edit {
    /// The clause replaced or dropped by a Modify/Remove. `None` for Add.
    pub fn target_clause_id(&self) -> Option<&str> {
        match self {
            Edit::Modify {
                target_clause_id, ..
            }
            | Edit::Remove {
                target_clause_id, ..
            } => Some(target_clause_id),
            Edit::Add { .. } => None,
        }
    }

    /// Every existing clause id this edit refers to.
    pub fn referenced_clause_id(&self) -> Option<&str> {
        match self {
            Edit::Add {
                after_clause_id, ..
            } => after_clause_id.as_deref(),
            _ => self.target_clause_id(),
        }
    }

    pub fn rationale(&self) -> &str {
        match self {
            Edit::Modify { rationale, .. }
            | Edit::Add { rationale, .. }
            | Edit::Remove { rationale, .. } => rationale,
        }
    }

    /// Upper-case action label as used on the wire and in listings.
    pub fn action(&self) -> &'static str {
        match self {
            Edit::Modify { .. } => "MODIFY",
            Edit::Add { .. } => "ADD",
            Edit::Remove { .. } => "REMOVE",
        }
    }

    /// Wrap this edit in a fresh, pending review.
    pub fn pending(self) -> ReviewedEdit {
        ReviewedEdit::new(self)
    }
}

/// Review state of an edit. Starts as `Pending`; only user decisions move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Accepted => "accepted",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

/// A user's verdict on a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl From<Decision> for ReviewStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accept => ReviewStatus::Accepted,
            Decision::Reject => ReviewStatus::Rejected,
        }
    }
}

/// An edit together with its review status.
///
/// The status can only be changed through [`ReviewedEdit::review`], so an edit
/// never returns to `Pending` once decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewedEdit {
    pub edit: Edit,
    status: ReviewStatus,
}

impl ReviewedEdit {
    pub fn new(edit: Edit) -> Self {
        Self {
            edit,
            status: ReviewStatus::Pending,
        }
    }

    /// Builder form of [`review`](Self::review).
    pub fn with_decision(mut self, decision: Decision) -> Self {
        self.review(decision);
        self
    }

    /// Record a decision, overwriting any earlier one.
    pub fn review(&mut self, decision: Decision) {
        self.status = decision.into();
    }

    pub fn status(&self) -> ReviewStatus {
        self.status
    }

    pub fn is_accepted(&self) -> bool {
        self.status == ReviewStatus::Accepted
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReviewStatus::Pending
    }
}

/// Iterate the edits a user has accepted, in list order.
pub fn accepted_edits(edits: &[ReviewedEdit]) -> impl Iterator<Item = &Edit> {
    edits.iter().filter(|e| e.is_accepted()).map(|e| &e.edit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remove(id: &str) -> Edit {
        Edit::Remove {
            target_clause_id: id.into(),
            original_text: "old".into(),
            rationale: "not needed".into(),
        }
    }

    #[test]
    fn new_edits_start_pending() {
        let reviewed = remove("c1").pending();
        assert_eq!(reviewed.status(), ReviewStatus::Pending);
        assert!(!reviewed.is_accepted());
    }

    #[test]
    fn review_can_be_toggled() {
        let mut reviewed = remove("c1").pending();
        reviewed.review(Decision::Accept);
        assert_eq!(reviewed.status(), ReviewStatus::Accepted);
        reviewed.review(Decision::Reject);
        assert_eq!(reviewed.status(), ReviewStatus::Rejected);
    }

    #[test]
    fn accepted_edits_skips_pending_and_rejected() {
        let edits = vec![
            remove("c1").pending(),
            remove("c2").pending().with_decision(Decision::Accept),
            remove("c3").pending().with_decision(Decision::Reject),
        ];
        let ids: Vec<_> = accepted_edits(&edits)
            .filter_map(Edit::target_clause_id)
            .collect();
        assert_eq!(ids, ["c2"]);
    }

    #[test]
    fn add_references_its_anchor() {
        let add = Edit::Add {
            after_clause_id: Some("c4".into()),
            new_clause: Clause::new("c4a", "text"),
            rationale: String::new(),
        };
        assert_eq!(add.target_clause_id(), None);
        assert_eq!(add.referenced_clause_id(), Some("c4"));
        assert_eq!(add.action(), "ADD");
    }

    #[test]
    fn reviewed_edit_serializes_status() {
        let reviewed = remove("c1").pending().with_decision(Decision::Accept);
        let json = serde_json::to_value(&reviewed).unwrap();
        assert_eq!(json["status"], "accepted");
        assert_eq!(json["edit"]["action"], "remove");

        let parsed: ReviewedEdit = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, reviewed);
    }
}
