//! Card display for suggestions and placeholder forms.
//!
//! Each suggestion renders as a numbered card with its action, status,
//! rationale, and the text it changes. Numbers are 1-based and match the
//! positions `review` accepts.

use std::fmt::Write;

use lexigenius_core::{Edit, FieldKind, FormField, ReviewedEdit, Session};

const LABEL_WIDTH: usize = 12;
const PREVIEW_CHARS: usize = 60;

// ── Public API ──

/// Print the session header and one card per suggestion.
pub fn print_review(session: &Session) {
    println!("=== {} ===", session.document_name);
    println!("Scenario: {}", first_line(&session.scenario));
    println!(
        "{} clauses, {} suggestions, {} pending",
        session.clauses().len(),
        session.edits().len(),
        session.pending_count()
    );
    println!();

    if session.edits().is_empty() {
        println!("No changes suggested.");
        return;
    }
    for (i, reviewed) in session.edits().iter().enumerate() {
        print!("{}", edit_card(i + 1, reviewed));
        println!();
    }

    if session.all_reviewed() {
        println!("All reviewed. Fill in the details with `lexigenius fill`.");
    } else {
        println!("Accept or reject each suggestion with `lexigenius review`.");
    }
}

/// Print the placeholder form as a table.
pub fn print_form(fields: &[FormField]) {
    if fields.is_empty() {
        println!("No details required based on the accepted clauses.");
        return;
    }
    print!("{}", form_table(fields));
}

// ── Card rendering ──

fn edit_card(position: usize, reviewed: &ReviewedEdit) -> String {
    let edit = &reviewed.edit;
    let mut out = String::new();

    let subject = match edit {
        Edit::Modify {
            target_clause_id, ..
        }
        | Edit::Remove {
            target_clause_id, ..
        } => target_clause_id.clone(),
        Edit::Add { new_clause, .. } => new_clause.id.clone(),
    };
    let _ = writeln!(
        out,
        "#{position:<3} {:<7} {:<20} [{}]",
        edit.action(),
        subject,
        reviewed.status().as_str()
    );
    field(&mut out, "Rationale", edit.rationale());

    match edit {
        Edit::Modify {
            original_text,
            new_text,
            ..
        } => {
            field(&mut out, "Original", original_text);
            field(&mut out, "Suggestion", new_text);
        }
        Edit::Add {
            after_clause_id,
            new_clause,
            ..
        } => {
            if let Some(title) = &new_clause.title {
                field(&mut out, "Title", title);
            }
            field(&mut out, "New clause", &new_clause.text);
            field(&mut out, "After", after_clause_id.as_deref().unwrap_or("(end)"));
        }
        Edit::Remove { original_text, .. } => {
            field(&mut out, "Remove", original_text);
        }
    }
    out
}

fn form_table(fields: &[FormField]) -> String {
    let width = fields
        .iter()
        .map(|f| f.label.chars().count())
        .max()
        .unwrap_or(0)
        .max(LABEL_WIDTH);

    let mut out = String::new();
    for f in fields {
        let kind = match f.kind {
            FieldKind::Text => "text",
            FieldKind::Date => "date",
        };
        let state = if f.filled { "filled" } else { "missing" };
        let _ = write!(out, "  {:<width$}  {:<4}  {:<7}", f.label, kind, state);
        if f.label != f.name {
            let _ = write!(out, "  [{}]", f.name);
        }
        out.push('\n');
    }
    out
}

// ── Helpers ──

/// Write a labelled value; continuation lines are indented under the value.
fn field(out: &mut String, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let indent = " ".repeat(LABEL_WIDTH + 3);
    for (i, line) in value.lines().enumerate() {
        if i == 0 {
            let _ = writeln!(out, "  {label:<LABEL_WIDTH$} {line}");
        } else {
            let _ = writeln!(out, "{indent}{line}");
        }
    }
}

fn first_line(text: &str) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > PREVIEW_CHARS {
        let cut: String = line.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
