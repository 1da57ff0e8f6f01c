//! Subcommand handlers.
//!
//! Each handler loads the session it needs, applies one workflow step, and
//! saves the session only after the step fully succeeds, so a failed call
//! leaves the previous state on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use lexigenius_client::{AnalysisResponse, AnalyzeRequest, ServiceClient};
use lexigenius_core::{
    Decision, OutputFormat, Session, Stage, clauses_from_text, resolve_placeholders, session, value,
};
use tracing::{info, warn};

use crate::generate::{self, GenerateStats};
use crate::{AnalyzeArgs, Cli, Command, FillArgs, GenerateArgs, ReviewArgs, display, session_file};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = ServiceClient::new(cli.service_url);
    let session_path = cli.session;

    match cli.command {
        Command::Templates => templates(&client).await,
        Command::FetchTemplate { name, output } => fetch_template(&client, &name, output).await,
        Command::Analyze(args) => analyze(&client, &session_path, args).await,
        Command::Show => {
            display::print_review(&load_active(&session_path)?);
            Ok(())
        }
        Command::Review(args) => review(&session_path, args),
        Command::Placeholders => placeholders(&session_path),
        Command::Fill(args) => fill(&session_path, args),
        Command::Generate(args) => generate(&client, &session_path, args).await,
        Command::Scan { path } => scan(&path),
        Command::Reset => reset(&session_path),
    }
}

/// Load the session and require an analysis to be in progress.
fn load_active(session_path: &Path) -> anyhow::Result<Session> {
    let session = session_file::load(session_path)?;
    if session.stage == Stage::Idle {
        bail!("no review in progress (start one with `lexigenius analyze`)");
    }
    Ok(session)
}

async fn templates(client: &ServiceClient) -> anyhow::Result<()> {
    let names = client
        .list_templates()
        .await
        .context("could not fetch templates")?;
    if names.is_empty() {
        println!("The template library is empty.");
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

async fn fetch_template(client: &ServiceClient, name: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let bytes = client
        .fetch_template(name)
        .await
        .with_context(|| format!("could not load template {name}"))?;
    let output = output.unwrap_or_else(|| PathBuf::from(name));
    session_file::write_atomic(&output, &bytes)?;
    println!("Saved {} ({} bytes)", output.display(), bytes.len());
    Ok(())
}

async fn analyze(client: &ServiceClient, session_path: &Path, args: AnalyzeArgs) -> anyhow::Result<()> {
    let scenario = match (&args.scenario, &args.scenario_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?,
        (None, None) => String::new(),
    };
    let document_name = args
        .document
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    session::ensure_inputs(&document_name, &scenario)?;

    let document = std::fs::read(&args.document)
        .with_context(|| format!("reading document {}", args.document.display()))?;

    let response = match &args.suggestions {
        Some(path) => {
            info!(path = %path.display(), "loading saved analysis");
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("reading analysis {}", path.display()))?;
            serde_json::from_str::<AnalysisResponse>(&data)
                .with_context(|| format!("parsing analysis {}", path.display()))?
        }
        None => {
            let form_values = if args.keep_values && session_path.exists() {
                let previous = session_file::load(session_path).context("--keep-values needs a readable session")?;
                Some(previous.values().clone())
            } else {
                if args.keep_values {
                    warn!(path = %session_path.display(), "no previous session; sending no form values");
                }
                None
            };
            let request = AnalyzeRequest {
                document_name: document_name.clone(),
                document,
                scenario: scenario.clone(),
                form_values,
            };
            eprintln!("Analyzing {document_name}...");
            client.analyze(&request).await.context("analysis failed")?
        }
    };

    let (clauses, edits) = response.into_parts().context("analysis failed")?;
    let session = Session::new(document_name, scenario, clauses, edits);
    session_file::save(session_path, &session)?;

    println!(
        "{} clauses, {} suggestions to review. Next: `lexigenius show`.",
        session.clauses().len(),
        session.edits().len()
    );
    Ok(())
}

fn review(session_path: &Path, args: ReviewArgs) -> anyhow::Result<()> {
    let mut session = load_active(session_path)?;

    if args.accept_all {
        session.review_all(Decision::Accept);
    }
    if args.reject_all {
        session.review_all(Decision::Reject);
    }
    let decisions = args
        .accept
        .iter()
        .map(|&n| (n, Decision::Accept))
        .chain(args.reject.iter().map(|&n| (n, Decision::Reject)));
    for (position, decision) in decisions {
        let index = position
            .checked_sub(1)
            .context("suggestions are numbered from 1")?;
        session.review(index, decision)?;
    }

    session_file::save(session_path, &session)?;

    let pending = session.pending_count();
    if pending == 0 {
        println!(
            "All reviewed. {} placeholder(s) to fill: `lexigenius placeholders`.",
            session.placeholders().len()
        );
    } else {
        println!("{pending} suggestion(s) still pending.");
    }
    Ok(())
}

fn placeholders(session_path: &Path) -> anyhow::Result<()> {
    let session = load_active(session_path)?;
    if !session.all_reviewed() {
        eprintln!(
            "note: {} suggestion(s) pending; the list may change after review.",
            session.pending_count()
        );
    }
    display::print_form(&session.form_fields());
    Ok(())
}

fn fill(session_path: &Path, args: FillArgs) -> anyhow::Result<()> {
    let mut session = load_active(session_path)?;
    let required = session.placeholders();

    for assignment in &args.set {
        let (name, raw) = value::parse_assignment(assignment)?;
        if !required.contains(name) {
            warn!(placeholder = name, "not a placeholder of the current document");
            eprintln!("warning: [{name}] does not appear in the current document");
        }
        session.set_input(name, raw)?;
    }
    for name in &args.clear {
        if !session.clear_value(name) {
            eprintln!("warning: [{name}] had no value");
        }
    }

    session_file::save(session_path, &session)?;

    let missing = session.missing_values();
    if missing.is_empty() {
        println!("All details filled. Next: `lexigenius generate`.");
    } else {
        println!("Still missing: {}", missing.join(", "));
    }
    Ok(())
}

async fn generate(client: &ServiceClient, session_path: &Path, args: GenerateArgs) -> anyhow::Result<()> {
    let mut session = load_active(session_path)?;
    if !args.draft {
        session
            .ensure_ready()
            .context("the document is not ready; pass --draft to write it anyway")?;
    }

    let format = OutputFormat::from(args.format);
    let output = args.output.unwrap_or_else(|| {
        if args.remote {
            PathBuf::from(OutputFormat::Docx.default_file_name())
        } else {
            PathBuf::from(format.default_file_name())
        }
    });

    eprintln!("Generating {}...", output.display());
    let stats: GenerateStats = if args.remote {
        generate::write_remote(&session, client, &output).await?
    } else {
        generate::write_local(&session, format, &output)?
    };

    if !args.draft {
        session.mark_done();
        session_file::save(session_path, &session)?;
    }

    if args.remote {
        println!("Wrote {} ({} bytes) in {:.2}s", output.display(), stats.bytes, stats.elapsed_secs);
    } else {
        println!(
            "Wrote {} ({} paragraphs, {} bytes) in {:.2}s",
            output.display(),
            stats.blocks,
            stats.bytes,
            stats.elapsed_secs
        );
    }
    if stats.unresolved > 0 {
        eprintln!("note: {} placeholder(s) left unfilled in the output", stats.unresolved);
    }
    Ok(())
}

fn reset(session_path: &Path) -> anyhow::Result<()> {
    if !session_path.exists() {
        println!("No session to discard.");
        return Ok(());
    }
    let mut session = match session_file::load(session_path) {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "replacing unreadable session");
            Session::default()
        }
    };
    session.reset();
    session_file::save(session_path, &session)?;
    println!("Session {} discarded.", session_path.display());
    Ok(())
}

fn scan(path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let clauses = clauses_from_text(&text);
    if clauses.is_empty() {
        bail!("{} has no text", path.display());
    }
    let found = resolve_placeholders(&clauses, &[]);

    println!("{} clauses, {} placeholders", clauses.len(), found.len());
    for name in &found {
        println!("  [{name}]");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Format;
    use tempfile::TempDir;

    const ANALYSIS: &str = r#"{
        "originalDoc": [
            {"clause_id": "clause_001", "text": "Rent is [Rent Amount] per month."},
            {"clause_id": "clause_002", "text": "The tenant may not sublet."}
        ],
        "suggestions": [
            {
                "action": "MODIFY",
                "clause_id": "clause_001",
                "original_text": "Rent is [Rent Amount] per month.",
                "new_text": "Rent is [Rent Amount] per month for [Term Months] months.",
                "reason": "Ten month term."
            },
            {
                "action": "REMOVE",
                "clause_id": "clause_002",
                "original_text": "The tenant may not sublet.",
                "reason": "Subletting is allowed."
            }
        ]
    }"#;

    const FAILED_ANALYSIS: &str = r#"{"originalDoc": [], "suggestions": [{"action": "ERROR", "reason": "quota exceeded"}]}"#;

    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("lease.docx"), b"PK-docx").unwrap();
            std::fs::write(dir.path().join("analysis.json"), ANALYSIS).unwrap();
            std::fs::write(dir.path().join("failed.json"), FAILED_ANALYSIS).unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn session(&self) -> PathBuf {
            self.path("session.json")
        }

        fn analyze_args(&self, suggestions: Option<&str>, keep_values: bool) -> AnalyzeArgs {
            AnalyzeArgs {
                document: self.path("lease.docx"),
                scenario: Some("Ten month lease, subletting allowed".into()),
                scenario_file: None,
                suggestions: suggestions.map(|name| self.path(name)),
                keep_values,
            }
        }

        async fn analyzed(&self) -> Vec<u8> {
            analyze(&unreachable_service(), &self.session(), self.analyze_args(Some("analysis.json"), false))
                .await
                .unwrap();
            std::fs::read(self.session()).unwrap()
        }
    }

    /// Nothing listens on port 1, so every request fails to connect.
    fn unreachable_service() -> ServiceClient {
        ServiceClient::new("http://127.0.0.1:1")
    }

    fn review_args(accept: Vec<usize>) -> ReviewArgs {
        ReviewArgs {
            accept,
            reject: Vec::new(),
            accept_all: false,
            reject_all: false,
        }
    }

    fn fill_args(set: &[&str]) -> FillArgs {
        FillArgs {
            set: set.iter().map(|s| s.to_string()).collect(),
            clear: Vec::new(),
        }
    }

    fn generate_args(output: PathBuf, format: Format, draft: bool) -> GenerateArgs {
        GenerateArgs {
            output: Some(output),
            format,
            draft,
            remote: false,
        }
    }

    #[tokio::test]
    async fn offline_review_flow_writes_document() {
        let ws = Workspace::new();
        ws.analyzed().await;

        review(&ws.session(), review_args(vec![1, 2])).unwrap();
        fill(&ws.session(), fill_args(&["Rent Amount=5000", "Term Months=10"])).unwrap();

        let output = ws.path("agreement.txt");
        generate(&unreachable_service(), &ws.session(), generate_args(output.clone(), Format::Text, false))
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "Rent is 5000 per month for 10 months.\n"
        );
        let session = session_file::load(&ws.session()).unwrap();
        assert_eq!(session.stage, Stage::Done);
    }

    #[tokio::test]
    async fn generate_refuses_incomplete_review() {
        let ws = Workspace::new();
        ws.analyzed().await;
        review(&ws.session(), review_args(vec![1])).unwrap();

        let output = ws.path("agreement.txt");
        let err = generate(&unreachable_service(), &ws.session(), generate_args(output.clone(), Format::Text, false))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("pending"), "{err:#}");
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn draft_keeps_unfilled_tokens() {
        let ws = Workspace::new();
        ws.analyzed().await;

        let output = ws.path("draft.txt");
        generate(&unreachable_service(), &ws.session(), generate_args(output.clone(), Format::Text, true))
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "Rent is [Rent Amount] per month.\n\nThe tenant may not sublet.\n"
        );
        assert_eq!(session_file::load(&ws.session()).unwrap().stage, Stage::Suggested);
    }

    #[tokio::test]
    async fn error_sentinel_leaves_session_untouched() {
        let ws = Workspace::new();
        let before = ws.analyzed().await;

        let err = analyze(&unreachable_service(), &ws.session(), ws.analyze_args(Some("failed.json"), false))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("quota exceeded"), "{err:#}");
        assert_eq!(std::fs::read(ws.session()).unwrap(), before);
    }

    #[tokio::test]
    async fn unreachable_service_leaves_session_untouched() {
        let ws = Workspace::new();
        let before = ws.analyzed().await;

        assert!(
            analyze(&unreachable_service(), &ws.session(), ws.analyze_args(None, true))
                .await
                .is_err()
        );
        assert_eq!(std::fs::read(ws.session()).unwrap(), before);
    }

    #[tokio::test]
    async fn keep_values_reports_unreadable_session() {
        let ws = Workspace::new();
        std::fs::write(ws.session(), "not json").unwrap();

        let err = analyze(&unreachable_service(), &ws.session(), ws.analyze_args(None, true))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("--keep-values"), "{err:#}");
        assert_eq!(std::fs::read_to_string(ws.session()).unwrap(), "not json");
    }

    #[tokio::test]
    async fn bad_review_position_changes_nothing() {
        let ws = Workspace::new();
        let before = ws.analyzed().await;

        assert!(review(&ws.session(), review_args(vec![0])).is_err());
        assert!(review(&ws.session(), review_args(vec![1, 7])).is_err());
        assert_eq!(std::fs::read(ws.session()).unwrap(), before);
    }

    #[tokio::test]
    async fn reset_returns_session_to_idle() {
        let ws = Workspace::new();
        ws.analyzed().await;

        reset(&ws.session()).unwrap();
        let session = session_file::load(&ws.session()).unwrap();
        assert_eq!(session.stage, Stage::Idle);
        assert!(session.clauses().is_empty());

        let err = load_active(&ws.session()).unwrap_err();
        assert!(err.to_string().contains("lexigenius analyze"), "{err}");
    }

    #[test]
    fn reset_replaces_unreadable_session() {
        let ws = Workspace::new();
        reset(&ws.session()).unwrap();
        assert!(!ws.session().exists());

        std::fs::write(ws.session(), "not json").unwrap();
        reset(&ws.session()).unwrap();
        assert_eq!(session_file::load(&ws.session()).unwrap().stage, Stage::Idle);
    }
}
