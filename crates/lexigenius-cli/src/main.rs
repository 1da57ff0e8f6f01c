use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use lexigenius_client::DEFAULT_SERVICE_URL;
use lexigenius_core::OutputFormat;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod generate;
mod session_file;

#[derive(Debug, Parser)]
#[command(name = "lexigenius", version, about = "AI-assisted contract review and generation")]
struct Cli {
    /// Base URL of the analysis service.
    #[arg(long, env = "LEXIGENIUS_SERVICE_URL", default_value = DEFAULT_SERVICE_URL, global = true)]
    service_url: String,

    /// Session file holding the review in progress.
    #[arg(long, env = "LEXIGENIUS_SESSION", default_value = "lexigenius-session.json", global = true)]
    session: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the templates in the service's library.
    Templates,
    /// Download a template from the library.
    FetchTemplate {
        name: String,
        /// Where to save it (defaults to the template name).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Analyse a document against a scenario and start a new review.
    Analyze(AnalyzeArgs),
    /// Show every suggestion and its review status.
    Show,
    /// Accept or reject suggestions by their number in `show`.
    Review(ReviewArgs),
    /// List the placeholders the current document still needs.
    Placeholders,
    /// Set or clear placeholder values.
    Fill(FillArgs),
    /// Assemble the final document.
    Generate(GenerateArgs),
    /// Split a local plain-text document into clauses and list its placeholders.
    Scan { path: PathBuf },
    /// Discard the current review.
    Reset,
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Contract document to analyse.
    #[arg(long)]
    document: PathBuf,

    /// Case scenario in plain language.
    #[arg(long, required_unless_present = "scenario_file", conflicts_with = "scenario_file")]
    scenario: Option<String>,

    /// Read the scenario from a file.
    #[arg(long)]
    scenario_file: Option<PathBuf>,

    /// Use a saved analysis response instead of calling the service.
    #[arg(long)]
    suggestions: Option<PathBuf>,

    /// Send the current session's form values with the request.
    #[arg(long, conflicts_with = "suggestions")]
    keep_values: bool,
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("decision")
        .required(true)
        .multiple(true)
        .args(["accept", "reject", "accept_all", "reject_all"])
))]
struct ReviewArgs {
    #[arg(long, num_args = 1.., value_name = "N")]
    accept: Vec<usize>,

    #[arg(long, num_args = 1.., value_name = "N")]
    reject: Vec<usize>,

    #[arg(long, conflicts_with = "reject_all")]
    accept_all: bool,

    #[arg(long)]
    reject_all: bool,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("change").required(true).multiple(true).args(["set", "clear"])))]
struct FillArgs {
    /// `NAME=VALUE`; date fields take `YYYY-MM-DD` or `Month D, YYYY`.
    #[arg(long, value_name = "NAME=VALUE")]
    set: Vec<String>,

    #[arg(long, value_name = "NAME")]
    clear: Vec<String>,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Output path (defaults to `Generated_Agreement.<ext>`).
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Docx)]
    format: Format,

    /// Skip the review and form checks and write a draft.
    #[arg(long)]
    draft: bool,

    /// Have the generation service render the document.
    #[arg(long, conflicts_with = "format")]
    remote: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Docx,
    Text,
    Markdown,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Docx => OutputFormat::Docx,
            Format::Text => OutputFormat::Text,
            Format::Markdown => OutputFormat::Markdown,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("lexigenius v{}", env!("CARGO_PKG_VERSION"));
    commands::run(cli).await
}
