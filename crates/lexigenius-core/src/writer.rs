//! Serialize assembled blocks for the document writer.

use std::io::Cursor;

use docx_rs::{Docx, LineSpacing, Paragraph};
use thiserror::Error;

use crate::assembler::{Block, Run};

/// Colour of substituted placeholder runs in Word output.
const PLACEHOLDER_COLOR: &str = "0052cc";

/// Space after each Word paragraph, in twentieths of a point.
const PARAGRAPH_SPACING_AFTER: u32 = 200;

/// Characters escaped anywhere in Markdown output.
const MARKDOWN_SPECIAL: &[char] = &['\\', '`', '*', '_', '~', '#', '<', '>', '|'];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Word packaging failed: {0}")]
    Docx(String),
}

/// Output encodings for the assembled document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Docx,
    Text,
    Markdown,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Text => "txt",
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }

    /// `Generated_Agreement.<ext>`
    pub fn default_file_name(&self) -> String {
        format!("Generated_Agreement.{}", self.extension())
    }
}

/// Render `blocks` in the requested format.
///
/// Every format puts one block per paragraph. Text and Markdown separate
/// paragraphs with a blank line. Markdown and Word emphasise filled and
/// unresolved placeholders.
pub fn render(blocks: &[Block], format: OutputFormat) -> Result<Vec<u8>, RenderError> {
    match format {
        OutputFormat::Docx => docx(blocks),
        OutputFormat::Text => Ok(join_paragraphs(blocks.iter().map(Block::text)).into_bytes()),
        OutputFormat::Markdown => Ok(join_paragraphs(blocks.iter().map(markdown_paragraph)).into_bytes()),
        OutputFormat::Json => Ok(serde_json::to_vec_pretty(blocks)?),
    }
}

// ── Word ──

fn docx(blocks: &[Block]) -> Result<Vec<u8>, RenderError> {
    let doc = blocks
        .iter()
        .fold(Docx::new(), |doc, block| doc.add_paragraph(docx_paragraph(block)));

    let mut buf = Cursor::new(Vec::new());
    doc.build()
        .pack(&mut buf)
        .map_err(|e| RenderError::Docx(e.to_string()))?;
    Ok(buf.into_inner())
}

fn docx_paragraph(block: &Block) -> Paragraph {
    let paragraph = Paragraph::new().line_spacing(LineSpacing::new().after(PARAGRAPH_SPACING_AFTER));
    block
        .runs
        .iter()
        .filter(|run| !run.text().is_empty())
        .fold(paragraph, |p, run| {
            let out = docx_rs::Run::new().add_text(run.text());
            match run {
                Run::Plain { .. } => p.add_run(out),
                Run::Filled { .. } | Run::Unresolved { .. } => p.add_run(out.bold().color(PLACEHOLDER_COLOR)),
            }
        })
}

// ── Markdown ──

fn markdown_paragraph(block: &Block) -> String {
    let out: String = block
        .runs
        .iter()
        .map(|run| match run {
            Run::Plain { text } => escape_markdown(text),
            Run::Filled { text, .. } | Run::Unresolved { text, .. } if !text.is_empty() => {
                format!("**{}**", escape_markdown(text))
            }
            other => escape_markdown(other.text()),
        })
        .collect();
    // A leading list marker would turn the paragraph into a list item.
    if out.starts_with(['-', '+']) {
        format!("\\{out}")
    } else {
        out
    }
}

fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn join_paragraphs(paragraphs: impl Iterator<Item = String>) -> String {
    let mut out = paragraphs.collect::<Vec<_>>().join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}
