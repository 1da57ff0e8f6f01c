//! Generation pipeline: assemble the reviewed document and write it out.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use lexigenius_client::ServiceClient;
use lexigenius_core::{OutputFormat, Session, writer};

use crate::session_file::write_atomic;

pub struct GenerateStats {
    pub blocks: usize,
    pub unresolved: usize,
    pub bytes: usize,
    pub elapsed_secs: f64,
}

/// Assemble locally and serialize with the chosen writer.
pub fn write_local(session: &Session, format: OutputFormat, output: &Path) -> anyhow::Result<GenerateStats> {
    let start = Instant::now();

    // 1. Rebuild the clause sequence with substitutions.
    let blocks = session.assemble();
    let unresolved: usize = blocks.iter().map(|b| b.unresolved().count()).sum();

    // 2. Serialize.
    let rendered = writer::render(&blocks, format).context("serializing document")?;

    // 3. Write.
    write_atomic(output, &rendered)?;

    Ok(GenerateStats {
        blocks: blocks.len(),
        unresolved,
        bytes: rendered.len(),
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}

/// Let the generation service render the document from values and accepted edits.
pub async fn write_remote(
    session: &Session,
    client: &ServiceClient,
    output: &Path,
) -> anyhow::Result<GenerateStats> {
    let start = Instant::now();

    let filename = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| OutputFormat::Docx.default_file_name());
    let bytes = client
        .generate(session.values(), session.accepted(), &filename)
        .await
        .context("document generation service")?;

    write_atomic(output, &bytes)?;

    Ok(GenerateStats {
        blocks: 0,
        unresolved: 0,
        bytes: bytes.len(),
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
