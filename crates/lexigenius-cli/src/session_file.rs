//! Session persistence between CLI invocations.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use lexigenius_core::Session;
use tempfile::NamedTempFile;

pub fn load(path: &Path) -> anyhow::Result<Session> {
    let data = std::fs::read_to_string(path).with_context(|| {
        format!(
            "reading session {} (start one with `lexigenius analyze`)",
            path.display()
        )
    })?;
    serde_json::from_str(&data).with_context(|| format!("parsing session {}", path.display()))
}

pub fn save(path: &Path, session: &Session) -> anyhow::Result<()> {
    let mut json = serde_json::to_vec_pretty(session)?;
    json.push(b'\n');
    write_atomic(path, &json)
}

/// Write through a temp file in the same directory so readers never see a partial file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(contents)?;
    tmp.persist(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
