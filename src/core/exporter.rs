use anyhow::{Context, Result};
use std::path::Path;

use crate::core::browser::PageSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Pdf,
    Png,
}

/// Exports the page and writes the bytes to `path`. Nothing is written
/// unless the browser produced the artifact.
pub fn export(page: &mut dyn PageSession, kind: ArtifactKind, path: &Path) -> Result<()> {
    let bytes = match kind {
        ArtifactKind::Pdf => page.print_pdf()?,
        ArtifactKind::Png => page.screenshot_full_page()?,
    };

    std::fs::write(path, &bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::debug!("Exported {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
