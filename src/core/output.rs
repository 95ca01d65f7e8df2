use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Artifact category; each one owns a subdirectory of the output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Pdf,
    Png,
    Json,
}

impl Category {
    pub fn dir(&self) -> &'static str {
        match self {
            Category::Pdf => "pdf",
            Category::Png => "png",
            Category::Json => "json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Category::Pdf => "pdf",
            Category::Png => "png",
            Category::Json => "html",
        }
    }

    /// Path of an artifact relative to the output root, e.g. `pdf/report.pdf`.
    pub fn relative_path(&self, filename: &str) -> String {
        format!("{}/{}.{}", self.dir(), filename, self.extension())
    }
}

static LAST_TOKEN: AtomicU64 = AtomicU64::new(0);

/// Nanosecond timestamp, strictly increasing within the process.
pub fn unique_token() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let previous = LAST_TOKEN
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);

    now.max(previous + 1).to_string()
}

/// Caller's filename when present and non-empty, otherwise a fresh token.
pub fn resolve_filename(requested: Option<&str>) -> String {
    match requested {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => unique_token(),
    }
}

/// Filename used by the structured-data report: spaces become underscores
/// and a token is appended.
pub fn report_filename(prefix: &str) -> String {
    format!("{}-{}", prefix.replace(' ', "_"), unique_token())
}

#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the category directory if needed and returns the artifact path.
    pub fn prepare(&self, category: Category, filename: &str) -> Result<PathBuf> {
        let dir = self.root.join(category.dir());
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        Ok(self.root.join(category.relative_path(filename)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tokens_never_repeat_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| (0..500).map(|_| unique_token()).collect::<Vec<_>>()))
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for token in handle.join().unwrap() {
                assert!(seen.insert(token), "duplicate token");
            }
        }
    }

    #[test]
    fn explicit_filename_is_kept_verbatim() {
        assert_eq!(resolve_filename(Some("invoice 7")), "invoice 7");
        assert!(resolve_filename(None).parse::<u64>().is_ok());
        assert!(resolve_filename(Some("")).parse::<u64>().is_ok());
    }

    #[test]
    fn report_filename_replaces_spaces() {
        let name = report_filename("monthly sales report");
        assert!(name.starts_with("monthly_sales_report-"));
        assert!(!name.contains(' '));
    }

    #[test]
    fn prepare_creates_category_dir() {
        let root = tempfile::tempdir().unwrap();
        let store = OutputStore::new(root.path());

        let path = store.prepare(Category::Png, "shot").unwrap();

        assert_eq!(path, root.path().join("png/shot.png"));
        assert!(root.path().join("png").is_dir());
    }
}
