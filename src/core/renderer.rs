use anyhow::{Result, anyhow};
use serde_json::{Map, Value as JsonValue};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::core::browser::{BrowserLauncher, IdleWait};
use crate::core::exporter::{self, ArtifactKind};
use crate::core::loader::{self, Content};
use crate::core::output::{self, Category, OutputStore};
use crate::core::result::ResultBuilder;
use crate::core::session::RenderSession;
use crate::core::template;
use crate::schemas::convert::ConversionResult;
use crate::settings::Config;

/// One browser-backed conversion.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub content: Content,
    pub kind: ArtifactKind,
    pub viewport: Option<(u32, u32)>,
    pub filename: Option<String>,
}

#[derive(Clone)]
pub struct RenderingEngine {
    launcher: Arc<dyn BrowserLauncher>,
    store: OutputStore,
    results: ResultBuilder,
    idle: IdleWait,
}

impl RenderingEngine {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: &Config) -> Self {
        Self {
            launcher,
            store: OutputStore::new(&config.output_dir),
            results: ResultBuilder::new(&config.access_address),
            idle: IdleWait {
                quiet: Duration::from_millis(config.network_idle_ms),
                timeout: config.idle_timeout_ms.map(Duration::from_millis),
            },
        }
    }

    pub fn output_root(&self) -> &Path {
        self.store.root()
    }

    pub async fn render(&self, job: RenderJob) -> Result<ConversionResult> {
        let category = match job.kind {
            ArtifactKind::Pdf => Category::Pdf,
            ArtifactKind::Png => Category::Png,
        };
        let filename = output::resolve_filename(job.filename.as_deref());
        let path = self.store.prepare(category, &filename)?;

        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.render_sync(&job, &path))
            .await
            .map_err(|e| anyhow!("Task join error: {}", e))??;

        let result = self.results.build(category, filename);
        tracing::info!("{}", result.url);
        Ok(result)
    }

    fn render_sync(&self, job: &RenderJob, path: &Path) -> Result<()> {
        let mut session = RenderSession::open(self.launcher.as_ref())?;

        loader::load(session.page(), &job.content, job.viewport, self.idle)?;
        exporter::export(session.page(), job.kind, path)?;

        Ok(())
    }

    /// Writes the structured-data report. No browser is involved.
    pub async fn render_report(
        &self,
        data: &Map<String, JsonValue>,
        prefix: &str,
    ) -> Result<ConversionResult> {
        let filename = output::report_filename(prefix);
        let path = self.store.prepare(Category::Json, &filename)?;

        let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let html = template::generate_report(data, &filename, prefix, &generated_at)?;
        std::fs::write(&path, html)?;
        tracing::debug!("Report saved to {}", path.display());

        let result = self.results.build(Category::Json, filename);
        tracing::info!("{}", result.url);
        Ok(result)
    }
}
