use poem::listener::TcpListener;
use page_converter::core::browser::ChromeLauncher;
use page_converter::core::renderer::RenderingEngine;
use page_converter::settings::get_config;
use page_converter::{AppState, init_openapi_route};
use tracing::Level;

use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_level = Level::DEBUG;
    // Logging to File
    let file_appender = tracing_appender::rolling::daily("./logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(log_level)
        .init();

    tracing::info!("Initializing Page Converter...");

    let config = get_config().inspect_err(|e| tracing::error!("{:#}", e))?;
    tracing::info!("run with config: {:?}", config);

    let launcher = ChromeLauncher::new(config.chrome_path.as_ref().map(PathBuf::from))
        .inspect_err(|e| tracing::error!("{:#}", e))?;
    let engine = Arc::new(RenderingEngine::new(Arc::new(launcher), &config));

    std::fs::create_dir_all(&config.output_dir)?;

    // Init App State
    let app_state = Arc::new(AppState { engine });

    tracing::info!(
        "Serving artifacts from {} as http://{}/tmp",
        config.output_dir,
        config.access_address
    );

    let app = init_openapi_route(app_state.clone(), &config);
    tracing::info!("run server on {}:{}", config.host, config.port);
    poem::Server::new(TcpListener::bind(format!(
        "{}:{}",
        config.host, config.port
    )))
    .run(app)
    .await?;

    Ok(())
}
