use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;

use cardscan_config::Config;
use cardscan_core::pipeline::ScanPipeline;
use cardscan_scryfall::ScryfallClient;
use cardscan_types::types::AppEvent;

mod capture;
mod controller;
mod events;
mod observer;
mod ocr;
mod state;
mod status;
mod ui;


use self::capture::FileFrameSource;
use self::controller::AppController;
use self::observer::ChannelObserver;
use self::ocr::TesseractOcr;
use self::state::AppState;

/// Scan card photos, resolve names against Scryfall, and collect unique
/// cards.
#[derive(Parser)]
#[command(name = "cardscan", version)]
struct Cli {
    /// Image files to scan, one frame each, in order
    images: Vec<PathBuf>,
    /// OCR language hint
    #[arg(long)]
    language: Option<String>,
    /// Lookup endpoint override
    #[arg(long)]
    endpoint: Option<String>,
    /// Don't mirror captures horizontally
    #[arg(long)]
    no_mirror: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = Config::new();
    if let Some(language) = cli.language {
        config.ocr.language = language;
    }
    if let Some(endpoint) = cli.endpoint {
        config.lookup.endpoint = endpoint;
    }
    if cli.no_mirror {
        config.capture.mirror = false;
    }

    if cli.images.is_empty() {
        anyhow::bail!("no images to scan; pass one or more image paths");
    }
    let scan_count = cli.images.len();

    let region = config.capture.region;
    let mirror = config.capture.mirror;
    let language = config.ocr.language.clone();

    let frames = Arc::new(FileFrameSource::new(cli.images));
    let ocr = Arc::new(TesseractOcr::new(config.ocr.clone()));
    let lookup = Arc::new(
        ScryfallClient::new(config.lookup.endpoint.clone(), config.lookup.timeout())
            .map_err(|e| anyhow::anyhow!("failed to build lookup client: {e}"))?,
    );

    let state = Arc::new(AppState::new(config));
    let controller = AppController::new(state.clone());
    let observer = Arc::new(ChannelObserver::new(controller.app_to_ui_sender()));

    let pipeline = Arc::new(ScanPipeline::new(
        frames, ocr, lookup, observer, region, mirror,
    ));
    pipeline
        .initialize(&language)
        .await
        .map_err(|e| anyhow::anyhow!("OCR engine init failed: {e}"))?;

    let ui_to_app = controller.ui_to_app_sender();
    let mut tasks = controller.spawn_tasks(pipeline.clone());

    for _ in 0..scan_count {
        ui_to_app.send(AppEvent::TriggerScan).await?;
    }
    ui_to_app.send(AppEvent::Shutdown).await?;

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("shutdown requested");
            controller.shutdown();
        }
        _ = async { while tasks.join_next().await.is_some() {} } => {}
    }

    let collection = pipeline.collection().await;
    if collection.is_empty() {
        println!("No cards collected.");
    } else {
        println!("Collected {} card(s):", collection.len());
        for record in &collection {
            println!("  {} - {} [{}]", record.name, record.type_line, record.set_name);
        }
    }

    let scan_status = state.status.scan.read().await;
    tracing::info!(
        "session finished: {} scans, {} errors",
        scan_status.scan_count,
        scan_status.error_count
    );

    Ok(())
}
