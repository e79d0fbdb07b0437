use std::sync::Arc;

use cardscan_core::pipeline::ScanPipeline;
use cardscan_types::types::AppEvent;
use kanal::{AsyncReceiver, AsyncSender};
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

pub mod trigger_scan;

use trigger_scan::handle_scan_trigger;

/// App's main loop
pub async fn event_loop(
    state: Arc<AppState>,
    pipeline: Arc<ScanPipeline>,
    ui_to_app_rx: AsyncReceiver<AppEvent>,
    app_to_ui_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    tracing::info!("[EVENT_LOOP] starting, waiting for events");
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = ui_to_app_rx.recv() => event?,
        };

        match event {
            AppEvent::TriggerScan => {
                handle_scan_trigger(state.clone(), pipeline.clone(), &app_to_ui_tx).await?;
            }
            AppEvent::Shutdown => {
                // Pass the shutdown on so the UI loop drains and exits too
                let _ = app_to_ui_tx.send(AppEvent::Shutdown).await;
                break;
            }
            AppEvent::StatusUpdate { .. }
            | AppEvent::CollectionChanged { .. }
            | AppEvent::BackendReady => {
                // UI-bound events, nothing to do here
            }
        }
    }
    Ok(())
}
