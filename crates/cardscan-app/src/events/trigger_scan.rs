use std::sync::Arc;
use std::time::SystemTime;

use cardscan_core::pipeline::ScanPipeline;
use cardscan_types::types::AppEvent;
use kanal::AsyncSender;

use crate::state::AppState;

pub async fn handle_scan_trigger(
    state: Arc<AppState>,
    pipeline: Arc<ScanPipeline>,
    app_to_ui_tx: &AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    {
        let mut status = state.status.scan.write().await;
        status.scanning = true;
    }

    let result = pipeline.scan().await;

    let mut status = state.status.scan.write().await;
    status.scanning = false;
    status.last_scan_time = Some(SystemTime::now());
    status.scan_count += 1;

    match &result {
        Ok(record) => {
            tracing::info!("collected '{}'", record.name);
            status.current_message = format!("Found \"{}\"!", record.name);
        }
        Err(e) => {
            tracing::warn!("scan settled: {e}");
            status.error_count += 1;
            status.current_message = e.to_string();
        }
    }

    let _ = app_to_ui_tx
        .send(AppEvent::StatusUpdate {
            status: status.current_message.clone(),
            scanning: false,
        })
        .await;

    Ok(())
}
