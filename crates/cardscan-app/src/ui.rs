use cardscan_types::types::AppEvent;
use kanal::AsyncReceiver;

/// UI loop: renders status lines and collection updates to the terminal.
pub async fn ui_loop(app_to_ui_rx: AsyncReceiver<AppEvent>) -> anyhow::Result<()> {
    loop {
        let event = match app_to_ui_rx.recv().await {
            Ok(event) => event,
            Err(_) => break,
        };

        match event {
            AppEvent::StatusUpdate { status, .. } => {
                println!("Status: {status}");
            }
            AppEvent::CollectionChanged { added, collection } => {
                println!("Collected \"{}\" ({} total)", added.name, collection.len());
            }
            AppEvent::BackendReady => {
                println!("Status: Ready.");
            }
            AppEvent::Shutdown => break,
            AppEvent::TriggerScan => {}
        }
    }
    Ok(())
}
