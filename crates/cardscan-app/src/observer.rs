use cardscan_core::services::ScanObserver;
use cardscan_types::types::{AppEvent, CardRecord};
use kanal::AsyncSender;

/// Bridges the pipeline's synchronous observer callbacks onto the UI
/// channel. Sends are spawned so a slow consumer never blocks a scan.
pub struct ChannelObserver {
    app_to_ui_tx: AsyncSender<AppEvent>,
}

impl ChannelObserver {
    pub fn new(app_to_ui_tx: AsyncSender<AppEvent>) -> Self {
        Self { app_to_ui_tx }
    }
}

impl ScanObserver for ChannelObserver {
    fn status(&self, text: &str) {
        let tx = self.app_to_ui_tx.clone();
        let status = text.to_string();
        tokio::spawn(async move {
            let _ = tx
                .send(AppEvent::StatusUpdate {
                    status,
                    scanning: true,
                })
                .await;
        });
    }

    fn collection_changed(&self, added: &CardRecord, collection: &[CardRecord]) {
        let tx = self.app_to_ui_tx.clone();
        let added = added.clone();
        let collection = collection.to_vec();
        tokio::spawn(async move {
            let _ = tx
                .send(AppEvent::CollectionChanged { added, collection })
                .await;
        });
    }
}
