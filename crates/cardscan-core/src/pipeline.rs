use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{RwLock, watch};

use cardscan_types::types::{CardRecord, OcrProgress, RegionOfInterest};

use crate::collection::CollectionStore;
use crate::error::{OcrError, ScanError};
use crate::normalize::{self, Normalized};
use crate::resolve::{CardResolver, Resolution};
use crate::services::{FrameSource, LookupService, OcrService, ProgressFn, ScanObserver};

/// Pipeline state, observable via [`ScanPipeline::state`] or
/// [`ScanPipeline::watch_state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    CapturingFrame,
    Recognizing,
    Resolving,
    Settled(Outcome),
}

/// Terminal outcome recorded in `Settled` before the unconditional return
/// to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Added(String),
    Duplicate(String),
    NoUsableText,
    NotFound,
    Error,
}

/// Orchestrates one scan attempt end to end: frame capture, region crop,
/// recognition, normalization, fuzzy resolution, collection insert.
///
/// Single-concurrency by construction: at most one scan is in flight, and
/// a request made while one is running is rejected, not queued.
pub struct ScanPipeline {
    frames: Arc<dyn FrameSource>,
    ocr: Arc<dyn OcrService>,
    resolver: CardResolver,
    collection: RwLock<CollectionStore>,
    observer: Arc<dyn ScanObserver>,
    region: RegionOfInterest,
    mirror: bool,
    in_flight: AtomicBool,
    state: watch::Sender<ScanState>,
}

impl ScanPipeline {
    pub fn new(
        frames: Arc<dyn FrameSource>,
        ocr: Arc<dyn OcrService>,
        lookup: Arc<dyn LookupService>,
        observer: Arc<dyn ScanObserver>,
        region: RegionOfInterest,
        mirror: bool,
    ) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        Self {
            frames,
            ocr,
            resolver: CardResolver::new(lookup),
            collection: RwLock::new(CollectionStore::new()),
            observer,
            region,
            mirror,
            in_flight: AtomicBool::new(false),
            state,
        }
    }

    /// One-time engine setup. Idempotent; engine progress is forwarded to
    /// the observer as status text.
    pub async fn initialize(&self, language: &str) -> Result<(), OcrError> {
        self.observer.status("Loading OCR engine...");

        let observer = Arc::clone(&self.observer);
        let progress: ProgressFn = Arc::new(move |p: OcrProgress| {
            if p.stage == "recognizing text" {
                let percent = (p.fraction * 100.0).round() as u32;
                observer.status(&format!("Recognizing... {percent}%"));
            }
        });

        self.ocr.initialize(language, progress).await?;
        self.observer.status("OCR engine ready");
        Ok(())
    }

    /// Run one scan attempt.
    ///
    /// Rejected synchronously with [`ScanError::Busy`] while another scan
    /// is in flight, with [`ScanError::OcrUnready`] before `initialize`
    /// has completed (the request does not block), and with
    /// [`ScanError::FrameUnavailable`] while the frame source is
    /// inactive; none of these leave `Idle`. Every other failure settles
    /// the attempt and returns the pipeline to `Idle`; nothing is retried.
    /// Dropping the returned future mid-flight releases the single-flight
    /// guard without interrupting an outstanding lookup call.
    pub async fn scan(&self) -> Result<CardRecord, ScanError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let e = ScanError::Busy;
            self.observer.status(&e.to_string());
            return Err(e);
        }
        let _guard = FlightGuard { pipeline: self };

        if !self.ocr.is_ready() {
            let e = ScanError::OcrUnready;
            self.observer.status(&e.to_string());
            return Err(e);
        }
        if !self.frames.is_active() {
            let e = ScanError::FrameUnavailable;
            self.observer.status(&e.to_string());
            return Err(e);
        }

        let result = self.run_stages().await;

        let outcome = match &result {
            Ok(record) => Outcome::Added(record.name.clone()),
            Err(ScanError::DuplicateCard(name)) => Outcome::Duplicate(name.clone()),
            Err(ScanError::NoUsableText) => Outcome::NoUsableText,
            Err(ScanError::LookupNotFound { .. }) => Outcome::NotFound,
            Err(_) => Outcome::Error,
        };
        self.set_state(ScanState::Settled(outcome));

        if let Err(e) = &result {
            tracing::warn!("scan settled with error: {e}");
            self.observer.status(&e.to_string());
        }

        // guard drop: Settled -> Idle, flag released
        result
    }

    async fn run_stages(&self) -> Result<CardRecord, ScanError> {
        self.set_state(ScanState::CapturingFrame);
        self.observer.status("Capturing frame...");
        let frame = self
            .frames
            .capture_frame(self.mirror)
            .await
            .map_err(|e| {
                tracing::warn!("frame capture failed: {e}");
                ScanError::FrameUnavailable
            })?;
        if frame.is_empty() {
            return Err(ScanError::FrameUnavailable);
        }

        self.set_state(ScanState::Recognizing);
        self.observer.status("Recognizing...");
        let raw = self
            .ocr
            .recognize(&frame, self.region)
            .await
            .map_err(|e| ScanError::Recognition(e.to_string()))?;
        drop(frame);

        let candidate = match normalize::normalize(&raw.text) {
            Normalized::Candidate(name) => name,
            Normalized::Unusable => return Err(ScanError::NoUsableText),
        };

        self.set_state(ScanState::Resolving);
        self.observer
            .status(&format!("Found text \"{candidate}\". Searching catalog..."));

        let resolution = {
            let collection = self.collection.read().await;
            self.resolver.resolve(&candidate, &collection).await
        };

        match resolution {
            Resolution::Added(record) => {
                let mut collection = self.collection.write().await;
                collection.insert(record.clone());
                self.observer.status(&format!("Found \"{}\"!", record.name));
                self.observer.collection_changed(&record, collection.all());
                Ok(record)
            }
            Resolution::Duplicate(name) => Err(ScanError::DuplicateCard(name)),
            Resolution::NotFound => Err(ScanError::LookupNotFound { candidate }),
            Resolution::ServiceError(reason) => Err(ScanError::LookupService(reason)),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state.borrow().clone()
    }

    /// Subscribe to state transitions, including the transient `Settled`.
    pub fn watch_state(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    /// Snapshot of the collection, newest first.
    pub async fn collection(&self) -> Vec<CardRecord> {
        self.collection.read().await.all().to_vec()
    }

    fn set_state(&self, state: ScanState) {
        self.state.send_replace(state);
    }
}

/// Releases the single-flight guard and restores `Idle` even when the
/// scan future is dropped by its caller mid-flight.
struct FlightGuard<'a> {
    pipeline: &'a ScanPipeline,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.pipeline.set_state(ScanState::Idle);
        self.pipeline.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::timeout;

    use crate::error::{CaptureError, LookupError, OcrError};
    use cardscan_types::types::{Frame, ImageRef, RawOcrResult};

    struct FakeFrames {
        active: bool,
        width: u32,
        height: u32,
        captures: AtomicUsize,
    }

    impl FakeFrames {
        fn new(active: bool) -> Self {
            Self {
                active,
                width: 640,
                height: 480,
                captures: AtomicUsize::new(0),
            }
        }

        fn sized(width: u32, height: u32) -> Self {
            Self {
                active: true,
                width,
                height,
                captures: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl FrameSource for FakeFrames {
        fn is_active(&self) -> bool {
            self.active
        }

        async fn capture_frame(&self, _mirror: bool) -> Result<Frame, CaptureError> {
            self.captures.fetch_add(1, Ordering::SeqCst);
            let len = (self.width * self.height * 4) as usize;
            Ok(Frame::new(self.width, self.height, vec![0; len]))
        }
    }

    struct FakeOcr {
        ready: AtomicBool,
        text: Mutex<String>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl FakeOcr {
        fn reading(text: &str) -> Self {
            Self {
                ready: AtomicBool::new(true),
                text: Mutex::new(text.to_string()),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn unready() -> Self {
            let ocr = Self::reading("");
            ocr.ready.store(false, Ordering::SeqCst);
            ocr
        }

        fn slow(text: &str, delay: Duration) -> Self {
            let mut ocr = Self::reading(text);
            ocr.delay = Some(delay);
            ocr
        }

        fn set_text(&self, text: &str) {
            *self.text.lock().unwrap() = text.to_string();
        }
    }

    #[async_trait]
    impl OcrService for FakeOcr {
        async fn initialize(&self, _language: &str, _progress: ProgressFn) -> Result<(), OcrError> {
            self.ready.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn is_ready(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }

        async fn recognize(
            &self,
            _frame: &Frame,
            _region: RegionOfInterest,
        ) -> Result<RawOcrResult, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(RawOcrResult {
                text: self.text.lock().unwrap().clone(),
                confidence: Some(0.9),
            })
        }
    }

    enum LookupBehavior {
        Found(&'static str),
        NotFound,
        Fail(LookupError),
    }

    struct FakeLookup {
        behavior: LookupBehavior,
        calls: AtomicUsize,
    }

    impl FakeLookup {
        fn new(behavior: LookupBehavior) -> Self {
            Self {
                behavior,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LookupService for FakeLookup {
        async fn lookup(&self, _name: &str) -> Result<Option<CardRecord>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                LookupBehavior::Found(name) => Ok(Some(CardRecord {
                    name: name.to_string(),
                    type_line: "Instant".to_string(),
                    set_name: "Test Set".to_string(),
                    image: ImageRef::Placeholder,
                    faces: Vec::new(),
                })),
                LookupBehavior::NotFound => Ok(None),
                LookupBehavior::Fail(e) => Err(match e {
                    LookupError::Timeout => LookupError::Timeout,
                    LookupError::Transport(s) => LookupError::Transport(s.clone()),
                    LookupError::Status(code) => LookupError::Status(*code),
                    LookupError::Decode(s) => LookupError::Decode(s.clone()),
                }),
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        statuses: Mutex<Vec<String>>,
        changes: Mutex<Vec<(String, usize)>>,
    }

    impl Recorder {
        fn statuses(&self) -> Vec<String> {
            self.statuses.lock().unwrap().clone()
        }

        fn changes(&self) -> Vec<(String, usize)> {
            self.changes.lock().unwrap().clone()
        }
    }

    impl ScanObserver for Recorder {
        fn status(&self, text: &str) {
            self.statuses.lock().unwrap().push(text.to_string());
        }

        fn collection_changed(&self, added: &CardRecord, collection: &[CardRecord]) {
            self.changes
                .lock()
                .unwrap()
                .push((added.name.clone(), collection.len()));
        }
    }

    struct Rig {
        pipeline: Arc<ScanPipeline>,
        frames: Arc<FakeFrames>,
        ocr: Arc<FakeOcr>,
        lookup: Arc<FakeLookup>,
        observer: Arc<Recorder>,
    }

    fn rig(frames: FakeFrames, ocr: FakeOcr, behavior: LookupBehavior) -> Rig {
        let frames = Arc::new(frames);
        let ocr = Arc::new(ocr);
        let lookup = Arc::new(FakeLookup::new(behavior));
        let observer = Arc::new(Recorder::default());
        let pipeline = Arc::new(ScanPipeline::new(
            frames.clone(),
            ocr.clone(),
            lookup.clone(),
            observer.clone(),
            RegionOfInterest::default(),
            true,
        ));
        Rig {
            pipeline,
            frames,
            ocr,
            lookup,
            observer,
        }
    }

    #[tokio::test]
    async fn scan_adds_new_card() {
        let rig = rig(
            FakeFrames::new(true),
            FakeOcr::reading("Lightning Bolt\n(foil)"),
            LookupBehavior::Found("Lightning Bolt"),
        );

        let record = rig.pipeline.scan().await.expect("scan should add");
        assert_eq!(record.name, "Lightning Bolt");

        let collection = rig.pipeline.collection().await;
        assert_eq!(collection.len(), 1);
        assert_eq!(collection[0].name, "Lightning Bolt");
        assert_eq!(rig.observer.changes(), vec![("Lightning Bolt".to_string(), 1)]);

        let statuses = rig.observer.statuses();
        assert!(statuses.contains(&"Capturing frame...".to_string()));
        assert!(
            statuses
                .contains(&"Found text \"Lightning Bolt\". Searching catalog...".to_string())
        );
        assert!(statuses.contains(&"Found \"Lightning Bolt\"!".to_string()));
        assert_eq!(rig.pipeline.state(), ScanState::Idle);
    }

    #[tokio::test]
    async fn misread_resolving_to_owned_card_is_duplicate() {
        let rig = rig(
            FakeFrames::new(true),
            FakeOcr::reading("Lightning Bolt"),
            LookupBehavior::Found("Lightning Bolt"),
        );
        rig.pipeline.scan().await.expect("first scan should add");

        // Second scan misreads the name; fuzzy lookup still resolves to
        // the same canonical card.
        rig.ocr.set_text("Lightning  B0lt!!");
        let err = rig.pipeline.scan().await.expect_err("second scan");
        assert_eq!(err, ScanError::DuplicateCard("Lightning Bolt".to_string()));
        assert_eq!(rig.pipeline.collection().await.len(), 1);
        assert!(
            rig.observer
                .statuses()
                .contains(&"already collected \"Lightning Bolt\"".to_string())
        );
    }

    #[tokio::test]
    async fn garbage_text_skips_lookup() {
        let rig = rig(
            FakeFrames::new(true),
            FakeOcr::reading("##"),
            LookupBehavior::Found("Lightning Bolt"),
        );

        let err = rig.pipeline.scan().await.expect_err("no usable text");
        assert_eq!(err, ScanError::NoUsableText);
        assert_eq!(rig.lookup.calls.load(Ordering::SeqCst), 0);
        assert!(rig.pipeline.collection().await.is_empty());
        assert!(
            rig.observer
                .statuses()
                .contains(&"no usable text found, try again".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_card_settles_not_found() {
        let rig = rig(
            FakeFrames::new(true),
            FakeOcr::reading("Xyzzyx"),
            LookupBehavior::NotFound,
        );

        let err = rig.pipeline.scan().await.expect_err("not found");
        assert_eq!(
            err,
            ScanError::LookupNotFound {
                candidate: "Xyzzyx".to_string()
            }
        );
        assert!(rig.pipeline.collection().await.is_empty());
        assert!(
            rig.observer
                .statuses()
                .contains(&"could not find a card matching \"Xyzzyx\"".to_string())
        );
    }

    #[tokio::test]
    async fn lookup_timeout_is_a_service_error() {
        let rig = rig(
            FakeFrames::new(true),
            FakeOcr::reading("Lightning Bolt"),
            LookupBehavior::Fail(LookupError::Timeout),
        );

        let err = rig.pipeline.scan().await.expect_err("service error");
        match err {
            ScanError::LookupService(reason) => assert!(reason.contains("timed out")),
            other => panic!("expected LookupService, got {other:?}"),
        }
        assert!(rig.pipeline.collection().await.is_empty());
    }

    #[tokio::test]
    async fn inactive_camera_rejects_without_leaving_idle() {
        let rig = rig(
            FakeFrames::new(false),
            FakeOcr::reading("Lightning Bolt"),
            LookupBehavior::Found("Lightning Bolt"),
        );

        let err = rig.pipeline.scan().await.expect_err("rejected");
        assert_eq!(err, ScanError::FrameUnavailable);
        assert_eq!(rig.pipeline.state(), ScanState::Idle);
        assert_eq!(rig.frames.captures.load(Ordering::SeqCst), 0);
        assert_eq!(rig.ocr.calls.load(Ordering::SeqCst), 0);
        assert_eq!(rig.lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scan_before_initialize_is_rejected() {
        let rig = rig(
            FakeFrames::new(true),
            FakeOcr::unready(),
            LookupBehavior::Found("Lightning Bolt"),
        );

        let err = rig.pipeline.scan().await.expect_err("rejected");
        assert_eq!(err, ScanError::OcrUnready);
        assert_eq!(rig.ocr.calls.load(Ordering::SeqCst), 0);

        rig.pipeline.initialize("eng").await.expect("init");
        rig.ocr.set_text("Lightning Bolt");
        assert!(rig.pipeline.scan().await.is_ok());
    }

    #[tokio::test]
    async fn zero_dimension_frame_settles_as_error() {
        let rig = rig(
            FakeFrames::sized(0, 0),
            FakeOcr::reading("Lightning Bolt"),
            LookupBehavior::Found("Lightning Bolt"),
        );

        let err = rig.pipeline.scan().await.expect_err("empty frame");
        assert_eq!(err, ScanError::FrameUnavailable);
        assert_eq!(rig.ocr.calls.load(Ordering::SeqCst), 0);
        assert_eq!(rig.pipeline.state(), ScanState::Idle);
    }

    #[tokio::test]
    async fn concurrent_scan_is_rejected_not_queued() {
        let rig = rig(
            FakeFrames::new(true),
            FakeOcr::slow("Lightning Bolt", Duration::from_millis(200)),
            LookupBehavior::Found("Lightning Bolt"),
        );

        let pipeline = rig.pipeline.clone();
        let first = tokio::spawn(async move { pipeline.scan().await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = rig.pipeline.scan().await.expect_err("busy");
        assert_eq!(err, ScanError::Busy);

        let first = timeout(Duration::from_secs(2), first)
            .await
            .expect("first scan should finish")
            .expect("task should not panic");
        assert!(first.is_ok());

        // Only one capture/recognize/resolve sequence ever ran.
        assert_eq!(rig.ocr.calls.load(Ordering::SeqCst), 1);
        assert_eq!(rig.lookup.calls.load(Ordering::SeqCst), 1);
        assert_eq!(rig.pipeline.state(), ScanState::Idle);
    }

    #[tokio::test]
    async fn dropping_an_in_flight_scan_releases_the_guard() {
        let rig = rig(
            FakeFrames::new(true),
            FakeOcr::slow("Lightning Bolt", Duration::from_secs(30)),
            LookupBehavior::Found("Lightning Bolt"),
        );

        {
            let scan = rig.pipeline.scan();
            tokio::pin!(scan);
            // Poll the flight into recognition, then abandon it.
            let _ = timeout(Duration::from_millis(50), scan.as_mut()).await;
        }

        assert_eq!(rig.pipeline.state(), ScanState::Idle);

        // A fresh flight must start instead of bouncing off Busy.
        let second = rig.pipeline.scan();
        tokio::pin!(second);
        if let Ok(result) = timeout(Duration::from_millis(50), second.as_mut()).await {
            assert_ne!(result, Err(ScanError::Busy));
        }
        assert_eq!(rig.ocr.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn state_watcher_sees_recognition_and_the_return_to_idle() {
        let rig = rig(
            FakeFrames::new(true),
            FakeOcr::slow("Lightning Bolt", Duration::from_millis(100)),
            LookupBehavior::Found("Lightning Bolt"),
        );
        let mut states = rig.pipeline.watch_state();

        let pipeline = rig.pipeline.clone();
        let scan = tokio::spawn(async move { pipeline.scan().await });

        let mut seen = Vec::new();
        let collect = async {
            while states.changed().await.is_ok() {
                let state = states.borrow_and_update().clone();
                let done = state == ScanState::Idle;
                seen.push(state);
                if done {
                    break;
                }
            }
        };
        timeout(Duration::from_secs(2), collect)
            .await
            .expect("scan should settle");
        let result = timeout(Duration::from_secs(2), scan)
            .await
            .expect("no hang")
            .expect("no panic");

        assert!(result.is_ok());
        assert!(seen.contains(&ScanState::Recognizing));
        assert_eq!(seen.last(), Some(&ScanState::Idle));
    }
}
