use std::io;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::presenter::QuakeList;
use crate::core::quake::source::FeedSource;
use crate::core::quake::types::EarthquakeEvent;

/// Opens an event's detail page.
///
/// Called on tokio's blocking pool, so an implementation may block.
pub trait Navigator: Send + Sync + 'static {
    fn open_url(&self, url: &str) -> io::Result<()>;
}

/// Hands URLs to the platform's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl Navigator for SystemBrowser {
    fn open_url(&self, url: &str) -> io::Result<()> {
        open::that_detached(url)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error("no earthquake at row index {0}")]
    NoSuchRow(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshRequest {
    Started,
    AlreadyRunning,
}

/// What [`ScreenController::next_update`] observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenUpdate {
    Applied { count: usize },
    Stale,
    NavigationFailed { url: String, message: String },
}

#[derive(Debug)]
enum ControllerMessage {
    Refreshed {
        generation: u64,
        events: Vec<EarthquakeEvent>,
    },
    NavigationFailed {
        url: String,
        error: io::Error,
    },
}

#[derive(Debug)]
struct PendingRefresh {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Drives one screen: refreshes the list from its source and opens rows.
///
/// At most one refresh runs at a time. Its result comes back as a single
/// message tagged with a generation; results from cancelled refreshes are
/// dropped instead of touching the list. Navigation runs off the caller's
/// task and only reports back when it fails.
pub struct ScreenController<N> {
    source: Arc<FeedSource>,
    list: QuakeList,
    navigator: Arc<N>,
    generation: u64,
    pending: Option<PendingRefresh>,
    messages_tx: mpsc::UnboundedSender<ControllerMessage>,
    messages_rx: mpsc::UnboundedReceiver<ControllerMessage>,
}

impl<N: Navigator> ScreenController<N> {
    pub fn new(source: FeedSource, navigator: N) -> Self {
        let (messages_tx, messages_rx) = mpsc::unbounded_channel();
        Self {
            source: Arc::new(source),
            list: QuakeList::new(),
            navigator: Arc::new(navigator),
            generation: 0,
            pending: None,
            messages_tx,
            messages_rx,
        }
    }

    pub fn list(&self) -> &QuakeList {
        &self.list
    }

    pub fn source(&self) -> &FeedSource {
        &self.source
    }

    pub fn is_refreshing(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts a background refresh unless one is already in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request_refresh(&mut self) -> RefreshRequest {
        if self.pending.is_some() {
            tracing::info!("refresh already in flight, ignoring request");
            return RefreshRequest::AlreadyRunning;
        }

        self.generation += 1;
        let generation = self.generation;
        let source = Arc::clone(&self.source);
        let messages_tx = self.messages_tx.clone();
        tracing::info!(generation, source = %source.describe(), "refreshing earthquakes");
        let handle = tokio::spawn(async move {
            let events = source.load().await;
            // The receiver lives as long as the controller.
            let _ = messages_tx.send(ControllerMessage::Refreshed { generation, events });
        });
        self.pending = Some(PendingRefresh { generation, handle });
        RefreshRequest::Started
    }

    /// Aborts the in-flight refresh. Returns false if none was running.
    pub fn cancel_refresh(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.handle.abort();
                tracing::info!(generation = pending.generation, "refresh cancelled");
                true
            }
            None => false,
        }
    }

    /// Waits for the next refresh result or navigation failure.
    ///
    /// Cancel safe. Pends forever when nothing was started.
    pub async fn next_update(&mut self) -> Option<ScreenUpdate> {
        let message = self.messages_rx.recv().await?;
        Some(match message {
            ControllerMessage::Refreshed { generation, events } => self.apply(generation, events),
            ControllerMessage::NavigationFailed { url, error } => ScreenUpdate::NavigationFailed {
                url,
                message: error.to_string(),
            },
        })
    }

    fn apply(&mut self, generation: u64, events: Vec<EarthquakeEvent>) -> ScreenUpdate {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.generation == generation);
        if !current {
            tracing::debug!(generation, "dropping stale refresh result");
            return ScreenUpdate::Stale;
        }

        self.pending = None;
        let count = events.len();
        self.list.replace(events);
        tracing::info!(generation, count, "earthquake list updated");
        ScreenUpdate::Applied { count }
    }

    /// Opens the detail page of the row at `index` (zero-based).
    ///
    /// Returns once the navigator is scheduled; a failure to open arrives
    /// later as [`ScreenUpdate::NavigationFailed`]. Must be called from
    /// within a tokio runtime.
    pub fn open(&self, index: usize) -> Result<(), ScreenError> {
        let url = self
            .list
            .detail_url(index)
            .ok_or(ScreenError::NoSuchRow(index))?
            .to_string();
        let navigator = Arc::clone(&self.navigator);
        let messages_tx = self.messages_tx.clone();
        tracing::info!(%url, "opening detail page");
        tokio::task::spawn_blocking(move || {
            if let Err(error) = navigator.open_url(&url) {
                tracing::warn!(%url, %error, "could not open detail page");
                let _ = messages_tx.send(ControllerMessage::NavigationFailed { url, error });
            }
        });
        Ok(())
    }
}
