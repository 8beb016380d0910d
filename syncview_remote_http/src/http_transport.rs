/// HttpFrameTransport: frame requests served by a background HTTP worker.
///
/// Requests are queued to one worker thread that performs blocking GETs
/// with the configured timeout. Finished requests come back on a channel
/// that the owning viewport drains on every tick. Cancelled sequences are
/// skipped by the worker and dropped on poll.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use rustc_hash::FxHashSet;
use syncview_core::syncview::collaborators::{FrameImage, FrameRequest, FrameResponse, FrameTransport};
use syncview_core::syncview::{Error, RemoteConfig, Result};
use syncview_core::{viewer_debug, viewer_trace, viewer_warn};

const LOG_SOURCE: &str = "syncview::HttpFrameTransport";

type CancelledSet = Arc<Mutex<FxHashSet<u64>>>;

/// Remove `sequence` from the cancelled set, returning whether it was there
fn take_cancelled(cancelled: &CancelledSet, sequence: u64) -> bool {
    match cancelled.lock() {
        Ok(mut set) => set.remove(&sequence),
        Err(_) => false,
    }
}

/// Frame transport backed by a worker thread
pub struct HttpFrameTransport {
    jobs: Sender<FrameRequest>,
    responses: Receiver<FrameResponse>,
    cancelled: CancelledSet,
}

impl HttpFrameTransport {
    /// Transport whose requests give up after `timeout` (`None` waits forever)
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::InitializationFailed(format!("HTTP client: {}", e)))?;

        Self::with_fetcher(move |request| fetch_frame(&client, request))
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        Self::new(config.request_timeout())
    }

    /// Transport running `fetch` on the worker for every request
    pub(crate) fn with_fetcher<F>(fetch: F) -> Result<Self>
    where
        F: Fn(&FrameRequest) -> Result<FrameImage> + Send + 'static,
    {
        let (job_tx, job_rx) = mpsc::channel::<FrameRequest>();
        let (response_tx, response_rx) = mpsc::channel::<FrameResponse>();
        let cancelled: CancelledSet = Arc::new(Mutex::new(FxHashSet::default()));
        let worker_cancelled = cancelled.clone();

        thread::Builder::new()
            .name("syncview-frame-fetch".to_string())
            .spawn(move || {
                for request in job_rx {
                    if take_cancelled(&worker_cancelled, request.sequence) {
                        viewer_trace!(LOG_SOURCE, "Skipping cancelled frame #{}", request.sequence);
                        continue;
                    }
                    let result = fetch(&request);
                    let response = FrameResponse { sequence: request.sequence, result };
                    // Viewer side is gone
                    if response_tx.send(response).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| Error::InitializationFailed(format!("frame worker: {}", e)))?;

        Ok(Self { jobs: job_tx, responses: response_rx, cancelled })
    }
}

impl FrameTransport for HttpFrameTransport {
    fn request_frame(&mut self, request: FrameRequest) -> Result<()> {
        viewer_debug!(LOG_SOURCE, "GET {}", request.url());
        self.jobs
            .send(request)
            .map_err(|_| Error::RemoteRequestFailed("frame worker stopped".to_string()))
    }

    fn poll_response(&mut self) -> Option<FrameResponse> {
        loop {
            let response = self.responses.try_recv().ok()?;
            if take_cancelled(&self.cancelled, response.sequence) {
                continue;
            }
            return Some(response);
        }
    }

    fn cancel(&mut self, sequence: u64) {
        if let Ok(mut set) = self.cancelled.lock() {
            set.insert(sequence);
        }
    }
}

/// Blocking GET of one frame
fn fetch_frame(client: &Client, request: &FrameRequest) -> Result<FrameImage> {
    let url = request.url();
    let response = client
        .get(&url)
        .send()
        .map_err(|e| Error::RemoteRequestFailed(format!("{}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        viewer_warn!(LOG_SOURCE, "Frame #{} failed with HTTP {}", request.sequence, status);
        return Err(Error::RemoteRequestFailed(format!("{} returned {}", url, status)));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = response
        .bytes()
        .map_err(|e| Error::RemoteRequestFailed(format!("failed to read frame body: {}", e)))?;

    Ok(FrameImage { bytes: bytes.to_vec(), content_type })
}

#[cfg(test)]
#[path = "http_transport_tests.rs"]
mod tests;
