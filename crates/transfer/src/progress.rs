use blossom_protocol::UploadProgress;
use tokio::sync::mpsc;

/// Receives progress snapshots from an in-flight upload.
///
/// Called synchronously from the body stream between chunk reads, so
/// implementations must return quickly. Snapshots for one upload arrive in
/// order with non-decreasing `bytes_transferred`.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: UploadProgress);
}

impl<F> ProgressObserver for F
where
    F: Fn(UploadProgress) + Send + Sync,
{
    fn on_progress(&self, progress: UploadProgress) {
        self(progress)
    }
}

/// Forwards snapshots into a bounded channel.
///
/// Uses `try_send`: a full channel drops the snapshot instead of stalling
/// the upload.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::Sender<UploadProgress>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::Sender<UploadProgress>) -> Self {
        Self { tx }
    }

    /// Creates an observer and the receiver that drains it.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<UploadProgress>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, progress: UploadProgress) {
        let _ = self.tx.try_send(progress);
    }
}

/// Decides when cumulative progress has advanced far enough to report.
///
/// Bounds observer calls by bytes moved rather than by chunk count, so
/// small chunks or a fast source cannot flood the observer.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: u64,
    last_reported: u64,
}

impl ProgressThrottle {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            last_reported: 0,
        }
    }

    /// Returns `true` if a report is due at `transferred` bytes and marks it sent.
    pub fn should_report(&mut self, transferred: u64) -> bool {
        if transferred.saturating_sub(self.last_reported) >= self.interval {
            self.last_reported = transferred;
            true
        } else {
            false
        }
    }
}
