use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use blossom_protocol::UploadProgress;
use bytes::Bytes;
use futures_util::Stream;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::trace;

use crate::progress::{ProgressObserver, ProgressThrottle};
use crate::types::{PhaseTracker, TransferOptions, TransferPhase};
use crate::TransferError;

// ---------------------------------------------------------------------------
// Checksum helpers
// ---------------------------------------------------------------------------

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Computes SHA-256 of an entire file and returns the digest with the file size.
pub async fn calculate_file_checksum(path: &Path) -> Result<(String, u64), TransferError> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    let mut size = 0u64;
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((hex::encode(hasher.finalize()), size))
}

// ---------------------------------------------------------------------------
// ChunkStream
// ---------------------------------------------------------------------------

/// Request body that pumps a byte source in fixed-size chunks.
///
/// Chunks are yielded in read order, one read per poll, so the whole payload
/// is never held in memory. The source is dropped as soon as it reports EOF,
/// fails, or the cancellation token fires; dropping the stream drops it too.
/// A [`SourceGuard`] taken from the stream drops the source immediately,
/// even while a transport still owns the stream.
/// The total read must equal the declared size: a short source ends with
/// `UnexpectedEof`, a long one with `InvalidData`.
pub struct ChunkStream<R> {
    source: Arc<Mutex<Option<R>>>,
    buf: Vec<u8>,
    total_bytes: u64,
    transferred: u64,
    throttle: ProgressThrottle,
    observer: Option<Arc<dyn ProgressObserver>>,
    cancel: CancellationToken,
    // Mutex only makes the stream `Sync`; it is reached through `get_mut`.
    cancelled: Mutex<Pin<Box<WaitForCancellationFutureOwned>>>,
    phase: PhaseTracker,
}

impl<R> ChunkStream<R>
where
    R: AsyncRead + Unpin,
{
    /// Wraps `source`, which must yield exactly `total_bytes` bytes.
    pub fn new(source: R, total_bytes: u64, options: TransferOptions) -> Self {
        let options = options.normalized();
        let cancel = CancellationToken::new();
        Self {
            source: Arc::new(Mutex::new(Some(source))),
            buf: vec![0u8; options.chunk_size],
            total_bytes,
            transferred: 0,
            throttle: ProgressThrottle::new(options.progress_interval),
            observer: None,
            cancelled: Mutex::new(Box::pin(cancel.clone().cancelled_owned())),
            cancel,
            phase: PhaseTracker::new(),
        }
    }

    /// Attaches a progress observer.
    pub fn with_observer(mut self, observer: Option<Arc<dyn ProgressObserver>>) -> Self {
        self.observer = observer;
        self
    }

    /// Stops reading, releases the source and silences the observer once
    /// `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancelled = Mutex::new(Box::pin(cancel.clone().cancelled_owned()));
        self.cancel = cancel;
        self
    }

    /// Moves `phase` to `AwaitingResponse` once the body is fully sent.
    pub fn with_phase(mut self, phase: PhaseTracker) -> Self {
        self.phase = phase;
        self
    }

    /// Bytes yielded so far.
    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    /// Returns `true` while the source is still held.
    pub fn holds_source(&self) -> bool {
        lock_source(&self.source).is_some()
    }

    /// Returns a guard that cancels this stream and drops its source when
    /// the guard goes out of scope.
    ///
    /// Take it after [`with_cancel`](Self::with_cancel); the guard fires the
    /// token the stream holds at this point.
    pub fn guard(&self) -> SourceGuard<R> {
        SourceGuard {
            source: Arc::clone(&self.source),
            cancel: self.cancel.clone(),
        }
    }

    fn release(&mut self) {
        drop(take_source(&self.source));
    }

    fn report(&mut self) {
        if !self.throttle.should_report(self.transferred) || self.cancel.is_cancelled() {
            return;
        }
        trace!(
            transferred = self.transferred,
            total = self.total_bytes,
            "upload progress"
        );
        if let Some(observer) = &self.observer {
            observer.on_progress(UploadProgress {
                bytes_transferred: self.transferred,
                total_bytes: self.total_bytes,
            });
        }
    }
}

impl<R> Stream for ChunkStream<R>
where
    R: AsyncRead + Unpin,
{
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        let cancelled = this
            .cancelled
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if cancelled.as_mut().poll(cx).is_ready() {
            this.release();
            return Poll::Ready(Some(Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "upload cancelled",
            ))));
        }

        let read = {
            let mut slot = lock_source(&this.source);
            let Some(source) = slot.as_mut() else {
                return Poll::Ready(None);
            };
            let mut read_buf = ReadBuf::new(&mut this.buf);
            match Pin::new(source).poll_read(cx, &mut read_buf) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(result) => result.map(|()| read_buf.filled().len()),
            }
        };

        let n = match read {
            Ok(n) => n,
            Err(e) => {
                this.release();
                return Poll::Ready(Some(Err(e)));
            }
        };

        if n == 0 {
            this.release();
            if this.transferred < this.total_bytes {
                return Poll::Ready(Some(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "source ended after {} of {} bytes",
                        this.transferred, this.total_bytes
                    ),
                ))));
            }
            this.phase.set(TransferPhase::AwaitingResponse);
            return Poll::Ready(None);
        }

        this.transferred += n as u64;
        if this.transferred > this.total_bytes {
            this.release();
            return Poll::Ready(Some(Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("source is larger than the declared {} bytes", this.total_bytes),
            ))));
        }

        let chunk = Bytes::copy_from_slice(&this.buf[..n]);
        this.report();
        Poll::Ready(Some(Ok(chunk)))
    }
}

/// Cancels a [`ChunkStream`] and drops its source on drop.
///
/// Held by the code that started the upload, so the source never outlives
/// that call even when the HTTP transport keeps the stream alive longer.
#[must_use = "the source is released as soon as the guard is dropped"]
pub struct SourceGuard<R> {
    source: Arc<Mutex<Option<R>>>,
    cancel: CancellationToken,
}

impl<R> SourceGuard<R> {
    /// Returns `true` while the source is still held.
    pub fn holds_source(&self) -> bool {
        lock_source(&self.source).is_some()
    }
}

impl<R> Drop for SourceGuard<R> {
    fn drop(&mut self) {
        self.cancel.cancel();
        drop(take_source(&self.source));
    }
}

fn lock_source<R>(slot: &Mutex<Option<R>>) -> MutexGuard<'_, Option<R>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

// The source is dropped after the lock is released.
fn take_source<R>(slot: &Mutex<Option<R>>) -> Option<R> {
    lock_source(slot).take()
}
