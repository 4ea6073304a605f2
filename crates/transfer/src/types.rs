use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::{DEFAULT_CHUNK_SIZE, DEFAULT_PROGRESS_INTERVAL};

/// Tunables for a single streaming upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    /// Bytes read from the source per chunk.
    pub chunk_size: usize,
    /// Minimum number of bytes between two progress reports.
    pub progress_interval: u64,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl TransferOptions {
    /// Replaces zero values with the defaults.
    pub fn normalized(self) -> Self {
        Self {
            chunk_size: if self.chunk_size == 0 {
                DEFAULT_CHUNK_SIZE
            } else {
                self.chunk_size
            },
            progress_interval: if self.progress_interval == 0 {
                DEFAULT_PROGRESS_INTERVAL
            } else {
                self.progress_interval
            },
        }
    }
}

/// Lifecycle of one upload call.
///
/// `Idle -> StreamingBody -> AwaitingResponse -> Validated | Failed`.
/// A call may jump to `Failed` from either active phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TransferPhase {
    Idle = 0,
    StreamingBody = 1,
    AwaitingResponse = 2,
    Validated = 3,
    Failed = 4,
}

impl TransferPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::StreamingBody,
            2 => Self::AwaitingResponse,
            3 => Self::Validated,
            4 => Self::Failed,
            _ => Self::Idle,
        }
    }

    /// Returns `true` for `Validated` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Validated | Self::Failed)
    }
}

impl std::fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::StreamingBody => "streaming_body",
            Self::AwaitingResponse => "awaiting_response",
            Self::Validated => "validated",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Shared view of a transfer's phase.
///
/// The body stream advances it from inside the HTTP transport while the
/// caller reads it to report where a failure happened. Terminal phases are
/// sticky.
#[derive(Debug, Clone, Default)]
pub struct PhaseTracker {
    phase: Arc<AtomicU8>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn get(&self) -> TransferPhase {
        TransferPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Moves to `next` unless a terminal phase was already reached.
    pub fn set(&self, next: TransferPhase) {
        let _ = self
            .phase
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                if TransferPhase::from_u8(cur).is_terminal() {
                    None
                } else {
                    Some(next as u8)
                }
            });
    }
}
