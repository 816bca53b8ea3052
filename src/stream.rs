use crate::debate::{DebateStream, PacedEvent};
use crate::error::DebateError;
use crate::protocol::DebateEvent;
use axum::response::sse::Event;
use futures::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// Process-wide counters for debate streams.
#[derive(Debug, Default)]
pub struct StreamStats {
    active: AtomicUsize,
    completed: AtomicU64,
    disconnected: AtomicU64,
    failed: AtomicU64,
}

impl StreamStats {
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn disconnected(&self) -> u64 {
        self.disconnected.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// JSON body of the `data:` field for one event.
pub fn encode_frame(event: &DebateEvent) -> Result<String, DebateError> {
    Ok(serde_json::to_string(event)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Streaming,
    Completed,
    Failed,
}

// Settles the counters however the stream goes away, including hyper dropping
// the body when the peer hangs up.
struct StreamGuard {
    stats: Arc<StreamStats>,
    id: Uuid,
    frames: u64,
    outcome: Outcome,
}

impl StreamGuard {
    fn open(stats: Arc<StreamStats>, id: Uuid) -> Self {
        stats.active.fetch_add(1, Ordering::Relaxed);
        Self {
            stats,
            id,
            frames: 0,
            outcome: Outcome::Streaming,
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.stats.active.fetch_sub(1, Ordering::Relaxed);
        match self.outcome {
            Outcome::Completed => {
                self.stats.completed.fetch_add(1, Ordering::Relaxed);
                tracing::info!(stream_id = %self.id, frames = self.frames, "debate stream completed");
            }
            Outcome::Streaming => {
                self.stats.disconnected.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    stream_id = %self.id,
                    frames = self.frames,
                    reason = %DebateError::ClientDisconnected,
                    "debate stream abandoned"
                );
            }
            Outcome::Failed => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

struct Pump {
    events: DebateStream,
    pending: Duration,
    guard: StreamGuard,
}

/// Adapts a debate into SSE frames.
///
/// Pull driven: the delay attached to a frame is slept only when the transport
/// asks for the next one, so at most one event is ever in flight. Dropping the
/// returned stream cancels the pending sleep and releases the generator.
pub fn into_sse(
    events: DebateStream,
    stats: Arc<StreamStats>,
    stream_id: Uuid,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    let pump = Pump {
        events,
        pending: Duration::ZERO,
        guard: StreamGuard::open(stats, stream_id),
    };

    futures::stream::unfold(Some(pump), |state| async move {
        let mut pump = state?;
        if !pump.pending.is_zero() {
            tokio::time::sleep(pump.pending).await;
        }

        let PacedEvent { event, delay } = pump.events.next()?;
        let data = match encode_frame(&event) {
            Ok(data) => data,
            Err(err) => {
                tracing::error!(stream_id = %pump.guard.id, kind = event.kind(), "{err}");
                pump.guard.outcome = Outcome::Failed;
                return None;
            }
        };

        pump.guard.frames += 1;
        tracing::trace!(stream_id = %pump.guard.id, kind = event.kind(), "frame");
        let frame = Ok::<Event, Infallible>(Event::default().data(data));

        if event.is_terminal() {
            pump.guard.outcome = Outcome::Completed;
            return Some((frame, None));
        }

        pump.pending = delay;
        Some((frame, Some(pump)))
    })
}
