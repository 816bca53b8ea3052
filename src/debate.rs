//! Debate event generator.
//!
//! [`generate`] validates its inputs eagerly and returns a [`DebateStream`], a
//! lazy single-use iterator of events each paired with the pause that should
//! follow it. The ordering lives in [`machine::transition`]; the words spoken
//! live in `script`.

use crate::error::DebateError;
use crate::protocol::DebateEvent;
use std::time::Duration;

mod machine;
mod script;

use machine::{Phase, transition};

/// Inter-event delays. The defaults reproduce the typewriter cadence clients
/// are tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Pause after each warm-up status line.
    pub warmup: [Duration; 2],
    /// Pause after a speaker is announced.
    pub speaker: Duration,
    /// Pause after each token.
    pub token: Duration,
    /// Pause between speakers.
    pub speaker_end: Duration,
    pub complete: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            warmup: [Duration::from_millis(500), Duration::from_millis(300)],
            speaker: Duration::from_millis(200),
            token: Duration::from_millis(30),
            speaker_end: Duration::from_millis(500),
            complete: Duration::ZERO,
        }
    }
}

impl Pacing {
    pub fn instant() -> Self {
        Self {
            warmup: [Duration::ZERO; 2],
            speaker: Duration::ZERO,
            token: Duration::ZERO,
            speaker_end: Duration::ZERO,
            complete: Duration::ZERO,
        }
    }
}

/// Size of each `token` fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Granularity {
    #[default]
    Char,
    Word,
}

#[derive(Debug, Clone)]
pub(crate) struct DebatePlan {
    pub(crate) topic: String,
    pub(crate) max_rounds: u32,
    pub(crate) pacing: Pacing,
    pub(crate) granularity: Granularity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacedEvent {
    pub event: DebateEvent,
    /// How long to wait after delivering `event` before pulling the next one.
    pub delay: Duration,
}

pub struct DebateStream {
    plan: DebatePlan,
    phase: Option<Phase>,
}

impl DebateStream {
    pub fn topic(&self) -> &str {
        &self.plan.topic
    }

    pub fn max_rounds(&self) -> u32 {
        self.plan.max_rounds
    }
}

impl Iterator for DebateStream {
    type Item = PacedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let phase = self.phase.take()?;
        let step = transition(phase, &self.plan)?;
        self.phase = Some(step.next);
        Some(PacedEvent {
            event: step.event,
            delay: step.delay,
        })
    }
}

/// Builds a fresh debate. An empty topic is accepted here and interpolated as
/// empty text; the HTTP layer is stricter.
pub fn generate(
    topic: impl Into<String>,
    max_rounds: i64,
    pacing: Pacing,
    granularity: Granularity,
) -> Result<DebateStream, DebateError> {
    let max_rounds = u32::try_from(max_rounds).map_err(|_| {
        DebateError::invalid(format!(
            "max_rounds must be between 0 and {}, got {max_rounds}",
            u32::MAX
        ))
    })?;

    Ok(DebateStream {
        plan: DebatePlan {
            topic: topic.into(),
            max_rounds,
            pacing,
            granularity,
        },
        phase: Some(Phase::Init),
    })
}
