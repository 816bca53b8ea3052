use super::{DebatePlan, script};
use crate::protocol::{DebateEvent, Node};
use std::collections::VecDeque;
use std::time::Duration;

/// Where the debate currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Phase {
    Init,
    /// Index of the next warm-up status line.
    Warmup(usize),
    /// A speaker is about to be announced.
    Announce { round: u32, node: Node },
    Speaking {
        round: u32,
        node: Node,
        remaining: VecDeque<String>,
    },
    Closing { round: u32, node: Node },
    Done,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Step {
    pub(crate) event: DebateEvent,
    pub(crate) delay: Duration,
    pub(crate) next: Phase,
}

/// Emits the event for `phase` and the phase that follows it. `None` once the
/// debate has ended.
pub(crate) fn transition(phase: Phase, plan: &DebatePlan) -> Option<Step> {
    match phase {
        Phase::Init => transition(Phase::Warmup(0), plan),
        Phase::Warmup(index) => match script::WARMUP_STATUS.get(index) {
            Some(text) => Some(Step {
                event: DebateEvent::Status {
                    text: (*text).to_string(),
                },
                delay: plan.pacing.warmup.get(index).copied().unwrap_or_default(),
                next: Phase::Warmup(index + 1),
            }),
            None if plan.max_rounds == 0 => transition(Phase::Done, plan),
            None => transition(
                Phase::Announce {
                    round: 1,
                    node: Node::Optimist,
                },
                plan,
            ),
        },
        Phase::Announce { round, node } => {
            let text = script::utterance(&plan.topic, node, round);
            Some(Step {
                event: DebateEvent::Speaker {
                    node,
                    text: script::round_label(round),
                },
                delay: plan.pacing.speaker,
                next: Phase::Speaking {
                    round,
                    node,
                    remaining: script::fragments(&text, plan.granularity),
                },
            })
        }
        Phase::Speaking {
            round,
            node,
            mut remaining,
        } => {
            let Some(text) = remaining.pop_front() else {
                return transition(Phase::Closing { round, node }, plan);
            };
            let next = if remaining.is_empty() {
                Phase::Closing { round, node }
            } else {
                Phase::Speaking {
                    round,
                    node,
                    remaining,
                }
            };
            Some(Step {
                event: DebateEvent::Token { node, text },
                delay: plan.pacing.token,
                next,
            })
        }
        Phase::Closing { round, node } => {
            let next = match node {
                Node::Optimist => Phase::Announce {
                    round,
                    node: node.opponent(),
                },
                Node::Skeptic if round < plan.max_rounds => Phase::Announce {
                    round: round + 1,
                    node: Node::Optimist,
                },
                Node::Skeptic => Phase::Done,
            };
            Some(Step {
                event: DebateEvent::SpeakerEnd { node },
                delay: plan.pacing.speaker_end,
                next,
            })
        }
        Phase::Done => Some(Step {
            event: DebateEvent::Complete {
                text: script::summary(plan.max_rounds),
            },
            delay: plan.pacing.complete,
            next: Phase::Ended,
        }),
        Phase::Ended => None,
    }
}
