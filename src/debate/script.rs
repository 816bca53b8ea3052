use super::Granularity;
use crate::protocol::Node;
use std::collections::VecDeque;

pub(crate) const WARMUP_STATUS: [&str; 2] = [
    "⚡ Waking up the debate engine...",
    "🔥 Engine ready, let the debate begin!",
];

pub(crate) fn round_label(round: u32) -> String {
    format!("Round {round}")
}

/// Full text of one turn. Deterministic in `(topic, node, round)`.
pub(crate) fn utterance(topic: &str, node: Node, round: u32) -> String {
    match (node, round) {
        (Node::Optimist, 0 | 1) => format!(
            "On \u{201c}{topic}\u{201d}, I see a field full of opportunity. Progress has always \
             opened up new possibilities, and we should meet change with an open mind."
        ),
        (Node::Optimist, _) => format!(
            "In response to the skeptic, I have to point out that every technological revolution \
             raised the same fears, yet people adapted and built a better future. \
             \u{201c}{topic}\u{201d} is no exception!"
        ),
        (Node::Skeptic, 0 | 1) => format!(
            "Still, we have to approach \u{201c}{topic}\u{201d} with care. Excessive optimism can \
             blind us to real risks and challenges. History shows that uncritical faith in \
             technology often brings unintended consequences."
        ),
        (Node::Skeptic, _) => format!(
            "The optimist overlooks a key fact: the speed and scale of this change are \
             unprecedented. The impact of \u{201c}{topic}\u{201d} may run deeper than we expect, \
             and we need more oversight and preparation."
        ),
    }
}

pub(crate) fn summary(rounds: u32) -> String {
    let noun = if rounds == 1 { "round" } else { "rounds" };
    format!("✅ Debate finished after {rounds} {noun} of lively exchange.")
}

/// Splits `text` into token fragments whose concatenation is exactly `text`.
pub(crate) fn fragments(text: &str, granularity: Granularity) -> VecDeque<String> {
    match granularity {
        Granularity::Char => text.chars().map(String::from).collect(),
        Granularity::Word => text.split_inclusive(' ').map(str::to_string).collect(),
    }
}
