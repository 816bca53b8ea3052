use crate::protocol::{DebateEvent, Node};
use crossterm::style::{Color, Stylize};
use std::collections::HashMap;
use std::io::{self, Write};

/// A finished speaker turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub node: Node,
    pub round: String,
    pub text: String,
}

#[derive(Debug, Default)]
struct LiveTurn {
    round: String,
    text: String,
}

/// Folds stream events into what a viewer shows: the status line, turns still
/// being typed, and turns already finished.
#[derive(Debug, Default)]
pub struct Transcript {
    status: String,
    live: HashMap<Node, LiveTurn>,
    messages: Vec<Message>,
    complete: bool,
}

impl Transcript {
    pub fn apply(&mut self, event: &DebateEvent) {
        match event {
            DebateEvent::Status { text } => self.status = text.clone(),
            DebateEvent::Speaker { node, text } => {
                self.live.insert(
                    *node,
                    LiveTurn {
                        round: text.clone(),
                        text: String::new(),
                    },
                );
            }
            DebateEvent::Token { node, text } => {
                self.live.entry(*node).or_default().text.push_str(text);
            }
            DebateEvent::SpeakerEnd { node } => {
                let turn = self.live.remove(node).unwrap_or_default();
                self.messages.push(Message {
                    node: *node,
                    round: turn.round,
                    text: turn.text,
                });
            }
            DebateEvent::Complete { text } => {
                self.status = text.clone();
                self.complete = true;
            }
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Checks that the finished turns make up `rounds` full rounds, optimist
    /// first, each with something said.
    pub fn check_rounds(&self, rounds: i64) -> Result<(), String> {
        let expected = usize::try_from(rounds).unwrap_or_default() * 2;
        if self.messages.len() != expected {
            return Err(format!(
                "expected {expected} turns for {rounds} rounds, got {}",
                self.messages.len()
            ));
        }
        for (index, message) in self.messages.iter().enumerate() {
            let speaker = if index % 2 == 0 {
                Node::Optimist
            } else {
                Node::Skeptic
            };
            if message.node != speaker {
                return Err(format!(
                    "turn {} ({}) was spoken by the {} instead of the {speaker}",
                    index + 1,
                    message.round,
                    message.node
                ));
            }
            if message.text.is_empty() {
                return Err(format!(
                    "turn {} ({}, {}) was empty",
                    index + 1,
                    message.round,
                    message.node
                ));
            }
        }
        Ok(())
    }
}

fn node_color(node: Node) -> Color {
    match node {
        Node::Optimist => Color::Green,
        Node::Skeptic => Color::Red,
    }
}

/// Prints the debate as it streams, typewriter style.
pub struct Renderer<W: Write> {
    out: W,
    color: bool,
    transcript: Transcript,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            transcript: Transcript::default(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn render(&mut self, event: &DebateEvent) -> io::Result<()> {
        self.transcript.apply(event);

        match event {
            DebateEvent::Status { text } => {
                let line = if self.color {
                    text.clone().dark_grey().to_string()
                } else {
                    text.clone()
                };
                writeln!(self.out, "{line}")?;
            }
            DebateEvent::Speaker { node, text } => {
                let header = format!("{} · {}", node.label(), text);
                let header = if self.color {
                    header.with(node_color(*node)).bold().to_string()
                } else {
                    header
                };
                writeln!(self.out, "\n{header}")?;
            }
            DebateEvent::Token { text, .. } => write!(self.out, "{text}")?,
            DebateEvent::SpeakerEnd { .. } => writeln!(self.out)?,
            DebateEvent::Complete { .. } => {
                let summary = self.transcript.status();
                let line = if self.color {
                    summary.to_string().bold().to_string()
                } else {
                    summary.to_string()
                };
                writeln!(self.out, "\n{line}")?;
            }
        }

        self.out.flush()
    }
}
