//! Chat transcript and results table for display

use crate::observer::RoundObserver;
use crate::round::Round;
use duel_llm::{ChatMessage, Role};
use std::fmt;

/// The run as a chat: requests and answers from the `user` side,
/// questions and judgements from the `assistant` side.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Markdown rendering, one heading per message
    pub fn to_markdown(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("### {}\n\n{}\n", role_label(m.role), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::System => "System",
        Role::User => "User",
        Role::Assistant => "Assistant",
    }
}

impl RoundObserver for Transcript {
    fn on_opening(&mut self, prompt: &str) {
        self.messages.push(ChatMessage::user(prompt));
    }

    fn on_question(&mut self, _index: u32, question: &str) {
        self.messages.push(ChatMessage::assistant(question));
    }

    fn on_answer(&mut self, _index: u32, answer: &str) {
        self.messages.push(ChatMessage::user(answer));
    }

    fn on_judgement(&mut self, _index: u32, feedback: &str, _score: u8) {
        self.messages.push(ChatMessage::assistant(feedback));
    }
}

/// Markdown table of rounds: Iter., Questions, Answers, Judge Comments, Score, Passed
pub struct ResultsTable<'a> {
    rounds: &'a [Round],
    max_cell_chars: usize,
}

impl<'a> ResultsTable<'a> {
    pub fn new(rounds: &'a [Round]) -> Self {
        Self {
            rounds,
            max_cell_chars: 80,
        }
    }

    pub fn with_max_cell_chars(mut self, max: usize) -> Self {
        self.max_cell_chars = max;
        self
    }

    fn cell(&self, text: &str) -> String {
        let flat = text.split_whitespace().collect::<Vec<_>>().join(" ").replace('|', "\\|");
        truncate(&flat, self.max_cell_chars)
    }
}

impl fmt::Display for ResultsTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "| Iter. | Questions | Answers | Judge Comments | Score | Passed |")?;
        writeln!(f, "|------:|-----------|---------|----------------|------:|:------:|")?;
        for round in self.rounds {
            let score = if round.score_parsed {
                round.score.to_string()
            } else {
                format!("{}*", round.score)
            };
            writeln!(
                f,
                "| {} | {} | {} | {} | {} | {} |",
                round.index,
                self.cell(&round.question),
                self.cell(&round.answer),
                self.cell(&round.feedback),
                score,
                if round.passed { 1 } else { 0 }
            )?;
        }
        Ok(())
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}
