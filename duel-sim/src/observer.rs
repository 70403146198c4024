//! Display hooks fired while a simulation runs

use crate::round::Round;

/// Receives each piece of a run as soon as it exists.
///
/// Notifications are one-way; nothing an observer does changes the run.
pub trait RoundObserver {
    /// The opening request, before the first question
    fn on_opening(&mut self, _prompt: &str) {}

    fn on_question(&mut self, _index: u32, _question: &str) {}

    fn on_answer(&mut self, _index: u32, _answer: &str) {}

    fn on_judgement(&mut self, _index: u32, _feedback: &str, _score: u8) {}

    /// The completed round, after it was appended to the history
    fn on_round(&mut self, _round: &Round) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl RoundObserver for NullObserver {}
