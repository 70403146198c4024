//! Round records and the state of one simulation run

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three roles played by the shared generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Interviewer,
    Interviewee,
    Judge,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AgentRole::Interviewer => "interviewer",
            AgentRole::Interviewee => "interviewee",
            AgentRole::Judge => "judge",
        };
        f.write_str(name)
    }
}

/// One question/answer/judgement cycle. Never modified once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub index: u32,
    pub question: String,
    pub answer: String,
    /// The judge's full reply
    pub feedback: String,
    /// Always in `1..=10`; the configured default when the reply had no score
    pub score: u8,
    /// False when `score` is the default rather than read from the reply
    pub score_parsed: bool,
    /// The score was parsed and reached the threshold
    pub passed: bool,
    /// Agents whose output was replaced by the fallback text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<AgentRole>,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// A round reached the pass threshold
    Passed { round: u32, score: u8 },
    /// `max_rounds` rounds were played without a pass
    MaxRoundsReached { rounds: u32 },
}

impl Outcome {
    pub fn terminated_early(&self) -> bool {
        matches!(self, Outcome::Passed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed { round, score } => {
                write!(f, "passed in round {} with score {}", round, score)
            }
            Outcome::MaxRoundsReached { rounds } => {
                write!(f, "no passing answer after {} rounds", rounds)
            }
        }
    }
}

/// Append-only history of a run plus its termination flag.
///
/// Indices start at 0 and grow by exactly one per round.
#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    rounds: Vec<Round>,
    outcome: Option<Outcome>,
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next round must carry
    pub fn next_index(&self) -> u32 {
        self.rounds.len() as u32
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn last(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub(crate) fn push(&mut self, round: Round) {
        debug_assert_eq!(round.index, self.next_index(), "round indices must be contiguous");
        debug_assert!(self.outcome.is_none(), "cannot append to a finished run");
        self.rounds.push(round);
    }

    pub(crate) fn finish(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }

    pub fn into_parts(self) -> (Vec<Round>, Option<Outcome>) {
        (self.rounds, self.outcome)
    }
}
