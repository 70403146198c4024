//! # Duel Simulation
//!
//! A mock interview played by three agents sharing one text generator:
//! 1. The interviewer asks a question about the topic
//! 2. The interviewee answers, badly at first, later coached by feedback
//! 3. The judge gives feedback and a score from 1 to 10
//! 4. Repeat until a score reaches the pass threshold or rounds run out
//!
//! Generation failures never abort a run: the missing text is replaced by
//! a fixed apology and the loop carries on.

mod config;
mod observer;
mod prompts;
mod round;
mod score;
mod simulation;
mod transcript;

pub use config::SimulationConfig;
pub use observer::{NullObserver, RoundObserver};
pub use prompts::{answer_prompt, judge_prompt, question_prompt};
pub use round::{AgentRole, Outcome, Round, SimulationState};
pub use score::{parse_score, score_or_default};
pub use simulation::{run_simulation, Simulation, SimulationReport};
pub use transcript::{ResultsTable, Transcript};
