//! The interview loop

use crate::config::SimulationConfig;
use crate::observer::{NullObserver, RoundObserver};
use crate::prompts::{answer_prompt, judge_prompt, question_prompt};
use crate::round::{AgentRole, Outcome, Round, SimulationState};
use crate::score::parse_score;
use duel_error::{Error, ErrorKind, Result};
use duel_llm::{LlmProvider, UsageTracker};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub topic: String,
    pub provider: String,
    pub model: String,
    pub config: SimulationConfig,
    pub rounds: Vec<Round>,
    pub outcome: Outcome,
    /// Provider-wide usage at the end of the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageTracker>,
}

impl SimulationReport {
    pub fn terminated_early(&self) -> bool {
        self.outcome.terminated_early()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::new(ErrorKind::SerializationFailed, "could not serialize report")
                .with_operation("report::to_json")
                .set_source(e)
        })
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json_pretty()?;
        std::fs::write(path, json).map_err(|e| {
            Error::from(e)
                .with_operation("report::write_json")
                .with_context("path", path.display().to_string())
        })
    }
}

/// One interview on one provider.
///
/// Interviewer, interviewee and judge are all `provider.generate` with
/// different prompts; calls are made one at a time, in order.
pub struct Simulation<'p, P: LlmProvider> {
    provider: &'p P,
    config: SimulationConfig,
}

impl<'p, P: LlmProvider> Simulation<'p, P> {
    pub fn new(provider: &'p P, config: SimulationConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub async fn run(&self, topic: &str) -> Result<SimulationReport> {
        self.run_with(topic, &mut NullObserver).await
    }

    /// Run to completion, reporting progress to `observer`.
    ///
    /// Only invalid configuration is an error, and it is raised before the
    /// first call. Generation failures become fallback text.
    pub async fn run_with(
        &self,
        topic: &str,
        observer: &mut dyn RoundObserver,
    ) -> Result<SimulationReport> {
        self.config
            .validate()
            .map_err(|e| e.with_operation("simulation::run"))?;

        if topic.trim().is_empty() {
            warn!("topic is empty; the interviewer will improvise");
        }

        info!(
            topic,
            max_rounds = self.config.max_rounds,
            pass_threshold = self.config.pass_threshold,
            provider = self.provider.name(),
            "starting simulation"
        );

        let state = self.play(topic, observer).await;
        let (rounds, outcome) = state.into_parts();
        let outcome = outcome.unwrap_or(Outcome::MaxRoundsReached {
            rounds: rounds.len() as u32,
        });

        info!(rounds = rounds.len(), %outcome, "simulation finished");

        Ok(SimulationReport {
            topic: topic.to_string(),
            provider: self.provider.name().to_string(),
            model: self.provider.default_model().to_string(),
            config: self.config.clone(),
            rounds,
            outcome,
            usage: self.provider.usage(),
        })
    }

    async fn play(&self, topic: &str, observer: &mut dyn RoundObserver) -> SimulationState {
        let mut state = SimulationState::new();
        observer.on_opening(&question_prompt(topic, &[]));

        loop {
            let index = state.next_index();
            let mut fallbacks = Vec::new();

            let prompt = {
                let asked: Vec<&str> = state
                    .rounds()
                    .iter()
                    .filter(|r| !r.fallbacks.contains(&AgentRole::Interviewer))
                    .map(|r| r.question.as_str())
                    .collect();
                question_prompt(topic, &asked)
            };
            let question = self.ask(AgentRole::Interviewer, index, &prompt, &mut fallbacks).await;
            observer.on_question(index, &question);

            let prompt = {
                let coaching = if index >= self.config.coaching_starts_at {
                    state.last().map(|r| r.feedback.as_str())
                } else {
                    None
                };
                answer_prompt(&question, coaching)
            };
            let answer = self.ask(AgentRole::Interviewee, index, &prompt, &mut fallbacks).await;
            observer.on_answer(index, &answer);

            let prompt = judge_prompt(&question, &answer);
            let feedback = self.ask(AgentRole::Judge, index, &prompt, &mut fallbacks).await;

            let parsed = parse_score(&feedback);
            let score = parsed.unwrap_or(self.config.default_score);
            if parsed.is_none() {
                warn!(round = index, default = score, "judge reply carried no score");
            }
            observer.on_judgement(index, &feedback, score);

            // An unscored judgement never passes, whatever the default
            let passed = parsed.is_some() && score >= self.config.pass_threshold;
            info!(round = index, score, passed, "round complete");

            state.push(Round {
                index,
                question,
                answer,
                feedback,
                score,
                score_parsed: parsed.is_some(),
                passed,
                fallbacks,
            });
            if let Some(round) = state.last() {
                observer.on_round(round);
            }

            if passed {
                state.finish(Outcome::Passed { round: index, score });
                break;
            }
            if index + 1 >= self.config.max_rounds {
                state.finish(Outcome::MaxRoundsReached { rounds: index + 1 });
                break;
            }
        }

        state
    }

    /// One agent turn; a failed call yields the fallback text
    async fn ask(
        &self,
        role: AgentRole,
        index: u32,
        prompt: &str,
        fallbacks: &mut Vec<AgentRole>,
    ) -> String {
        debug!(%role, round = index, prompt_chars = prompt.len(), "generating");

        match self.provider.generate(prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(%role, round = index, error = %e, "generation failed, using fallback text");
                fallbacks.push(role);
                self.config.fallback_text.clone()
            }
        }
    }
}

/// The bare loop: rounds played and whether a round passed.
///
/// Settings other than `max_rounds` and `pass_threshold` keep their defaults.
pub async fn run_simulation<P: LlmProvider>(
    provider: &P,
    topic: &str,
    max_rounds: u32,
    pass_threshold: u8,
) -> Result<(Vec<Round>, bool)> {
    let config = SimulationConfig::default()
        .with_max_rounds(max_rounds)
        .with_pass_threshold(pass_threshold);

    let report = Simulation::new(provider, config).run(topic).await?;
    let terminated_early = report.terminated_early();
    Ok((report.rounds, terminated_early))
}
