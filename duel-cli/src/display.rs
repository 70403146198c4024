//! Terminal rendering of a running simulation

use duel_llm::{ChatMessage, Role, UsageTracker};
use duel_sim::{ResultsTable, Round, RoundObserver, SimulationReport, Transcript};
use std::io::Write;

/// Prints chat messages as they arrive and keeps the transcript
pub struct ConsolePrinter<W: Write> {
    out: W,
    transcript: Transcript,
    quiet: bool,
}

impl<W: Write> ConsolePrinter<W> {
    pub fn new(out: W, quiet: bool) -> Self {
        Self {
            out,
            transcript: Transcript::new(),
            quiet,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn print_last(&mut self) {
        if self.quiet {
            return;
        }
        if let Some(message) = self.transcript.last() {
            // Console write errors are ignored
            let _ = write_message(&mut self.out, message);
        }
    }

    /// Results table, outcome line and usage summary
    pub fn print_report(&mut self, report: &SimulationReport) -> std::io::Result<()> {
        writeln!(self.out, "--- Results ---\n")?;
        write!(self.out, "{}", ResultsTable::new(&report.rounds))?;
        writeln!(self.out)?;
        writeln!(self.out, "Outcome: {}", report.outcome)?;
        if let Some(usage) = &report.usage {
            writeln!(self.out, "{}", usage_line(usage))?;
        }
        Ok(())
    }
}

fn write_message(out: &mut impl Write, message: &ChatMessage) -> std::io::Result<()> {
    let label = match message.role {
        Role::System => "SYSTEM",
        Role::User => "USER",
        Role::Assistant => "ASSISTANT",
    };
    writeln!(out, "[{}]", label)?;
    writeln!(out, "{}", message.content)?;
    writeln!(out)
}

fn usage_line(usage: &UsageTracker) -> String {
    format!(
        "Usage: {} calls, {} prompt + {} completion tokens",
        usage.total_calls, usage.total_prompt_tokens, usage.total_completion_tokens
    )
}

impl<W: Write> RoundObserver for ConsolePrinter<W> {
    fn on_opening(&mut self, prompt: &str) {
        self.transcript.on_opening(prompt);
        self.print_last();
    }

    fn on_question(&mut self, index: u32, question: &str) {
        if !self.quiet {
            let _ = writeln!(self.out, "=== Round {} ===\n", index);
        }
        self.transcript.on_question(index, question);
        self.print_last();
    }

    fn on_answer(&mut self, index: u32, answer: &str) {
        self.transcript.on_answer(index, answer);
        self.print_last();
    }

    fn on_judgement(&mut self, index: u32, feedback: &str, score: u8) {
        self.transcript.on_judgement(index, feedback, score);
        self.print_last();
    }

    fn on_round(&mut self, round: &Round) {
        if self.quiet {
            return;
        }
        let verdict = if round.passed { "pass" } else { "no pass" };
        let _ = writeln!(self.out, "(round {}: score {} - {})\n", round.index, round.score, verdict);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_llm::ScriptedProvider;
    use duel_sim::{Simulation, SimulationConfig};

    fn provider() -> ScriptedProvider {
        ScriptedProvider::from_fn(|prompt, _| {
            Ok(if prompt.starts_with("Ask") {
                "What is regularization?".to_string()
            } else if prompt.starts_with("Answer") {
                "It makes models regular.".to_string()
            } else {
                "Vague but on topic.\nScore: 8".to_string()
            })
        })
    }

    #[tokio::test]
    async fn test_prints_chat_then_results() {
        let provider = provider();
        let mut printer = ConsolePrinter::new(Vec::new(), false);
        let report = Simulation::new(&provider, SimulationConfig::default())
            .run_with("Data Science", &mut printer)
            .await
            .unwrap();
        printer.print_report(&report).unwrap();

        assert_eq!(printer.transcript().messages().len(), 4);
        let text = String::from_utf8(printer.into_inner()).unwrap();
        assert!(text.starts_with("[USER]\nAsk a question about this topic: Data Science\n"));
        assert!(text.contains("=== Round 0 ===\n\n[ASSISTANT]\nWhat is regularization?\n"));
        assert!(text.contains("(round 0: score 8 - pass)"));
        assert!(text.contains("| Iter. | Questions |"));
        assert!(text.contains("Outcome: passed in round 0 with score 8"));
        assert!(text.contains("Usage: 3 calls"));
    }

    #[tokio::test]
    async fn test_quiet_prints_only_results() {
        let provider = provider();
        let mut printer = ConsolePrinter::new(Vec::new(), true);
        let report = Simulation::new(&provider, SimulationConfig::default())
            .run_with("Data Science", &mut printer)
            .await
            .unwrap();
        printer.print_report(&report).unwrap();

        assert_eq!(printer.transcript().messages().len(), 4);
        let text = String::from_utf8(printer.into_inner()).unwrap();
        assert!(text.starts_with("--- Results ---"));
        assert!(!text.contains("[USER]"));
    }
}
