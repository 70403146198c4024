use duel_error::ErrorKind;
use duel_llm::{ScriptedProvider, ScriptedReply};
use duel_sim::{
    run_simulation, AgentRole, Outcome, Round, RoundObserver, Simulation, SimulationConfig,
    SimulationReport, Transcript,
};
use std::sync::atomic::{AtomicUsize, Ordering};

const FALLBACK: &str = "Sorry, I couldn't generate a response right now.";

/// Provider that plays all three roles, judging with `verdict(round)`
fn interview(verdict: impl Fn(usize) -> Option<String> + Send + Sync + 'static) -> ScriptedProvider {
    let questions = AtomicUsize::new(0);
    let judged = AtomicUsize::new(0);
    ScriptedProvider::from_fn(move |prompt, _| {
        if prompt.starts_with("Ask") {
            let n = questions.fetch_add(1, Ordering::SeqCst);
            Ok(format!("Question {}?", n))
        } else if prompt.starts_with("Answer the question:") {
            Ok("Umm, it depends.".to_string())
        } else if prompt.starts_with("The question is:") {
            let n = judged.fetch_add(1, Ordering::SeqCst);
            verdict(n).ok_or_else(|| duel_llm::Error::inference_failed("judge down"))
        } else {
            Err(duel_llm::Error::unexpected(format!("unexpected prompt: {}", prompt)))
        }
    })
}

fn scores(scores: &'static [u8]) -> impl Fn(usize) -> Option<String> + Send + Sync {
    move |n| Some(format!("Feedback for round {}.\nScore: {}", n, scores[n.min(scores.len() - 1)]))
}

fn assert_contiguous(rounds: &[Round]) {
    for (i, round) in rounds.iter().enumerate() {
        assert_eq!(round.index as usize, i);
    }
}

async fn run(provider: &ScriptedProvider, config: SimulationConfig) -> SimulationReport {
    Simulation::new(provider, config).run("Data Science").await.unwrap()
}

#[tokio::test]
async fn stops_on_the_round_that_reaches_the_threshold() {
    let provider = interview(scores(&[4, 6, 8, 10]));
    let (rounds, terminated_early) = run_simulation(&provider, "Data Science", 6, 8).await.unwrap();

    assert_eq!(rounds.len(), 3);
    assert_contiguous(&rounds);
    assert!(terminated_early);
    assert_eq!(rounds[2].score, 8);
    assert!(rounds[2].passed);
    assert!(rounds[..2].iter().all(|r| !r.passed));
    assert_eq!(provider.calls(), 9);
}

#[tokio::test]
async fn runs_exactly_max_rounds_without_a_pass() {
    let provider = interview(scores(&[3]));
    let report = run(&provider, SimulationConfig::default()).await;

    assert_eq!(report.rounds.len(), 6);
    assert_contiguous(&report.rounds);
    assert!(!report.terminated_early());
    assert_eq!(report.outcome, Outcome::MaxRoundsReached { rounds: 6 });
}

#[tokio::test]
async fn round_count_stays_within_bounds() {
    for max_rounds in 1..=5u32 {
        for pass_at in 0..6usize {
            let provider = interview(move |n| {
                let score = if n == pass_at { 9 } else { 2 };
                Some(format!("Score: {}", score))
            });
            let config = SimulationConfig::default().with_max_rounds(max_rounds);
            let report = run(&provider, config).await;

            let len = report.rounds.len();
            assert!(len >= 1 && len <= max_rounds as usize);
            assert_contiguous(&report.rounds);

            if pass_at < max_rounds as usize {
                assert_eq!(len, pass_at + 1);
                assert!(report.terminated_early());
                assert!(report.rounds.last().unwrap().passed);
            } else {
                assert_eq!(len, max_rounds as usize);
                assert!(!report.terminated_early());
            }
        }
    }
}

#[tokio::test]
async fn unscored_judgement_gets_default_and_never_passes() {
    let provider = interview(|_| Some("That was an 18-minute answer, rated 8 by nobody.".to_string()));
    let report = run(&provider, SimulationConfig::default().with_max_rounds(3)).await;

    assert_eq!(report.rounds.len(), 3);
    for round in &report.rounds {
        assert_eq!(round.score, 5);
        assert!(!round.score_parsed);
        assert!(!round.passed);
    }
}

#[tokio::test]
async fn low_thresholds_are_accepted_and_unscored_rounds_still_fail() {
    for threshold in [1u8, 5] {
        let provider = interview(|_| Some("Decent effort, keep practising.".to_string()));
        let config = SimulationConfig::default()
            .with_max_rounds(3)
            .with_pass_threshold(threshold);
        let report = run(&provider, config).await;

        assert_eq!(report.rounds.len(), 3);
        assert!(!report.terminated_early());
        assert!(report.rounds.iter().all(|r| r.score == 5 && !r.passed));
    }
}

#[tokio::test]
async fn failed_calls_become_fallback_text() {
    let provider = ScriptedProvider::new(vec![
        ScriptedReply::Fail(ErrorKind::NetworkFailed),
        ScriptedReply::text("I would use a hash map."),
        ScriptedReply::text("Decent. Score: 6"),
        ScriptedReply::text("What is a B-tree?"),
        ScriptedReply::Fail(ErrorKind::RateLimited),
        ScriptedReply::Fail(ErrorKind::AuthenticationFailed),
    ]);
    let report = run(&provider, SimulationConfig::default().with_max_rounds(2)).await;

    assert_eq!(report.rounds.len(), 2);

    let first = &report.rounds[0];
    assert_eq!(first.question, FALLBACK);
    assert_eq!(first.fallbacks, vec![AgentRole::Interviewer]);
    assert_eq!(first.score, 6);

    let second = &report.rounds[1];
    assert_eq!(second.question, "What is a B-tree?");
    assert_eq!(second.answer, FALLBACK);
    assert_eq!(second.feedback, FALLBACK);
    assert_eq!(second.fallbacks, vec![AgentRole::Interviewee, AgentRole::Judge]);
    assert_eq!(second.score, 5);
    assert!(!second.score_parsed);
}

#[tokio::test]
async fn answers_are_coached_from_the_configured_round() {
    let provider = interview(scores(&[2, 3, 4, 5]));
    run(&provider, SimulationConfig::default().with_max_rounds(4)).await;

    let answer_prompts: Vec<String> = provider
        .prompts()
        .into_iter()
        .filter(|p| p.starts_with("Answer the question:"))
        .collect();
    assert_eq!(answer_prompts.len(), 4);

    assert!(!answer_prompts[0].contains("judge comments"));
    assert!(!answer_prompts[1].contains("judge comments"));
    assert!(answer_prompts[2].contains("judge comments: Feedback for round 1.\nScore: 3"));
    assert!(answer_prompts[3].contains("judge comments: Feedback for round 2.\nScore: 4"));
}

#[tokio::test]
async fn coaching_can_start_immediately() {
    let provider = interview(scores(&[2, 3]));
    run(
        &provider,
        SimulationConfig::default().with_max_rounds(2).with_coaching_starts_at(0),
    )
    .await;

    let answer_prompts: Vec<String> = provider
        .prompts()
        .into_iter()
        .filter(|p| p.starts_with("Answer the question:"))
        .collect();
    // Round 0 has no previous feedback to learn from
    assert!(!answer_prompts[0].contains("judge comments"));
    assert!(answer_prompts[1].contains("judge comments: Feedback for round 0."));
}

#[tokio::test]
async fn follow_up_questions_list_earlier_ones() {
    let provider = interview(scores(&[1]));
    run(&provider, SimulationConfig::default().with_max_rounds(3)).await;

    let question_prompts: Vec<String> = provider
        .prompts()
        .into_iter()
        .filter(|p| p.starts_with("Ask"))
        .collect();
    assert_eq!(question_prompts[0], "Ask a question about this topic: Data Science");
    assert!(question_prompts[1].contains("- Question 0?"));
    assert!(question_prompts[2].contains("- Question 0?\n- Question 1?"));
}

#[tokio::test]
async fn streaming_provider_behaves_the_same() {
    let provider = ScriptedProvider::from_fn(|prompt, _| {
        Ok(if prompt.starts_with("The question is:") {
            "Clear and correct. Score: 9".to_string()
        } else {
            "Some words from the model".to_string()
        })
    })
    .streaming();
    let report = run(&provider, SimulationConfig::default()).await;

    assert_eq!(report.rounds.len(), 1);
    assert_eq!(report.rounds[0].question, "Some words from the model");
    assert_eq!(report.rounds[0].feedback, "Clear and correct. Score: 9");
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl RoundObserver for Recorder {
    fn on_opening(&mut self, _prompt: &str) {
        self.events.push("opening".into());
    }
    fn on_question(&mut self, index: u32, _question: &str) {
        self.events.push(format!("question {}", index));
    }
    fn on_answer(&mut self, index: u32, _answer: &str) {
        self.events.push(format!("answer {}", index));
    }
    fn on_judgement(&mut self, index: u32, _feedback: &str, score: u8) {
        self.events.push(format!("judgement {} {}", index, score));
    }
    fn on_round(&mut self, round: &Round) {
        self.events.push(format!("round {}", round.index));
    }
}

#[tokio::test]
async fn observer_sees_every_step_in_order() {
    let provider = interview(scores(&[4, 9]));
    let mut recorder = Recorder::default();
    Simulation::new(&provider, SimulationConfig::default())
        .run_with("Data Science", &mut recorder)
        .await
        .unwrap();

    assert_eq!(
        recorder.events,
        vec![
            "opening",
            "question 0",
            "answer 0",
            "judgement 0 4",
            "round 0",
            "question 1",
            "answer 1",
            "judgement 1 9",
            "round 1",
        ]
    );
}

#[tokio::test]
async fn transcript_collects_the_chat() {
    let provider = interview(scores(&[9]));
    let mut transcript = Transcript::new();
    Simulation::new(&provider, SimulationConfig::default())
        .run_with("Data Science", &mut transcript)
        .await
        .unwrap();

    let contents: Vec<&str> = transcript.messages().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(
        contents,
        vec![
            "Ask a question about this topic: Data Science",
            "Question 0?",
            "Umm, it depends.",
            "Feedback for round 0.\nScore: 9",
        ]
    );
}

#[tokio::test]
async fn report_is_written_as_json() {
    let provider = interview(scores(&[3, 8]));
    let report = run(&provider, SimulationConfig::default()).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    report.write_json(&path).unwrap();

    let loaded: SimulationReport =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded.topic, "Data Science");
    assert_eq!(loaded.rounds, report.rounds);
    assert_eq!(loaded.outcome, Outcome::Passed { round: 1, score: 8 });
}

#[tokio::test]
async fn writing_to_a_missing_directory_fails_with_context() {
    let provider = interview(scores(&[9]));
    let report = run(&provider, SimulationConfig::default()).await;

    let dir = tempfile::tempdir().unwrap();
    let err = report.write_json(dir.path().join("nope").join("report.json")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileNotFound);
    assert_eq!(err.operation(), "report::write_json");
}
