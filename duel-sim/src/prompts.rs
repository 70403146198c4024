//! Prompts for the three agents

/// Interviewer prompt.
///
/// The first round asks for any question on the topic; later rounds list
/// the questions already asked so the interviewer moves on.
pub fn question_prompt(topic: &str, previous_questions: &[&str]) -> String {
    if previous_questions.is_empty() {
        return format!("Ask a question about this topic: {}", topic);
    }

    let asked: Vec<String> = previous_questions
        .iter()
        .map(|q| format!("- {}", one_line(q)))
        .collect();
    format!(
        "Ask another interview question about this topic: {}\n\
         Do not repeat any of the questions already asked:\n{}",
        topic,
        asked.join("\n")
    )
}

/// Interviewee prompt.
///
/// Without feedback the interviewee is simply inexperienced; with feedback
/// it is told to learn from the judge's comments on its previous answer.
pub fn answer_prompt(question: &str, feedback: Option<&str>) -> String {
    match feedback {
        None => format!(
            "Answer the question: {} in a mediocre way because you are an inexperienced interviewee.",
            question
        ),
        Some(feedback) => format!(
            "Answer the question: {} in a mediocre way because you are an inexperienced \
             interviewee but you really want to learn, so you learn from the judge comments: {}",
            question, feedback
        ),
    }
}

/// Judge prompt; asks for a closing `Score: N` line the parser can read
pub fn judge_prompt(question: &str, answer: &str) -> String {
    format!(
        "The question is: {}\nThe answer is: {}\n\
         Provide feedback and rate the answer from 1 to 10 while 10 being the best and 1 is the worst.\n\
         End your reply with a final line of the form \"Score: N\".",
        question, answer
    )
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
