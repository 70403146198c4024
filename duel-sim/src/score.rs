//! Reading the judge's score out of free text

use regex::Regex;
use std::sync::LazyLock;

/// `Score: 9`, `**Rating:** 7/10`, `score = 8.5`, case-insensitive
static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:score|rating)\s*\**\s*[:=]\s*\**\s*(\d{1,3})(?:\.\d+)?").expect("valid regex")
});

/// Score given by a judge reply, if it carries one.
///
/// Only a number following a `Score:` / `Rating:` label counts; a bare
/// digit anywhere in the text does not. When the label appears more than
/// once the last value in `1..=10` wins, since the verdict line comes last.
pub fn parse_score(text: &str) -> Option<u8> {
    SCORE_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u8>().ok())
        .filter(|score| (1..=10).contains(score))
        .last()
}

/// `parse_score`, falling back to `default` for unscored replies
pub fn score_or_default(text: &str, default: u8) -> u8 {
    parse_score(text).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_marker() {
        assert_eq!(parse_score("Feedback: ok Score: 9"), Some(9));
        assert_eq!(parse_score("score:10"), Some(10));
        assert_eq!(parse_score("SCORE = 3"), Some(3));
    }

    #[test]
    fn test_markdown_and_fractions() {
        assert_eq!(parse_score("**Score:** 7/10"), Some(7));
        assert_eq!(parse_score("Rating: **8** out of 10"), Some(8));
        assert_eq!(parse_score("Score: 8.5"), Some(8));
    }

    #[test]
    fn test_missing_marker_uses_default() {
        assert_eq!(parse_score("Good answer, 8 out of 10 would hire."), None);
        assert_eq!(score_or_default("Good answer, 8 out of 10 would hire.", 5), 5);
        assert_eq!(score_or_default("That was an 18-minute answer", 5), 5);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        assert_eq!(parse_score("Score: 0"), None);
        assert_eq!(parse_score("Score: 85"), None);
        assert_eq!(parse_score("Score: 85\nCorrected score: 6"), Some(6));
    }

    #[test]
    fn test_last_marker_wins() {
        let text = "Initial score: 4 for clarity.\n...\nFinal Score: 7";
        assert_eq!(parse_score(text), Some(7));
    }

    #[test]
    fn test_label_must_be_a_word() {
        assert_eq!(parse_score("underscore: 9"), None);
        assert_eq!(parse_score("Scores: 9"), None);
    }
}
