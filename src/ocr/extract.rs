use std::sync::LazyLock;

use regex::Regex;

use super::filter::FilteredText;
use crate::scores::ScoreMap;

/// Pattern to match a subject followed by a score:
/// - Subject: one ASCII word token (letters, digits, underscore)
/// - Score: 1 to 3 digits
///
/// Unanchored; the first match on a line is used.
const SUBJECT_SCORE_PATTERN: &str = r"([A-Za-z0-9_]+)\s+([0-9]{1,3})";

static SUBJECT_SCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SUBJECT_SCORE_PATTERN).expect("valid subject/score regex"));

/// Extracts `(subject, score)` from one line, if it has that shape.
pub fn parse_line(line: &str) -> Option<(&str, u32)> {
    let caps = SUBJECT_SCORE.captures(line)?;
    let subject = caps.get(1)?.as_str();
    // At most three ASCII digits, always fits
    let score = caps.get(2)?.as_str().parse::<u32>().ok()?;
    Some((subject, score))
}

/// Builds a score map from filtered lines. Later lines for the same subject
/// overwrite earlier ones; lines without a match are skipped.
pub fn parse(text: &FilteredText) -> ScoreMap {
    parse_lines(text.lines.iter().map(String::as_str))
}

/// Same as [`parse`], over a newline-joined snapshot.
pub fn parse_text(text: &str) -> ScoreMap {
    parse_lines(text.lines())
}

fn parse_lines<'a>(lines: impl Iterator<Item = &'a str>) -> ScoreMap {
    let mut scores = ScoreMap::new();

    for line in lines {
        match parse_line(line) {
            Some((subject, score)) => {
                if let Some(previous) = scores.insert(subject, score) {
                    log::debug!(
                        "Subject {} seen again: {} replaces {}",
                        subject,
                        score,
                        previous
                    );
                }
            }
            None => log::debug!("No subject/score in line: {:?}", line),
        }
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filtered(lines: &[&str]) -> FilteredText {
        FilteredText {
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_basic() {
        let scores = parse(&filtered(&["Math 85", "Chemistry 78", "Overall CGPA: 8.1"]));
        let entries: Vec<_> = scores.iter().collect();
        assert_eq!(entries, vec![("Math", 85), ("Chemistry", 78)]);
    }

    #[test]
    fn test_parse_recovers_unique_subjects() {
        let expected: ScoreMap = [("English", 7), ("History", 42), ("Biology", 100), ("PE", 0)]
            .into_iter()
            .collect();
        let lines: Vec<String> = expected
            .iter()
            .map(|(subject, score)| format!("{} {}", subject, score))
            .collect();

        let scores = parse(&FilteredText { lines });
        assert_eq!(scores, expected);
    }

    #[test]
    fn test_last_duplicate_wins() {
        let scores = parse(&filtered(&["Math 70", "Physics 60", "Math 85"]));
        assert_eq!(scores.get("Math"), Some(85));
        assert_eq!(scores.len(), 2);
    }

    #[test]
    fn test_header_and_noise_skipped() {
        let scores = parse(&filtered(&["Subject Marks Grade", "| ~ |", "Results"]));
        assert!(scores.is_empty());
    }

    #[test]
    fn test_unanchored_first_match() {
        // Match may start mid-line; only the first pair counts
        assert_eq!(parse_line("1. Physics 78 A+"), Some(("Physics", 78)));
        assert_eq!(parse_line("Sem 2 Math 90"), Some(("Sem", 2)));
        assert_eq!(parse_line("Computer Science 91"), Some(("Science", 91)));
    }

    #[test]
    fn test_long_numbers_truncated_to_three_digits() {
        // No range validation: the first three digits are taken as-is
        assert_eq!(parse_line("Math 1234"), Some(("Math", 123)));
        assert_eq!(parse_line("GPA 100"), Some(("GPA", 100)));
    }

    #[test]
    fn test_decimal_gpa_not_parsed_after_colon() {
        assert_eq!(parse_line("Overall CGPA: 8.1"), None);
        // Without the colon the integer part is taken
        assert_eq!(parse_line("GPA 3.9"), Some(("GPA", 3)));
    }

    #[test]
    fn test_parse_text_snapshot() {
        let scores = parse_text("Math 85\nChemistry 78\n");
        assert_eq!(scores.get("Math"), Some(85));
        assert_eq!(scores.get("Chemistry"), Some(78));
    }
}
