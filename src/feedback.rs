//! Per-subject feedback comparing a run against the previous one.

use serde::{Serialize, Serializer};

use crate::scores::ScoreMap;

/// How a subject's score moved relative to the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    /// No previous score for this subject
    New { score: u32 },
    Improved { delta: u32 },
    Declined { delta: u32 },
}

/// One human-readable feedback line about a single subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackMessage {
    pub subject: String,
    pub kind: FeedbackKind,
    pub text: String,
}

impl FeedbackMessage {
    fn new(subject: &str, kind: FeedbackKind) -> Self {
        let text = match kind {
            FeedbackKind::New { score } => format!(
                "New score recorded for {}: {}. Keep up the good work!",
                subject, score
            ),
            FeedbackKind::Improved { delta } => format!(
                "Great job on improving your {} score by {} points!",
                subject, delta
            ),
            FeedbackKind::Declined { .. } => format!(
                "It looks like your {} score has decreased. Consider reviewing this subject.",
                subject
            ),
        };
        Self {
            subject: subject.to_string(),
            kind,
            text,
        }
    }
}

// Callers only ever see the text.
impl Serialize for FeedbackMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.text)
    }
}

/// Compares `current` against `previous`, one message per new, improved or
/// declined subject, in `current`'s order. Unchanged subjects and subjects
/// missing from `current` produce nothing.
pub fn synthesize(previous: Option<&ScoreMap>, current: &ScoreMap) -> Vec<FeedbackMessage> {
    current
        .iter()
        .filter_map(|(subject, score)| {
            let kind = match previous.and_then(|p| p.get(subject)) {
                None => FeedbackKind::New { score },
                Some(last) if score > last => FeedbackKind::Improved {
                    delta: score - last,
                },
                Some(last) if score < last => FeedbackKind::Declined {
                    delta: last - score,
                },
                Some(_) => return None,
            };
            Some(FeedbackMessage::new(subject, kind))
        })
        .collect()
}
