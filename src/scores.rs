//! Subject → score mapping produced by one extraction run.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Insertion-ordered mapping from subject name to score.
///
/// Re-inserting an existing subject replaces its value but keeps its
/// original position, so iteration order is first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreMap {
    entries: Vec<(String, u32)>,
}

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `score` for `subject`, returning the value it replaced.
    pub fn insert(&mut self, subject: impl Into<String>, score: u32) -> Option<u32> {
        let subject = subject.into();
        match self.entries.iter_mut().find(|(s, _)| *s == subject) {
            Some((_, existing)) => Some(std::mem::replace(existing, score)),
            None => {
                self.entries.push((subject, score));
                None
            }
        }
    }

    pub fn get(&self, subject: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(s, _)| s == subject)
            .map(|(_, score)| *score)
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.get(subject).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(subject, score)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(s, score)| (s.as_str(), *score))
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for ScoreMap {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut map = ScoreMap::new();
        for (subject, score) in iter {
            map.insert(subject, score);
        }
        map
    }
}

impl Serialize for ScoreMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (subject, score) in &self.entries {
            map.serialize_entry(subject, score)?;
        }
        map.end()
    }
}

struct ScoreMapVisitor;

impl<'de> Visitor<'de> for ScoreMapVisitor {
    type Value = ScoreMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of subject names to integer scores")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = ScoreMap::new();
        while let Some((subject, score)) = access.next_entry::<String, u32>()? {
            map.insert(subject, score);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for ScoreMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ScoreMapVisitor)
    }
}
