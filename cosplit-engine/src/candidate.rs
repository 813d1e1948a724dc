//! Split candidates produced by engines

use serde::{Deserialize, Serialize};

/// One proposed segmentation of a word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The parts, in order
    pub parts: Vec<String>,
    /// Engine confidence; higher is better
    pub score: f64,
}

impl Candidate {
    /// Create a candidate
    pub fn new<I, S>(parts: I, score: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
            score,
        }
    }

    /// The word left whole
    pub fn unsplit(word: &str) -> Self {
        Self::new([word], 1.0)
    }

    /// Parts joined with `marker`
    pub fn joined(&self, marker: char) -> String {
        let mut buf = [0u8; 4];
        self.parts.join(marker.encode_utf8(&mut buf))
    }
}

/// All candidates an engine returned for one word
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitResult {
    /// Candidates; order carries no meaning
    pub candidates: Vec<Candidate>,
}

impl SplitResult {
    /// Wrap a candidate list
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    /// A single unsplit candidate
    pub fn unsplit(word: &str) -> Self {
        Self::new(vec![Candidate::unsplit(word)])
    }

    /// Whether the engine proposed nothing
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Highest-scoring candidate
    ///
    /// Among equal scores the last one seen wins.
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates
            .iter()
            .fold(None::<&Candidate>, |best, candidate| match best {
                Some(current) if candidate.score >= current.score => Some(candidate),
                Some(current) => Some(current),
                None => Some(candidate),
            })
    }

    /// The best candidate joined with `marker`, or `word` itself when
    /// there are no candidates
    pub fn best_joined(&self, word: &str, marker: char) -> String {
        self.best()
            .map(|candidate| candidate.joined(marker))
            .unwrap_or_else(|| word.to_string())
    }
}
