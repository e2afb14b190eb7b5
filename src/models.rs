use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One unit of judgment work: a candidate response paired with the reference
/// response for the same prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgmentTuple {
    /// Candidate model's response text
    pub candidate: String,
    /// Reference ("ground truth") response text
    pub reference: String,
    /// Prompt both responses answer
    pub prompt: String,
    /// Name of the candidate model
    pub model: String,
}

/// A judged pair as stored per model and criterion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgedPair {
    /// Candidate response text
    pub candidate: String,
    /// Reference response text
    pub reference: String,
    /// Whether the arbiter preferred the candidate over the reference
    pub win: bool,
}

/// Append-only accumulation of judged pairs, keyed by model then criterion.
///
/// Backed by ordered maps so iteration, and therefore reduction, is
/// deterministic across runs over the same data.
#[derive(Debug, Clone, Default)]
pub struct ModelResultStore {
    inner: BTreeMap<String, BTreeMap<&'static str, Vec<JudgedPair>>>,
}

impl ModelResultStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one judged pair under (model, criterion)
    pub fn append(&mut self, model: &str, criterion: &'static str, pair: JudgedPair) {
        self.inner
            .entry(model.to_string())
            .or_default()
            .entry(criterion)
            .or_default()
            .push(pair);
    }

    /// Model names present in the store, in sorted order
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Iterate (model, criterion, pairs) in deterministic order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &'static str, &[JudgedPair])> {
        self.inner.iter().flat_map(|(model, by_criterion)| {
            by_criterion
                .iter()
                .map(move |(criterion, pairs)| (model.as_str(), *criterion, pairs.as_slice()))
        })
    }

    /// Pairs stored for one (model, criterion), if any
    pub fn pairs(&self, model: &str, criterion: &str) -> Option<&[JudgedPair]> {
        self.inner
            .get(model)
            .and_then(|by_criterion| by_criterion.get(criterion))
            .map(Vec::as_slice)
    }

    /// Total number of judgments across all models and criteria
    pub fn total(&self) -> usize {
        self.iter().map(|(_, _, pairs)| pairs.len()).sum()
    }

    /// True if no judgment has been stored yet
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// One flattened record of the output table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRow {
    /// Model name with the shared prefix stripped
    pub model: String,
    /// Criterion the verdict was issued under
    pub metric: String,
    /// Candidate response text
    pub candidate: String,
    /// Reference response text
    pub reference: String,
    /// Whether the candidate won
    pub win: bool,
    /// Whitespace-split word count of the candidate text
    pub candidate_words: usize,
    /// Whitespace-split word count of the reference text
    pub reference_words: usize,
}

impl ResultRow {
    /// Candidate-to-reference length ratio; 0.0 when the reference has no words
    pub fn length_ratio(&self) -> f64 {
        if self.reference_words == 0 {
            0.0
        } else {
            self.candidate_words as f64 / self.reference_words as f64
        }
    }
}

/// Grouped win-rate statistics for one (model, criterion)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionSummary {
    /// Model name with the shared prefix stripped
    pub model: String,
    /// Criterion the statistics cover
    pub metric: String,
    /// Mean win rate
    pub mean: f64,
    /// Population standard deviation of the win flags
    pub std: f64,
    /// Number of judgments in the group
    pub count: usize,
    /// 90% confidence half-width: 1.645 * std / sqrt(count)
    pub ci_90: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(candidate: &str, win: bool) -> JudgedPair {
        JudgedPair {
            candidate: candidate.to_string(),
            reference: "ref".to_string(),
            win,
        }
    }

    #[test]
    fn test_store_append_and_lookup() {
        let mut store = ModelResultStore::new();
        store.append("m1", "quality", pair("a", true));
        store.append("m1", "quality", pair("b", false));
        store.append("m1", "brevity", pair("a", false));

        assert_eq!(store.pairs("m1", "quality").unwrap().len(), 2);
        assert_eq!(store.pairs("m1", "brevity").unwrap().len(), 1);
        assert!(store.pairs("m1", "unknown").is_none());
        assert!(store.pairs("m2", "quality").is_none());
        assert_eq!(store.total(), 3);
    }

    #[test]
    fn test_store_iteration_is_sorted() {
        let mut store = ModelResultStore::new();
        store.append("zeta", "quality", pair("a", true));
        store.append("alpha", "quality", pair("b", true));

        let models: Vec<&str> = store.models().collect();
        assert_eq!(models, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_store_append_preserves_order() {
        let mut store = ModelResultStore::new();
        store.append("m", "quality", pair("first", true));
        store.append("m", "quality", pair("second", false));

        let pairs = store.pairs("m", "quality").unwrap();
        assert_eq!(pairs[0].candidate, "first");
        assert_eq!(pairs[1].candidate, "second");
    }

    #[test]
    fn test_empty_store() {
        let store = ModelResultStore::new();
        assert!(store.is_empty());
        assert_eq!(store.total(), 0);
        assert_eq!(store.models().count(), 0);
    }

    #[test]
    fn test_length_ratio() {
        let row = ResultRow {
            model: "m".to_string(),
            metric: "quality".to_string(),
            candidate: "one two three".to_string(),
            reference: "one two".to_string(),
            win: true,
            candidate_words: 3,
            reference_words: 2,
        };
        assert!((row.length_ratio() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_length_ratio_empty_reference() {
        let row = ResultRow {
            model: "m".to_string(),
            metric: "quality".to_string(),
            candidate: "text".to_string(),
            reference: "".to_string(),
            win: false,
            candidate_words: 1,
            reference_words: 0,
        };
        assert_eq!(row.length_ratio(), 0.0);
    }
}
