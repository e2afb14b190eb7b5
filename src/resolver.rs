use crate::models::JudgmentTuple;
use crate::samples::SampleSet;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashMap;

/// Seeded, reproducible permutation of the reference prompts.
///
/// Keys are sorted before shuffling so the permutation depends only on the
/// seed and the key set, not on map iteration order.
pub fn evaluation_order(truth: &HashMap<String, String>, seed: u64) -> Vec<String> {
    let mut keys: Vec<String> = truth.keys().cloned().collect();
    keys.sort();

    let mut rng = StdRng::seed_from_u64(seed);
    keys.shuffle(&mut rng);
    keys
}

/// Yields one judgment tuple per (prompt, model) pair covered by both the
/// reference mapping and that model's samples, in prompt order.
///
/// A model without a response for the current prompt is skipped, not an
/// error: sparse candidate coverage must never abort the evaluation.
pub struct PairResolver<'a> {
    order: &'a [String],
    truth: &'a HashMap<String, String>,
    sampled: &'a SampleSet,
    models: Vec<&'a str>,
    prompt_idx: usize,
    model_idx: usize,
}

impl<'a> PairResolver<'a> {
    pub fn new(order: &'a [String], truth: &'a HashMap<String, String>, sampled: &'a SampleSet) -> Self {
        let mut models: Vec<&str> = sampled.keys().map(String::as_str).collect();
        models.sort();

        Self {
            order,
            truth,
            sampled,
            models,
            prompt_idx: 0,
            model_idx: 0,
        }
    }
}

impl Iterator for PairResolver<'_> {
    type Item = JudgmentTuple;

    fn next(&mut self) -> Option<JudgmentTuple> {
        loop {
            if self.prompt_idx >= self.order.len() {
                return None;
            }
            if self.model_idx >= self.models.len() {
                self.prompt_idx += 1;
                self.model_idx = 0;
                continue;
            }

            let prompt = &self.order[self.prompt_idx];
            let model = self.models[self.model_idx];
            self.model_idx += 1;

            let Some(reference) = self.truth.get(prompt) else {
                // stray key in the supplied order, nothing to pair against
                self.model_idx = self.models.len();
                continue;
            };
            if let Some(candidate) = self.sampled.get(model).and_then(|m| m.get(prompt)) {
                return Some(JudgmentTuple {
                    candidate: candidate.clone(),
                    reference: reference.clone(),
                    prompt: prompt.clone(),
                    model: model.to_string(),
                });
            }
        }
    }
}
