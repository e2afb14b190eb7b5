use crate::models::{CriterionSummary, ModelResultStore, ResultRow};

/// Longest prefix shared by every name, extended character by character.
///
/// Display normalization only: strips a shared experiment/dataset tag from
/// model names. With a single name the prefix is the whole name; with
/// disjoint names it is empty. Never fails.
pub fn shared_prefix(names: &[&str]) -> String {
    let Some(first) = names.first() else {
        return String::new();
    };

    let mut end = 0;
    for ch in first.chars() {
        let next = end + ch.len_utf8();
        if !names.iter().all(|name| name.starts_with(&first[..next])) {
            break;
        }
        end = next;
    }
    first[..end].to_string()
}

/// Flatten a finalized store into one row per judgment, annotated with
/// whitespace-split word counts. Deterministic: the store iterates models
/// and criteria in sorted order, pairs in append order.
pub fn flatten(store: &ModelResultStore) -> Vec<ResultRow> {
    let models: Vec<&str> = store.models().collect();
    let prefix = shared_prefix(&models);

    let mut rows = Vec::new();
    for (model, criterion, pairs) in store.iter() {
        let display = model.strip_prefix(&prefix).unwrap_or(model);
        for pair in pairs {
            rows.push(ResultRow {
                model: display.to_string(),
                metric: criterion.to_string(),
                candidate: pair.candidate.clone(),
                reference: pair.reference.clone(),
                win: pair.win,
                candidate_words: pair.candidate.split_whitespace().count(),
                reference_words: pair.reference.split_whitespace().count(),
            });
        }
    }
    rows
}

/// Grouped win-rate statistics per (model, criterion), in first-appearance
/// order over the rows.
pub fn summarize(rows: &[ResultRow]) -> Vec<CriterionSummary> {
    let mut groups: Vec<((String, String), Vec<f64>)> = Vec::new();
    for row in rows {
        let win = if row.win { 1.0 } else { 0.0 };
        match groups
            .iter_mut()
            .find(|((model, metric), _)| *model == row.model && *metric == row.metric)
        {
            Some((_, wins)) => wins.push(win),
            None => groups.push(((row.model.clone(), row.metric.clone()), vec![win])),
        }
    }

    groups
        .into_iter()
        .map(|((model, metric), wins)| {
            let count = wins.len();
            let mean = wins.iter().sum::<f64>() / count as f64;
            let variance = wins.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / count as f64;
            let std = variance.sqrt();
            CriterionSummary {
                model,
                metric,
                mean,
                std,
                count,
                ci_90: 1.645 * std / (count as f64).sqrt(),
            }
        })
        .collect()
}
