use crate::datasets::ASSISTANT_MARKER;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Per-model candidate responses keyed by prompt
pub type SampleSet = HashMap<String, HashMap<String, String>>;

/// Load sampled completions from a directory of JSON files.
///
/// Each `*.json` file holds one model's samples as a prompt -> list-of-outputs
/// mapping; the model is named by the file stem and only the first output per
/// prompt is kept, truncated to the text after its last assistant marker.
pub fn load_samples(sample_dir: &Path, to_process: Option<&[String]>) -> Result<SampleSet> {
    let files: Vec<String> = match to_process {
        Some(names) => names.to_vec(),
        None => list_dir(sample_dir)?,
    };

    let mut sampled: SampleSet = HashMap::new();
    let mut loaded = 0;
    for file in &files {
        let Some(model) = file.strip_suffix(".json") else {
            continue;
        };

        let path = sample_dir.join(file);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read sample file: {}", path.display()))?;
        let outputs: HashMap<String, Vec<String>> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse sample file: {}", path.display()))?;

        let entry = sampled.entry(model.to_string()).or_default();
        for (prompt, completions) in outputs {
            let Some(first) = completions.into_iter().next() else {
                warn!(model, "prompt with no completions, skipping");
                continue;
            };
            entry.insert(prompt, strip_to_response(&first));
        }
        loaded += 1;
    }

    info!(models = loaded, "loaded sampled completions");
    Ok(sampled)
}

/// Keep only the text after the last assistant marker; completions without
/// the marker are used as-is.
fn strip_to_response(completion: &str) -> String {
    match completion.rfind(ASSISTANT_MARKER) {
        Some(start) => completion[start + ASSISTANT_MARKER.len()..]
            .trim_start()
            .to_string(),
        None => completion.to_string(),
    }
}

fn list_dir(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read sample directory: {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list: {}", dir.display()))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
