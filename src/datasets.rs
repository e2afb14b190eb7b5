use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Marker separating the prompt from the assistant turn in transcripts
pub const ASSISTANT_MARKER: &str = "Assistant:";

/// Load the reference mapping for a named dataset from a local JSONL file
pub fn load_reference(dataset: &str, path: &Path) -> Result<HashMap<String, String>> {
    match dataset {
        "hh" => load_hh(path),
        "shp" => load_shp(path),
        other => bail!("unknown dataset: {other} (expected \"hh\" or \"shp\")"),
    }
}

#[derive(Debug, Deserialize)]
struct HhRecord {
    chosen: String,
}

/// HH test split: the prompt is the transcript up to and including the final
/// assistant marker, the reference response is everything after it.
fn load_hh(path: &Path) -> Result<HashMap<String, String>> {
    let mut reformatted = HashMap::new();

    for (line_no, line) in read_jsonl(path)? {
        let record: HhRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{line_no}: malformed record", path.display()))?;

        let Some(start) = record.chosen.rfind(ASSISTANT_MARKER) else {
            warn!(line = line_no, "record without assistant marker, skipping");
            continue;
        };
        let split = start + ASSISTANT_MARKER.len();
        let prompt = record.chosen[..split].to_string();
        let response = record.chosen[split..].trim_start().to_string();
        reformatted.insert(prompt, response);
    }

    info!(examples = reformatted.len(), "loaded hh reference data");
    Ok(reformatted)
}

#[derive(Debug, Deserialize)]
struct ShpRecord {
    history: String,
    labels: i64,
    #[serde(rename = "human_ref_A")]
    human_ref_a: String,
    #[serde(rename = "human_ref_B")]
    human_ref_b: String,
}

/// SHP test split: the preferred human reference (by label) becomes the
/// response under a transcript-shaped prompt.
fn load_shp(path: &Path) -> Result<HashMap<String, String>> {
    let mut reformatted = HashMap::new();

    for (line_no, line) in read_jsonl(path)? {
        let record: ShpRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{line_no}: malformed record", path.display()))?;

        let prompt = format!("\n\nHuman: {}\n\nAssistant:", record.history);
        let response = if record.labels == 0 {
            record.human_ref_a
        } else {
            record.human_ref_b
        };
        reformatted.insert(prompt, response);
    }

    info!(examples = reformatted.len(), "loaded shp reference data");
    Ok(reformatted)
}

/// Read non-empty lines of a JSONL file with 1-based line numbers
fn read_jsonl(path: &Path) -> Result<Vec<(usize, String)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset file: {}", path.display()))?;

    Ok(content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, line.to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_hh_splits_at_last_marker() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hh.jsonl");
        fs::write(
            &path,
            r#"{"chosen": "\n\nHuman: Hi\n\nAssistant: Hello\n\nHuman: Bye\n\nAssistant: Goodbye"}"#,
        )
        .unwrap();

        let truth = load_reference("hh", &path).unwrap();
        assert_eq!(truth.len(), 1);
        let (prompt, response) = truth.iter().next().unwrap();
        assert!(prompt.ends_with("Assistant:"));
        assert!(prompt.contains("Human: Bye"));
        assert_eq!(response, "Goodbye");
    }

    #[test]
    fn test_load_hh_skips_record_without_marker() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hh.jsonl");
        fs::write(
            &path,
            "{\"chosen\": \"no marker here\"}\n{\"chosen\": \"\\n\\nHuman: Q\\n\\nAssistant: A\"}\n",
        )
        .unwrap();

        let truth = load_reference("hh", &path).unwrap();
        assert_eq!(truth.len(), 1);
    }

    #[test]
    fn test_load_shp_label_selection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shp.jsonl");
        fs::write(
            &path,
            concat!(
                r#"{"history": "first question", "labels": 0, "human_ref_A": "answer A", "human_ref_B": "answer B"}"#,
                "\n",
                r#"{"history": "second question", "labels": 1, "human_ref_A": "answer A2", "human_ref_B": "answer B2"}"#,
            ),
        )
        .unwrap();

        let truth = load_reference("shp", &path).unwrap();
        assert_eq!(truth.len(), 2);
        assert_eq!(
            truth["\n\nHuman: first question\n\nAssistant:"],
            "answer A"
        );
        assert_eq!(
            truth["\n\nHuman: second question\n\nAssistant:"],
            "answer B2"
        );
    }

    #[test]
    fn test_unknown_dataset_rejected() {
        let result = load_reference("webgpt", Path::new("unused.jsonl"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unknown dataset"));
    }

    #[test]
    fn test_malformed_record_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hh.jsonl");
        fs::write(&path, "not json\n").unwrap();

        let result = load_reference("hh", &path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("malformed record"));
    }

    #[test]
    fn test_blank_lines_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hh.jsonl");
        fs::write(
            &path,
            "\n{\"chosen\": \"\\n\\nHuman: Q\\n\\nAssistant: A\"}\n\n",
        )
        .unwrap();

        let truth = load_reference("hh", &path).unwrap();
        assert_eq!(truth.len(), 1);
    }
}
