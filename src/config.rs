use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a single win-rate evaluation run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// Arbiter model used to judge candidate vs reference pairs
    #[serde(default = "default_critic_model")]
    pub critic_model: String,
    /// Named reference dataset to load ("hh" or "shp")
    #[serde(default = "default_dataset")]
    pub dataset: String,
    /// Path to the reference dataset file (JSONL)
    pub reference_file: PathBuf,
    /// Directory with per-model sampled completions (one JSON file per model)
    #[serde(default = "default_sample_dir")]
    pub sample_dir: PathBuf,
    /// Optional subset of files in sample_dir to load
    #[serde(default)]
    pub sample_files: Option<Vec<String>>,
    /// Directory containing quality.prompt, brevity.prompt and system.prompt
    #[serde(default = "default_prompt_dir")]
    pub prompt_dir: PathBuf,
    /// Seed for the arbiter and for the prompt-order shuffle
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Cache file shared across runs by the judge service
    #[serde(default = "default_cache_file")]
    pub cache_file: String,
    /// Number of tuples judged per arbiter submission
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Per-model budget on processed tuples; unbounded when absent
    #[serde(default)]
    pub stop: Option<usize>,
    /// Use LAB_OPENAI_API_KEY instead of OPENAI_API_KEY when set
    #[serde(default)]
    pub lab_key: bool,
}

fn default_critic_model() -> String {
    "gpt-4".to_string()
}

fn default_dataset() -> String {
    "hh".to_string()
}

fn default_sample_dir() -> PathBuf {
    PathBuf::from("sampled")
}

fn default_prompt_dir() -> PathBuf {
    PathBuf::from("./")
}

fn default_seed() -> u64 {
    1234
}

fn default_cache_file() -> String {
    ".critic-cache.json".to_string()
}

fn default_batch_size() -> usize {
    60
}

impl RunConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: RunConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot drive a run
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        Ok(())
    }
}
