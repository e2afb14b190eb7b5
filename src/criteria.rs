use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// An evaluation axis, carrying the arbiter prompt template it is judged with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    /// Helpfulness of the candidate relative to the reference
    Quality { template: String },
    /// Conciseness of the candidate relative to the reference
    Brevity { template: String },
}

impl Criterion {
    /// Store key the criterion's verdicts accumulate under
    pub fn key(&self) -> &'static str {
        match self {
            Criterion::Quality { .. } => "quality",
            Criterion::Brevity { .. } => "brevity",
        }
    }

    /// The raw prompt template
    pub fn template(&self) -> &str {
        match self {
            Criterion::Quality { template } | Criterion::Brevity { template } => template,
        }
    }

    /// Render the template against one judgment tuple
    pub fn render(&self, prompt: &str, candidate: &str, reference: &str) -> String {
        self.template()
            .replace("{prompt}", prompt)
            .replace("{candidate}", candidate)
            .replace("{reference}", reference)
    }
}

/// The fixed system instruction plus both criterion templates
#[derive(Debug, Clone)]
pub struct JudgePrompts {
    /// System instruction shared by every judgment request
    pub system: String,
    /// Quality criterion with its template
    pub quality: Criterion,
    /// Brevity criterion with its template
    pub brevity: Criterion,
}

impl JudgePrompts {
    /// Load system.prompt, quality.prompt and brevity.prompt from a directory
    pub fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            system: load_prompt(dir, "system.prompt")?,
            quality: Criterion::Quality {
                template: load_prompt(dir, "quality.prompt")?,
            },
            brevity: Criterion::Brevity {
                template: load_prompt(dir, "brevity.prompt")?,
            },
        })
    }

    /// The two criteria in dispatch order: quality first, then brevity
    pub fn criteria(&self) -> [&Criterion; 2] {
        [&self.quality, &self.brevity]
    }
}

/// Read a prompt file, trimming each line and re-joining with newlines
fn load_prompt(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;

    debug!(file = %path.display(), "loaded prompt template");
    Ok(content
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n"))
}
