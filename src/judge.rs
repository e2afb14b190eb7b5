use anyhow::{Context, Result};
use async_openai::{Client, config::OpenAIConfig, types::CreateChatCompletionRequestArgs};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Identity of one judgment request, echoed back with its verdict so routing
/// never depends on the service preserving request order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestOrigin {
    /// Candidate response text
    pub candidate: String,
    /// Reference response text
    pub reference: String,
    /// Prompt both responses answer
    pub prompt: String,
    /// Candidate model name
    pub model: String,
}

/// One structured judgment request for the arbiter
#[derive(Debug, Clone)]
pub struct JudgeRequest {
    /// Fixed system instruction
    pub system: String,
    /// Rendered criterion template
    pub user: String,
    /// Arbiter model id
    pub model: String,
    /// Seed forwarded to the arbiter
    pub seed: u64,
    /// Identity echoed back with the verdict
    pub origin: RequestOrigin,
}

/// A resolved verdict for one request
#[derive(Debug, Clone)]
pub struct JudgeVerdict {
    /// Identity of the originating request
    pub origin: RequestOrigin,
    /// Whether the candidate won over the reference
    pub win: bool,
}

/// The external judge submission seam.
///
/// A submission may resolve fewer verdicts than it was given requests:
/// entries the service cannot settle are pending and simply absent from the
/// returned list. A transport or protocol failure is an error.
pub trait JudgeService {
    fn submit(
        &self,
        requests: Vec<JudgeRequest>,
        cache: &str,
    ) -> impl Future<Output = Result<Vec<JudgeVerdict>>> + Send;
}

/// Judge service backed by an OpenAI-compatible chat-completions endpoint,
/// with a digest-keyed verdict cache shared across runs.
pub struct OpenAiJudge {
    api_key: String,
    api_base: Option<String>,
}

impl OpenAiJudge {
    /// Resolve the arbiter credential from the environment.
    ///
    /// `OPENAI_API_KEY` by default; with `lab_key` set, `LAB_OPENAI_API_KEY`
    /// falling back to the primary key when unset.
    pub fn from_env(lab_key: bool) -> Result<Self> {
        let primary = std::env::var("OPENAI_API_KEY");
        let api_key = if lab_key {
            match std::env::var("LAB_OPENAI_API_KEY") {
                Ok(key) => Ok(key),
                Err(_) => primary,
            }
        } else {
            primary
        }
        .context("no arbiter credential: set OPENAI_API_KEY (or LAB_OPENAI_API_KEY with lab_key)")?;

        Ok(Self {
            api_key,
            api_base: None,
        })
    }

    /// Point the client at a non-default endpoint
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    fn client(&self) -> Client<OpenAIConfig> {
        let mut config = OpenAIConfig::new().with_api_key(self.api_key.clone());
        if let Some(base) = &self.api_base {
            config = config.with_api_base(base.clone());
        }
        Client::with_config(config)
    }
}

impl JudgeService for OpenAiJudge {
    async fn submit(&self, requests: Vec<JudgeRequest>, cache: &str) -> Result<Vec<JudgeVerdict>> {
        let cache_path = Path::new(cache).to_path_buf();
        let mut cached = load_cache(&cache_path);

        let mut verdicts = Vec::new();
        let mut tasks = JoinSet::new();
        for request in requests {
            let digest = request_digest(&request);
            if let Some(&win) = cached.get(&digest) {
                verdicts.push(JudgeVerdict {
                    origin: request.origin,
                    win,
                });
                continue;
            }

            let client = self.client();
            tasks.spawn(async move {
                let outcome = complete_one(&client, &request).await?;
                Ok::<_, anyhow::Error>((digest, request.origin, outcome))
            });
        }

        let mut resolved_new = false;
        while let Some(joined) = tasks.join_next().await {
            let (digest, origin, outcome) = joined.context("judgment task panicked")??;
            match outcome {
                Some(win) => {
                    cached.insert(digest, win);
                    resolved_new = true;
                    verdicts.push(JudgeVerdict { origin, win });
                }
                // unparseable reply: leave the request pending for a later run
                None => warn!(model = %origin.model, "arbiter verdict unparseable, left pending"),
            }
        }

        if resolved_new {
            store_cache(&cache_path, &cached);
        }
        Ok(verdicts)
    }
}

/// Issue one chat completion and parse its verdict
async fn complete_one(
    client: &Client<OpenAIConfig>,
    request: &JudgeRequest,
) -> Result<Option<bool>> {
    let system_message = async_openai::types::ChatCompletionRequestSystemMessageArgs::default()
        .content(request.system.clone())
        .build()
        .context("Failed to build system message")?
        .into();

    let user_message = async_openai::types::ChatCompletionRequestUserMessageArgs::default()
        .content(request.user.clone())
        .build()
        .context("Failed to build user message")?
        .into();

    let completion_request = CreateChatCompletionRequestArgs::default()
        .model(&request.model)
        .messages([system_message, user_message])
        .temperature(0.0)
        .seed(request.seed as i64)
        .build()
        .context("Failed to build judgment request")?;

    let response = client
        .chat()
        .create(completion_request)
        .await
        .context("arbiter call failed")?;

    let content = match response.choices.first() {
        Some(choice) => match &choice.message.content {
            Some(content) => content.clone(),
            None => String::new(),
        },
        None => String::new(),
    };

    Ok(parse_verdict(&content))
}

/// The arbiter is instructed to answer with a single digit: 1 when the
/// candidate wins, 0 when the reference does. Anything else is unparseable.
fn parse_verdict(content: &str) -> Option<bool> {
    match content.trim().chars().next() {
        Some('1') => Some(true),
        Some('0') => Some(false),
        _ => None,
    }
}

fn request_digest(request: &JudgeRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.model.as_bytes());
    hasher.update([0]);
    hasher.update(request.seed.to_le_bytes());
    hasher.update([0]);
    hasher.update(request.system.as_bytes());
    hasher.update([0]);
    hasher.update(request.user.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn load_cache(path: &Path) -> HashMap<String, bool> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };
    match serde_json::from_str(&content) {
        Ok(cache) => cache,
        Err(err) => {
            warn!(file = %path.display(), error = %err, "unreadable verdict cache, starting empty");
            HashMap::new()
        }
    }
}

fn store_cache(path: &Path, cache: &HashMap<String, bool>) {
    let serialized = match serde_json::to_string(cache) {
        Ok(serialized) => serialized,
        Err(err) => {
            warn!(error = %err, "could not serialize verdict cache");
            return;
        }
    };
    if let Err(err) = std::fs::write(path, serialized) {
        warn!(file = %path.display(), error = %err, "could not write verdict cache");
    } else {
        debug!(file = %path.display(), entries = cache.len(), "verdict cache written");
    }
}
