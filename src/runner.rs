use crate::batch::BatchAccumulator;
use crate::config::RunConfig;
use crate::criteria::JudgePrompts;
use crate::dispatch::dispatch;
use crate::judge::JudgeService;
use crate::models::{JudgmentTuple, ModelResultStore};
use crate::resolver::PairResolver;
use crate::samples::SampleSet;
use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use tracing::info;

/// Drives one evaluation run: accumulates resolved pairs into batches,
/// dispatches each batch under both criteria, and stops once the processed
/// budget is exhausted or input runs out.
pub struct Runner<J: JudgeService> {
    config: RunConfig,
    prompts: JudgePrompts,
    service: J,
    store: ModelResultStore,
    processed: usize,
}

impl<J: JudgeService> Runner<J> {
    pub fn new(config: RunConfig, prompts: JudgePrompts, service: J) -> Self {
        Self {
            config,
            prompts,
            service,
            store: ModelResultStore::new(),
            processed: 0,
        }
    }

    /// Judge every resolvable (prompt, model) pair in the supplied order.
    ///
    /// On failure the error carries the failing call's context and the store
    /// keeps every batch applied before it; callers read it via `store()`.
    pub async fn run(
        &mut self,
        truth: &HashMap<String, String>,
        order: &[String],
        sampled: &SampleSet,
    ) -> Result<()> {
        self.validate_inputs(truth, sampled)?;

        // Budget scales with the model count. The check runs only after a
        // full-batch dispatch, so a run may overshoot it by up to one batch.
        let stop_limit = self.config.stop.map(|stop| stop * sampled.len());
        let total_bound = truth.len() * sampled.len();
        let pb = progress_bar(stop_limit.map_or(total_bound, |limit| total_bound.min(limit)));

        let mut batch = BatchAccumulator::new(self.config.batch_size);
        let mut stopped = false;
        for tuple in PairResolver::new(order, truth, sampled) {
            batch.push(tuple);
            if !batch.is_full() {
                continue;
            }

            let flushed = batch.drain();
            self.judge_batch(&flushed, &pb).await?;
            self.processed += flushed.len();
            if let Some(limit) = stop_limit {
                if self.processed > limit {
                    stopped = true;
                    break;
                }
            }
        }

        if !stopped
            && !batch.is_empty()
            && stop_limit.is_none_or(|limit| self.processed <= limit)
        {
            let flushed = batch.drain();
            self.judge_batch(&flushed, &pb).await?;
            self.processed += flushed.len();
        }

        pb.finish();
        info!(
            processed = self.processed,
            judgments = self.store.total(),
            stopped,
            "run complete"
        );
        Ok(())
    }

    /// Quality pass first, then brevity, each an independent submission with
    /// the shared cache identifier.
    async fn judge_batch(&mut self, flushed: &[JudgmentTuple], pb: &ProgressBar) -> Result<()> {
        let Self {
            config,
            prompts,
            service,
            store,
            ..
        } = self;

        dispatch(
            service,
            flushed,
            &prompts.quality,
            &prompts.system,
            &config.critic_model,
            config.seed,
            &config.cache_file,
            store,
        )
        .await
        .context("quality judgment batch failed")?;
        pb.inc((flushed.len() / 2) as u64);

        dispatch(
            service,
            flushed,
            &prompts.brevity,
            &prompts.system,
            &config.critic_model,
            config.seed,
            &config.cache_file,
            store,
        )
        .await
        .context("brevity judgment batch failed")?;
        pb.inc((flushed.len() - flushed.len() / 2) as u64);

        Ok(())
    }

    fn validate_inputs(&self, truth: &HashMap<String, String>, sampled: &SampleSet) -> Result<()> {
        if self.config.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if truth.is_empty() {
            bail!("reference set is empty, nothing to evaluate");
        }
        if sampled.is_empty() {
            bail!("candidate set is empty, nothing to evaluate");
        }
        Ok(())
    }

    /// The store as filled so far; complete after a successful run, partial
    /// after a failed one.
    pub fn store(&self) -> &ModelResultStore {
        &self.store
    }

    pub fn into_store(self) -> ModelResultStore {
        self.store
    }

    /// Tuples processed so far across all dispatched batches
    pub fn processed(&self) -> usize {
        self.processed
    }
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")
            .unwrap(),
    );
    pb.set_message("Judging");
    pb
}
