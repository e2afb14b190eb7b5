use crate::criteria::Criterion;
use crate::judge::{JudgeRequest, JudgeService, JudgeVerdict, RequestOrigin};
use crate::models::{JudgedPair, JudgmentTuple, ModelResultStore};
use anyhow::Result;
use tracing::debug;

/// Submit one batch under one criterion and apply the verdicts to the store.
///
/// Each request embeds its originating prompt and model name so verdicts are
/// routed back by identity, not by position. Requests the service resolves no
/// verdict for are pending: they are excluded from this run rather than
/// stored with a placeholder.
pub async fn dispatch<J: JudgeService>(
    service: &J,
    batch: &[JudgmentTuple],
    criterion: &Criterion,
    system: &str,
    critic_model: &str,
    seed: u64,
    cache: &str,
    store: &mut ModelResultStore,
) -> Result<()> {
    let requests: Vec<JudgeRequest> = batch
        .iter()
        .map(|tuple| JudgeRequest {
            system: system.to_string(),
            user: criterion.render(&tuple.prompt, &tuple.candidate, &tuple.reference),
            model: critic_model.to_string(),
            seed,
            origin: RequestOrigin {
                candidate: tuple.candidate.clone(),
                reference: tuple.reference.clone(),
                prompt: tuple.prompt.clone(),
                model: tuple.model.clone(),
            },
        })
        .collect();

    let submitted = requests.len();
    let verdicts = service.submit(requests, cache).await?;
    debug!(
        criterion = criterion.key(),
        submitted,
        resolved = verdicts.len(),
        "judgment batch applied"
    );

    for JudgeVerdict { origin, win } in verdicts {
        store.append(
            &origin.model,
            criterion.key(),
            JudgedPair {
                candidate: origin.candidate,
                reference: origin.reference,
                win,
            },
        );
    }
    Ok(())
}
