// crates/cli/src/commands.rs
//! Subcommand implementations.

use std::io::Write;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use bulkadd_core::view::CLOSE_WARNING;
use bulkadd_core::{
    default_target, Confirmed, JobPhase, JobsApi, StartError, SurfaceListener, TrackerConfig, TrackingGuard,
};
use bulkadd_types::{CollectionId, CompanyId, JobHandle, JobId, JobState, JobStatus, SubmissionRequest};

use crate::render::{self, Renderer};

/// How an `add` ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Synchronous,
    Completed(JobStatus),
    Canceled(JobStatus),
    /// `failed`, or a state the server invented.
    Failed(JobStatus),
    Lost { job_id: JobId, error: String },
}

impl AddOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Synchronous | Self::Completed(_) | Self::Canceled(_))
    }
}

/// Accept a collection id or, failing that, a case-insensitive name.
pub async fn resolve_collection(api: &dyn JobsApi, arg: &str) -> Result<CollectionId> {
    let collections = api.list_collections().await.context("failed to list collections")?;
    collections
        .iter()
        .find(|c| c.id.as_str() == arg)
        .or_else(|| {
            collections
                .iter()
                .find(|c| c.collection_name.eq_ignore_ascii_case(arg))
        })
        .map(|c| c.id.clone())
        .with_context(|| format!("no collection with id or name '{arg}'"))
}

/// Build the request for `add`. Without `--target`, a whole-collection add
/// goes to the first collection other than its source.
pub async fn add_request(
    api: &dyn JobsApi,
    target: Option<&str>,
    ids: &[CompanyId],
    source: Option<&str>,
) -> Result<SubmissionRequest> {
    let Some(source) = source else {
        let target = target.context("--target is required when adding selected companies")?;
        let target = resolve_collection(api, target).await?;
        return Ok(SubmissionRequest::selected(target, ids.iter().copied()));
    };

    let source = resolve_collection(api, source).await?;
    let target = match target {
        Some(target) => resolve_collection(api, target).await?,
        None => {
            let collections = api.list_collections().await.context("failed to list collections")?;
            let target = default_target(&collections, &source)
                .with_context(|| format!("no collection to add '{source}' into"))?;
            tracing::info!(target_collection = %target.id, name = %target.collection_name, "Using default target");
            target.id.clone()
        }
    };
    Ok(SubmissionRequest::whole_collection(target, source))
}

pub async fn collections(api: &dyn JobsApi, json: bool, out: &mut impl Write) -> Result<()> {
    let collections = api.list_collections().await?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&collections)?)?;
    } else {
        for line in render::collection_lines(&collections) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

pub async fn items(
    api: &dyn JobsApi,
    collection: &str,
    offset: u64,
    limit: u64,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let id = resolve_collection(api, collection).await?;
    let page = api.list_collection_items(&id, offset, limit).await?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&page)?)?;
    } else {
        for line in render::page_lines(&page, offset) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

pub async fn status(api: &dyn JobsApi, job_id: JobId, json: bool, out: &mut impl Write) -> Result<()> {
    let status = api.get_job_status(job_id).await?;
    write_status(job_id, &status, json, out)
}

pub async fn cancel(api: &dyn JobsApi, job_id: JobId, json: bool, out: &mut impl Write) -> Result<()> {
    let status = api.cancel_job(job_id).await?;
    write_status(job_id, &status, json, out)
}

fn write_status(job_id: JobId, status: &JobStatus, json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(status)?)?;
    } else {
        writeln!(out, "{}", render::status_line(job_id, status))?;
    }
    Ok(())
}

/// Remembers which collection needs refreshing.
#[derive(Default)]
struct RefreshListener {
    stale: Mutex<Option<CollectionId>>,
}

impl RefreshListener {
    fn take(&self) -> Option<CollectionId> {
        match self.stale.lock() {
            Ok(mut stale) => stale.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl SurfaceListener for RefreshListener {
    fn batch_finished(&self, target: &CollectionId) {
        tracing::debug!(target_collection = %target, "Collection needs refresh");
        match self.stale.lock() {
            Ok(mut stale) => *stale = Some(target.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(target.clone()),
        }
    }
}

/// Submit a bulk add and track it until it settles or tracking is lost.
///
/// The first Ctrl-C is refused while the job is active; the second asks the
/// server to cancel the job.
pub async fn add<W: Write>(
    api: Arc<dyn JobsApi>,
    config: &TrackerConfig,
    request: SubmissionRequest,
    renderer: &mut Renderer<W>,
) -> Result<AddOutcome> {
    let listener = Arc::new(RefreshListener::default());
    let guard = TrackingGuard::new(Arc::clone(&api), config, listener.clone());
    let mut views = guard.subscribe();

    tracing::info!(target_collection = %request.target(), items = %request.describe(), "Starting bulk add");
    match guard.confirm(request).await {
        Ok(Confirmed::Submitted(JobHandle::Running(job_id))) => {
            tracing::info!(job_id, "Bulk add queued");
        }
        Ok(_) => {}
        Err(StartError::Submit(e)) => {
            let message = guard.view().error.unwrap_or_default();
            bail!("{message} ({e})");
        }
        Err(e) => return Err(e.into()),
    }

    let mut interrupts = 0u32;
    loop {
        let view = views.borrow_and_update().clone();
        renderer.show(&view)?;
        if view.lost_track || view.can_close {
            break;
        }
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if interrupts == 0 {
                    if guard.close().is_err() {
                        renderer.notice(&format!("{CLOSE_WARNING} Press Ctrl-C again to cancel the job."));
                    }
                } else if let Err(e) = guard.cancel_job().await {
                    renderer.notice(&format!("Cancel failed: {e}"));
                }
                interrupts += 1;
            }
        }
    }

    let view = guard.view();
    renderer.finish(&view)?;

    let outcome = match guard.machine().phase() {
        JobPhase::SyncDone => AddOutcome::Synchronous,
        JobPhase::Settled { status, .. } => match status.state {
            JobState::Completed => AddOutcome::Completed(status),
            JobState::Canceled => AddOutcome::Canceled(status),
            _ => AddOutcome::Failed(status),
        },
        JobPhase::LostTrack { job_id, error, .. } => AddOutcome::Lost { job_id, error },
        other => bail!("tracking ended in unexpected state {other:?}"),
    };

    if let Some(target) = listener.take() {
        refresh(api.as_ref(), &target, renderer).await;
    }
    if guard.close().is_err() {
        tracing::debug!("Leaving tracking surface with the job unsettled");
    }
    Ok(outcome)
}

/// Re-read the target collection after a batch lands.
async fn refresh<W: Write>(api: &dyn JobsApi, target: &CollectionId, renderer: &Renderer<W>) {
    match api.list_collection_items(target, 0, 1).await {
        Ok(page) => renderer.notice(&format!(
            "{} now has {} companies",
            page.collection.collection_name, page.total
        )),
        Err(e) => tracing::warn!(target_collection = %target, error = %e, "Failed to refresh collection"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkadd_sim::{SimConfig, SimulatedJobsApi, IGNORE_COLLECTION, LIKED_COLLECTION, MY_LIST};
    use indicatif::ProgressBar;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn sim() -> Arc<SimulatedJobsApi> {
        Arc::new(SimulatedJobsApi::new(
            SimConfig::default()
                .with_companies(20)
                .with_insert_delay(Duration::from_millis(70)),
        ))
    }

    fn quiet() -> Renderer<Vec<u8>> {
        Renderer::with_bar(ProgressBar::hidden(), Vec::new(), false)
    }

    #[tokio::test]
    async fn test_resolve_collection_by_id_or_name() {
        let api = sim();
        let liked = api.collection_id(LIKED_COLLECTION).unwrap();
        assert_eq!(resolve_collection(api.as_ref(), liked.as_str()).await.unwrap(), liked);
        assert_eq!(
            resolve_collection(api.as_ref(), "liked companies list").await.unwrap(),
            liked
        );
        assert!(resolve_collection(api.as_ref(), "nope").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_tracks_job_to_completion() {
        let api = sim();
        let liked = api.collection_id(LIKED_COLLECTION).unwrap();
        let mut renderer = quiet();

        let outcome = add(
            api.clone(),
            &TrackerConfig::default(),
            SubmissionRequest::selected(liked.clone(), [11, 12]),
            &mut renderer,
        )
        .await
        .unwrap();

        assert_eq!(outcome, AddOutcome::Completed(JobStatus::new(JobState::Completed, 2, 2)));
        assert!(outcome.is_success());
        assert_eq!(api.members(&liked).len(), 12);
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(out, "  \u{2713} Complete!\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_with_nothing_new_is_synchronous() {
        let api = sim();
        let liked = api.collection_id(LIKED_COLLECTION).unwrap();
        let mut renderer = quiet();

        let outcome = add(
            api,
            &TrackerConfig::default(),
            SubmissionRequest::selected(liked, [1, 2]),
            &mut renderer,
        )
        .await
        .unwrap();
        assert_eq!(outcome, AddOutcome::Synchronous);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_reports_submit_failure() {
        let api = sim();
        let liked = api.collection_id(LIKED_COLLECTION).unwrap();
        let mut renderer = quiet();

        let err = add(
            api,
            &TrackerConfig::default(),
            SubmissionRequest::selected(liked, [9999]),
            &mut renderer,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("9999"), "{err}");
    }

    #[tokio::test]
    async fn test_add_request_defaults_target_for_source() {
        let api = sim();
        let my_list = api.collection_id(MY_LIST).unwrap();
        let liked = api.collection_id(LIKED_COLLECTION).unwrap();
        let ignore = api.collection_id(IGNORE_COLLECTION).unwrap();

        let request = add_request(api.as_ref(), None, &[], Some(MY_LIST)).await.unwrap();
        assert_eq!(request, SubmissionRequest::whole_collection(liked.clone(), my_list.clone()));

        let request = add_request(api.as_ref(), None, &[], Some(LIKED_COLLECTION)).await.unwrap();
        assert_eq!(request, SubmissionRequest::whole_collection(my_list.clone(), liked));

        let request = add_request(api.as_ref(), Some(IGNORE_COLLECTION), &[], Some(MY_LIST))
            .await
            .unwrap();
        assert_eq!(request, SubmissionRequest::whole_collection(ignore.clone(), my_list));

        let request = add_request(api.as_ref(), Some(ignore.as_str()), &[4, 2], None)
            .await
            .unwrap();
        assert_eq!(request, SubmissionRequest::selected(ignore, [2, 4]));

        assert!(add_request(api.as_ref(), None, &[1], None).await.is_err());
    }

    #[tokio::test]
    async fn test_status_of_unknown_job_fails() {
        let api = sim();
        let mut out = Vec::new();
        assert!(status(api.as_ref(), 7, false, &mut out).await.is_err());
        assert!(out.is_empty());
    }
}
