//! Client-side tracking of backend processing jobs.
//!
//! `ProcessingJobs` holds every job the user submitted, follows its status
//! over the job update channel, and on completion:
//!
//! - flags new content/summary/project ids for highlighting,
//! - invalidates the completion fan-out (see [`crate::fanout`]),
//! - evicts the job after a short delay so the UI can show "done" first.
//!
//! Completion side effects run exactly once per job, however many times the
//! backend redelivers `completed`. State is only touched under a short lock
//! that is never held across an await, so updates are applied one at a time.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use tellmemo_core::{ContentId, Job, JobId, JobResult, JobStatus, ProjectId};
use tellmemo_events::{JobUpdate, JobUpdateChannel, Subscription};

use crate::cache::CacheRegistry;
use crate::fanout;
use crate::new_items::NewItemsTracker;

/// How long a finished job stays visible.
pub const DEFAULT_EVICTION_DELAY: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    pub eviction_delay: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { eviction_delay: DEFAULT_EVICTION_DELAY }
    }
}

#[derive(Default)]
struct TrackerState {
    jobs: Vec<Job>,
    /// Jobs whose completion side effects already ran.
    completed: HashSet<JobId>,
    subscriptions: HashMap<JobId, JoinHandle<()>>,
    evictions: HashMap<JobId, JoinHandle<()>>,
}

struct Inner {
    channel: Arc<dyn JobUpdateChannel>,
    caches: Arc<CacheRegistry>,
    new_items: Arc<dyn NewItemsTracker>,
    config: TrackerConfig,
    runtime: Handle,
    state: Mutex<TrackerState>,
    changes: watch::Sender<Vec<Job>>,
}

/// Work to do once a job first reports `completed`.
struct Completion {
    job_id: JobId,
    project_id: ProjectId,
    result: Option<JobResult>,
}

/// Registry of in-flight and recently finished jobs.
///
/// Cheap to clone; all clones share the same registry. Teardown happens on
/// [`dispose`](Self::dispose) or when the last clone is dropped.
#[derive(Clone)]
pub struct ProcessingJobs {
    inner: Arc<Inner>,
}

impl ProcessingJobs {
    /// Create a tracker bound to the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(
        channel: Arc<dyn JobUpdateChannel>,
        caches: Arc<CacheRegistry>,
        new_items: Arc<dyn NewItemsTracker>,
        config: TrackerConfig,
    ) -> Self {
        Self::with_runtime(Handle::current(), channel, caches, new_items, config)
    }

    /// Create a tracker that spawns its tasks on `runtime`.
    pub fn with_runtime(
        runtime: Handle,
        channel: Arc<dyn JobUpdateChannel>,
        caches: Arc<CacheRegistry>,
        new_items: Arc<dyn NewItemsTracker>,
        config: TrackerConfig,
    ) -> Self {
        let (changes, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                channel,
                caches,
                new_items,
                config,
                runtime,
                state: Mutex::new(TrackerState::default()),
                changes,
            }),
        }
    }

    /// Start tracking a job. Returns `false` if it is already tracked.
    ///
    /// Opens exactly one channel subscription per tracked job.
    pub fn add_job(
        &self,
        job_id: JobId,
        project_id: ProjectId,
        content_id: Option<ContentId>,
    ) -> bool {
        let mut state = self.inner.lock();
        if state.jobs.iter().any(|j| j.id == job_id) {
            tracing::debug!(job_id = %job_id, "job already tracked");
            return false;
        }

        let subscription = self.inner.channel.subscribe(&job_id);
        let pump = self.inner.runtime.spawn(pump_updates(
            Arc::downgrade(&self.inner),
            job_id.clone(),
            subscription,
        ));

        tracing::info!(job_id = %job_id, project_id = %project_id, "tracking job");
        state.subscriptions.insert(job_id.clone(), pump);
        state.jobs.push(Job::new(job_id, project_id, content_id));
        self.inner.publish(&state);
        true
    }

    /// Stop tracking a job. No-op for unknown ids.
    pub fn remove_job(&self, job_id: &JobId) -> bool {
        let mut state = self.inner.lock();
        if let Some(timer) = state.evictions.remove(job_id) {
            timer.abort();
        }
        let removed = remove_locked(&mut state, job_id);
        if removed {
            tracing::info!(job_id = %job_id, "stopped tracking job");
            self.inner.publish(&state);
        }
        removed
    }

    /// Apply a status update as if it had arrived on the channel.
    ///
    /// Updates for untracked jobs are ignored.
    pub fn apply_update(&self, update: JobUpdate) {
        self.inner.handle_update(update);
    }

    pub fn get_job(&self, job_id: &JobId) -> Option<Job> {
        self.inner.lock().jobs.iter().find(|j| &j.id == job_id).cloned()
    }

    /// Every tracked job, in submission order.
    pub fn jobs(&self) -> Vec<Job> {
        self.inner.lock().jobs.clone()
    }

    pub fn get_project_jobs(&self, project_id: &ProjectId) -> Vec<Job> {
        self.inner
            .lock()
            .jobs
            .iter()
            .filter(|j| &j.project_id == project_id)
            .cloned()
            .collect()
    }

    /// True while any job for the project is pending or processing.
    pub fn has_processing_jobs(&self, project_id: &ProjectId) -> bool {
        self.inner
            .lock()
            .jobs
            .iter()
            .any(|j| &j.project_id == project_id && j.is_active())
    }

    /// Receive the full job list after every change.
    pub fn watch(&self) -> watch::Receiver<Vec<Job>> {
        self.inner.changes.subscribe()
    }

    /// Cancel every subscription and timer and forget all jobs.
    pub fn dispose(&self) {
        let mut state = self.inner.lock();
        let count = state.jobs.len();
        abort_all(&mut state);
        state.jobs.clear();
        state.completed.clear();
        self.inner.publish(&state);
        tracing::info!(jobs = count, "job tracker disposed");
    }
}

impl core::fmt::Debug for ProcessingJobs {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("ProcessingJobs")
            .field("jobs", &state.jobs.len())
            .field("completed", &state.completed.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &TrackerState) {
        self.changes.send_replace(state.jobs.clone());
    }

    fn handle_update(self: &Arc<Self>, update: JobUpdate) {
        let completion = {
            let mut state = self.lock();
            let Some(job) = state.jobs.iter_mut().find(|j| j.id == update.job_id) else {
                tracing::debug!(job_id = %update.job_id, "ignoring update for untracked job");
                return;
            };

            let original_project = job.project_id.clone();
            update.apply_to(job);
            let status = job.status;
            let result = job.result.clone();
            tracing::debug!(
                job_id = %update.job_id,
                status = %status,
                progress = update.progress,
                "job update"
            );

            let mut completion = None;
            if status == JobStatus::Completed && state.completed.insert(update.job_id.clone()) {
                completion = Some(Completion {
                    job_id: update.job_id.clone(),
                    project_id: update.reported_project().cloned().unwrap_or(original_project),
                    result,
                });
            }

            if status.is_terminal() && !state.evictions.contains_key(&update.job_id) {
                let timer = self.schedule_eviction(update.job_id.clone());
                state.evictions.insert(update.job_id.clone(), timer);
            }
            if status == JobStatus::Failed {
                tracing::warn!(
                    job_id = %update.job_id,
                    error = update.error_message.as_deref().unwrap_or("unknown"),
                    "job failed"
                );
            }

            self.publish(&state);
            completion
        };

        // Side effects run outside the lock; caches may call back into us.
        if let Some(completion) = completion {
            self.complete(completion);
        }
    }

    fn complete(&self, completion: Completion) {
        let Completion { job_id, project_id, result } = completion;

        if let Some(result) = &result {
            if let Some(content_id) = &result.content_id {
                if !self.new_items.is_new(content_id.as_str()) {
                    self.new_items.add_new_item(content_id.as_str());
                }
            }
            if let Some(summary_id) = &result.summary_id {
                self.new_items.add_new_item(summary_id.as_str());
            }
            if result.new_project_created {
                self.new_items.add_new_item(project_id.as_str());
            }
        }

        fanout::invalidate_for_job_completion(&self.caches, &project_id);
        tracing::info!(
            job_id = %job_id,
            project_id = %project_id,
            "job completed; dependent caches invalidated"
        );
    }

    fn schedule_eviction(self: &Arc<Self>, job_id: JobId) -> JoinHandle<()> {
        let inner = Arc::downgrade(self);
        let delay = self.config.eviction_delay;
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = inner.upgrade() {
                inner.evict(&job_id);
            }
        })
    }

    fn evict(&self, job_id: &JobId) {
        let mut state = self.lock();
        // This runs inside the timer task itself; drop its handle without aborting.
        state.evictions.remove(job_id);
        if remove_locked(&mut state, job_id) {
            tracing::debug!(job_id = %job_id, "evicted finished job");
            self.publish(&state);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        abort_all(state);
    }
}

fn remove_locked(state: &mut TrackerState, job_id: &JobId) -> bool {
    if let Some(pump) = state.subscriptions.remove(job_id) {
        pump.abort();
    }
    state.completed.remove(job_id);
    let before = state.jobs.len();
    state.jobs.retain(|j| &j.id != job_id);
    state.jobs.len() != before
}

fn abort_all(state: &mut TrackerState) {
    for (_, pump) in state.subscriptions.drain() {
        pump.abort();
    }
    for (_, timer) in state.evictions.drain() {
        timer.abort();
    }
}

/// Forward channel updates for one job into the tracker.
///
/// Holds only a weak reference so a forgotten tracker can still be dropped.
async fn pump_updates(
    inner: Weak<Inner>,
    job_id: JobId,
    mut subscription: Subscription<JobUpdate>,
) {
    while let Some(update) = subscription.recv().await {
        if update.job_id != job_id {
            tracing::trace!(job_id = %job_id, other = %update.job_id, "skipping foreign update");
            continue;
        }
        let Some(tracker) = inner.upgrade() else { break };
        tracker.handle_update(update);
    }
    tracing::debug!(job_id = %job_id, "job update subscription ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, ReadCache};
    use crate::new_items::InMemoryNewItems;
    use proptest::prelude::*;
    use tellmemo_core::SummaryId;
    use tellmemo_events::InMemoryJobChannel;

    /// Counts every flag call, including repeats.
    #[derive(Default)]
    struct CountingNewItems {
        calls: Mutex<Vec<String>>,
    }

    impl NewItemsTracker for CountingNewItems {
        fn add_new_item(&self, id: &str) {
            self.calls.lock().unwrap().push(id.to_owned());
        }

        fn is_new(&self, id: &str) -> bool {
            self.calls.lock().unwrap().iter().any(|c| c == id)
        }
    }

    struct Fixture {
        channel: Arc<InMemoryJobChannel>,
        caches: Arc<CacheRegistry>,
        new_items: Arc<CountingNewItems>,
        jobs: ProcessingJobs,
    }

    fn fixture() -> Fixture {
        let channel = Arc::new(InMemoryJobChannel::new());
        let caches = Arc::new(CacheRegistry::new());
        let new_items = Arc::new(CountingNewItems::default());
        let jobs = ProcessingJobs::new(
            channel.clone(),
            caches.clone(),
            new_items.clone(),
            TrackerConfig::default(),
        );
        Fixture { channel, caches, new_items, jobs }
    }

    fn summaries(project: &str) -> CacheKey {
        CacheKey::ProjectSummaries(ProjectId::from(project))
    }

    async fn next_change(rx: &mut watch::Receiver<Vec<Job>>) -> Vec<Job> {
        rx.changed().await.unwrap();
        rx.borrow_and_update().clone()
    }

    #[tokio::test]
    async fn add_job_is_idempotent() {
        let f = fixture();
        let id = JobId::from("j1");

        assert!(f.jobs.add_job(id.clone(), ProjectId::from("p1"), None));
        assert!(!f.jobs.add_job(id.clone(), ProjectId::from("p1"), None));

        assert_eq!(f.jobs.jobs().len(), 1);
        assert_eq!(f.channel.subscriber_count(&id), 1);
        assert!(f.jobs.has_processing_jobs(&ProjectId::from("p1")));
    }

    #[tokio::test]
    async fn remove_untracked_job_is_a_no_op() {
        let f = fixture();
        f.jobs.add_job(JobId::from("j1"), ProjectId::from("p1"), None);

        assert!(!f.jobs.remove_job(&JobId::from("nope")));
        assert_eq!(f.jobs.jobs().len(), 1);
    }

    #[tokio::test]
    async fn remove_job_cancels_the_subscription() {
        let f = fixture();
        let id = JobId::from("j1");
        f.jobs.add_job(id.clone(), ProjectId::from("p1"), None);

        assert!(f.jobs.remove_job(&id));
        assert!(f.jobs.get_job(&id).is_none());

        for _ in 0..10 {
            if f.channel.subscriber_count(&id) == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(f.channel.subscriber_count(&id), 0);
    }

    #[tokio::test]
    async fn updates_for_unknown_jobs_are_ignored() {
        let f = fixture();
        f.jobs.apply_update(JobUpdate::new("ghost", JobStatus::Completed));

        assert!(f.jobs.jobs().is_empty());
        assert_eq!(f.caches.invalidation_count(&CacheKey::ProjectList), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_runs_once_and_job_is_evicted() {
        let f = fixture();
        let id = JobId::from("j1");
        let p1 = ProjectId::from("p1");
        let summaries_cache = Arc::new(ReadCache::<Vec<String>>::new());
        summaries_cache.put(vec!["old".into()]);
        f.caches.register(summaries("p1"), summaries_cache.clone());

        let mut changes = f.jobs.watch();
        f.jobs.add_job(id.clone(), p1.clone(), None);
        next_change(&mut changes).await;

        f.channel
            .publish(JobUpdate::new("j1", JobStatus::Processing).with_progress(0.5))
            .unwrap();
        let snapshot = next_change(&mut changes).await;
        assert_eq!(snapshot[0].status, JobStatus::Processing);
        assert_eq!(snapshot[0].progress, 0.5);
        assert_eq!(f.caches.invalidation_count(&summaries("p1")), 0);
        assert!(f.new_items.calls.lock().unwrap().is_empty());

        let completed = JobUpdate::new("j1", JobStatus::Completed).with_result(SummaryId::from("s1"));
        f.channel.publish(completed.clone()).unwrap();
        next_change(&mut changes).await;
        assert_eq!(*f.new_items.calls.lock().unwrap(), vec!["s1".to_string()]);
        assert_eq!(f.caches.invalidation_count(&summaries("p1")), 1);
        assert!(summaries_cache.is_stale());
        assert!(f.jobs.get_job(&id).is_some());
        assert!(!f.jobs.has_processing_jobs(&p1));

        f.channel.publish(completed).unwrap();
        next_change(&mut changes).await;
        assert_eq!(f.new_items.calls.lock().unwrap().len(), 1);
        assert_eq!(f.caches.invalidation_count(&summaries("p1")), 1);
        assert_eq!(f.caches.invalidation_count(&CacheKey::ProjectList), 1);

        tokio::time::sleep(Duration::from_secs(14)).await;
        assert!(f.jobs.get_job(&id).is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(f.jobs.get_job(&id).is_none());
        assert_eq!(f.channel.subscriber_count(&id), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_jobs_are_evicted_without_side_effects() {
        let f = fixture();
        let id = JobId::from("j2");
        f.jobs.add_job(id.clone(), ProjectId::from("p1"), None);

        f.jobs.apply_update(
            JobUpdate::new("j2", JobStatus::Failed).with_progress(0.3).with_error("bad audio"),
        );
        let job = f.jobs.get_job(&id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("bad audio"));
        assert_eq!(f.caches.invalidation_count(&CacheKey::MeetingList), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(f.jobs.get_job(&id).is_some());
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(f.jobs.get_job(&id).is_none());
    }

    #[tokio::test]
    async fn new_project_from_payload_takes_precedence() {
        let f = fixture();
        f.jobs.add_job(JobId::from("j3"), ProjectId::from("draft"), Some(ContentId::from("c1")));

        f.jobs.apply_update(
            JobUpdate::new("j3", JobStatus::Completed).with_result(
                JobResult::default()
                    .with_content("c1")
                    .with_summary("s9")
                    .with_new_project("p-new"),
            ),
        );

        assert_eq!(f.caches.invalidation_count(&summaries("p-new")), 1);
        assert_eq!(
            f.caches.invalidation_count(&CacheKey::ProjectBlockers(ProjectId::from("p-new"))),
            1
        );
        assert_eq!(f.caches.invalidation_count(&summaries("draft")), 0);
        assert_eq!(
            *f.new_items.calls.lock().unwrap(),
            vec!["c1".to_string(), "s9".to_string(), "p-new".to_string()]
        );
        assert_eq!(f.jobs.get_project_jobs(&ProjectId::from("p-new")).len(), 1);
        assert!(f.jobs.get_project_jobs(&ProjectId::from("draft")).is_empty());
    }

    #[tokio::test]
    async fn known_content_is_not_flagged_again() {
        let f = fixture();
        f.new_items.add_new_item("c1");
        f.jobs.add_job(JobId::from("j4"), ProjectId::from("p1"), None);

        f.jobs.apply_update(
            JobUpdate::new("j4", JobStatus::Completed)
                .with_result(JobResult::default().with_content("c1")),
        );

        assert_eq!(*f.new_items.calls.lock().unwrap(), vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn project_filters() {
        let f = fixture();
        f.jobs.add_job(JobId::from("a"), ProjectId::from("p1"), None);
        f.jobs.add_job(JobId::from("b"), ProjectId::from("p2"), None);
        f.jobs.apply_update(JobUpdate::new("b", JobStatus::Completed));

        assert_eq!(f.jobs.get_project_jobs(&ProjectId::from("p1")).len(), 1);
        assert!(f.jobs.has_processing_jobs(&ProjectId::from("p1")));
        assert!(!f.jobs.has_processing_jobs(&ProjectId::from("p2")));
        assert!(!f.jobs.has_processing_jobs(&ProjectId::from("p3")));
    }

    #[tokio::test]
    async fn dispose_forgets_everything() {
        let f = fixture();
        let id = JobId::from("j1");
        f.jobs.add_job(id.clone(), ProjectId::from("p1"), None);
        f.jobs.dispose();

        assert!(f.jobs.jobs().is_empty());
        f.jobs.apply_update(JobUpdate::new("j1", JobStatus::Completed));
        assert_eq!(f.caches.invalidation_count(&CacheKey::ProjectList), 0);
    }

    #[tokio::test]
    async fn real_tracker_flags_into_in_memory_store() {
        let channel = Arc::new(InMemoryJobChannel::new());
        let caches = Arc::new(CacheRegistry::new());
        let new_items = Arc::new(InMemoryNewItems::new());
        let jobs = ProcessingJobs::new(channel, caches, new_items.clone(), TrackerConfig::default());

        jobs.add_job(JobId::from("j1"), ProjectId::from("p1"), None);
        jobs.apply_update(JobUpdate::new("j1", JobStatus::Completed).with_result(SummaryId::from("s1")));

        assert!(new_items.is_new("s1"));
        assert_eq!(new_items.items(), vec!["s1".to_string()]);
    }

    fn status_strategy() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Pending),
            Just(JobStatus::Processing),
            Just(JobStatus::Completed),
            Just(JobStatus::Failed),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            .. ProptestConfig::default()
        })]

        #[test]
        fn completion_effects_run_at_most_once(statuses in prop::collection::vec(status_strategy(), 1..20)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();

            rt.block_on(async {
                let f = fixture();
                f.jobs.add_job(JobId::from("j1"), ProjectId::from("p1"), None);

                for status in &statuses {
                    f.jobs.apply_update(
                        JobUpdate::new("j1", *status).with_result(SummaryId::from("s1")),
                    );
                }

                let expected = u64::from(statuses.contains(&JobStatus::Completed));
                prop_assert_eq!(f.caches.invalidation_count(&summaries("p1")), expected);
                prop_assert_eq!(f.new_items.calls.lock().unwrap().len() as u64, expected);
                Ok(())
            })?;
        }
    }
}
