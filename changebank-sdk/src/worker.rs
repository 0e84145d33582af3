use crate::user_info::{fetch_user_info, UserInfo, UserInfoError};
use changebank_common::HttpClient;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

pub(crate) struct FetchJob {
    pub(crate) id: u64,
    pub(crate) endpoint: String,
    pub(crate) access_token: String,
}

pub(crate) struct FetchOutcome {
    pub(crate) id: u64,
    pub(crate) result: Result<UserInfo, UserInfoError>,
}

/// A single background task running user info fetches one at a time.
///
/// Outcomes are sent on the events channel given at construction, in submission order.
pub(crate) struct UserInfoWorker<T> {
    http_client: Arc<T>,
    events: UnboundedSender<FetchOutcome>,
    jobs: Option<UnboundedSender<FetchJob>>,
    handle: Option<JoinHandle<()>>,
}

impl<T> UserInfoWorker<T>
where
    T: HttpClient + Send + Sync + 'static,
{
    pub(crate) fn new(http_client: Arc<T>, events: UnboundedSender<FetchOutcome>) -> Self {
        Self { http_client, events, jobs: None, handle: None }
    }
    pub(crate) fn is_shutdown(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished) || self.jobs.is_none()
    }
    /// Spawn the task. Must be called from within a tokio runtime.
    pub(crate) fn start(&mut self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(self.http_client.clone(), rx, self.events.clone()));
        self.jobs = Some(tx);
        self.handle = Some(handle);
        tracing::trace!("user info worker started");
    }
    /// Queue a job. Returns `false` if the worker is shut down.
    pub(crate) fn submit(&self, job: FetchJob) -> bool {
        self.jobs.as_ref().is_some_and(|jobs| jobs.send(job).is_ok())
    }
    /// Stop the task, cancelling the fetch in flight and dropping queued jobs.
    pub(crate) fn shutdown_now(&mut self) {
        self.jobs = None;
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::trace!("user info worker shut down");
        }
    }
}

async fn run<T>(
    http_client: Arc<T>,
    mut jobs: UnboundedReceiver<FetchJob>,
    events: UnboundedSender<FetchOutcome>,
) where
    T: HttpClient + Send + Sync + 'static,
{
    while let Some(job) = jobs.recv().await {
        let result = fetch_user_info(http_client.as_ref(), &job.endpoint, &job.access_token).await;
        if events.send(FetchOutcome { id: job.id, result }).is_err() {
            break;
        }
    }
}
