//! Fixed-interval polling with reconciliation by id.

use async_trait::async_trait;
use domain::models::{Program, ResolvedMessage};
use domain::services::{merge, Versioned};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ClientResult;
use crate::http::ProgramsClient;

/// Reference cadence for chat and program views.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// A resource that can be re-fetched as a whole.
#[async_trait]
pub trait PollSource: Send + Sync + 'static {
    type Item: Versioned + Clone + PartialEq + Send + Sync + 'static;

    /// Used in logs.
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> ClientResult<Vec<Self::Item>>;
}

/// Post-processing applied to every published snapshot.
pub type Transform<T> = Arc<dyn Fn(&mut Vec<T>) + Send + Sync>;

pub struct Poller<S: PollSource> {
    source: Arc<S>,
    interval: Duration,
    transform: Option<Transform<S::Item>>,
}

impl<S: PollSource> Poller<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            interval: DEFAULT_POLL_INTERVAL,
            transform: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Applied to a copy of the reconciled state before publishing, so the
    /// reconciled state itself only ever holds server data.
    pub fn with_transform(
        mut self,
        transform: impl Fn(&mut Vec<S::Item>) + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Starts polling. The first fetch happens immediately.
    ///
    /// Each fetch is awaited before the next tick is taken, so at most one is
    /// in flight; ticks missed during a slow fetch are delayed, not replayed.
    pub fn spawn(self) -> PollHandle<S::Item> {
        let (sender, receiver) = watch::channel(Vec::new());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(
            self.source,
            self.interval,
            self.transform,
            sender,
            cancel.clone(),
        ));

        PollHandle {
            receiver,
            cancel,
            task: Some(task),
        }
    }
}

async fn run<S: PollSource>(
    source: Arc<S>,
    interval: Duration,
    transform: Option<Transform<S::Item>>,
    sender: watch::Sender<Vec<S::Item>>,
    cancel: CancellationToken,
) {
    let name = source.name();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut state: Vec<S::Item> = Vec::new();

    info!(source = name, interval_ms = interval.as_millis() as u64, "Polling started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = source.fetch() => result,
        };

        match fetched {
            Ok(remote) => {
                let outcome = merge(&state, remote);
                if outcome.changed {
                    state = outcome.items;
                }

                let mut view = state.clone();
                if let Some(transform) = &transform {
                    transform(&mut view);
                }
                let published = sender.send_if_modified(|current| {
                    if *current == view {
                        false
                    } else {
                        *current = view;
                        true
                    }
                });
                if published {
                    debug!(source = name, items = state.len(), "Snapshot published");
                }
            }
            Err(e) => {
                warn!(source = name, error = %e, "Poll failed, keeping last snapshot");
            }
        }
    }

    info!(source = name, "Polling stopped");
}

/// Owns a running poller. Dropping the handle cancels it.
pub struct PollHandle<T> {
    receiver: watch::Receiver<Vec<T>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<T: Clone> PollHandle<T> {
    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.receiver.clone()
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.receiver.borrow().clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancels and waits for the loop to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Poll task ended abnormally");
            }
        }
    }
}

impl<T> Drop for PollHandle<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Chat history of a group, announcements resolved.
pub struct GroupMessagesSource {
    client: ProgramsClient,
    group_id: Uuid,
}

impl GroupMessagesSource {
    pub fn new(client: ProgramsClient, group_id: Uuid) -> Self {
        Self { client, group_id }
    }
}

#[async_trait]
impl PollSource for GroupMessagesSource {
    type Item = ResolvedMessage;

    fn name(&self) -> &'static str {
        "group_messages"
    }

    async fn fetch(&self) -> ClientResult<Vec<ResolvedMessage>> {
        self.client.group_messages(self.group_id).await
    }
}

/// Programs of a group.
pub struct GroupProgramsSource {
    client: ProgramsClient,
    group_id: Uuid,
}

impl GroupProgramsSource {
    pub fn new(client: ProgramsClient, group_id: Uuid) -> Self {
        Self { client, group_id }
    }
}

#[async_trait]
impl PollSource for GroupProgramsSource {
    type Item = Program;

    fn name(&self) -> &'static str {
        "group_programs"
    }

    async fn fetch(&self) -> ClientResult<Vec<Program>> {
        self.client.group_programs(self.group_id).await
    }
}
