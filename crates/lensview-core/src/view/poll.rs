//! Poll controller.
//!
//! [`LensView`] is the handle the UI holds: it selects the lens, exposes the
//! merged model through a `watch` channel and forwards node clicks. A single
//! tokio task owns the [`GraphModel`]; every tick it fetches the selected
//! lens, folds the result in and publishes a new `Arc<GraphModel>`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::fetch::{FetchError, ScopeFetcher};
use super::flatten::{GraphNode, GraphSnapshot};
use super::merge::{GraphModel, MergeOutcome};
use crate::config::PollConfig;
use crate::graph::{Lens, Uid};

/// Receives nodes the user clicked.
pub type SelectionCallback = Arc<dyn Fn(Arc<GraphNode>) + Send + Sync>;

/// Handle to a running lens poller.
pub struct LensView {
    lens_tx: watch::Sender<Option<String>>,
    model_rx: watch::Receiver<Arc<GraphModel>>,
    on_select: SelectionCallback,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl LensView {
    /// Start polling. No lens is selected initially.
    pub fn spawn(
        fetcher: Arc<dyn ScopeFetcher>,
        config: &PollConfig,
        on_select: SelectionCallback,
    ) -> Self {
        let (lens_tx, lens_rx) = watch::channel(None);
        let (model_tx, model_rx) = watch::channel(Arc::new(GraphModel::empty()));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let poller = Poller {
            fetcher,
            lens_rx,
            model_tx,
            model: GraphModel::empty(),
            interval: config.interval().max(Duration::from_millis(1)),
        };
        let task = tokio::spawn(poller.run(shutdown_rx));

        Self {
            lens_tx,
            model_rx,
            on_select,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Select a lens, or deselect with `None`.
    pub fn set_lens(&self, lens_name: Option<String>) {
        self.lens_tx.send_if_modified(|current| {
            if *current == lens_name {
                return false;
            }
            *current = lens_name;
            true
        });
    }

    pub fn lens(&self) -> Option<String> {
        self.lens_tx.borrow().clone()
    }

    /// Receiver for published models.
    pub fn subscribe(&self) -> watch::Receiver<Arc<GraphModel>> {
        self.model_rx.clone()
    }

    /// The most recently published model.
    pub fn model(&self) -> Arc<GraphModel> {
        self.model_rx.borrow().clone()
    }

    /// Forward a click on `id` to the selection callback.
    ///
    /// Returns false when the node is not in the current model.
    pub fn node_clicked(&self, id: Uid) -> bool {
        let model = self.model();
        match model.node(id) {
            Some(node) => {
                (self.on_select)(Arc::clone(node));
                true
            }
            None => false,
        }
    }

    /// Stop polling and wait for the task to finish.
    ///
    /// A fetch in flight is abandoned; its result is never applied.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for LensView {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Poller {
    fetcher: Arc<dyn ScopeFetcher>,
    lens_rx: watch::Receiver<Option<String>>,
    model_tx: watch::Sender<Arc<GraphModel>>,
    model: GraphModel,
    interval: Duration,
}

impl Poller {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                changed = self.lens_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let lens = self.lens_rx.borrow_and_update().clone();
                    match lens {
                        Some(lens) => {
                            debug!(lens = %lens, "lens selected");
                            ticker.reset_immediately();
                        }
                        None => self.teardown(),
                    }
                }
                _ = ticker.tick() => {
                    let Some(lens) = self.lens_rx.borrow().clone() else {
                        continue;
                    };
                    tokio::select! {
                        _ = &mut shutdown => break,
                        result = self.fetcher.fetch_scope(&lens) => self.apply(&lens, result),
                    }
                }
            }
        }

        debug!("lens poller stopped");
    }

    fn apply(&mut self, lens: &str, result: Result<Option<Lens>, FetchError>) {
        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(lens, error = %e, "failed to refresh lens scope");
                return;
            }
        };

        // The selection may have moved on while the fetch was in flight.
        if self.lens_rx.borrow().as_deref() != Some(lens) {
            debug!(lens, "discarding result for a lens that is no longer selected");
            return;
        }

        let update = fetched.as_ref().map(GraphSnapshot::from_lens);
        let outcome = self.model.apply(update);

        match outcome {
            MergeOutcome::Replaced { nodes, links } => {
                info!(lens, nodes, links, "lens loaded");
            }
            MergeOutcome::Merged {
                added_nodes,
                added_links,
            } if outcome.changed() => {
                debug!(lens, added_nodes, added_links, "merged lens update");
            }
            _ => return,
        }

        self.publish();
    }

    fn teardown(&mut self) {
        debug!("lens deselected");
        self.model.clear();
        self.publish();
    }

    fn publish(&self) {
        self.model_tx.send_replace(Arc::new(self.model.clone()));
    }
}
