use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::{info, warn};

use super::client::GraphApi;
use super::error::FetchError;
use super::model::{DocumentList, GraphData, KnowledgeStats, SeedResponse};
use super::scheduler::{FetchUpdate, Payload, PollIntervals, PollScheduler, Resource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub graph: Arc<GraphData>,
    pub graph_revision: u64,
    pub stats: Option<KnowledgeStats>,
    pub documents: Option<DocumentList>,
}

pub struct DataFetcher {
    api: Arc<dyn GraphApi>,
    scheduler: Option<PollScheduler>,
    snapshot: Snapshot,
    degraded: HashSet<Resource>,
    seed_rx: Option<Receiver<Result<SeedResponse, FetchError>>>,
    notices: VecDeque<Notice>,
}

impl DataFetcher {
    pub fn start(api: Arc<dyn GraphApi>, intervals: PollIntervals) -> Self {
        let scheduler = PollScheduler::start(Arc::clone(&api), intervals);
        let mut fetcher = Self::detached(api);
        fetcher.scheduler = Some(scheduler);
        fetcher
    }

    fn detached(api: Arc<dyn GraphApi>) -> Self {
        Self {
            api,
            scheduler: None,
            snapshot: Snapshot::default(),
            degraded: HashSet::new(),
            seed_rx: None,
            notices: VecDeque::new(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    pub fn is_seeding(&self) -> bool {
        self.seed_rx.is_some()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    pub fn poll(&mut self) {
        if let Some(scheduler) = &self.scheduler {
            let mut pending = Vec::new();
            while let Some(update) = scheduler.try_next() {
                pending.push(update);
            }
            for update in pending {
                self.apply(update);
            }
        }

        self.poll_seed();
    }

    pub(crate) fn apply(&mut self, update: FetchUpdate) {
        let FetchUpdate { resource, result } = update;

        let payload = match result {
            Ok(payload) => payload,
            Err(error) => {
                if self.degraded.insert(resource) {
                    warn!(resource = resource.label(), %error, "poll failed; keeping last snapshot");
                }
                return;
            }
        };

        if self.degraded.remove(&resource) {
            info!(resource = resource.label(), "poll recovered");
        }

        match payload {
            Payload::Graph(graph) => {
                if *self.snapshot.graph != graph {
                    self.snapshot.graph = Arc::new(graph);
                    self.snapshot.graph_revision = self.snapshot.graph_revision.wrapping_add(1);
                }
            }
            Payload::Stats(stats) => self.snapshot.stats = Some(stats),
            Payload::Documents(documents) => self.snapshot.documents = Some(documents),
        }
    }

    pub fn refresh(&self) {
        match &self.scheduler {
            Some(scheduler) => scheduler.refresh_all(),
            None => warn!("refresh requested after shutdown"),
        }
    }

    pub fn seed(&mut self) {
        if self.seed_rx.is_some() {
            return;
        }

        let (tx, rx) = mpsc::channel();
        let api = Arc::clone(&self.api);
        thread::spawn(move || {
            let _ = tx.send(api.seed());
        });

        info!("seeding sample data");
        self.seed_rx = Some(rx);
    }

    fn poll_seed(&mut self) {
        let Some(rx) = self.seed_rx.take() else {
            return;
        };

        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => {
                self.seed_rx = Some(rx);
                return;
            }
            Err(TryRecvError::Disconnected) => Err(FetchError::WorkerGone("seed")),
        };

        self.finish_seed(result);
    }

    fn finish_seed(&mut self, result: Result<SeedResponse, FetchError>) {
        match result {
            Ok(response) => {
                let message = response.summary();
                info!(%message, "seed finished");
                self.notices.push_back(Notice {
                    kind: NoticeKind::Info,
                    message,
                });
                self.refresh();
            }
            Err(error) => {
                warn!(%error, "seed failed");
                self.notices.push_back(Notice {
                    kind: NoticeKind::Error,
                    message: format!("Seeding sample data failed: {error}"),
                });
            }
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.shutdown();
        }
        self.seed_rx = None;
    }
}
