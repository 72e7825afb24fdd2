use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::client::GraphApi;
use super::error::FetchError;
use super::model::{DocumentList, GraphData, KnowledgeStats};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Graph,
    Stats,
    Documents,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Graph, Resource::Stats, Resource::Documents];

    pub fn label(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Stats => "stats",
            Self::Documents => "documents",
        }
    }

    fn fetch(self, api: &dyn GraphApi) -> Result<Payload, FetchError> {
        match self {
            Self::Graph => api.fetch_graph().map(Payload::Graph),
            Self::Stats => api.fetch_stats().map(Payload::Stats),
            Self::Documents => api.fetch_documents().map(Payload::Documents),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollIntervals {
    pub graph: Duration,
    pub stats: Duration,
    pub documents: Duration,
}

impl PollIntervals {
    pub fn for_resource(&self, resource: Resource) -> Duration {
        match resource {
            Resource::Graph => self.graph,
            Resource::Stats => self.stats,
            Resource::Documents => self.documents,
        }
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            graph: Duration::from_secs(5),
            stats: Duration::from_secs(5),
            documents: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub enum Payload {
    Graph(GraphData),
    Stats(KnowledgeStats),
    Documents(DocumentList),
}

#[derive(Debug)]
pub struct FetchUpdate {
    pub resource: Resource,
    pub result: Result<Payload, FetchError>,
}

enum Control {
    Refresh,
    Stop,
}

struct PollTask {
    resource: Resource,
    control: Sender<Control>,
}

/// Three independent repeating fetches, one worker thread each.
///
/// Results are funnelled into a single channel so the owner can apply them
/// on its own thread. Dropping the scheduler stops every worker.
pub struct PollScheduler {
    tasks: Vec<PollTask>,
    updates: Receiver<FetchUpdate>,
}

impl PollScheduler {
    pub fn start(api: Arc<dyn GraphApi>, intervals: PollIntervals) -> Self {
        let (update_tx, updates) = mpsc::channel();

        let tasks = Resource::ALL
            .iter()
            .map(|&resource| {
                let (control, control_rx) = mpsc::channel();
                let api = Arc::clone(&api);
                let update_tx = update_tx.clone();
                let interval = intervals.for_resource(resource);

                thread::spawn(move || run_task(resource, interval, api, update_tx, control_rx));

                PollTask { resource, control }
            })
            .collect();

        Self { tasks, updates }
    }

    pub fn refresh_all(&self) {
        for task in &self.tasks {
            if task.control.send(Control::Refresh).is_err() {
                warn!(resource = task.resource.label(), "poll worker is gone; refresh skipped");
            }
        }
    }

    pub fn try_next(&self) -> Option<FetchUpdate> {
        self.updates.try_recv().ok()
    }

    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            let _ = task.control.send(Control::Stop);
            debug!(resource = task.resource.label(), "poll task cancelled");
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_task(
    resource: Resource,
    interval: Duration,
    api: Arc<dyn GraphApi>,
    updates: Sender<FetchUpdate>,
    control: Receiver<Control>,
) {
    loop {
        let result = resource.fetch(api.as_ref());
        if updates.send(FetchUpdate { resource, result }).is_err() {
            break;
        }

        match control.recv_timeout(interval) {
            Ok(Control::Refresh) => {
                if !coalesce_refreshes(&control) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!(resource = resource.label(), "poll worker exited");
}

/// Swallows refreshes queued behind the one being served. Returns `false`
/// once the task was told to stop.
fn coalesce_refreshes(control: &Receiver<Control>) -> bool {
    loop {
        match control.try_recv() {
            Ok(Control::Refresh) => continue,
            Err(TryRecvError::Empty) => return true,
            Ok(Control::Stop) | Err(TryRecvError::Disconnected) => return false,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use super::*;
    use crate::api::model::{Entity, SeedResponse};

    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub graph: Mutex<GraphData>,
        pub fail_graph: Mutex<bool>,
        pub fail_seed: Mutex<bool>,
        pub graph_calls: AtomicUsize,
        pub stats_calls: AtomicUsize,
        pub documents_calls: AtomicUsize,
        pub seed_calls: AtomicUsize,
    }

    impl FakeApi {
        pub(crate) fn with_entities(ids: &[&str]) -> Self {
            let api = Self::default();
            *api.graph.lock().expect("graph lock") = GraphData {
                entities: ids
                    .iter()
                    .map(|id| Entity {
                        id: (*id).to_owned(),
                        label: "Document".to_owned(),
                        properties: Default::default(),
                    })
                    .collect(),
                relationships: Vec::new(),
            };
            api
        }
    }

    fn unavailable(path: &str) -> FetchError {
        FetchError::Status {
            url: format!("http://fake{path}"),
            status: 503,
        }
    }

    impl GraphApi for FakeApi {
        fn fetch_graph(&self) -> Result<GraphData, FetchError> {
            self.graph_calls.fetch_add(1, Ordering::SeqCst);
            if *self.fail_graph.lock().expect("fail lock") {
                return Err(unavailable("/api/graph/data"));
            }
            Ok(self.graph.lock().expect("graph lock").clone())
        }

        fn fetch_stats(&self) -> Result<KnowledgeStats, FetchError> {
            self.stats_calls.fetch_add(1, Ordering::SeqCst);
            let graph = self.graph.lock().expect("graph lock");
            Ok(KnowledgeStats {
                documents: 0,
                entities: graph.entities.len() as u64,
                relationships: graph.relationships.len() as u64,
            })
        }

        fn fetch_documents(&self) -> Result<DocumentList, FetchError> {
            self.documents_calls.fetch_add(1, Ordering::SeqCst);
            Ok(DocumentList::default())
        }

        fn seed(&self) -> Result<SeedResponse, FetchError> {
            self.seed_calls.fetch_add(1, Ordering::SeqCst);
            if *self.fail_seed.lock().expect("fail lock") {
                return Err(unavailable("/api/knowledge/seed"));
            }
            Ok(SeedResponse {
                status: Some("seeded".to_owned()),
                documents_ingested: Some(8),
                message: None,
            })
        }
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn slow_intervals() -> PollIntervals {
        PollIntervals {
            graph: Duration::from_secs(3600),
            stats: Duration::from_secs(3600),
            documents: Duration::from_secs(3600),
        }
    }

    #[test]
    fn every_resource_is_fetched_immediately() {
        let api = Arc::new(FakeApi::with_entities(&["a"]));
        let scheduler = PollScheduler::start(api.clone(), slow_intervals());

        let mut seen = Vec::new();
        assert!(wait_for(|| {
            while let Some(update) = scheduler.try_next() {
                assert!(update.result.is_ok());
                seen.push(update.resource);
            }
            seen.len() == 3
        }));
        assert!(seen.contains(&Resource::Graph));
        assert!(seen.contains(&Resource::Stats));
        assert!(seen.contains(&Resource::Documents));
    }

    #[test]
    fn refresh_all_fetches_out_of_band() {
        let api = Arc::new(FakeApi::default());
        let scheduler = PollScheduler::start(api.clone(), slow_intervals());
        assert!(wait_for(|| api.graph_calls.load(Ordering::SeqCst) == 1));

        scheduler.refresh_all();
        assert!(wait_for(|| {
            api.graph_calls.load(Ordering::SeqCst) == 2
                && api.stats_calls.load(Ordering::SeqCst) == 2
                && api.documents_calls.load(Ordering::SeqCst) == 2
        }));
    }

    #[test]
    fn queued_refreshes_collapse_into_one() {
        let (control, control_rx) = mpsc::channel();
        for _ in 0..4 {
            control.send(Control::Refresh).expect("send");
        }
        assert!(coalesce_refreshes(&control_rx));
        assert!(control_rx.try_recv().is_err());

        control.send(Control::Refresh).expect("send");
        control.send(Control::Stop).expect("send");
        assert!(!coalesce_refreshes(&control_rx));

        drop(control);
        assert!(!coalesce_refreshes(&control_rx));
    }

    #[test]
    fn repeated_refresh_clicks_do_not_queue_fetches() {
        let api = Arc::new(FakeApi::default());
        let scheduler = PollScheduler::start(api.clone(), slow_intervals());
        assert!(wait_for(|| api.graph_calls.load(Ordering::SeqCst) == 1));

        for _ in 0..10 {
            scheduler.refresh_all();
        }
        assert!(wait_for(|| api.graph_calls.load(Ordering::SeqCst) >= 2));
        thread::sleep(Duration::from_millis(100));
        assert!(api.graph_calls.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn shutdown_stops_all_workers() {
        let api = Arc::new(FakeApi::default());
        let fast = PollIntervals {
            graph: Duration::from_millis(5),
            stats: Duration::from_millis(5),
            documents: Duration::from_millis(5),
        };
        let mut scheduler = PollScheduler::start(api.clone(), fast);
        assert!(wait_for(|| api.graph_calls.load(Ordering::SeqCst) >= 3));

        scheduler.shutdown();
        assert!(scheduler.tasks.is_empty());
        thread::sleep(Duration::from_millis(50));
        let settled = api.graph_calls.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(api.graph_calls.load(Ordering::SeqCst), settled);
    }

    #[test]
    fn default_intervals_match_api_cadence() {
        let intervals = PollIntervals::default();
        assert_eq!(intervals.for_resource(Resource::Graph), Duration::from_secs(5));
        assert_eq!(intervals.for_resource(Resource::Stats), Duration::from_secs(5));
        assert_eq!(
            intervals.for_resource(Resource::Documents),
            Duration::from_secs(10)
        );
    }
}
