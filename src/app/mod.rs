use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{Context, Vec2};

use crate::api::{DataFetcher, Notice};
use crate::config::Config;
use crate::graph::GraphEngine;

mod graph;
mod highlight;
mod render_utils;
mod ui;

const REPAINT_INTERVAL: Duration = Duration::from_millis(250);
const NOTICE_SECS: f64 = 6.0;

pub struct KnowledgeGraphApp {
    api_url: String,
    fetcher: DataFetcher,
    synced_graph_revision: u64,
    model: ViewModel,
}

struct ViewModel {
    engine: GraphEngine,
    pan: Vec2,
    zoom: f32,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    notice: Option<ActiveNotice>,
    document_rows_visible: usize,
}

struct SearchMatchCache {
    query: String,
    scene_revision: u64,
    matches: Arc<HashSet<usize>>,
}

struct ActiveNotice {
    notice: Notice,
    expires_at: f64,
}

#[derive(Clone, Copy, Debug, Default)]
struct PanelActions {
    refresh: bool,
    seed: bool,
}

impl KnowledgeGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: &Config, fetcher: DataFetcher) -> Self {
        Self {
            api_url: config.api_url.clone(),
            fetcher,
            synced_graph_revision: 0,
            model: ViewModel::new(GraphEngine::new(config.canvas, config.canvas_padding)),
        }
    }

    fn pump_fetcher(&mut self, now: f64) {
        self.fetcher.poll();
        let snapshot = self.fetcher.snapshot();
        if snapshot.graph_revision != self.synced_graph_revision {
            self.synced_graph_revision = snapshot.graph_revision;
            self.model.engine.sync(Arc::clone(&snapshot.graph));
        }

        while let Some(notice) = self.fetcher.take_notice() {
            self.model.notice = Some(ActiveNotice {
                notice,
                expires_at: now + NOTICE_SECS,
            });
        }
    }
}

impl eframe::App for KnowledgeGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|input| input.time);
        self.pump_fetcher(now);

        let actions = self.model.show(ctx, &self.api_url, &self.fetcher, now);

        if actions.refresh {
            self.fetcher.refresh();
        }
        if actions.seed {
            self.fetcher.seed();
        }

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}

impl Drop for KnowledgeGraphApp {
    fn drop(&mut self) {
        self.fetcher.shutdown();
        self.model.engine.teardown();
    }
}
