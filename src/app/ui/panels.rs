use eframe::egui::{self, Align, Color32, Context, Layout, RichText, Vec2};

use crate::api::{DataFetcher, NoticeKind};
use crate::graph::GraphEngine;
use crate::util::count_label;

use super::super::{PanelActions, ViewModel};

impl ViewModel {
    pub(in crate::app) const INITIAL_DOCUMENT_ROWS: usize = 25;
    pub(in crate::app) const DOCUMENT_PAGE_ROWS: usize = 25;

    pub(in crate::app) fn new(engine: GraphEngine) -> Self {
        Self {
            engine,
            pan: Vec2::ZERO,
            zoom: 1.0,
            search: String::new(),
            search_match_cache: None,
            notice: None,
            document_rows_visible: Self::INITIAL_DOCUMENT_ROWS,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        api_url: &str,
        fetcher: &DataFetcher,
        now: f64,
    ) -> PanelActions {
        let mut actions = PanelActions::default();
        if self.notice.as_ref().is_some_and(|notice| notice.expires_at <= now) {
            self.notice = None;
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("BrainVault Graph");
                    ui.separator();
                    ui.label(format!("api: {api_url}"));

                    let snapshot = fetcher.snapshot();
                    match snapshot.stats {
                        Some(stats) => {
                            ui.label(count_label(stats.documents, "document", "documents"));
                            ui.label(count_label(stats.entities, "entity", "entities"));
                            ui.label(count_label(
                                stats.relationships,
                                "relationship",
                                "relationships",
                            ));
                        }
                        None => {
                            ui.label("stats: loading...");
                        }
                    }

                    if fetcher.is_degraded() {
                        ui.label(
                            RichText::new("offline, showing last data")
                                .color(Color32::from_rgb(240, 170, 90)),
                        )
                        .on_hover_text("The latest poll failed. Retrying on the next interval.");
                    }

                    actions.refresh |= ui.button("Refresh").clicked();

                    let seeding = fetcher.is_seeding();
                    let seed_label = if seeding { "Seeding..." } else { "Seed sample data" };
                    actions.seed |= ui
                        .add_enabled(!seeding, egui::Button::new(seed_label))
                        .on_hover_text("Ingest the sample documents into the knowledge base.")
                        .clicked();

                    let pinned = self.engine.positions().len();
                    if ui
                        .add_enabled(pinned > 0, egui::Button::new("Reset layout"))
                        .on_hover_text("Drop every dragged position and return to the grid.")
                        .clicked()
                    {
                        self.engine.reset_all_positions();
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(active) = &self.notice {
                            let color = match active.notice.kind {
                                NoticeKind::Info => Color32::from_rgb(130, 210, 150),
                                NoticeKind::Error => Color32::from_rgb(240, 110, 100),
                            };
                            ui.label(RichText::new(active.notice.message.as_str()).color(color));
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui, fetcher));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));

        actions
    }
}
