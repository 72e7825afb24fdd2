use std::collections::HashMap;

use eframe::egui::{self, RichText, Sense, Ui, vec2};
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::api::DataFetcher;
use crate::graph::NodeKind;
use crate::util::{single_line, truncate_label};

use super::super::ViewModel;
use super::super::graph::fuzzy_match_score;

const SEARCH_RESULT_LIMIT: usize = 12;
const DOCUMENT_PREVIEW_CHARS: usize = 72;
const DOCUMENT_PREFETCH_MARGIN: usize = 4;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui, fetcher: &DataFetcher) {
        ui.heading("Explore");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search entities")
            .on_hover_text("Fuzzy-highlight matching nodes without changing the rendered graph.");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Matches display names, full names and ids.");
        self.draw_search_results(ui);

        ui.separator();
        self.draw_legend(ui);

        ui.separator();
        self.draw_documents(ui, fetcher);
    }

    fn draw_search_results(&mut self, ui: &mut Ui) {
        let query = self.search.trim();
        if query.is_empty() {
            return;
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        let mut results = self
            .engine
            .scene()
            .nodes()
            .iter()
            .filter_map(|node| {
                fuzzy_match_score(&matcher, node, query)
                    .map(|score| (score, node.id().to_owned(), node.display_name.clone()))
            })
            .collect::<Vec<_>>();
        results.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        if results.is_empty() {
            ui.small("No entities match.");
            return;
        }

        let total = results.len();
        let mut picked = None;
        for (_, id, display_name) in results.into_iter().take(SEARCH_RESULT_LIMIT) {
            if ui.link(display_name).on_hover_text(id.as_str()).clicked() {
                picked = Some(id);
            }
        }
        if total > SEARCH_RESULT_LIMIT {
            ui.small(format!("and {} more", total - SEARCH_RESULT_LIMIT));
        }

        if picked.is_some() {
            self.engine.select(picked);
        }
    }

    fn draw_legend(&self, ui: &mut Ui) {
        ui.label(RichText::new("Entity kinds").strong());

        let mut counts = HashMap::new();
        for node in self.engine.scene().nodes() {
            *counts.entry(node.kind).or_insert(0usize) += 1;
        }

        egui::Grid::new("kind_legend")
            .num_columns(2)
            .spacing(vec2(12.0, 4.0))
            .show(ui, |ui| {
                for kind in NodeKind::ALL {
                    let count = counts.get(&kind).copied().unwrap_or(0);
                    if count == 0 && kind == NodeKind::Other {
                        continue;
                    }
                    ui.horizontal(|ui| {
                        let (rect, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
                        ui.painter().circle_filled(rect.center(), 5.5, kind.fill());
                        ui.label(kind.label());
                    });
                    ui.label(count.to_string());
                    ui.end_row();
                }
            });
    }

    fn draw_documents(&mut self, ui: &mut Ui, fetcher: &DataFetcher) {
        let Some(list) = &fetcher.snapshot().documents else {
            ui.label(RichText::new("Documents").strong());
            ui.spinner();
            return;
        };

        ui.label(RichText::new(format!("Documents ({})", list.count)).strong());
        if list.documents.is_empty() {
            ui.label("No documents ingested yet.");
            return;
        }

        let row_count = list.documents.len().min(self.document_rows_visible);
        let mut should_load_more = false;
        let mut picked = None;

        egui::ScrollArea::vertical()
            .id_salt("documents_scroll")
            .auto_shrink([false, false])
            .show_rows(ui, 38.0, row_count, |ui, row_range| {
                if row_range.end + DOCUMENT_PREFETCH_MARGIN >= row_count {
                    should_load_more = true;
                }

                for document in &list.documents[row_range] {
                    let preview = document
                        .content
                        .as_deref()
                        .map(|content| truncate_label(&single_line(content), DOCUMENT_PREVIEW_CHARS))
                        .unwrap_or_default();

                    ui.vertical(|ui| {
                        if self.engine.scene().index_of(&document.doc_id).is_some() {
                            if ui.link(document.doc_id.as_str()).clicked() {
                                picked = Some(document.doc_id.clone());
                            }
                        } else {
                            ui.label(RichText::new(document.doc_id.as_str()).strong());
                        }
                        ui.small(preview);
                    });
                }
            });

        if should_load_more && row_count < list.documents.len() {
            self.document_rows_visible =
                (row_count + Self::DOCUMENT_PAGE_ROWS).min(list.documents.len());
        }
        if picked.is_some() {
            self.engine.select(picked);
        }
    }
}
