use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, pos2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::{NODE_RADIUS, VisualNode};

use super::super::highlight::build_highlight_state;
use super::super::render_utils::{
    blend_color, circle_visible, dim_color, draw_arrow_head, draw_background, draw_canvas_frame,
    edge_visible,
};
use super::super::{SearchMatchCache, ViewModel};

const EDGE_LABEL_MIN_SCALE: f32 = 1.3;

pub(in crate::app) fn fuzzy_match_score(
    matcher: &SkimMatcherV2,
    node: &VisualNode,
    query: &str,
) -> Option<i64> {
    [
        Some(node.display_name.as_str()),
        node.entity.property("name"),
        Some(node.id()),
    ]
    .into_iter()
    .flatten()
    .filter_map(|text| matcher.fuzzy_match(text, query))
    .max()
}

impl ViewModel {
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let revision = self.engine.scene_revision();
        if let Some(cached) = &self.search_match_cache
            && cached.scene_revision == revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        let matches = self
            .engine
            .scene()
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| fuzzy_match_score(&matcher, node, query).is_some())
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            scene_revision: revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        let Some(transform) = self.canvas_transform(rect) else {
            self.engine.teardown();
            return;
        };

        let canvas = self.engine.canvas();
        let canvas_frame = Rect::from_two_pos(
            transform.canvas_to_screen(Pos2::ZERO),
            transform.canvas_to_screen(pos2(canvas.width, canvas.height)),
        );
        draw_background(&painter, rect, canvas_frame.min, transform.scale());
        draw_canvas_frame(&painter, canvas_frame);

        self.handle_node_drag(ui, rect, &response, &transform);

        if self.engine.scene().is_empty() {
            self.update_hover_cursor(ui, false);
            painter.text(
                rect.center() - vec2(0.0, 12.0),
                Align2::CENTER_CENTER,
                "The knowledge graph is empty",
                FontId::proportional(18.0),
                Color32::from_gray(220),
            );
            painter.text(
                rect.center() + vec2(0.0, 14.0),
                Align2::CENTER_CENTER,
                "Use \"Seed sample data\" to load a demo knowledge base.",
                FontId::proportional(13.0),
                Color32::from_gray(150),
            );
            return;
        }

        let search_matches = self.cached_search_matches();
        let scene = self.engine.scene();
        let scale = transform.scale();
        let radius = NODE_RADIUS * scale;

        let screen_positions = scene
            .nodes()
            .iter()
            .map(|node| transform.canvas_to_screen(node.position))
            .collect::<Vec<_>>();

        let hovered = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer))
            .and_then(|pointer| scene.node_at(transform.screen_to_canvas(pointer), NODE_RADIUS))
            .and_then(|node| scene.index_of(node.id()));
        let dragged = self
            .engine
            .interaction()
            .dragged_id()
            .and_then(|id| scene.index_of(id));

        let highlight = self
            .engine
            .interaction()
            .selected_id()
            .and_then(|id| build_highlight_state(scene, id));
        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        let zoom_sqrt = scale.sqrt();
        let show_edge_labels = scale >= EDGE_LABEL_MIN_SCALE;
        for edge in scene.edges() {
            let start = screen_positions[edge.source];
            let end = screen_positions[edge.target];
            if !edge_visible(rect, start, end, 2.5) {
                continue;
            }

            let is_related = highlight
                .as_ref()
                .is_some_and(|state| state.is_related_edge(edge.source, edge.target));
            let (line_width, line_color) = if is_related {
                (
                    (2.4 * zoom_sqrt).clamp(1.2, 4.4),
                    Color32::from_rgb(241, 146, 94),
                )
            } else if highlight.is_some() {
                (
                    (0.9 * zoom_sqrt).clamp(0.5, 2.0),
                    Color32::from_rgba_unmultiplied(80, 90, 104, 130),
                )
            } else {
                (
                    (1.2 * zoom_sqrt).clamp(0.6, 3.0),
                    Color32::from_rgba_unmultiplied(128, 138, 150, 190),
                )
            };

            painter.line_segment([start, end], Stroke::new(line_width, line_color));
            draw_arrow_head(
                &painter,
                start,
                end,
                radius + 1.0,
                (7.0 * zoom_sqrt).clamp(4.0, 12.0),
                line_color,
            );

            if show_edge_labels || is_related {
                painter.text(
                    start + (end - start) * 0.5,
                    Align2::CENTER_BOTTOM,
                    edge.relationship.rel_type.as_str(),
                    FontId::proportional(10.5),
                    Color32::from_gray(if is_related { 230 } else { 165 }),
                );
            }
        }

        let selected_color = Color32::from_rgb(245, 206, 93);
        let mut selection_animating = false;

        for (index, node) in scene.nodes().iter().enumerate() {
            let position = screen_positions[index];
            if !circle_visible(rect, position, radius + 40.0) {
                continue;
            }

            let is_selected = highlight.as_ref().is_some_and(|state| state.selected == index);
            let is_hovered = hovered == Some(index) || dragged == Some(index);
            let is_related = highlight
                .as_ref()
                .is_some_and(|state| state.related_nodes.contains(&index));
            let is_search_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let base_color = node.kind.fill();
            let unselected_color = if is_hovered {
                blend_color(base_color, Color32::WHITE, 0.35)
            } else if is_related {
                blend_color(base_color, Color32::from_rgb(246, 137, 92), 0.45)
            } else if is_search_match {
                blend_color(base_color, Color32::from_rgb(103, 196, 255), 0.55)
            } else if highlight.is_some() {
                dim_color(base_color, 0.52)
            } else if search_active {
                dim_color(base_color, 0.38)
            } else {
                base_color
            };

            let selection_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("node-selection", node.id())),
                is_selected,
            );
            if selection_mix > 0.0 && selection_mix < 1.0 {
                selection_animating = true;
            }
            let color = blend_color(unselected_color, selected_color, selection_mix * 0.4);

            painter.circle_filled(position, radius, color);
            if selection_mix > 0.0 {
                let halo_alpha = (60.0 + selection_mix * 140.0) as u8;
                painter.circle_stroke(
                    position,
                    radius + 4.0 + ((1.0 - selection_mix) * 6.0),
                    Stroke::new(
                        1.0 + selection_mix,
                        Color32::from_rgba_unmultiplied(245, 206, 93, halo_alpha),
                    ),
                );
            }

            let stroke_width = if is_search_match { 1.6 } else { 1.0 } + (selection_mix * 1.2);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(
                    stroke_width,
                    Color32::from_rgba_unmultiplied(15, 15, 15, 190),
                ),
            );

            if self.engine.positions().is_pinned(node.id()) {
                painter.circle_filled(
                    position + vec2(radius * 0.7, -radius * 0.7),
                    (radius * 0.18).clamp(2.0, 4.0),
                    Color32::from_gray(235),
                );
            }

            painter.text(
                position + vec2(0.0, radius + 4.0),
                Align2::CENTER_TOP,
                node.display_name.as_str(),
                FontId::proportional((11.0 * zoom_sqrt).clamp(9.0, 16.0)),
                Color32::from_gray(if highlight.is_some() && !is_selected && !is_related {
                    150
                } else {
                    236
                }),
            );
        }

        if let Some(index) = hovered {
            let node = &scene.nodes()[index];
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{}  |  {}  |  {}", node.display_name, node.entity.label, node.id()),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if selection_animating || self.engine.interaction().is_dragging() {
            ui.ctx().request_repaint();
        }
        self.update_hover_cursor(ui, hovered.is_some());
    }
}
