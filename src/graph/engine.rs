use std::collections::HashMap;
use std::sync::Arc;

use eframe::egui::Pos2;
use tracing::debug;

use crate::api::GraphData;

use super::interaction::{InteractionController, PointerDown};
use super::layout::{CanvasSize, GridLayout, LayoutStrategy, extend_layout};
use super::position::PositionStore;
use super::scene::{Scene, VisualNode};
use super::transform::ScreenToCanvasTransform;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub placed: usize,
    pub pruned: usize,
}

pub struct GraphEngine {
    canvas: CanvasSize,
    strategy: Box<dyn LayoutStrategy>,
    data: Arc<GraphData>,
    layout: HashMap<String, Pos2>,
    positions: PositionStore,
    interaction: InteractionController,
    scene: Scene,
    scene_revision: u64,
}

impl GraphEngine {
    pub fn new(canvas: CanvasSize, padding: f32) -> Self {
        Self::with_strategy(canvas, Box::new(GridLayout { padding }))
    }

    pub fn with_strategy(canvas: CanvasSize, strategy: Box<dyn LayoutStrategy>) -> Self {
        Self {
            canvas,
            strategy,
            data: Arc::default(),
            layout: HashMap::new(),
            positions: PositionStore::default(),
            interaction: InteractionController::default(),
            scene: Scene::default(),
            scene_revision: 0,
        }
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_revision(&self) -> u64 {
        self.scene_revision
    }

    pub fn positions(&self) -> &PositionStore {
        &self.positions
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn selected_node(&self) -> Option<&VisualNode> {
        self.interaction
            .selected_id()
            .and_then(|id| self.scene.node(id))
    }

    pub fn sync(&mut self, data: Arc<GraphData>) -> SyncReport {
        let ids = data.entity_ids();
        let placed = extend_layout(
            self.strategy.as_ref(),
            &mut self.layout,
            &ids,
            self.canvas,
            self.positions.overrides(),
        );
        let pruned = self
            .positions
            .prune_overrides(ids.iter().map(String::as_str));

        self.data = data;
        self.rebuild_scene();

        let scene = &self.scene;
        self.interaction.retain(|id| scene.index_of(id).is_some());

        debug!(
            entities = ids.len(),
            placed,
            pruned,
            edges = self.scene.edges().len(),
            "graph synced"
        );
        SyncReport { placed, pruned }
    }

    pub fn rebuild_scene(&mut self) {
        let positions = self.positions.merged(&self.layout);
        self.scene = Scene::build(&self.data.entities, &self.data.relationships, &positions);
        self.scene_revision = self.scene_revision.wrapping_add(1);
    }

    pub fn pointer_down(
        &mut self,
        screen: Pos2,
        transform: &ScreenToCanvasTransform,
    ) -> PointerDown {
        self.interaction.pointer_down(screen, transform, &self.scene)
    }

    pub fn pointer_move(&mut self, screen: Pos2, transform: &ScreenToCanvasTransform) {
        if self
            .interaction
            .pointer_move(screen, transform, &mut self.positions)
        {
            self.rebuild_scene();
        }
    }

    pub fn pointer_up(&mut self) {
        self.interaction.pointer_up();
    }

    pub fn cancel_drag(&mut self) {
        self.interaction.cancel();
    }

    pub fn select(&mut self, id: Option<String>) {
        self.interaction.select(id);
    }

    pub fn teardown(&mut self) {
        self.interaction.teardown();
    }

    pub fn reset_position(&mut self, id: &str) {
        if self.positions.clear_override(id) {
            self.rebuild_scene();
        }
    }

    pub fn reset_all_positions(&mut self) {
        if !self.positions.is_empty() {
            self.positions.clear_all();
            self.rebuild_scene();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use eframe::egui::{Rect, Vec2, pos2, vec2};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::api::{Entity, Relationship};
    use crate::graph::NODE_RADIUS;

    fn graph(ids: &[&str], links: &[(&str, &str)]) -> Arc<GraphData> {
        Arc::new(GraphData {
            entities: ids
                .iter()
                .map(|id| Entity {
                    id: (*id).to_owned(),
                    label: "Document".to_owned(),
                    properties: BTreeMap::new(),
                })
                .collect(),
            relationships: links
                .iter()
                .map(|(from, to)| Relationship {
                    from_id: (*from).to_owned(),
                    to_id: (*to).to_owned(),
                    rel_type: "MENTIONS".to_owned(),
                    properties: BTreeMap::new(),
                })
                .collect(),
        })
    }

    fn engine() -> GraphEngine {
        GraphEngine::new(CanvasSize::new(600.0, 400.0), 40.0)
    }

    fn identity(engine: &GraphEngine) -> ScreenToCanvasTransform {
        ScreenToCanvasTransform::for_viewport(
            Rect::from_min_size(Pos2::ZERO, vec2(600.0, 400.0)),
            engine.canvas(),
            Vec2::ZERO,
            1.0,
            1.0,
        )
        .expect("invertible")
    }

    fn position_of(engine: &GraphEngine, id: &str) -> Pos2 {
        engine.scene().node(id).expect("node present").position
    }

    fn drag(engine: &mut GraphEngine, id: &str, to: Pos2) {
        let transform = identity(engine);
        let from = position_of(engine, id);
        assert_eq!(
            engine.pointer_down(from, &transform),
            PointerDown::Node(id.to_owned())
        );
        engine.pointer_move(to, &transform);
        engine.pointer_up();
    }

    #[test]
    fn empty_graph_yields_empty_scene() {
        let mut engine = engine();
        let report = engine.sync(graph(&[], &[]));
        assert_eq!(report, SyncReport::default());
        assert!(engine.scene().is_empty());
        assert!(engine.scene().edges().is_empty());
        assert!(engine.selected_node().is_none());
    }

    #[test]
    fn dragged_node_keeps_position_across_refresh() {
        let mut engine = engine();
        engine.sync(graph(&["doc-1", "doc-2"], &[("doc-1", "doc-2")]));
        drag(&mut engine, "doc-1", pos2(120.0, 80.0));
        assert_eq!(position_of(&engine, "doc-1"), pos2(120.0, 80.0));

        engine.sync(graph(&["doc-1", "doc-2", "doc-3"], &[("doc-1", "doc-2")]));
        assert_eq!(position_of(&engine, "doc-1"), pos2(120.0, 80.0));
        assert_eq!(engine.selected_node().map(VisualNode::id), Some("doc-1"));
    }

    #[test]
    fn previously_placed_nodes_do_not_jump_when_new_ones_arrive() {
        let mut engine = engine();
        engine.sync(graph(&["a", "b"], &[]));
        let a = position_of(&engine, "a");
        let b = position_of(&engine, "b");

        let report = engine.sync(graph(&["a", "b", "c", "d", "e"], &[]));
        assert_eq!(report.placed, 3);
        assert_eq!(position_of(&engine, "a"), a);
        assert_eq!(position_of(&engine, "b"), b);
    }

    #[test]
    fn reordered_refresh_places_new_nodes_on_free_cells() {
        let mut engine = engine();
        engine.sync(graph(&["a"], &[]));
        engine.sync(graph(&["b", "z", "a"], &[]));

        let positions = ["a", "b", "z"].map(|id| position_of(&engine, id));
        for (index, position) in positions.iter().enumerate() {
            for other in &positions[index + 1..] {
                assert!(position.distance(*other) > NODE_RADIUS);
            }
        }
        assert_eq!(
            engine
                .scene()
                .node_at(positions[0], NODE_RADIUS)
                .map(VisualNode::id),
            Some("a")
        );
    }

    #[test]
    fn removed_node_override_is_pruned() {
        let mut engine = engine();
        engine.sync(graph(&["doc-1", "doc-2"], &[]));
        drag(&mut engine, "doc-1", pos2(120.0, 80.0));

        let report = engine.sync(graph(&["doc-2"], &[]));
        assert_eq!(report.pruned, 1);
        assert!(!engine.positions().is_pinned("doc-1"));

        engine.sync(graph(&["doc-1", "doc-2"], &[]));
        assert_ne!(position_of(&engine, "doc-1"), pos2(120.0, 80.0));
    }

    #[test]
    fn dangling_relationship_never_reaches_the_scene() {
        let mut engine = engine();
        engine.sync(graph(&["X"], &[("X", "missing")]));
        assert_eq!(engine.scene().nodes().len(), 1);
        assert!(engine.scene().edges().is_empty());
    }

    #[test]
    fn drag_of_vanished_node_is_cancelled_on_sync() {
        let mut engine = engine();
        engine.sync(graph(&["doc-1"], &[]));
        let transform = identity(&engine);
        let at = position_of(&engine, "doc-1");
        engine.pointer_down(at, &transform);
        assert!(engine.interaction().is_dragging());

        engine.sync(graph(&[], &[]));
        assert!(!engine.interaction().is_dragging());
        assert!(engine.selected_node().is_none());
    }

    #[test]
    fn reset_position_restores_layout() {
        let mut engine = engine();
        engine.sync(graph(&["doc-1"], &[]));
        let original = position_of(&engine, "doc-1");
        drag(&mut engine, "doc-1", pos2(120.0, 80.0));

        engine.reset_position("doc-1");
        assert_eq!(position_of(&engine, "doc-1"), original);

        drag(&mut engine, "doc-1", pos2(10.0, 10.0));
        engine.reset_all_positions();
        assert_eq!(position_of(&engine, "doc-1"), original);
        assert!(engine.positions().is_empty());
    }

    #[test]
    fn every_pointer_move_rebuilds_the_scene() {
        let mut engine = engine();
        engine.sync(graph(&["doc-1"], &[]));
        let revision = engine.scene_revision();
        drag(&mut engine, "doc-1", pos2(50.0, 60.0));
        assert!(engine.scene_revision() > revision);
    }
}
