use std::collections::HashSet;

use crate::graph::Scene;

pub(super) struct HighlightState {
    pub(super) selected: usize,
    pub(super) related_nodes: HashSet<usize>,
}

impl HighlightState {
    pub(super) fn is_related_edge(&self, source: usize, target: usize) -> bool {
        source == self.selected || target == self.selected
    }
}

pub(super) fn build_highlight_state(scene: &Scene, selected_id: &str) -> Option<HighlightState> {
    let selected = scene.index_of(selected_id)?;
    Some(HighlightState {
        selected,
        related_nodes: scene.neighbors(selected),
    })
}
