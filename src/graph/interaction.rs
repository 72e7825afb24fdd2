use eframe::egui::Pos2;
use tracing::{debug, trace};

use super::position::PositionStore;
use super::scene::{NODE_RADIUS, Scene};
use super::transform::ScreenToCanvasTransform;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        id: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PointerDown {
    Node(String),
    Empty,
}

/// Drag and selection state machine: `Idle -> Dragging -> Idle`.
///
/// The host only forwards pointer moves and releases while
/// [`wants_pointer_capture`](Self::wants_pointer_capture) is true.
#[derive(Clone, Debug, Default)]
pub struct InteractionController {
    state: DragState,
    selected: Option<String>,
}

impl InteractionController {
    pub fn dragged_id(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { id } => Some(id),
            DragState::Idle => None,
        }
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn wants_pointer_capture(&self) -> bool {
        self.is_dragging()
    }

    pub fn pointer_down(
        &mut self,
        screen: Pos2,
        transform: &ScreenToCanvasTransform,
        scene: &Scene,
    ) -> PointerDown {
        let canvas = transform.screen_to_canvas(screen);
        let Some(node) = scene.node_at(canvas, NODE_RADIUS) else {
            self.state = DragState::Idle;
            self.deselect();
            return PointerDown::Empty;
        };

        let id = node.id().to_owned();
        debug!(%id, "drag started");
        self.selected = Some(id.clone());
        self.state = DragState::Dragging { id: id.clone() };
        PointerDown::Node(id)
    }

    pub fn pointer_move(
        &mut self,
        screen: Pos2,
        transform: &ScreenToCanvasTransform,
        store: &mut PositionStore,
    ) -> bool {
        let DragState::Dragging { id } = &self.state else {
            return false;
        };

        let canvas = transform.screen_to_canvas(screen);
        trace!(%id, x = canvas.x, y = canvas.y, "drag move");
        store.set_override(id, canvas);
        true
    }

    pub fn pointer_up(&mut self) {
        if let DragState::Dragging { id } = std::mem::take(&mut self.state) {
            debug!(%id, "drag finished");
        }
    }

    pub fn cancel(&mut self) {
        if let DragState::Dragging { id } = std::mem::take(&mut self.state) {
            debug!(%id, "drag cancelled");
        }
    }

    pub fn select(&mut self, id: Option<String>) {
        self.selected = id;
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn retain(&mut self, present: impl Fn(&str) -> bool) {
        if self.dragged_id().is_some_and(|id| !present(id)) {
            self.cancel();
        }
        if self.selected_id().is_some_and(|id| !present(id)) {
            self.deselect();
        }
    }

    pub fn teardown(&mut self) {
        if self.is_dragging() {
            debug!("interaction torn down mid-drag");
        }
        self.state = DragState::Idle;
    }
}
