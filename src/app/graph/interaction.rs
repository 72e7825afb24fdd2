use eframe::egui::{self, PointerButton, Rect, Ui, Vec2};

use crate::graph::ScreenToCanvasTransform;

use super::super::ViewModel;

const MIN_ZOOM: f32 = 0.2;
const MAX_ZOOM: f32 = 6.0;

impl ViewModel {
    pub(in crate::app) fn canvas_transform(&self, rect: Rect) -> Option<ScreenToCanvasTransform> {
        ScreenToCanvasTransform::for_viewport(rect, self.engine.canvas(), self.pan, self.zoom, 1.0)
    }

    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let Some(before) = self.canvas_transform(rect) else {
            return;
        };
        let anchor = before.screen_to_canvas(pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(MIN_ZOOM, MAX_ZOOM);

        // keep the canvas point under the cursor fixed
        if let Some(unpanned) = ScreenToCanvasTransform::for_viewport(
            rect,
            self.engine.canvas(),
            Vec2::ZERO,
            self.zoom,
            1.0,
        ) {
            self.pan = pointer - unpanned.canvas_to_screen(anchor);
        }
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        let dragging_node = self.engine.interaction().is_dragging();
        if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
            || (response.dragged_by(PointerButton::Primary) && !dragging_node)
        {
            self.pan += response.drag_delta();
        }
    }

    pub(in crate::app) fn handle_node_drag(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
        transform: &ScreenToCanvasTransform,
    ) {
        let (pressed, released, moving, latest, focused) = ui.input(|input| {
            (
                input.pointer.button_pressed(PointerButton::Primary),
                input.pointer.button_released(PointerButton::Primary),
                input.pointer.is_moving(),
                input.pointer.latest_pos(),
                input.focused,
            )
        });

        if pressed
            && response.hovered()
            && let Some(position) = latest.filter(|position| rect.contains(*position))
        {
            self.engine.pointer_down(position, transform);
        }

        if !self.engine.interaction().wants_pointer_capture() {
            return;
        }

        let Some(position) = latest.filter(|_| focused) else {
            self.engine.cancel_drag();
            return;
        };

        if moving {
            self.engine.pointer_move(position, transform);
        }
        if released {
            self.engine.pointer_up();
        }
    }

    pub(in crate::app) fn update_hover_cursor(&self, ui: &Ui, hovering_node: bool) {
        let icon = if self.engine.interaction().is_dragging() {
            egui::CursorIcon::Grabbing
        } else if hovering_node {
            egui::CursorIcon::Grab
        } else {
            return;
        };
        ui.output_mut(|output| output.cursor_icon = icon);
    }
}
