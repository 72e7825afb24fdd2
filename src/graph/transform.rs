use eframe::egui::{Pos2, Rect, Vec2, pos2};

use super::layout::CanvasSize;

/// 2D affine map `p -> (a*x + c*y + tx, b*x + d*y + ty)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    tx: f32,
    ty: f32,
}

impl Affine2 {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn translate(offset: Vec2) -> Self {
        Self {
            tx: offset.x,
            ty: offset.y,
            ..Self::IDENTITY
        }
    }

    pub fn scale(factor: f32) -> Self {
        Self {
            a: factor,
            d: factor,
            ..Self::IDENTITY
        }
    }

    pub fn then(self, next: Self) -> Self {
        Self {
            a: next.a * self.a + next.c * self.b,
            b: next.b * self.a + next.d * self.b,
            c: next.a * self.c + next.c * self.d,
            d: next.b * self.c + next.d * self.d,
            tx: next.a * self.tx + next.c * self.ty + next.tx,
            ty: next.b * self.tx + next.d * self.ty + next.ty,
        }
    }

    pub fn apply(&self, point: Pos2) -> Pos2 {
        pos2(
            self.a * point.x + self.c * point.y + self.tx,
            self.b * point.x + self.d * point.y + self.ty,
        )
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() <= f32::EPSILON {
            return None;
        }

        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Self {
            a,
            b,
            c,
            d,
            tx: -(a * self.tx + c * self.ty),
            ty: -(b * self.tx + d * self.ty),
        })
    }

    pub fn uniform_scale(&self) -> f32 {
        self.determinant().abs().sqrt()
    }
}

/// Maps between pointer (screen) space and the fixed logical canvas.
///
/// Built from the forward canvas-to-screen matrix; construction fails when
/// that matrix is singular, so a value of this type is always invertible.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenToCanvasTransform {
    canvas_to_screen: Affine2,
    screen_to_canvas: Affine2,
}

impl ScreenToCanvasTransform {
    pub fn new(canvas_to_screen: Affine2) -> Option<Self> {
        let screen_to_canvas = canvas_to_screen.inverse()?;
        Some(Self {
            canvas_to_screen,
            screen_to_canvas,
        })
    }

    /// Fits `canvas` into `viewport`, then applies pan and zoom around the
    /// viewport centre. `pixels_per_point` converts canvas points into the
    /// unit the pointer reports; pass `1.0` when pointer and viewport share
    /// units.
    pub fn for_viewport(
        viewport: Rect,
        canvas: CanvasSize,
        pan: Vec2,
        zoom: f32,
        pixels_per_point: f32,
    ) -> Option<Self> {
        let fit = fit_scale(viewport, canvas);
        let forward = Affine2::translate(-canvas.center().to_vec2())
            .then(Affine2::scale(fit * zoom))
            .then(Affine2::translate(viewport.center().to_vec2() + pan))
            .then(Affine2::scale(pixels_per_point));
        Self::new(forward)
    }

    pub fn canvas_to_screen(&self, point: Pos2) -> Pos2 {
        self.canvas_to_screen.apply(point)
    }

    pub fn screen_to_canvas(&self, point: Pos2) -> Pos2 {
        self.screen_to_canvas.apply(point)
    }

    pub fn scale(&self) -> f32 {
        self.canvas_to_screen.uniform_scale()
    }
}

fn fit_scale(viewport: Rect, canvas: CanvasSize) -> f32 {
    if canvas.width <= 0.0 || canvas.height <= 0.0 {
        return 1.0;
    }

    let fit = (viewport.width() / canvas.width).min(viewport.height() / canvas.height);
    if fit.is_finite() && fit > 0.0 { fit } else { 1.0 }
}
