mod engine;
mod interaction;
mod layout;
mod position;
mod scene;
mod transform;

pub use engine::GraphEngine;
pub use layout::CanvasSize;
pub use scene::{NODE_RADIUS, NodeKind, Scene, VisualNode};
pub use transform::ScreenToCanvasTransform;
