//! The two per-frame render passes.

mod depth_map;
mod draw_objects;

pub use depth_map::{DepthMapPass, ShadowSettings};
pub use draw_objects::DrawObjectsPass;

/// Observable progress of a pass through its `draw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassState {
    /// Not inside `draw`.
    #[default]
    Idle,
    /// Depth pass is issuing geometry.
    Rendering,
    /// Objects pass is binding targets and building the frame context.
    Preparing,
    /// Objects pass is issuing model draws.
    Drawing,
}
