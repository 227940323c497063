//! Rendering adapter: renderer-agnostic interface plus the pieces of the
//! sketch pipeline that do not need a GPU.
//!
//! # Invariants
//! - Renderers read the scene; they never add or remove nodes.
//! - Off-screen target sizes and resolution uniforms change together, through
//!   [`TargetExtent::resize`].
//! - The CPU functions in [`sketch`] match the pencil shader term for term.

mod renderer;
pub mod sketch;
mod targets;

pub use renderer::{DebugTextRenderer, RenderView, Renderer};
pub use sketch::{FogSettings, NoiseTexture, SketchSettings, Stroke};
pub use targets::{SketchUniforms, TargetExtent};

pub fn crate_info() -> &'static str {
    "sketchflight-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
