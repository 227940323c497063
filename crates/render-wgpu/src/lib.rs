//! wgpu render backend for sketchflight.
//!
//! Each frame runs three passes: the scene into an off-screen colour target,
//! the scene again under the normal-material override into a normal target,
//! then a full-screen pencil pass that reads both and writes the surface.
//!
//! # Invariants
//! - GPU buffers mirror the scene registry by draining its events; the
//!   renderer never adds or removes scene resources.
//! - The material override lives only for the normal pass.
//! - Off-screen targets and the pencil uniforms are resized together.

mod camera;
mod frame;
mod gpu;
mod shaders;

pub use camera::ViewCamera;
pub use frame::{DrawClass, FrameUniforms, NodeUniforms, Vertex, draw_plan, material_block};
pub use gpu::{RenderError, SketchRenderer};
