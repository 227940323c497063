//! Scene registry shared by the streaming, flight and render crates.
//!
//! Every component receives an explicit `&mut SceneGraph` instead of closing
//! over a global scene. The registry owns CPU-side geometry and material
//! descriptions; GPU backends mirror them by draining `SceneEvent`s.
//!
//! # Invariants
//! - Ids are allocated from one monotonic counter and never reused.
//! - Iteration order is deterministic (BTreeMap keyed by id = creation order).
//! - Geometry still referenced by a node cannot be released.
//! - At most one change is pending per object; an add followed by a release
//!   before the next drain leaves nothing behind.
//! - A material override is always undone when its guard goes out of scope.

mod graph;
mod material;
mod mesh;

pub use graph::{
    GeometryBudget, GeometryId, MaterialId, MaterialOverride, NodeId, NodeKind, SceneError,
    SceneEvent, SceneGraph, SceneNode,
};
pub use material::{Material, SkyGradient, TerrainPalette, rgb};
pub use mesh::MeshData;
