//! Streaming: procedural terrain and clouds around a moving leader.
//!
//! # Invariants
//! - Height is a pure function of world coordinates, so chunk seams match.
//! - Chunks form a gapless strip; each new origin is the previous origin plus
//!   `chunk_size - overlap`.
//! - Chunks and clouds are retired strictly front-first once they fall more
//!   than their retire distance behind the leader. The two windows are checked
//!   independently.
//! - Cloud positions are derived from elapsed time, never integrated.

mod clouds;
mod heightfield;
mod stats;
mod terrain;

pub use clouds::{Cloud, CloudConfig, CloudField, CloudId, CloudPart};
pub use heightfield::{HeightField, HeightFieldParams, SineTerm, Valley, ValleyWave};
pub use stats::{FrameTimer, StreamStats};
pub use terrain::{StreamUpdate, TerrainChunk, TerrainConfig, TerrainStreamer};

pub fn crate_info() -> &'static str {
    "sketchflight-stream v0.1.0"
}
