//! Shared types used by every sketchflight crate.
//!
//! # Invariants
//! - A `Viewport` can only be constructed with non-zero dimensions.

mod types;

pub use types::{Transform, Viewport, ViewportError};
