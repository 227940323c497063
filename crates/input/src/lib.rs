//! Input: host events mapped to a small action vocabulary.
//!
//! # Invariants
//! - The session consumes actions, never raw window events.
//! - "Begin climb" is delivered at most once per session.

pub mod action;
mod trigger;

pub use action::{Action, Key};
pub use trigger::ClimbTrigger;
