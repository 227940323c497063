//! Flight: leader motion, camera placement and the foreground formation.
//!
//! # Invariants
//! - Every position is a pure function of absolute time and the climb trigger
//!   time. Nothing is integrated frame over frame.
//! - Cruise -> Climbing happens at most once and never reverses.
//! - Leader Z before the trigger is unaffected by the trigger.

mod controller;
mod formation;
mod rig;

pub use controller::{FlightConfig, FlightController, FlightMode};
pub use formation::{BirdPose, BirdSlot, FlapConfig, Formation, FormationConfig, WingPose};
pub use rig::{CameraConfig, CameraPose, CameraRig};

pub fn crate_info() -> &'static str {
    "sketchflight-flight v0.1.0"
}
