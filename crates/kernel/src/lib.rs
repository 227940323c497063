//! Session kernel: configuration and the single per-frame tick that drives
//! streaming, flight, camera and foreground actors.
//!
//! # Invariants
//! - One tick per frame, on one thread; components never call each other
//!   outside of it.
//! - Every scene resource the session creates is released by `teardown`, and
//!   no tick runs afterwards.

pub mod config;
pub mod session;

pub use config::{ConfigError, SessionConfig};
pub use session::{FlightSession, SessionError};
