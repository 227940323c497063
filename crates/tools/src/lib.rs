//! Developer tooling: read-only session inspection for the debug HUD and CLI.
//!
//! # Invariants
//! - Tools never mutate the session.

mod inspector;

pub use inspector::{ChunkInfo, SessionInspector, SessionSummary};

pub fn crate_info() -> &'static str {
    "sketchflight-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
