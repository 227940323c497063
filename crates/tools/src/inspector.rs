use std::time::Duration;

use sketchflight_kernel::FlightSession;

/// Read-only queries against a running session.
pub struct SessionInspector;

impl SessionInspector {
    pub fn summary(session: &FlightSession) -> SessionSummary {
        let now = session.now_ms();
        let flight = session.flight();
        let eye = session.camera_pose().eye;
        let stats = session.stats();
        SessionSummary {
            time_ms: now,
            climbing: flight.is_climbing(),
            progress: flight.progress(now),
            speed_factor: flight.speed_factor(now),
            leader_z: flight.lead_z(now),
            altitude: flight.altitude(now),
            camera: [eye.x, eye.y, eye.z],
            chunks: session.terrain().len(),
            clouds: session.clouds().len(),
            nodes: session.scene().node_count(),
            vertices: session.scene().resident_vertices(),
            created_last_tick: stats.chunks_created,
            retired_last_tick: stats.chunks_retired,
            average_tick: session.frame_timer().average(),
        }
    }

    /// Resident chunks, front (oldest) first.
    pub fn chunk_window(session: &FlightSession) -> Vec<ChunkInfo> {
        session
            .terrain()
            .chunks()
            .map(|c| ChunkInfo {
                origin_z: c.origin_z,
                clouds: c.spawned_clouds.len(),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub time_ms: f64,
    pub climbing: bool,
    pub progress: f64,
    pub speed_factor: f64,
    pub leader_z: f64,
    pub altitude: f64,
    pub camera: [f64; 3],
    pub chunks: usize,
    pub clouds: usize,
    pub nodes: usize,
    pub vertices: usize,
    pub created_last_tick: usize,
    pub retired_last_tick: usize,
    pub average_tick: Duration,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = if self.climbing { "climbing" } else { "cruise" };
        writeln!(
            f,
            "Session: t={:.2}s mode={mode} progress={:.3} speed_factor={:.2}",
            self.time_ms / 1000.0,
            self.progress,
            self.speed_factor
        )?;
        writeln!(
            f,
            "Leader: z={:.1} altitude={:.1}  Camera: ({:.1}, {:.1}, {:.1})",
            self.leader_z, self.altitude, self.camera[0], self.camera[1], self.camera[2]
        )?;
        write!(
            f,
            "Window: chunks={} clouds={} nodes={} vertices={} (+{} / -{} last tick, avg {:?})",
            self.chunks,
            self.clouds,
            self.nodes,
            self.vertices,
            self.created_last_tick,
            self.retired_last_tick,
            self.average_tick
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkInfo {
    pub origin_z: f64,
    pub clouds: usize,
}

impl std::fmt::Display for ChunkInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chunk z={:.1} clouds={}", self.origin_z, self.clouds)
    }
}
