use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::controller::FlightController;

/// Scripted camera offsets and projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Depth of the bird formation; the look target sits half of it behind the leader.
    pub formation_depth: f64,
    /// Extra trailing distance beyond the formation.
    pub extra_distance: f64,
    /// Height above the base altitude.
    pub height: f64,
    /// Camera altitude gained per unit of delayed progress.
    pub climb_rate: f64,
    /// Target altitude gained per unit of leader progress.
    pub target_climb_rate: f64,
    /// The camera starts rising this long after the climb trigger.
    pub climb_delay_ms: f64,
    /// Cap on the tilt angle used to raise the look target, radians.
    pub tilt_cap: f64,
    pub fov_y_degrees: f64,
    pub near: f64,
    pub far: f64,
    /// Radius of the sky dome that follows the camera.
    pub sky_radius: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            formation_depth: 60.0,
            extra_distance: 25.0,
            height: 20.0,
            climb_rate: 50.0,
            target_climb_rate: 50.0,
            climb_delay_ms: 5300.0,
            tilt_cap: std::f64::consts::PI / 3.0,
            fov_y_degrees: 60.0,
            near: 0.1,
            far: 10_000.0,
            sky_radius: 550.0,
        }
    }
}

/// Where the camera is and what it looks at, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub eye: DVec3,
    pub target: DVec3,
}

impl CameraPose {
    /// Unit view direction, or `None` when eye and target coincide.
    pub fn forward(&self) -> Option<DVec3> {
        (self.target - self.eye).try_normalize()
    }
}

/// Derives the camera from flight state. Holds no mutable state.
#[derive(Debug, Clone, Default)]
pub struct CameraRig {
    config: CameraConfig,
}

impl CameraRig {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Camera progress: the leader's easing law, started `climb_delay_ms` late.
    pub fn delayed_progress(&self, flight: &FlightController, now_ms: f64) -> f64 {
        let elapsed = flight.climb_elapsed(now_ms) - self.config.climb_delay_ms;
        flight.config().progress_after(elapsed)
    }

    pub fn pose(&self, flight: &FlightController, now_ms: f64) -> CameraPose {
        let c = &self.config;
        let base = flight.config().base_altitude;

        // The camera dollies at full cruise speed even while the leader slows.
        let eye = DVec3::new(
            0.0,
            base + c.height + self.delayed_progress(flight, now_ms) * c.climb_rate,
            flight.cruise_z(now_ms) - (c.formation_depth + c.extra_distance),
        );

        let mut target = DVec3::new(0.0, base, flight.lead_z(now_ms) - c.formation_depth * 0.5);
        if flight.is_climbing() {
            let p = flight.progress(now_ms);
            let horizontal = (target.x - eye.x).hypot(target.z - eye.z);
            target.y = base + p * c.target_climb_rate + p.min(c.tilt_cap).tan() * horizontal;
        }

        CameraPose { eye, target }
    }

    /// Sky dome centre for a pose: the eye, so the dome always encloses it.
    pub fn sky_center(&self, pose: &CameraPose) -> DVec3 {
        pose.eye
    }
}
