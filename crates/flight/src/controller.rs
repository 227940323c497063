use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Leader motion parameters. Times are milliseconds, distances world units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    /// Cruise speed along +Z, units per millisecond.
    pub speed: f64,
    pub base_altitude: f64,
    /// Easing rate `k` in `progress = (elapsed_seconds * k)^2`.
    pub ease_rate: f64,
    /// Altitude gained per unit of progress.
    pub climb_rate: f64,
    /// Speed factor is `max(min_speed_factor, 1 - progress * speed_decay)`.
    pub speed_decay: f64,
    pub min_speed_factor: f64,
    /// Upper bound on nose-up pitch, radians.
    pub pitch_cap: f64,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            speed: 0.05,
            base_altitude: 60.0,
            ease_rate: 0.3,
            climb_rate: 150.0,
            speed_decay: 0.5,
            min_speed_factor: 0.3,
            pitch_cap: std::f64::consts::PI / 2.2,
        }
    }
}

impl FlightConfig {
    /// Easing rate per millisecond.
    fn ease_per_ms(&self) -> f64 {
        self.ease_rate * 0.001
    }

    /// `(elapsed_ms * k / 1000)^2`, zero for non-positive elapsed time.
    pub fn progress_after(&self, elapsed_ms: f64) -> f64 {
        if elapsed_ms <= 0.0 {
            return 0.0;
        }
        let x = elapsed_ms * self.ease_per_ms();
        x * x
    }

    fn factor_for(&self, progress: f64) -> f64 {
        (1.0 - progress * self.speed_decay).max(self.min_speed_factor)
    }

    /// Integral of the speed factor over `[0, elapsed_ms]`, in milliseconds.
    ///
    /// The factor is `1 - d a^2 s^2` until it reaches the floor at `s*`, then
    /// constant, so the integral is piecewise closed-form.
    fn attenuated_time(&self, elapsed_ms: f64) -> f64 {
        if elapsed_ms <= 0.0 {
            return 0.0;
        }
        let a = self.ease_per_ms();
        let d = self.speed_decay.max(0.0);
        let floor = self.min_speed_factor;
        if a == 0.0 || d == 0.0 || floor >= 1.0 {
            return elapsed_ms * self.factor_for(0.0);
        }
        let c = d * a * a;
        let knee = ((1.0 - floor) / d).sqrt() / a;
        if elapsed_ms <= knee {
            elapsed_ms - c * elapsed_ms.powi(3) / 3.0
        } else {
            knee - c * knee.powi(3) / 3.0 + floor * (elapsed_ms - knee)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FlightMode {
    Cruise,
    /// Terminal.
    Climbing { started_at_ms: f64 },
}

/// Two-phase leader motion. Stores only the mode; every quantity is derived.
#[derive(Debug, Clone)]
pub struct FlightController {
    config: FlightConfig,
    mode: FlightMode,
}

impl FlightController {
    pub fn new(config: FlightConfig) -> Self {
        Self {
            config,
            mode: FlightMode::Cruise,
        }
    }

    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    pub fn mode(&self) -> FlightMode {
        self.mode
    }

    pub fn climb_started_at(&self) -> Option<f64> {
        match self.mode {
            FlightMode::Cruise => None,
            FlightMode::Climbing { started_at_ms } => Some(started_at_ms),
        }
    }

    pub fn is_climbing(&self) -> bool {
        matches!(self.mode, FlightMode::Climbing { .. })
    }

    /// Enter the climb at `now_ms`. Returns false if already climbing.
    pub fn trigger_climb(&mut self, now_ms: f64) -> bool {
        if self.is_climbing() {
            tracing::debug!(now_ms, "climb already triggered; ignoring");
            return false;
        }
        self.mode = FlightMode::Climbing {
            started_at_ms: now_ms,
        };
        tracing::info!(now_ms, "climb started");
        true
    }

    /// Milliseconds since the trigger, or zero in cruise / before the trigger.
    pub fn climb_elapsed(&self, now_ms: f64) -> f64 {
        self.climb_started_at()
            .map_or(0.0, |t0| (now_ms - t0).max(0.0))
    }

    pub fn progress(&self, now_ms: f64) -> f64 {
        self.config.progress_after(self.climb_elapsed(now_ms))
    }

    /// Current multiplier on cruise speed: 1 in cruise, non-increasing while
    /// climbing, never below the configured floor.
    pub fn speed_factor(&self, now_ms: f64) -> f64 {
        if self.is_climbing() {
            self.config.factor_for(self.progress(now_ms))
        } else {
            1.0
        }
    }

    /// Leader position along the flight axis.
    pub fn lead_z(&self, now_ms: f64) -> f64 {
        let speed = self.config.speed;
        match self.mode {
            FlightMode::Climbing { started_at_ms } if now_ms > started_at_ms => {
                speed * started_at_ms
                    + speed * self.config.attenuated_time(now_ms - started_at_ms)
            }
            _ => speed * now_ms,
        }
    }

    /// Z the leader would have if it had never slowed down.
    pub fn cruise_z(&self, now_ms: f64) -> f64 {
        self.config.speed * now_ms
    }

    pub fn altitude(&self, now_ms: f64) -> f64 {
        self.config.base_altitude + self.progress(now_ms) * self.config.climb_rate
    }

    /// Rotation about +X in radians. Negative values lift the nose.
    pub fn pitch(&self, now_ms: f64) -> f64 {
        -self.progress(now_ms).min(self.config.pitch_cap)
    }

    pub fn leader_position(&self, now_ms: f64) -> DVec3 {
        DVec3::new(0.0, self.altitude(now_ms), self.lead_z(now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> FlightController {
        FlightController::new(FlightConfig::default())
    }

    #[test]
    fn cruise_covers_speed_times_time() {
        let f = controller();
        assert!((f.lead_z(20_000.0) - 1000.0).abs() < 1e-9);
        for (t1, t2) in [(0.0, 16.0), (1234.5, 9876.5), (100.0, 100_000.0)] {
            let dz = f.lead_z(t2) - f.lead_z(t1);
            assert!((dz - 0.05 * (t2 - t1)).abs() < 1e-9);
        }
        assert_eq!(f.altitude(50_000.0), 60.0);
        assert_eq!(f.pitch(50_000.0), 0.0);
    }

    #[test]
    fn trigger_is_at_most_once() {
        let mut f = controller();
        assert!(f.trigger_climb(5000.0));
        assert!(!f.trigger_climb(6000.0));
        assert_eq!(f.climb_started_at(), Some(5000.0));
    }

    #[test]
    fn climb_progress_follows_square_law() {
        let mut f = controller();
        f.trigger_climb(5000.0);
        assert!((f.progress(8000.0) - 0.81).abs() < 1e-12);
        assert!((f.altitude(8000.0) - (60.0 + 0.81 * 150.0)).abs() < 1e-9);
        // Ten seconds in: (10 * 0.3)^2 = 9.
        assert!((f.progress(15_000.0) - 9.0).abs() < 1e-9);
    }

    #[test]
    fn pre_trigger_positions_are_unchanged() {
        let cruise = controller();
        let mut climbing = controller();
        climbing.trigger_climb(5000.0);
        for t in [0.0, 1000.0, 4999.0, 5000.0] {
            assert_eq!(cruise.lead_z(t), climbing.lead_z(t));
            assert_eq!(cruise.altitude(t), climbing.altitude(t));
        }
    }

    #[test]
    fn post_trigger_rate_matches_speed_factor() {
        let mut f = controller();
        f.trigger_climb(5000.0);
        let h = 0.01;
        let mut last_factor = 1.0;
        for i in 1..200 {
            let t = 5000.0 + i as f64 * 50.0;
            let rate = (f.lead_z(t + h) - f.lead_z(t - h)) / (2.0 * h);
            let factor = f.speed_factor(t);
            assert!((rate - 0.05 * factor).abs() < 1e-6, "t={t} rate={rate} factor={factor}");
            assert!(factor <= last_factor + 1e-12);
            assert!(factor >= 0.3);
            last_factor = factor;
        }
    }

    #[test]
    fn lead_z_is_monotonic_through_the_knee() {
        let mut f = controller();
        f.trigger_climb(1000.0);
        let mut last = f.lead_z(0.0);
        for i in 1..2000 {
            let z = f.lead_z(i as f64 * 10.0);
            assert!(z > last);
            last = z;
        }
    }

    #[test]
    fn factor_bottoms_out_at_floor() {
        let mut f = controller();
        f.trigger_climb(0.0);
        assert_eq!(f.speed_factor(60_000.0), 0.3);
        let dz = f.lead_z(61_000.0) - f.lead_z(60_000.0);
        assert!((dz - 0.05 * 0.3 * 1000.0).abs() < 1e-6);
    }

    #[test]
    fn pitch_is_capped() {
        let mut f = controller();
        f.trigger_climb(0.0);
        assert!((f.pitch(1000.0) + 0.09).abs() < 1e-12);
        assert_eq!(f.pitch(100_000.0), -std::f64::consts::PI / 2.2);
    }

    #[test]
    fn no_decay_means_full_speed() {
        let mut f = FlightController::new(FlightConfig {
            speed_decay: 0.0,
            ..FlightConfig::default()
        });
        f.trigger_climb(0.0);
        assert!((f.lead_z(10_000.0) - 500.0).abs() < 1e-9);
    }
}
