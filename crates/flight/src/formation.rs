use std::f64::consts::{PI, TAU};

use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};
use sketchflight_scene::MeshData;

use crate::controller::FlightController;

/// Wing-beat shape. The down-stroke takes `downstroke` radians of each cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlapConfig {
    /// Cycle advance per millisecond, radians.
    pub rate: f64,
    pub downstroke: f64,
    /// Vertical travel of the wing tip.
    pub swing: f64,
    /// Fore/aft travel of the wing tip.
    pub sweep: f64,
    /// Extra span at the top of the stroke, as a fraction of `half_span`.
    pub spread_gain: f64,
    pub half_span: f64,
    /// How far the tips hang below the body at rest.
    pub droop: f64,
    pub body_half_length: f64,
    pub stroke_thickness: f64,
}

impl Default for FlapConfig {
    fn default() -> Self {
        Self {
            rate: 0.004,
            downstroke: 1.2 * PI,
            swing: 1.2,
            sweep: 0.4,
            spread_gain: 0.3,
            half_span: 3.0,
            droop: 1.0,
            body_half_length: 1.5,
            stroke_thickness: 0.3,
        }
    }
}

/// V formation layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationConfig {
    /// Birds on each side of the leader.
    pub wing_pairs: u32,
    pub lateral_spacing: f64,
    pub depth_spacing: f64,
    /// Flap phase delay per rank, milliseconds.
    pub flap_delay_ms: f64,
    pub flap: FlapConfig,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            wing_pairs: 7,
            lateral_spacing: 4.0,
            depth_spacing: 6.0,
            flap_delay_ms: 100.0,
            flap: FlapConfig::default(),
        }
    }
}

/// Fixed place of one bird relative to the leader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BirdSlot {
    pub offset_x: f64,
    pub offset_z: f64,
    pub flap_delay_ms: f64,
}

/// Wing tips relative to the body centre, plus the stroke phase in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WingPose {
    pub phase: f64,
    pub left_tip: Vec3,
    pub right_tip: Vec3,
}

impl FlapConfig {
    pub fn wings_at(&self, now_ms: f64, delay_ms: f64) -> WingPose {
        let time = (now_ms + delay_ms) * self.rate;
        let cycle = time.rem_euclid(TAU);
        let upstroke = TAU - self.downstroke;
        let phase = if cycle < self.downstroke {
            (cycle / (self.downstroke / PI)).sin()
        } else {
            -((cycle - self.downstroke) / (upstroke / PI)).sin()
        };

        let y = (-self.droop + phase * self.swing) as f32;
        let z = (time.cos() * self.sweep) as f32;
        let span = (self.half_span * (1.0 + phase * self.spread_gain)) as f32;
        WingPose {
            phase,
            left_tip: Vec3::new(-span, y, z),
            right_tip: Vec3::new(span, y, z),
        }
    }

    /// Body line plus two wing strokes, in the bird's local frame.
    pub fn bird_mesh(&self, wings: &WingPose) -> MeshData {
        let thickness = self.stroke_thickness as f32;
        let half = self.body_half_length as f32;
        let mut mesh = MeshData::stroke(Vec3::new(0.0, 0.0, -half), Vec3::new(0.0, 0.0, half), thickness);
        mesh.merge(&MeshData::stroke(Vec3::ZERO, wings.left_tip, thickness));
        mesh.merge(&MeshData::stroke(Vec3::ZERO, wings.right_tip, thickness));
        mesh
    }
}

/// Where one bird is this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BirdPose {
    pub position: DVec3,
    /// Rotation about +X, radians.
    pub pitch: f64,
    pub wings: WingPose,
}

/// The leader plus `wing_pairs` birds trailing on each side.
#[derive(Debug, Clone)]
pub struct Formation {
    config: FormationConfig,
    slots: Vec<BirdSlot>,
}

impl Formation {
    pub fn new(config: FormationConfig) -> Self {
        let mut slots = vec![BirdSlot {
            offset_x: 0.0,
            offset_z: 0.0,
            flap_delay_ms: 0.0,
        }];
        for rank in 1..=config.wing_pairs {
            let r = rank as f64;
            for side in [-1.0, 1.0] {
                slots.push(BirdSlot {
                    offset_x: side * config.lateral_spacing * r,
                    offset_z: -config.depth_spacing * r,
                    flap_delay_ms: config.flap_delay_ms * r,
                });
            }
        }
        Self { config, slots }
    }

    pub fn config(&self) -> &FormationConfig {
        &self.config
    }

    pub fn slots(&self) -> &[BirdSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Distance from the leader to the last rank.
    pub fn depth(&self) -> f64 {
        self.config.depth_spacing * self.config.wing_pairs as f64
    }

    pub fn poses(&self, flight: &FlightController, now_ms: f64) -> Vec<BirdPose> {
        let leader = flight.leader_position(now_ms);
        let pitch = flight.pitch(now_ms);
        self.slots
            .iter()
            .map(|slot| BirdPose {
                position: leader + DVec3::new(slot.offset_x, 0.0, slot.offset_z),
                pitch,
                wings: self.config.flap.wings_at(now_ms, slot.flap_delay_ms),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::FlightConfig;

    #[test]
    fn default_formation_is_a_v_of_fifteen() {
        let f = Formation::new(FormationConfig::default());
        assert_eq!(f.len(), 15);
        assert_eq!(f.depth(), 42.0);
        let last = f.slots()[14];
        assert_eq!((last.offset_x, last.offset_z, last.flap_delay_ms), (28.0, -42.0, 700.0));
        let pair = &f.slots()[1..3];
        assert_eq!(pair[0].offset_x, -pair[1].offset_x);
        assert_eq!(pair[0].offset_z, pair[1].offset_z);
    }

    #[test]
    fn birds_track_the_leader() {
        let f = Formation::new(FormationConfig::default());
        let mut flight = FlightController::new(FlightConfig::default());
        flight.trigger_climb(1000.0);
        let t = 4000.0;
        let poses = f.poses(&flight, t);
        let leader = flight.leader_position(t);
        assert_eq!(poses[0].position, leader);
        for (pose, slot) in poses.iter().zip(f.slots()) {
            assert_eq!(pose.position.y, leader.y);
            assert_eq!(pose.position.z, leader.z + slot.offset_z);
            assert_eq!(pose.pitch, flight.pitch(t));
        }
    }

    #[test]
    fn flap_is_asymmetric_and_bounded() {
        let flap = FlapConfig::default();
        // Mid down-stroke: cycle = 0.6 pi gives phase sin(pi / 2) = 1.
        let t = 0.6 * PI / flap.rate;
        let top = flap.wings_at(t, 0.0);
        assert!((top.phase - 1.0).abs() < 1e-9);
        assert!((top.right_tip.x - 3.9).abs() < 1e-5);
        assert!((top.right_tip.y - 0.2).abs() < 1e-5);

        // Mid up-stroke: cycle = 1.2 pi + 0.4 pi gives phase -1.
        let t = 1.6 * PI / flap.rate;
        let bottom = flap.wings_at(t, 0.0);
        assert!((bottom.phase + 1.0).abs() < 1e-9);

        for i in 0..500 {
            let w = flap.wings_at(i as f64 * 7.0, 0.0);
            assert!((-1.0..=1.0).contains(&w.phase));
            assert_eq!(w.left_tip.x, -w.right_tip.x);
        }
    }

    #[test]
    fn delay_shifts_the_cycle() {
        let flap = FlapConfig::default();
        assert_eq!(flap.wings_at(500.0, 100.0), flap.wings_at(600.0, 0.0));
    }

    #[test]
    fn bird_mesh_has_three_strokes() {
        let flap = FlapConfig::default();
        let mesh = flap.bird_mesh(&flap.wings_at(0.0, 0.0));
        assert_eq!(mesh.vertex_count(), 72);
        let (min, max) = mesh.bounds();
        assert!(min.x < -2.5 && max.x > 2.5);
        assert!(min.z <= -1.5 && max.z >= 1.5);
    }
}
