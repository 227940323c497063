use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// One separable `sin(x f) * cos(z f) * a` term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SineTerm {
    pub frequency: f64,
    pub amplitude: f64,
}

impl SineTerm {
    const fn new(frequency: f64, amplitude: f64) -> Self {
        Self {
            frequency,
            amplitude,
        }
    }

    #[inline]
    fn eval(&self, x: f64, z: f64) -> f64 {
        (x * self.frequency).sin() * (z * self.frequency).cos() * self.amplitude
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValleyWave {
    /// `|sin(x f + phase)|`, bands run along the flight axis.
    SineOfX,
    /// `|cos(z f + phase)|`, bands run across the flight axis.
    CosineOfZ,
}

/// A linear depression: subtract `depth` wherever the banded wave is below `band`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Valley {
    pub wave: ValleyWave,
    pub frequency: f64,
    pub phase: f64,
    pub band: f64,
    pub depth: f64,
}

impl Valley {
    #[inline]
    fn eval(&self, x: f64, z: f64) -> f64 {
        let w = match self.wave {
            ValleyWave::SineOfX => (x * self.frequency + self.phase).sin(),
            ValleyWave::CosineOfZ => (z * self.frequency + self.phase).cos(),
        };
        if w.abs() < self.band { -self.depth } else { 0.0 }
    }
}

/// Tuning for the height field. Defaults reproduce the reference landscape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightFieldParams {
    /// Macro relief: rolling hills and mountain masses.
    pub relief: Vec<SineTerm>,
    /// Medium detail.
    pub detail: Vec<SineTerm>,
    /// Fine roughness.
    pub roughness: Vec<SineTerm>,
    pub valleys: Vec<Valley>,
    pub peak_threshold: f64,
    pub peak_scale: f64,
    pub peak_exponent: f64,
    pub floor: f64,
    pub base_shift: f64,
}

impl Default for HeightFieldParams {
    fn default() -> Self {
        Self {
            relief: vec![
                SineTerm::new(0.002, 25.0),
                SineTerm::new(0.005, 18.0),
                SineTerm::new(0.008, 12.0),
            ],
            detail: vec![SineTerm::new(0.015, 10.0), SineTerm::new(0.03, 6.0)],
            roughness: vec![SineTerm::new(0.08, 3.0), SineTerm::new(0.15, 1.5)],
            valleys: vec![
                Valley {
                    wave: ValleyWave::SineOfX,
                    frequency: 0.002,
                    phase: PI * 0.3,
                    band: 0.12,
                    depth: 6.0,
                },
                Valley {
                    wave: ValleyWave::CosineOfZ,
                    frequency: 0.003,
                    phase: PI * 0.7,
                    band: 0.10,
                    depth: 5.0,
                },
            ],
            peak_threshold: 15.0,
            peak_scale: 0.5,
            peak_exponent: 1.2,
            floor: -8.0,
            base_shift: 5.0,
        }
    }
}

/// Terrain elevation as a pure function of world `(x, z)`, where `z` is the
/// flight axis.
///
/// Evaluation never depends on chunking, which is what keeps neighbouring
/// chunks seam-free.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeightField {
    params: HeightFieldParams,
}

impl HeightField {
    pub fn new(params: HeightFieldParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HeightFieldParams {
        &self.params
    }

    pub fn height(&self, x: f64, z: f64) -> f64 {
        let p = &self.params;
        let relief: f64 = p.relief.iter().map(|t| t.eval(x, z)).sum();
        let detail: f64 = p.detail.iter().map(|t| t.eval(x, z)).sum();
        let roughness: f64 = p.roughness.iter().map(|t| t.eval(x, z)).sum();
        let valleys: f64 = p.valleys.iter().map(|v| v.eval(x, z)).sum();

        let mut h = relief + detail + roughness + valleys;
        if h > p.peak_threshold {
            h = p.peak_threshold + ((h - p.peak_threshold) * p.peak_scale).powf(p.peak_exponent);
        }
        h.max(p.floor) + p.base_shift
    }

    /// Lowest value `height` can ever return.
    pub fn min_height(&self) -> f64 {
        self.params.floor + self.params.base_shift
    }

    /// Upper bound on `height`, from the summed amplitudes.
    pub fn max_height(&self) -> f64 {
        let p = &self.params;
        let amplitude: f64 = p
            .relief
            .iter()
            .chain(&p.detail)
            .chain(&p.roughness)
            .map(|t| t.amplitude.abs())
            .sum();
        let h = if amplitude > p.peak_threshold {
            p.peak_threshold + ((amplitude - p.peak_threshold) * p.peak_scale).powf(p.peak_exponent)
        } else {
            amplitude
        };
        h.max(p.floor) + p.base_shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_identical_inputs() {
        let field = HeightField::default();
        for i in 0..200 {
            let x = i as f64 * 37.3 - 1000.0;
            let z = i as f64 * 91.7 - 4000.0;
            assert_eq!(field.height(x, z).to_bits(), field.height(x, z).to_bits());
        }
    }

    #[test]
    fn independent_instances_agree_bit_for_bit() {
        let a = HeightField::default();
        let b = HeightField::new(HeightFieldParams::default());
        for i in 0..100 {
            let (x, z) = (i as f64 * 13.0, 1950.0 * i as f64 - 100.0);
            assert_eq!(a.height(x, z).to_bits(), b.height(x, z).to_bits());
        }
    }

    #[test]
    fn origin_value_matches_hand_computation() {
        // At the origin every sine term vanishes. Only the x-valley band can
        // trigger: |sin(0.3 pi)| = 0.809 > 0.12, so no. The z-valley:
        // |cos(0.7 pi)| = 0.588 > 0.10, so no. Height = max(0, -8) + 5.
        let field = HeightField::default();
        assert!((field.height(0.0, 0.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn bounded_by_floor_and_ceiling() {
        let field = HeightField::default();
        let lo = field.min_height();
        let hi = field.max_height();
        assert_eq!(lo, -3.0);
        for ix in -50..50 {
            for iz in -50..50 {
                let h = field.height(ix as f64 * 41.0, iz as f64 * 53.0);
                assert!(h >= lo && h <= hi, "h={h} outside [{lo}, {hi}]");
            }
        }
    }

    #[test]
    fn continuous_across_sample_steps() {
        // Away from the valley bands the field is smooth; a tiny step must
        // produce a tiny change.
        let field = HeightField::default();
        let (x, z) = (123.0, 2000.0 - 50.0);
        let a = field.height(x, z);
        let b = field.height(x, z + 1e-6);
        assert!((a - b).abs() < 1e-3);
    }

    #[test]
    fn peaks_are_sharpened_above_threshold() {
        let params = HeightFieldParams {
            relief: vec![SineTerm::new(0.0, 0.0)],
            detail: vec![],
            roughness: vec![],
            valleys: vec![],
            ..HeightFieldParams::default()
        };
        let flat = HeightField::new(params.clone());
        assert_eq!(flat.height(10.0, 10.0), 5.0);

        // A zero-frequency valley with a wide band and negative depth lifts the
        // whole field to a constant 55 before reshaping.
        let plateau = HeightField::new(HeightFieldParams {
            valleys: vec![Valley {
                wave: ValleyWave::SineOfX,
                frequency: 0.0,
                phase: 0.0,
                band: 2.0,
                depth: -55.0,
            }],
            ..params
        });
        let expected = 15.0 + 20f64.powf(1.2) + 5.0;
        for (x, z) in [(0.0, 0.0), (-730.0, 4100.5)] {
            let h = plateau.height(x, z);
            assert!((h - expected).abs() < 1e-12, "h={h}");
        }
        assert!((expected - 56.4112840605216).abs() < 1e-9);
    }

    #[test]
    fn valleys_carve_depressions() {
        let params = HeightFieldParams {
            relief: vec![],
            detail: vec![],
            roughness: vec![],
            ..HeightFieldParams::default()
        };
        let field = HeightField::new(params);
        // sin(x*0.002 + 0.3pi) = 0 at x = 0.7pi / 0.002.
        let x = 0.7 * PI / 0.002;
        let z = 0.0; // |cos(0.7 pi)| is outside the z band.
        assert!((field.height(x, z) - (-6.0 + 5.0)).abs() < 1e-9);
    }
}
