//! CPU reference of the pencil pass.
//!
//! The WGSL in the GPU backend evaluates the same functions per pixel. Keeping
//! a CPU copy lets the edge classification be tested without a device.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Linear distance haze applied in the base pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogSettings {
    pub color: [f32; 3],
    pub near: f32,
    pub far: f32,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            color: sketchflight_scene::rgb(0xffe5cc),
            near: 1000.0,
            far: 5000.0,
        }
    }
}

impl FogSettings {
    /// 0 at `near` and closer, 1 at `far` and beyond.
    pub fn factor(&self, distance: f32) -> f32 {
        if self.far <= self.near {
            return if distance >= self.far { 1.0 } else { 0.0 };
        }
        ((distance - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }
}

/// Pencil pass tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchSettings {
    pub ink_color: [f32; 3],
    /// Smoothstep window applied to the Sobel magnitude.
    pub edge_low: f32,
    pub edge_high: f32,
    /// Smoothed magnitudes above this are drawn as ink.
    pub line_threshold: f32,
    /// Paper grain is `noise(frag * frequency) * amplitude + base`.
    pub grain_frequency: f32,
    pub grain_amplitude: f32,
    pub grain_base: f32,
    /// Per-pixel modulation of the normal term: `(noise(frag * f) * 2 - 1) * gain`.
    pub modulation_frequency: f32,
    pub modulation_gain: f32,
    /// Weight of normal-buffer luminance relative to colour luminance.
    pub normal_weight: f32,
    /// Side of the square tileable jitter texture.
    pub jitter_size: u32,
    pub jitter_cutoff: f32,
    /// UV displacement per unit of jitter.
    pub jitter_scale: f32,
    pub fog: FogSettings,
}

impl Default for SketchSettings {
    fn default() -> Self {
        Self {
            ink_color: [0.15, 0.1, 0.12],
            edge_low: 0.01,
            edge_high: 0.03,
            line_threshold: 0.1,
            grain_frequency: 0.3,
            grain_amplitude: 0.1,
            grain_base: 0.95,
            modulation_frequency: 0.5,
            modulation_gain: 10.0,
            normal_weight: 0.3,
            jitter_size: 512,
            jitter_cutoff: 50.0,
            jitter_scale: 0.01,
            fog: FogSettings::default(),
        }
    }
}

/// Pixel classification produced by the pencil pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Ink,
    Paper,
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Mean of the three channels.
pub fn luminance(rgb: [f32; 3]) -> f32 {
    (rgb[0] + rgb[1] + rgb[2]) / 3.0
}

pub fn hash(p: Vec2) -> f32 {
    let v = p.dot(Vec2::new(127.1, 311.7)).sin() * 43758.547;
    v - v.floor()
}

/// Smooth value noise in `[0, 1]`.
pub fn value_noise(p: Vec2) -> f32 {
    let i = p.floor();
    let f = p - i;
    let a = hash(i);
    let b = hash(i + Vec2::new(1.0, 0.0));
    let c = hash(i + Vec2::new(0.0, 1.0));
    let d = hash(i + Vec2::new(1.0, 1.0));
    let u = f * f * (Vec2::splat(3.0) - 2.0 * f);
    a + (b - a) * u.x + (c - a) * u.y * (1.0 - u.x) + (d - b) * u.x * u.y
}

/// Sobel gradient magnitude of a 3x3 neighbourhood. `g[row][col]` is the
/// sample at offset `(col - 1, row - 1)`.
pub fn sobel(g: &[[f32; 3]; 3]) -> f32 {
    let gx = -g[0][0] - 2.0 * g[1][0] - g[2][0] + g[0][2] + 2.0 * g[1][2] + g[2][2];
    let gy = -g[0][0] - 2.0 * g[0][1] - g[0][2] + g[2][0] + 2.0 * g[2][1] + g[2][2];
    (gx * gx + gy * gy).sqrt()
}

impl SketchSettings {
    /// UV offset derived from one jitter texel in `[0, 1]`.
    pub fn jitter_offset(&self, texel: f32) -> f32 {
        let cutoff = self.jitter_cutoff;
        let jitter = texel.clamp(0.0, cutoff) / cutoff - 0.5 / cutoff;
        jitter * self.jitter_scale
    }

    /// Signed gain applied to the normal term at a fragment.
    pub fn modulation(&self, frag: Vec2) -> f32 {
        (value_noise(frag * self.modulation_frequency) * 2.0 - 1.0) * self.modulation_gain
    }

    /// Edge-detector input at one tap: colour luminance plus weighted,
    /// modulated normal luminance.
    pub fn tap_value(&self, color: [f32; 3], normal: [f32; 3], modulation: f32) -> f32 {
        luminance(color) + luminance(normal) * self.normal_weight * modulation
    }

    pub fn classify(&self, magnitude: f32) -> Stroke {
        if smoothstep(self.edge_low, self.edge_high, magnitude) > self.line_threshold {
            Stroke::Ink
        } else {
            Stroke::Paper
        }
    }

    /// Final colour for a fragment.
    pub fn shade(&self, magnitude: f32, base: [f32; 3], frag: Vec2) -> [f32; 3] {
        match self.classify(magnitude) {
            Stroke::Ink => self.ink_color,
            Stroke::Paper => {
                let grain =
                    value_noise(frag * self.grain_frequency) * self.grain_amplitude + self.grain_base;
                [base[0] * grain, base[1] * grain, base[2] * grain]
            }
        }
    }
}

/// Square greyscale RGBA8 noise, tiled with repeat addressing on the GPU.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseTexture {
    size: u32,
    texels: Vec<u8>,
}

impl NoiseTexture {
    pub fn generate(size: u32, seed: u64) -> Self {
        let size = size.max(1);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let count = (size * size) as usize;
        let mut texels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            let v: u8 = rng.random();
            texels.extend_from_slice(&[v, v, v, 255]);
        }
        Self { size, texels }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn bytes(&self) -> &[u8] {
        &self.texels
    }

    /// Red channel at integer coordinates, wrapping like the sampler does.
    pub fn sample(&self, x: i64, y: i64) -> f32 {
        let s = self.size as i64;
        let (x, y) = (x.rem_euclid(s), y.rem_euclid(s));
        self.texels[((y * s + x) * 4) as usize] as f32 / 255.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothstep_clamps_and_eases() {
        assert_eq!(smoothstep(0.01, 0.03, 0.0), 0.0);
        assert_eq!(smoothstep(0.01, 0.03, 1.0), 1.0);
        assert!((smoothstep(0.01, 0.03, 0.02) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn flat_neighbourhood_has_no_gradient() {
        let g = [[0.4; 3]; 3];
        assert!(sobel(&g) < 1e-6);
    }

    #[test]
    fn vertical_step_is_detected() {
        let g = [[0.0, 0.5, 1.0], [0.0, 0.5, 1.0], [0.0, 0.5, 1.0]];
        // gx = 1 + 2 + 1 = 4, gy = 0.
        assert!((sobel(&g) - 4.0).abs() < 1e-6);
        let s = SketchSettings::default();
        assert_eq!(s.classify(sobel(&g)), Stroke::Ink);
    }

    #[test]
    fn weak_gradients_stay_paper() {
        let s = SketchSettings::default();
        assert_eq!(s.classify(0.005), Stroke::Paper);
        // smoothstep(0.01, 0.03, 0.012) = 0.028 < 0.1.
        assert_eq!(s.classify(0.012), Stroke::Paper);
        assert_eq!(s.classify(0.02), Stroke::Ink);
    }

    #[test]
    fn ink_pixels_use_ink_color() {
        let s = SketchSettings::default();
        assert_eq!(s.shade(1.0, [1.0; 3], Vec2::ZERO), [0.15, 0.1, 0.12]);
    }

    #[test]
    fn paper_grain_stays_near_base() {
        let s = SketchSettings::default();
        for i in 0..200 {
            let frag = Vec2::new(i as f32 * 3.7, i as f32 * 1.3);
            let c = s.shade(0.0, [0.8, 0.6, 0.4], frag);
            let ratio = c[0] / 0.8;
            assert!((0.95 - 1e-4..=1.05 + 1e-4).contains(&ratio), "ratio {ratio}");
        }
    }

    #[test]
    fn value_noise_is_bounded() {
        for i in 0..1000 {
            let p = Vec2::new(i as f32 * 0.37, i as f32 * 0.11);
            let n = value_noise(p);
            assert!((-1e-5..=1.0 + 1e-5).contains(&n));
        }
    }

    #[test]
    fn jitter_is_small_and_centred() {
        let s = SketchSettings::default();
        assert!((s.jitter_offset(0.0) - -0.0001).abs() < 1e-9);
        assert!(s.jitter_offset(1.0).abs() < 0.001);
    }

    #[test]
    fn noise_texture_is_grey_and_seeded() {
        let a = NoiseTexture::generate(16, 4);
        let b = NoiseTexture::generate(16, 4);
        assert_eq!(a, b);
        assert_eq!(a.bytes().len(), 16 * 16 * 4);
        for px in a.bytes().chunks_exact(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], 255);
        }
        assert_eq!(a.sample(-1, 0), a.sample(15, 0));
        assert_eq!(a.sample(16, 17), a.sample(0, 1));
    }

    #[test]
    fn fog_ramps_linearly() {
        let fog = FogSettings::default();
        assert_eq!(fog.factor(500.0), 0.0);
        assert!((fog.factor(3000.0) - 0.5).abs() < 1e-6);
        assert_eq!(fog.factor(9000.0), 1.0);
    }
}
