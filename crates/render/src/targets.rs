use bytemuck::{Pod, Zeroable};
use sketchflight_common::Viewport;

use crate::sketch::SketchSettings;

/// Uniform block read by the pencil shader. Layout matches `SketchParams` in WGSL.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SketchUniforms {
    /// Output size in pixels.
    pub resolution: [f32; 2],
    /// `1 / resolution`, the Sobel tap spacing in UV.
    pub texel: [f32; 2],
    pub ink: [f32; 4],
    /// edge_low, edge_high, line_threshold, normal_weight
    pub edges: [f32; 4],
    /// grain_frequency, grain_amplitude, grain_base, modulation_frequency
    pub grain: [f32; 4],
    /// jitter_cutoff, jitter_scale, modulation_gain, jitter texture size
    pub jitter: [f32; 4],
}

impl SketchUniforms {
    pub fn new(settings: &SketchSettings, viewport: Viewport) -> Self {
        let [r, g, b] = settings.ink_color;
        let mut uniforms = Self {
            resolution: [0.0; 2],
            texel: [0.0; 2],
            ink: [r, g, b, 1.0],
            edges: [
                settings.edge_low,
                settings.edge_high,
                settings.line_threshold,
                settings.normal_weight,
            ],
            grain: [
                settings.grain_frequency,
                settings.grain_amplitude,
                settings.grain_base,
                settings.modulation_frequency,
            ],
            jitter: [
                settings.jitter_cutoff,
                settings.jitter_scale,
                settings.modulation_gain,
                settings.jitter_size as f32,
            ],
        };
        uniforms.set_viewport(viewport);
        uniforms
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.resolution = [viewport.width() as f32, viewport.height() as f32];
        self.texel = viewport.texel_size();
    }
}

/// Size shared by every off-screen target and the resolution uniforms.
///
/// Backends recreate their textures when `resize` reports a change, then
/// upload `uniforms()`. Both are derived from the same viewport, so they
/// cannot disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetExtent {
    viewport: Viewport,
    uniforms: SketchUniforms,
    generation: u64,
}

impl TargetExtent {
    pub fn new(settings: &SketchSettings, viewport: Viewport) -> Self {
        Self {
            viewport,
            uniforms: SketchUniforms::new(settings, viewport),
            generation: 0,
        }
    }

    /// Returns true when the size actually changed.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        if viewport == self.viewport {
            return false;
        }
        tracing::debug!(
            from_w = self.viewport.width(),
            from_h = self.viewport.height(),
            to_w = viewport.width(),
            to_h = viewport.height(),
            "resizing render targets"
        );
        self.viewport = viewport;
        self.uniforms.set_viewport(viewport);
        self.generation += 1;
        true
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn uniforms(&self) -> &SketchUniforms {
        &self.uniforms
    }

    /// Bumped on every effective resize.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp(w: u32, h: u32) -> Viewport {
        Viewport::new(w, h).unwrap()
    }

    #[test]
    fn uniform_block_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<SketchUniforms>() % 16, 0);
    }

    #[test]
    fn uniforms_follow_viewport() {
        let extent = TargetExtent::new(&SketchSettings::default(), vp(800, 400));
        let u = extent.uniforms();
        assert_eq!(u.resolution, [800.0, 400.0]);
        assert_eq!(u.texel, [1.0 / 800.0, 1.0 / 400.0]);
        assert_eq!(u.ink, [0.15, 0.1, 0.12, 1.0]);
        assert_eq!(u.jitter[3], 512.0);
    }

    #[test]
    fn resize_round_trip_restores_state() {
        let settings = SketchSettings::default();
        let mut extent = TargetExtent::new(&settings, vp(1280, 720));
        let original_uniforms = *extent.uniforms();

        assert!(extent.resize(vp(640, 360)));
        assert_eq!(extent.uniforms().resolution, [640.0, 360.0]);
        assert!(extent.resize(vp(1280, 720)));

        assert_eq!(extent.viewport(), vp(1280, 720));
        assert_eq!(*extent.uniforms(), original_uniforms);
        assert_eq!(extent.generation(), 2);
    }

    #[test]
    fn same_size_is_a_no_op() {
        let mut extent = TargetExtent::new(&SketchSettings::default(), vp(10, 10));
        assert!(!extent.resize(vp(10, 10)));
        assert_eq!(extent.generation(), 0);
    }
}
