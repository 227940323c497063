use serde::{Deserialize, Serialize};

/// Convert a packed `0xRRGGBB` colour into linear-ish float RGB in `[0, 1]`.
pub const fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Elevation-banded terrain colouring.
///
/// Heights below `water_level` are water, then grass, rock and snow bands
/// blended linearly between thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainPalette {
    pub water: [f32; 3],
    pub water_deep: [f32; 3],
    pub grass: [f32; 3],
    pub rock: [f32; 3],
    pub snow: [f32; 3],
    pub water_level: f32,
    pub grass_level: f32,
    pub rock_level: f32,
    pub snow_level: f32,
    pub light_direction: [f32; 3],
}

impl Default for TerrainPalette {
    fn default() -> Self {
        let l = glam::Vec3::new(0.5, 1.0, 0.5).normalize();
        Self {
            water: rgb(0x4db8ff),
            water_deep: rgb(0x2266aa),
            grass: rgb(0x84c43d),
            rock: rgb(0xa08454),
            snow: rgb(0xf5f0e8),
            water_level: -2.0,
            grass_level: 8.0,
            rock_level: 25.0,
            snow_level: 40.0,
            light_direction: [l.x, l.y, l.z],
        }
    }
}

impl TerrainPalette {
    /// Unlit land colour for a height, ignoring the animated water detail.
    ///
    /// Mirrors the band selection in the terrain shader so it can be tested
    /// without a GPU.
    pub fn land_color(&self, height: f32) -> [f32; 3] {
        let mix = |a: [f32; 3], b: [f32; 3], t: f32| {
            let t = t.clamp(0.0, 1.0);
            [
                a[0] + (b[0] - a[0]) * t,
                a[1] + (b[1] - a[1]) * t,
                a[2] + (b[2] - a[2]) * t,
            ]
        };
        if height < self.water_level {
            self.water
        } else if height < self.grass_level {
            self.grass
        } else if height < self.rock_level {
            let t = (height - self.grass_level) / (self.rock_level - self.grass_level);
            mix(self.grass, self.rock, t)
        } else if height < self.snow_level {
            let t = (height - self.rock_level) / (self.snow_level - self.rock_level);
            mix(self.rock, self.snow, t)
        } else {
            self.snow
        }
    }
}

/// Vertical gradient used by the sky dome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyGradient {
    pub top: [f32; 3],
    pub bottom: [f32; 3],
    pub offset: f32,
    pub exponent: f32,
}

impl Default for SkyGradient {
    fn default() -> Self {
        Self {
            top: rgb(0x5a9fd4),
            bottom: rgb(0xffd9b8),
            offset: 33.0,
            exponent: 0.5,
        }
    }
}

/// Material description. Backends pick a pipeline per variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Material {
    /// Elevation-banded ground with animated water.
    Terrain(TerrainPalette),
    /// Unlit translucent volume.
    Cloud { color: [f32; 3], opacity: f32 },
    /// Back-facing gradient sphere.
    Sky(SkyGradient),
    /// Flat dark strokes for foreground actors.
    Ink { color: [f32; 3] },
    /// Encodes view-space surface normals as colour.
    Normal,
}

impl Material {
    pub fn is_translucent(&self) -> bool {
        matches!(self, Material::Cloud { opacity, .. } if *opacity < 1.0)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Material::Terrain(_) => "terrain",
            Material::Cloud { .. } => "cloud",
            Material::Sky(_) => "sky",
            Material::Ink { .. } => "ink",
            Material::Normal => "normal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_unpack() {
        assert_eq!(rgb(0xff0000), [1.0, 0.0, 0.0]);
        assert_eq!(rgb(0x000000), [0.0, 0.0, 0.0]);
        let c = rgb(0x808080);
        assert!((c[1] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn palette_bands_by_height() {
        let p = TerrainPalette::default();
        assert_eq!(p.land_color(-5.0), p.water);
        assert_eq!(p.land_color(0.0), p.grass);
        assert_eq!(p.land_color(8.0), p.grass);
        assert_eq!(p.land_color(25.0), p.rock);
        assert_eq!(p.land_color(100.0), p.snow);

        let mid = p.land_color(32.5);
        for i in 0..3 {
            let expected = (p.rock[i] + p.snow[i]) / 2.0;
            assert!((mid[i] - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn light_direction_is_normalized() {
        let p = TerrainPalette::default();
        let l = glam::Vec3::from(p.light_direction);
        assert!((l.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn only_partial_opacity_clouds_are_translucent() {
        assert!(
            Material::Cloud {
                color: [1.0; 3],
                opacity: 0.7
            }
            .is_translucent()
        );
        assert!(!Material::Normal.is_translucent());
        assert!(!Material::Terrain(TerrainPalette::default()).is_translucent());
    }
}
