//! CPU-side packing of everything the GPU passes read.
//!
//! Kept free of device types so layouts and draw ordering are testable.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use sketchflight_render::FogSettings;
use sketchflight_scene::{Material, MeshData, NodeId, NodeKind, SceneGraph};

use crate::camera::ViewCamera;

/// Interleaved vertex as laid out in GPU vertex buffers.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    /// Interleave a mesh. Vertices without a normal get +Y.
    pub fn interleave(mesh: &MeshData) -> Vec<Vertex> {
        mesh.positions
            .iter()
            .enumerate()
            .map(|(i, p)| Vertex {
                position: *p,
                normal: mesh.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect()
    }
}

/// Per-frame block shared by every scene pipeline. Matches `Frame` in WGSL.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// Eye position, then session time in seconds.
    pub camera: [f32; 4],
    /// Fog colour, then fog start distance.
    pub fog: [f32; 4],
    /// Fog end distance, rest unused.
    pub fog_range: [f32; 4],
}

impl FrameUniforms {
    pub fn new(camera: &ViewCamera, time_ms: f64, fog: &FogSettings) -> Self {
        let [r, g, b] = fog.color;
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            camera: [
                camera.eye.x,
                camera.eye.y,
                camera.eye.z,
                (time_ms / 1000.0) as f32,
            ],
            fog: [r, g, b, fog.near],
            fog_range: [fog.far, 0.0, 0.0, 0.0],
        }
    }
}

pub const MATERIAL_SLOTS: usize = 6;

/// Per-node block: model matrix plus the node's own material parameters.
/// Matches `Node` in WGSL.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct NodeUniforms {
    pub model: [[f32; 4]; 4],
    pub material: [[f32; 4]; MATERIAL_SLOTS],
}

impl NodeUniforms {
    pub fn new(model: Mat4, material: &Material) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            material: material_block(material),
        }
    }
}

fn with_w(rgb: [f32; 3], w: f32) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], w]
}

/// Pack material parameters into the slots each shader expects.
///
/// Terrain: water/deep/grass/rock/snow colours with the four band
/// thresholds in `w`, then the light direction. Cloud: colour and opacity.
/// Sky: top colour and offset, bottom colour and exponent. Ink: colour.
pub fn material_block(material: &Material) -> [[f32; 4]; MATERIAL_SLOTS] {
    let mut block = [[0.0; 4]; MATERIAL_SLOTS];
    match material {
        Material::Terrain(p) => {
            block[0] = with_w(p.water, p.water_level);
            block[1] = with_w(p.water_deep, p.grass_level);
            block[2] = with_w(p.grass, p.rock_level);
            block[3] = with_w(p.rock, p.snow_level);
            block[4] = with_w(p.snow, 0.0);
            block[5] = with_w(p.light_direction, 0.0);
        }
        Material::Cloud { color, opacity } => block[0] = with_w(*color, *opacity),
        Material::Sky(sky) => {
            block[0] = with_w(sky.top, sky.offset);
            block[1] = with_w(sky.bottom, sky.exponent);
        }
        Material::Ink { color } => block[0] = with_w(*color, 1.0),
        Material::Normal => {}
    }
    block
}

/// Pipeline a node is drawn with. Variant order is draw order: the sky
/// first, translucent clouds last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrawClass {
    Sky,
    Terrain,
    Ink,
    Normal,
    Cloud,
}

impl DrawClass {
    pub fn of(material: &Material) -> Self {
        match material {
            Material::Sky(_) => DrawClass::Sky,
            Material::Terrain(_) => DrawClass::Terrain,
            Material::Ink { .. } => DrawClass::Ink,
            Material::Normal => DrawClass::Normal,
            Material::Cloud { .. } => DrawClass::Cloud,
        }
    }
}

/// Nodes to draw with their pipeline, in draw order.
///
/// Uses the effective material, so under an override every node maps to
/// the override's class. The sky has no surface to encode and is left out
/// of a normal-override pass.
pub fn draw_plan(scene: &SceneGraph) -> Vec<(NodeId, DrawClass)> {
    let mut plan: Vec<(NodeId, DrawClass)> = scene
        .nodes()
        .iter()
        .filter_map(|(id, node)| {
            let material = scene.material(scene.effective_material(node))?;
            let class = DrawClass::of(material);
            if node.kind == NodeKind::Sky && class == DrawClass::Normal {
                return None;
            }
            Some((*id, class))
        })
        .collect();
    plan.sort_by_key(|(_, class)| *class);
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use sketchflight_common::Transform;
    use sketchflight_scene::{SceneNode, SkyGradient, TerrainPalette};

    fn add(scene: &mut SceneGraph, kind: NodeKind, material: Material) -> NodeId {
        let g = scene.add_geometry(MeshData::cuboid(1.0, 1.0, 1.0)).unwrap();
        let m = scene.add_material(material);
        scene
            .add_node(SceneNode {
                kind,
                geometry: g,
                material: m,
                transform: Transform::default(),
            })
            .unwrap()
    }

    fn populated() -> SceneGraph {
        let mut scene = SceneGraph::new();
        add(
            &mut scene,
            NodeKind::Cloud,
            Material::Cloud {
                color: [1.0; 3],
                opacity: 0.7,
            },
        );
        add(
            &mut scene,
            NodeKind::Surface,
            Material::Terrain(TerrainPalette::default()),
        );
        add(&mut scene, NodeKind::Actor, Material::Ink { color: [0.0; 3] });
        add(&mut scene, NodeKind::Sky, Material::Sky(SkyGradient::default()));
        scene
    }

    #[test]
    fn uniform_blocks_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<NodeUniforms>(), 160);
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }

    #[test]
    fn terrain_block_carries_thresholds() {
        let palette = TerrainPalette::default();
        let block = material_block(&Material::Terrain(palette));
        assert_eq!(block[0][3], -2.0);
        assert_eq!(block[1][3], 8.0);
        assert_eq!(block[2][3], 25.0);
        assert_eq!(block[3][3], 40.0);
        assert_eq!(&block[4][..3], &palette.snow[..]);
        assert_eq!(&block[5][..3], &palette.light_direction[..]);
    }

    #[test]
    fn sky_and_cloud_blocks() {
        let sky = material_block(&Material::Sky(SkyGradient::default()));
        assert_eq!(sky[0][3], 33.0);
        assert_eq!(sky[1][3], 0.5);
        let cloud = material_block(&Material::Cloud {
            color: [1.0, 1.0, 1.0],
            opacity: 0.7,
        });
        assert_eq!(cloud[0], [1.0, 1.0, 1.0, 0.7]);
        assert_eq!(material_block(&Material::Normal), [[0.0; 4]; MATERIAL_SLOTS]);
    }

    #[test]
    fn base_plan_draws_sky_first_and_clouds_last() {
        let scene = populated();
        let classes: Vec<DrawClass> = draw_plan(&scene).into_iter().map(|(_, c)| c).collect();
        assert_eq!(
            classes,
            vec![DrawClass::Sky, DrawClass::Terrain, DrawClass::Ink, DrawClass::Cloud]
        );
    }

    #[test]
    fn override_plan_uses_normal_pipeline_and_skips_sky() {
        let mut scene = populated();
        let normal = scene.add_material(Material::Normal);
        {
            let guard = scene.override_materials(normal).unwrap();
            let plan = draw_plan(&guard);
            assert_eq!(plan.len(), 3);
            assert!(plan.iter().all(|(_, c)| *c == DrawClass::Normal));
        }
        assert_eq!(draw_plan(&scene).len(), 4);
    }

    #[test]
    fn interleave_fills_missing_normals() {
        let mesh = MeshData {
            positions: vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            normals: vec![[0.0, 0.0, 1.0]],
            indices: vec![],
        };
        let v = Vertex::interleave(&mesh);
        assert_eq!(v[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(v[1].normal, [0.0, 1.0, 0.0]);
        assert_eq!(v[1].position, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn frame_uniforms_carry_time_and_fog() {
        let mut camera = ViewCamera::default();
        camera.look_at(Vec3::new(0.0, 80.0, -85.0), Vec3::new(0.0, 60.0, -30.0));
        let u = FrameUniforms::new(&camera, 2500.0, &FogSettings::default());
        assert_eq!(u.camera, [0.0, 80.0, -85.0, 2.5]);
        assert_eq!(u.fog[3], 1000.0);
        assert_eq!(u.fog_range[0], 5000.0);
    }
}
