use std::collections::VecDeque;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sketchflight_common::Transform;
use sketchflight_scene::{
    GeometryId, Material, MaterialId, MeshData, NodeId, NodeKind, SceneError, SceneGraph,
    SceneNode,
};

/// Stable cloud handle, unique for the life of a `CloudField`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CloudId(pub u64);

/// Cloud placement and drift parameters. Ranges are `min + random * span`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub per_chunk: usize,
    /// Fraction of the chunk size used for lateral scatter.
    pub lateral_spread: f64,
    /// Fraction of the chunk size used for scatter along the flight axis.
    pub depth_spread: f64,
    pub altitude_min: f64,
    pub altitude_span: f64,
    pub width_min: f64,
    pub width_span: f64,
    pub height_min: f64,
    pub height_span: f64,
    pub depth_min: f64,
    pub depth_span: f64,
    /// Drift speed along +Z in world units per millisecond.
    pub drift_min: f64,
    pub drift_span: f64,
    /// Extra boxes clustered around the main body.
    pub accents_min: u32,
    pub accents_max: u32,
    pub color: [f32; 3],
    pub opacity: f32,
    pub retire_distance: f64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            per_chunk: 8,
            lateral_spread: 0.6,
            depth_spread: 0.8,
            altitude_min: 75.0,
            altitude_span: 25.0,
            width_min: 18.0,
            width_span: 20.0,
            height_min: 3.0,
            height_span: 3.0,
            depth_min: 12.0,
            depth_span: 15.0,
            drift_min: 0.01,
            drift_span: 0.008,
            accents_min: 1,
            accents_max: 3,
            color: [1.0, 1.0, 1.0],
            opacity: 0.7,
            retire_distance: 4000.0,
        }
    }
}

/// One box of a cloud, placed relative to the cloud body.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudPart {
    pub node: NodeId,
    pub geometry: GeometryId,
    pub offset: Vec3,
}

/// A blocky drifting cloud.
///
/// Position along Z is `origin_z + (now - spawned_at_ms) * drift_speed`; nothing
/// is accumulated frame to frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Cloud {
    pub id: CloudId,
    pub x: f64,
    pub y: f64,
    pub origin_z: f64,
    pub drift_speed: f64,
    pub spawned_at_ms: f64,
    pub material: MaterialId,
    /// The body is always `parts[0]` with a zero offset.
    pub parts: Vec<CloudPart>,
}

impl Cloud {
    pub fn z_at(&self, now_ms: f64) -> f64 {
        self.origin_z + (now_ms - self.spawned_at_ms) * self.drift_speed
    }

    pub fn position_at(&self, now_ms: f64) -> glam::DVec3 {
        glam::DVec3::new(self.x, self.y, self.z_at(now_ms))
    }
}

struct PartShape {
    size: Vec3,
    offset: Vec3,
}

/// Drifting clouds, spawned per terrain chunk and retired front-first.
#[derive(Debug)]
pub struct CloudField {
    config: CloudConfig,
    rng: ChaCha8Rng,
    clouds: VecDeque<Cloud>,
    next_id: u64,
}

impl CloudField {
    pub fn new(config: CloudConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            clouds: VecDeque::new(),
            next_id: 0,
        }
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    pub fn clouds(&self) -> impl ExactSizeIterator<Item = &Cloud> {
        self.clouds.iter()
    }

    pub fn len(&self) -> usize {
        self.clouds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clouds.is_empty()
    }

    /// Scatter `per_chunk` clouds over the chunk at `chunk_origin_z`.
    ///
    /// The batch is all or nothing: if any cloud fails, the ones already
    /// spawned for this chunk are released before the error is returned.
    pub fn spawn_for_chunk(
        &mut self,
        chunk_origin_z: f64,
        chunk_size: f64,
        now_ms: f64,
        scene: &mut SceneGraph,
    ) -> Result<Vec<CloudId>, SceneError> {
        let mut ids = Vec::with_capacity(self.config.per_chunk);
        for _ in 0..self.config.per_chunk {
            match self.spawn_one(chunk_origin_z, chunk_size, now_ms, scene) {
                Ok(cloud) => {
                    ids.push(cloud.id);
                    self.clouds.push_back(cloud);
                }
                Err(e) => {
                    self.rollback(ids.len(), scene)?;
                    tracing::warn!(chunk_origin_z, rolled_back = ids.len(), "cloud batch failed");
                    return Err(e);
                }
            }
        }
        tracing::debug!(chunk_origin_z, count = ids.len(), "clouds spawned");
        Ok(ids)
    }

    /// Release the `count` most recently spawned clouds.
    fn rollback(&mut self, count: usize, scene: &mut SceneGraph) -> Result<(), SceneError> {
        for _ in 0..count {
            if let Some(cloud) = self.clouds.pop_back() {
                release_cloud(cloud, scene)?;
            }
        }
        Ok(())
    }

    /// Move every cloud to its position at `now_ms`, then retire stale clouds
    /// from the front. Returns the retired ids.
    pub fn tick(
        &mut self,
        now_ms: f64,
        leader_z: f64,
        scene: &mut SceneGraph,
    ) -> Result<Vec<CloudId>, SceneError> {
        let _span = tracing::info_span!("cloud_tick").entered();
        for cloud in &self.clouds {
            let base = cloud.position_at(now_ms).as_vec3();
            for part in &cloud.parts {
                scene.set_transform(part.node, Transform::from_translation(base + part.offset))?;
            }
        }

        let horizon = leader_z - self.config.retire_distance;
        let mut retired = Vec::new();
        while self.clouds.front().is_some_and(|c| c.z_at(now_ms) < horizon) {
            if let Some(cloud) = self.clouds.pop_front() {
                retired.push(cloud.id);
                release_cloud(cloud, scene)?;
            }
        }
        if !retired.is_empty() {
            tracing::debug!(count = retired.len(), resident = self.clouds.len(), "clouds retired");
        }
        Ok(retired)
    }

    pub fn teardown(&mut self, scene: &mut SceneGraph) -> Result<usize, SceneError> {
        let count = self.clouds.len();
        while let Some(cloud) = self.clouds.pop_front() {
            release_cloud(cloud, scene)?;
        }
        tracing::info!(clouds = count, "clouds released");
        Ok(count)
    }

    fn spawn_one(
        &mut self,
        chunk_origin_z: f64,
        chunk_size: f64,
        now_ms: f64,
        scene: &mut SceneGraph,
    ) -> Result<Cloud, SceneError> {
        let c = &self.config;
        let rng = &mut self.rng;
        let x = centered(rng, chunk_size * c.lateral_spread * 0.5);
        let y = uniform(rng, c.altitude_min, c.altitude_min + c.altitude_span);
        let origin_z = chunk_origin_z + centered(rng, chunk_size * c.depth_spread * 0.5);
        let body = Vec3::new(
            uniform(rng, c.width_min, c.width_min + c.width_span) as f32,
            uniform(rng, c.height_min, c.height_min + c.height_span) as f32,
            uniform(rng, c.depth_min, c.depth_min + c.depth_span) as f32,
        );
        let drift_speed = uniform(rng, c.drift_min, c.drift_min + c.drift_span);

        let mut shapes = vec![PartShape {
            size: body,
            offset: Vec3::ZERO,
        }];
        let accents = rng.random_range(c.accents_min..=c.accents_max.max(c.accents_min));
        for _ in 0..accents {
            let size = Vec3::new(
                body.x * uniform(rng, 0.3, 0.7) as f32,
                body.y * uniform(rng, 0.6, 1.2) as f32,
                body.z * uniform(rng, 0.3, 0.7) as f32,
            );
            let offset = Vec3::new(
                centered(rng, 0.4) as f32 * body.x,
                centered(rng, 0.5) as f32 * body.y,
                centered(rng, 0.4) as f32 * body.z,
            );
            shapes.push(PartShape { size, offset });
        }

        let id = CloudId(self.next_id);
        self.next_id += 1;
        let material = scene.add_material(Material::Cloud {
            color: c.color,
            opacity: c.opacity,
        });
        let mut cloud = Cloud {
            id,
            x,
            y,
            origin_z,
            drift_speed,
            spawned_at_ms: now_ms,
            material,
            parts: Vec::with_capacity(shapes.len()),
        };

        let base = cloud.position_at(now_ms).as_vec3();
        for shape in shapes {
            match add_part(scene, material, base, &shape) {
                Ok(part) => cloud.parts.push(part),
                Err(e) => {
                    release_cloud(cloud, scene)?;
                    return Err(e);
                }
            }
        }
        Ok(cloud)
    }
}

/// Uniform value in `[lo, hi)`. A collapsed range yields `lo`.
fn uniform(rng: &mut ChaCha8Rng, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * rng.random::<f64>()
}

/// Uniform value in `[-half, half)`.
fn centered(rng: &mut ChaCha8Rng, half: f64) -> f64 {
    (rng.random::<f64>() * 2.0 - 1.0) * half
}

fn add_part(
    scene: &mut SceneGraph,
    material: MaterialId,
    base: Vec3,
    shape: &PartShape,
) -> Result<CloudPart, SceneError> {
    let geometry = scene.add_geometry(MeshData::cuboid(shape.size.x, shape.size.y, shape.size.z))?;
    let node = scene.add_node(SceneNode {
        kind: NodeKind::Cloud,
        geometry,
        material,
        transform: Transform::from_translation(base + shape.offset),
    });
    match node {
        Ok(node) => Ok(CloudPart {
            node,
            geometry,
            offset: shape.offset,
        }),
        Err(e) => {
            scene.release_geometry(geometry)?;
            Err(e)
        }
    }
}

fn release_cloud(cloud: Cloud, scene: &mut SceneGraph) -> Result<(), SceneError> {
    for part in &cloud.parts {
        scene.remove_node(part.node)?;
        scene.release_geometry(part.geometry)?;
    }
    scene.release_material(cloud.material)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchflight_scene::GeometryBudget;

    fn spawn(field: &mut CloudField, scene: &mut SceneGraph, origin: f64, now: f64) -> Vec<CloudId> {
        field.spawn_for_chunk(origin, 2000.0, now, scene).unwrap()
    }

    #[test]
    fn spawns_configured_count_within_ranges() {
        let mut scene = SceneGraph::new();
        let mut field = CloudField::new(CloudConfig::default(), 7);
        let ids = spawn(&mut field, &mut scene, 1850.0, 0.0);
        assert_eq!(ids.len(), 8);
        for cloud in field.clouds() {
            assert!(cloud.x.abs() <= 600.0);
            assert!((75.0..100.0).contains(&cloud.y));
            assert!((1850.0 - 800.0..1850.0 + 800.0).contains(&cloud.origin_z));
            assert!((0.01..0.018).contains(&cloud.drift_speed));
            assert!((2..=4).contains(&cloud.parts.len()));
            assert_eq!(cloud.parts[0].offset, Vec3::ZERO);
        }
        assert_eq!(scene.count_kind(NodeKind::Cloud), field.clouds().map(|c| c.parts.len()).sum::<usize>());
    }

    #[test]
    fn same_seed_same_sky() {
        let mut s1 = SceneGraph::new();
        let mut s2 = SceneGraph::new();
        let mut a = CloudField::new(CloudConfig::default(), 99);
        let mut b = CloudField::new(CloudConfig::default(), 99);
        spawn(&mut a, &mut s1, 0.0, 0.0);
        spawn(&mut b, &mut s2, 0.0, 0.0);
        for (x, y) in a.clouds().zip(b.clouds()) {
            assert_eq!(x.x, y.x);
            assert_eq!(x.origin_z, y.origin_z);
            assert_eq!(x.parts.len(), y.parts.len());
        }
    }

    #[test]
    fn position_is_closed_form_in_time() {
        let mut scene = SceneGraph::new();
        let mut field = CloudField::new(CloudConfig::default(), 1);
        spawn(&mut field, &mut scene, 0.0, 1000.0);
        let cloud = field.clouds().next().unwrap().clone();

        // Irregular ticks land on the same position as one jump.
        for now in [1016.0, 1033.0, 1100.0, 1999.0, 5000.0] {
            field.tick(now, 0.0, &mut scene).unwrap();
        }
        let node = scene.node(cloud.parts[0].node).unwrap();
        let expected = cloud.origin_z + 4000.0 * cloud.drift_speed;
        assert!((node.transform.position.z as f64 - expected).abs() < 1e-3);
    }

    #[test]
    fn cloud_ids_are_unique() {
        let mut scene = SceneGraph::new();
        let mut field = CloudField::new(CloudConfig::default(), 5);
        let mut ids = spawn(&mut field, &mut scene, 0.0, 0.0);
        ids.extend(spawn(&mut field, &mut scene, 1950.0, 0.0));
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }

    #[test]
    fn retires_stale_clouds_from_front() {
        let mut scene = SceneGraph::new();
        let mut field = CloudField::new(CloudConfig::default(), 11);
        let old = spawn(&mut field, &mut scene, -2050.0, 0.0);
        let fresh = spawn(&mut field, &mut scene, 10_000.0, 0.0);

        // Old clouds sit below -2050 + 800; with the leader at 6000 the horizon
        // is 2000, so all of them go. The fresh batch stays.
        let retired = field.tick(0.0, 6000.0, &mut scene).unwrap();
        assert_eq!(retired, old);
        assert_eq!(field.len(), fresh.len());
        assert_eq!(field.clouds().next().map(|c| c.id), Some(fresh[0]));
    }

    #[test]
    fn in_range_front_blocks_retirement() {
        let mut scene = SceneGraph::new();
        let mut field = CloudField::new(CloudConfig::default(), 11);
        spawn(&mut field, &mut scene, 10_000.0, 0.0);
        spawn(&mut field, &mut scene, -50_000.0, 0.0);
        let retired = field.tick(0.0, 6000.0, &mut scene).unwrap();
        assert!(retired.is_empty());
        assert_eq!(field.len(), 16);
    }

    #[test]
    fn failed_spawn_leaves_no_partial_cloud() {
        let mut scene = SceneGraph::with_budget(GeometryBudget { max_vertices: 30 });
        let mut field = CloudField::new(CloudConfig::default(), 2);
        let err = field.spawn_for_chunk(0.0, 2000.0, 0.0, &mut scene).unwrap_err();
        assert!(matches!(err, SceneError::GeometryBudgetExceeded { .. }));
        assert!(field.is_empty());
        assert_eq!(scene.geometry_count(), 0);
        assert_eq!(scene.material_count(), 0);
    }

    #[test]
    fn partial_batch_is_rolled_back() {
        // One accent per cloud: every cloud is two 24-vertex boxes.
        let config = CloudConfig {
            accents_min: 1,
            accents_max: 1,
            ..CloudConfig::default()
        };

        // Six clouds fit, the seventh does not.
        let mut scene = SceneGraph::with_budget(GeometryBudget { max_vertices: 300 });
        let mut field = CloudField::new(config.clone(), 2);
        let err = field.spawn_for_chunk(0.0, 2000.0, 0.0, &mut scene).unwrap_err();
        assert!(matches!(err, SceneError::GeometryBudgetExceeded { .. }));
        assert!(field.is_empty());
        assert!(scene.is_empty());
        assert_eq!(scene.resident_vertices(), 0);

        // A full batch of 384 vertices, then four of the next batch before it fails.
        let mut scene = SceneGraph::with_budget(GeometryBudget { max_vertices: 584 });
        let mut field = CloudField::new(config, 2);
        let kept = spawn(&mut field, &mut scene, 0.0, 0.0);
        assert_eq!(scene.resident_vertices(), 384);
        assert!(field.spawn_for_chunk(1950.0, 2000.0, 0.0, &mut scene).is_err());
        assert_eq!(field.clouds().map(|c| c.id).collect::<Vec<_>>(), kept);
        assert_eq!(scene.resident_vertices(), 384);
        assert_eq!(scene.material_count(), 8);
    }

    #[test]
    fn teardown_releases_all() {
        let mut scene = SceneGraph::new();
        let mut field = CloudField::new(CloudConfig::default(), 3);
        spawn(&mut field, &mut scene, 0.0, 0.0);
        assert_eq!(field.teardown(&mut scene).unwrap(), 8);
        assert!(scene.is_empty());
        assert_eq!(scene.material_count(), 0);
    }
}
