use std::collections::VecDeque;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use sketchflight_common::Transform;
use sketchflight_scene::{
    GeometryId, Material, MaterialId, MeshData, NodeId, NodeKind, SceneError, SceneGraph,
    SceneNode, TerrainPalette,
};

use crate::clouds::CloudId;
use crate::heightfield::HeightField;

/// Terrain window configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Side length of a square chunk, in world units.
    pub chunk_size: f64,
    /// Quads per chunk side.
    pub segments: u32,
    /// Amount each chunk overlaps its predecessor along the flight axis.
    pub overlap: f64,
    /// Chunks whose origin falls further than this behind the leader are retired.
    pub retire_distance: f64,
    /// The "previous" origin before any chunk exists. The first chunk lands at
    /// `initial_last_origin + chunk_size - overlap`.
    pub initial_last_origin: f64,
    /// Chunks built unconditionally at startup.
    pub initial_chunks: usize,
    /// Extra width and depth of the foundation box beyond the chunk.
    pub foundation_margin: f64,
    /// Vertical extent of the foundation box.
    pub foundation_depth: f64,
    /// Distance between the lowest possible surface and the foundation top.
    pub foundation_gap: f64,
    pub palette: TerrainPalette,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000.0,
            segments: 150,
            overlap: 50.0,
            retire_distance: 4000.0,
            initial_last_origin: -4000.0,
            initial_chunks: 5,
            foundation_margin: 200.0,
            foundation_depth: 600.0,
            foundation_gap: 2.0,
            palette: TerrainPalette::default(),
        }
    }
}

impl TerrainConfig {
    /// Distance between consecutive chunk origins.
    pub fn stride(&self) -> f64 {
        self.chunk_size - self.overlap
    }
}

/// One resident slab of terrain: a displaced surface plus a solid box below it.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainChunk {
    pub origin_z: f64,
    pub surface_node: NodeId,
    pub surface_geometry: GeometryId,
    pub foundation_node: NodeId,
    pub foundation_geometry: GeometryId,
    /// Clouds spawned alongside this chunk. They are retired on their own schedule.
    pub spawned_clouds: Vec<CloudId>,
}

/// What one `tick` changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamUpdate {
    /// Origin of the chunk created this tick, if any.
    pub created: Option<f64>,
    /// Origins of chunks retired this tick, front first.
    pub retired: Vec<f64>,
}

/// Sliding window of terrain chunks along +Z.
///
/// Chunks live in a deque ordered by origin. New chunks are pushed at the back,
/// stale ones popped from the front.
#[derive(Debug)]
pub struct TerrainStreamer {
    config: TerrainConfig,
    field: HeightField,
    material: MaterialId,
    chunks: VecDeque<TerrainChunk>,
    last_origin_z: f64,
}

impl TerrainStreamer {
    /// Register the shared terrain material. No chunks are built until
    /// [`prime`](Self::prime) or [`tick`](Self::tick).
    pub fn new(config: TerrainConfig, field: HeightField, scene: &mut SceneGraph) -> Self {
        let material = scene.add_material(Material::Terrain(config.palette));
        let last_origin_z = config.initial_last_origin;
        Self {
            config,
            field,
            material,
            chunks: VecDeque::new(),
            last_origin_z,
        }
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn field(&self) -> &HeightField {
        &self.field
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn chunks(&self) -> impl ExactSizeIterator<Item = &TerrainChunk> {
        self.chunks.iter()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Origin of the most recently created chunk (or the initial sentinel).
    pub fn last_origin_z(&self) -> f64 {
        self.last_origin_z
    }

    /// Build the startup chunks. Returns their origins in creation order.
    pub fn prime(&mut self, scene: &mut SceneGraph) -> Result<Vec<f64>, SceneError> {
        let mut created = Vec::with_capacity(self.config.initial_chunks);
        for _ in 0..self.config.initial_chunks {
            created.push(self.push_chunk(scene)?);
        }
        tracing::info!(chunks = created.len(), "terrain primed");
        Ok(created)
    }

    /// Advance the window for a leader at `leader_z`.
    ///
    /// At most one chunk is created per call; retirement pops every stale chunk
    /// from the front and stops at the first one still in range.
    pub fn tick(
        &mut self,
        leader_z: f64,
        scene: &mut SceneGraph,
    ) -> Result<StreamUpdate, SceneError> {
        let _span = tracing::info_span!("terrain_tick").entered();
        let mut update = StreamUpdate::default();

        if leader_z > self.last_origin_z - self.config.chunk_size {
            update.created = Some(self.push_chunk(scene)?);
        }

        let horizon = leader_z - self.config.retire_distance;
        while self.chunks.front().is_some_and(|c| c.origin_z < horizon) {
            if let Some(chunk) = self.chunks.pop_front() {
                update.retired.push(chunk.origin_z);
                release_chunk(chunk, scene)?;
            }
        }

        if update.created.is_some() || !update.retired.is_empty() {
            tracing::debug!(
                leader_z,
                created = ?update.created,
                retired = update.retired.len(),
                resident = self.chunks.len(),
                "terrain window moved"
            );
        }
        Ok(update)
    }

    /// Attach cloud ids to the chunk created at `origin_z`.
    pub fn record_clouds(&mut self, origin_z: f64, clouds: &[CloudId]) {
        if let Some(chunk) = self.chunks.iter_mut().rev().find(|c| c.origin_z == origin_z) {
            chunk.spawned_clouds.extend_from_slice(clouds);
        }
    }

    /// Release every chunk and the shared material.
    pub fn teardown(&mut self, scene: &mut SceneGraph) -> Result<usize, SceneError> {
        let count = self.chunks.len();
        while let Some(chunk) = self.chunks.pop_front() {
            release_chunk(chunk, scene)?;
        }
        scene.release_material(self.material)?;
        tracing::info!(chunks = count, "terrain released");
        Ok(count)
    }

    /// Surface mesh for a chunk at `origin_z`, in chunk-local coordinates.
    ///
    /// Vertex heights come from the world-space position, so two chunks that
    /// cover the same world point agree on its height.
    pub fn build_surface(&self, origin_z: f64) -> MeshData {
        let field = &self.field;
        MeshData::displaced_grid(
            self.config.chunk_size as f32,
            self.config.segments,
            |x, z| field.height(x as f64, origin_z + z as f64) as f32,
        )
    }

    fn foundation_top(&self) -> f64 {
        self.field.min_height() - self.config.foundation_gap
    }

    fn push_chunk(&mut self, scene: &mut SceneGraph) -> Result<f64, SceneError> {
        let origin_z = self.last_origin_z + self.config.stride();
        let chunk = self.build_chunk(origin_z, scene)?;
        self.chunks.push_back(chunk);
        self.last_origin_z = origin_z;
        Ok(origin_z)
    }

    fn build_chunk(&self, origin_z: f64, scene: &mut SceneGraph) -> Result<TerrainChunk, SceneError> {
        let surface_geometry = scene.add_geometry(self.build_surface(origin_z))?;

        let footprint = (self.config.chunk_size + self.config.foundation_margin) as f32;
        let depth = self.config.foundation_depth as f32;
        let foundation_geometry = match scene.add_geometry(MeshData::cuboid(footprint, depth, footprint)) {
            Ok(id) => id,
            Err(e) => {
                scene.release_geometry(surface_geometry)?;
                return Err(e);
            }
        };

        let surface_node = scene.add_node(SceneNode {
            kind: NodeKind::Surface,
            geometry: surface_geometry,
            material: self.material,
            transform: Transform::from_translation(Vec3::new(0.0, 0.0, origin_z as f32)),
        })?;
        let foundation_y = self.foundation_top() as f32 - depth * 0.5;
        let foundation_node = scene.add_node(SceneNode {
            kind: NodeKind::Foundation,
            geometry: foundation_geometry,
            material: self.material,
            transform: Transform::from_translation(Vec3::new(0.0, foundation_y, origin_z as f32)),
        })?;

        tracing::trace!(origin_z, "chunk built");
        Ok(TerrainChunk {
            origin_z,
            surface_node,
            surface_geometry,
            foundation_node,
            foundation_geometry,
            spawned_clouds: Vec::new(),
        })
    }
}

fn release_chunk(chunk: TerrainChunk, scene: &mut SceneGraph) -> Result<(), SceneError> {
    scene.remove_node(chunk.surface_node)?;
    scene.remove_node(chunk.foundation_node)?;
    scene.release_geometry(chunk.surface_geometry)?;
    scene.release_geometry(chunk.foundation_geometry)?;
    tracing::trace!(origin_z = chunk.origin_z, "chunk released");
    Ok(())
}
