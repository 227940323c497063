use std::time::Instant;

use glam::{Quat, Vec3};
use sketchflight_common::{Transform, Viewport};
use sketchflight_flight::{CameraPose, CameraRig, FlightController, Formation};
use sketchflight_input::{Action, ClimbTrigger};
use sketchflight_render::RenderView;
use sketchflight_scene::{
    GeometryBudget, GeometryId, Material, MaterialId, MeshData, NodeId, NodeKind, SceneError,
    SceneGraph, SceneNode,
};
use sketchflight_stream::{
    CloudField, FrameTimer, HeightField, StreamStats, TerrainStreamer,
};

use crate::config::{ConfigError, SessionConfig};

/// Errors surfaced to the host by a running session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("session already torn down")]
    TornDown,
}

#[derive(Debug, Clone, Copy)]
struct OwnedNode {
    node: NodeId,
    geometry: GeometryId,
}

/// One flight over streamed terrain: owns the scene and every component that
/// writes to it, and advances them together once per frame.
#[derive(Debug)]
pub struct FlightSession {
    config: SessionConfig,
    scene: SceneGraph,
    terrain: TerrainStreamer,
    clouds: CloudField,
    flight: FlightController,
    rig: CameraRig,
    formation: Formation,
    trigger: ClimbTrigger,
    sky: OwnedNode,
    sky_material: MaterialId,
    birds: Vec<OwnedNode>,
    ink_material: MaterialId,
    normal_material: MaterialId,
    now_ms: f64,
    stats: StreamStats,
    frame_timer: FrameTimer,
    torn_down: bool,
}

impl FlightSession {
    /// Build the scene: primed terrain with its clouds, the sky dome and the
    /// formation, then run the first tick at time zero.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let _span = tracing::info_span!("session_init").entered();

        let mut scene = SceneGraph::with_budget(GeometryBudget {
            max_vertices: config.max_vertices,
        });
        let mut terrain = TerrainStreamer::new(
            config.terrain.clone(),
            HeightField::new(config.height_field.clone()),
            &mut scene,
        );
        let mut clouds = CloudField::new(config.clouds.clone(), config.seed);
        let chunk_size = config.terrain.chunk_size;
        for origin in terrain.prime(&mut scene)? {
            let ids = clouds.spawn_for_chunk(origin, chunk_size, 0.0, &mut scene)?;
            terrain.record_clouds(origin, &ids);
        }

        let flight = FlightController::new(config.flight.clone());
        let rig = CameraRig::new(config.camera.clone());
        let formation = Formation::new(config.formation.clone());

        let sky_material = scene.add_material(Material::Sky(config.sky));
        let sky_geometry = scene.add_geometry(MeshData::uv_sphere(
            config.camera.sky_radius as f32,
            32,
            15,
        ))?;
        let eye = rig.pose(&flight, 0.0).eye.as_vec3();
        let sky_node = scene.add_node(SceneNode {
            kind: NodeKind::Sky,
            geometry: sky_geometry,
            material: sky_material,
            transform: Transform::from_translation(eye),
        })?;

        let ink_material = scene.add_material(Material::Ink {
            color: config.sketch.ink_color,
        });
        let flap = &formation.config().flap;
        let mut birds = Vec::with_capacity(formation.len());
        for pose in formation.poses(&flight, 0.0) {
            let geometry = scene.add_geometry(flap.bird_mesh(&pose.wings))?;
            let node = scene.add_node(SceneNode {
                kind: NodeKind::Actor,
                geometry,
                material: ink_material,
                transform: Transform::from_translation(pose.position.as_vec3()),
            })?;
            birds.push(OwnedNode { node, geometry });
        }

        let normal_material = scene.add_material(Material::Normal);

        let mut session = Self {
            config,
            scene,
            terrain,
            clouds,
            flight,
            rig,
            formation,
            trigger: ClimbTrigger::new(),
            sky: OwnedNode {
                node: sky_node,
                geometry: sky_geometry,
            },
            sky_material,
            birds,
            ink_material,
            normal_material,
            now_ms: 0.0,
            stats: StreamStats::default(),
            frame_timer: FrameTimer::new(120),
            torn_down: false,
        };
        session.tick(0.0)?;
        tracing::info!(
            chunks = session.terrain.len(),
            clouds = session.clouds.len(),
            birds = session.birds.len(),
            "session ready"
        );
        Ok(session)
    }

    /// Advance everything to absolute session time `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> Result<&StreamStats, SessionError> {
        if self.torn_down {
            return Err(SessionError::TornDown);
        }
        let _span = tracing::info_span!("session_tick", now_ms).entered();
        let started = Instant::now();
        self.now_ms = now_ms;

        let leader_z = self.flight.lead_z(now_ms);
        let update = self.terrain.tick(leader_z, &mut self.scene)?;
        let mut spawned = 0;
        if let Some(origin) = update.created {
            let ids = self.clouds.spawn_for_chunk(
                origin,
                self.config.terrain.chunk_size,
                now_ms,
                &mut self.scene,
            )?;
            spawned = ids.len();
            self.terrain.record_clouds(origin, &ids);
        }
        let retired_clouds = self.clouds.tick(now_ms, leader_z, &mut self.scene)?;

        self.update_birds(now_ms)?;
        let pose = self.camera_pose();
        let sky_center = self.rig.sky_center(&pose).as_vec3();
        self.scene
            .set_transform(self.sky.node, Transform::from_translation(sky_center))?;

        let elapsed = started.elapsed();
        self.frame_timer.record(elapsed);
        self.stats = StreamStats {
            chunks_created: usize::from(update.created.is_some()),
            chunks_retired: update.retired.len(),
            clouds_spawned: spawned,
            clouds_retired: retired_clouds.len(),
            resident_chunks: self.terrain.len(),
            resident_clouds: self.clouds.len(),
            tick_time: elapsed,
        };
        tracing::trace!(
            leader_z,
            chunks = self.stats.resident_chunks,
            clouds = self.stats.resident_clouds,
            "tick complete"
        );
        Ok(&self.stats)
    }

    fn update_birds(&mut self, now_ms: f64) -> Result<(), SceneError> {
        let flap = &self.formation.config().flap;
        for (bird, pose) in self
            .birds
            .iter()
            .zip(self.formation.poses(&self.flight, now_ms))
        {
            self.scene
                .replace_geometry(bird.geometry, flap.bird_mesh(&pose.wings))?;
            let transform = Transform {
                position: pose.position.as_vec3(),
                rotation: Quat::from_rotation_x(pose.pitch as f32),
                scale: Vec3::ONE,
            };
            self.scene.set_transform(bird.node, transform)?;
        }
        Ok(())
    }

    /// Start the climb. Only the first request has any effect.
    pub fn begin_climb(&mut self, now_ms: f64) -> bool {
        match self.trigger.fire(now_ms) {
            Some(at) => self.flight.trigger_climb(at),
            None => false,
        }
    }

    /// Apply a host action. Returns true if the session changed.
    ///
    /// Resize, overlay and quit are for the host and renderer; the session
    /// ignores them.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::BeginClimb { at_ms } => self.begin_climb(at_ms),
            Action::Resize { .. } | Action::ToggleInspector | Action::Quit => false,
        }
    }

    pub fn camera_pose(&self) -> CameraPose {
        self.rig.pose(&self.flight, self.now_ms)
    }

    /// View for the renderer at the current time.
    pub fn render_view(&self, viewport: Viewport) -> RenderView {
        let pose = self.camera_pose();
        let camera = self.rig.config();
        RenderView {
            eye: pose.eye.as_vec3(),
            target: pose.target.as_vec3(),
            fov_degrees: camera.fov_y_degrees as f32,
            near: camera.near as f32,
            far: camera.far as f32,
            time_ms: self.now_ms,
            viewport,
        }
    }

    /// Release every resource the session put in the scene. Further ticks fail.
    pub fn teardown(&mut self) -> Result<(), SessionError> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        let chunks = self.terrain.teardown(&mut self.scene)?;
        let clouds = self.clouds.teardown(&mut self.scene)?;
        for bird in self.birds.drain(..) {
            self.scene.remove_node(bird.node)?;
            self.scene.release_geometry(bird.geometry)?;
        }
        self.scene.remove_node(self.sky.node)?;
        self.scene.release_geometry(self.sky.geometry)?;
        self.scene.release_material(self.sky_material)?;
        self.scene.release_material(self.ink_material)?;
        self.scene.release_material(self.normal_material)?;
        tracing::info!(chunks, clouds, "session torn down");
        Ok(())
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Mutable scene access for renderers that scope a material override.
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn terrain(&self) -> &TerrainStreamer {
        &self.terrain
    }

    pub fn clouds(&self) -> &CloudField {
        &self.clouds
    }

    pub fn flight(&self) -> &FlightController {
        &self.flight
    }

    pub fn formation(&self) -> &Formation {
        &self.formation
    }

    /// Material the normal pass overrides every node with.
    pub fn normal_material(&self) -> MaterialId {
        self.normal_material
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn frame_timer(&self) -> &FrameTimer {
        &self.frame_timer
    }
}
