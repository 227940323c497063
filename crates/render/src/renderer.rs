use std::fmt::Write as _;

use glam::Vec3;
use sketchflight_common::Viewport;
use sketchflight_scene::{NodeKind, SceneGraph};

/// Camera and frame parameters for one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Session clock, drives shader animation.
    pub time_ms: f64,
    pub viewport: Viewport,
}

impl RenderView {
    pub fn new(eye: Vec3, target: Vec3, viewport: Viewport) -> Self {
        Self {
            eye,
            target,
            fov_degrees: 60.0,
            near: 0.1,
            far: 10_000.0,
            time_ms: 0.0,
            viewport,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.aspect()
    }
}

/// Renderer-agnostic interface.
///
/// Renderers read the scene and a view and produce output. They never
/// change what is in the scene.
pub trait Renderer {
    type Output;

    fn render(&self, scene: &SceneGraph, view: &RenderView) -> Self::Output;
}

/// Produces a human-readable frame summary. Used by the CLI and in tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// List every terrain surface with its position.
    pub list_surfaces: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_surfaces() -> Self {
        Self {
            list_surfaces: true,
        }
    }
}

fn kind_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Sky => "sky",
        NodeKind::Surface => "surface",
        NodeKind::Foundation => "foundation",
        NodeKind::Cloud => "cloud",
        NodeKind::Actor => "actor",
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &SceneGraph, view: &RenderView) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame (t={:.3}s, {}x{}) ===",
            view.time_ms / 1000.0,
            view.viewport.width(),
            view.viewport.height()
        );

        let kinds = [
            NodeKind::Sky,
            NodeKind::Surface,
            NodeKind::Foundation,
            NodeKind::Cloud,
            NodeKind::Actor,
        ];
        let breakdown: Vec<String> = kinds
            .iter()
            .map(|k| format!("{} {}", kind_label(*k), scene.count_kind(*k)))
            .collect();
        let _ = writeln!(out, "Nodes: {} ({})", scene.node_count(), breakdown.join(", "));
        let _ = writeln!(
            out,
            "Geometry: {} meshes, {} vertices",
            scene.geometry_count(),
            scene.resident_vertices()
        );
        let override_label = scene
            .active_override()
            .and_then(|id| scene.material(id))
            .map_or("none", |m| m.label());
        let _ = writeln!(
            out,
            "Materials: {} (override: {override_label})",
            scene.material_count()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z,
            view.fov_degrees
        );

        if self.list_surfaces {
            for (id, node) in scene.nodes() {
                if node.kind == NodeKind::Surface {
                    let _ = writeln!(
                        out,
                        "  [surface {}] z={:.1}",
                        id.0, node.transform.position.z
                    );
                }
            }
        }
        out
    }
}
