use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use sketchflight_common::Transform;

use crate::material::Material;
use crate::mesh::MeshData;

/// Handle to geometry owned by the scene registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeometryId(pub u64);

/// Handle to a material owned by the scene registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u64);

/// Handle to a placed, renderable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// What a node represents. Used for draw ordering and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Sky,
    Surface,
    Foundation,
    Cloud,
    Actor,
}

/// A renderable node: geometry drawn with a material at a transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub transform: Transform,
}

/// Change notifications consumed by render backends to mirror GPU resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    GeometryAdded(GeometryId),
    GeometryUpdated(GeometryId),
    GeometryReleased(GeometryId),
    MaterialAdded(MaterialId),
    MaterialReleased(MaterialId),
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
}

impl SceneEvent {
    /// Raw id of the object the event is about. Ids are unique across kinds.
    fn subject(&self) -> u64 {
        match *self {
            SceneEvent::GeometryAdded(id)
            | SceneEvent::GeometryUpdated(id)
            | SceneEvent::GeometryReleased(id) => id.0,
            SceneEvent::MaterialAdded(id) | SceneEvent::MaterialReleased(id) => id.0,
            SceneEvent::NodeAdded(id) | SceneEvent::NodeRemoved(id) => id.0,
        }
    }
}

/// Fold a new change into the one already pending for the same object.
/// `None` means the two cancel out.
fn coalesce(pending: SceneEvent, next: SceneEvent) -> Option<SceneEvent> {
    match (pending, next) {
        (SceneEvent::GeometryAdded(_), SceneEvent::GeometryUpdated(_)) => Some(pending),
        (SceneEvent::GeometryAdded(_), SceneEvent::GeometryReleased(_))
        | (SceneEvent::MaterialAdded(_), SceneEvent::MaterialReleased(_))
        | (SceneEvent::NodeAdded(_), SceneEvent::NodeRemoved(_)) => None,
        (_, next) => Some(next),
    }
}

/// Errors from scene registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("geometry budget exceeded: requested {requested} vertices, {available} available")]
    GeometryBudgetExceeded { requested: usize, available: usize },
    #[error("geometry {0:?} not found")]
    UnknownGeometry(GeometryId),
    #[error("geometry {0:?} is still referenced by a node")]
    GeometryInUse(GeometryId),
    #[error("material {0:?} not found")]
    UnknownMaterial(MaterialId),
    #[error("material {0:?} is still referenced by a node")]
    MaterialInUse(MaterialId),
    #[error("node {0:?} not found")]
    UnknownNode(NodeId),
}

/// Upper bound on resident vertices across all geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryBudget {
    pub max_vertices: usize,
}

impl Default for GeometryBudget {
    fn default() -> Self {
        // Roughly 300 terrain chunks at 151x151 samples.
        Self {
            max_vertices: 8_000_000,
        }
    }
}

/// The scene registry.
///
/// Owns geometry and materials by id and keeps at most one pending change per
/// object until a consumer drains them, so the backlog never outgrows the
/// objects it describes. Transforms are read directly each frame and are not
/// tracked.
#[derive(Debug, Default)]
pub struct SceneGraph {
    geometries: BTreeMap<GeometryId, MeshData>,
    materials: BTreeMap<MaterialId, Material>,
    nodes: BTreeMap<NodeId, SceneNode>,
    next_id: u64,
    budget: GeometryBudget,
    resident_vertices: usize,
    material_override: Option<MaterialId>,
    pending: BTreeMap<u64, SceneEvent>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(budget: GeometryBudget) -> Self {
        Self {
            budget,
            ..Self::default()
        }
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // --- Geometry ---

    /// Register geometry. Fails without side effects when the vertex budget
    /// would be exceeded.
    pub fn add_geometry(&mut self, mesh: MeshData) -> Result<GeometryId, SceneError> {
        let requested = mesh.vertex_count();
        let available = self.budget.max_vertices.saturating_sub(self.resident_vertices);
        if requested > available {
            tracing::error!(requested, available, "geometry budget exceeded");
            return Err(SceneError::GeometryBudgetExceeded {
                requested,
                available,
            });
        }
        let id = GeometryId(self.allocate());
        self.resident_vertices += requested;
        self.geometries.insert(id, mesh);
        self.record(SceneEvent::GeometryAdded(id));
        Ok(id)
    }

    /// Replace the contents of existing geometry (animated actors).
    pub fn replace_geometry(&mut self, id: GeometryId, mesh: MeshData) -> Result<(), SceneError> {
        let old = self
            .geometries
            .get(&id)
            .ok_or(SceneError::UnknownGeometry(id))?
            .vertex_count();
        let available = self
            .budget
            .max_vertices
            .saturating_sub(self.resident_vertices - old);
        if mesh.vertex_count() > available {
            return Err(SceneError::GeometryBudgetExceeded {
                requested: mesh.vertex_count(),
                available,
            });
        }
        self.resident_vertices = self.resident_vertices - old + mesh.vertex_count();
        self.geometries.insert(id, mesh);
        self.record(SceneEvent::GeometryUpdated(id));
        Ok(())
    }

    /// Release geometry. Nodes referencing it must be removed first.
    pub fn release_geometry(&mut self, id: GeometryId) -> Result<MeshData, SceneError> {
        if self.nodes.values().any(|n| n.geometry == id) {
            return Err(SceneError::GeometryInUse(id));
        }
        let mesh = self
            .geometries
            .remove(&id)
            .ok_or(SceneError::UnknownGeometry(id))?;
        self.resident_vertices -= mesh.vertex_count();
        self.record(SceneEvent::GeometryReleased(id));
        Ok(mesh)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&MeshData> {
        self.geometries.get(&id)
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn resident_vertices(&self) -> usize {
        self.resident_vertices
    }

    pub fn budget(&self) -> GeometryBudget {
        self.budget
    }

    // --- Materials ---

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.allocate());
        self.materials.insert(id, material);
        self.record(SceneEvent::MaterialAdded(id));
        id
    }

    pub fn release_material(&mut self, id: MaterialId) -> Result<Material, SceneError> {
        if self.nodes.values().any(|n| n.material == id) {
            return Err(SceneError::MaterialInUse(id));
        }
        let material = self
            .materials
            .remove(&id)
            .ok_or(SceneError::UnknownMaterial(id))?;
        self.record(SceneEvent::MaterialReleased(id));
        Ok(material)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    // --- Nodes ---

    pub fn add_node(&mut self, node: SceneNode) -> Result<NodeId, SceneError> {
        if !self.geometries.contains_key(&node.geometry) {
            return Err(SceneError::UnknownGeometry(node.geometry));
        }
        if !self.materials.contains_key(&node.material) {
            return Err(SceneError::UnknownMaterial(node.material));
        }
        let id = NodeId(self.allocate());
        self.nodes.insert(id, node);
        self.record(SceneEvent::NodeAdded(id));
        Ok(id)
    }

    pub fn remove_node(&mut self, id: NodeId) -> Result<SceneNode, SceneError> {
        let node = self.nodes.remove(&id).ok_or(SceneError::UnknownNode(id))?;
        self.record(SceneEvent::NodeRemoved(id));
        Ok(node)
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::UnknownNode(id))?;
        node.transform = transform;
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> &BTreeMap<NodeId, SceneNode> {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|n| n.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.geometries.is_empty() && self.materials.is_empty()
    }

    // --- Events ---

    fn record(&mut self, event: SceneEvent) {
        match self.pending.entry(event.subject()) {
            Entry::Vacant(slot) => {
                slot.insert(event);
            }
            Entry::Occupied(mut slot) => match coalesce(*slot.get(), event) {
                Some(merged) => {
                    slot.insert(merged);
                }
                None => {
                    slot.remove();
                }
            },
        }
    }

    /// Take every pending change, oldest object first.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.pending).into_values().collect()
    }

    /// Pending changes, oldest object first.
    pub fn events(&self) -> impl Iterator<Item = &SceneEvent> {
        self.pending.values()
    }

    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    // --- Material override ---

    /// Draw every node with `material` until the returned guard is dropped.
    ///
    /// The previous override (if any) is restored on every exit path,
    /// including early returns and unwinding.
    pub fn override_materials(
        &mut self,
        material: MaterialId,
    ) -> Result<MaterialOverride<'_>, SceneError> {
        if !self.materials.contains_key(&material) {
            return Err(SceneError::UnknownMaterial(material));
        }
        let previous = self.material_override.replace(material);
        Ok(MaterialOverride {
            scene: self,
            previous,
        })
    }

    pub fn active_override(&self) -> Option<MaterialId> {
        self.material_override
    }

    /// The material a node is drawn with right now.
    pub fn effective_material(&self, node: &SceneNode) -> MaterialId {
        self.material_override.unwrap_or(node.material)
    }
}

/// Scoped material override. Restores the previous state when dropped.
pub struct MaterialOverride<'a> {
    scene: &'a mut SceneGraph,
    previous: Option<MaterialId>,
}

impl Deref for MaterialOverride<'_> {
    type Target = SceneGraph;

    fn deref(&self) -> &SceneGraph {
        self.scene
    }
}

impl Drop for MaterialOverride<'_> {
    fn drop(&mut self) {
        self.scene.material_override = self.previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::TerrainPalette;

    fn node(geometry: GeometryId, material: MaterialId) -> SceneNode {
        SceneNode {
            kind: NodeKind::Surface,
            geometry,
            material,
            transform: Transform::default(),
        }
    }

    #[test]
    fn add_and_remove_round_trip() {
        let mut scene = SceneGraph::new();
        let g = scene.add_geometry(MeshData::cuboid(1.0, 1.0, 1.0)).unwrap();
        let m = scene.add_material(Material::Normal);
        let n = scene.add_node(node(g, m)).unwrap();
        assert_eq!(scene.node_count(), 1);
        assert_eq!(scene.resident_vertices(), 24);

        scene.remove_node(n).unwrap();
        scene.release_geometry(g).unwrap();
        scene.release_material(m).unwrap();
        assert!(scene.is_empty());
        assert_eq!(scene.resident_vertices(), 0);
    }

    #[test]
    fn ids_are_monotonic_and_unique() {
        let mut scene = SceneGraph::new();
        let a = scene.add_geometry(MeshData::default()).unwrap();
        let b = scene.add_geometry(MeshData::default()).unwrap();
        let m = scene.add_material(Material::Normal);
        assert!(a < b);
        assert!(m.0 > b.0);
    }

    #[test]
    fn referenced_geometry_cannot_be_released() {
        let mut scene = SceneGraph::new();
        let g = scene.add_geometry(MeshData::cuboid(1.0, 1.0, 1.0)).unwrap();
        let m = scene.add_material(Material::Normal);
        scene.add_node(node(g, m)).unwrap();
        assert_eq!(scene.release_geometry(g), Err(SceneError::GeometryInUse(g)));
        assert_eq!(scene.release_material(m), Err(SceneError::MaterialInUse(m)));
    }

    #[test]
    fn node_requires_known_handles() {
        let mut scene = SceneGraph::new();
        let m = scene.add_material(Material::Normal);
        let err = scene.add_node(node(GeometryId(99), m)).unwrap_err();
        assert_eq!(err, SceneError::UnknownGeometry(GeometryId(99)));
    }

    #[test]
    fn budget_exhaustion_is_reported() {
        let mut scene = SceneGraph::with_budget(GeometryBudget { max_vertices: 30 });
        scene.add_geometry(MeshData::cuboid(1.0, 1.0, 1.0)).unwrap();
        let err = scene
            .add_geometry(MeshData::cuboid(1.0, 1.0, 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            SceneError::GeometryBudgetExceeded {
                requested: 24,
                available: 6
            }
        );
        // Failed allocation leaves no trace.
        assert_eq!(scene.geometry_count(), 1);
        assert_eq!(scene.resident_vertices(), 24);
    }

    #[test]
    fn replace_geometry_tracks_vertices() {
        let mut scene = SceneGraph::new();
        let g = scene.add_geometry(MeshData::cuboid(1.0, 1.0, 1.0)).unwrap();
        let mut bigger = MeshData::cuboid(1.0, 1.0, 1.0);
        bigger.merge(&MeshData::cuboid(1.0, 1.0, 1.0));
        scene.drain_events();
        scene.replace_geometry(g, bigger).unwrap();
        assert_eq!(scene.resident_vertices(), 48);
        assert_eq!(scene.drain_events(), vec![SceneEvent::GeometryUpdated(g)]);
    }

    #[test]
    fn events_are_recorded_in_order() {
        let mut scene = SceneGraph::new();
        let g = scene.add_geometry(MeshData::default()).unwrap();
        let m = scene.add_material(Material::Normal);
        let n = scene.add_node(node(g, m)).unwrap();
        let events = scene.drain_events();
        assert_eq!(
            events,
            vec![
                SceneEvent::GeometryAdded(g),
                SceneEvent::MaterialAdded(m),
                SceneEvent::NodeAdded(n),
            ]
        );
        assert_eq!(scene.events().count(), 0);

        scene.remove_node(n).unwrap();
        assert_eq!(scene.drain_events(), vec![SceneEvent::NodeRemoved(n)]);
    }

    #[test]
    fn add_then_release_before_drain_cancels() {
        let mut scene = SceneGraph::new();
        let g = scene.add_geometry(MeshData::cuboid(1.0, 1.0, 1.0)).unwrap();
        let m = scene.add_material(Material::Normal);
        let n = scene.add_node(node(g, m)).unwrap();
        scene.replace_geometry(g, MeshData::cuboid(2.0, 2.0, 2.0)).unwrap();
        scene.remove_node(n).unwrap();
        scene.release_geometry(g).unwrap();
        scene.release_material(m).unwrap();
        assert_eq!(scene.pending_events(), 0);
    }

    #[test]
    fn repeated_updates_keep_one_pending_change() {
        let mut scene = SceneGraph::new();
        let g = scene.add_geometry(MeshData::cuboid(1.0, 1.0, 1.0)).unwrap();
        for _ in 0..1000 {
            scene.replace_geometry(g, MeshData::cuboid(1.0, 1.0, 1.0)).unwrap();
        }
        assert_eq!(scene.drain_events(), vec![SceneEvent::GeometryAdded(g)]);

        for _ in 0..1000 {
            scene.replace_geometry(g, MeshData::cuboid(1.0, 1.0, 1.0)).unwrap();
        }
        scene.release_geometry(g).unwrap();
        assert_eq!(scene.drain_events(), vec![SceneEvent::GeometryReleased(g)]);
    }

    #[test]
    fn override_is_scoped() {
        let mut scene = SceneGraph::new();
        let g = scene.add_geometry(MeshData::default()).unwrap();
        let terrain = scene.add_material(Material::Terrain(TerrainPalette::default()));
        let normal = scene.add_material(Material::Normal);
        let n = scene.add_node(node(g, terrain)).unwrap();

        {
            let guard = scene.override_materials(normal).unwrap();
            let nd = *guard.node(n).unwrap();
            assert_eq!(guard.effective_material(&nd), normal);
        }
        let nd = *scene.node(n).unwrap();
        assert_eq!(scene.effective_material(&nd), terrain);
        assert_eq!(scene.active_override(), None);
    }

    #[test]
    fn override_restored_on_early_return() {
        fn draw_with_override(scene: &mut SceneGraph, normal: MaterialId) -> Result<(), ()> {
            let guard = scene.override_materials(normal).map_err(|_| ())?;
            if guard.node_count() == 0 {
                return Err(());
            }
            Ok(())
        }

        let mut scene = SceneGraph::new();
        let normal = scene.add_material(Material::Normal);
        assert!(draw_with_override(&mut scene, normal).is_err());
        assert_eq!(scene.active_override(), None);
    }

    #[test]
    fn nested_override_restores_outer() {
        let mut scene = SceneGraph::new();
        let a = scene.add_material(Material::Normal);
        let b = scene.add_material(Material::Ink { color: [0.0; 3] });
        scene.material_override = Some(a);
        {
            let guard = scene.override_materials(b).unwrap();
            assert_eq!(guard.active_override(), Some(b));
        }
        assert_eq!(scene.active_override(), Some(a));
    }

    #[test]
    fn unknown_override_material_is_rejected() {
        let mut scene = SceneGraph::new();
        assert!(scene.override_materials(MaterialId(5)).is_err());
        assert_eq!(scene.active_override(), None);
    }
}
