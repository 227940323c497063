use glam::Vec3;

/// CPU-side indexed triangle mesh.
///
/// Positions are relative to the owning node's transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds as (min, max). Empty meshes report zero bounds.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        if self.positions.is_empty() {
            return (Vec3::ZERO, Vec3::ZERO);
        }
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for p in &self.positions {
            let v = Vec3::from(*p);
            min = min.min(v);
            max = max.max(v);
        }
        (min, max)
    }

    /// Box centred on the origin with the given full extents.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (x, y, z) = (width * 0.5, height * 0.5, depth * 0.5);
        #[rustfmt::skip]
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0],  [[-x, -y,  z], [ x, -y,  z], [ x,  y,  z], [-x,  y,  z]]),
            ([0.0, 0.0, -1.0], [[ x, -y, -z], [-x, -y, -z], [-x,  y, -z], [ x,  y, -z]]),
            ([1.0, 0.0, 0.0],  [[ x, -y,  z], [ x, -y, -z], [ x,  y, -z], [ x,  y,  z]]),
            ([-1.0, 0.0, 0.0], [[-x, -y, -z], [-x, -y,  z], [-x,  y,  z], [-x,  y, -z]]),
            ([0.0, 1.0, 0.0],  [[-x,  y,  z], [ x,  y,  z], [ x,  y, -z], [-x,  y, -z]]),
            ([0.0, -1.0, 0.0], [[-x, -y, -z], [ x, -y, -z], [ x, -y,  z], [-x, -y,  z]]),
        ];

        let mut mesh = MeshData::default();
        for (normal, corners) in faces {
            let base = mesh.positions.len() as u32;
            for c in corners {
                mesh.positions.push(c);
                mesh.normals.push(normal);
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        mesh
    }

    /// Square grid in the XZ plane, `extent` wide, `segments` quads per side,
    /// with `height(local_x, local_z)` supplying the Y of every vertex.
    ///
    /// Normals are recomputed from the displaced surface.
    pub fn displaced_grid(
        extent: f32,
        segments: u32,
        mut height: impl FnMut(f32, f32) -> f32,
    ) -> Self {
        let segments = segments.max(1);
        let row = segments + 1;
        let step = extent / segments as f32;
        let half = extent * 0.5;

        let mut mesh = MeshData {
            positions: Vec::with_capacity((row * row) as usize),
            normals: Vec::new(),
            indices: Vec::with_capacity((segments * segments * 6) as usize),
        };

        for iz in 0..row {
            let z = -half + iz as f32 * step;
            for ix in 0..row {
                let x = -half + ix as f32 * step;
                mesh.positions.push([x, height(x, z), z]);
            }
        }

        // Counter-clockwise when seen from +Y.
        for iz in 0..segments {
            for ix in 0..segments {
                let a = iz * row + ix;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                mesh.indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }

        mesh.recompute_normals();
        mesh
    }

    /// UV sphere centred on the origin.
    pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let ws = width_segments.max(3);
        let hs = height_segments.max(2);
        let mut mesh = MeshData::default();

        for iy in 0..=hs {
            let v = iy as f32 / hs as f32;
            let theta = v * std::f32::consts::PI;
            for ix in 0..=ws {
                let u = ix as f32 / ws as f32;
                let phi = u * std::f32::consts::TAU;
                let n = Vec3::new(-phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin());
                mesh.positions.push((n * radius).into());
                mesh.normals.push(n.into());
            }
        }

        let row = ws + 1;
        for iy in 0..hs {
            for ix in 0..ws {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                if iy != 0 {
                    mesh.indices.extend_from_slice(&[a, b, d]);
                }
                if iy != hs - 1 {
                    mesh.indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
        mesh
    }

    /// Thin square prism along the segment `a -> b`, used for ink strokes.
    pub fn stroke(a: Vec3, b: Vec3, thickness: f32) -> Self {
        let axis = b - a;
        let length = axis.length();
        if length <= f32::EPSILON {
            return MeshData::default();
        }
        let mut mesh = MeshData::cuboid(thickness, thickness, length);
        let rotation = glam::Quat::from_rotation_arc(Vec3::Z, axis / length);
        let centre = (a + b) * 0.5;
        for (p, n) in mesh.positions.iter_mut().zip(mesh.normals.iter_mut()) {
            *p = (rotation * Vec3::from(*p) + centre).into();
            *n = (rotation * Vec3::from(*n)).into();
        }
        mesh
    }

    /// Append another mesh, re-basing its indices.
    pub fn merge(&mut self, other: &MeshData) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Area-weighted smooth vertex normals from the current triangles.
    pub fn recompute_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let a = Vec3::from(self.positions[ia]);
            let b = Vec3::from(self.positions[ib]);
            let c = Vec3::from(self.positions[ic]);
            let face = (b - a).cross(c - a);
            acc[ia] += face;
            acc[ib] += face;
            acc[ic] += face;
        }
        self.normals = acc
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y).into())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_has_six_faces() {
        let m = MeshData::cuboid(2.0, 4.0, 6.0);
        assert_eq!(m.vertex_count(), 24);
        assert_eq!(m.triangle_count(), 12);
        let (min, max) = m.bounds();
        assert_eq!(min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn flat_grid_normals_point_up() {
        let m = MeshData::displaced_grid(10.0, 4, |_, _| 0.0);
        assert_eq!(m.vertex_count(), 25);
        assert_eq!(m.triangle_count(), 32);
        for n in &m.normals {
            assert!((n[1] - 1.0).abs() < 1e-6, "normal {n:?}");
        }
        let (min, max) = m.bounds();
        assert_eq!(min.x, -5.0);
        assert_eq!(max.z, 5.0);
    }

    #[test]
    fn sloped_grid_normals_lean_against_slope() {
        // y rises with x, so normals lean towards -x.
        let m = MeshData::displaced_grid(10.0, 4, |x, _| x);
        for n in &m.normals {
            assert!(n[0] < 0.0);
            assert!(n[1] > 0.0);
        }
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let m = MeshData::uv_sphere(550.0, 32, 15);
        assert_eq!(m.vertex_count(), 33 * 16);
        for p in &m.positions {
            assert!((Vec3::from(*p).length() - 550.0).abs() < 0.01);
        }
    }

    #[test]
    fn stroke_spans_segment() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(-3.0, -1.0, -0.5);
        let m = MeshData::stroke(a, b, 0.1);
        assert_eq!(m.vertex_count(), 24);
        let (min, max) = m.bounds();
        assert!(min.x < -2.9 && max.x > -0.1);
    }

    #[test]
    fn degenerate_stroke_is_empty() {
        let m = MeshData::stroke(Vec3::ONE, Vec3::ONE, 0.1);
        assert_eq!(m.vertex_count(), 0);
    }

    #[test]
    fn merge_rebases_indices() {
        let mut a = MeshData::cuboid(1.0, 1.0, 1.0);
        let b = MeshData::cuboid(1.0, 1.0, 1.0);
        a.merge(&b);
        assert_eq!(a.vertex_count(), 48);
        assert_eq!(*a.indices.iter().max().unwrap(), 47);
    }
}
