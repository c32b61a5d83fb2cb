//! Triangle meshes
//!
//! Winding convention: for a face that should be visible from outside,
//! `(v1 - v0) x (v2 - v0)` points into the solid. The backface stage keeps
//! triangles whose cross product points away from the camera.

use crate::rasterizer::{Color, Triangle, Vec4, Vertex};

/// Owned triangle list, fixed once built
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Triangle> {
        self.triangles.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Triangle> {
        self.triangles.iter()
    }

    /// Single triangle with per-vertex colors; normals face the viewer
    pub fn triangle(points: [[f32; 3]; 3], colors: [Color; 3]) -> Self {
        Mesh::new(vec![triangle_with_face_normals(points, colors)])
    }

    /// Cube of side 1 centred on the origin, one color per face
    pub fn unit_cube() -> Self {
        // Corners, outward normal, color
        let quads: [([[f32; 3]; 4], [f32; 3], Color); 6] = [
            // Front (-z, towards a camera at the origin looking down +z)
            (
                [[-0.5, -0.5, -0.5], [-0.5, 0.5, -0.5], [0.5, 0.5, -0.5], [0.5, -0.5, -0.5]],
                [0.0, 0.0, -1.0],
                Color::new(220, 60, 60),
            ),
            // Back
            (
                [[-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5]],
                [0.0, 0.0, 1.0],
                Color::new(60, 220, 60),
            ),
            // Top (-y is up on screen)
            (
                [[-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5], [-0.5, -0.5, 0.5]],
                [0.0, -1.0, 0.0],
                Color::new(60, 60, 220),
            ),
            // Bottom
            (
                [[-0.5, 0.5, -0.5], [-0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0.5, 0.5, -0.5]],
                [0.0, 1.0, 0.0],
                Color::new(220, 220, 60),
            ),
            // Right
            (
                [[0.5, -0.5, -0.5], [0.5, 0.5, -0.5], [0.5, 0.5, 0.5], [0.5, -0.5, 0.5]],
                [1.0, 0.0, 0.0],
                Color::new(220, 60, 220),
            ),
            // Left
            (
                [[-0.5, -0.5, -0.5], [-0.5, -0.5, 0.5], [-0.5, 0.5, 0.5], [-0.5, 0.5, -0.5]],
                [-1.0, 0.0, 0.0],
                Color::new(60, 220, 220),
            ),
        ];

        let mut triangles = Vec::with_capacity(12);
        for (corners, normal, color) in quads {
            let v = |i: usize| Vertex::new(Vec4::from_array(corners[i], 1.0), Vec4::from_array(normal, 0.0), color);
            // Reversed relative to the outside view so the cross product points inwards
            triangles.push(Triangle::new(v(0), v(2), v(1)));
            triangles.push(Triangle::new(v(0), v(3), v(2)));
        }
        Mesh::new(triangles)
    }
}

/// Triangle whose vertex normals all point out of the visible side
pub fn triangle_with_face_normals(points: [[f32; 3]; 3], colors: [Color; 3]) -> Triangle {
    let p = points.map(|p| Vec4::from_array(p, 1.0));
    let outward = -(p[1] - p[0]).cross(p[2] - p[0]).normalize();
    Triangle::new(
        Vertex::new(p[0], outward, colors[0]),
        Vertex::new(p[1], outward, colors[1]),
        Vertex::new(p[2], outward, colors[2]),
    )
}

impl FromIterator<Triangle> for Mesh {
    fn from_iter<I: IntoIterator<Item = Triangle>>(iter: I) -> Self {
        Mesh::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Mesh {
    type Item = &'a Triangle;
    type IntoIter = std::slice::Iter<'a, Triangle>;

    fn into_iter(self) -> Self::IntoIter {
        self.triangles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_cube_shape() {
        let cube = Mesh::unit_cube();
        assert_eq!(cube.len(), 12);
        for tri in &cube {
            for v in &tri.v {
                assert!(v.pos.x.abs() == 0.5 && v.pos.y.abs() == 0.5 && v.pos.z.abs() == 0.5);
            }
        }
    }

    #[test]
    fn test_unit_cube_cross_points_inward() {
        for tri in &Mesh::unit_cube() {
            let centroid = (tri.v[0].pos + tri.v[1].pos + tri.v[2].pos) * (1.0 / 3.0);
            // Inward means towards the origin
            assert!(tri.face_normal().dot(centroid) < 0.0);
            // Stored normals point outward
            assert!(tri.v[0].normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_triangle_normals_oppose_cross() {
        let mesh = Mesh::triangle([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], [Color::WHITE; 3]);
        let tri = mesh.get(0).unwrap();
        assert!(tri.face_normal().dot(tri.v[0].normal) < 0.0);
        assert_eq!(tri.v[0].normal.w, 0.0);
    }
}
