use crate::core::geometry::{TangentVertex, Triangle, Vertex};
use crate::error::{RenderError, Result};
use log::{debug, warn};
use nalgebra::Vector3;

/// A UV Jacobian is degenerate when its determinant is below this fraction of
/// the product of the two UV edge lengths (the sine of the angle between them).
const DEGENERATE_EPSILON: f32 = 1e-6;

/// Tangent and bitangent shared by the three vertices of one triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentBasis {
    pub tangent: Vector3<f32>,
    pub bitangent: Vector3<f32>,
}

/// Output of [`build_tangent_vertices`].
#[derive(Debug, Clone)]
pub struct TangentMesh {
    /// One vertex per input vertex, three per triangle, in input order.
    pub vertices: Vec<TangentVertex>,
    /// Triangles whose UV mapping was degenerate and got a normal-derived frame.
    pub fallback_triangles: usize,
}

/// Solves the UV-to-position Jacobian of a triangle.
///
/// Returns `None` when the UV mapping is degenerate (zero-area in UV space)
/// or the solve produces non-finite values. The result is not renormalized.
pub fn triangle_basis(triangle: &Triangle) -> Option<TangentBasis> {
    let [v1, v2, v3] = triangle;

    let edge1 = v2.position - v1.position;
    let edge2 = v3.position - v1.position;
    let delta_uv1 = v2.texcoord - v1.texcoord;
    let delta_uv2 = v3.texcoord - v1.texcoord;

    let det = delta_uv1.x * delta_uv2.y - delta_uv2.x * delta_uv1.y;
    let scale = delta_uv1.norm() * delta_uv2.norm();
    if !det.is_finite() || det.abs() <= DEGENERATE_EPSILON * scale {
        return None;
    }
    let f = 1.0 / det;

    let tangent = (edge1 * delta_uv2.y - edge2 * delta_uv1.y) * f;
    let bitangent = (edge1 * -delta_uv2.x + edge2 * delta_uv1.x) * f;

    if tangent.iter().chain(bitangent.iter()).all(|c| c.is_finite()) {
        Some(TangentBasis { tangent, bitangent })
    } else {
        None
    }
}

/// Builds an arbitrary orthonormal tangent frame around `normal`.
///
/// A zero or non-finite normal is replaced by +Z.
pub fn orthonormal_basis(normal: &Vector3<f32>) -> TangentBasis {
    let n = match normal.try_normalize(1e-12) {
        Some(n) if n.iter().all(|c| c.is_finite()) => n,
        _ => Vector3::z(),
    };
    let up = if n.z.abs() < 0.999 {
        Vector3::z()
    } else {
        Vector3::x()
    };
    let tangent = n.cross(&up).normalize();
    let bitangent = n.cross(&tangent).normalize();
    TangentBasis { tangent, bitangent }
}

/// Normal used for the fallback frame: the first vertex normal, or the face
/// normal when the authored one is zero.
fn triangle_normal(triangle: &Triangle) -> Vector3<f32> {
    let authored = triangle[0].normal;
    if authored.norm_squared() > 1e-12 {
        return authored;
    }
    let edge1 = triangle[1].position - triangle[0].position;
    let edge2 = triangle[2].position - triangle[0].position;
    edge1.cross(&edge2)
}

/// Derives a flat per-triangle tangent frame for a triangle list.
///
/// Every triangle contributes its own three output vertices, so vertices on
/// shared edges are duplicated and may carry different frames.
pub fn build_tangent_vertices(vertices: &[Vertex]) -> Result<TangentMesh> {
    if vertices.len() % 3 != 0 {
        return Err(RenderError::TriangleList(vertices.len()));
    }

    let mut out = Vec::with_capacity(vertices.len());
    let mut fallback_triangles = 0;

    for (index, chunk) in vertices.chunks_exact(3).enumerate() {
        let triangle: Triangle = [chunk[0], chunk[1], chunk[2]];
        let basis = match triangle_basis(&triangle) {
            Some(basis) => basis,
            None => {
                debug!("Triangle {} has a degenerate UV mapping", index);
                fallback_triangles += 1;
                orthonormal_basis(&triangle_normal(&triangle))
            }
        };

        out.extend(
            triangle
                .iter()
                .map(|v| TangentVertex::new(*v, basis.tangent, basis.bitangent)),
        );
    }

    if fallback_triangles > 0 {
        warn!(
            "{} of {} triangles used a normal-derived tangent frame",
            fallback_triangles,
            vertices.len() / 3
        );
    }

    Ok(TangentMesh {
        vertices: out,
        fallback_triangles,
    })
}

/// Gives each vertex of an indexed mesh an orthonormal frame around its own
/// normal. Used for meshes that are drawn with an index buffer.
pub fn attach_normal_frames(vertices: &[Vertex]) -> Vec<TangentVertex> {
    vertices
        .iter()
        .map(|v| {
            let basis = orthonormal_basis(&v.normal);
            TangentVertex::new(*v, basis.tangent, basis.bitangent)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector2};

    fn vertex(p: [f32; 3], uv: [f32; 2]) -> Vertex {
        Vertex::new(
            Point3::from(p),
            Vector3::new(0.0, 0.0, 1.0),
            Vector2::from(uv),
        )
    }

    fn is_parallel(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
        a.cross(b).norm() <= 1e-5 * a.norm() * b.norm()
    }

    #[test]
    fn axis_aligned_triangle_gives_axis_frame() {
        let tri = [
            vertex([0.0, 0.0, 0.0], [0.0, 0.0]),
            vertex([1.0, 0.0, 0.0], [1.0, 0.0]),
            vertex([0.0, 1.0, 0.0], [0.0, 1.0]),
        ];
        let basis = triangle_basis(&tri).unwrap();
        assert_relative_eq!(basis.tangent, Vector3::x(), epsilon = 1e-6);
        assert_relative_eq!(basis.bitangent, Vector3::y(), epsilon = 1e-6);
    }

    #[test]
    fn basis_reconstructs_edges() {
        let tri = [
            vertex([0.2, -1.0, 0.5], [0.1, 0.3]),
            vertex([1.7, 0.4, -0.2], [0.9, 0.2]),
            vertex([-0.6, 2.1, 1.3], [0.4, 1.4]),
        ];
        let basis = triangle_basis(&tri).unwrap();

        let edge1 = tri[1].position - tri[0].position;
        let edge2 = tri[2].position - tri[0].position;
        let d1 = tri[1].texcoord - tri[0].texcoord;
        let d2 = tri[2].texcoord - tri[0].texcoord;

        assert_relative_eq!(
            basis.tangent * d1.x + basis.bitangent * d1.y,
            edge1,
            epsilon = 1e-4
        );
        assert_relative_eq!(
            basis.tangent * d2.x + basis.bitangent * d2.y,
            edge2,
            epsilon = 1e-4
        );

        let normal = edge1.cross(&edge2);
        assert!(!is_parallel(&basis.tangent, &basis.bitangent));
        assert!(!is_parallel(&basis.tangent, &normal));
        assert!(!is_parallel(&basis.bitangent, &normal));
    }

    #[test]
    fn small_uv_footprint_keeps_its_frame() {
        let tri = vec![
            vertex([0.0, 0.0, 0.0], [0.25, 0.25]),
            vertex([1.0, 0.0, 0.0], [0.25 + 5e-5, 0.25]),
            vertex([0.0, 1.0, 0.0], [0.25, 0.25 + 5e-5]),
        ];
        let basis = triangle_basis(&[tri[0], tri[1], tri[2]]).unwrap();
        let d1 = tri[1].texcoord - tri[0].texcoord;
        let edge1 = tri[1].position - tri[0].position;
        assert_relative_eq!(
            basis.tangent * d1.x + basis.bitangent * d1.y,
            edge1,
            epsilon = 1e-2
        );
        assert!(is_parallel(&basis.tangent, &Vector3::x()));

        let mesh = build_tangent_vertices(&tri).unwrap();
        assert_eq!(mesh.fallback_triangles, 0);
    }

    #[test]
    fn degenerate_uvs_fall_back_to_finite_frame() {
        // All three UVs on one line: zero Jacobian determinant.
        let tri = vec![
            vertex([0.0, 0.0, 0.0], [0.0, 0.0]),
            vertex([1.0, 0.0, 0.0], [0.5, 0.5]),
            vertex([0.0, 1.0, 0.0], [1.0, 1.0]),
        ];
        assert!(triangle_basis(&[tri[0], tri[1], tri[2]]).is_none());

        let mesh = build_tangent_vertices(&tri).unwrap();
        assert_eq!(mesh.fallback_triangles, 1);
        for v in &mesh.vertices {
            assert!(v.tangent.iter().all(|c| c.is_finite()));
            assert!(v.bitangent.iter().all(|c| c.is_finite()));
            assert_relative_eq!(v.tangent.dot(&v.vertex.normal), 0.0, epsilon = 1e-6);
            assert_relative_eq!(v.tangent.norm(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn frame_is_broadcast_per_triangle() {
        let verts = vec![
            vertex([0.0, 0.0, 0.0], [0.0, 0.0]),
            vertex([2.0, 0.0, 0.0], [1.0, 0.0]),
            vertex([0.0, 1.0, 0.0], [0.0, 1.0]),
            vertex([0.0, 0.0, 0.0], [0.0, 0.0]),
            vertex([0.0, 1.0, 0.0], [1.0, 0.0]),
            vertex([-1.0, 0.0, 0.0], [0.0, 1.0]),
        ];
        let mesh = build_tangent_vertices(&verts).unwrap();
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.vertices[0].tangent, mesh.vertices[2].tangent);
        assert_eq!(mesh.vertices[3].tangent, mesh.vertices[5].tangent);
        // The shared corner at the origin carries two different frames.
        assert_ne!(mesh.vertices[0].tangent, mesh.vertices[3].tangent);
        // Not renormalized: a 2-unit edge over 1 UV unit gives length 2.
        assert_relative_eq!(mesh.vertices[0].tangent.norm(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn rejects_partial_triangles() {
        let verts = vec![vertex([0.0; 3], [0.0; 2]); 4];
        assert!(matches!(
            build_tangent_vertices(&verts),
            Err(RenderError::TriangleList(4))
        ));
    }

    #[test]
    fn normal_frames_are_orthonormal() {
        for n in [Vector3::z(), Vector3::new(0.3, -0.8, 0.2), Vector3::zeros()] {
            let basis = orthonormal_basis(&n);
            let n = n.try_normalize(1e-12).unwrap_or(Vector3::z());
            assert_relative_eq!(basis.tangent.dot(&n), 0.0, epsilon = 1e-6);
            assert_relative_eq!(basis.bitangent.dot(&n), 0.0, epsilon = 1e-6);
            assert_relative_eq!(basis.tangent.dot(&basis.bitangent), 0.0, epsilon = 1e-6);
        }
    }
}
