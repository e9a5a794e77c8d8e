use crate::core::geometry::TangentVertex;
use crate::core::pipeline::Shader;
use crate::scene::texture::CubeMap;
use nalgebra::{Matrix4, Vector3, Vector4};

/// Sky backdrop: cube map looked up by the local cube position, drawn on
/// the far plane (`z = w`).
pub struct SkyShader<'a> {
    /// `projection · view` with the view's translation already removed.
    pub view_projection: Matrix4<f32>,
    pub cubemap: Option<&'a CubeMap>,
}

impl Shader for SkyShader<'_> {
    type Varying = Vector3<f32>;

    fn vertex(&self, vertex: &TangentVertex) -> (Vector4<f32>, Vector3<f32>) {
        let local = vertex.vertex.position;
        let clip = self.view_projection * local.to_homogeneous();
        (Vector4::new(clip.x, clip.y, clip.w, clip.w), local.coords)
    }

    fn fragment(&self, direction: Vector3<f32>) -> Vector3<f32> {
        self.cubemap
            .map(|cube| cube.sample(&direction))
            .unwrap_or_else(Vector3::zeros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vertex;
    use crate::core::math::transform::TransformFactory;
    use nalgebra::{Point3, Vector2};

    #[test]
    fn sky_vertices_land_on_the_far_plane() {
        let shader = SkyShader {
            view_projection: TransformFactory::perspective(1.0, 0.8, 0.1, 100.0),
            cubemap: None,
        };
        let vertex = TangentVertex::new(
            Vertex::new(Point3::new(0.3, -1.0, -1.0), Vector3::z(), Vector2::zeros()),
            Vector3::x(),
            Vector3::y(),
        );
        let (clip, direction) = shader.vertex(&vertex);
        assert_eq!(clip.z, clip.w);
        assert_eq!(direction, Vector3::new(0.3, -1.0, -1.0));
    }
}
