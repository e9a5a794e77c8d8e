use crate::core::geometry::TangentVertex;
use crate::core::pipeline::{Interpolatable, Shader};
use crate::pipeline::shaders::lighting::{DrawTransforms, LightTerms, SceneLights, SurfaceMaterial};
use nalgebra::{Vector2, Vector3, Vector4};
use std::ops::{Add, Mul};

/// Light weights computed per vertex, blended across the face.
#[derive(Clone, Copy, Debug)]
pub struct GouraudVarying {
    pub terms: LightTerms,
    pub uv: Vector2<f32>,
}

impl Add for GouraudVarying {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            terms: self.terms + other.terms,
            uv: self.uv + other.uv,
        }
    }
}

impl Mul<f32> for GouraudVarying {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            terms: self.terms * scalar,
            uv: self.uv * scalar,
        }
    }
}

impl Interpolatable for GouraudVarying {}

/// Per-vertex lighting. Normal maps are not consulted: the vertex normal is
/// the only normal available at this stage.
pub struct GouraudShader<'a> {
    pub transforms: DrawTransforms,
    pub lights: SceneLights,
    pub material: SurfaceMaterial<'a>,
}

impl<'a> GouraudShader<'a> {
    pub fn new(transforms: DrawTransforms, lights: SceneLights, material: SurfaceMaterial<'a>) -> Self {
        Self {
            transforms,
            lights,
            material,
        }
    }
}

impl Shader for GouraudShader<'_> {
    type Varying = GouraudVarying;

    fn vertex(&self, vertex: &TangentVertex) -> (Vector4<f32>, GouraudVarying) {
        let position = vertex.vertex.position.to_homogeneous();
        let frag_pos = (self.transforms.model_view * position).xyz();
        let normal = (self.transforms.normal_matrix * vertex.vertex.normal)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);
        let view_dir = (self.transforms.view_pos - frag_pos)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);

        let varying = GouraudVarying {
            terms: self
                .lights
                .terms(&normal, &frag_pos, &view_dir, self.material.shininess),
            uv: vertex.vertex.texcoord,
        };
        (self.transforms.mvp * position, varying)
    }

    fn fragment(&self, varying: GouraudVarying) -> Vector3<f32> {
        let (u, v) = (varying.uv.x, varying.uv.y);
        varying.terms.shade(
            &self.material.diffuse_color(u, v),
            &self.material.specular_color(u, v),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vertex;
    use crate::io::image::DecodedImage;
    use crate::pipeline::uniforms::UniformStore;
    use crate::scene::light::{DirectionalLight, LightColor};
    use crate::scene::texture::Texture;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn vertex_terms_are_blended_linearly() {
        let white = Texture::from_image(&DecodedImage::solid([255, 255, 255]));
        let shader = GouraudShader::new(
            DrawTransforms::from_uniforms(&UniformStore::new()),
            SceneLights {
                directional: Some(DirectionalLight {
                    direction: Vector3::new(0.0, 0.0, -1.0),
                    color: LightColor::grey(0.0, 1.0, 0.0),
                }),
                spots: Vec::new(),
            },
            SurfaceMaterial {
                diffuse: Some(&white),
                secondary: None,
                normal_mapping: false,
                shininess: 32.0,
            },
        );

        let vertex = |normal: Vector3<f32>| {
            TangentVertex::new(
                Vertex::new(Point3::new(0.0, 0.0, -2.0), normal, Vector2::zeros()),
                Vector3::x(),
                Vector3::y(),
            )
        };
        let (_, lit) = shader.vertex(&vertex(Vector3::z()));
        let (_, dark) = shader.vertex(&vertex(-Vector3::z()));

        let blended = shader.fragment(lit * 0.5 + dark * 0.5);
        assert_relative_eq!(blended.x, 0.5, epsilon = 1e-3);
    }
}
