use crate::core::geometry::TangentVertex;
use crate::core::pipeline::{Interpolatable, Shader};
use crate::pipeline::shaders::lighting::{DrawTransforms, SceneLights, SurfaceMaterial};
use nalgebra::{Matrix3, Vector2, Vector3, Vector4};
use std::ops::{Add, Mul};

/// Interpolated per-fragment inputs, all in view space.
#[derive(Clone, Copy, Debug)]
pub struct PhongVarying {
    pub frag_pos: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub tangent: Vector3<f32>,
    pub bitangent: Vector3<f32>,
    pub uv: Vector2<f32>,
}

impl Add for PhongVarying {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            frag_pos: self.frag_pos + other.frag_pos,
            normal: self.normal + other.normal,
            tangent: self.tangent + other.tangent,
            bitangent: self.bitangent + other.bitangent,
            uv: self.uv + other.uv,
        }
    }
}

impl Mul<f32> for PhongVarying {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            frag_pos: self.frag_pos * scalar,
            normal: self.normal * scalar,
            tangent: self.tangent * scalar,
            bitangent: self.bitangent * scalar,
            uv: self.uv * scalar,
        }
    }
}

impl Interpolatable for PhongVarying {}

/// Per-fragment lighting with optional tangent-space normal mapping.
pub struct PhongShader<'a> {
    pub transforms: DrawTransforms,
    pub lights: SceneLights,
    pub material: SurfaceMaterial<'a>,
}

impl<'a> PhongShader<'a> {
    pub fn new(transforms: DrawTransforms, lights: SceneLights, material: SurfaceMaterial<'a>) -> Self {
        Self {
            transforms,
            lights,
            material,
        }
    }
}

impl Shader for PhongShader<'_> {
    type Varying = PhongVarying;

    fn vertex(&self, vertex: &TangentVertex) -> (Vector4<f32>, PhongVarying) {
        let position = vertex.vertex.position.to_homogeneous();
        let view_pos = self.transforms.model_view * position;
        let n = &self.transforms.normal_matrix;

        let varying = PhongVarying {
            frag_pos: view_pos.xyz(),
            normal: n * vertex.vertex.normal,
            tangent: n * vertex.tangent,
            bitangent: n * vertex.bitangent,
            uv: vertex.vertex.texcoord,
        };
        (self.transforms.mvp * position, varying)
    }

    fn fragment(&self, varying: PhongVarying) -> Vector3<f32> {
        let (u, v) = (varying.uv.x, varying.uv.y);
        let geometric = varying.normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::z);

        let normal = match self.material.tangent_normal(u, v) {
            Some(sampled) => {
                let tbn = Matrix3::from_columns(&[
                    varying.tangent.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::x),
                    varying.bitangent.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::y),
                    geometric,
                ]);
                (tbn * sampled).try_normalize(f32::EPSILON).unwrap_or(geometric)
            }
            None => geometric,
        };

        let view_dir = (self.transforms.view_pos - varying.frag_pos)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);

        let terms = self
            .lights
            .terms(&normal, &varying.frag_pos, &view_dir, self.material.shininess);
        terms.shade(
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

    fn lit_from_camera() -> SceneLights {
        SceneLights {
            directional: Some(DirectionalLight {
                direction: Vector3::new(0.0, 0.0, -1.0),
                color: LightColor::grey(0.0, 1.0, 0.0),
            }),
            spots: Vec::new(),
        }
    }

    fn facing_vertex() -> TangentVertex {
        TangentVertex::new(
            Vertex::new(Point3::new(0.0, 0.0, -2.0), Vector3::z(), Vector2::new(0.5, 0.5)),
            Vector3::x(),
            Vector3::y(),
        )
    }

    #[test]
    fn flat_normal_map_matches_plain_lighting() {
        let white = Texture::from_image(&DecodedImage::solid([255, 255, 255]));
        let flat = Texture::from_image(&DecodedImage::solid([128, 128, 255]));
        let transforms = DrawTransforms::from_uniforms(&UniformStore::new());

        let plain = PhongShader::new(
            transforms,
            lit_from_camera(),
            SurfaceMaterial {
                diffuse: Some(&white),
                secondary: None,
                normal_mapping: false,
                shininess: 32.0,
            },
        );
        let mapped = PhongShader::new(
            transforms,
            lit_from_camera(),
            SurfaceMaterial {
                diffuse: Some(&white),
                secondary: Some(&flat),
                normal_mapping: true,
                shininess: 32.0,
            },
        );

        let (_, varying) = plain.vertex(&facing_vertex());
        let a = plain.fragment(varying);
        let b = mapped.fragment(varying);
        assert_relative_eq!(a.x, 1.0, epsilon = 1e-3);
        assert_relative_eq!(b.x, 1.0, epsilon = 1e-2);
    }
}
