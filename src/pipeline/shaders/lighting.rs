//! Light evaluation shared by the Phong and Gouraud programs. All vectors
//! are in view space.

use crate::core::math::transform::TransformFactory;
use crate::pipeline::uniforms::{UniformStore, names};
use crate::scene::light::{DirectionalLight, SpotLight};
use crate::scene::texture::Texture;
use nalgebra::{Matrix3, Matrix4, Vector3};
use std::ops::{Add, AddAssign, Mul};

/// Specular strength used when the second texture unit holds a normal map.
pub const NORMAL_MAPPED_SPECULAR: f32 = 0.5;

/// Per-channel light weights before they meet the material.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightTerms {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

impl LightTerms {
    /// `ambient·Kd + diffuse·Kd + specular·Ks`
    pub fn shade(&self, diffuse_color: &Vector3<f32>, specular_color: &Vector3<f32>) -> Vector3<f32> {
        (self.ambient + self.diffuse).component_mul(diffuse_color)
            + self.specular.component_mul(specular_color)
    }
}

impl Add for LightTerms {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            ambient: self.ambient + other.ambient,
            diffuse: self.diffuse + other.diffuse,
            specular: self.specular + other.specular,
        }
    }
}

impl AddAssign for LightTerms {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Mul<f32> for LightTerms {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            ambient: self.ambient * scalar,
            diffuse: self.diffuse * scalar,
            specular: self.specular * scalar,
        }
    }
}

#[inline]
fn reflect(incident: &Vector3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
    incident - normal * (2.0 * normal.dot(incident))
}

/// Diffuse and specular factors for a unit vector towards the light.
#[inline]
fn phong_factors(
    normal: &Vector3<f32>,
    to_light: &Vector3<f32>,
    view_dir: &Vector3<f32>,
    shininess: f32,
) -> (f32, f32) {
    let diff = normal.dot(to_light).max(0.0);
    let reflect_dir = reflect(&-to_light, normal);
    let spec = view_dir.dot(&reflect_dir).max(0.0).powf(shininess);
    (diff, spec)
}

pub fn directional_terms(
    light: &DirectionalLight,
    normal: &Vector3<f32>,
    view_dir: &Vector3<f32>,
    shininess: f32,
) -> LightTerms {
    let to_light = (-light.direction).normalize();
    let (diff, spec) = phong_factors(normal, &to_light, view_dir, shininess);
    LightTerms {
        ambient: light.color.ambient,
        diffuse: light.color.diffuse * diff,
        specular: light.color.specular * spec,
    }
}

pub fn spot_terms(
    light: &SpotLight,
    normal: &Vector3<f32>,
    frag_pos: &Vector3<f32>,
    view_dir: &Vector3<f32>,
    shininess: f32,
) -> LightTerms {
    let offset = light.position - frag_pos;
    let distance = offset.norm();
    let Some(to_light) = offset.try_normalize(f32::EPSILON) else {
        return LightTerms::default();
    };
    let (diff, spec) = phong_factors(normal, &to_light, view_dir, shininess);

    let attenuation = light.attenuation.factor(distance);
    let theta = to_light.dot(&(-light.direction).normalize());
    let intensity = light.cone.intensity(theta);

    LightTerms {
        ambient: light.color.ambient,
        diffuse: light.color.diffuse * diff,
        specular: light.color.specular * spec,
    } * (attenuation * intensity)
}

/// Lights read back from a program's uniforms. A light whose fields were
/// never written is skipped.
#[derive(Debug, Clone, Default)]
pub struct SceneLights {
    pub directional: Option<DirectionalLight>,
    pub spots: Vec<SpotLight>,
}

impl SceneLights {
    pub fn from_uniforms(store: &UniformStore) -> Self {
        Self {
            directional: DirectionalLight::from_uniforms(store, names::DIR_LIGHT),
            spots: [names::SPOT_LIGHT, names::MOVING_SPOT]
                .iter()
                .filter_map(|prefix| SpotLight::from_uniforms(store, prefix))
                .collect(),
        }
    }

    pub fn terms(
        &self,
        normal: &Vector3<f32>,
        frag_pos: &Vector3<f32>,
        view_dir: &Vector3<f32>,
        shininess: f32,
    ) -> LightTerms {
        let mut terms = self
            .directional
            .map(|light| directional_terms(&light, normal, view_dir, shininess))
            .unwrap_or_default();
        for spot in &self.spots {
            terms += spot_terms(spot, normal, frag_pos, view_dir, shininess);
        }
        terms
    }
}

/// Matrices derived once per draw from the `model`, `view` and `projection` uniforms.
#[derive(Debug, Clone, Copy)]
pub struct DrawTransforms {
    pub model_view: Matrix4<f32>,
    pub mvp: Matrix4<f32>,
    /// Inverse-transpose of `model_view`'s 3x3, for normals and tangents.
    pub normal_matrix: Matrix3<f32>,
    pub view_pos: Vector3<f32>,
}

impl DrawTransforms {
    pub fn from_uniforms(store: &UniformStore) -> Self {
        let model = store.mat4(names::MODEL).unwrap_or_else(Matrix4::identity);
        let view = store.mat4(names::VIEW).unwrap_or_else(Matrix4::identity);
        let projection = store.mat4(names::PROJECTION).unwrap_or_else(Matrix4::identity);
        let model_view = view * model;
        let normal_matrix = TransformFactory::normal_matrix(&model_view)
            .unwrap_or_else(|| TransformFactory::linear_part(&model_view));
        Self {
            model_view,
            mvp: projection * model_view,
            normal_matrix,
            view_pos: store.vec3(names::VIEW_POS).unwrap_or_else(Vector3::zeros),
        }
    }
}

/// Textures and constants of the surface being drawn.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceMaterial<'a> {
    pub diffuse: Option<&'a Texture>,
    /// Specular map, or the normal map when `normal_mapping` is set.
    pub secondary: Option<&'a Texture>,
    pub normal_mapping: bool,
    pub shininess: f32,
}

impl SurfaceMaterial<'_> {
    /// Unbound units sample as black.
    pub fn diffuse_color(&self, u: f32, v: f32) -> Vector3<f32> {
        self.diffuse
            .map(|tex| tex.sample(u, v))
            .unwrap_or_else(Vector3::zeros)
    }

    pub fn specular_color(&self, u: f32, v: f32) -> Vector3<f32> {
        if self.normal_mapping {
            Vector3::repeat(NORMAL_MAPPED_SPECULAR)
        } else {
            self.secondary
                .map(|tex| tex.sample(u, v))
                .unwrap_or_else(Vector3::zeros)
        }
    }

    /// Tangent-space normal from the normal map, remapped to [-1, 1].
    pub fn tangent_normal(&self, u: f32, v: f32) -> Option<Vector3<f32>> {
        if !self.normal_mapping {
            return None;
        }
        let texel = self.secondary?.sample(u, v);
        (texel * 2.0 - Vector3::repeat(1.0)).try_normalize(f32::EPSILON)
    }
}
