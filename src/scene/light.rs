use crate::pipeline::backend::GraphicsBackend;
use crate::pipeline::uniforms::{UniformStore, names};
use nalgebra::Vector3;

/// Ambient, diffuse and specular intensities of a light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightColor {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

impl LightColor {
    /// Grey levels replicated to all three channels.
    pub fn grey(ambient: f32, diffuse: f32, specular: f32) -> Self {
        Self {
            ambient: Vector3::repeat(ambient),
            diffuse: Vector3::repeat(diffuse),
            specular: Vector3::repeat(specular),
        }
    }
}

/// Distance attenuation: `1 / (constant + linear·d + quadratic·d²)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    pub fn new(constant: f32, linear: f32, quadratic: f32) -> Self {
        Self {
            constant,
            linear,
            quadratic,
        }
    }

    pub fn factor(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

impl Default for Attenuation {
    fn default() -> Self {
        Self::new(1.0, 0.09, 0.032)
    }
}

/// Spot cone given as cosines of the inner and outer half-angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotCone {
    pub cut_off: f32,
    pub outer_cut_off: f32,
}

impl SpotCone {
    pub fn from_degrees(inner: f32, outer: f32) -> Self {
        Self {
            cut_off: inner.to_radians().cos(),
            outer_cut_off: outer.to_radians().cos(),
        }
    }

    /// Soft-edge intensity for `theta`, the cosine between the light
    /// direction and the ray to the fragment. 1 inside the inner cone, 0
    /// outside the outer cone.
    pub fn intensity(&self, theta: f32) -> f32 {
        let epsilon = self.cut_off - self.outer_cut_off;
        if epsilon.abs() <= f32::EPSILON {
            return if theta >= self.cut_off { 1.0 } else { 0.0 };
        }
        ((theta - self.outer_cut_off) / epsilon).clamp(0.0, 1.0)
    }
}

impl Default for SpotCone {
    fn default() -> Self {
        Self::from_degrees(12.5, 15.0)
    }
}

/// Directional light in view space. `direction` is the way light travels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vector3<f32>,
    pub color: LightColor,
}

impl DirectionalLight {
    pub fn write_uniforms<B: GraphicsBackend + ?Sized>(&self, backend: &mut B, prefix: &str) {
        backend.set_vec3(&names::field(prefix, "direction"), self.direction);
        write_color(backend, prefix, &self.color);
    }

    pub fn from_uniforms(store: &UniformStore, prefix: &str) -> Option<Self> {
        Some(Self {
            direction: store.vec3(&names::field(prefix, "direction"))?,
            color: read_color(store, prefix)?,
        })
    }
}

/// Spotlight in view space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub color: LightColor,
    pub attenuation: Attenuation,
    pub cone: SpotCone,
}

impl SpotLight {
    pub fn write_uniforms<B: GraphicsBackend + ?Sized>(&self, backend: &mut B, prefix: &str) {
        backend.set_vec3(&names::field(prefix, "position"), self.position);
        backend.set_vec3(&names::field(prefix, "direction"), self.direction);
        write_color(backend, prefix, &self.color);
        backend.set_float(&names::field(prefix, "constant"), self.attenuation.constant);
        backend.set_float(&names::field(prefix, "linear"), self.attenuation.linear);
        backend.set_float(&names::field(prefix, "quadratic"), self.attenuation.quadratic);
        backend.set_float(&names::field(prefix, "cut_off"), self.cone.cut_off);
        backend.set_float(&names::field(prefix, "outer_cut_off"), self.cone.outer_cut_off);
    }

    /// `None` until every field has been written at least once.
    pub fn from_uniforms(store: &UniformStore, prefix: &str) -> Option<Self> {
        let float = |field: &str| store.float(&names::field(prefix, field));
        Some(Self {
            position: store.vec3(&names::field(prefix, "position"))?,
            direction: store.vec3(&names::field(prefix, "direction"))?,
            color: read_color(store, prefix)?,
            attenuation: Attenuation::new(float("constant")?, float("linear")?, float("quadratic")?),
            cone: SpotCone {
                cut_off: float("cut_off")?,
                outer_cut_off: float("outer_cut_off")?,
            },
        })
    }
}

fn write_color<B: GraphicsBackend + ?Sized>(backend: &mut B, prefix: &str, color: &LightColor) {
    backend.set_vec3(&names::field(prefix, "ambient"), color.ambient);
    backend.set_vec3(&names::field(prefix, "diffuse"), color.diffuse);
    backend.set_vec3(&names::field(prefix, "specular"), color.specular);
}

fn read_color(store: &UniformStore, prefix: &str) -> Option<LightColor> {
    Some(LightColor {
        ambient: store.vec3(&names::field(prefix, "ambient"))?,
        diffuse: store.vec3(&names::field(prefix, "diffuse"))?,
        specular: store.vec3(&names::field(prefix, "specular"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cone_fades_between_cutoffs() {
        let cone = SpotCone::default();
        assert_eq!(cone.intensity(1.0), 1.0);
        assert_eq!(cone.intensity(20f32.to_radians().cos()), 0.0);
        let mid = cone.intensity(13.75f32.to_radians().cos());
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn attenuation_is_one_at_the_source() {
        let att = Attenuation::default();
        assert_relative_eq!(att.factor(0.0), 1.0);
        assert_relative_eq!(att.factor(10.0), 1.0 / (1.0 + 0.9 + 3.2), epsilon = 1e-6);
    }
}
