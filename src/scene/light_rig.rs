use crate::core::math::transform::TransformFactory;
use crate::scene::light::{Attenuation, DirectionalLight, LightColor, SpotCone, SpotLight};
use log::warn;
use nalgebra::{Matrix4, Point3, Vector3};

/// Day or night: directional ambient level and sky cubemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DayNight {
    #[default]
    Day,
    Night,
}

/// Horizontal aim of the moving spotlight, kept as an integer step count so
/// repeated ticks land exactly on the limits. When the step does not divide
/// the limit, the last tick is shortened to reach it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotAim {
    steps: i32,
    max_steps: i32,
    step: f32,
    limit: f32,
}

impl SpotAim {
    pub fn new(step: f32, limit: f32) -> Self {
        let max_steps = if step > 0.0 && limit > 0.0 {
            let ratio = limit / step;
            if (ratio - ratio.round()).abs() < 1e-4 {
                ratio.round() as i32
            } else {
                ratio.ceil() as i32
            }
        } else {
            0
        };
        Self {
            steps: 0,
            max_steps,
            step,
            limit,
        }
    }

    pub fn increase(&mut self) {
        self.steps = (self.steps + 1).min(self.max_steps);
    }

    pub fn decrease(&mut self) {
        self.steps = (self.steps - 1).max(-self.max_steps);
    }

    pub fn value(&self) -> f32 {
        if self.max_steps == 0 {
            0.0
        } else if self.steps == self.max_steps {
            self.limit
        } else if self.steps == -self.max_steps {
            -self.limit
        } else {
            (self.steps as f32 * self.step).clamp(-self.limit, self.limit)
        }
    }
}

impl Default for SpotAim {
    fn default() -> Self {
        Self::new(0.01, 0.7)
    }
}

/// Constants of the three lights, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRigParams {
    pub directional_direction: Vector3<f32>,
    pub day_ambient: f32,
    pub night_ambient: f32,
    pub directional_diffuse: f32,
    pub directional_specular: f32,

    pub static_spot_position: Point3<f32>,
    pub static_spot_direction: Vector3<f32>,
    pub static_spot_color: LightColor,

    pub moving_spot_color: LightColor,
    /// Emitter-local aim `(aim, y, z)`; only y and z are read from here.
    pub moving_spot_local_direction: Vector3<f32>,

    pub attenuation: Attenuation,
    pub cone: SpotCone,
}

impl Default for LightRigParams {
    fn default() -> Self {
        Self {
            directional_direction: Vector3::new(0.0, -1.0, 0.0),
            day_ambient: 0.5,
            night_ambient: 0.1,
            directional_diffuse: 0.5,
            directional_specular: 0.5,
            static_spot_position: Point3::new(0.0, 3.0, 7.0),
            static_spot_direction: Vector3::new(0.0, -3.0, -7.0),
            static_spot_color: LightColor::grey(0.0, 1.0, 1.0),
            moving_spot_color: LightColor::grey(0.5, 1.0, 1.0),
            moving_spot_local_direction: Vector3::new(0.0, -0.3, 1.0),
            attenuation: Attenuation::default(),
            cone: SpotCone::default(),
        }
    }
}

/// View-space light state for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    pub directional: DirectionalLight,
    pub static_spot: SpotLight,
}

/// Per-frame light computation. Stateless apart from its constants.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightRig {
    pub params: LightRigParams,
}

impl LightRig {
    pub fn new(params: LightRigParams) -> Self {
        Self { params }
    }

    pub fn directional(&self, view: &Matrix4<f32>, mode: DayNight) -> DirectionalLight {
        let p = &self.params;
        let ambient = match mode {
            DayNight::Day => p.day_ambient,
            DayNight::Night => p.night_ambient,
        };
        DirectionalLight {
            direction: TransformFactory::transform_direction(view, &p.directional_direction),
            color: LightColor::grey(ambient, p.directional_diffuse, p.directional_specular),
        }
    }

    pub fn static_spot(&self, view: &Matrix4<f32>) -> SpotLight {
        let p = &self.params;
        SpotLight {
            position: TransformFactory::transform_point(view, &p.static_spot_position).coords,
            direction: TransformFactory::transform_direction(view, &p.static_spot_direction),
            color: p.static_spot_color,
            attenuation: p.attenuation,
            cone: p.cone,
        }
    }

    /// The spotlight carried by the moving object. Its aim is the
    /// emitter-local `(aim, y, z)` vector taken through the model's normal
    /// matrix and then the view's rotation.
    pub fn moving_spot(&self, view: &Matrix4<f32>, model: &Matrix4<f32>, aim: f32) -> SpotLight {
        let p = &self.params;
        let local = Vector3::new(
            aim,
            p.moving_spot_local_direction.y,
            p.moving_spot_local_direction.z,
        );
        let normal_matrix = TransformFactory::normal_matrix(model).unwrap_or_else(|| {
            warn!("Moving object model matrix is singular; aiming with its linear part");
            TransformFactory::linear_part(model)
        });
        let world = normal_matrix * local;
        let translation = Point3::from(TransformFactory::translation_of(model));

        SpotLight {
            position: TransformFactory::transform_point(view, &translation).coords,
            direction: TransformFactory::transform_direction(view, &world),
            color: p.moving_spot_color,
            attenuation: p.attenuation,
            cone: p.cone,
        }
    }

    pub fn frame(&self, view: &Matrix4<f32>, mode: DayNight) -> LightState {
        LightState {
            directional: self.directional(view, mode),
            static_spot: self.static_spot(view),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn aim_clamps_exactly_at_the_limit() {
        let mut aim = SpotAim::default();
        assert_eq!(aim.value(), 0.0);
        for _ in 0..70 {
            aim.increase();
        }
        assert_eq!(aim.value(), 0.7);
        aim.increase();
        assert_eq!(aim.value(), 0.7);
        for _ in 0..200 {
            aim.decrease();
        }
        assert_eq!(aim.value(), -0.7);
    }

    #[test]
    fn uneven_step_never_overshoots_a_tick() {
        let mut aim = SpotAim::new(0.03, 0.7);
        let mut previous = aim.value();
        for _ in 0..30 {
            aim.increase();
            let value = aim.value();
            assert!(value - previous <= 0.03 + 1e-6);
            assert!(value <= 0.7);
            previous = value;
        }
        assert_eq!(aim.value(), 0.7);

        for _ in 0..60 {
            aim.decrease();
        }
        assert_eq!(aim.value(), -0.7);
    }

    #[test]
    fn zero_step_aim_stays_centred() {
        let mut aim = SpotAim::new(0.0, 0.7);
        aim.increase();
        assert_eq!(aim.value(), 0.0);
    }

    #[test]
    fn night_dims_directional_ambient() {
        let rig = LightRig::default();
        let view = Matrix4::identity();
        assert_eq!(rig.directional(&view, DayNight::Day).color.ambient, Vector3::repeat(0.5));
        assert_eq!(rig.directional(&view, DayNight::Night).color.ambient, Vector3::repeat(0.1));
    }

    #[test]
    fn static_spot_position_uses_full_transform() {
        let rig = LightRig::default();
        let view = TransformFactory::translation(&Vector3::new(0.0, -2.0, -8.0));
        let spot = rig.static_spot(&view);
        assert_relative_eq!(spot.position, Vector3::new(0.0, 1.0, -1.0), epsilon = 1e-6);
        assert_relative_eq!(spot.direction.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn singular_model_still_gives_a_direction() {
        let rig = LightRig::default();
        let model = TransformFactory::scaling_nonuniform(&Vector3::new(1.0, 1.0, 0.0));
        let spot = rig.moving_spot(&Matrix4::identity(), &model, 0.0);
        assert!(spot.direction.iter().all(|c| c.is_finite()));
    }
}
