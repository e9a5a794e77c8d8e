use crate::core::math::transform::TransformFactory;
use nalgebra::{Matrix4, Point3, Vector3};

/// Placement of every drawable in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLayout {
    /// Moving object path: `(sin t + 1) · amplitude`.
    pub moving_amplitude: Vector3<f32>,
    /// Moving object spin about +Y, in degrees per second.
    pub moving_spin_deg: f32,
    /// Static cube centres; cube `i` (1-based) is rotated `i · static_step_deg`.
    pub static_positions: Vec<Point3<f32>>,
    pub static_axis: Vector3<f32>,
    pub static_step_deg: f32,
    pub sphere_position: Point3<f32>,
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            moving_amplitude: Vector3::new(0.0, 0.0, -5.0),
            moving_spin_deg: 50.0,
            static_positions: vec![
                Point3::new(1.2, 2.0, -8.0),
                Point3::new(-3.8, 3.0, -7.3),
                Point3::new(0.4, 4.0, -3.5),
                Point3::new(-2.7, 1.5, -8.5),
                Point3::new(3.3, 3.2, -3.5),
                Point3::new(1.7, 2.0, 1.0),
                Point3::new(1.9, 4.0, -1.5),
                Point3::new(-2.9, 1.5, -1.5),
            ],
            static_axis: Vector3::new(1.0, 0.3, 0.5),
            static_step_deg: 20.0,
            sphere_position: Point3::new(-1.0, 2.9, -5.5),
        }
    }
}

impl SceneLayout {
    pub fn moving_translation(&self, time: f32) -> Vector3<f32> {
        self.moving_amplitude * (time.sin() + 1.0)
    }

    /// `translate(translation) · rotate_y(t · spin)`
    pub fn moving_model(&self, time: f32) -> Matrix4<f32> {
        TransformFactory::translation(&self.moving_translation(time))
            * TransformFactory::rotation_y((time * self.moving_spin_deg).to_radians())
    }

    pub fn static_models(&self) -> Vec<Matrix4<f32>> {
        self.static_positions
            .iter()
            .enumerate()
            .map(|(i, position)| {
                let angle = (self.static_step_deg * (i + 1) as f32).to_radians();
                TransformFactory::translation(&position.coords)
                    * TransformFactory::rotation(&self.static_axis, angle)
            })
            .collect()
    }

    pub fn sphere_model(&self) -> Matrix4<f32> {
        TransformFactory::translation(&self.sphere_position.coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn moving_object_starts_at_its_midpoint() {
        let layout = SceneLayout::default();
        assert_relative_eq!(
            layout.moving_translation(0.0),
            Vector3::new(0.0, 0.0, -5.0),
            epsilon = 1e-6
        );
        let model = layout.moving_model(std::f32::consts::FRAC_PI_2);
        assert_relative_eq!(
            TransformFactory::translation_of(&model),
            Vector3::new(0.0, 0.0, -10.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn static_models_keep_their_positions() {
        let layout = SceneLayout::default();
        let models = layout.static_models();
        assert_eq!(models.len(), 8);
        for (model, position) in models.iter().zip(&layout.static_positions) {
            assert_relative_eq!(
                TransformFactory::translation_of(model),
                position.coords,
                epsilon = 1e-6
            );
        }
    }
}
