use crate::core::math::transform::TransformFactory;
use crate::error::{RenderError, Result};
use nalgebra::{Matrix4, Point3, Vector3};

/// Minimum |forward × up| relative to |forward|·|up|.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Position and orientation of a viewpoint.
///
/// `forward` need not be unit length; its magnitude is the chase stand-off
/// distance. The basis is validated on every mutation so [`Camera::view_matrix`]
/// never sees a degenerate one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Point3<f32>,
    forward: Vector3<f32>,
    up: Vector3<f32>,
}

impl Camera {
    pub fn new(position: Point3<f32>, forward: Vector3<f32>, up: Vector3<f32>) -> Result<Self> {
        if !position.iter().all(|c| c.is_finite()) {
            return Err(RenderError::DegenerateCamera("position is not finite"));
        }
        validate_basis(&forward, &up)?;
        Ok(Self {
            position,
            forward,
            up,
        })
    }

    /// Camera with the default +Y up vector.
    pub fn looking(position: Point3<f32>, forward: Vector3<f32>) -> Result<Self> {
        Self::new(position, forward, Vector3::y())
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.forward
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn set_position(&mut self, position: Point3<f32>) -> Result<()> {
        if !position.iter().all(|c| c.is_finite()) {
            return Err(RenderError::DegenerateCamera("position is not finite"));
        }
        self.position = position;
        Ok(())
    }

    pub fn set_forward(&mut self, forward: Vector3<f32>) -> Result<()> {
        validate_basis(&forward, &self.up)?;
        self.forward = forward;
        Ok(())
    }

    pub fn set_up(&mut self, up: Vector3<f32>) -> Result<()> {
        validate_basis(&self.forward, &up)?;
        self.up = up;
        Ok(())
    }

    /// Points the camera at `target` with a unit forward vector.
    pub fn look_at(&mut self, target: &Point3<f32>) -> Result<()> {
        let forward = (target - self.position)
            .try_normalize(f32::EPSILON)
            .ok_or(RenderError::DegenerateCamera("target coincides with position"))?;
        self.set_forward(forward)
    }

    /// Right-handed look-at from `position` towards `position + forward`.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        TransformFactory::view(&self.position, &(self.position + self.forward), &self.up)
    }
}

fn validate_basis(forward: &Vector3<f32>, up: &Vector3<f32>) -> Result<()> {
    if !forward.iter().chain(up.iter()).all(|c| c.is_finite()) {
        return Err(RenderError::DegenerateCamera("basis is not finite"));
    }
    let forward_len = forward.norm();
    let up_len = up.norm();
    if forward_len <= f32::EPSILON {
        return Err(RenderError::DegenerateCamera("forward is zero"));
    }
    if up_len <= f32::EPSILON {
        return Err(RenderError::DegenerateCamera("up is zero"));
    }
    if forward.cross(up).norm() <= PARALLEL_EPSILON * forward_len * up_len {
        return Err(RenderError::DegenerateCamera("forward is parallel to up"));
    }
    Ok(())
}

/// Perspective projection shared by all cameras.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y_deg: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn new(fov_y_deg: f32, width: u32, height: u32, near: f32, far: f32) -> Self {
        Self {
            fov_y_deg,
            aspect_ratio: width as f32 / height.max(1) as f32,
            near,
            far,
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        TransformFactory::perspective(
            self.aspect_ratio,
            self.fov_y_deg.to_radians(),
            self.near,
            self.far,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    #[test]
    fn view_maps_eye_and_forward_onto_negative_z() {
        let position = Point3::new(3.0, -2.0, 5.0);
        for forward in [
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, -2.0, -8.0),
        ] {
            let camera = Camera::looking(position, forward).unwrap();
            let view = camera.view_matrix();
            let eye = view * position.to_homogeneous();
            let ahead = view * (position + forward).to_homogeneous();
            assert_relative_eq!(eye, Vector4::new(0.0, 0.0, 0.0, 1.0), epsilon = 1e-5);
            assert_relative_eq!(
                ahead,
                Vector4::new(0.0, 0.0, -forward.norm(), 1.0),
                epsilon = 1e-5
            );
        }
    }

    #[test]
    fn degenerate_bases_are_rejected() {
        let origin = Point3::origin();
        assert!(Camera::looking(origin, Vector3::zeros()).is_err());
        assert!(Camera::looking(origin, Vector3::new(0.0, 3.0, 0.0)).is_err());
        assert!(Camera::looking(origin, Vector3::new(f32::NAN, 0.0, -1.0)).is_err());

        let mut camera = Camera::looking(origin, -Vector3::z()).unwrap();
        assert!(camera.set_forward(Vector3::y()).is_err());
        assert!(camera.set_up(Vector3::z()).is_err());
        assert_eq!(camera.forward(), -Vector3::z());

        assert!(camera
            .set_position(Point3::new(f32::INFINITY, 0.0, 0.0))
            .is_err());
        assert_eq!(camera.position(), origin);
    }

    #[test]
    fn look_at_own_position_keeps_forward() {
        let mut camera = Camera::looking(Point3::new(1.0, 1.0, 1.0), -Vector3::z()).unwrap();
        assert!(camera.look_at(&Point3::new(1.0, 1.0, 1.0)).is_err());
        assert_eq!(camera.forward(), -Vector3::z());

        camera.look_at(&Point3::new(1.0, 1.0, -4.0)).unwrap();
        assert_relative_eq!(camera.forward(), -Vector3::z(), epsilon = 1e-6);
    }

    #[test]
    fn projection_uses_window_aspect() {
        let projection = Projection::new(45.0, 1600, 1200, 0.1, 100.0);
        assert_relative_eq!(projection.aspect_ratio, 4.0 / 3.0);
        let m = projection.matrix();
        assert_relative_eq!(m[(3, 2)], -1.0);
    }
}
