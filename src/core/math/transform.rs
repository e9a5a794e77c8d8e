use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3, Vector4};

//=================================
// Transform Matrix Factory
//=================================

/// Factory for the transformation matrices used by the scene.
/// Manually implemented to keep control over the coordinate system (Right-Handed).
pub struct TransformFactory;

#[rustfmt::skip]
impl TransformFactory {
    /// Creates a rotation matrix around an arbitrary axis using Rodrigues' rotation formula.
    /// The axis does not need to be normalized.
    pub fn rotation(axis: &Vector3<f32>, angle_rad: f32) -> Matrix4<f32> {
        let axis_unit = axis.normalize();
        let x = axis_unit.x;
        let y = axis_unit.y;
        let z = axis_unit.z;
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        let t = 1.0 - c;

        Matrix4::new(
            t * x * x + c,     t * x * y - z * s, t * x * z + y * s, 0.0,
            t * x * y + z * s, t * y * y + c,     t * y * z - x * s, 0.0,
            t * x * z - y * s, t * y * z + x * s, t * z * z + c,     0.0,
            0.0,               0.0,               0.0,               1.0,
        )
    }

    /// Creates a rotation matrix around the Y-axis.
    pub fn rotation_y(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            c,   0.0, s,   0.0,
            0.0, 1.0, 0.0, 0.0,
           -s,   0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Creates a translation matrix.
    pub fn translation(translation: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            1.0, 0.0, 0.0, translation.x,
            0.0, 1.0, 0.0, translation.y,
            0.0, 0.0, 1.0, translation.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Creates a non-uniform scaling matrix.
    pub fn scaling_nonuniform(scale: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            scale.x, 0.0,     0.0,     0.0,
            0.0,     scale.y, 0.0,     0.0,
            0.0,     0.0,     scale.z, 0.0,
            0.0,     0.0,     0.0,     1.0,
        )
    }

    /// Creates a View matrix (Look-At, Right-Handed).
    /// Transforms world space coordinates to camera/view space.
    ///
    /// `target - eye` must not be zero or parallel to `up`; callers validate this.
    pub fn view(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        // In RHS, camera looks down -Z
        let z_axis = (eye - target).normalize();
        let x_axis = up.cross(&z_axis).normalize();
        let y_axis = z_axis.cross(&x_axis);

        let rotation = Matrix4::new(
            x_axis.x, x_axis.y, x_axis.z, 0.0,
            y_axis.x, y_axis.y, y_axis.z, 0.0,
            z_axis.x, z_axis.y, z_axis.z, 0.0,
            0.0,      0.0,      0.0,      1.0,
        );

        let translation = Self::translation(&-eye.coords);

        rotation * translation
    }

    /// Creates a Perspective Projection matrix (Right-Handed).
    /// Maps view frustum to NDC [-1, 1].
    pub fn perspective(aspect_ratio: f32, fov_y_rad: f32, near: f32, far: f32) -> Matrix4<f32> {
        let f = 1.0 / (fov_y_rad / 2.0).tan();
        let nf = 1.0 / (near - far);

        Matrix4::new(
            f / aspect_ratio, 0.0, 0.0,               0.0,
            0.0,              f,   0.0,               0.0,
            0.0,              0.0, (far + near) * nf, 2.0 * far * near * nf,
            0.0,              0.0, -1.0,              0.0,
        )
    }
}

impl TransformFactory {
    /// Inverse-transpose of the upper-left 3x3 (the normal matrix).
    ///
    /// Returns `None` when the linear part is singular.
    pub fn normal_matrix(model: &Matrix4<f32>) -> Option<Matrix3<f32>> {
        let linear = model.fixed_view::<3, 3>(0, 0).into_owned();
        linear.try_inverse().map(|inv| inv.transpose())
    }

    /// The upper-left 3x3 of `m`, i.e. `mat3(m)`.
    pub fn linear_part(m: &Matrix4<f32>) -> Matrix3<f32> {
        m.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// `mat4(mat3(m))`: keeps rotation/scale and drops translation.
    pub fn strip_translation(m: &Matrix4<f32>) -> Matrix4<f32> {
        Self::linear_part(m).to_homogeneous()
    }

    /// Transforms a direction with the 3x3 part only and normalizes it.
    pub fn transform_direction(m: &Matrix4<f32>, direction: &Vector3<f32>) -> Vector3<f32> {
        (Self::linear_part(m) * direction).normalize()
    }

    /// Transforms a position with homogeneous weight 1.
    pub fn transform_point(m: &Matrix4<f32>, point: &Point3<f32>) -> Point3<f32> {
        let v = m * point.to_homogeneous();
        Point3::new(v.x, v.y, v.z)
    }

    /// Translation column of an affine matrix.
    pub fn translation_of(m: &Matrix4<f32>) -> Vector3<f32> {
        Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
    }
}

//=================================
// Core Transformation Functions
//=================================

/// Performs perspective division: Clip Space -> NDC.
#[inline]
pub fn apply_perspective_division(clip: &Vector4<f32>) -> Point3<f32> {
    let w = clip.w;
    if w.abs() > 1e-6 {
        Point3::new(clip.x / w, clip.y / w, clip.z / w)
    } else {
        Point3::origin()
    }
}

/// Converts NDC coordinates to Screen coordinates (Viewport Transform).
/// Note: Y-axis is flipped (NDC +Y is up, Screen +Y is down).
#[inline]
pub fn ndc_to_screen(ndc_x: f32, ndc_y: f32, width: f32, height: f32) -> Point2<f32> {
    Point2::new(
        (ndc_x + 1.0) * 0.5 * width,
        (1.0 - (ndc_y + 1.0) * 0.5) * height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normal_matrix_of_rotation_is_the_rotation() {
        let model = TransformFactory::translation(&Vector3::new(3.0, -1.0, 2.0))
            * TransformFactory::rotation(&Vector3::new(1.0, 0.3, 0.5), 0.7);
        let normal = TransformFactory::normal_matrix(&model).unwrap();
        assert_relative_eq!(normal, TransformFactory::linear_part(&model), epsilon = 1e-5);
    }

    #[test]
    fn normal_matrix_inverts_non_uniform_scale() {
        let model = TransformFactory::scaling_nonuniform(&Vector3::new(2.0, 1.0, 4.0));
        let normal = TransformFactory::normal_matrix(&model).unwrap();
        assert_relative_eq!(
            normal,
            Matrix3::from_diagonal(&Vector3::new(0.5, 1.0, 0.25)),
            epsilon = 1e-6
        );
    }

    #[test]
    fn singular_model_has_no_normal_matrix() {
        let model = TransformFactory::scaling_nonuniform(&Vector3::new(1.0, 0.0, 1.0));
        assert!(TransformFactory::normal_matrix(&model).is_none());
    }

    #[test]
    fn strip_translation_keeps_rotation() {
        let view = TransformFactory::view(
            &Point3::new(4.0, 2.0, 1.0),
            &Point3::new(0.0, 0.0, 0.0),
            &Vector3::y(),
        );
        let sky = TransformFactory::strip_translation(&view);
        assert_eq!(TransformFactory::translation_of(&sky), Vector3::zeros());
        assert_eq!(
            TransformFactory::linear_part(&sky),
            TransformFactory::linear_part(&view)
        );
        assert_eq!(sky[(3, 3)], 1.0);
    }
}
