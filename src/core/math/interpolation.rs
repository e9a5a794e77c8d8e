use nalgebra::{Point2, Vector3};

const EPSILON: f32 = 1e-5;

/// Barycentric weights (alpha, beta, gamma) of `p` with respect to the
/// screen-space triangle (v1, v2, v3).
///
/// Returns `None` for a triangle with (near) zero area.
pub fn barycentric_coordinates(
    p: Point2<f32>,
    v1: Point2<f32>,
    v2: Point2<f32>,
    v3: Point2<f32>,
) -> Option<Vector3<f32>> {
    let e1 = v2 - v1;
    let e2 = v3 - v1;
    let p_v1 = p - v1;

    // Twice the signed area
    let area_x2 = e1.x * e2.y - e1.y * e2.x;
    if area_x2.abs() < EPSILON {
        return None;
    }
    let inv_area_x2 = 1.0 / area_x2;

    let beta = (p_v1.x * e2.y - p_v1.y * e2.x) * inv_area_x2;
    let gamma = (e1.x * p_v1.y - e1.y * p_v1.x) * inv_area_x2;

    Some(Vector3::new(1.0 - beta - gamma, beta, gamma))
}

/// True if every weight is non-negative (within tolerance).
#[inline(always)]
pub fn is_inside_triangle(bary: Vector3<f32>) -> bool {
    bary.x >= -EPSILON && bary.y >= -EPSILON && bary.z >= -EPSILON
}

/// Perspective-correct weights from screen-space weights and clip-space w.
///
///   wa = alpha / w1, wb = beta / w2, wc = gamma / w3
///   alpha' = wa / (wa + wb + wc), ...
pub fn perspective_correct_barycentric(
    bary: Vector3<f32>,
    w1: f32,
    w2: f32,
    w3: f32,
) -> Option<Vector3<f32>> {
    if w1.abs() < EPSILON || w2.abs() < EPSILON || w3.abs() < EPSILON {
        return None;
    }
    let weighted = Vector3::new(bary.x / w1, bary.y / w2, bary.z / w3);
    let sum = weighted.x + weighted.y + weighted.z;
    if sum.abs() < EPSILON {
        return None;
    }
    Some(weighted / sum)
}

/// Window-space depth in [0, 1] from the per-vertex NDC z values.
///
/// NDC z is affine in screen space, so the screen-space weights are used.
#[inline]
pub fn interpolate_depth(bary: Vector3<f32>, ndc_z: [f32; 3]) -> f32 {
    let z = bary.x * ndc_z[0] + bary.y * ndc_z[1] + bary.z * ndc_z[2];
    (z * 0.5 + 0.5).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn corners_get_unit_weights() {
        let (a, b, c) = (
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(0.0, 4.0),
        );
        let bary = barycentric_coordinates(b, a, b, c).unwrap();
        assert_relative_eq!(bary, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
        assert!(is_inside_triangle(bary));
        let outside = barycentric_coordinates(Point2::new(5.0, 5.0), a, b, c).unwrap();
        assert!(!is_inside_triangle(outside));
    }

    #[test]
    fn equal_w_keeps_screen_weights() {
        let bary = Vector3::new(0.2, 0.3, 0.5);
        let corrected = perspective_correct_barycentric(bary, 2.0, 2.0, 2.0).unwrap();
        assert_relative_eq!(corrected, bary, epsilon = 1e-6);
    }

    #[test]
    fn far_plane_depth_is_one() {
        let depth = interpolate_depth(Vector3::new(0.3, 0.3, 0.4), [1.0, 1.0, 1.0]);
        assert_eq!(depth, 1.0);
    }
}
