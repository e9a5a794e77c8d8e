use crate::core::framebuffer::{DepthFunc, FrameBuffer};
use crate::core::math::interpolation::{
    barycentric_coordinates, interpolate_depth, is_inside_triangle, perspective_correct_barycentric,
};
use crate::core::math::transform::{apply_perspective_division, ndc_to_screen};
use crate::core::pipeline::{Interpolatable, Shader};
use nalgebra::{Point2, Vector4};
use rayon::prelude::*;

/// Draws clip-space triangles onto a [`FrameBuffer`].
#[derive(Debug, Clone, Copy)]
pub struct Rasterizer {
    pub depth_func: DepthFunc,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

type ClipVertex<V> = (Vector4<f32>, V);

impl Rasterizer {
    pub fn new() -> Self {
        Self {
            depth_func: DepthFunc::Less,
        }
    }

    /// Rasterize a single triangle given clip-space coordinates and corresponding varyings.
    ///
    /// Performs **Sutherland–Hodgman clipping** against the canonical view
    /// frustum in homogeneous clip space, then fans the clipped polygon.
    pub fn rasterize_triangle<S: Shader>(
        &self,
        framebuffer: &FrameBuffer,
        shader: &S,
        clip_coords: &[Vector4<f32>; 3],
        varyings: &[S::Varying; 3],
    ) {
        // A triangle clipped by six planes has at most nine vertices.
        let mut current_poly: Vec<ClipVertex<S::Varying>> = Vec::with_capacity(16);
        let mut clip_buffer: Vec<ClipVertex<S::Varying>> = Vec::with_capacity(16);
        current_poly.extend(clip_coords.iter().copied().zip(varyings.iter().copied()));

        // (axis, sign): inside when sign * p[axis] <= p.w
        const PLANES: [(usize, f32); 6] = [
            (0, 1.0),
            (0, -1.0),
            (1, 1.0),
            (1, -1.0),
            (2, 1.0),
            (2, -1.0),
        ];

        for &(axis, sign) in &PLANES {
            if current_poly.is_empty() {
                return;
            }
            clip_polygon_against_plane(&current_poly, &mut clip_buffer, axis, sign);
            std::mem::swap(&mut current_poly, &mut clip_buffer);
        }

        if current_poly.len() < 3 {
            return;
        }

        let v0 = current_poly[0];
        for pair in current_poly[1..].windows(2) {
            self.rasterize_triangle_clipped(
                framebuffer,
                shader,
                &[v0.0, pair[0].0, pair[1].0],
                &[v0.1, pair[0].1, pair[1].1],
            );
        }
    }

    /// Rasterizes a triangle already inside the frustum: perspective division,
    /// viewport transform, depth test and fragment shading.
    fn rasterize_triangle_clipped<S: Shader>(
        &self,
        framebuffer: &FrameBuffer,
        shader: &S,
        clip_coords: &[Vector4<f32>; 3],
        varyings: &[S::Varying; 3],
    ) {
        let width = framebuffer.buffer_width as f32;
        let height = framebuffer.buffer_height as f32;

        let mut screen_coords = [Point2::origin(); 3];
        let mut ndc_z = [0.0; 3];
        let mut w_values = [0.0; 3];

        for i in 0..3 {
            if clip_coords[i].w.abs() < 1e-6 {
                return;
            }
            let ndc = apply_perspective_division(&clip_coords[i]);
            w_values[i] = clip_coords[i].w;
            ndc_z[i] = ndc.z;
            screen_coords[i] = ndc_to_screen(ndc.x, ndc.y, width, height);
        }

        let [v0, v1, v2] = screen_coords;
        let (min_x, min_y, max_x, max_y) = compute_bounding_box(&screen_coords);

        // Scissor
        if max_x < 0
            || max_y < 0
            || min_x >= framebuffer.buffer_width as i32
            || min_y >= framebuffer.buffer_height as i32
        {
            return;
        }

        let start_x = min_x.max(0) as usize;
        let end_x = max_x.min(framebuffer.buffer_width as i32 - 1) as usize;
        let start_y = min_y.max(0) as usize;
        let end_y = max_y.min(framebuffer.buffer_height as i32 - 1) as usize;
        let depth_func = self.depth_func;

        // Row workloads vary, so let rayon steal rows.
        (start_y..=end_y).into_par_iter().for_each(|y| {
            for x in start_x..=end_x {
                let pixel_center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);

                let Some(bary) = barycentric_coordinates(pixel_center, v0, v1, v2) else {
                    continue;
                };
                if !is_inside_triangle(bary) {
                    continue;
                }

                let depth = interpolate_depth(bary, ndc_z);
                if !framebuffer.depth_test_and_update(x, y, depth, depth_func) {
                    continue;
                }

                let Some(corrected) =
                    perspective_correct_barycentric(bary, w_values[0], w_values[1], w_values[2])
                else {
                    continue;
                };

                let varying = varyings[0] * corrected.x
                    + varyings[1] * corrected.y
                    + varyings[2] * corrected.z;
                framebuffer.set_pixel_safe(x, y, shader.fragment(varying));
            }
        });
    }
}

/// Clips a polygon against one frustum plane, writing into `output`.
fn clip_polygon_against_plane<V: Interpolatable>(
    input: &[ClipVertex<V>],
    output: &mut Vec<ClipVertex<V>>,
    axis: usize,
    sign: f32,
) {
    output.clear();
    let Some(&last) = input.last() else {
        return;
    };

    let is_inside = |p: &Vector4<f32>| sign * p[axis] <= p.w + 1e-6;

    let mut prev = last;
    let mut prev_inside = is_inside(&prev.0);

    for &curr in input {
        let curr_inside = is_inside(&curr.0);
        if curr_inside != prev_inside {
            if let Some(inter) = intersect_edge_plane(prev, curr, axis, sign) {
                output.push(inter);
            }
        }
        if curr_inside {
            output.push(curr);
        }
        prev = curr;
        prev_inside = curr_inside;
    }
}

/// Intersection of segment `a`-`b` with the plane `sign * p[axis] = p.w`,
/// interpolating position and varying.
#[inline(always)]
fn intersect_edge_plane<V: Interpolatable>(
    a: ClipVertex<V>,
    b: ClipVertex<V>,
    axis: usize,
    sign: f32,
) -> Option<ClipVertex<V>> {
    let (ac, bc) = (a.0[axis], b.0[axis]);
    let (aw, bw) = (a.0.w, b.0.w);

    let denom = sign * (bc - ac) - (bw - aw);
    if denom.abs() < 1e-9 {
        return None;
    }
    let t = (aw - sign * ac) / denom;
    if !t.is_finite() {
        return None;
    }

    let pos = a.0 + (b.0 - a.0) * t;
    let vary = a.1 * (1.0 - t) + b.1 * t;
    Some((pos, vary))
}

fn compute_bounding_box(points: &[Point2<f32>; 3]) -> (i32, i32, i32, i32) {
    let min_x = points[0].x.min(points[1].x).min(points[2].x).floor() as i32;
    let min_y = points[0].y.min(points[1].y).min(points[2].y).floor() as i32;
    let max_x = points[0].x.max(points[1].x).max(points[2].x).ceil() as i32;
    let max_y = points[0].y.max(points[1].y).max(points[2].y).ceil() as i32;
    (min_x, min_y, max_x, max_y)
}
