use crate::core::color::unorm8;
use crate::io::image::DecodedImage;
use nalgebra::Vector3;

/// A 2D texture with repeat wrapping and bilinear filtering.
///
/// Texel rows are stored as decoded: `v = 0` is the first row of the file.
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    texels: Vec<Vector3<f32>>,
}

impl Texture {
    pub fn from_image(image: &DecodedImage) -> Self {
        let width = image.width.max(1);
        let height = image.height.max(1);
        let texels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| {
                let [r, g, b] = image.rgb(x, y);
                Vector3::new(unorm8(r), unorm8(g), unorm8(b))
            })
            .collect();
        Self {
            width,
            height,
            texels,
        }
    }

    /// Samples with bilinear filtering. UVs outside [0, 1] repeat.
    pub fn sample(&self, u: f32, v: f32) -> Vector3<f32> {
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);
        bilinear(u, v, self.width, self.height, |x, y| {
            let x = x.rem_euclid(self.width as i32);
            let y = y.rem_euclid(self.height as i32);
            self.texel(x as u32, y as u32)
        })
    }

    fn texel(&self, x: u32, y: u32) -> Vector3<f32> {
        self.texels[(y * self.width + x) as usize]
    }
}

/// Bilinear filter over texel centres, with `fetch` handling out-of-range
/// coordinates.
fn bilinear(
    u: f32,
    v: f32,
    width: u32,
    height: u32,
    fetch: impl Fn(i32, i32) -> Vector3<f32>,
) -> Vector3<f32> {
    let x = u * width as f32 - 0.5;
    let y = v * height as f32 - 0.5;
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let wx = x - x.floor();
    let wy = y - y.floor();

    let top = fetch(x0, y0) * (1.0 - wx) + fetch(x0 + 1, y0) * wx;
    let bottom = fetch(x0, y0 + 1) * (1.0 - wx) + fetch(x0 + 1, y0 + 1) * wx;
    top * (1.0 - wy) + bottom * wy
}

/// Six square faces in +X, -X, +Y, -Y, +Z, -Z order, sampled by direction
/// with clamp-to-edge filtering.
#[derive(Debug, Clone)]
pub struct CubeMap {
    faces: [Texture; 6],
}

impl CubeMap {
    pub fn from_images(faces: &[DecodedImage; 6]) -> Self {
        Self {
            faces: std::array::from_fn(|i| Texture::from_image(&faces[i])),
        }
    }

    /// Samples the face hit by `direction` (need not be normalized).
    pub fn sample(&self, direction: &Vector3<f32>) -> Vector3<f32> {
        let (face, s, t) = face_coordinates(direction);
        let tex = &self.faces[face];
        bilinear(s, t, tex.width, tex.height, |x, y| {
            let x = x.clamp(0, tex.width as i32 - 1);
            let y = y.clamp(0, tex.height as i32 - 1);
            tex.texel(x as u32, y as u32)
        })
    }
}

/// Face index and (s, t) in [0, 1] for a direction, using the usual
/// major-axis cube map convention.
pub fn face_coordinates(d: &Vector3<f32>) -> (usize, f32, f32) {
    let (ax, ay, az) = (d.x.abs(), d.y.abs(), d.z.abs());
    let (face, sc, tc, ma) = if ax >= ay && ax >= az {
        if d.x >= 0.0 {
            (0, -d.z, -d.y, ax)
        } else {
            (1, d.z, -d.y, ax)
        }
    } else if ay >= az {
        if d.y >= 0.0 {
            (2, d.x, d.z, ay)
        } else {
            (3, d.x, -d.z, ay)
        }
    } else if d.z >= 0.0 {
        (4, d.x, -d.y, az)
    } else {
        (5, -d.x, -d.y, az)
    };

    if ma <= f32::EPSILON {
        return (4, 0.5, 0.5);
    }
    (face, 0.5 * (sc / ma + 1.0), 0.5 * (tc / ma + 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn checker() -> DecodedImage {
        DecodedImage {
            width: 2,
            height: 1,
            channels: 3,
            pixels: vec![0, 0, 0, 255, 255, 255],
        }
    }

    #[test]
    fn texel_centres_sample_exactly() {
        let tex = Texture::from_image(&checker());
        assert_relative_eq!(tex.sample(0.25, 0.5), Vector3::zeros(), epsilon = 1e-6);
        assert_relative_eq!(tex.sample(0.75, 0.5), Vector3::repeat(1.0), epsilon = 1e-6);
        // Repeat wrapping
        assert_relative_eq!(tex.sample(1.75, -0.5), Vector3::repeat(1.0), epsilon = 1e-6);
    }

    #[test]
    fn major_axis_picks_the_face() {
        assert_eq!(face_coordinates(&Vector3::new(2.0, 0.1, -0.3)).0, 0);
        assert_eq!(face_coordinates(&Vector3::new(0.0, -1.0, 0.2)).0, 3);
        assert_eq!(face_coordinates(&Vector3::new(0.1, 0.2, -5.0)).0, 5);
        let (_, s, t) = face_coordinates(&Vector3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(s, 0.5);
        assert_relative_eq!(t, 0.5);
    }

    #[test]
    fn cubemap_returns_face_colour() {
        let faces: [DecodedImage; 6] =
            std::array::from_fn(|i| DecodedImage::solid([i as u8 * 40, 0, 0]));
        let cube = CubeMap::from_images(&faces);
        let sample = cube.sample(&Vector3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(sample.x, unorm8(80), epsilon = 1e-6);
    }
}
