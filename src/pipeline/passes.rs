use crate::core::color::{pack_0rgb, to_rgb8};
use crate::core::framebuffer::FrameBuffer;
use rayon::prelude::*;

/// Resolves the framebuffer into `0x00RRGGBB` words, one per pixel.
pub fn post_process_to_buffer(framebuffer: &FrameBuffer, buffer: &mut [u32]) {
    buffer
        .par_chunks_mut(framebuffer.width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = framebuffer.get_pixel(x, y).map_or(0, pack_0rgb);
            }
        });
}

/// Resolves the framebuffer into tightly packed RGBA8 with opaque alpha.
pub fn post_process_to_rgba(framebuffer: &FrameBuffer, rgba: &mut Vec<u8>) {
    rgba.resize(framebuffer.width * framebuffer.height * 4, 0);
    rgba.par_chunks_mut(framebuffer.width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, texel) in row.chunks_exact_mut(4).enumerate() {
                let [r, g, b] = framebuffer.get_pixel(x, y).map_or([0; 3], to_rgb8);
                texel.copy_from_slice(&[r, g, b, 255]);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn resolve_packs_cleared_colour() {
        let mut fb = FrameBuffer::new(3, 2, 1);
        fb.clear(Vector3::new(1.0, 0.0, 0.5));

        let mut words = vec![0u32; 6];
        post_process_to_buffer(&fb, &mut words);
        assert!(words.iter().all(|&w| w == 0x00FF_0080));

        let mut rgba = Vec::new();
        post_process_to_rgba(&fb, &mut rgba);
        assert_eq!(rgba.len(), 24);
        assert_eq!(&rgba[20..24], &[255, 0, 128, 255]);
    }
}
