use crate::error::{RenderError, Result};
use image::{ImageBuffer, Rgb};
use log::{debug, info};
use std::path::Path;

/// 8-bit image as handed to the graphics backend. Rows run top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// 1 (grey), 2 (grey + alpha), 3 (RGB) or 4 (RGBA).
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// A 1×1 RGB image.
    pub fn solid(rgb: [u8; 3]) -> Self {
        Self {
            width: 1,
            height: 1,
            channels: 3,
            pixels: rgb.to_vec(),
        }
    }

    /// RGB of one texel. Grey images replicate their single channel.
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let channels = self.channels.max(1) as usize;
        let idx = (y as usize * self.width as usize + x as usize) * channels;
        match self.pixels.get(idx..idx + channels) {
            Some([g]) | Some([g, _]) => [*g, *g, *g],
            Some([r, g, b, ..]) => [*r, *g, *b],
            _ => [0, 0, 0],
        }
    }
}

/// Decodes an image file, keeping its channel count.
pub fn decode_image<P: AsRef<Path>>(path: P) -> Result<DecodedImage> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|source| RenderError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let (width, height) = (img.width(), img.height());
    let channels = img.color().channel_count();
    let pixels = match channels {
        1 => img.into_luma8().into_raw(),
        2 => img.into_luma_alpha8().into_raw(),
        3 => img.into_rgb8().into_raw(),
        _ => img.into_rgba8().into_raw(),
    };
    let channels = channels.clamp(1, 4);

    debug!("Decoded {:?}: {}x{}, {} channel(s)", path, width, height, channels);
    Ok(DecodedImage {
        width,
        height,
        channels,
        pixels,
    })
}

/// Saves a u32 (0RGB) buffer to an image file; the format follows the extension.
pub fn save_buffer_to_image<P: AsRef<Path>>(
    buffer: &[u32],
    width: usize,
    height: usize,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let img_buf = ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let color = buffer
            .get(y as usize * width + x as usize)
            .copied()
            .unwrap_or(0);
        Rgb([
            ((color >> 16) & 0xFF) as u8,
            ((color >> 8) & 0xFF) as u8,
            (color & 0xFF) as u8,
        ])
    });

    img_buf.save(path).map_err(|source| RenderError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Saved frame to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grey_texels_are_replicated() {
        let img = DecodedImage {
            width: 2,
            height: 1,
            channels: 1,
            pixels: vec![10, 200],
        };
        assert_eq!(img.rgb(1, 0), [200, 200, 200]);
        assert_eq!(DecodedImage::solid([1, 2, 3]).rgb(0, 0), [1, 2, 3]);
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let err = decode_image("does/not/exist.png").unwrap_err();
        assert!(matches!(err, RenderError::Decode { .. }));
    }
}
