use nalgebra::Vector3;

/// Clamps each channel to [0, 1]; NaN becomes 0.
#[inline]
pub fn saturate(color: Vector3<f32>) -> Vector3<f32> {
    color.map(|c| if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) })
}

/// Converts a clamped linear colour to 8-bit channels.
#[inline]
pub fn to_rgb8(color: Vector3<f32>) -> [u8; 3] {
    let c = saturate(color);
    [
        (c.x * 255.0).round() as u8,
        (c.y * 255.0).round() as u8,
        (c.z * 255.0).round() as u8,
    ]
}

/// Packs a colour as `0x00RRGGBB`.
#[inline]
pub fn pack_0rgb(color: Vector3<f32>) -> u32 {
    let [r, g, b] = to_rgb8(color);
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Converts an 8-bit channel to [0, 1].
#[inline]
pub fn unorm8(value: u8) -> f32 {
    value as f32 / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_channels_are_clamped() {
        assert_eq!(to_rgb8(Vector3::new(-1.0, 0.5, 3.0)), [0, 128, 255]);
        assert_eq!(pack_0rgb(Vector3::new(1.0, 0.0, f32::NAN)), 0x00FF_0000);
    }
}
