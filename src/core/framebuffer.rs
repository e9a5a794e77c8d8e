use nalgebra::Vector3;
use std::cell::UnsafeCell;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Comparison used by the depth test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthFunc {
    #[default]
    Less,
    LessEqual,
}

impl DepthFunc {
    #[inline(always)]
    pub fn passes(self, new_depth: f32, current_depth: f32) -> bool {
        match self {
            DepthFunc::Less => new_depth < current_depth,
            DepthFunc::LessEqual => new_depth <= current_depth,
        }
    }
}

/// Depth written by [`FrameBuffer::clear`].
pub const CLEAR_DEPTH: f32 = 1.0;

/// Color and depth storage, supersampled by `sample_count` on each axis.
/// Thread-safe for parallel rendering using atomic depth and striped locking for color.
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub sample_count: usize,
    pub buffer_width: usize,
    pub buffer_height: usize,

    /// Interior mutability guarded by `locks`.
    color_buffer: UnsafeCell<Vec<Vector3<f32>>>,

    /// Depth stored as the bits of an f32 in [0, 1].
    depth_buffer: Vec<AtomicU32>,

    /// Striped locks; a pixel index maps to `index % locks.len()`.
    locks: Vec<Mutex<()>>,
}

// Color writes go through the striped locks, depth through atomics.
unsafe impl Sync for FrameBuffer {}

impl FrameBuffer {
    const LOCK_COUNT: usize = 1024;

    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        let sample_count = sample_count.max(1);
        let buffer_width = width * sample_count;
        let buffer_height = height * sample_count;
        let size = buffer_width * buffer_height;

        let depth_buffer = (0..size)
            .map(|_| AtomicU32::new(CLEAR_DEPTH.to_bits()))
            .collect();
        let locks = (0..Self::LOCK_COUNT).map(|_| Mutex::new(())).collect();

        Self {
            width,
            height,
            sample_count,
            buffer_width,
            buffer_height,
            color_buffer: UnsafeCell::new(vec![Vector3::zeros(); size]),
            depth_buffer,
            locks,
        }
    }

    /// Fills every sample with `color` and resets depth to [`CLEAR_DEPTH`].
    pub fn clear(&mut self, color: Vector3<f32>) {
        self.color_buffer.get_mut().fill(color);
        for depth in &mut self.depth_buffer {
            *depth.get_mut() = CLEAR_DEPTH.to_bits();
        }
    }

    #[inline(always)]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.buffer_width && y < self.buffer_height
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.buffer_width + x
    }

    /// Thread-safe depth test and update.
    /// Returns true and stores `new_depth` if it passes `func` against the stored value.
    #[inline]
    pub fn depth_test_and_update(&self, x: usize, y: usize, new_depth: f32, func: DepthFunc) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let depth_atomic = &self.depth_buffer[self.index(x, y)];
        let new_bits = new_depth.to_bits();

        let mut current_bits = depth_atomic.load(Ordering::Relaxed);
        loop {
            if !func.passes(new_depth, f32::from_bits(current_bits)) {
                return false;
            }
            match depth_atomic.compare_exchange_weak(
                current_bits,
                new_bits,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(updated_bits) => current_bits = updated_bits,
            }
        }
    }

    /// Thread-safe pixel write.
    /// Should only be called after `depth_test_and_update` returns true.
    #[inline]
    pub fn set_pixel_safe(&self, x: usize, y: usize, color: Vector3<f32>) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.index(x, y);
        let _guard = self.locks[idx % self.locks.len()]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // The stripe lock is held for this index.
        unsafe {
            let buffer = &mut *self.color_buffer.get();
            buffer[idx] = color;
        }
    }

    /// Stored depth of one sample.
    pub fn depth_at(&self, x: usize, y: usize) -> Option<f32> {
        self.in_bounds(x, y)
            .then(|| f32::from_bits(self.depth_buffer[self.index(x, y)].load(Ordering::Relaxed)))
    }

    /// Resolved (box-filtered) colour of an output pixel.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Vector3<f32>> {
        if x >= self.width || y >= self.height {
            return None;
        }

        // Only read between draws, never while a draw is in flight.
        let buffer = unsafe { &*self.color_buffer.get() };

        if self.sample_count == 1 {
            return Some(buffer[self.index(x, y)]);
        }

        let start_x = x * self.sample_count;
        let start_y = y * self.sample_count;
        let mut sum = Vector3::zeros();
        for dy in 0..self.sample_count {
            for dx in 0..self.sample_count {
                sum += buffer[self.index(start_x + dx, start_y + dy)];
            }
        }
        Some(sum / (self.sample_count * self.sample_count) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn less_equal_accepts_the_cleared_depth() {
        let fb = FrameBuffer::new(2, 2, 1);
        assert!(!fb.depth_test_and_update(0, 0, CLEAR_DEPTH, DepthFunc::Less));
        assert!(fb.depth_test_and_update(0, 0, CLEAR_DEPTH, DepthFunc::LessEqual));
        assert!(fb.depth_test_and_update(1, 0, 0.5, DepthFunc::Less));
        assert!(!fb.depth_test_and_update(1, 0, 0.7, DepthFunc::LessEqual));
        assert_eq!(fb.depth_at(1, 0), Some(0.5));
    }

    #[test]
    fn clear_resets_color_and_depth() {
        let mut fb = FrameBuffer::new(2, 1, 2);
        assert!(fb.depth_test_and_update(0, 0, 0.25, DepthFunc::Less));
        fb.set_pixel_safe(0, 0, Vector3::new(1.0, 1.0, 1.0));
        fb.clear(Vector3::new(0.1, 0.1, 0.1));
        assert_eq!(fb.depth_at(0, 0), Some(CLEAR_DEPTH));
        assert_eq!(fb.get_pixel(0, 0), Some(Vector3::new(0.1, 0.1, 0.1)));
    }

    #[test]
    fn supersampled_pixels_are_averaged() {
        let fb = FrameBuffer::new(1, 1, 2);
        fb.set_pixel_safe(0, 0, Vector3::new(1.0, 0.0, 0.0));
        fb.set_pixel_safe(1, 1, Vector3::new(1.0, 0.0, 0.0));
        let pixel = fb.get_pixel(0, 0).unwrap();
        assert!((pixel.x - 0.5).abs() < 1e-6);
    }
}
