use gc_core::frame::FrameBuffer;
use gc_core::traits::Source;
use rayon::prelude::*;
use std::sync::Arc;

/// Taille du pool de frames recyclées.
const POOL_SIZE: usize = 4;

/// Mire synthétique : dégradés diagonaux qui défilent d'une frame à l'autre.
///
/// Toujours prête, infinie. Sert de démo sans webcam et de source de test.
///
/// # Example
/// ```
/// use gc_core::traits::Source;
/// use gc_source::pattern::PatternSource;
/// let mut src = PatternSource::new(64, 48);
/// let frame = src.next_frame().unwrap();
/// assert_eq!((frame.width, frame.height), (64, 48));
/// ```
pub struct PatternSource {
    width: u32,
    height: u32,
    pool: Vec<Arc<FrameBuffer>>,
    frame_count: u64,
}

impl PatternSource {
    /// Creates a new pattern generator with the specified dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let pool = (0..POOL_SIZE)
            .map(|_| Arc::new(FrameBuffer::new(width, height)))
            .collect();
        Self {
            width,
            height,
            pool,
            frame_count: 0,
        }
    }
}

impl Source for PatternSource {
    fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> {
        // Slot libre du pool ; pool saturé → nouveau slot.
        let idx = if let Some(i) = self.pool.iter().position(|a| Arc::strong_count(a) == 1) {
            i
        } else {
            self.pool
                .push(Arc::new(FrameBuffer::new(self.width, self.height)));
            self.pool.len() - 1
        };
        let fb = Arc::get_mut(&mut self.pool[idx])?;

        let t = self.frame_count as u32;
        let w = self.width.max(1);
        let h = self.height.max(1);
        let row_len = (self.width * 4) as usize;
        if row_len > 0 {
            fb.data
                .par_chunks_exact_mut(row_len)
                .enumerate()
                .for_each(|(y, row)| {
                    let y = y as u32;
                    for (x, px) in row.chunks_exact_mut(4).enumerate() {
                        let x = x as u32;
                        px[0] = (x * 255 / w).wrapping_add(t.wrapping_mul(3)) as u8;
                        px[1] = (y * 255 / h) as u8;
                        px[2] = ((x + y) / 2).wrapping_add(t.wrapping_mul(5)) as u8;
                        px[3] = 255;
                    }
                });
        }

        self.frame_count += 1;
        Some(Arc::clone(&self.pool[idx]))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_live(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_move_over_time() {
        let mut src = PatternSource::new(32, 16);
        let a = src.next_frame().unwrap();
        let b = src.next_frame().unwrap();
        assert_ne!(a.data, b.data);
        assert_eq!(src.frame_count, 2);
    }

    #[test]
    fn pixels_are_opaque() {
        let mut src = PatternSource::new(8, 8);
        let frame = src.next_frame().unwrap();
        assert!(frame.data.chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn held_frames_are_never_overwritten() {
        let mut src = PatternSource::new(4, 4);
        let held: Vec<_> = (0..POOL_SIZE + 2).filter_map(|_| src.next_frame()).collect();
        assert_eq!(held.len(), POOL_SIZE + 2);
        let first = held[0].data.clone();
        let _ = src.next_frame();
        assert_eq!(held[0].data, first);
    }

    #[test]
    fn zero_size_is_ready_but_empty() {
        let mut src = PatternSource::new(0, 0);
        let frame = src.next_frame().unwrap();
        assert!(frame.is_empty());
    }
}
