use anyhow::{Context, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, ResizeOptions, Resizer as FirResizer};
use gc_core::error::CoreError;
use gc_core::frame::{FrameBuffer, PixelLayout};

/// Resizer réutilisable wrappant fast_image_resize.
///
/// # Example
/// ```
/// use gc_source::resize::Resizer;
/// let r = Resizer::new();
/// ```
pub struct Resizer {
    inner: FirResizer,
    options: ResizeOptions,
    /// Scratch image for source (owned buffer to avoid the mut borrow issue).
    src_buf: Vec<u8>,
}

impl Resizer {
    /// Create a new resizer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new(),
            src_buf: Vec::new(),
        }
    }

    /// Resize `src` into `dst`. Dimensions of `dst` determine output size.
    ///
    /// `dst` prend la disposition de canaux de `src`.
    ///
    /// # Errors
    /// Returns an error if either buffer has a zero dimension or is too small, or if the resize fails.
    ///
    /// # Example
    /// ```
    /// use gc_source::resize::Resizer;
    /// use gc_core::frame::FrameBuffer;
    /// let mut r = Resizer::new();
    /// let src = FrameBuffer::new(100, 100);
    /// let mut dst = FrameBuffer::new(50, 50);
    /// r.resize_into(&src, &mut dst).unwrap();
    /// ```
    pub fn resize_into(&mut self, src: &FrameBuffer, dst: &mut FrameBuffer) -> Result<()> {
        for fb in [src, &*dst] {
            if fb.is_empty() {
                return Err(CoreError::InvalidDimensions {
                    width: fb.width,
                    height: fb.height,
                }
                .into());
            }
        }
        let src_len = FrameBuffer::required_len(src.width, src.height, src.layout);
        let dst_len = FrameBuffer::required_len(dst.width, dst.height, src.layout);
        let src_data = src
            .data
            .get(..src_len)
            .context("Buffer source trop court")?;

        dst.layout = src.layout;
        dst.data.resize(dst_len, 0);

        if src.width == dst.width && src.height == dst.height {
            dst.data.copy_from_slice(src_data);
            return Ok(());
        }

        // fast_image_resize exige &mut sur la source : copie forcée.
        self.src_buf.clear();
        self.src_buf.extend_from_slice(src_data);

        let pixel_type = match src.layout {
            PixelLayout::Rgb => PixelType::U8x3,
            PixelLayout::Rgba => PixelType::U8x4,
        };

        let src_image = Image::from_slice_u8(src.width, src.height, &mut self.src_buf, pixel_type)
            .context("Invalid source dimensions")?;

        let mut dst_image =
            Image::from_slice_u8(dst.width, dst.height, &mut dst.data[..dst_len], pixel_type)
                .context("Invalid destination dimensions")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("Resize failed")?;

        Ok(())
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Dimensions bornées à `max_width`, ratio conservé. Hauteur ≥ 1.
///
/// # Example
/// ```
/// use gc_source::resize::fit_width;
/// assert_eq!(fit_width(1920, 1080, 640), (640, 360));
/// assert_eq!(fit_width(320, 240, 640), (320, 240));
/// ```
#[must_use]
pub fn fit_width(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 || max_width == 0 {
        return (width, height);
    }
    let h = (u64::from(height) * u64::from(max_width) / u64::from(width)).max(1);
    (max_width, h as u32)
}

/// Convenience for one-shot usage. DO NOT use in hot path.
///
/// # Errors
/// Returns an error if the resize operation fails.
///
/// # Example
/// ```
/// use gc_source::resize::resize_frame;
/// use gc_core::frame::FrameBuffer;
/// let src = FrameBuffer::new(100, 100);
/// let dst = resize_frame(&src, 50, 50).unwrap();
/// assert_eq!(dst.width, 50);
/// ```
pub fn resize_frame(src: &FrameBuffer, width: u32, height: u32) -> Result<FrameBuffer> {
    let mut dst = FrameBuffer::new(width, height);
    let mut resizer = Resizer::new();
    resizer.resize_into(src, &mut dst)?;
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_color_survives_downscale() {
        let mut src = FrameBuffer::new(64, 32);
        src.fill((40, 120, 200));
        let dst = resize_frame(&src, 16, 8).unwrap();
        assert_eq!((dst.width, dst.height), (16, 8));
        let expected = [40u8, 120, 200, 255];
        for px in dst.data.chunks_exact(4) {
            for (got, want) in px.iter().zip(expected) {
                assert!(got.abs_diff(want) <= 1, "{px:?}");
            }
        }
    }

    #[test]
    fn rgb_source_keeps_its_layout() {
        let src = FrameBuffer::from_raw(4, 4, PixelLayout::Rgb, vec![7; 48]).unwrap();
        let dst = resize_frame(&src, 2, 2).unwrap();
        assert_eq!(dst.layout, PixelLayout::Rgb);
        assert_eq!(dst.data.len(), 12);
    }

    #[test]
    fn same_size_is_a_copy() {
        let mut src = FrameBuffer::new(3, 3);
        src.fill((1, 2, 3));
        assert_eq!(resize_frame(&src, 3, 3).unwrap(), src);
    }

    #[test]
    fn zero_sized_target_is_rejected() {
        let src = FrameBuffer::new(4, 4);
        let err = resize_frame(&src, 0, 4).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::InvalidDimensions {
                width: 0,
                height: 4
            })
        ));
    }

    #[test]
    fn fit_width_keeps_aspect() {
        assert_eq!(fit_width(1280, 720, 640), (640, 360));
        assert_eq!(fit_width(4000, 3, 640), (640, 1));
        assert_eq!(fit_width(0, 10, 640), (0, 10));
    }
}
