use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use gc_core::error::CoreError;
use gc_core::frame::{FrameBuffer, PixelLayout};
use gc_core::traits::Source;

use crate::resize::{fit_width, resize_frame};

/// Source d'image statique. Retourne toujours la même frame.
///
/// # Example
/// ```no_run
/// use gc_source::image::ImageSource;
/// use std::path::Path;
/// let source = ImageSource::new(Path::new("test.png"), Some(640)).unwrap();
/// ```
pub struct ImageSource {
    frame: Arc<FrameBuffer>,
}

impl ImageSource {
    /// Load an image from disk and create a source.
    ///
    /// Une image plus large que `max_width` est réduite (ratio conservé).
    ///
    /// # Errors
    /// Returns an error if the image cannot be loaded or resized.
    pub fn new(path: &Path, max_width: Option<u32>) -> Result<Self> {
        let mut frame = load_image(path)?;
        if let Some(max_w) = max_width {
            let (w, h) = fit_width(frame.width, frame.height, max_w);
            if (w, h) != (frame.width, frame.height) {
                log::info!(
                    "Image réduite : {}x{} → {w}x{h}",
                    frame.width,
                    frame.height
                );
                frame = resize_frame(&frame, w, h)?;
            }
        }
        Ok(Self::from_frame(frame))
    }

    /// Wrap an in-memory bitmap.
    #[must_use]
    pub fn from_frame(frame: FrameBuffer) -> Self {
        Self {
            frame: Arc::new(frame),
        }
    }
}

impl Source for ImageSource {
    fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> {
        Some(Arc::clone(&self.frame))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// Charge une image en bitmap RGBA.
///
/// # Errors
/// Returns an error if the image cannot be loaded.
///
/// # Example
/// ```no_run
/// use gc_source::image::load_image;
/// use std::path::Path;
/// let frame = load_image(Path::new("test.png")).unwrap();
/// ```
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    if !path.is_file() {
        return Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let img =
        image::open(path).with_context(|| format!("Impossible de charger {}", path.display()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let frame = FrameBuffer::from_raw(width, height, PixelLayout::Rgba, rgba.into_raw())?;
    Ok(frame)
}
