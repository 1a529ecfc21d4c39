//! Types partagés, configuration et ordonnancement pour glyphcam.
//!
//! This crate contains the bitmap and glyph-grid types, the glyph ramps,
//! the user settings and their TOML loader, and the tick scheduling
//! primitives used across the glyphcam workspace.

pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod schedule;
pub mod traits;

pub use charset::GlyphRamp;
pub use config::{ColorMode, Settings};
pub use error::CoreError;
pub use frame::{FrameBuffer, GlyphCell, GlyphGrid, PixelLayout};
pub use schedule::CancelToken;
