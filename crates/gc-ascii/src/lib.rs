//! Moteur de conversion bitmap → glyphes pour glyphcam.
//!
//! Cell sampler, brightness quantizer, color schemes and the frame renderer
//! that drives them over the whole grid.

pub mod quantize;
pub mod renderer;
pub mod sampler;
pub mod scheme;

pub use renderer::FrameRenderer;
