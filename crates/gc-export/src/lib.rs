//! Rasterisation des glyphes et export d'images fixes pour glyphcam.

pub mod font;
pub mod rasterizer;
pub mod snapshot;

pub use rasterizer::Rasterizer;
