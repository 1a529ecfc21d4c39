/// Affichage terminal pour glyphcam.
///
/// Provides canvas rendering of the glyph grid, the sidebar/help layout,
/// and FPS tracking.
pub mod canvas;
pub mod fps;
pub mod ui;
