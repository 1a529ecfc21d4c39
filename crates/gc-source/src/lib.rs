//! Sources vidéo pour glyphcam (image fixe, mire, webcam/fichier via ffmpeg).

pub mod image;
pub mod pattern;
pub mod resize;

#[cfg(feature = "stream")]
pub mod stream;
