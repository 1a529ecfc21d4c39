use std::sync::Arc;

use crate::frame::FrameBuffer;

/// Fournit des bitmaps au pipeline, un par tick, à la demande.
///
/// Implémenté par : `ImageSource`, `PatternSource`, `StreamSource`.
///
/// # Example
/// ```
/// use gc_core::traits::Source;
/// use gc_core::frame::FrameBuffer;
/// use std::sync::Arc;
///
/// struct NeverReady;
/// impl Source for NeverReady {
///     fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> { None }
///     fn native_size(&self) -> (u32, u32) { (0, 0) }
///     fn is_live(&self) -> bool { true }
/// }
/// assert!(NeverReady.next_frame().is_none());
/// ```
pub trait Source: Send + 'static {
    /// Retourne le bitmap courant.
    ///
    /// Retourne `None` tant que la source n'est pas prête (pas encore de
    /// données suffisantes). Ne bloque JAMAIS — retourne la dernière frame
    /// connue si pas de nouvelle.
    fn next_frame(&mut self) -> Option<Arc<FrameBuffer>>;

    /// Dimensions natives de la source. (0, 0) si encore inconnues.
    fn native_size(&self) -> (u32, u32);

    /// Indique si la source est infinie (webcam, motif) ou finie (fichier).
    fn is_live(&self) -> bool;
}
