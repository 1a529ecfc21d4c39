use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use anyhow::{Context, Result};

/// Polices monospace système essayées dans l'ordre quand aucune n'est configurée.
#[cfg(target_os = "linux")]
const SYSTEM_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu-sans-mono-fonts/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeMono.ttf",
    "/usr/share/fonts/gnu-free/FreeMono.otf",
];

#[cfg(target_os = "macos")]
const SYSTEM_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/Menlo.ttc",
    "/System/Library/Fonts/Monaco.ttf",
    "/Library/Fonts/Courier New.ttf",
];

#[cfg(target_os = "windows")]
const SYSTEM_CANDIDATES: &[&str] = &[
    "C:\\Windows\\Fonts\\consola.ttf",
    "C:\\Windows\\Fonts\\lucon.ttf",
    "C:\\Windows\\Fonts\\cour.ttf",
];

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const SYSTEM_CANDIDATES: &[&str] = &[];

/// Première police monospace système présente sur le disque.
#[must_use]
pub fn find_system_font() -> Option<PathBuf> {
    SYSTEM_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Charge la police configurée, ou la première police système trouvée.
///
/// # Errors
/// Returns an error if the configured file is missing or not a valid
/// TTF/OTF, or if no configured path is given and no system candidate exists.
pub fn load_font(configured: Option<&Path>) -> Result<FontVec> {
    let path = match configured {
        Some(p) => p.to_path_buf(),
        None => find_system_font().context("Aucune police monospace système trouvée")?,
    };
    let data =
        std::fs::read(&path).with_context(|| format!("Lecture police {}", path.display()))?;
    let font = FontVec::try_from_vec(data)
        .with_context(|| format!("Police invalide : {}", path.display()))?;
    log::info!("Police chargée : {}", path.display());
    Ok(font)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_configured_font_is_an_error() {
        let err = load_font(Some(Path::new("/nonexistent/glyphcam/font.ttf")));
        assert!(err.is_err());
    }

    #[test]
    fn garbage_font_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        let err = load_font(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("Police invalide"));
    }

    #[test]
    fn system_candidate_loads_when_present() {
        let Some(path) = find_system_font() else {
            return;
        };
        assert!(load_font(Some(&path)).is_ok());
    }
}
