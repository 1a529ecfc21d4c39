use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gc_core::config::{ExportFilter, ExportSettings};
use gc_core::frame::{FrameBuffer, PixelLayout};
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};

/// Préfixe des fichiers exportés.
const FILE_PREFIX: &str = "ascii-webcam";

/// Copie la surface dans une image neuve `scale×` plus grande, sur fond noir.
///
/// `Nearest` réplique chaque pixel (couleurs exactes), `Bilinear` lisse.
/// La surface n'est jamais modifiée. Surface vide → `None`.
///
/// # Example
/// ```
/// use gc_core::config::ExportSettings;
/// use gc_core::frame::FrameBuffer;
/// use gc_export::snapshot::export_surface;
///
/// let surface = FrameBuffer::new(32, 24);
/// let img = export_surface(&surface, &ExportSettings::default()).unwrap();
/// assert_eq!(img.dimensions(), (64, 48));
/// ```
#[must_use]
pub fn export_surface(surface: &FrameBuffer, settings: &ExportSettings) -> Option<RgbaImage> {
    if surface.is_empty() {
        return None;
    }
    let source = to_rgba_image(surface)?;
    let scale = settings.export_scale();
    let (w, h) = (surface.width * scale, surface.height * scale);

    let canvas = match settings.filter {
        ExportFilter::Nearest => {
            RgbaImage::from_fn(w, h, |x, y| *source.get_pixel(x / scale, y / scale))
        }
        ExportFilter::Bilinear => {
            let mut img = imageops::resize(&source, w, h, FilterType::Triangle);
            for p in img.pixels_mut() {
                p.0[3] = 255;
            }
            img
        }
    };
    Some(canvas)
}

/// Nom de fichier horodaté, sans `:` : `ascii-webcam-YYYY-MM-DDTHH-MM-SS.png`.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use gc_export::snapshot::suggested_file_name;
/// let t = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// assert_eq!(suggested_file_name(t), "ascii-webcam-2024-03-09T14-05-07.png");
/// ```
#[must_use]
pub fn suggested_file_name(now: DateTime<Utc>) -> String {
    format!("{FILE_PREFIX}-{}.png", now.format("%Y-%m-%dT%H-%M-%S"))
}

/// Écrit l'image en PNG dans `dir`, créé au besoin. Retourne le chemin écrit.
///
/// # Errors
/// Returns an error if the directory cannot be created or the PNG cannot be
/// encoded or written.
pub fn save_png(image: &RgbaImage, dir: &Path, name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Création du dossier d'export {}", dir.display()))?;
    let path = dir.join(name);
    image
        .save_with_format(&path, ImageFormat::Png)
        .with_context(|| format!("Écriture PNG {}", path.display()))?;
    log::info!(
        "Export PNG : {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(path)
}

/// Export complet : mise à l'échelle, nom horodaté, écriture.
///
/// Surface vide → `Ok(None)`, rien n'est écrit.
///
/// # Errors
/// Propagates [`save_png`] failures.
pub fn export_png(
    surface: &FrameBuffer,
    settings: &ExportSettings,
    now: DateTime<Utc>,
) -> Result<Option<PathBuf>> {
    let Some(image) = export_surface(surface, settings) else {
        log::debug!("Export ignoré : surface vide");
        return Ok(None);
    };
    save_png(&image, &settings.directory, &suggested_file_name(now)).map(Some)
}

/// Copie opaque de la surface, composée sur fond noir.
///
/// Les octets au-delà de W×H×canaux sont ignorés.
fn to_rgba_image(surface: &FrameBuffer) -> Option<RgbaImage> {
    let (w, h) = (surface.width, surface.height);
    let len = FrameBuffer::required_len(w, h, surface.layout);
    let data = surface.data.get(..len)?;
    let rgba: Vec<u8> = match surface.layout {
        PixelLayout::Rgba => data.chunks_exact(4).flat_map(over_black).collect(),
        PixelLayout::Rgb => data
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
    };
    RgbaImage::from_raw(w, h, rgba)
}

#[inline(always)]
fn over_black(p: &[u8]) -> [u8; 4] {
    let a = p[3];
    if a == 255 {
        return [p[0], p[1], p[2], 255];
    }
    let mul = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
    [mul(p[0]), mul(p[1]), mul(p[2]), 255]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn checker(w: u32, h: u32) -> FrameBuffer {
        let mut fb = FrameBuffer::new(w, h);
        for (i, px) in fb.data.chunks_exact_mut(4).enumerate() {
            let on = (i as u32 % w + i as u32 / w) % 2 == 0;
            let v = if on { [255, 0, 128, 255] } else { [0, 0, 0, 255] };
            px.copy_from_slice(&v);
        }
        fb
    }

    #[test]
    fn export_doubles_dimensions_and_keeps_the_source() {
        let surface = checker(7, 5);
        let before = surface.clone();
        let img = export_surface(&surface, &ExportSettings::default()).unwrap();
        assert_eq!(img.dimensions(), (14, 10));
        assert_eq!(surface, before);
    }

    #[test]
    fn nearest_keeps_glyph_colors_exact() {
        let surface = checker(4, 4);
        let img = export_surface(&surface, &ExportSettings::default()).unwrap();
        for (x, y, px) in img.enumerate_pixels() {
            let (r, g, b, a) = surface.pixel(x / 2, y / 2);
            assert_eq!(px.0, [r, g, b, a]);
        }
    }

    #[test]
    fn bilinear_scales_to_the_requested_size() {
        let settings = ExportSettings {
            scale: 3,
            filter: ExportFilter::Bilinear,
            ..ExportSettings::default()
        };
        let img = export_surface(&checker(5, 4), &settings).unwrap();
        assert_eq!(img.dimensions(), (15, 12));
        assert!(img.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn transparent_pixels_land_on_black() {
        let surface = FrameBuffer::new(2, 2);
        let img = export_surface(&surface, &ExportSettings::default()).unwrap();
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn rgb_surfaces_are_exported() {
        let surface = FrameBuffer::from_raw(1, 1, PixelLayout::Rgb, vec![9, 8, 7]).unwrap();
        let img = export_surface(&surface, &ExportSettings::default()).unwrap();
        assert_eq!(img.get_pixel(1, 1).0, [9, 8, 7, 255]);
    }

    #[test]
    fn empty_surface_exports_nothing() {
        assert!(export_surface(&FrameBuffer::new(0, 0), &ExportSettings::default()).is_none());
        assert!(export_surface(&FrameBuffer::new(10, 0), &ExportSettings::default()).is_none());
    }

    #[test]
    fn suggested_name_is_filesystem_safe() {
        let t = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 58).unwrap();
        let name = suggested_file_name(t);
        assert_eq!(name, "ascii-webcam-2025-12-31T23-59-58.png");
        assert!(!name.contains(':'));
    }

    #[test]
    fn save_png_creates_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("exports");
        let img = export_surface(&checker(3, 3), &ExportSettings::default()).unwrap();
        let path = save_png(&img, &out, "shot.png").unwrap();
        assert_eq!(path, out.join("shot.png"));
        let back = image::open(&path).unwrap();
        assert_eq!((back.width(), back.height()), (6, 6));
    }

    #[test]
    fn export_png_writes_a_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ExportSettings {
            directory: dir.path().to_path_buf(),
            ..ExportSettings::default()
        };
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let path = export_png(&checker(2, 2), &settings, t).unwrap().unwrap();
        assert!(path.ends_with("ascii-webcam-2024-01-02T03-04-05.png"));
        assert!(path.is_file());

        let none = export_png(&FrameBuffer::new(0, 0), &settings, t).unwrap();
        assert!(none.is_none());
    }
}
