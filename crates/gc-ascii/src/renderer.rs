use gc_core::charset::GlyphRamp;
use gc_core::config::{
    CELL_SIZE_MAX, CELL_SIZE_MIN, CONTRAST_MAX, CONTRAST_MIN, ColorMode, ContrastStage,
    DEFAULT_CONTRAST, RampChoice, Settings,
};
use gc_core::frame::{FrameBuffer, GlyphCell, GlyphGrid};
use rayon::prelude::*;

use crate::quantize::quantize;
use crate::sampler::sample_cell;
use crate::scheme::apply_scheme;

/// Paramètres d'une passe, lus une fois depuis l'instantané de réglages.
#[derive(Clone, Copy, Debug)]
struct PassParams {
    cell_size: u32,
    stride: u32,
    mode: ColorMode,
    /// Gain appliqué par l'échantillonneur (`ContrastStage::Sample`).
    pre_gain: Option<f32>,
    /// Gain passé au schéma de couleur.
    scheme_gain: f32,
}

impl PassParams {
    fn from_settings(settings: &Settings) -> Self {
        let contrast = if settings.contrast.is_finite() {
            settings.contrast.clamp(CONTRAST_MIN, CONTRAST_MAX)
        } else {
            DEFAULT_CONTRAST
        };
        let (pre_gain, scheme_gain) = match settings.contrast_stage {
            ContrastStage::Scheme => (None, contrast),
            ContrastStage::Sample => (Some(contrast), 1.0),
        };
        Self {
            cell_size: settings.cell_size.clamp(CELL_SIZE_MIN, CELL_SIZE_MAX),
            stride: settings.sample_stride.clamp(1, 4),
            mode: settings.color_mode,
            pre_gain,
            scheme_gain,
        }
    }
}

/// Convertit un bitmap en grille de glyphes colorés.
///
/// Garde la rampe en cache entre les frames et ne la reconstruit que si le
/// réglage change. Sans état d'une frame à l'autre par ailleurs.
///
/// # Example
/// ```
/// use gc_ascii::renderer::FrameRenderer;
/// use gc_core::config::Settings;
/// use gc_core::frame::{FrameBuffer, GlyphGrid};
///
/// let settings = Settings::default();
/// let mut renderer = FrameRenderer::new(&settings.ramp);
/// let frame = FrameBuffer::new(40, 20);
/// let mut grid = GlyphGrid::new(0, 0, settings.cell_size);
/// renderer.render(&frame, &settings, &mut grid);
/// assert_eq!((grid.cols, grid.rows), (4, 2));
/// ```
pub struct FrameRenderer {
    ramp: GlyphRamp,
    current_ramp: RampChoice,
}

impl FrameRenderer {
    /// Create a renderer for the given ramp choice.
    #[must_use]
    pub fn new(ramp: &RampChoice) -> Self {
        Self {
            ramp: ramp.ramp(),
            current_ramp: ramp.clone(),
        }
    }

    /// Rebuild the cached ramp if the choice has changed.
    pub fn update_if_needed(&mut self, ramp: &RampChoice) {
        if &self.current_ramp != ramp {
            log::debug!("Rampe changée : {}", ramp.label());
            self.ramp = ramp.ramp();
            self.current_ramp = ramp.clone();
        }
    }

    /// Rampe actuellement en cache.
    #[must_use]
    pub fn ramp(&self) -> &GlyphRamp {
        &self.ramp
    }

    /// Redessine entièrement `grid` à partir de `frame`.
    ///
    /// La grille est réallouée seulement si la taille du bitmap ou de
    /// cellule change, sinon vidée puis réutilisée. Les lignes sont remplies
    /// en parallèle. Retourne quand la grille est complète.
    pub fn render(&mut self, frame: &FrameBuffer, settings: &Settings, grid: &mut GlyphGrid) {
        self.update_if_needed(&settings.ramp);
        let pass = PassParams::from_settings(settings);

        if !grid.matches(frame.width, frame.height, pass.cell_size) {
            log::debug!(
                "Grille réallouée : {}x{} px, cellule {}",
                frame.width,
                frame.height,
                pass.cell_size
            );
            *grid = GlyphGrid::new(frame.width, frame.height, pass.cell_size);
        }
        grid.clear();
        if grid.cells.is_empty() {
            return;
        }

        let cols = grid.cols as usize;
        let ramp = &self.ramp;
        grid.cells
            .par_chunks_mut(cols)
            .enumerate()
            .for_each(|(row, cells)| {
                let y = row as u32 * pass.cell_size;
                for (col, cell) in cells.iter_mut().enumerate() {
                    let x = col as u32 * pass.cell_size;
                    *cell = render_cell(frame, x, y, &pass, ramp);
                }
            });
    }
}

/// Sampler → quantizer → schéma pour une cellule. `None` si aucun pixel lu.
#[inline(always)]
fn render_cell(
    frame: &FrameBuffer,
    x: u32,
    y: u32,
    pass: &PassParams,
    ramp: &GlyphRamp,
) -> Option<GlyphCell> {
    let sample = sample_cell(frame, x, y, pass.cell_size, pass.stride, pass.pre_gain);
    if sample.count == 0 {
        return None;
    }
    Some(GlyphCell {
        ch: quantize(sample.brightness, ramp),
        fg: apply_scheme(pass.mode, sample.r, sample.g, sample.b, pass.scheme_gain),
    })
}

/// Rendu ponctuel dans une grille neuve. Pour les tests et l'export headless,
/// PAS pour la boucle par tick (alloue à chaque appel).
#[must_use]
pub fn render_frame(frame: &FrameBuffer, settings: &Settings) -> GlyphGrid {
    let mut renderer = FrameRenderer::new(&settings.ramp);
    let mut grid = GlyphGrid::new(0, 0, settings.cell_size);
    renderer.render(frame, settings, &mut grid);
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc_core::config::ColorMode;

    fn gray(w: u32, h: u32, v: u8) -> FrameBuffer {
        let mut fb = FrameBuffer::new(w, h);
        fb.fill((v, v, v));
        fb
    }

    fn settings(mode: ColorMode, contrast: f32) -> Settings {
        Settings {
            cell_size: 10,
            contrast,
            color_mode: mode,
            ..Settings::default()
        }
    }

    #[test]
    fn mid_gray_cell_renders_one_white_equals_sign() {
        let grid = render_frame(&gray(10, 10, 128), &settings(ColorMode::Monochrome, 1.0));
        assert_eq!((grid.cols, grid.rows), (1, 1));
        assert_eq!(grid.glyph_count(), 1);
        let cell = grid.get(0, 0).copied();
        assert_eq!(
            cell,
            Some(GlyphCell {
                ch: '=',
                fg: (255, 255, 255)
            })
        );
        assert_eq!(grid.origin(0, 0), (0, 0));
    }

    #[test]
    fn rendering_twice_is_identical() {
        let mut fb = FrameBuffer::new(37, 23);
        for (i, px) in fb.data.chunks_exact_mut(4).enumerate() {
            px.copy_from_slice(&[(i * 7) as u8, (i * 13) as u8, (i * 3) as u8, 255]);
        }
        let s = settings(ColorMode::Neon, 1.4);
        let mut renderer = FrameRenderer::new(&s.ramp);
        let mut a = GlyphGrid::new(0, 0, 10);
        let mut b = GlyphGrid::new(0, 0, 10);
        renderer.render(&fb, &s, &mut a);
        renderer.render(&fb, &s, &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn trailing_partial_cells_are_drawn() {
        let grid = render_frame(&gray(21, 9, 255), &settings(ColorMode::FullColor, 1.0));
        assert_eq!((grid.cols, grid.rows), (3, 1));
        assert_eq!(grid.glyph_count(), 3);
        assert_eq!(grid.get(2, 0).map(|c| c.ch), Some('@'));
    }

    #[test]
    fn black_cells_still_get_the_darkest_glyph() {
        let grid = render_frame(&gray(20, 20, 0), &settings(ColorMode::Monochrome, 1.2));
        assert_eq!(grid.glyph_count(), 4);
        assert!(grid.glyphs().all(|(_, _, c)| c.ch == ' '));
    }

    #[test]
    fn empty_bitmap_renders_nothing() {
        let grid = render_frame(&FrameBuffer::new(0, 16), &Settings::default());
        assert_eq!(grid.glyph_count(), 0);
        assert!(grid.cells.is_empty());
    }

    #[test]
    fn grid_is_reused_while_dimensions_hold() {
        let s = Settings::default();
        let mut renderer = FrameRenderer::new(&s.ramp);
        let mut grid = GlyphGrid::new(0, 0, s.cell_size);
        renderer.render(&gray(40, 40, 90), &s, &mut grid);
        let ptr = grid.cells.as_ptr();
        renderer.render(&gray(40, 40, 200), &s, &mut grid);
        assert_eq!(grid.cells.as_ptr(), ptr);

        let bigger = Settings {
            cell_size: 20,
            ..s
        };
        renderer.render(&gray(40, 40, 200), &bigger, &mut grid);
        assert_eq!((grid.cols, grid.rows, grid.cell_size), (2, 2, 20));
    }

    #[test]
    fn invalid_cell_size_is_clamped_before_use() {
        let s = Settings {
            cell_size: 0,
            ..Settings::default()
        };
        let grid = render_frame(&gray(8, 8, 60), &s);
        assert_eq!(grid.cell_size, CELL_SIZE_MIN);
        assert_eq!((grid.cols, grid.rows), (2, 2));
    }

    #[test]
    fn ramp_change_rebuilds_the_cache() {
        let mut s = Settings::default();
        let mut renderer = FrameRenderer::new(&s.ramp);
        assert_eq!(renderer.ramp().len(), 10);
        s.ramp = RampChoice::Standard;
        let mut grid = GlyphGrid::new(0, 0, s.cell_size);
        renderer.render(&gray(10, 10, 255), &s, &mut grid);
        assert_eq!(renderer.ramp().len(), 70);
        assert_eq!(grid.get(0, 0).map(|c| c.ch), Some('$'));
    }

    #[test]
    fn contrast_stage_moves_the_gain() {
        let fb = gray(10, 10, 100);
        let mut s = settings(ColorMode::FullColor, 2.0);

        s.contrast_stage = ContrastStage::Scheme;
        let scheme = render_frame(&fb, &s);
        // Luminosité brute 100 → index 3, couleur × 2 par le schéma.
        assert_eq!(
            scheme.get(0, 0).copied(),
            Some(GlyphCell {
                ch: '-',
                fg: (200, 200, 200)
            })
        );

        s.contrast_stage = ContrastStage::Sample;
        let sample = render_frame(&fb, &s);
        // Gain appliqué une seule fois, avant la moyenne.
        assert_eq!(
            sample.get(0, 0).copied(),
            Some(GlyphCell {
                ch: '#',
                fg: (200, 200, 200)
            })
        );
    }

    #[test]
    fn out_of_range_contrast_is_clamped() {
        let fb = gray(10, 10, 100);
        let wild = render_frame(&fb, &settings(ColorMode::FullColor, 9.0));
        let max = render_frame(&fb, &settings(ColorMode::FullColor, CONTRAST_MAX));
        assert_eq!(wild, max);
    }

    #[test]
    fn cells_are_independent_of_neighbours() {
        // Moitié gauche noire, moitié droite blanche.
        let mut fb = FrameBuffer::new(20, 10);
        for y in 0..10usize {
            for x in 10..20usize {
                let idx = (y * 20 + x) * 4;
                fb.data[idx..idx + 4].copy_from_slice(&[255, 255, 255, 255]);
            }
        }
        let grid = render_frame(&fb, &settings(ColorMode::Matrix, 1.0));
        assert_eq!(
            grid.get(0, 0).copied(),
            Some(GlyphCell {
                ch: ' ',
                fg: (0, 0, 0)
            })
        );
        assert_eq!(
            grid.get(1, 0).copied(),
            Some(GlyphCell {
                ch: '@',
                fg: (0, 255, 0)
            })
        );
    }
}
