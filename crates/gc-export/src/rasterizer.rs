use ab_glyph::{Font, FontVec, PxScale, point};
use gc_core::frame::{FrameBuffer, GlyphGrid, PixelLayout};
use rayon::prelude::*;
use std::collections::HashMap;

/// Atlas alpha des glyphes, un buffer `cell_size × cell_size` par caractère.
///
/// Peint une [`GlyphGrid`] sur une surface RGBA : fond noir, chaque glyphe
/// dans la boîte de sa cellule, coupé au bord de la surface.
pub struct GlyphAtlas {
    cell_size: u32,
    /// Maps a char to its 1D alpha buffer (size = cell_size²).
    glyphs: HashMap<char, Vec<u8>>,
    /// Glyphe vide pré-alloué pour les caractères absents.
    empty: Vec<u8>,
}

impl GlyphAtlas {
    /// Atlas vide pour des cellules de `cell_size` pixels (≥ 1).
    #[must_use]
    pub fn new(cell_size: u32) -> Self {
        let cell_size = cell_size.max(1);
        Self {
            cell_size,
            glyphs: HashMap::new(),
            empty: vec![0u8; (cell_size * cell_size) as usize],
        }
    }

    /// Côté des cellules, en pixels.
    #[must_use]
    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// `true` si le caractère a déjà été rasterisé.
    #[must_use]
    pub fn contains(&self, ch: char) -> bool {
        self.glyphs.contains_key(&ch)
    }

    /// Enregistre le masque alpha d'un caractère (tronqué ou complété à cell_size²).
    pub fn insert(&mut self, ch: char, mut alpha: Vec<u8>) {
        alpha.resize(self.empty.len(), 0);
        self.glyphs.insert(ch, alpha);
    }

    /// Rendu de la grille sur la surface. Parallélisé par bande de cellules.
    ///
    /// La surface est réallouée en RGBA si elle ne couvre pas exactement le
    /// bitmap de la grille, puis vidée en noir opaque.
    pub fn paint(&self, grid: &GlyphGrid, surface: &mut FrameBuffer) {
        if surface.width != grid.width
            || surface.height != grid.height
            || surface.layout != PixelLayout::Rgba
        {
            *surface = FrameBuffer::new(grid.width, grid.height);
        }
        surface.fill((0, 0, 0));

        if grid.cell_size != self.cell_size {
            log::error!(
                "Atlas dimension mismatch: grid cell={} atlas cell={}",
                grid.cell_size,
                self.cell_size
            );
            return;
        }
        if surface.is_empty() || grid.cols == 0 {
            return;
        }

        let width = surface.width as usize;
        let stride = width * 4;
        let cs = self.cell_size as usize;
        let used = stride * surface.height as usize;

        surface.data[..used]
            .par_chunks_mut(stride * cs)
            .enumerate()
            .for_each(|(row, band)| {
                let band_rows = band.len() / stride;
                for col in 0..grid.cols {
                    let Some(cell) = grid.get(col, row as u32) else {
                        continue;
                    };
                    let alpha = self.glyphs.get(&cell.ch).unwrap_or(&self.empty);
                    let x0 = col as usize * cs;
                    let cols_px = cs.min(width - x0);

                    for cy in 0..band_rows {
                        let line = cy * stride;
                        for cx in 0..cols_px {
                            let a = alpha[cy * cs + cx];
                            if a == 0 {
                                continue;
                            }
                            // Fond noir : fg × alpha.
                            let af = f32::from(a) / 255.0;
                            let idx = line + (x0 + cx) * 4;
                            band[idx] = (f32::from(cell.fg.0) * af).round() as u8;
                            band[idx + 1] = (f32::from(cell.fg.1) * af).round() as u8;
                            band[idx + 2] = (f32::from(cell.fg.2) * af).round() as u8;
                        }
                    }
                }
            });
    }
}

/// Convertit une [`GlyphGrid`] en pixels RGBA avec une police monospace.
///
/// Les glyphes sont rasterisés une fois à la taille de cellule (police de
/// `cell_size` px) puis gardés en cache. Un changement de taille de cellule
/// reconstruit l'atlas. Les caractères hors ASCII imprimable sont ajoutés
/// à la demande.
pub struct Rasterizer {
    font: FontVec,
    atlas: GlyphAtlas,
}

impl Rasterizer {
    /// Initialise le rasterizer et pré-calcule l'ASCII imprimable.
    #[must_use]
    pub fn new(font: FontVec, cell_size: u32) -> Self {
        let mut rasterizer = Self {
            font,
            atlas: GlyphAtlas::new(cell_size),
        };
        rasterizer.cache_printable();
        rasterizer
    }

    /// Construit depuis les octets d'un fichier TTF/OTF.
    ///
    /// # Errors
    /// Retourne une erreur si la police fournie est invalide.
    pub fn from_bytes(font_data: Vec<u8>, cell_size: u32) -> anyhow::Result<Self> {
        let font = FontVec::try_from_vec(font_data)?;
        Ok(Self::new(font, cell_size))
    }

    /// Taille de cellule de l'atlas courant.
    #[must_use]
    pub fn cell_size(&self) -> u32 {
        self.atlas.cell_size()
    }

    /// Reconstruit l'atlas si la taille de cellule a changé.
    pub fn ensure_cell_size(&mut self, cell_size: u32) {
        if self.atlas.cell_size() != cell_size.max(1) {
            log::debug!("Atlas reconstruit pour cellule {cell_size}px");
            self.atlas = GlyphAtlas::new(cell_size);
            self.cache_printable();
        }
    }

    /// Peint la grille sur la surface (effacée en noir au préalable).
    pub fn paint(&mut self, grid: &GlyphGrid, surface: &mut FrameBuffer) {
        self.ensure_cell_size(grid.cell_size);
        let missing: Vec<char> = grid
            .glyphs()
            .map(|(_, _, cell)| cell.ch)
            .filter(|ch| !self.atlas.contains(*ch))
            .collect();
        for ch in missing {
            self.cache_char(ch);
        }
        self.atlas.paint(grid, surface);
    }

    fn cache_printable(&mut self) {
        for ch in (32u8..=126).map(char::from) {
            self.cache_char(ch);
        }
    }

    fn cache_char(&mut self, ch: char) {
        if self.atlas.contains(ch) {
            return;
        }
        let alpha = rasterize_glyph(&self.font, ch, self.atlas.cell_size());
        self.atlas.insert(ch, alpha);
    }
}

/// Masque alpha d'un caractère, baseline à l'ascender, police de `cell_size` px.
///
/// Caractère absent de la police (glyph_id 0 = .notdef) → masque vide.
fn rasterize_glyph(font: &FontVec, ch: char, cell_size: u32) -> Vec<u8> {
    let mut buffer = vec![0u8; (cell_size * cell_size) as usize];
    let gid = font.glyph_id(ch);
    if gid.0 == 0 {
        log::debug!("Glyphe absent de la police : {ch:?}");
        return buffer;
    }

    let scale = PxScale::from(cell_size as f32);
    let ascent_px = font.ascent_unscaled() * scale.y / font.height_unscaled();
    let glyph = gid.with_scale_and_position(scale, point(0.0, ascent_px));

    if let Some(outline) = font.outline_glyph(glyph) {
        let bounds = outline.px_bounds();
        #[allow(clippy::cast_possible_wrap)]
        outline.draw(|x, y, v| {
            let px = x as i32 + bounds.min.x as i32;
            let py = y as i32 + bounds.min.y as i32;
            if px < 0 || py < 0 {
                return;
            }
            let (px, py) = (px as u32, py as u32);
            if px < cell_size && py < cell_size {
                let idx = (py * cell_size + px) as usize;
                buffer[idx] = (v * 255.0).round().clamp(0.0, 255.0) as u8;
            }
        });
    }
    buffer
}
