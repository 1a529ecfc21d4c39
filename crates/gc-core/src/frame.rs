use crate::error::CoreError;

/// Disposition des canaux dans un buffer de pixels.
///
/// # Example
/// ```
/// use gc_core::frame::PixelLayout;
/// assert_eq!(PixelLayout::Rgb.channels(), 3);
/// assert_eq!(PixelLayout::Rgba.channels(), 4);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelLayout {
    /// R, G, B — 3 octets par pixel.
    Rgb,
    /// R, G, B, A — 4 octets par pixel.
    #[default]
    Rgba,
}

impl PixelLayout {
    /// Octets par pixel.
    #[inline(always)]
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Bitmap source : pixels entrelacés 8 bits, row-major.
///
/// Immuable pendant une passe de conversion. La source vidéo le possède
/// (via `Arc`), le pipeline ne fait que l'emprunter.
///
/// # Example
/// ```
/// use gc_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Samples entrelacés, row-major. Longueur ≥ `width × height × channels`.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channel layout of `data`.
    pub layout: PixelLayout,
}

impl FrameBuffer {
    /// Crée un buffer RGBA pré-alloué (tout à zéro) aux dimensions données.
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(100, 50);
    /// assert_eq!(fb.width, 100);
    /// assert_eq!(fb.height, 50);
    /// assert_eq!(fb.data.len(), 100 * 50 * 4);
    /// ```
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; Self::required_len(width, height, PixelLayout::Rgba)],
            width,
            height,
            layout: PixelLayout::Rgba,
        }
    }

    /// Wrap an existing sample buffer after checking its length.
    ///
    /// # Errors
    /// Returns [`CoreError::BufferTooSmall`] if `data` holds fewer than
    /// `width × height × channels` samples.
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::{FrameBuffer, PixelLayout};
    /// let fb = FrameBuffer::from_raw(2, 1, PixelLayout::Rgb, vec![1, 2, 3, 4, 5, 6]).unwrap();
    /// assert_eq!(fb.pixel(1, 0), (4, 5, 6, 255));
    /// assert!(FrameBuffer::from_raw(2, 2, PixelLayout::Rgb, vec![0; 6]).is_err());
    /// ```
    pub fn from_raw(
        width: u32,
        height: u32,
        layout: PixelLayout,
        data: Vec<u8>,
    ) -> Result<Self, CoreError> {
        let expected = Self::required_len(width, height, layout);
        if data.len() < expected {
            return Err(CoreError::BufferTooSmall {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            layout,
        })
    }

    /// Nombre minimal d'octets pour ces dimensions.
    #[must_use]
    pub fn required_len(width: u32, height: u32, layout: PixelLayout) -> usize {
        width as usize * height as usize * layout.channels()
    }

    /// `true` si l'une des dimensions est nulle.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Accès au pixel (x, y) → (r, g, b, a). L'alpha vaut 255 en RGB.
    ///
    /// Hors limites → (0, 0, 0, 0).
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(10, 10);
    /// assert_eq!(fb.pixel(0, 0), (0, 0, 0, 0));
    /// assert_eq!(fb.pixel(10, 0), (0, 0, 0, 0));
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        if x >= self.width || y >= self.height {
            return (0, 0, 0, 0);
        }
        let channels = self.layout.channels();
        let idx = (y as usize * self.width as usize + x as usize) * channels;
        if idx + channels > self.data.len() {
            return (0, 0, 0, 0);
        }
        let alpha = if channels == 4 { self.data[idx + 3] } else { 255 };
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            alpha,
        )
    }

    /// Remplit tout le buffer avec une couleur opaque.
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::FrameBuffer;
    /// let mut fb = FrameBuffer::new(2, 2);
    /// fb.fill((10, 20, 30));
    /// assert_eq!(fb.pixel(1, 1), (10, 20, 30, 255));
    /// ```
    pub fn fill(&mut self, rgb: (u8, u8, u8)) {
        let channels = self.layout.channels();
        for px in self.data.chunks_exact_mut(channels) {
            px[0] = rgb.0;
            px[1] = rgb.1;
            px[2] = rgb.2;
            if channels == 4 {
                px[3] = 255;
            }
        }
    }
}

/// Un glyphe posé sur la grille : caractère + couleur foreground.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphCell {
    /// Caractère de la rampe.
    pub ch: char,
    /// Couleur foreground (RGB).
    pub fg: (u8, u8, u8),
}

/// Grille de sortie : une cellule optionnelle par bloc `cell_size × cell_size`.
///
/// `None` = cellule non dessinée (aucun pixel échantillonné).
/// Pré-allouée, réutilisée chaque frame tant que les dimensions ne changent pas.
///
/// # Example
/// ```
/// use gc_core::frame::{GlyphCell, GlyphGrid};
/// let mut grid = GlyphGrid::new(25, 10, 10);
/// assert_eq!((grid.cols, grid.rows), (3, 1));
/// grid.set(2, 0, Some(GlyphCell { ch: '@', fg: (255, 0, 0) }));
/// assert_eq!(grid.origin(2, 0), (20, 0));
/// assert_eq!(grid.get(2, 0).map(|c| c.ch), Some('@'));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphGrid {
    /// Flat array of cells, row-major.
    pub cells: Vec<Option<GlyphCell>>,
    /// Columns (`ceil(width / cell_size)`).
    pub cols: u32,
    /// Rows (`ceil(height / cell_size)`).
    pub rows: u32,
    /// Côté d'une cellule en pixels source.
    pub cell_size: u32,
    /// Largeur du bitmap couvert, en pixels.
    pub width: u32,
    /// Hauteur du bitmap couvert, en pixels.
    pub height: u32,
}

impl GlyphGrid {
    /// Grille vide couvrant un bitmap `width × height`.
    ///
    /// Un `cell_size` nul est ramené à 1.
    #[must_use]
    pub fn new(width: u32, height: u32, cell_size: u32) -> Self {
        let cell_size = cell_size.max(1);
        let cols = width.div_ceil(cell_size);
        let rows = height.div_ceil(cell_size);
        Self {
            cells: vec![None; cols as usize * rows as usize],
            cols,
            rows,
            cell_size,
            width,
            height,
        }
    }

    /// `true` si la grille couvre exactement ces dimensions.
    #[must_use]
    pub fn matches(&self, width: u32, height: u32, cell_size: u32) -> bool {
        self.width == width && self.height == height && self.cell_size == cell_size.max(1)
    }

    /// Set a cell at grid position (col, row). Hors limites → ignoré.
    #[inline(always)]
    pub fn set(&mut self, col: u32, row: u32, cell: Option<GlyphCell>) {
        if col < self.cols && row < self.rows {
            self.cells[row as usize * self.cols as usize + col as usize] = cell;
        }
    }

    /// Get the glyph at grid position (col, row), if one was drawn.
    #[inline(always)]
    #[must_use]
    pub fn get(&self, col: u32, row: u32) -> Option<&GlyphCell> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells[row as usize * self.cols as usize + col as usize].as_ref()
    }

    /// Pixel origin (top-left) of a cell.
    #[inline]
    #[must_use]
    pub fn origin(&self, col: u32, row: u32) -> (u32, u32) {
        (col * self.cell_size, row * self.cell_size)
    }

    /// Clear all cells.
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::{GlyphCell, GlyphGrid};
    /// let mut grid = GlyphGrid::new(10, 10, 5);
    /// grid.set(0, 0, Some(GlyphCell { ch: '#', fg: (255, 255, 255) }));
    /// grid.clear();
    /// assert_eq!(grid.glyph_count(), 0);
    /// ```
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Nombre de glyphes effectivement posés.
    #[must_use]
    pub fn glyph_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Itère sur les glyphes posés : `(col, row, cell)`.
    pub fn glyphs(&self) -> impl Iterator<Item = (u32, u32, &GlyphCell)> + '_ {
        let cols = self.cols.max(1) as usize;
        self.cells.iter().enumerate().filter_map(move |(i, c)| {
            c.as_ref()
                .map(|cell| ((i % cols) as u32, (i / cols) as u32, cell))
        })
    }
}
