use gc_core::frame::GlyphGrid;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

/// Écrit directement une `GlyphGrid` dans un `ratatui::Buffer`.
///
/// Une cellule terminal par cellule de grille, coupée à `area`.
/// Pas de widget Canvas ratatui — écriture directe pour zéro overhead.
/// Cellule non dessinée → espace.
///
/// # Example
/// ```
/// use gc_core::frame::{GlyphCell, GlyphGrid};
/// use gc_render::canvas::render_grid;
/// use ratatui::buffer::Buffer;
/// use ratatui::layout::Rect;
///
/// let mut grid = GlyphGrid::new(20, 10, 10);
/// grid.set(1, 0, Some(GlyphCell { ch: '@', fg: (255, 0, 0) }));
/// let area = Rect::new(0, 0, 4, 2);
/// let mut buf = Buffer::empty(area);
/// render_grid(&mut buf, area, &grid);
/// assert_eq!(buf[(1, 0)].symbol(), "@");
/// ```
pub fn render_grid(buf: &mut Buffer, area: Rect, grid: &GlyphGrid) {
    let rows = grid.rows.min(u32::from(area.height)) as u16;
    let cols = grid.cols.min(u32::from(area.width)) as u16;
    for cy in 0..rows {
        for cx in 0..cols {
            let Some(buf_cell) = buf.cell_mut((area.x + cx, area.y + cy)) else {
                continue;
            };
            match grid.get(u32::from(cx), u32::from(cy)) {
                Some(cell) => {
                    buf_cell
                        .set_char(cell.ch)
                        .set_fg(Color::Rgb(cell.fg.0, cell.fg.1, cell.fg.2));
                }
                None => {
                    buf_cell.set_char(' ');
                }
            }
        }
    }
}
