use gc_core::frame::FrameBuffer;

/// Moyennes d'une cellule échantillonnée. Toutes les valeurs dans [0, 255].
///
/// `count == 0` ⇒ cellule dégénérée, toutes les moyennes valent 0.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellSample {
    /// Rouge moyen.
    pub r: f32,
    /// Vert moyen.
    pub g: f32,
    /// Bleu moyen.
    pub b: f32,
    /// Moyenne des luminosités par pixel, (R+G+B)/3.
    pub brightness: f32,
    /// Nombre de pixels lus.
    pub count: u32,
}

/// Réduit la cellule d'origine `(x, y)` à une couleur/luminosité moyenne.
///
/// Lit une ligne et une colonne sur `stride` (2 ⇒ ~25 % des pixels), et
/// s'arrête au bord droit/bas du bitmap : une cellule partielle lit moins
/// de pixels, jamais hors limites.
///
/// `pre_gain` : si présent, chaque canal lu est multiplié puis borné à 255
/// AVANT la moyenne. Sinon les canaux bruts sont moyennés.
///
/// # Example
/// ```
/// use gc_core::frame::FrameBuffer;
/// use gc_ascii::sampler::sample_cell;
///
/// let mut fb = FrameBuffer::new(4, 4);
/// fb.fill((30, 60, 90));
/// let s = sample_cell(&fb, 0, 0, 4, 2, None);
/// assert_eq!(s.count, 4);
/// assert_eq!((s.r, s.g, s.b, s.brightness), (30.0, 60.0, 90.0, 60.0));
/// ```
#[must_use]
pub fn sample_cell(
    frame: &FrameBuffer,
    x: u32,
    y: u32,
    cell_size: u32,
    stride: u32,
    pre_gain: Option<f32>,
) -> CellSample {
    let stride = stride.max(1) as usize;
    let channels = frame.layout.channels();
    let row_len = frame.width as usize * channels;

    let x_end = x.saturating_add(cell_size).min(frame.width);
    let y_end = y.saturating_add(cell_size).min(frame.height);
    if x >= x_end || y >= y_end {
        return CellSample::default();
    }

    let mut count = 0u32;
    match pre_gain {
        None => {
            // Sommes entières : moyennes exactes sur une cellule uniforme.
            let (mut tr, mut tg, mut tb) = (0u64, 0u64, 0u64);
            for py in (y..y_end).step_by(stride) {
                let row = py as usize * row_len;
                for px in (x..x_end).step_by(stride) {
                    let idx = row + px as usize * channels;
                    let Some(p) = frame.data.get(idx..idx + 3) else {
                        break;
                    };
                    tr += u64::from(p[0]);
                    tg += u64::from(p[1]);
                    tb += u64::from(p[2]);
                    count += 1;
                }
            }
            averages(tr as f64, tg as f64, tb as f64, count)
        }
        Some(gain) => {
            let gained = |c: u8| (f64::from(c) * f64::from(gain)).clamp(0.0, 255.0);
            let (mut tr, mut tg, mut tb) = (0f64, 0f64, 0f64);
            for py in (y..y_end).step_by(stride) {
                let row = py as usize * row_len;
                for px in (x..x_end).step_by(stride) {
                    let idx = row + px as usize * channels;
                    let Some(p) = frame.data.get(idx..idx + 3) else {
                        break;
                    };
                    tr += gained(p[0]);
                    tg += gained(p[1]);
                    tb += gained(p[2]);
                    count += 1;
                }
            }
            averages(tr, tg, tb, count)
        }
    }
}

/// La moyenne des (R+G+B)/3 par pixel vaut (ΣR+ΣG+ΣB)/(3n).
fn averages(tr: f64, tg: f64, tb: f64, count: u32) -> CellSample {
    if count == 0 {
        return CellSample::default();
    }
    let n = f64::from(count);
    CellSample {
        r: (tr / n) as f32,
        g: (tg / n) as f32,
        b: (tb / n) as f32,
        brightness: ((tr + tg + tb) / (3.0 * n)) as f32,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc_core::frame::PixelLayout;

    fn uniform(w: u32, h: u32, rgb: (u8, u8, u8)) -> FrameBuffer {
        let mut fb = FrameBuffer::new(w, h);
        fb.fill(rgb);
        fb
    }

    #[test]
    fn uniform_cell_returns_exact_color_for_any_size_and_stride() {
        let fb = uniform(40, 40, (17, 200, 101));
        for cell in [1, 4, 7, 10, 20] {
            for stride in 1..=4 {
                let s = sample_cell(&fb, 0, 0, cell, stride, None);
                assert!(s.count > 0);
                assert_eq!((s.r, s.g, s.b), (17.0, 200.0, 101.0), "cell={cell} stride={stride}");
                assert!((s.brightness - (17.0 + 200.0 + 101.0) / 3.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn stride_two_reads_a_quarter_of_the_cell() {
        let fb = uniform(10, 10, (1, 1, 1));
        assert_eq!(sample_cell(&fb, 0, 0, 10, 2, None).count, 25);
        assert_eq!(sample_cell(&fb, 0, 0, 10, 1, None).count, 100);
    }

    #[test]
    fn stride_samples_the_even_pixels() {
        // Colonnes paires blanches, impaires noires : stride 2 ne voit que du blanc.
        let mut fb = FrameBuffer::new(4, 4);
        for y in 0..4usize {
            for x in (0..4usize).step_by(2) {
                let idx = (y * 4 + x) * 4;
                fb.data[idx..idx + 4].copy_from_slice(&[255, 255, 255, 255]);
            }
        }
        let s = sample_cell(&fb, 0, 0, 4, 2, None);
        assert_eq!(s.brightness, 255.0);
        let s = sample_cell(&fb, 0, 0, 4, 1, None);
        assert_eq!(s.brightness, 127.5);
    }

    #[test]
    fn partial_cell_stops_at_edges() {
        let fb = uniform(12, 12, (50, 50, 50));
        // Cellule (10,10) de taille 10 : seules 2×2 colonnes/lignes existent.
        let s = sample_cell(&fb, 10, 10, 10, 2, None);
        assert_eq!(s.count, 1);
        assert_eq!(s.brightness, 50.0);
    }

    #[test]
    fn degenerate_cell_has_zero_samples() {
        let fb = uniform(8, 8, (255, 255, 255));
        let outside = sample_cell(&fb, 8, 0, 4, 2, None);
        assert_eq!(outside, CellSample::default());
        let zero = sample_cell(&fb, 0, 0, 0, 2, None);
        assert_eq!(zero.count, 0);
        assert_eq!(zero.brightness, 0.0);
    }

    #[test]
    fn pre_gain_is_clamped_per_channel_before_averaging() {
        let fb = uniform(4, 4, (200, 100, 0));
        let s = sample_cell(&fb, 0, 0, 4, 2, Some(2.0));
        assert_eq!((s.r, s.g, s.b), (255.0, 200.0, 0.0));
        assert!((s.brightness - 455.0 / 3.0).abs() < 1e-3);
    }

    #[test]
    fn rgb_layout_is_supported() {
        let data = vec![10, 20, 30].repeat(9);
        let fb = FrameBuffer::from_raw(3, 3, PixelLayout::Rgb, data).unwrap();
        let s = sample_cell(&fb, 0, 0, 3, 1, None);
        assert_eq!(s.count, 9);
        assert_eq!((s.r, s.g, s.b), (10.0, 20.0, 30.0));
    }

    #[test]
    fn short_buffer_is_never_read_out_of_bounds() {
        let mut fb = uniform(4, 4, (9, 9, 9));
        fb.data.truncate(20);
        let s = sample_cell(&fb, 0, 0, 4, 1, None);
        assert!(s.count < 16);
    }
}
