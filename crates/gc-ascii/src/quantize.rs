use gc_core::charset::GlyphRamp;

/// Index de glyphe pour une luminosité moyenne.
///
/// `floor(clamp(b, 0, 255) / 255 × (len − 1))`, toujours dans `[0, len − 1]`.
/// NaN → 0, −∞ → 0, +∞ → dernier index.
///
/// # Example
/// ```
/// use gc_ascii::quantize::glyph_index;
/// assert_eq!(glyph_index(0.0, 10), 0);
/// assert_eq!(glyph_index(128.0, 10), 4);
/// assert_eq!(glyph_index(255.0, 10), 9);
/// assert_eq!(glyph_index(f32::NAN, 10), 0);
/// ```
#[inline(always)]
#[must_use]
pub fn glyph_index(brightness: f32, ramp_len: usize) -> usize {
    if ramp_len <= 1 {
        return 0;
    }
    let last = ramp_len - 1;
    let b = if brightness.is_nan() {
        0.0
    } else {
        brightness.clamp(0.0, 255.0)
    };
    let idx = (b / 255.0 * last as f32).floor() as usize;
    idx.min(last)
}

/// Glyphe de la rampe pour une luminosité moyenne.
#[inline(always)]
#[must_use]
pub fn quantize(brightness: f32, ramp: &GlyphRamp) -> char {
    ramp.glyph(glyph_index(brightness, ramp.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_map_to_ramp_ends() {
        for len in [1, 2, 10, 70] {
            assert_eq!(glyph_index(0.0, len), 0);
            assert_eq!(glyph_index(255.0, len), len - 1);
        }
    }

    #[test]
    fn every_brightness_stays_in_range_and_is_monotonic() {
        for len in [2, 10, 70] {
            let mut prev = 0;
            for b in 0..=255u32 {
                let idx = glyph_index(b as f32, len);
                assert!(idx < len);
                assert!(idx >= prev, "len={len} b={b}");
                prev = idx;
            }
        }
    }

    #[test]
    fn fractional_brightness_is_floored() {
        // 127.4 / 255 × 9 ≈ 4.496 → 4
        assert_eq!(glyph_index(127.4, 10), 4);
        // 28.4 / 255 × 9 ≈ 1.002 → 1
        assert_eq!(glyph_index(28.4, 10), 1);
    }

    #[test]
    fn non_finite_inputs_are_clamped() {
        assert_eq!(glyph_index(f32::NAN, 10), 0);
        assert_eq!(glyph_index(f32::NEG_INFINITY, 10), 0);
        assert_eq!(glyph_index(f32::INFINITY, 10), 9);
        assert_eq!(glyph_index(-40.0, 10), 0);
        assert_eq!(glyph_index(900.0, 10), 9);
    }

    #[test]
    fn empty_length_is_safe() {
        assert_eq!(glyph_index(200.0, 0), 0);
    }

    #[test]
    fn quantize_reads_the_ramp() {
        let ramp = GlyphRamp::compact();
        assert_eq!(quantize(128.0, &ramp), '=');
        assert_eq!(quantize(0.0, &ramp), ' ');
        assert_eq!(quantize(255.0, &ramp), '@');
    }
}
