use gc_core::config::ColorMode;

const WHITE: (u8, u8, u8) = (255, 255, 255);
const NEON_BOOST: f32 = 1.5;

/// Couleur de sortie d'une cellule selon le schéma sélectionné.
///
/// Entrées : moyennes de canal dans [0, 255] et gain de contraste.
/// Chaque canal est borné indépendamment à [0, 255] (NaN → 0), puis arrondi.
///
/// # Example
/// ```
/// use gc_ascii::scheme::apply_scheme;
/// use gc_core::config::ColorMode;
/// assert_eq!(apply_scheme(ColorMode::FullColor, 100.0, 50.0, 200.0, 1.5), (150, 75, 255));
/// assert_eq!(apply_scheme(ColorMode::Matrix, 30.0, 60.0, 90.0, 1.0), (0, 60, 0));
/// ```
#[must_use]
pub fn apply_scheme(mode: ColorMode, r: f32, g: f32, b: f32, contrast: f32) -> (u8, u8, u8) {
    match mode {
        ColorMode::Monochrome => WHITE,
        ColorMode::FullColor => (
            channel(r * contrast),
            channel(g * contrast),
            channel(b * contrast),
        ),
        ColorMode::Sepia => {
            let sr = 0.393 * r + 0.769 * g + 0.189 * b;
            let sg = 0.349 * r + 0.686 * g + 0.168 * b;
            let sb = 0.272 * r + 0.534 * g + 0.131 * b;
            (
                channel(sr * contrast),
                channel(sg * contrast),
                channel(sb * contrast),
            )
        }
        ColorMode::Neon => neon(r, g, b, contrast),
        ColorMode::Matrix => (0, channel((r + g + b) / 3.0 * contrast), 0),
    }
}

/// Canal(aux) dominant(s) × 1.5 × contraste, les autres inchangés.
#[allow(clippy::float_cmp)]
fn neon(r: f32, g: f32, b: f32, contrast: f32) -> (u8, u8, u8) {
    let max = r.max(g).max(b);
    let boost = |c: f32| {
        if c == max {
            channel(c * NEON_BOOST * contrast)
        } else {
            channel(c)
        }
    };
    (boost(r), boost(g), boost(b))
}

#[inline(always)]
fn channel(v: f32) -> u8 {
    if v.is_nan() {
        0
    } else {
        v.clamp(0.0, 255.0).round() as u8
    }
}
