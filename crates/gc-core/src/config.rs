use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use toml::Value;

use crate::charset::{CHARSET_COMPACT, CHARSET_STANDARD, GlyphRamp};
use crate::error::CoreError;

/// Borne basse de la taille de cellule (px).
pub const CELL_SIZE_MIN: u32 = 4;
/// Borne haute de la taille de cellule (px).
pub const CELL_SIZE_MAX: u32 = 20;
/// Borne basse du contraste.
pub const CONTRAST_MIN: f32 = 0.5;
/// Borne haute du contraste.
pub const CONTRAST_MAX: f32 = 2.0;
/// Pas d'un clic sur les boutons de contraste.
pub const CONTRAST_STEP: f32 = 0.1;

/// Taille de cellule par défaut.
pub const DEFAULT_CELL_SIZE: u32 = 10;
/// Contraste par défaut.
pub const DEFAULT_CONTRAST: f32 = 1.2;

/// Réglages du rendu, modifiables par l'utilisateur entre deux passes.
///
/// Le pipeline ne lit qu'un instantané immuable par tick.
/// Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use gc_core::config::{ColorMode, Settings};
/// let settings = Settings::default();
/// assert_eq!(settings.cell_size, 10);
/// assert_eq!(settings.color_mode, ColorMode::Monochrome);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    // === Grille ===
    /// Côté d'une cellule en pixels, [4, 20].
    pub cell_size: u32,
    /// Pas d'échantillonnage dans une cellule, [1, 4]. 2 = une ligne/colonne sur deux.
    pub sample_stride: u32,

    // === Couleur ===
    /// Gain de contraste [0.5, 2.0].
    pub contrast: f32,
    /// Où le contraste est appliqué.
    pub contrast_stage: ContrastStage,
    /// Schéma de couleur des glyphes.
    pub color_mode: ColorMode,

    // === Glyphes ===
    /// Rampe de glyphes active.
    pub ramp: RampChoice,

    // === Performance ===
    /// Ticks par seconde, [1, 120].
    pub target_fps: u32,

    // === Export ===
    /// Réglages de l'export d'image fixe.
    pub export: ExportSettings,
}

/// Étape où le gain de contraste est appliqué.
///
/// # Example
/// ```
/// use gc_core::config::ContrastStage;
/// assert_eq!(ContrastStage::default(), ContrastStage::Scheme);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContrastStage {
    /// Moyennes brutes, contraste appliqué par le schéma de couleur.
    #[default]
    Scheme,
    /// Contraste appliqué à chaque canal échantillonné, avant la moyenne.
    Sample,
}

impl ContrastStage {
    /// Résout une clé de configuration, sans casse. Clé inconnue → `Scheme`.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "scheme" => Self::Scheme,
            "sample" => Self::Sample,
            _ => {
                log::warn!("contrast_stage inconnu '{key}', repli sur scheme");
                Self::Scheme
            }
        }
    }
}

/// Color scheme selector. Closed set of five schemes.
///
/// # Example
/// ```
/// use gc_core::config::ColorMode;
/// assert_eq!(ColorMode::from_key("fullColor"), ColorMode::FullColor);
/// assert_eq!(ColorMode::from_key("plaid"), ColorMode::Monochrome);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Blanc fixe.
    #[default]
    Monochrome,
    /// Couleur source × contraste.
    FullColor,
    /// Matrice sépia standard.
    Sepia,
    /// Canal dominant amplifié.
    Neon,
    /// Vert pur proportionnel à la luminosité.
    Matrix,
}

impl ColorMode {
    /// Tous les schémas, dans l'ordre du sélecteur.
    pub const ALL: [Self; 5] = [
        Self::Monochrome,
        Self::FullColor,
        Self::Sepia,
        Self::Neon,
        Self::Matrix,
    ];

    /// Résout une clé de configuration. Clé inconnue → `Monochrome`.
    ///
    /// Insensible à la casse, ignore `-`, `_` et les espaces.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        let normalized: String = key
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "monochrome" | "mono" => Self::Monochrome,
            "fullcolor" | "color" | "full" => Self::FullColor,
            "sepia" => Self::Sepia,
            "neon" => Self::Neon,
            "matrix" | "green" => Self::Matrix,
            _ => {
                log::warn!("Mode couleur inconnu '{key}', repli sur monochrome");
                Self::Monochrome
            }
        }
    }

    /// Stable configuration key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Monochrome => "monochrome",
            Self::FullColor => "fullColor",
            Self::Sepia => "sepia",
            Self::Neon => "neon",
            Self::Matrix => "matrix",
        }
    }

    /// Nom lisible pour l'UI.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Monochrome => "Monochrome",
            Self::FullColor => "Full Color",
            Self::Sepia => "Sepia",
            Self::Neon => "Neon",
            Self::Matrix => "Matrix",
        }
    }

    /// Schéma suivant (cyclique).
    #[must_use]
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Schéma précédent (cyclique).
    #[must_use]
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Choix de la rampe de glyphes.
///
/// # Example
/// ```
/// use gc_core::config::RampChoice;
/// assert_eq!(RampChoice::Compact.ramp().len(), 10);
/// assert_eq!(RampChoice::from_key("standard"), RampChoice::Standard);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RampChoice {
    /// `" .:-=+*#%@"`.
    #[default]
    Compact,
    /// Rampe Paul Bourke, 70 glyphes.
    Standard,
    /// Rampe fournie par l'utilisateur, du plus sombre au plus clair.
    Custom(String),
}

impl RampChoice {
    /// Résout un nom de preset. Nom inconnu → `Compact`.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "compact" | "coarse" | "10" => Self::Compact,
            "standard" | "fine" | "70" => Self::Standard,
            _ => {
                log::warn!("Rampe inconnue '{key}', repli sur compact");
                Self::Compact
            }
        }
    }

    /// Les glyphes de ce choix, du plus sombre au plus clair.
    #[must_use]
    pub fn chars(&self) -> &str {
        match self {
            Self::Compact => CHARSET_COMPACT,
            Self::Standard => CHARSET_STANDARD,
            Self::Custom(s) => s,
        }
    }

    /// Construit la table de lookup.
    #[must_use]
    pub fn ramp(&self) -> GlyphRamp {
        GlyphRamp::new(self.chars())
    }

    /// Nom court pour l'UI.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Compact => "Compact",
            Self::Standard => "Standard",
            Self::Custom(_) => "Custom",
        }
    }

    /// Bascule entre les presets. Une rampe custom revient à `Compact`.
    #[must_use]
    pub fn next(&self) -> Self {
        match self {
            Self::Compact => Self::Standard,
            Self::Standard | Self::Custom(_) => Self::Compact,
        }
    }
}

/// Filtre de mise à l'échelle pour l'export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFilter {
    /// Plus proche voisin : couleurs des glyphes exactes.
    #[default]
    Nearest,
    /// Bilinéaire, comme un `drawImage` lissé.
    Bilinear,
}

impl ExportFilter {
    /// Résout une clé de configuration, sans casse. Clé inconnue → `Nearest`.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "nearest" => Self::Nearest,
            "bilinear" | "linear" => Self::Bilinear,
            _ => {
                log::warn!("Filtre d'export inconnu '{key}', repli sur nearest");
                Self::Nearest
            }
        }
    }
}

/// Réglages de l'export d'image fixe.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportSettings {
    /// Facteur d'échelle linéaire, [1, 4]. 2 = 4× la surface.
    pub scale: u32,
    /// Filtre de mise à l'échelle.
    pub filter: ExportFilter,
    /// Dossier de sortie des PNG.
    pub directory: PathBuf,
    /// Police monospace (TTF/OTF). `None` = recherche dans les polices système.
    pub font: Option<PathBuf>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            scale: 2,
            filter: ExportFilter::Nearest,
            directory: PathBuf::from("."),
            font: None,
        }
    }
}

impl ExportSettings {
    /// Facteur d'échelle effectif, borné à [1, 4].
    ///
    /// # Example
    /// ```
    /// use gc_core::config::ExportSettings;
    /// let s = ExportSettings { scale: 9, ..ExportSettings::default() };
    /// assert_eq!(s.export_scale(), 4);
    /// ```
    #[must_use]
    pub fn export_scale(&self) -> u32 {
        self.scale.clamp(1, 4)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            sample_stride: 2,
            contrast: DEFAULT_CONTRAST,
            contrast_stage: ContrastStage::Scheme,
            color_mode: ColorMode::Monochrome,
            ramp: RampChoice::Compact,
            target_fps: 30,
            export: ExportSettings::default(),
        }
    }
}

impl Settings {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization and after CLI overrides.
    pub fn clamp_all(&mut self) {
        self.set_cell_size(self.cell_size);
        self.set_contrast(self.contrast);
        self.sample_stride = self.sample_stride.clamp(1, 4);
        self.target_fps = self.target_fps.clamp(1, 120);
        self.export.scale = self.export.scale.clamp(1, 4);
        if matches!(&self.ramp, RampChoice::Custom(s) if s.is_empty()) {
            self.ramp = RampChoice::Compact;
        }
    }

    /// Fixe la taille de cellule, bornée à [4, 20].
    ///
    /// # Example
    /// ```
    /// use gc_core::config::Settings;
    /// let mut s = Settings::default();
    /// s.set_cell_size(25);
    /// assert_eq!(s.cell_size, 20);
    /// s.set_cell_size(1);
    /// assert_eq!(s.cell_size, 4);
    /// ```
    pub fn set_cell_size(&mut self, requested: u32) {
        let clamped = requested.clamp(CELL_SIZE_MIN, CELL_SIZE_MAX);
        if clamped != requested {
            log::debug!("cell_size {requested} hors bornes, ramené à {clamped}");
        }
        self.cell_size = clamped;
    }

    /// Fixe le contraste, borné à [0.5, 2.0]. Valeur non finie → défaut.
    ///
    /// # Example
    /// ```
    /// use gc_core::config::Settings;
    /// let mut s = Settings::default();
    /// s.set_contrast(3.0);
    /// assert!((s.contrast - 2.0).abs() < f32::EPSILON);
    /// ```
    pub fn set_contrast(&mut self, requested: f32) {
        if !requested.is_finite() {
            log::debug!("contraste non fini, retour au défaut");
            self.contrast = DEFAULT_CONTRAST;
            return;
        }
        let clamped = requested.clamp(CONTRAST_MIN, CONTRAST_MAX);
        if (clamped - requested).abs() > f32::EPSILON {
            log::debug!("contraste {requested} hors bornes, ramené à {clamped}");
        }
        self.contrast = clamped;
    }

    /// Sélectionne le schéma de couleur par clé. Clé inconnue → monochrome.
    pub fn set_color_mode_key(&mut self, key: &str) {
        self.color_mode = ColorMode::from_key(key);
    }

    /// Bouton +/- de taille de cellule.
    pub fn step_cell_size(&mut self, delta: i32) {
        let requested = self.cell_size.saturating_add_signed(delta);
        self.set_cell_size(requested);
    }

    /// Bouton +/- de contraste, arrondi au dixième.
    ///
    /// # Example
    /// ```
    /// use gc_core::config::Settings;
    /// let mut s = Settings::default();
    /// for _ in 0..3 {
    ///     s.step_contrast(1);
    /// }
    /// assert!((s.contrast - 1.5).abs() < 1e-6);
    /// ```
    pub fn step_contrast(&mut self, steps: i32) {
        let raw = self.contrast + steps as f32 * CONTRAST_STEP;
        self.set_contrast((raw * 10.0).round() / 10.0);
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    render: Option<RenderSection>,
    #[serde(default)]
    export: Option<ExportSection>,
}

/// Render section of the TOML config, all fields optional for partial override.
///
/// Les réglages sont lus comme `Value` : un type inattendu est ignoré, pas fatal.
#[derive(Deserialize)]
struct RenderSection {
    cell_size: Option<Value>,
    sample_stride: Option<Value>,
    contrast: Option<Value>,
    contrast_stage: Option<Value>,
    color_mode: Option<Value>,
    ramp: Option<Value>,
    charset: Option<Value>,
    target_fps: Option<Value>,
}

/// Export section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct ExportSection {
    scale: Option<Value>,
    filter: Option<Value>,
    directory: Option<PathBuf>,
    font: Option<PathBuf>,
}

/// Entier de config ramené dans `u32`. Négatif → 0, trop grand → `u32::MAX`,
/// le clamp de plage se fait ensuite dans `clamp_all`.
fn int_value(key: &str, value: &Value) -> Option<u32> {
    match value {
        Value::Integer(i) => u32::try_from((*i).clamp(0, i64::from(u32::MAX))).ok(),
        other => {
            log::warn!("{key} : entier attendu, trouvé {}, valeur ignorée", other.type_str());
            None
        }
    }
}

/// Nombre de config (entier ou flottant).
#[allow(clippy::cast_possible_truncation)]
fn float_value(key: &str, value: &Value) -> Option<f32> {
    match value {
        Value::Float(f) => Some(*f as f32),
        Value::Integer(i) => i32::try_from((*i).clamp(i64::from(i32::MIN), i64::from(i32::MAX)))
            .ok()
            .map(|i| f64::from(i) as f32),
        other => {
            log::warn!("{key} : nombre attendu, trouvé {}, valeur ignorée", other.type_str());
            None
        }
    }
}

fn str_value<'a>(key: &str, value: &'a Value) -> Option<&'a str> {
    if let Value::String(s) = value {
        Some(s)
    } else {
        log::warn!("{key} : chaîne attendue, trouvé {}, valeur ignorée", value.type_str());
        None
    }
}

/// Parse un document TOML et fusionne avec les valeurs par défaut.
///
/// Un réglage du mauvais type est ignoré avec un warning ; une valeur hors
/// bornes est ramenée dans sa plage.
///
/// # Errors
/// Returns an error if the document is not valid TOML, or if a section is
/// not a table.
///
/// # Example
/// ```
/// use gc_core::config::{parse_config, ColorMode};
/// let s = parse_config("[render]\ncolor_mode = \"neon\"\ncell_size = 99").unwrap();
/// assert_eq!(s.color_mode, ColorMode::Neon);
/// assert_eq!(s.cell_size, 20);
/// ```
pub fn parse_config(content: &str) -> Result<Settings> {
    let file: ConfigFile =
        toml::from_str(content).map_err(|e| CoreError::Config(e.message().to_string()))?;
    let mut settings = Settings::default();

    if let Some(r) = file.render {
        if let Some(v) = r.cell_size.as_ref().and_then(|v| int_value("cell_size", v)) {
            settings.cell_size = v;
        }
        if let Some(v) = r
            .sample_stride
            .as_ref()
            .and_then(|v| int_value("sample_stride", v))
        {
            settings.sample_stride = v;
        }
        if let Some(v) = r.contrast.as_ref().and_then(|v| float_value("contrast", v)) {
            settings.contrast = v;
        }
        if let Some(v) = r
            .contrast_stage
            .as_ref()
            .and_then(|v| str_value("contrast_stage", v))
        {
            settings.contrast_stage = ContrastStage::from_key(v);
        }
        if let Some(v) = r.color_mode.as_ref().and_then(|v| str_value("color_mode", v)) {
            settings.color_mode = ColorMode::from_key(v);
        }
        if let Some(v) = r.ramp.as_ref().and_then(|v| str_value("ramp", v)) {
            settings.ramp = RampChoice::from_key(v);
        }
        // Un charset explicite l'emporte sur le preset.
        if let Some(v) = r.charset.as_ref().and_then(|v| str_value("charset", v)) {
            settings.ramp = RampChoice::Custom(v.to_string());
        }
        if let Some(v) = r.target_fps.as_ref().and_then(|v| int_value("target_fps", v)) {
            settings.target_fps = v;
        }
    }

    if let Some(e) = file.export {
        if let Some(v) = e.scale.as_ref().and_then(|v| int_value("scale", v)) {
            settings.export.scale = v;
        }
        if let Some(v) = e.filter.as_ref().and_then(|v| str_value("filter", v)) {
            settings.export.filter = ExportFilter::from_key(v);
        }
        if let Some(v) = e.directory {
            settings.export.directory = v;
        }
        if e.font.is_some() {
            settings.export.font = e.font;
        }
    }

    settings.clamp_all();
    Ok(settings)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use gc_core::config::load_config;
/// use std::path::Path;
/// let settings = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))
}
