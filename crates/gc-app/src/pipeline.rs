use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use gc_ascii::FrameRenderer;
use gc_core::config::{ExportSettings, Settings};
use gc_core::frame::{FrameBuffer, GlyphGrid};
use gc_core::traits::Source;
use gc_export::Rasterizer;
use gc_export::font::load_font;
use gc_export::snapshot::export_png;
use gc_source::image::ImageSource;
use gc_source::pattern::PatternSource;

use crate::cli::Cli;

/// Largeur max d'une image fixe avant réduction.
const IMAGE_MAX_WIDTH: u32 = 1280;
/// Taille du motif de test.
const PATTERN_SIZE: (u32, u32) = (640, 480);

/// Idle tant qu'aucune frame n'a été rendue, Streaming ensuite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Aucune frame valide reçue.
    Idle,
    /// Au moins une passe complète a eu lieu.
    Streaming,
}

/// Résultat d'un tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Source pas prête : rien n'a été dessiné.
    Skipped,
    /// Passe complète : grille (et surface) à jour.
    Rendered,
}

/// Une passe de conversion par tick : source → grille → surface pixel.
///
/// Grille et surface sont pré-allouées et réutilisées d'un tick à l'autre.
/// La surface n'existe que si une police a pu être chargée.
pub struct Pipeline {
    state: PipelineState,
    renderer: FrameRenderer,
    grid: GlyphGrid,
    rasterizer: Option<Rasterizer>,
    surface: FrameBuffer,
}

impl Pipeline {
    /// Pipeline au repos. `rasterizer = None` désactive surface et export.
    #[must_use]
    pub fn new(settings: &Settings, rasterizer: Option<Rasterizer>) -> Self {
        Self {
            state: PipelineState::Idle,
            renderer: FrameRenderer::new(&settings.ramp),
            grid: GlyphGrid::new(0, 0, settings.cell_size),
            rasterizer,
            surface: FrameBuffer::new(0, 0),
        }
    }

    /// État courant.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Dernière grille rendue.
    #[must_use]
    pub fn grid(&self) -> &GlyphGrid {
        &self.grid
    }

    /// `true` si une police est chargée (surface + export disponibles).
    #[must_use]
    pub fn surface_enabled(&self) -> bool {
        self.rasterizer.is_some()
    }

    /// Surface pixel de la dernière passe, si disponible.
    #[must_use]
    pub fn surface(&self) -> Option<&FrameBuffer> {
        match (self.state, &self.rasterizer) {
            (PipelineState::Streaming, Some(_)) => Some(&self.surface),
            _ => None,
        }
    }

    /// Un tick : tire une frame, la convertit et repeint la surface.
    ///
    /// Source pas prête → [`TickOutcome::Skipped`], la sortie précédente
    /// reste intacte.
    pub fn tick(&mut self, source: &mut dyn Source, settings: &Settings) -> TickOutcome {
        let Some(frame) = source.next_frame() else {
            return TickOutcome::Skipped;
        };

        self.renderer.render(&frame, settings, &mut self.grid);
        if let Some(rasterizer) = self.rasterizer.as_mut() {
            rasterizer.paint(&self.grid, &mut self.surface);
        }

        if self.state == PipelineState::Idle {
            log::info!(
                "Première frame : {}x{} → grille {}x{}",
                frame.width,
                frame.height,
                self.grid.cols,
                self.grid.rows
            );
            self.state = PipelineState::Streaming;
        }
        TickOutcome::Rendered
    }

    /// Exporte la surface courante en PNG.
    ///
    /// Retourne `Ok(None)` sans rien écrire si aucune passe n'a encore eu
    /// lieu ou si la surface est désactivée.
    ///
    /// # Errors
    /// Returns an error if the PNG cannot be written.
    pub fn export(&self, settings: &ExportSettings, now: DateTime<Utc>) -> Result<Option<PathBuf>> {
        let Some(surface) = self.surface() else {
            log::debug!("Export ignoré : rien à exporter");
            return Ok(None);
        };
        let path = export_png(surface, settings, now)?;
        if let Some(ref p) = path {
            log::info!("Export : {}", p.display());
        }
        Ok(path)
    }
}

/// Charge la police et construit le rasterizer.
///
/// Police introuvable ou invalide → `None` avec un warning : l'affichage
/// terminal continue, seuls surface et export sont désactivés.
#[must_use]
pub fn init_rasterizer(settings: &Settings) -> Option<Rasterizer> {
    match load_font(settings.export.font.as_deref()) {
        Ok(font) => Some(Rasterizer::new(font, settings.cell_size)),
        Err(e) => {
            log::warn!("Police indisponible ({e:#}) : surface et export désactivés");
            None
        }
    }
}

/// Start the visual source selected on the command line.
///
/// # Errors
/// Returns an error if the image cannot be loaded, if ffmpeg cannot be
/// started, or if the source needs the `stream` feature.
pub fn start_source(cli: &Cli, settings: &Settings) -> Result<Box<dyn Source>> {
    if let Some(ref path) = cli.image {
        return Ok(Box::new(ImageSource::new(path, Some(IMAGE_MAX_WIDTH))?));
    }
    if cli.pattern {
        return Ok(Box::new(PatternSource::new(PATTERN_SIZE.0, PATTERN_SIZE.1)));
    }
    start_stream(cli, settings)
}

#[cfg(feature = "stream")]
fn start_stream(cli: &Cli, settings: &Settings) -> Result<Box<dyn Source>> {
    use gc_source::stream::{StreamInput, StreamSource};

    let input = if let Some(ref device) = cli.camera {
        StreamInput::camera(device.as_deref())
    } else if let Some(ref path) = cli.video {
        StreamInput::File(path.clone())
    } else {
        anyhow::bail!("Aucune source spécifiée");
    };
    Ok(Box::new(StreamSource::open(input, settings.target_fps)?))
}

#[cfg(not(feature = "stream"))]
fn start_stream(_cli: &Cli, _settings: &Settings) -> Result<Box<dyn Source>> {
    anyhow::bail!("--camera et --video requièrent la feature `stream`")
}
