use std::path::PathBuf;

use clap::Parser;
use gc_core::config::{RampChoice, Settings};

/// glyphcam : webcam → ASCII art en temps réel, avec export PNG.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source : image fixe (PNG, JPEG, BMP, GIF).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Source : webcam via ffmpeg. Périphérique optionnel (défaut selon l'OS).
    #[arg(long, num_args = 0..=1, value_name = "DEVICE")]
    pub camera: Option<Option<String>>,

    /// Source : fichier vidéo décodé par ffmpeg.
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Source : motif de test synthétique (dégradé animé).
    #[arg(long, default_value_t = false)]
    pub pattern: bool,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Taille de cellule en pixels source (4–20).
    #[arg(long)]
    pub cell_size: Option<u32>,

    /// Gain de contraste (0.5–2.0).
    #[arg(long)]
    pub contrast: Option<f32>,

    /// Schéma de couleur : mono, color, sepia, neon, matrix.
    #[arg(long)]
    pub color_mode: Option<String>,

    /// Rampe de glyphes : compact, standard.
    #[arg(long)]
    pub ramp: Option<String>,

    /// FPS cible.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Police monospace (TTF/OTF) pour la surface et l'export.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Dossier de sortie des exports PNG.
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Mode headless : attend la première frame, exporte un PNG et quitte.
    #[arg(long, default_value_t = false)]
    pub snapshot: bool,

    /// Délai max d'attente de la première frame en mode --snapshot.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Validate that exactly one visual source is provided.
    ///
    /// # Errors
    /// Returns an error if zero or more than one source is specified.
    pub fn validate_source(&self) -> anyhow::Result<()> {
        let count = usize::from(self.image.is_some())
            + usize::from(self.camera.is_some())
            + usize::from(self.video.is_some())
            + usize::from(self.pattern);

        if count == 0 {
            anyhow::bail!(
                "Aucune source spécifiée. Utilisez --image, --camera, --video, ou --pattern."
            );
        }
        if count > 1 {
            anyhow::bail!(
                "Une seule source à la fois. Spécifiez --image, --camera, --video, OU --pattern."
            );
        }
        Ok(())
    }

    /// Applique les flags CLI par-dessus la config chargée.
    ///
    /// Les valeurs hors bornes sont ramenées dans leurs plages.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(size) = self.cell_size {
            settings.set_cell_size(size);
        }
        if let Some(contrast) = self.contrast {
            settings.set_contrast(contrast);
        }
        if let Some(ref key) = self.color_mode {
            settings.set_color_mode_key(key);
        }
        if let Some(ref key) = self.ramp {
            settings.ramp = RampChoice::from_key(key);
        }
        if let Some(fps) = self.fps {
            settings.target_fps = fps;
        }
        if let Some(ref font) = self.font {
            settings.export.font = Some(font.clone());
        }
        if let Some(ref dir) = self.export_dir {
            settings.export.directory.clone_from(dir);
        }
        settings.clamp_all();
    }

    /// Nom court de la source, pour la sidebar et les logs.
    #[must_use]
    pub fn source_label(&self) -> String {
        if let Some(ref path) = self.image {
            format!("image {}", file_name(path))
        } else if let Some(ref device) = self.camera {
            match device {
                Some(d) => format!("camera {d}"),
                None => "camera".to_string(),
            }
        } else if let Some(ref path) = self.video {
            format!("video {}", file_name(path))
        } else {
            "pattern".to_string()
        }
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or_else(|| path.display().to_string(), String::from)
}
