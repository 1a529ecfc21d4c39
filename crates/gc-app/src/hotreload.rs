use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use gc_core::config::{Settings, load_config};
use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::cli::Cli;

/// Lance un watcher qui recharge le fichier config et met à jour l'ArcSwap.
///
/// Les overrides CLI sont réappliqués après chaque rechargement, pour que
/// les flags gardent la priorité. Un fichier invalide est ignoré : les
/// réglages courants restent en place.
///
/// Retourne le Watcher (doit rester vivant tant que l'app tourne).
///
/// # Errors
/// Returns an error if the watcher cannot be created or the path cannot be watched.
pub fn spawn_config_watcher(
    config_path: &Path,
    settings: &Arc<ArcSwap<Settings>>,
    cli: &Cli,
) -> Result<impl Watcher + use<>> {
    let settings = Arc::clone(settings);
    let path = config_path.to_path_buf();
    let overrides = cli.clone();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res
            && matches!(event.kind, EventKind::Modify(_))
        {
            reload(&path, &settings, &overrides);
        }
    })?;

    watcher.watch(config_path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Recharge `path` dans `settings`. Retourne `true` si la config a été remplacée.
fn reload(path: &Path, settings: &ArcSwap<Settings>, overrides: &Cli) -> bool {
    match load_config(path) {
        Ok(mut new_settings) => {
            overrides.apply_overrides(&mut new_settings);
            settings.store(Arc::new(new_settings));
            log::info!("Config rechargée depuis {}", path.display());
            true
        }
        Err(e) => {
            log::warn!("Erreur de rechargement config : {e:#}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use gc_core::config::ColorMode;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("glyphcam").chain(args.iter().copied())).unwrap()
    }

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reload_swaps_in_new_settings() {
        let file = write_config("[render]\ncolor_mode = \"sepia\"\ncell_size = 8\n");
        let settings = ArcSwap::from_pointee(Settings::default());
        let overrides = cli(&["--pattern"]);

        assert!(reload(file.path(), &settings, &overrides));
        let current = settings.load();
        assert_eq!(current.color_mode, ColorMode::Sepia);
        assert_eq!(current.cell_size, 8);
    }

    #[test]
    fn cli_flags_survive_reload() {
        let file = write_config("[render]\ncell_size = 8\ncolor_mode = \"sepia\"\n");
        let settings = ArcSwap::from_pointee(Settings::default());
        let overrides = cli(&["--pattern", "--cell-size", "14"]);

        assert!(reload(file.path(), &settings, &overrides));
        let current = settings.load();
        assert_eq!(current.cell_size, 14);
        assert_eq!(current.color_mode, ColorMode::Sepia);
    }

    #[test]
    fn invalid_file_keeps_previous_settings() {
        let file = write_config("[render\ncell_size = ");
        let previous = Settings {
            cell_size: 6,
            ..Settings::default()
        };
        let settings = ArcSwap::from_pointee(previous.clone());
        let overrides = cli(&["--pattern"]);

        assert!(!reload(file.path(), &settings, &overrides));
        assert_eq!(**settings.load(), previous);
    }

    #[test]
    fn watcher_starts_on_existing_file() {
        let file = write_config("[render]\n");
        let settings = Arc::new(ArcSwap::from_pointee(Settings::default()));
        let watcher = spawn_config_watcher(file.path(), &settings, &cli(&["--pattern"]));
        assert!(watcher.is_ok());
    }
}
