use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use arc_swap::ArcSwap;
use clap::Parser;
use gc_core::config::{Settings, load_config};
use gc_core::schedule::CancelToken;

pub mod app;
pub mod cli;
pub mod headless;
pub mod hotreload;
pub mod pipeline;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la source
    cli.validate_source()?;

    // 4. Charger la config, puis les overrides CLI
    let mut settings = resolve_config(&cli)?;
    cli.apply_overrides(&mut settings);
    let settings = Arc::new(ArcSwap::from_pointee(settings));

    // 5. Hot-reload config (thread interne notify)
    let _watcher = if cli.config.exists() {
        match hotreload::spawn_config_watcher(&cli.config, &settings, &cli) {
            Ok(w) => Some(w),
            Err(e) => {
                log::warn!("Hot-reload indisponible : {e}");
                None
            }
        }
    } else {
        None
    };

    // 6. Annulation : Ctrl-C hors raw mode (headless, ou avant l'init du terminal)
    let token = CancelToken::new();
    {
        let token = token.clone();
        if let Err(e) = ctrlc::set_handler(move || token.cancel()) {
            log::warn!("Handler Ctrl-C non installé : {e}");
        }
    }

    // 7. Pipeline (police optionnelle) et source
    let initial = settings.load_full();
    let rasterizer = pipeline::init_rasterizer(&initial);
    let mut frame_pipeline = pipeline::Pipeline::new(&initial, rasterizer);
    let mut source = pipeline::start_source(&cli, &initial)?;
    log::info!("Source : {}", cli.source_label());

    // 8. Mode headless
    if cli.snapshot {
        let path = headless::run_snapshot(
            &mut frame_pipeline,
            source.as_mut(),
            &settings,
            &token,
            Duration::from_secs(cli.timeout_secs),
        )?;
        println!("{}", path.display());
        return Ok(());
    }

    // 9. Initialiser le terminal ratatui
    let terminal = ratatui::init();

    // 10. Boucle principale
    let mut app_instance = app::App::new(
        settings,
        frame_pipeline,
        source,
        cli.source_label(),
        token,
    );
    let result = app_instance.run(terminal);

    // 11. Restaurer le terminal (TOUJOURS, même en cas d'erreur)
    ratatui::restore();

    result
}

/// Config absente → défauts. Config présente mais invalide → erreur.
fn resolve_config(cli: &cli::Cli) -> Result<Settings> {
    if cli.config.exists() {
        load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(Settings::default())
    }
}
