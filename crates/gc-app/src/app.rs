use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use arc_swap::ArcSwap;
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use gc_core::config::Settings;
use gc_core::schedule::{CancelToken, TickSchedule};
use gc_core::traits::Source;
use gc_render::fps::FpsCounter;
use gc_render::ui::{self, StatusView};
use ratatui::DefaultTerminal;

use crate::pipeline::{Pipeline, PipelineState, TickOutcome};

/// Main application struct holding all state.
pub struct App {
    /// Réglages courants (arc-swap, partagés avec le watcher de config).
    pub settings: Arc<ArcSwap<Settings>>,
    /// Source → grille → surface.
    pipeline: Pipeline,
    /// Source vidéo active.
    source: Box<dyn Source>,
    /// Nom court de la source pour la sidebar.
    source_label: String,
    /// Compteur FPS (passes rendues uniquement).
    fps_counter: FpsCounter,
    /// Arrêt de la boucle (touches q/Esc, Ctrl-C).
    token: CancelToken,
    /// Overlay d'aide visible.
    show_help: bool,
    /// Dernier PNG écrit.
    last_export: Option<PathBuf>,
    /// Message affiché dans la sidebar.
    message: Option<String>,
}

impl App {
    /// Create a new App instance.
    #[must_use]
    pub fn new(
        settings: Arc<ArcSwap<Settings>>,
        pipeline: Pipeline,
        source: Box<dyn Source>,
        source_label: String,
        token: CancelToken,
    ) -> Self {
        Self {
            settings,
            pipeline,
            source,
            source_label,
            fps_counter: FpsCounter::new(60),
            token,
            show_help: false,
            last_export: None,
            message: None,
        }
    }

    /// Boucle principale : une passe par tick, événements entre les ticks.
    ///
    /// # Errors
    /// Returns an error if terminal operations fail.
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        let mut schedule = TickSchedule::new(self.settings.load().target_fps);

        while !self.token.is_cancelled() {
            // === Frame timing (suit le hot-reload de target_fps) ===
            schedule.set_fps(self.settings.load().target_fps);
            let remaining = schedule.remaining(Instant::now());
            if !remaining.is_zero() {
                // Dormir le temps restant, mais rester réactif aux événements
                if event::poll(remaining)? {
                    self.handle_event(&event::read()?);
                }
                continue;
            }
            schedule.mark(Instant::now());

            // === Polling événements non-bloquant ===
            while event::poll(Duration::ZERO)? {
                self.handle_event(&event::read()?);
            }
            if self.token.is_cancelled() {
                break;
            }

            // === Une passe, sur un instantané des réglages ===
            let settings = self.settings.load_full();
            if self.pipeline.tick(self.source.as_mut(), &settings) == TickOutcome::Rendered {
                self.fps_counter.tick();
            }

            // === Affichage ===
            let status = self.status_view();
            let grid = self.pipeline.grid();
            let fps_counter = &self.fps_counter;
            terminal.draw(|frame| ui::draw(frame, grid, &settings, fps_counter, &status))?;
        }

        log::info!("Boucle terminée");
        Ok(())
    }

    fn status_view(&self) -> StatusView<'_> {
        StatusView {
            streaming: self.pipeline.state() == PipelineState::Streaming,
            source_label: &self.source_label,
            last_export: self.last_export.as_deref(),
            surface_enabled: self.pipeline.surface_enabled(),
            message: self.message.as_deref(),
            show_help: self.show_help,
        }
    }

    /// Handle a terminal event.
    fn handle_event(&mut self, event: &Event) {
        if let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = *event
        {
            // Raw mode : Ctrl-C arrive comme une touche, pas comme un signal.
            if modifiers.contains(KeyModifiers::CONTROL) {
                if code == KeyCode::Char('c') {
                    self.token.cancel();
                }
                return;
            }
            self.handle_key(code);
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc if self.show_help => self.show_help = false,
            KeyCode::Char('q') | KeyCode::Esc => self.token.cancel(),
            KeyCode::Char('?') => self.show_help = !self.show_help,
            KeyCode::Char('+' | '=') => self.toggle_config(|s| s.step_cell_size(1)),
            KeyCode::Char('-' | '_') => self.toggle_config(|s| s.step_cell_size(-1)),
            KeyCode::Char(']') => self.toggle_config(|s| s.step_contrast(1)),
            KeyCode::Char('[') => self.toggle_config(|s| s.step_contrast(-1)),
            KeyCode::Char('m') => self.toggle_config(|s| s.color_mode = s.color_mode.next()),
            KeyCode::Char('M') => self.toggle_config(|s| s.color_mode = s.color_mode.prev()),
            KeyCode::Char('r') => self.toggle_config(|s| s.ramp = s.ramp.next()),
            KeyCode::Char('s' | 'p') => self.export_current_frame(),
            _ => {}
        }
    }

    /// Helper to atomically update settings.
    fn toggle_config(&mut self, mutate: impl FnOnce(&mut Settings)) {
        let settings = self.settings.load();
        let mut new = (**settings).clone();
        mutate(&mut new);
        self.settings.store(Arc::new(new));
    }

    /// Exporte la dernière surface rendue. Jamais fatal.
    fn export_current_frame(&mut self) {
        if !self.pipeline.surface_enabled() {
            self.message = Some("Export désactivé : pas de police".to_string());
            return;
        }
        let settings = self.settings.load();
        match self.pipeline.export(&settings.export, Utc::now()) {
            Ok(Some(path)) => {
                self.message = Some("Image exportée".to_string());
                self.last_export = Some(path);
            }
            Ok(None) => {
                self.message = Some("Rien à exporter".to_string());
            }
            Err(e) => {
                log::warn!("Export échoué : {e:#}");
                self.message = Some(format!("Export échoué : {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc_core::config::{CELL_SIZE_MIN, CONTRAST_MAX, ColorMode, RampChoice};
    use gc_source::pattern::PatternSource;

    fn test_app() -> App {
        let settings = Settings::default();
        let pipeline = Pipeline::new(&settings, None);
        App::new(
            Arc::new(ArcSwap::from_pointee(settings)),
            pipeline,
            Box::new(PatternSource::new(32, 32)),
            "pattern".to_string(),
            CancelToken::new(),
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_event(&Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    #[test]
    fn cell_size_keys_step_and_clamp() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('+'));
        assert_eq!(app.settings.load().cell_size, 11);
        for _ in 0..20 {
            press(&mut app, KeyCode::Char('-'));
        }
        assert_eq!(app.settings.load().cell_size, CELL_SIZE_MIN);
    }

    #[test]
    fn contrast_keys_step_and_clamp() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char(']'));
        assert!((app.settings.load().contrast - 1.3).abs() < 1e-6);
        for _ in 0..20 {
            press(&mut app, KeyCode::Char(']'));
        }
        assert!((app.settings.load().contrast - CONTRAST_MAX).abs() < 1e-6);
    }

    #[test]
    fn mode_keys_cycle_both_ways() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.settings.load().color_mode, ColorMode::FullColor);
        press(&mut app, KeyCode::Char('M'));
        press(&mut app, KeyCode::Char('M'));
        assert_eq!(app.settings.load().color_mode, ColorMode::Matrix);
    }

    #[test]
    fn ramp_key_toggles() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.settings.load().ramp, RampChoice::Standard);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.settings.load().ramp, RampChoice::Compact);
    }

    #[test]
    fn esc_closes_help_before_quitting() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Esc);
        assert!(!app.show_help);
        assert!(!app.token.is_cancelled());
        press(&mut app, KeyCode::Esc);
        assert!(app.token.is_cancelled());
    }

    #[test]
    fn quit_keys_cancel_the_loop() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.token.is_cancelled());

        let mut app = test_app();
        app.handle_event(&Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.token.is_cancelled());
    }

    #[test]
    fn export_without_font_reports_message() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('s'));
        assert!(app.last_export.is_none());
        assert_eq!(app.message.as_deref(), Some("Export désactivé : pas de police"));
    }

    #[test]
    fn key_changes_do_not_touch_previous_snapshot() {
        let mut app = test_app();
        let before = app.settings.load_full();
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(before.color_mode, ColorMode::Monochrome);
        assert_eq!(app.settings.load().color_mode, ColorMode::FullColor);
    }
}
