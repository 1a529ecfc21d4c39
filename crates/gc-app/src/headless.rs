use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use chrono::Utc;
use gc_core::config::Settings;
use gc_core::schedule::{CancelToken, TickSchedule, run_ticks};
use gc_core::traits::Source;

use crate::pipeline::{Pipeline, TickOutcome};

/// Mode `--snapshot` : attend la première frame, fait une passe, exporte.
///
/// Les ticks suivent `target_fps` tant que la source n'est pas prête.
///
/// # Errors
/// Returns an error if the export is disabled (no font), if no frame
/// arrives before `timeout`, if the loop is cancelled, or if the PNG
/// cannot be written.
pub fn run_snapshot(
    pipeline: &mut Pipeline,
    source: &mut dyn Source,
    settings: &ArcSwap<Settings>,
    token: &CancelToken,
    timeout: Duration,
) -> Result<PathBuf> {
    if !pipeline.surface_enabled() {
        anyhow::bail!("Export impossible : aucune police chargée (voir --font)");
    }

    let deadline = Instant::now() + timeout;
    let mut schedule = TickSchedule::new(settings.load().target_fps);
    let mut rendered = false;

    let ticks = run_ticks(&mut schedule, token, |_| {
        let snapshot = settings.load();
        if pipeline.tick(&mut *source, &snapshot) == TickOutcome::Rendered {
            rendered = true;
            return ControlFlow::Break(());
        }
        if Instant::now() >= deadline {
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    log::debug!("Snapshot : {ticks} ticks");

    if !rendered {
        if token.is_cancelled() {
            anyhow::bail!("Snapshot interrompu");
        }
        anyhow::bail!("Aucune frame reçue en {}s", timeout.as_secs());
    }

    let settings = settings.load();
    pipeline
        .export(&settings.export, Utc::now())?
        .context("Surface vide : rien à exporter")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc_core::frame::FrameBuffer;
    use gc_export::font::find_system_font;
    use gc_source::image::ImageSource;
    use std::sync::Arc;

    struct NeverReady;

    impl Source for NeverReady {
        fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> {
            None
        }
        fn native_size(&self) -> (u32, u32) {
            (0, 0)
        }
        fn is_live(&self) -> bool {
            true
        }
    }

    fn settings_in(dir: &std::path::Path) -> Settings {
        let mut settings = Settings {
            target_fps: 120,
            ..Settings::default()
        };
        settings.export.directory = dir.to_path_buf();
        settings.export.font = find_system_font();
        settings
    }

    fn font_pipeline(settings: &Settings) -> Option<Pipeline> {
        settings.export.font.as_ref()?;
        let rasterizer = crate::pipeline::init_rasterizer(settings)?;
        Some(Pipeline::new(settings, Some(rasterizer)))
    }

    #[test]
    fn without_font_fails_fast() {
        let settings = Settings::default();
        let mut pipeline = Pipeline::new(&settings, None);
        let result = run_snapshot(
            &mut pipeline,
            &mut NeverReady,
            &ArcSwap::from_pointee(settings),
            &CancelToken::new(),
            Duration::from_secs(5),
        );
        assert!(result.is_err());
    }

    #[test]
    fn times_out_when_source_never_ready() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let Some(mut pipeline) = font_pipeline(&settings) else {
            return;
        };
        let result = run_snapshot(
            &mut pipeline,
            &mut NeverReady,
            &ArcSwap::from_pointee(settings),
            &CancelToken::new(),
            Duration::from_millis(30),
        );
        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn cancelled_token_runs_no_pass() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let Some(mut pipeline) = font_pipeline(&settings) else {
            return;
        };
        let token = CancelToken::new();
        token.cancel();
        let mut source = ImageSource::from_frame(FrameBuffer::new(8, 8));
        let result = run_snapshot(
            &mut pipeline,
            &mut source,
            &ArcSwap::from_pointee(settings),
            &token,
            Duration::from_secs(5),
        );
        assert!(result.is_err());
        assert_eq!(pipeline.state(), crate::pipeline::PipelineState::Idle);
    }

    #[test]
    fn exports_first_frame() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let Some(mut pipeline) = font_pipeline(&settings) else {
            return;
        };
        let mut fb = FrameBuffer::new(40, 20);
        fb.fill((255, 255, 255));
        let mut source = ImageSource::from_frame(fb);
        let path = run_snapshot(
            &mut pipeline,
            &mut source,
            &ArcSwap::from_pointee(settings),
            &CancelToken::new(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(path.starts_with(dir.path()));
        let name = path.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(!name.contains(':'));
        let written = image::open(&path).unwrap();
        assert_eq!((written.width(), written.height()), (80, 40));
    }
}
