use std::path::Path;

use gc_core::config::{ContrastStage, Settings};
use gc_core::frame::GlyphGrid;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::canvas;
use crate::fps::FpsCounter;

/// Largeur du panneau latéral, en colonnes.
const SIDEBAR_WIDTH: u16 = 26;

/// Ce que la boucle sait de l'état du pipeline, pour l'affichage.
#[derive(Clone, Copy, Debug)]
pub struct StatusView<'a> {
    /// `true` dès qu'une frame valide a été rendue (Streaming).
    pub streaming: bool,
    /// Nom court de la source (`camera /dev/video0`, `image foo.png`…).
    pub source_label: &'a str,
    /// Dernier PNG exporté.
    pub last_export: Option<&'a Path>,
    /// Surface pixel disponible (police chargée).
    pub surface_enabled: bool,
    /// Message transitoire (erreur d'export, rechargement config…).
    pub message: Option<&'a str>,
    /// Overlay d'aide visible.
    pub show_help: bool,
}

/// Draw the full UI: canvas + sidebar (+ help overlay).
pub fn draw(
    frame: &mut Frame,
    grid: &GlyphGrid,
    settings: &Settings,
    fps_counter: &FpsCounter,
    status: &StatusView<'_>,
) {
    let area = frame.area();
    let [canvas_area, sidebar_area] =
        Layout::horizontal([Constraint::Min(10), Constraint::Length(SIDEBAR_WIDTH)]).areas(area);

    // === Canvas ===
    if status.streaming {
        canvas::render_grid(frame.buffer_mut(), canvas_area, grid);
    } else {
        draw_idle(frame, canvas_area, status.source_label);
    }

    // === Sidebar ===
    draw_sidebar(frame, sidebar_area, grid, settings, fps_counter, status);

    // === Help overlay ===
    if status.show_help {
        draw_help_overlay(frame, area);
    }
}

/// Écran d'attente tant que la source n'a rien produit.
fn draw_idle(frame: &mut Frame, area: Rect, source_label: &str) {
    let y = area.y + area.height / 2;
    let line_area = Rect::new(area.x, y, area.width, 1.min(area.height));
    let text = Paragraph::new(Line::from(Span::styled(
        format!("En attente de {source_label}…"),
        Style::default().fg(Color::DarkGray),
    )))
    .centered();
    frame.render_widget(text, line_area);
}

/// Draw the parameter sidebar with all live values.
fn draw_sidebar(
    frame: &mut Frame,
    area: Rect,
    grid: &GlyphGrid,
    settings: &Settings,
    fps_counter: &FpsCounter,
    status: &StatusView<'_>,
) {
    let header = Style::default().fg(Color::Yellow);
    let (state_str, state_color) = if status.streaming {
        ("▶ STREAMING", Color::Green)
    } else {
        ("… IDLE", Color::DarkGray)
    };
    let stage_str = match settings.contrast_stage {
        ContrastStage::Scheme => "scheme",
        ContrastStage::Sample => "sample",
    };

    let mut lines = vec![
        Line::from(Span::styled(state_str, Style::default().fg(state_color))),
        Line::from(format!(" {}", status.source_label)),
        Line::from(""),
        Line::from(Span::styled("─ Render ──", header)),
        Line::from(format!(" Cell: {}px", settings.cell_size)),
        Line::from(format!(" Contr: {:.1} ({stage_str})", settings.contrast)),
        Line::from(format!(" Color: {}", settings.color_mode.display_name())),
        Line::from(format!(" Ramp: {}", settings.ramp.label())),
        Line::from(format!(" Stride: {}", settings.sample_stride)),
        Line::from(""),
        Line::from(Span::styled("─ Info ────", header)),
        Line::from(format!(" {:.0} FPS", fps_counter.fps())),
        Line::from(format!(" {:.1}ms", fps_counter.frame_time_ms())),
        Line::from(format!(" Grid: {}x{}", grid.cols, grid.rows)),
        Line::from(format!(" Glyphs: {}", grid.glyph_count())),
        Line::from(""),
        Line::from(Span::styled("─ Export ──", header)),
    ];

    if status.surface_enabled {
        let last = status
            .last_export
            .and_then(Path::file_name)
            .map_or_else(|| "—".to_string(), |n| n.to_string_lossy().into_owned());
        lines.push(Line::from(format!(" PNG x{}", settings.export.export_scale())));
        lines.push(Line::from(format!(" {last}")));
    } else {
        lines.push(Line::from(Span::styled(
            " off (no font)",
            Style::default().fg(Color::Red),
        )));
    }

    if let Some(msg) = status.message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {msg}"),
            Style::default().fg(Color::Cyan),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " ? = help",
        Style::default().fg(Color::DarkGray),
    )));

    let sidebar = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::LEFT)
            .title(" glyphcam "),
    );

    frame.render_widget(sidebar, area);
}

/// Draw the help overlay with all keybindings.
fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(Span::styled(
            " glyphcam — Controls ",
            Style::default().fg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(" q/Esc    Quit"),
        Line::from(" +/-      Cell size ±1"),
        Line::from(" ]/[      Contrast ±0.1"),
        Line::from(" m/M      Color mode next/prev"),
        Line::from(" r        Compact/standard ramp"),
        Line::from(" s/p      Export PNG"),
        Line::from(" ?        Toggle help"),
        Line::from(""),
        Line::from(Span::styled(
            " Press ? or Esc to close ",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help_width = 36u16.min(area.width);
    let help_height = (help_text.len() as u16 + 2).min(area.height);
    let x = area.x + area.width.saturating_sub(help_width) / 2;
    let y = area.y + area.height.saturating_sub(help_height) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    let help = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .style(Style::default().bg(Color::Black).fg(Color::White)),
    );

    frame.render_widget(Clear, help_area);
    frame.render_widget(help, help_area);
}
