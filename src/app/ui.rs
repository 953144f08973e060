use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use super::{App, Mode, Palette, SUGGESTIONS};
use crate::input_cursor_position;

const PANEL_PADDING_X: u16 = 1;
const PANEL_HORIZONTAL_INSET: u16 = 2 + PANEL_PADDING_X * 2;

// Breathing dot intensity (8 frames, ~1s period at the spinner tick).
const BREATH_SCALE_PCT: [u16; 8] = [58, 70, 82, 94, 108, 94, 82, 70];

pub(super) fn draw(f: &mut Frame, app: &App) {
    let frame_area = f.area();
    let palette = app.palette;
    let prompt_prefix = "> ";
    let prompt_width = UnicodeWidthStr::width(prompt_prefix) as u16;

    let typing_h: u16 = if app.running { 1 } else { 0 };
    let suggestions_h: u16 = if app.suggestions_visible() { 1 } else { 0 };
    let composer_h = app.composer_height();

    let mut constraints = vec![Constraint::Min(1)];
    if typing_h > 0 {
        constraints.push(Constraint::Length(typing_h));
    }
    if suggestions_h > 0 {
        constraints.push(Constraint::Length(suggestions_h));
    }
    constraints.push(Constraint::Length(composer_h));
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame_area);

    let mut section_idx = 0usize;
    let thread_chunk = chunks[section_idx];
    section_idx += 1;
    let typing_chunk = if typing_h > 0 {
        let c = chunks[section_idx];
        section_idx += 1;
        Some(c)
    } else {
        None
    };
    let suggestion_chunk = if suggestions_h > 0 {
        let c = chunks[section_idx];
        section_idx += 1;
        Some(c)
    } else {
        None
    };
    let composer_chunk = chunks[section_idx];
    section_idx += 1;
    let status_chunk = chunks[section_idx];

    // Thread view: pre-wrapped lines, scrolled to the app's offset.
    let thread = Paragraph::new(Text::from(app.cached_log_lines().to_vec()))
        .scroll((app.scroll, 0));
    f.render_widget(thread, thread_chunk);

    if let Some(area) = typing_chunk {
        f.render_widget(build_typing_line(app, palette), area);
    }

    if let Some(area) = suggestion_chunk {
        f.render_widget(
            Paragraph::new(Text::from(vec![build_suggestion_line(app, palette)])),
            area,
        );
    }

    let input = Paragraph::new(Text::from(build_input_lines(
        app,
        prompt_prefix,
        palette,
    )))
    .style(palette.input_surface_style())
    .block(panel_block(palette, "message"))
    .wrap(Wrap { trim: false });
    f.render_widget(input, composer_chunk);

    if matches!(app.mode, Mode::Normal) {
        let content_width = composer_chunk
            .width
            .saturating_sub(PANEL_HORIZONTAL_INSET)
            .max(1);
        let content_height = composer_chunk.height.saturating_sub(2).max(1);
        let (cx, cy) = input_cursor_position(&app.input, app.cursor, content_width, prompt_width);
        let cursor_x =
            composer_chunk.x + 1 + PANEL_PADDING_X + cx.min(content_width.saturating_sub(1));
        let cursor_y = composer_chunk.y + 1 + cy.min(content_height.saturating_sub(1));
        f.set_cursor_position((cursor_x, cursor_y));
    }

    let status = Paragraph::new(format!(
        " {} | Enter send | Tab suggestions | /help",
        app.last_status
    ))
    .style(palette.status_style());
    f.render_widget(status, status_chunk);

    if let Mode::Confirm(action) = app.mode {
        draw_confirm(f, palette, action.prompt());
    }
}

fn panel_block(palette: Palette, title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(palette.panel_border_style())
        .title(Span::styled(format!(" {} ", title), palette.title_style()))
        .padding(Padding::new(PANEL_PADDING_X, PANEL_PADDING_X, 0, 0))
}

fn build_input_lines(app: &App, prompt_prefix: &str, palette: Palette) -> Vec<Line<'static>> {
    if app.input.is_empty() {
        return vec![Line::from(vec![
            Span::styled(prompt_prefix.to_string(), palette.prompt_style()),
            Span::styled(
                "Share how you're feeling... Enter send, Shift+Enter newline",
                palette.muted_style(),
            ),
        ])];
    }

    let mut lines = Vec::new();
    let indent = " ".repeat(prompt_prefix.chars().count());
    for (idx, part) in app.input.split('\n').enumerate() {
        let lead = if idx == 0 {
            prompt_prefix.to_string()
        } else {
            indent.clone()
        };
        lines.push(Line::from(vec![
            Span::styled(lead, palette.prompt_style()),
            Span::styled(part.to_string(), Style::default().fg(palette.input_text)),
        ]));
    }
    lines
}

fn build_typing_line(app: &App, palette: Palette) -> Paragraph<'static> {
    let frame = app.spinner_idx % BREATH_SCALE_PCT.len();
    let dot_color = color_with_breath(palette.typing, frame);
    let elapsed_secs = app.running_elapsed_secs();
    let elapsed = format!("{:02}:{:02}", elapsed_secs / 60, elapsed_secs % 60);
    Paragraph::new(Line::from(vec![
        Span::styled(
            " \u{25cf} ",
            Style::default().fg(dot_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("HealthDost is typing... {}", elapsed),
            Style::default().fg(palette.typing),
        ),
    ]))
}

fn build_suggestion_line(app: &App, palette: Palette) -> Line<'static> {
    let mut spans = vec![Span::styled(" try: ", palette.muted_style())];
    for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        if app.suggestion_idx == Some(i) {
            spans.push(Span::styled(
                format!(" {} ", suggestion),
                palette.chip_selected_style(),
            ));
        } else {
            spans.push(Span::styled(
                format!(" {} ", suggestion),
                palette.secondary_style(),
            ));
        }
    }
    Line::from(spans)
}

fn draw_confirm(f: &mut Frame, palette: Palette, prompt: &str) {
    let area = centered_rect(56, 24, f.area());
    let lines = vec![
        Line::from(Span::styled(prompt.to_string(), palette.body_style())),
        Line::from(""),
        Line::from(Span::styled(
            "[y] yes   [n] no",
            palette.muted_style(),
        )),
    ];
    let panel = Paragraph::new(lines)
        .style(palette.panel_surface_style())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(palette.panel_border_style())
                .title(Span::styled(" confirm ", palette.title_style()))
                .padding(Padding::new(1, 1, 0, 0))
                .style(palette.panel_surface_style()),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(panel, area);
}

fn scale_rgb(value: u8, pct: u16) -> u8 {
    ((value as u16 * pct) / 100).min(255) as u8
}

fn color_with_breath(base: Color, frame: usize) -> Color {
    let pct = BREATH_SCALE_PCT[frame % BREATH_SCALE_PCT.len()];
    match base {
        Color::Rgb(r, g, b) => Color::Rgb(scale_rgb(r, pct), scale_rgb(g, pct), scale_rgb(b, pct)),
        _ => base,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
