use super::*;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ASSISTANT_LABEL: &str = "dost";
const THREAD_DIVIDER: char = '\u{2502}';

impl App {
    /// Builds the full thread view: every entry becomes a row group in
    /// append order, pre-wrapped to the viewport width so scrolling can
    /// count lines directly.
    pub(super) fn render_entries_lines(&self, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::<Line<'static>>::new();
        let palette = self.palette;
        let width = width.max(1) as usize;

        for (idx, entry) in self.entries.iter().enumerate() {
            match entry.kind {
                EntryKind::User => {
                    let user_style = Style::default()
                        .fg(palette.user_fg)
                        .bg(palette.user_bg)
                        .add_modifier(Modifier::BOLD);
                    let inner_width = width.saturating_sub(2).max(1);
                    for md_line in markup_lines(&entry.text, user_style) {
                        for row in wrap_spans(md_line.spans, inner_width) {
                            lines.push(pad_row(row, width, user_style));
                        }
                    }
                }
                EntryKind::Assistant => {
                    let is_typing = self.running && self.assistant_idx == Some(idx);
                    let label_style = Style::default()
                        .fg(palette.assistant_label)
                        .add_modifier(Modifier::BOLD);
                    let base = if is_typing {
                        palette.muted_style()
                    } else {
                        palette.body_style()
                    };

                    // Label column: first line carries the author label, every
                    // continuation and wrapped line stays aligned behind the
                    // divider.
                    let label_width = UnicodeWidthStr::width(ASSISTANT_LABEL);
                    let label_sep = format!("{} {}", ASSISTANT_LABEL, THREAD_DIVIDER);
                    let indent_sep =
                        format!("{} {}", " ".repeat(label_width), THREAD_DIVIDER);
                    let content_width = width.saturating_sub(label_width + 3).max(1);

                    let mut first_row = true;
                    for md_line in markup_lines(&entry.text, base) {
                        for row in wrap_spans(md_line.spans, content_width) {
                            let gutter = if first_row {
                                label_sep.clone()
                            } else {
                                indent_sep.clone()
                            };
                            first_row = false;
                            let mut spans =
                                vec![Span::styled(gutter, label_style), Span::raw(" ")];
                            spans.extend(row);
                            lines.push(Line::from(spans));
                        }
                    }
                }
                EntryKind::System => {
                    push_prefixed_lines(
                        &mut lines,
                        &entry.text,
                        "\u{b7} ",
                        palette.secondary_style(),
                        width,
                    );
                }
                EntryKind::Error => {
                    push_prefixed_lines(
                        &mut lines,
                        &entry.text,
                        "! ",
                        palette.error_style(),
                        width,
                    );
                }
            }
            lines.push(Line::default());
        }

        lines
    }
}

fn pad_row(row: Vec<Span<'static>>, width: usize, style: Style) -> Line<'static> {
    let mut spans = vec![Span::styled(" ".to_string(), style)];
    let mut used = 1usize;
    for span in row {
        used += UnicodeWidthStr::width(span.content.as_ref());
        spans.push(span);
    }
    if used < width {
        spans.push(Span::styled(" ".repeat(width - used), style));
    }
    Line::from(spans)
}

fn push_prefixed_lines(
    lines: &mut Vec<Line<'static>>,
    text: &str,
    prefix: &str,
    style: Style,
    width: usize,
) {
    let indent = " ".repeat(prefix.chars().count());
    let content_width = width.saturating_sub(prefix.chars().count()).max(1);
    let mut first = true;
    for part in text.split('\n') {
        let raw = vec![Span::styled(part.to_string(), style)];
        for row in wrap_spans(raw, content_width) {
            let lead = if first { prefix } else { &indent };
            first = false;
            let mut spans = vec![Span::styled(lead.to_string(), style)];
            spans.extend(row);
            lines.push(Line::from(spans));
        }
    }
}

/// Splits text into (segment, is_bold) runs. `**bold**` marks a bold run; an
/// unpaired `**` renders literally. A run may span newlines because the bold
/// pass runs before the line-break pass, in that fixed order.
pub(super) fn markup_segments(text: &str) -> Vec<(String, bool)> {
    let mut segments = Vec::new();
    let mut rest = text;
    let mut bold = false;
    loop {
        match rest.find("**") {
            Some(pos) => {
                let chunk = &rest[..pos];
                if bold {
                    if !chunk.is_empty() {
                        segments.push((chunk.to_string(), true));
                    }
                    bold = false;
                } else {
                    if !chunk.is_empty() {
                        segments.push((chunk.to_string(), false));
                    }
                    bold = true;
                }
                rest = &rest[pos + 2..];
            }
            None => {
                if bold {
                    // Unclosed marker: keep it as literal text.
                    let mut tail = String::from("**");
                    tail.push_str(rest);
                    segments.push((tail, false));
                } else if !rest.is_empty() {
                    segments.push((rest.to_string(), false));
                }
                break;
            }
        }
    }
    segments
}

/// The restricted two-rule markup pass: bold emphasis, then line breaks.
/// Nothing else is interpreted, which keeps provider output from smuggling
/// arbitrary markup into the view.
pub(super) fn markup_lines(text: &str, base: Style) -> Vec<Line<'static>> {
    let mut rows: Vec<Vec<Span<'static>>> = vec![Vec::new()];
    for (segment, bold) in markup_segments(text) {
        let style = if bold {
            base.add_modifier(Modifier::BOLD)
        } else {
            base
        };
        let mut first = true;
        for part in segment.split('\n') {
            if !first {
                rows.push(Vec::new());
            }
            first = false;
            if part.is_empty() {
                continue;
            }
            if let Some(row) = rows.last_mut() {
                row.push(Span::styled(part.to_string(), style));
            }
        }
    }
    rows.into_iter().map(Line::from).collect()
}

/// Greedy display-width wrap that preserves span styles. The space a line
/// breaks on is dropped.
pub(super) fn wrap_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Vec<Span<'static>>> {
    let width = width.max(1);
    let mut out: Vec<Vec<Span<'static>>> = vec![Vec::new()];
    let mut used = 0usize;

    for span in spans {
        let style = span.style;
        let mut buf = String::new();
        for ch in span.content.chars() {
            let cw = UnicodeWidthChar::width(ch).unwrap_or(1).max(1);
            if used + cw > width && used > 0 {
                if !buf.is_empty() {
                    if let Some(row) = out.last_mut() {
                        row.push(Span::styled(std::mem::take(&mut buf), style));
                    }
                }
                out.push(Vec::new());
                used = 0;
                if ch == ' ' {
                    continue;
                }
            }
            buf.push(ch);
            used += cw;
        }
        if !buf.is_empty() {
            if let Some(row) = out.last_mut() {
                row.push(Span::styled(buf, style));
            }
        }
    }

    out
}
