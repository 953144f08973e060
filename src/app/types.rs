use ratatui::style::{Color, Modifier, Style};

use super::session::ReplyOutcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum EntryKind {
    User,
    Assistant,
    System,
    Error,
}

/// One rendered row group in the thread view. Entries are append-only; the
/// only in-place rewrite is the typing placeholder resolving into its reply.
#[derive(Clone, Debug)]
pub(super) struct LogEntry {
    pub(super) kind: EntryKind,
    pub(super) text: String,
}

/// Events delivered from the reply worker thread back to the UI loop.
#[derive(Debug)]
pub(super) enum WorkerEvent {
    Reply(ReplyOutcome),
}

#[derive(Clone, Copy)]
pub(super) struct Palette {
    pub(super) prompt: Color,
    pub(super) input_text: Color,
    pub(super) muted_text: Color,
    pub(super) highlight_fg: Color,
    pub(super) highlight_bg: Color,
    pub(super) status_text: Color,
    pub(super) user_fg: Color,
    pub(super) user_bg: Color,
    pub(super) assistant_label: Color,
    pub(super) assistant_text: Color,
    pub(super) system_text: Color,
    pub(super) error_text: Color,
    pub(super) banner_title: Color,
    pub(super) panel_bg: Color,
    pub(super) panel_fg: Color,
    pub(super) typing: Color,
}

/// Indigo-on-slate, echoing the hues of the original web widget.
pub(super) fn default_palette() -> Palette {
    Palette {
        prompt: Color::Rgb(129, 140, 248),
        input_text: Color::Rgb(226, 232, 240),
        muted_text: Color::Rgb(100, 116, 139),
        highlight_fg: Color::Rgb(238, 242, 255),
        highlight_bg: Color::Rgb(67, 56, 202),
        status_text: Color::Rgb(120, 134, 156),
        user_fg: Color::Rgb(238, 242, 255),
        user_bg: Color::Rgb(49, 46, 129),
        assistant_label: Color::Rgb(129, 140, 248),
        assistant_text: Color::Rgb(203, 213, 225),
        system_text: Color::Rgb(120, 134, 156),
        error_text: Color::Rgb(230, 120, 120),
        banner_title: Color::Rgb(165, 180, 252),
        panel_bg: Color::Rgb(15, 18, 32),
        panel_fg: Color::Rgb(203, 213, 225),
        typing: Color::Rgb(129, 140, 248),
    }
}

impl Palette {
    pub(super) fn prompt_style(self) -> Style {
        Style::default()
            .fg(self.prompt)
            .add_modifier(Modifier::BOLD)
    }

    pub(super) fn title_style(self) -> Style {
        Style::default()
            .fg(self.banner_title)
            .add_modifier(Modifier::BOLD)
    }

    pub(super) fn body_style(self) -> Style {
        Style::default().fg(self.assistant_text)
    }

    pub(super) fn secondary_style(self) -> Style {
        Style::default().fg(self.system_text)
    }

    pub(super) fn muted_style(self) -> Style {
        Style::default().fg(self.muted_text)
    }

    pub(super) fn status_style(self) -> Style {
        Style::default().fg(self.status_text)
    }

    pub(super) fn error_style(self) -> Style {
        Style::default().fg(self.error_text)
    }

    pub(super) fn panel_surface_style(self) -> Style {
        Style::default().bg(self.panel_bg).fg(self.panel_fg)
    }

    pub(super) fn panel_border_style(self) -> Style {
        Style::default().fg(self.highlight_bg)
    }

    pub(super) fn input_surface_style(self) -> Style {
        Style::default().fg(self.input_text)
    }

    pub(super) fn chip_selected_style(self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }
}
