use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::{input_cursor_position, truncate};

mod dispatch;
mod input;
mod render;
mod runtime;
mod session;
#[cfg(test)]
mod tests;
mod text;
mod types;
mod ui;
mod worker;

pub(crate) use runtime::run_app;
pub(crate) use session::{Author, ChatTurn, SystemProfile};

use session::{ChatSession, ReplyOutcome, CLEARED_MESSAGE, EMPTY_REPLY_MESSAGE, FAILURE_MESSAGE};
use text::sanitize_reply_text;
use types::{default_palette, EntryKind, LogEntry, Palette, WorkerEvent};

const TYPING_PLACEHOLDER: &str = "(typing...)";
const BUSY_NOTICE: &str = "still replying, one moment...";

/// Canned prompts shown as chips while the input is empty. Selecting one is
/// identical to typing its literal text and submitting it.
const SUGGESTIONS: &[&str] = &[
    "How can I sleep better?",
    "I've had a headache all day",
    "Give me tips to manage stress",
    "What are some healthy snack ideas?",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Normal,
    Confirm(ConfirmAction),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConfirmAction {
    Reset,
    Clear,
}

impl ConfirmAction {
    fn prompt(self) -> &'static str {
        match self {
            ConfirmAction::Reset => {
                "Would you like to restart a fresh conversation with HealthDost?"
            }
            ConfirmAction::Clear => "Clear all messages from view?",
        }
    }
}

/// Cached rendered thread lines so scrolling and redraws do not re-run the
/// markup pass every frame.
struct RenderCache {
    generation: u64,
    width: u16,
    lines: Vec<Line<'static>>,
}

impl RenderCache {
    fn new() -> Self {
        Self {
            generation: u64::MAX, // force first rebuild
            width: 0,
            lines: Vec::new(),
        }
    }
}

struct App {
    session: Arc<Mutex<ChatSession>>,

    entries: Vec<LogEntry>,
    scroll: u16,
    autoscroll: bool,
    viewport_width: u16,
    viewport_height: u16,

    input: String,
    cursor: usize,
    history: Vec<String>,
    history_pos: Option<usize>,
    suggestion_idx: Option<usize>,

    mode: Mode,
    running: bool,
    run_started_at: Option<Instant>,
    spinner_idx: usize,
    rx: Option<Receiver<WorkerEvent>>,
    /// Index of the in-flight assistant placeholder entry, if any.
    assistant_idx: Option<usize>,

    should_quit: bool,
    last_status: String,
    palette: Palette,

    render_generation: u64,
    render_cache: RenderCache,
}

impl App {
    fn new(session: ChatSession) -> Self {
        let mut app = Self {
            session: Arc::new(Mutex::new(session)),
            entries: Vec::new(),
            scroll: 0,
            autoscroll: true,
            viewport_width: 100,
            viewport_height: 30,
            input: String::new(),
            cursor: 0,
            history: Vec::new(),
            history_pos: None,
            suggestion_idx: None,
            mode: Mode::Normal,
            running: false,
            run_started_at: None,
            spinner_idx: 0,
            rx: None,
            assistant_idx: None,
            should_quit: false,
            last_status: "ready".to_string(),
            palette: default_palette(),
            render_generation: 0,
            render_cache: RenderCache::new(),
        };
        app.show_startup_banner();
        app
    }

    fn push_entry(&mut self, kind: EntryKind, text: impl Into<String>) {
        self.entries.push(LogEntry {
            kind,
            text: text.into(),
        });
        self.follow_scroll();
    }

    /// Bump the render generation to invalidate the render cache.
    fn invalidate_render_cache(&mut self) {
        self.render_generation = self.render_generation.wrapping_add(1);
    }

    /// Invalidate the render cache and keep the view pinned to the newest
    /// turn unless the user scrolled away. Call after any entry mutation.
    fn follow_scroll(&mut self) {
        self.invalidate_render_cache();
        if self.autoscroll {
            self.scroll = self.scroll_max();
        } else {
            self.scroll = self.scroll.min(self.scroll_max());
        }
    }

    fn ensure_render_cache(&mut self) {
        let need_rebuild = self.render_cache.generation != self.render_generation
            || self.render_cache.width != self.viewport_width;
        if !need_rebuild {
            return;
        }
        let width = self.viewport_width.max(1);
        self.render_cache = RenderCache {
            generation: self.render_generation,
            width: self.viewport_width,
            lines: self.render_entries_lines(width),
        };
    }

    fn scroll_max(&mut self) -> u16 {
        self.ensure_render_cache();
        let total = self.render_cache.lines.len().min(u16::MAX as usize) as u16;
        total.saturating_sub(self.thread_rows())
    }

    fn cached_log_lines(&self) -> &[Line<'static>] {
        &self.render_cache.lines
    }

    /// Rows available to the thread view once the typing row, suggestion
    /// row, composer, and status bar have taken their share.
    fn thread_rows(&self) -> u16 {
        let typing_h: u16 = if self.running { 1 } else { 0 };
        let suggestions_h: u16 = if self.suggestions_visible() { 1 } else { 0 };
        let input_h = self.composer_height();
        let fixed = typing_h
            .saturating_add(suggestions_h)
            .saturating_add(input_h)
            .saturating_add(1); // status bar
        self.viewport_height.saturating_sub(fixed).max(1)
    }

    /// Composer panel height including its borders.
    fn composer_height(&self) -> u16 {
        let prompt_width = 2; // "> "
        let content_width = self.viewport_width.saturating_sub(4).max(1);
        let max_allowed = self.viewport_height.saturating_sub(5).max(3);
        self.input_height(content_width, prompt_width)
            .saturating_add(2)
            .min(max_allowed)
    }

    fn input_height(&self, width: u16, prompt_width: u16) -> u16 {
        if self.input.is_empty() {
            return 1;
        }
        let (_, end_y) = input_cursor_position(&self.input, self.input.len(), width, prompt_width);
        end_y.saturating_add(1).max(1)
    }

    fn suggestions_visible(&self) -> bool {
        self.input.is_empty() && !self.running && matches!(self.mode, Mode::Normal)
    }

    fn update_viewport(&mut self, width: u16, height: u16) {
        self.viewport_width = width.max(1);
        self.viewport_height = height.max(1);
        let max_scroll = self.scroll_max();
        if self.autoscroll {
            self.scroll = max_scroll;
        } else {
            self.scroll = self.scroll.min(max_scroll);
        }
    }

    fn scroll_up(&mut self, n: u16) {
        let from = if self.autoscroll {
            self.scroll_max()
        } else {
            self.scroll
        };
        self.autoscroll = false;
        self.scroll = from.saturating_sub(n);
    }

    fn scroll_down(&mut self, n: u16) {
        let max_scroll = self.scroll_max();
        self.scroll = self.scroll.saturating_add(n).min(max_scroll);
        if self.scroll >= max_scroll {
            self.autoscroll = true;
        }
    }

    fn start_running_state(&mut self, rx: Receiver<WorkerEvent>) {
        self.rx = Some(rx);
        self.running = true;
        self.run_started_at = Some(Instant::now());
    }

    fn clear_running_state(&mut self) {
        self.running = false;
        self.rx = None;
        self.assistant_idx = None;
        self.run_started_at = None;
    }

    fn running_elapsed_secs(&self) -> u64 {
        self.run_started_at
            .map(|started| started.elapsed().as_secs())
            .unwrap_or(0)
    }

    fn show_startup_banner(&mut self) {
        if !self.entries.is_empty() {
            return;
        }
        self.push_entry(
            EntryKind::System,
            format!("HealthDost {} ready", env!("CARGO_PKG_VERSION")),
        );
        self.push_entry(
            EntryKind::Assistant,
            "Hi, I'm HealthDost, your health companion. I'm here to listen.\n\
             Ask me about sleep, stress, nutrition, or just how you're feeling today.",
        );
        self.push_entry(
            EntryKind::System,
            "keys: Enter send | Tab suggestions | /help commands | Ctrl+C exit\n\
             HealthDost is not a substitute for professional medical advice.",
        );
        self.last_status = "ready".to_string();
    }
}
