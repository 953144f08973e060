use std::fs;
use std::io::Stdout;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthChar;

mod app;
mod provider;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--version" | "-v" => {
                println!("healthdost {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            unknown => {
                eprintln!("unknown argument: {}", unknown);
                std::process::exit(2);
            }
        }
    }

    init_logging();

    let mut terminal = setup_terminal()?;
    let result = app::run_app(&mut terminal);
    restore_terminal(&mut terminal)?;
    result
}

/// Diagnostics go to a log file; stdout belongs to the viewport while the
/// app is running. Filter via HEALTHDOST_LOG (default "info").
fn init_logging() {
    let dir = data_dir();
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("healthdost.log"))
    else {
        return;
    };
    let filter =
        EnvFilter::try_from_env("HEALTHDOST_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn data_dir() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".healthdost")
    } else {
        PathBuf::from(".healthdost")
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enable raw mode")?;
    crossterm::execute!(
        std::io::stdout(),
        EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )
    .context("enter alternate screen")?;
    crossterm::execute!(std::io::stdout(), EnableBracketedPaste).ok();

    let mut terminal =
        Terminal::new(CrosstermBackend::new(std::io::stdout())).context("create terminal")?;
    terminal.hide_cursor().ok();
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    crossterm::execute!(std::io::stdout(), DisableBracketedPaste).ok();
    crossterm::execute!(
        std::io::stdout(),
        crossterm::event::DisableMouseCapture,
        LeaveAlternateScreen
    )
    .ok();
    disable_raw_mode().context("disable raw mode")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

pub(crate) fn truncate(s: &str, n: usize) -> String {
    match s.char_indices().nth(n) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

pub(crate) fn input_cursor_position(
    input: &str,
    cursor: usize,
    width: u16,
    prompt_width: u16,
) -> (u16, u16) {
    let width = width.max(1) as usize;
    let mut x = prompt_width as usize;
    let mut y = 0usize;
    let mut consumed = 0usize;

    for ch in input.chars() {
        let len = ch.len_utf8();
        if consumed + len > cursor {
            break;
        }
        consumed += len;
        if ch == '\n' {
            x = prompt_width as usize;
            y += 1;
            continue;
        }
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1).max(1);
        if x + ch_width > width {
            x = 0;
            y += 1;
        }
        x += ch_width;
        if x >= width {
            x = 0;
            y += 1;
        }
    }

    (x as u16, y as u16)
}
