use std::io::Stdout;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind, MouseEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use super::*;
use crate::provider::GeminiClient;

pub(crate) fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let session = ChatSession::new(
        Box::new(GeminiClient::from_env()),
        SystemProfile::health_companion(),
    );
    let mut app = App::new(session);
    run_loop(terminal, &mut app)
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    const ACTIVE_POLL_MS: u64 = 33;
    const IDLE_POLL_MS: u64 = 100;
    const SPINNER_TICK_MS: u64 = 120;
    const MAX_EVENTS_PER_FRAME: u16 = 64;

    let mut last_spinner_tick = std::time::Instant::now();
    let mut needs_draw = true;

    loop {
        let mut state_changed = app.poll_worker();
        if app.running && last_spinner_tick.elapsed() >= Duration::from_millis(SPINNER_TICK_MS) {
            app.spinner_idx = app.spinner_idx.wrapping_add(1);
            last_spinner_tick = std::time::Instant::now();
            state_changed = true;
        }
        if state_changed {
            needs_draw = true;
        }

        if needs_draw {
            if let Ok(area) = terminal.size() {
                app.update_viewport(area.width, area.height);
            }
            app.ensure_render_cache();
            terminal.draw(|f| ui::draw(f, app))?;
            needs_draw = false;
        }

        if app.should_quit {
            break;
        }

        let timeout = if app.running {
            Duration::from_millis(ACTIVE_POLL_MS)
        } else {
            Duration::from_millis(IDLE_POLL_MS)
        };
        if !event::poll(timeout).context("event poll")? {
            continue;
        }

        let mut wheel_delta: i32 = 0;
        let mut drained_events: u16 = 0;
        let mut input_changed = false;

        loop {
            match event::read().context("event read")? {
                Event::Key(key) => {
                    if !matches!(key.kind, KeyEventKind::Release) {
                        app.handle_key(key);
                        input_changed = true;
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => wheel_delta -= 1,
                    MouseEventKind::ScrollDown => wheel_delta += 1,
                    _ => {}
                },
                Event::Paste(text) => {
                    app.handle_paste_event(&text);
                    input_changed = true;
                }
                Event::Resize(_, _) => {
                    input_changed = true;
                }
                _ => {}
            }

            drained_events = drained_events.saturating_add(1);
            if drained_events >= MAX_EVENTS_PER_FRAME {
                break;
            }
            if !event::poll(Duration::from_millis(0)).context("event poll drain")? {
                break;
            }
        }

        if wheel_delta < 0 {
            app.scroll_up(wheel_delta.unsigned_abs().min(64) as u16);
            input_changed = true;
        } else if wheel_delta > 0 {
            app.scroll_down(wheel_delta.min(64) as u16);
            input_changed = true;
        }

        if input_changed {
            needs_draw = true;
        }
    }

    Ok(())
}
