use super::*;
use crossbeam_channel::unbounded;

impl App {
    /// Free-text submit: trims the composer line, clears it immediately
    /// (before the round-trip resolves), and routes the utterance. Slash
    /// lines are commands, everything else goes to the session.
    pub(super) fn submit_current_line(&mut self) {
        let line = self.input.trim().to_string();
        if line.is_empty() {
            return;
        }

        if let Some(command) = line.strip_prefix('/') {
            self.clear_input_buffer();
            self.handle_command(command.trim());
            return;
        }

        // The busy gate must run before the composer is cleared, so a line
        // typed during a pending round-trip survives the rejection.
        if self.running {
            self.last_status = BUSY_NOTICE.to_string();
            return;
        }

        self.clear_input_buffer();
        self.history.push(line.clone());
        self.history_pos = None;
        self.submit_utterance(line);
    }

    /// Suggestion selection: equivalent to typing the chip's literal query
    /// text and submitting it, bypassing the input field.
    pub(super) fn submit_selected_suggestion(&mut self) {
        let Some(idx) = self.suggestion_idx else {
            return;
        };
        let Some(query) = SUGGESTIONS.get(idx) else {
            return;
        };
        self.suggestion_idx = None;
        self.submit_utterance(query.to_string());
    }

    /// The submission pipeline shared by free-text and suggestion chips:
    /// render the User turn optimistically, show the typing affordance, and
    /// hand the round-trip to a worker thread. Exactly one assistant turn
    /// will resolve the placeholder, whatever the outcome.
    pub(super) fn submit_utterance(&mut self, utterance: String) {
        let utterance = utterance.trim().to_string();
        if utterance.is_empty() {
            return;
        }

        // Submissions are serialized: one pending round-trip at a time.
        if self.running {
            self.last_status = BUSY_NOTICE.to_string();
            return;
        }

        self.push_entry(EntryKind::User, utterance.clone());
        self.push_entry(EntryKind::Assistant, TYPING_PLACEHOLDER);
        self.assistant_idx = Some(self.entries.len() - 1);
        self.autoscroll = true;
        self.scroll = self.scroll_max();
        self.last_status = "sending...".to_string();

        let (tx, rx) = unbounded::<WorkerEvent>();
        let session = Arc::clone(&self.session);
        std::thread::spawn(move || {
            let outcome = match session.lock() {
                Ok(mut session) => session.submit(&utterance),
                Err(_) => {
                    tracing::error!("session lock poisoned");
                    Some(ReplyOutcome::Failure)
                }
            };
            // The dispatcher already rejected empty input, so None cannot
            // happen here; map it to Empty rather than dropping the
            // placeholder turn.
            let outcome = outcome.unwrap_or(ReplyOutcome::Empty);
            let _ = tx.send(WorkerEvent::Reply(outcome));
        });
        self.start_running_state(rx);
    }

    pub(super) fn handle_command(&mut self, command: &str) {
        match command {
            "exit" | "quit" => {
                self.should_quit = true;
            }
            "reset" | "restart" => {
                self.request_confirm(ConfirmAction::Reset);
            }
            "clear" => {
                self.request_confirm(ConfirmAction::Clear);
            }
            "help" | "commands" => {
                self.push_entry(
                    EntryKind::System,
                    "commands:\n\
                     \x20 /clear   clear the chat view (asks first)\n\
                     \x20 /reset   start a fresh conversation (asks first)\n\
                     \x20 /help    show this help\n\
                     \x20 /exit    quit",
                );
            }
            other => {
                self.push_entry(
                    EntryKind::Error,
                    format!("unknown command /{}; try /help", truncate(other, 24)),
                );
            }
        }
    }

    /// Reset and Clear always ask first. The confirmation is an in-app modal
    /// driven through the normal key handler, so tests can exercise both the
    /// confirmed and denied paths deterministically.
    pub(super) fn request_confirm(&mut self, action: ConfirmAction) {
        if self.running {
            self.last_status = BUSY_NOTICE.to_string();
            return;
        }
        self.mode = Mode::Confirm(action);
    }

    pub(super) fn apply_confirmed(&mut self, action: ConfirmAction) {
        self.mode = Mode::Normal;
        match action {
            ConfirmAction::Reset => self.reset_conversation(),
            ConfirmAction::Clear => self.clear_view(),
        }
    }

    /// Empties the view only. Provider memory is untouched on purpose: the
    /// next reply may still draw on earlier turns.
    pub(super) fn clear_view(&mut self) {
        self.entries.clear();
        self.invalidate_render_cache();
        self.push_entry(EntryKind::Assistant, CLEARED_MESSAGE);
        self.last_status = "history cleared".to_string();
    }

    /// Full restart: fresh conversation memory and fresh view together, the
    /// in-process equivalent of reloading the page.
    pub(super) fn reset_conversation(&mut self) {
        // A worker panic poisons the lock; the guard still holds the context
        // and a confirmed reset must clear it regardless.
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .reset();
        self.entries.clear();
        self.history.clear();
        self.history_pos = None;
        self.suggestion_idx = None;
        self.clear_input_buffer();
        self.autoscroll = true;
        self.invalidate_render_cache();
        self.show_startup_banner();
        self.last_status = "fresh conversation".to_string();
        tracing::info!("conversation reset");
    }
}
