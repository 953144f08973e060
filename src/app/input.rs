use super::*;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

impl App {
    pub(super) fn handle_key(&mut self, key: KeyEvent) {
        match self.mode {
            Mode::Confirm(action) => self.handle_confirm_key(key, action),
            Mode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent, action: ConfirmAction) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.apply_confirmed(action);
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.mode = Mode::Normal;
                self.last_status = "cancelled".to_string();
            }
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('l') => {
                    self.request_confirm(ConfirmAction::Clear);
                    return;
                }
                KeyCode::Char('a') => {
                    self.cursor = 0;
                    return;
                }
                KeyCode::Char('e') => {
                    self.cursor = self.input.len();
                    return;
                }
                KeyCode::Char('j') => {
                    self.insert_char('\n');
                    return;
                }
                KeyCode::Char('p') => {
                    self.history_prev();
                    return;
                }
                KeyCode::Char('n') => {
                    self.history_next();
                    return;
                }
                _ => {}
            }
        }

        if key.modifiers.contains(KeyModifiers::ALT) && matches!(key.code, KeyCode::Backspace) {
            self.backspace_word();
            return;
        }

        match key.code {
            KeyCode::PageUp => self.scroll_up(5),
            KeyCode::PageDown => self.scroll_down(5),
            KeyCode::Up => {
                if self.suggestions_visible() && self.suggestion_idx.is_some() {
                    self.cycle_suggestion_prev();
                } else {
                    self.history_prev();
                }
            }
            KeyCode::Down => {
                if self.suggestions_visible() && self.suggestion_idx.is_some() {
                    self.cycle_suggestion_next();
                } else {
                    self.history_next();
                }
            }
            KeyCode::Tab => {
                if self.suggestions_visible() {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        self.cycle_suggestion_prev();
                    } else {
                        self.cycle_suggestion_next();
                    }
                }
            }
            KeyCode::BackTab => {
                if self.suggestions_visible() {
                    self.cycle_suggestion_prev();
                }
            }
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.insert_char('\n');
                } else if self.input.is_empty() && self.suggestion_idx.is_some() {
                    self.submit_selected_suggestion();
                } else {
                    self.submit_current_line();
                }
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.input.len(),
            KeyCode::Esc => {
                self.suggestion_idx = None;
            }
            KeyCode::Char(c) => {
                self.suggestion_idx = None;
                self.insert_char(c);
            }
            _ => {}
        }
    }

    fn cycle_suggestion_next(&mut self) {
        let len = SUGGESTIONS.len();
        self.suggestion_idx = Some(match self.suggestion_idx {
            Some(i) => (i + 1) % len,
            None => 0,
        });
    }

    fn cycle_suggestion_prev(&mut self) {
        let len = SUGGESTIONS.len();
        self.suggestion_idx = Some(match self.suggestion_idx {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        });
    }

    pub(super) fn handle_paste_event(&mut self, raw: &str) {
        let normalized = if raw.contains('\r') {
            raw.replace("\r\n", "\n").replace('\r', "\n")
        } else {
            raw.to_string()
        };
        if normalized.is_empty() {
            return;
        }
        self.suggestion_idx = None;
        self.insert_str(&normalized);
    }

    pub(super) fn clear_input_buffer(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    pub(super) fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let next = match self.history_pos {
            None => self.history.len().saturating_sub(1),
            Some(i) => i.saturating_sub(1),
        };
        self.history_pos = Some(next);
        self.input = self.history[next].clone();
        self.cursor = self.input.len();
    }

    pub(super) fn history_next(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let Some(i) = self.history_pos else {
            return;
        };
        if i + 1 >= self.history.len() {
            self.history_pos = None;
            self.input.clear();
            self.cursor = 0;
            return;
        }
        let next = i + 1;
        self.history_pos = Some(next);
        self.input = self.history[next].clone();
        self.cursor = self.input.len();
    }

    pub(super) fn insert_char(&mut self, c: char) {
        if self.cursor >= self.input.len() {
            self.input.push(c);
        } else {
            self.input.insert(self.cursor, c);
        }
        self.cursor += c.len_utf8();
    }

    pub(super) fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            self.insert_char(c);
        }
    }

    pub(super) fn backspace(&mut self) {
        if self.cursor == 0 || self.input.is_empty() {
            return;
        }
        if let Some(prev_idx) = self.input[..self.cursor]
            .char_indices()
            .last()
            .map(|(i, _)| i)
        {
            self.input.drain(prev_idx..self.cursor);
            self.cursor = prev_idx;
        }
    }

    pub(super) fn backspace_word(&mut self) {
        if self.cursor == 0 {
            return;
        }
        while self.cursor > 0 && self.input[..self.cursor].ends_with(' ') {
            self.backspace();
        }
        while self.cursor > 0 && !self.input[..self.cursor].ends_with(' ') {
            self.backspace();
        }
    }

    pub(super) fn delete(&mut self) {
        if self.cursor >= self.input.len() {
            return;
        }
        let mut iter = self.input[self.cursor..].char_indices();
        let Some((_, ch)) = iter.next() else {
            return;
        };
        let end = self.cursor + ch.len_utf8();
        self.input.drain(self.cursor..end);
    }

    pub(super) fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        if let Some(prev_idx) = self.input[..self.cursor]
            .char_indices()
            .last()
            .map(|(i, _)| i)
        {
            self.cursor = prev_idx;
        }
    }

    pub(super) fn move_right(&mut self) {
        if self.cursor >= self.input.len() {
            return;
        }
        let mut iter = self.input[self.cursor..].char_indices();
        if let Some((_, ch)) = iter.next() {
            self.cursor += ch.len_utf8();
        }
    }
}
