use std::collections::VecDeque;
use std::time::Duration;

use crossbeam_channel::unbounded;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::render::{markup_lines, markup_segments, wrap_spans};
use super::*;
use crate::provider::ChatProvider;

/// Provider stub that serves a scripted queue of outcomes. Once the queue
/// drains it reports empty replies.
struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<Option<String>>>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<Option<String>>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
        }
    }
}

impl ChatProvider for ScriptedProvider {
    fn generate(&self, _profile: &SystemProfile, _turns: &[ChatTurn]) -> Result<Option<String>> {
        match self.replies.lock() {
            Ok(mut queue) => queue.pop_front().unwrap_or(Ok(None)),
            Err(_) => Ok(None),
        }
    }
}

fn scripted_app(replies: Vec<Result<Option<String>>>) -> App {
    let session = ChatSession::new(
        Box::new(ScriptedProvider::new(replies)),
        SystemProfile::health_companion(),
    );
    App::new(session)
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

/// Spins until the in-flight submission resolves. Panics if the worker never
/// reports back.
fn wait_for_reply(app: &mut App) {
    for _ in 0..400 {
        app.poll_worker();
        if !app.running {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("worker never delivered a reply");
}

fn type_and_submit(app: &mut App, text: &str) {
    app.insert_str(text);
    app.submit_current_line();
    wait_for_reply(app);
}

fn turn_count(app: &App) -> usize {
    app.session
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .turn_count()
}

fn entry_texts(app: &App) -> Vec<(EntryKind, String)> {
    app.entries
        .iter()
        .map(|e| (e.kind, e.text.clone()))
        .collect()
}

fn flatten(lines: &[Line<'_>]) -> String {
    lines
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|s| s.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn empty_input_is_a_no_op() {
    let mut app = scripted_app(vec![]);
    let before = app.entries.len();
    app.submit_current_line();
    assert_eq!(app.entries.len(), before);
    assert_eq!(turn_count(&app), 0);
    assert!(!app.running);
}

#[test]
fn whitespace_submission_never_reaches_provider() {
    let mut app = scripted_app(vec![]);
    let before = app.entries.len();
    app.insert_str("   \n  ");
    app.submit_current_line();
    assert_eq!(app.entries.len(), before);
    assert_eq!(turn_count(&app), 0);
    assert!(!app.running);
    assert!(app.input.is_empty());
}

#[test]
fn submission_renders_user_then_assistant() {
    let mut app = scripted_app(vec![Ok(Some("Rest and hydrate.".to_string()))]);
    app.entries.clear();
    type_and_submit(&mut app, "I have a headache");

    assert_eq!(app.entries.len(), 2);
    assert_eq!(app.entries[0].kind, EntryKind::User);
    assert_eq!(app.entries[0].text, "I have a headache");
    assert_eq!(app.entries[1].kind, EntryKind::Assistant);
    assert_eq!(app.entries[1].text, "Rest and hydrate.");
    assert_eq!(turn_count(&app), 2);
    assert!(app.assistant_idx.is_none());
}

#[test]
fn provider_error_shows_apology_and_keeps_user_turn() {
    let mut app = scripted_app(vec![Err(anyhow::anyhow!("network down"))]);
    app.entries.clear();
    type_and_submit(&mut app, "hello");

    assert_eq!(app.entries.len(), 2);
    assert_eq!(app.entries[1].text, FAILURE_MESSAGE);
    // The user turn stays in context so a retry continues the conversation.
    assert_eq!(turn_count(&app), 1);
}

#[test]
fn empty_reply_shows_reassurance() {
    let mut app = scripted_app(vec![Ok(None)]);
    app.entries.clear();
    type_and_submit(&mut app, "hello");

    assert_eq!(app.entries[1].text, EMPTY_REPLY_MESSAGE);
    // The fallback is view-only, never an assistant turn.
    assert_eq!(turn_count(&app), 1);
}

#[test]
fn blank_reply_is_treated_as_empty() {
    let mut app = scripted_app(vec![Ok(Some("\u{1b}[2J \t ".to_string()))]);
    app.entries.clear();
    type_and_submit(&mut app, "hello");
    assert_eq!(app.entries[1].text, EMPTY_REPLY_MESSAGE);
}

#[test]
fn failure_then_retry_continues_same_context() {
    let mut app = scripted_app(vec![
        Err(anyhow::anyhow!("boom")),
        Ok(Some("Welcome back.".to_string())),
    ]);
    app.entries.clear();
    type_and_submit(&mut app, "first");
    type_and_submit(&mut app, "second");

    // first user turn + second user turn + one assistant turn
    assert_eq!(turn_count(&app), 3);
    assert_eq!(app.entries[3].text, "Welcome back.");
}

#[test]
fn suggestion_chip_matches_typed_submission() {
    let reply = "Try a consistent bedtime.";
    let mut typed = scripted_app(vec![Ok(Some(reply.to_string()))]);
    typed.entries.clear();
    type_and_submit(&mut typed, SUGGESTIONS[0]);

    let mut chipped = scripted_app(vec![Ok(Some(reply.to_string()))]);
    chipped.entries.clear();
    chipped.suggestion_idx = Some(0);
    chipped.submit_selected_suggestion();
    wait_for_reply(&mut chipped);

    assert_eq!(entry_texts(&typed), entry_texts(&chipped));
    assert_eq!(turn_count(&typed), turn_count(&chipped));
    assert!(chipped.suggestion_idx.is_none());
}

#[test]
fn submissions_are_serialized_while_busy() {
    let mut app = scripted_app(vec![]);
    app.entries.clear();
    let (tx, rx) = unbounded::<WorkerEvent>();
    app.begin_test_run(rx);

    app.submit_utterance("am I talking too fast?".to_string());
    assert!(app.entries.is_empty());
    assert_eq!(app.last_status, BUSY_NOTICE);

    drop(tx);
}

#[test]
fn busy_rejection_keeps_typed_line_in_composer() {
    let mut app = scripted_app(vec![]);
    app.entries.clear();
    let (tx, rx) = unbounded::<WorkerEvent>();
    app.begin_test_run(rx);

    app.insert_str("are you still there?");
    app.submit_current_line();

    assert_eq!(app.input, "are you still there?");
    assert_eq!(app.last_status, BUSY_NOTICE);
    assert!(app.entries.is_empty());
    assert!(app.history.is_empty());

    drop(tx);
}

#[test]
fn reset_clears_context_even_after_worker_panic() {
    let mut app = scripted_app(vec![Ok(Some("noted".to_string()))]);
    type_and_submit(&mut app, "hello");
    assert_eq!(turn_count(&app), 2);

    let session = Arc::clone(&app.session);
    let _ = std::thread::spawn(move || {
        let _guard = session.lock().unwrap();
        panic!("poison the session lock");
    })
    .join();
    assert!(app.session.lock().is_err());

    app.handle_command("reset");
    app.handle_key(key(KeyCode::Char('y')));

    assert_eq!(turn_count(&app), 0);
    assert_eq!(app.last_status, "fresh conversation");
}

#[test]
fn reply_event_resolves_typing_placeholder() {
    let mut app = scripted_app(vec![]);
    app.entries.clear();
    app.push_entry(EntryKind::User, "hi");
    app.push_entry(EntryKind::Assistant, TYPING_PLACEHOLDER);
    app.assistant_idx = Some(1);
    let (tx, rx) = unbounded::<WorkerEvent>();
    app.begin_test_run(rx);

    tx.send(WorkerEvent::Reply(ReplyOutcome::Text("Hello there.".to_string())))
        .unwrap();
    assert!(app.poll_worker());

    assert_eq!(app.entries[1].text, "Hello there.");
    assert!(!app.running);
    assert!(app.assistant_idx.is_none());
    assert_eq!(app.last_status, "ready");
}

#[test]
fn dead_worker_degrades_to_apology() {
    let mut app = scripted_app(vec![]);
    app.entries.clear();
    app.push_entry(EntryKind::Assistant, TYPING_PLACEHOLDER);
    app.assistant_idx = Some(0);
    let (tx, rx) = unbounded::<WorkerEvent>();
    app.begin_test_run(rx);
    drop(tx);

    assert!(app.poll_worker());
    assert_eq!(app.entries[0].text, FAILURE_MESSAGE);
    assert!(!app.running);
}

#[test]
fn clear_asks_first_and_is_idempotent() {
    let mut app = scripted_app(vec![Ok(Some("ok".to_string()))]);
    type_and_submit(&mut app, "remember me");

    app.handle_command("clear");
    assert_eq!(app.mode, Mode::Confirm(ConfirmAction::Clear));
    app.handle_key(key(KeyCode::Char('y')));
    let after_first = entry_texts(&app);
    assert_eq!(after_first.len(), 1);
    assert_eq!(after_first[0], (EntryKind::Assistant, CLEARED_MESSAGE.to_string()));

    app.handle_key(ctrl('l'));
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(entry_texts(&app), after_first);

    // The provider memory survives a view clear.
    assert_eq!(turn_count(&app), 2);
}

#[test]
fn confirm_denied_changes_nothing() {
    let mut app = scripted_app(vec![Ok(Some("ok".to_string()))]);
    type_and_submit(&mut app, "keep this");
    let before = entry_texts(&app);

    app.handle_command("clear");
    app.handle_key(key(KeyCode::Char('n')));
    assert_eq!(app.mode, Mode::Normal);
    assert_eq!(entry_texts(&app), before);

    app.handle_command("reset");
    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.mode, Mode::Normal);
    assert_eq!(entry_texts(&app), before);
    assert_eq!(turn_count(&app), 2);
}

#[test]
fn reset_discards_context_and_restores_banner() {
    let mut app = scripted_app(vec![Ok(Some("noted".to_string()))]);
    type_and_submit(&mut app, "my knee hurts");
    assert_eq!(turn_count(&app), 2);
    assert!(!app.history.is_empty());

    app.handle_command("reset");
    assert_eq!(app.mode, Mode::Confirm(ConfirmAction::Reset));
    app.handle_key(key(KeyCode::Char('y')));

    assert_eq!(turn_count(&app), 0);
    assert!(app.history.is_empty());
    assert_eq!(app.entries.len(), 3);
    assert_eq!(app.entries[0].kind, EntryKind::System);
    assert_eq!(app.entries[1].kind, EntryKind::Assistant);
}

#[test]
fn confirm_is_gated_while_busy() {
    let mut app = scripted_app(vec![]);
    let (tx, rx) = unbounded::<WorkerEvent>();
    app.begin_test_run(rx);

    app.handle_command("clear");
    assert_eq!(app.mode, Mode::Normal);
    assert_eq!(app.last_status, BUSY_NOTICE);

    drop(tx);
}

#[test]
fn unknown_command_reports_error() {
    let mut app = scripted_app(vec![]);
    app.entries.clear();
    app.insert_str("/frobnicate");
    app.submit_current_line();

    assert_eq!(app.entries.len(), 1);
    assert_eq!(app.entries[0].kind, EntryKind::Error);
    assert!(app.entries[0].text.contains("/frobnicate"));
    assert_eq!(turn_count(&app), 0);
}

#[test]
fn help_command_lists_commands() {
    let mut app = scripted_app(vec![]);
    app.entries.clear();
    app.handle_command("help");
    assert_eq!(app.entries[0].kind, EntryKind::System);
    assert!(app.entries[0].text.contains("/reset"));
}

#[test]
fn suggestion_keys_cycle_and_submit() {
    let mut app = scripted_app(vec![Ok(Some("ok".to_string()))]);
    app.entries.clear();
    assert!(app.suggestions_visible());

    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.suggestion_idx, Some(0));
    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.suggestion_idx, Some(1));
    app.handle_key(key(KeyCode::BackTab));
    assert_eq!(app.suggestion_idx, Some(0));

    // Typing dismisses the selection.
    app.handle_key(key(KeyCode::Char('h')));
    assert!(app.suggestion_idx.is_none());
    app.clear_input_buffer();

    app.handle_key(key(KeyCode::Tab));
    app.handle_key(key(KeyCode::Enter));
    wait_for_reply(&mut app);
    assert_eq!(app.entries[0].text, SUGGESTIONS[0]);
}

#[test]
fn suggestions_hide_while_running_or_typing() {
    let mut app = scripted_app(vec![]);
    assert!(app.suggestions_visible());

    app.insert_char('x');
    assert!(!app.suggestions_visible());
    app.clear_input_buffer();

    let (tx, rx) = unbounded::<WorkerEvent>();
    app.begin_test_run(rx);
    assert!(!app.suggestions_visible());
    drop(tx);
}

#[test]
fn history_recall_cycles_previous_lines() {
    let mut app = scripted_app(vec![Ok(Some("a".to_string())), Ok(Some("b".to_string()))]);
    type_and_submit(&mut app, "first question");
    type_and_submit(&mut app, "second question");

    app.handle_key(key(KeyCode::Up));
    assert_eq!(app.input, "second question");
    app.handle_key(key(KeyCode::Up));
    assert_eq!(app.input, "first question");
    app.handle_key(key(KeyCode::Down));
    assert_eq!(app.input, "second question");
    app.handle_key(key(KeyCode::Down));
    assert!(app.input.is_empty());
}

#[test]
fn backspace_word_eats_trailing_word() {
    let mut app = scripted_app(vec![]);
    app.insert_str("tension headache relief");
    app.backspace_word();
    assert_eq!(app.input, "tension headache ");
    app.backspace_word();
    assert_eq!(app.input, "tension ");
}

#[test]
fn paste_normalizes_carriage_returns() {
    let mut app = scripted_app(vec![]);
    app.handle_paste_event("line one\r\nline two\rline three");
    assert_eq!(app.input, "line one\nline two\nline three");
}

#[test]
fn bold_segment_carries_modifier() {
    let lines = markup_lines("stay **hydrated** today", Style::default());
    assert_eq!(lines.len(), 1);
    let spans = &lines[0].spans;
    assert_eq!(spans.len(), 3);
    assert_eq!(spans[1].content.as_ref(), "hydrated");
    assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
    assert!(!spans[0].style.add_modifier.contains(Modifier::BOLD));
}

#[test]
fn unclosed_marker_renders_literally() {
    let segments = markup_segments("a **b");
    assert_eq!(
        segments,
        vec![("a ".to_string(), false), ("**b".to_string(), false)]
    );
}

#[test]
fn bold_run_may_span_newlines() {
    let lines = markup_lines("**two\nlines**", Style::default());
    assert_eq!(lines.len(), 2);
    assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
    assert!(lines[1].spans[0].style.add_modifier.contains(Modifier::BOLD));
}

#[test]
fn newlines_split_into_separate_lines() {
    let lines = markup_lines("one\n\nthree", Style::default());
    assert_eq!(lines.len(), 3);
    assert!(lines[1].spans.is_empty());
}

#[test]
fn rendered_thread_never_shows_paired_markers() {
    let mut app = scripted_app(vec![Ok(Some(
        "Here are tips:\n**Sleep** well and **eat** greens".to_string(),
    ))]);
    app.entries.clear();
    type_and_submit(&mut app, "tips please");
    app.ensure_render_cache();

    let text = flatten(app.cached_log_lines());
    assert!(!text.contains("**"));
    assert!(text.contains("Sleep"));
    assert!(text.contains("eat"));
}

#[test]
fn wrap_respects_display_width() {
    let spans = vec![Span::raw("aaaa bbbb cccc")];
    let rows = wrap_spans(spans, 5);
    let rendered: Vec<String> = rows
        .iter()
        .map(|row| row.iter().map(|s| s.content.as_ref()).collect())
        .collect();
    assert_eq!(rendered, vec!["aaaa ", "bbbb ", "cccc"]);
}

#[test]
fn sanitize_strips_terminal_escapes() {
    let cleaned = sanitize_reply_text("ok\u{1b}[31m red \u{1b}[0m\r\nnext\x07");
    assert_eq!(cleaned, "ok red \nnext");
}

#[test]
fn page_up_disables_autoscroll_and_bottom_restores_it() {
    let mut app = scripted_app(vec![]);
    for i in 0..40 {
        app.push_entry(EntryKind::System, format!("filler line {i}"));
    }
    app.update_viewport(60, 12);
    assert!(app.scroll_max() > 0);
    assert!(app.autoscroll);

    app.handle_key(key(KeyCode::PageUp));
    assert!(!app.autoscroll);
    let scrolled = app.scroll;
    assert!(scrolled < app.scroll_max());

    app.handle_key(key(KeyCode::PageDown));
    let max = app.scroll_max();
    while app.scroll < max && !app.autoscroll {
        app.handle_key(key(KeyCode::PageDown));
    }
    assert!(app.autoscroll);
}

#[test]
fn new_entries_follow_scroll_only_when_pinned() {
    let mut app = scripted_app(vec![]);
    for i in 0..40 {
        app.push_entry(EntryKind::System, format!("row {i}"));
    }
    app.update_viewport(60, 12);
    app.scroll_up(10);
    let held = app.scroll;

    app.push_entry(EntryKind::System, "late arrival");
    assert_eq!(app.scroll, held);

    app.scroll_down(u16::MAX);
    assert!(app.autoscroll);
    app.push_entry(EntryKind::System, "another");
    let max = app.scroll_max();
    assert_eq!(app.scroll, max);
}

#[test]
fn ctrl_c_quits() {
    let mut app = scripted_app(vec![]);
    app.handle_key(ctrl('c'));
    assert!(app.should_quit);
}

#[test]
fn shift_enter_inserts_newline() {
    let mut app = scripted_app(vec![]);
    app.insert_str("line one");
    app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
    app.insert_str("line two");
    assert_eq!(app.input, "line one\nline two");
    assert!(app.entries.len() == 3); // banner only, nothing submitted
}
