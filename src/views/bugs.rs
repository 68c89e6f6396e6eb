use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::components::detail::{BugDetail, RenderedDetail};
use crate::components::editor::{BugEditor, EditorBuildConfig, EditorField, RenderedEditor};
use crate::components::footer::{Footer, RenderedFooter};
use crate::components::table::{
    BUG_COLUMNS, Cell, RenderedTable, ScrollableTable, TableBuildConfig, bug_cells,
};
use crate::engine::{EngineHandle, Event, Request};
use crate::theme::ResolvedTheme;
use crate::types::{DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS, User};
use crate::workflow::{BugListController, Effect, Mode, SaveOutcome};

use super::default_theme;

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StatusLine {
    text: String,
    is_error: bool,
}

impl StatusLine {
    fn info(text: impl Into<String>) -> Option<Self> {
        Some(Self {
            text: text.into(),
            is_error: false,
        })
    }

    fn error(text: impl Into<String>) -> Option<Self> {
        Some(Self {
            text: text.into(),
            is_error: true,
        })
    }
}

// ---------------------------------------------------------------------------
// Shared view state
// ---------------------------------------------------------------------------

/// Handles to the view's state cells, shared by the event poller and the key
/// handler.
#[derive(Clone, Copy)]
struct ViewState {
    controller: State<BugListController>,
    cursor: State<usize>,
    focus: State<EditorField>,
    suggestion: State<usize>,
    status: State<Option<StatusLine>>,
    session_user: State<Option<User>>,
}

/// Sends engine requests whose replies come back on the view's channel.
#[derive(Clone)]
struct Dispatcher {
    engine: Option<EngineHandle>,
    reply_tx: Sender<Event>,
}

impl Dispatcher {
    fn send(&self, build: impl FnOnce(Sender<Event>) -> Request) {
        if let Some(engine) = &self.engine {
            engine.send(build(self.reply_tx.clone()));
        }
    }

    fn run(&self, effect: Effect) {
        match &effect {
            Effect::SubmitCreate { ticket, .. } => {
                tracing::debug!("bugs view: submitting new bug, ticket={ticket}");
            }
            Effect::SubmitUpdate { ticket, payload } => {
                tracing::debug!("bugs view: submitting bug #{}, ticket={ticket}", payload.id);
            }
            _ => {}
        }
        self.send(|reply_tx| Request::for_effect(effect, reply_tx));
    }

    fn run_all(&self, effects: Vec<Effect>) {
        for effect in effects {
            self.run(effect);
        }
    }
}

// ---------------------------------------------------------------------------
// BugsView component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct BugsViewProps<'a> {
    pub engine: Option<&'a EngineHandle>,
    pub theme: Option<&'a ResolvedTheme>,
    pub color_depth: ColorDepth,
    pub width: u16,
    pub height: u16,
    /// Fraction of the width given to the detail/editor pane.
    pub preview_width_pct: f64,
    pub date_format: Option<&'a str>,
    pub max_suggestions: usize,
    pub should_exit: Option<State<bool>>,
}

#[component]
#[allow(clippy::too_many_lines)]
pub fn BugsView<'a>(props: &BugsViewProps<'a>, mut hooks: Hooks) -> impl Into<AnyElement<'a>> {
    let theme = props.theme.cloned().unwrap_or_else(default_theme);
    let depth = props.color_depth;
    let date_format = props.date_format.unwrap_or("relative").to_owned();
    let should_exit = props.should_exit;
    let max_suggestions = props.max_suggestions.max(1);
    let preview_pct = if props.preview_width_pct > 0.0 && props.preview_width_pct < 1.0 {
        props.preview_width_pct
    } else {
        0.45
    };

    let st = ViewState {
        controller: hooks.use_state(BugListController::new),
        cursor: hooks.use_state(|| 0usize),
        focus: hooks.use_state(EditorField::default),
        suggestion: hooks.use_state(|| 0usize),
        status: hooks.use_state(|| Option::<StatusLine>::None),
        session_user: hooks.use_state(|| Option::<User>::None),
    };
    let mut scroll_offset = hooks.use_state(|| 0usize);
    let mut session_requested = hooks.use_state(|| false);

    // Event channel: engine pushes events back to UI.
    let event_channel = hooks.use_state(|| {
        let (tx, rx) = std::sync::mpsc::channel::<Event>();
        (tx, Arc::new(Mutex::new(rx)))
    });
    let (event_tx, event_rx) = event_channel.read().clone();
    let dispatcher = Dispatcher {
        engine: props.engine.cloned(),
        reply_tx: event_tx,
    };

    // Sign in once at mount; the bug list follows `SessionReady`.
    if !session_requested.get() && dispatcher.engine.is_some() {
        dispatcher.send(|reply_tx| Request::EnsureSession { reply_tx });
        session_requested.set(true);
    }

    // Event polling: drain events from engine reply channel.
    {
        let dispatcher = dispatcher.clone();
        hooks.use_future(async move {
            loop {
                smol::Timer::after(std::time::Duration::from_millis(100)).await;
                let events: Vec<Event> = match event_rx.lock() {
                    Ok(rx) => rx.try_iter().collect(),
                    Err(_) => return,
                };
                for evt in events {
                    apply_event(st, &dispatcher, evt);
                }
            }
        });
    }

    let total_rows = st.controller.read().store().len();
    // Header (2) + status line (1) + footer (2).
    let visible_rows = usize::from(props.height.saturating_sub(5)).max(1);

    hooks.use_terminal_events({
        move |event| match event {
            TerminalEvent::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) if kind != KeyEventKind::Release => {
                let editing = matches!(st.controller.read().mode(), Mode::Editing(_));
                if editing {
                    handle_edit_key(st, &dispatcher, code, modifiers, max_suggestions);
                } else {
                    handle_list_key(st, &dispatcher, code, total_rows, should_exit);
                }
            }
            _ => {}
        }
    });

    // Keep the cursor row inside the visible window.
    let cursor = st.cursor.get().min(total_rows.saturating_sub(1));
    let mut offset = scroll_offset.get().min(total_rows.saturating_sub(visible_rows));
    if cursor < offset {
        offset = cursor;
    } else if cursor >= offset + visible_rows {
        offset = cursor + 1 - visible_rows;
    }
    if offset != scroll_offset.get() {
        scroll_offset.set(offset);
    }

    let ctl = st.controller.read();
    let mode = ctl.mode();
    let pane_open = !matches!(mode, Mode::Browsing);
    let (table_width, pane_width) = if pane_open {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pane = (f64::from(props.width) * preview_pct).round() as u16;
        (props.width.saturating_sub(pane), pane)
    } else {
        (props.width, 0)
    };

    let rows: Vec<Vec<Cell>> = ctl
        .store()
        .bugs()
        .iter()
        .map(|b| bug_cells(b, &theme, &date_format))
        .collect();
    let empty_message = if ctl.store().loaded_at().is_some() {
        "No bugs yet. Press n to file one."
    } else {
        "Loading bugs\u{2026}"
    };
    let table = RenderedTable::build(&TableBuildConfig {
        columns: &BUG_COLUMNS,
        rows: &rows,
        cursor,
        scroll_offset: offset,
        visible_rows,
        total_width: table_width,
        depth,
        theme: &theme,
        empty_message: Some(empty_message),
    });

    let detail = match mode {
        Mode::Viewing(_) => ctl
            .focused_bug()
            .map(|bug| RenderedDetail::build(bug, &date_format, pane_width, &theme, depth)),
        _ => None,
    };
    let editor = RenderedEditor::build(&EditorBuildConfig {
        controller: &ctl,
        focus: st.focus.get(),
        suggestion: st.suggestion.get(),
        max_suggestions,
        width: pane_width,
        theme: &theme,
        depth,
    });

    let help_hint = match mode {
        Mode::Browsing => "Enter view  n new  r refresh  q quit",
        Mode::Viewing(_) => "j/k move  e edit  Esc close",
        Mode::Editing(_) => "Ctrl-S save  Esc cancel",
    };
    let user_name = st.session_user.read().as_ref().map(User::full_name);
    let footer = RenderedFooter::build(
        user_name.as_deref(),
        ctl.store().len(),
        ctl.store().loaded_at(),
        help_hint,
        &theme,
        depth,
    );
    drop(ctl);

    let (status_text, status_color) = match st.status.read().as_ref() {
        Some(s) if s.is_error => (s.text.clone(), theme.text_error),
        Some(s) => (s.text.clone(), theme.text_secondary),
        None => (String::new(), theme.text_secondary),
    };

    element! {
        View(
            width: u32::from(props.width),
            height: u32::from(props.height),
            flex_direction: FlexDirection::Column,
        ) {
            View(flex_grow: 1.0, flex_direction: FlexDirection::Row) {
                ScrollableTable(table: Some(table))
                BugDetail(detail)
                BugEditor(editor)
            }
            View(padding_left: 1, height: 1u32) {
                Text(
                    content: status_text,
                    color: status_color.to_crossterm_color(depth),
                    wrap: TextWrap::NoWrap,
                )
            }
            Footer(footer: Some(footer))
        }
    }
    .into_any()
}

// ---------------------------------------------------------------------------
// Engine events
// ---------------------------------------------------------------------------

fn apply_event(mut st: ViewState, dispatcher: &Dispatcher, evt: Event) {
    match evt {
        Event::SessionReady { user } => {
            let role = if user.is_admin() { " (admin)" } else { "" };
            st.status
                .set(StatusLine::info(format!("Signed in as {}{role}", user.full_name())));
            st.session_user.set(Some(user));
            dispatcher.send(|reply_tx| Request::FetchBugs { reply_tx });
            dispatcher.send(|notify_tx| Request::RegisterBugsRefresh { notify_tx });
        }
        Event::LoggedOut => {
            st.session_user.set(None);
            st.status.set(StatusLine::info("Signed out"));
        }
        Event::BugsFetched { bugs } => {
            let mut ctl = st.controller.write();
            ctl.on_bugs_loaded(bugs);
            let len = ctl.store().len();
            let viewed = match ctl.mode() {
                Mode::Viewing(id) => ctl.store().index_of(*id),
                _ => None,
            };
            drop(ctl);
            if let Some(idx) = viewed {
                st.cursor.set(idx);
            } else if st.cursor.get() >= len {
                st.cursor.set(len.saturating_sub(1));
            }
        }
        Event::PrioritiesFetched { priorities } => {
            st.controller.write().on_priorities_loaded(priorities);
        }
        Event::StatusesFetched { statuses } => {
            st.controller.write().on_statuses_loaded(statuses);
        }
        Event::UsersFetched { users } => {
            st.controller.write().on_users_loaded(users);
        }
        Event::ReferenceLoadFailed { kind, message } => {
            st.controller.write().on_reference_failed(kind);
            st.status.set(StatusLine::error(format!(
                "Could not load {}: {message}",
                kind.label()
            )));
        }
        Event::FetchError { context, message } => {
            st.status.set(StatusLine::error(format!("{context}: {message}")));
        }
        Event::BugSaved { ticket, bug } => {
            let outcome = st.controller.write().on_save_succeeded(ticket, bug);
            match outcome {
                SaveOutcome::Applied { bug_id } => {
                    let idx = st.controller.read().store().index_of(bug_id);
                    if let Some(idx) = idx {
                        st.cursor.set(idx);
                    }
                    st.focus.set(EditorField::default());
                    st.suggestion.set(0);
                    st.status.set(StatusLine::info(format!("Saved bug #{bug_id}")));
                }
                SaveOutcome::Reconciled { bug_id } => {
                    st.status
                        .set(StatusLine::info(format!("Bug #{bug_id} was saved")));
                }
                SaveOutcome::Dropped | SaveOutcome::Failed => {}
            }
        }
        Event::SaveFailed { ticket, message } => {
            let outcome = st.controller.write().on_save_failed(ticket, message.clone());
            if outcome == SaveOutcome::Failed {
                st.status.set(StatusLine::error(format!("Save failed: {message}")));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Keyboard: browsing & viewing
// ---------------------------------------------------------------------------

fn handle_list_key(
    mut st: ViewState,
    dispatcher: &Dispatcher,
    code: KeyCode,
    total_rows: usize,
    should_exit: Option<State<bool>>,
) {
    let viewing = matches!(st.controller.read().mode(), Mode::Viewing(_));
    let last = total_rows.saturating_sub(1);
    let current = st.cursor.get().min(last);

    match code {
        KeyCode::Char('j') | KeyCode::Down => move_cursor(st, (current + 1).min(last), viewing),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(st, current.saturating_sub(1), viewing),
        KeyCode::Char('g') | KeyCode::Home => move_cursor(st, 0, viewing),
        KeyCode::Char('G') | KeyCode::End => move_cursor(st, last, viewing),
        KeyCode::Enter if !viewing => {
            let id = st.controller.read().store().bugs().get(current).map(|b| b.id);
            if let Some(id) = id {
                let result = st.controller.write().select(id);
                report(st, result);
            }
        }
        KeyCode::Char('n') if !viewing => {
            let result = st.controller.write().begin_create();
            start_editing(st, dispatcher, result);
        }
        KeyCode::Char('e') if viewing => {
            let result = st.controller.write().begin_edit();
            start_editing(st, dispatcher, result);
        }
        KeyCode::Esc if viewing => {
            let result = st.controller.write().close();
            report(st, result);
        }
        KeyCode::Char('r') => {
            if st.session_user.read().is_some() {
                st.status.set(StatusLine::info("Refreshing\u{2026}"));
                dispatcher.send(|reply_tx| Request::FetchBugs { reply_tx });
                let reloads = st.controller.write().reload_references();
                match reloads {
                    Ok(effects) => dispatcher.run_all(effects),
                    Err(e) => st.status.set(StatusLine::error(e.to_string())),
                }
            } else {
                st.status.set(StatusLine::info("Signing in\u{2026}"));
                dispatcher.send(|reply_tx| Request::EnsureSession { reply_tx });
            }
        }
        KeyCode::Char('L') => {
            dispatcher.send(|reply_tx| Request::Logout { reply_tx });
        }
        KeyCode::Char('q') => {
            if let Some(mut exit) = should_exit {
                exit.set(true);
            }
        }
        _ => {}
    }
}

// While viewing, moving the cursor switches the viewed bug.
fn move_cursor(mut st: ViewState, index: usize, viewing: bool) {
    st.cursor.set(index);
    if viewing {
        let id = st.controller.read().store().bugs().get(index).map(|b| b.id);
        if let Some(id) = id {
            let result = st.controller.write().select(id);
            report(st, result);
        }
    }
}

fn start_editing(
    mut st: ViewState,
    dispatcher: &Dispatcher,
    result: Result<Vec<Effect>, crate::workflow::WorkflowError>,
) {
    match result {
        Ok(effects) => {
            st.focus.set(EditorField::default());
            st.suggestion.set(0);
            st.status.set(None);
            dispatcher.run_all(effects);
        }
        Err(e) => st.status.set(StatusLine::error(e.to_string())),
    }
}

fn report(mut st: ViewState, result: Result<(), crate::workflow::WorkflowError>) {
    match result {
        Ok(()) => st.status.set(None),
        Err(e) => st.status.set(StatusLine::error(e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Keyboard: editing
// ---------------------------------------------------------------------------

fn handle_edit_key(
    mut st: ViewState,
    dispatcher: &Dispatcher,
    code: KeyCode,
    modifiers: KeyModifiers,
    max_suggestions: usize,
) {
    let focus = st.focus.get();
    match code {
        KeyCode::Esc => {
            let result = st.controller.write().cancel();
            let origin = match st.controller.read().mode() {
                Mode::Viewing(id) => Some(*id),
                _ => None,
            };
            if let Some(idx) = origin.and_then(|id| st.controller.read().store().index_of(id)) {
                st.cursor.set(idx);
            }
            st.focus.set(EditorField::default());
            st.suggestion.set(0);
            report(st, result);
        }
        KeyCode::Char('s') if modifiers.contains(KeyModifiers::CONTROL) => {
            let creator = st.session_user.read().as_ref().map(|u| u.id);
            let result = st.controller.write().submit(creator);
            match result {
                Ok(effect) => {
                    st.status.set(None);
                    dispatcher.run(effect);
                }
                Err(e) => st.status.set(StatusLine::error(e.to_string())),
            }
        }
        KeyCode::Tab => {
            st.focus.set(focus.next());
            st.suggestion.set(0);
        }
        KeyCode::BackTab => {
            st.focus.set(focus.prev());
            st.suggestion.set(0);
        }
        KeyCode::Left | KeyCode::Right => {
            let forward = code == KeyCode::Right;
            let mut ctl = st.controller.write();
            match focus {
                EditorField::Priority => {
                    let active = ctl.priorities().to_vec();
                    if let Some(draft) = ctl.draft_mut() {
                        draft.cycle_priority(&active, forward);
                    }
                }
                EditorField::Status => {
                    let active = ctl.statuses().to_vec();
                    if let Some(draft) = ctl.draft_mut() {
                        draft.cycle_status(&active, forward);
                    }
                }
                _ => {}
            }
        }
        KeyCode::Up | KeyCode::Down if focus == EditorField::Assignee => {
            let count = st.controller.read().suggestions(max_suggestions).len();
            if count > 0 {
                let current = st.suggestion.get().min(count - 1);
                st.suggestion.set(if code == KeyCode::Down {
                    (current + 1).min(count - 1)
                } else {
                    current.saturating_sub(1)
                });
            }
        }
        KeyCode::Enter => match focus {
            EditorField::Assignee => {
                let mut ctl = st.controller.write();
                let picked = ctl
                    .suggestions(max_suggestions)
                    .get(st.suggestion.get())
                    .map(|c| c.user.clone());
                if let (Some(user), Some(draft)) = (picked, ctl.draft_mut()) {
                    draft.choose_assignee(&user);
                }
                drop(ctl);
                st.suggestion.set(0);
            }
            EditorField::Description => type_char(st, focus, '\n'),
            _ => st.focus.set(focus.next()),
        },
        KeyCode::Backspace => {
            let mut ctl = st.controller.write();
            if let Some(draft) = ctl.draft_mut() {
                match focus {
                    EditorField::Title => draft.pop_title_char(),
                    EditorField::Description => draft.pop_description_char(),
                    EditorField::Assignee => draft.pop_assignee_char(),
                    EditorField::Priority => draft.set_priority(None),
                    EditorField::Status => draft.set_status(None),
                }
            }
            drop(ctl);
            st.suggestion.set(0);
        }
        KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
            type_char(st, focus, ch);
        }
        _ => {}
    }
}

fn type_char(mut st: ViewState, focus: EditorField, ch: char) {
    let mut ctl = st.controller.write();
    let Some(draft) = ctl.draft_mut() else {
        return;
    };
    let accepted = match focus {
        EditorField::Title => draft.push_title_char(ch),
        EditorField::Description => draft.push_description_char(ch),
        EditorField::Assignee => {
            draft.push_assignee_char(ch);
            true
        }
        EditorField::Priority | EditorField::Status => true,
    };
    drop(ctl);
    st.suggestion.set(0);
    if !accepted {
        let max = if focus == EditorField::Title {
            TITLE_MAX_CHARS
        } else {
            DESCRIPTION_MAX_CHARS
        };
        st.status.set(StatusLine::error(format!(
            "{} is limited to {max} characters",
            focus.label()
        )));
    }
}
