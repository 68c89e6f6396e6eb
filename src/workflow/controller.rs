use std::collections::{HashMap, HashSet};

use crate::types::{
    Bug, CreateBugPayload, Priority, ReferenceKind, Status, UpdateBugPayload, User,
};

use super::WorkflowError;
use super::draft::{EditDraft, ReferenceSnapshot};
use super::matcher::{AssigneeMatcher, Candidate};
use super::store::BugStore;

// ---------------------------------------------------------------------------
// Modes & effects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    /// A submission with this ticket is awaiting the server.
    InFlight(u64),
}

/// The open editor: which bug it edits (`None` when creating) and the draft.
#[derive(Debug, Clone)]
pub struct EditSession {
    origin: Option<i64>,
    draft: EditDraft,
    save: SaveState,
    error: Option<String>,
}

impl EditSession {
    pub fn origin(&self) -> Option<i64> {
        self.origin
    }

    pub fn draft(&self) -> &EditDraft {
        &self.draft
    }

    pub fn save_state(&self) -> SaveState {
        self.save
    }

    pub fn is_saving(&self) -> bool {
        matches!(self.save, SaveState::InFlight(_))
    }

    /// Last validation or server error, cleared on the next submit.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Debug, Clone)]
pub enum Mode {
    Browsing,
    Viewing(i64),
    Editing(EditSession),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Browsing => "browsing",
            Self::Viewing(_) => "viewing a bug",
            Self::Editing(_) => "editing",
        }
    }
}

/// Work a transition asks the caller to perform. Transitions themselves never
/// do I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch a reference collection; `force` skips the response cache.
    LoadPriorities { force: bool },
    LoadStatuses { force: bool },
    LoadUsers { force: bool },
    SubmitCreate {
        ticket: u64,
        payload: CreateBugPayload,
    },
    SubmitUpdate {
        ticket: u64,
        payload: UpdateBugPayload,
    },
}

impl Effect {
    fn load(kind: ReferenceKind, force: bool) -> Self {
        match kind {
            ReferenceKind::Priorities => Self::LoadPriorities { force },
            ReferenceKind::Statuses => Self::LoadStatuses { force },
            ReferenceKind::Users => Self::LoadUsers { force },
        }
    }
}

/// What happened to a save completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The editor that issued the save was still open; it has closed.
    Applied { bug_id: i64 },
    /// The editor had been closed; only the store was updated.
    Reconciled { bug_id: i64 },
    /// Nothing was waiting for this completion.
    Dropped,
    /// The open editor's save failed; the draft is untouched.
    Failed,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Drives the browse / view / edit workflow over a [`BugStore`].
///
/// Reference collections are cached once loaded, until
/// [`reload_references`](Self::reload_references) drops them. A failed load
/// leaves the slot empty so the next editor open asks again.
///
/// At most one save is in flight at a time, and a bug with a pending save
/// cannot be reopened for editing until the server answers.
pub struct BugListController {
    store: BugStore,
    mode: Mode,
    priorities: Option<Vec<Priority>>,
    statuses: Option<Vec<Status>>,
    users: Option<AssigneeMatcher>,
    loading: HashSet<ReferenceKind>,
    next_ticket: u64,
    /// Submitted tickets awaiting the server, with the bug each one updates.
    outstanding: HashMap<u64, Option<i64>>,
}

impl Default for BugListController {
    fn default() -> Self {
        Self::new()
    }
}

impl BugListController {
    pub fn new() -> Self {
        Self {
            store: BugStore::new(),
            mode: Mode::Browsing,
            priorities: None,
            statuses: None,
            users: None,
            loading: HashSet::new(),
            next_ticket: 1,
            outstanding: HashMap::new(),
        }
    }

    // --- read access ---

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn store(&self) -> &BugStore {
        &self.store
    }

    /// The bug being viewed, or the one being edited.
    pub fn focused_bug(&self) -> Option<&Bug> {
        match &self.mode {
            Mode::Viewing(id) => self.store.get(*id),
            Mode::Editing(session) => session.origin.and_then(|id| self.store.get(id)),
            Mode::Browsing => None,
        }
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        match &self.mode {
            Mode::Editing(session) => Some(session),
            _ => None,
        }
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        self.edit_session().map(EditSession::draft)
    }

    /// Mutable access to the open draft. Refused while a save is in flight.
    pub fn draft_mut(&mut self) -> Option<&mut EditDraft> {
        match &mut self.mode {
            Mode::Editing(session) if !session.is_saving() => Some(&mut session.draft),
            _ => None,
        }
    }

    pub fn is_saving(&self) -> bool {
        self.edit_session().is_some_and(EditSession::is_saving)
    }

    fn save_pending_for(&self, id: i64) -> bool {
        self.outstanding.values().any(|origin| *origin == Some(id))
    }

    pub fn priorities(&self) -> &[Priority] {
        self.priorities.as_deref().unwrap_or_default()
    }

    pub fn statuses(&self) -> &[Status] {
        self.statuses.as_deref().unwrap_or_default()
    }

    pub fn users(&self) -> Option<&AssigneeMatcher> {
        self.users.as_ref()
    }

    pub fn is_cached(&self, kind: ReferenceKind) -> bool {
        match kind {
            ReferenceKind::Priorities => self.priorities.is_some(),
            ReferenceKind::Statuses => self.statuses.is_some(),
            ReferenceKind::Users => self.users.is_some(),
        }
    }

    pub fn is_loading(&self, kind: ReferenceKind) -> bool {
        self.loading.contains(&kind)
    }

    /// Assignee suggestions for the text currently in the draft.
    pub fn suggestions(&self, limit: usize) -> Vec<Candidate<'_>> {
        let (Some(matcher), Some(draft)) = (self.users.as_ref(), self.draft()) else {
            return Vec::new();
        };
        if draft.assignee().is_linked() {
            return Vec::new();
        }
        let mut hits = matcher.search(&draft.assignee().display_name);
        hits.truncate(limit);
        hits
    }

    // --- transitions ---

    /// `Browsing → Viewing(id)`. Also switches the viewed bug.
    pub fn select(&mut self, id: i64) -> Result<(), WorkflowError> {
        if let Mode::Editing(_) = self.mode {
            return Err(self.invalid("select a bug"));
        }
        if self.store.get(id).is_none() {
            return Err(WorkflowError::UnknownBug(id));
        }
        self.mode = Mode::Viewing(id);
        Ok(())
    }

    /// `Viewing → Browsing`.
    pub fn close(&mut self) -> Result<(), WorkflowError> {
        match self.mode {
            Mode::Viewing(_) => {
                self.mode = Mode::Browsing;
                Ok(())
            }
            _ => Err(self.invalid("close the detail pane")),
        }
    }

    /// `Viewing(b) → Editing(b)` with a draft copied from `b`.
    pub fn begin_edit(&mut self) -> Result<Vec<Effect>, WorkflowError> {
        let Mode::Viewing(id) = self.mode else {
            return Err(self.invalid("edit"));
        };
        if self.save_pending_for(id) {
            return Err(WorkflowError::SaveInFlight);
        }
        let bug = self.store.get(id).ok_or(WorkflowError::UnknownBug(id))?;
        let draft = EditDraft::init_from_bug(bug);
        self.mode = Mode::Editing(EditSession {
            origin: Some(id),
            draft,
            save: SaveState::Idle,
            error: None,
        });
        Ok(self.reference_effects())
    }

    /// `Browsing → Editing(none)` with an empty draft.
    pub fn begin_create(&mut self) -> Result<Vec<Effect>, WorkflowError> {
        if !matches!(self.mode, Mode::Browsing) {
            return Err(self.invalid("create a bug"));
        }
        self.mode = Mode::Editing(EditSession {
            origin: None,
            draft: EditDraft::init_empty(),
            save: SaveState::Idle,
            error: None,
        });
        Ok(self.reference_effects())
    }

    /// Discard the draft and go back to where editing started.
    ///
    /// Allowed while a save is in flight; its completion is then ignored
    /// apart from updating the store.
    pub fn cancel(&mut self) -> Result<(), WorkflowError> {
        let Mode::Editing(session) = &self.mode else {
            return Err(self.invalid("cancel"));
        };
        self.mode = match session.origin {
            Some(id) if self.store.get(id).is_some() => Mode::Viewing(id),
            _ => Mode::Browsing,
        };
        Ok(())
    }

    /// Validate the draft and hand back the request to send.
    ///
    /// `creator_id` is the signed-in user, recorded on new bugs.
    pub fn submit(&mut self, creator_id: Option<i64>) -> Result<Effect, WorkflowError> {
        let ticket = self.next_ticket;
        let refs = ReferenceSnapshot {
            priorities: self.priorities.as_deref().unwrap_or_default(),
            statuses: self.statuses.as_deref().unwrap_or_default(),
        };
        let mode_name = self.mode.name();
        let Mode::Editing(session) = &mut self.mode else {
            return Err(WorkflowError::InvalidTransition {
                action: "save",
                mode: mode_name,
            });
        };
        if !self.outstanding.is_empty() {
            return Err(WorkflowError::SaveInFlight);
        }
        if let Err(e) = session.draft.validate(&refs) {
            session.error = Some(e.to_string());
            return Err(e);
        }

        let origin = session.origin;
        let effect = match origin {
            Some(id) => Effect::SubmitUpdate {
                ticket,
                payload: session.draft.to_update_payload(id),
            },
            None => Effect::SubmitCreate {
                ticket,
                payload: session.draft.to_create_payload(creator_id),
            },
        };
        session.save = SaveState::InFlight(ticket);
        session.error = None;
        self.next_ticket += 1;
        self.outstanding.insert(ticket, origin);
        Ok(effect)
    }

    // --- completions ---

    /// The server stored a bug for `ticket`.
    pub fn on_save_succeeded(&mut self, ticket: u64, bug: Bug) -> SaveOutcome {
        if self.outstanding.remove(&ticket).is_none() {
            tracing::debug!("workflow: dropping save result for unknown ticket {ticket}");
            return SaveOutcome::Dropped;
        }
        let bug_id = bug.id;
        self.store.upsert(bug);

        match &self.mode {
            Mode::Editing(session) if session.save == SaveState::InFlight(ticket) => {
                self.mode = Mode::Browsing;
                SaveOutcome::Applied { bug_id }
            }
            _ => {
                tracing::debug!("workflow: late save for bug #{bug_id}; store updated only");
                SaveOutcome::Reconciled { bug_id }
            }
        }
    }

    /// The save for `ticket` failed with `message`.
    pub fn on_save_failed(&mut self, ticket: u64, message: String) -> SaveOutcome {
        self.outstanding.remove(&ticket);
        match &mut self.mode {
            Mode::Editing(session) if session.save == SaveState::InFlight(ticket) => {
                session.save = SaveState::Idle;
                session.error = Some(message);
                SaveOutcome::Failed
            }
            _ => {
                tracing::debug!("workflow: dropping late save failure for ticket {ticket}");
                SaveOutcome::Dropped
            }
        }
    }

    /// A full bug listing arrived.
    pub fn on_bugs_loaded(&mut self, bugs: Vec<Bug>) {
        self.store.replace_all(bugs);
        if let Mode::Viewing(id) = self.mode
            && self.store.get(id).is_none()
        {
            self.mode = Mode::Browsing;
        }
    }

    pub fn on_priorities_loaded(&mut self, priorities: Vec<Priority>) {
        self.loading.remove(&ReferenceKind::Priorities);
        self.priorities = Some(priorities);
    }

    pub fn on_statuses_loaded(&mut self, statuses: Vec<Status>) {
        self.loading.remove(&ReferenceKind::Statuses);
        self.statuses = Some(statuses);
    }

    pub fn on_users_loaded(&mut self, users: Vec<User>) {
        self.loading.remove(&ReferenceKind::Users);
        self.users = Some(AssigneeMatcher::new(users));
    }

    /// A reference load failed. The slot stays empty and is retried the next
    /// time an editor opens.
    pub fn on_reference_failed(&mut self, kind: ReferenceKind) {
        self.loading.remove(&kind);
    }

    /// Drop every cached reference collection and ask the server again,
    /// bypassing the response cache. Collections never loaded are left for
    /// the next editor open.
    pub fn reload_references(&mut self) -> Result<Vec<Effect>, WorkflowError> {
        if let Mode::Editing(_) = self.mode {
            return Err(self.invalid("reload reference data"));
        }
        let mut effects = Vec::new();
        for kind in ReferenceKind::ALL {
            if !self.is_cached(kind) || self.loading.contains(&kind) {
                continue;
            }
            match kind {
                ReferenceKind::Priorities => self.priorities = None,
                ReferenceKind::Statuses => self.statuses = None,
                ReferenceKind::Users => self.users = None,
            }
            self.loading.insert(kind);
            effects.push(Effect::load(kind, true));
        }
        Ok(effects)
    }

    // --- helpers ---

    fn reference_effects(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        for kind in ReferenceKind::ALL {
            if self.is_cached(kind) || self.loading.contains(&kind) {
                continue;
            }
            self.loading.insert(kind);
            effects.push(Effect::load(kind, false));
        }
        effects
    }

    fn invalid(&self, action: &'static str) -> WorkflowError {
        WorkflowError::InvalidTransition {
            action,
            mode: self.mode.name(),
        }
    }
}
