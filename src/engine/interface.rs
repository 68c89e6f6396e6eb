use std::sync::mpsc::Sender;

use crate::types::{Bug, CreateBugPayload, Priority, ReferenceKind, Status, UpdateBugPayload, User};
use crate::workflow::Effect;

/// Handle to the backend engine held by the UI layer.
///
/// Cheaply cloneable. When the last handle is dropped the sender channel
/// closes, signalling the engine to shut down.
#[derive(Clone)]
pub struct EngineHandle {
    tx: tokio::sync::mpsc::UnboundedSender<Request>,
}

impl EngineHandle {
    pub(super) fn new(tx: tokio::sync::mpsc::UnboundedSender<Request>) -> Self {
        Self { tx }
    }

    /// Send a request to the engine. Non-blocking.
    pub fn send(&self, req: Request) {
        // Ignore errors: if the receiver is gone the engine has already shut down.
        let _ = self.tx.send(req);
    }
}

/// Trait implemented by both `TrackerEngine` and `StubEngine`.
pub trait Engine: Send + 'static {
    fn start(self) -> EngineHandle;
}

/// All operations the UI layer can send to the engine.
pub enum Request {
    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------
    /// Log in (or adopt the configured session cookie) and report the user.
    EnsureSession {
        reply_tx: Sender<Event>,
    },
    Logout {
        reply_tx: Sender<Event>,
    },

    // -----------------------------------------------------------------------
    // Fetch operations (UI pulls data on demand)
    // -----------------------------------------------------------------------
    FetchBugs {
        reply_tx: Sender<Event>,
    },
    FetchActivePriorities {
        /// Skip the moka cache and fetch fresh data from the server.
        force: bool,
        reply_tx: Sender<Event>,
    },
    FetchActiveStatuses {
        force: bool,
        reply_tx: Sender<Event>,
    },
    FetchActiveUsers {
        force: bool,
        reply_tx: Sender<Event>,
    },

    // -----------------------------------------------------------------------
    // Background refresh registration
    // -----------------------------------------------------------------------
    RegisterBugsRefresh {
        notify_tx: Sender<Event>,
    },

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------
    CreateBug {
        ticket: u64,
        payload: CreateBugPayload,
        reply_tx: Sender<Event>,
    },
    UpdateBug {
        ticket: u64,
        payload: UpdateBugPayload,
        reply_tx: Sender<Event>,
    },

    // -----------------------------------------------------------------------
    // Control
    // -----------------------------------------------------------------------
    Shutdown,
}

impl Request {
    /// The request that carries out a controller effect, replying on `reply_tx`.
    pub fn for_effect(effect: Effect, reply_tx: Sender<Event>) -> Self {
        match effect {
            Effect::LoadPriorities { force } => Self::FetchActivePriorities { force, reply_tx },
            Effect::LoadStatuses { force } => Self::FetchActiveStatuses { force, reply_tx },
            Effect::LoadUsers { force } => Self::FetchActiveUsers { force, reply_tx },
            Effect::SubmitCreate { ticket, payload } => Self::CreateBug {
                ticket,
                payload,
                reply_tx,
            },
            Effect::SubmitUpdate { ticket, payload } => Self::UpdateBug {
                ticket,
                payload,
                reply_tx,
            },
        }
    }
}

/// All events the engine can push back to the UI.
#[derive(Debug)]
pub enum Event {
    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------
    SessionReady {
        user: User,
    },
    LoggedOut,

    // -----------------------------------------------------------------------
    // Fetch results
    // -----------------------------------------------------------------------
    BugsFetched {
        bugs: Vec<Bug>,
    },
    PrioritiesFetched {
        priorities: Vec<Priority>,
    },
    StatusesFetched {
        statuses: Vec<Status>,
    },
    UsersFetched {
        users: Vec<User>,
    },
    /// A reference collection could not be loaded.
    ReferenceLoadFailed {
        kind: ReferenceKind,
        message: String,
    },
    /// Unified error event for failed fetches and session calls.
    FetchError {
        context: String,
        message: String,
    },

    // -----------------------------------------------------------------------
    // Mutation results
    // -----------------------------------------------------------------------
    BugSaved {
        ticket: u64,
        bug: Bug,
    },
    SaveFailed {
        ticket: u64,
        message: String,
    },
}
