use tokio::sync::mpsc::UnboundedReceiver;

use crate::types::{Bug, CreateBugPayload, Priority, ReferenceKind, Status, UpdateBugPayload, User};

use super::interface::{Engine, EngineHandle, Event, Request};

/// A stub engine that serves pre-loaded fixture data without any network calls.
///
/// Useful for integration tests and UI demos that must not require a running
/// tracker. Saves are applied to the fixture list and echoed back.
#[derive(Default)]
pub struct StubEngine {
    pub bugs: Vec<Bug>,
    pub priorities: Vec<Priority>,
    pub statuses: Vec<Status>,
    pub users: Vec<User>,
    /// The user `EnsureSession` reports; `None` makes login fail.
    pub session_user: Option<User>,
    /// When set, every save answers `SaveFailed` with this message.
    pub fail_saves: Option<String>,
    /// Reference collections that answer `ReferenceLoadFailed`.
    pub failing_references: Vec<ReferenceKind>,
}

impl Engine for StubEngine {
    fn start(self) -> EngineHandle {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Request>();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("stub tokio runtime");
            rt.block_on(self.run_loop(rx));
        });
        EngineHandle::new(tx)
    }
}

impl StubEngine {
    async fn run_loop(mut self, mut rx: UnboundedReceiver<Request>) {
        while let Some(req) = rx.recv().await {
            match req {
                Request::EnsureSession { reply_tx } => {
                    let event = match &self.session_user {
                        Some(user) => Event::SessionReady { user: user.clone() },
                        None => Event::FetchError {
                            context: "Login".into(),
                            message: "Invalid credentials".into(),
                        },
                    };
                    let _ = reply_tx.send(event);
                }
                Request::Logout { reply_tx } => {
                    let _ = reply_tx.send(Event::LoggedOut);
                }
                Request::FetchBugs { reply_tx } => {
                    let _ = reply_tx.send(Event::BugsFetched {
                        bugs: self.bugs.clone(),
                    });
                }
                Request::FetchActivePriorities { reply_tx, .. } => {
                    let event = self.reference_event(ReferenceKind::Priorities).unwrap_or_else(|| {
                        Event::PrioritiesFetched {
                            priorities: self
                                .priorities
                                .iter()
                                .filter(|p| p.status.is_active())
                                .cloned()
                                .collect(),
                        }
                    });
                    let _ = reply_tx.send(event);
                }
                Request::FetchActiveStatuses { reply_tx, .. } => {
                    let event = self.reference_event(ReferenceKind::Statuses).unwrap_or_else(|| {
                        Event::StatusesFetched {
                            statuses: self
                                .statuses
                                .iter()
                                .filter(|s| s.status.is_active())
                                .cloned()
                                .collect(),
                        }
                    });
                    let _ = reply_tx.send(event);
                }
                Request::FetchActiveUsers { reply_tx, .. } => {
                    let event = self.reference_event(ReferenceKind::Users).unwrap_or_else(|| {
                        Event::UsersFetched {
                            users: self
                                .users
                                .iter()
                                .filter(|u| u.status.is_active())
                                .cloned()
                                .collect(),
                        }
                    });
                    let _ = reply_tx.send(event);
                }

                // Refresh registration is ignored by the stub
                Request::RegisterBugsRefresh { .. } => {}

                Request::CreateBug {
                    ticket,
                    payload,
                    reply_tx,
                } => {
                    let event = match self.fail_saves.clone() {
                        Some(message) => Event::SaveFailed { ticket, message },
                        None => Event::BugSaved {
                            ticket,
                            bug: self.apply_create(&payload),
                        },
                    };
                    let _ = reply_tx.send(event);
                }
                Request::UpdateBug {
                    ticket,
                    payload,
                    reply_tx,
                } => {
                    let event = if let Some(message) = self.fail_saves.clone() {
                        Event::SaveFailed { ticket, message }
                    } else if let Some(bug) = self.apply_update(&payload) {
                        Event::BugSaved { ticket, bug }
                    } else {
                        Event::SaveFailed {
                            ticket,
                            message: format!("Bug #{} not found", payload.id),
                        }
                    };
                    let _ = reply_tx.send(event);
                }

                Request::Shutdown => break,
            }
        }
    }

    fn reference_event(&self, kind: ReferenceKind) -> Option<Event> {
        self.failing_references.contains(&kind).then(|| Event::ReferenceLoadFailed {
            kind,
            message: "HTTP 500 Internal Server Error".into(),
        })
    }

    fn apply_create(&mut self, payload: &CreateBugPayload) -> Bug {
        let id = self.bugs.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        let bug = Bug {
            id,
            title: payload.title.clone(),
            description: payload.description.clone(),
            priority: self.priority(payload.priority_id),
            status: self.status(payload.status_id),
            assignee: self.user(payload.assignee_id),
            created_by: self.user(payload.created_by_user_id),
            created_at: Some(chrono::Local::now().naive_local()),
        };
        self.bugs.push(bug.clone());
        bug
    }

    // Fails (before touching anything) when the bug is unknown.
    fn apply_update(&mut self, payload: &UpdateBugPayload) -> Option<Bug> {
        let priority = self.priority(payload.priority_id);
        let status = self.status(payload.status_id);
        let assignee = self.user(payload.assignee_id);
        let bug = self.bugs.iter_mut().find(|b| b.id == payload.id)?;
        bug.title.clone_from(&payload.title);
        bug.description.clone_from(&payload.description);
        bug.priority = priority;
        bug.status = status;
        bug.assignee = assignee;
        Some(bug.clone())
    }

    fn priority(&self, id: Option<i64>) -> Option<Priority> {
        id.and_then(|id| self.priorities.iter().find(|p| p.id == id).cloned())
    }

    fn status(&self, id: Option<i64>) -> Option<Status> {
        id.and_then(|id| self.statuses.iter().find(|s| s.id == id).cloned())
    }

    fn user(&self, id: Option<i64>) -> Option<User> {
        id.and_then(|id| self.users.iter().find(|u| u.id == id).cloned())
    }
}
