use std::sync::mpsc::Sender;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::api::{self, ApiError, TrackerClient, bugs, reference, session};
use crate::config::types::AppConfig;
use crate::types::ReferenceKind;

use super::interface::{Engine, EngineHandle, Event, Request};
use super::refresh::RefreshScheduler;

/// The real engine, talking to the tracker over HTTP.
pub struct TrackerEngine {
    config: AppConfig,
    client: TrackerClient,
}

impl TrackerEngine {
    pub fn new(config: AppConfig) -> Result<Self, ApiError> {
        let client = TrackerClient::new(&config.server, config.defaults.reference_cache_minutes)?;
        Ok(Self { config, client })
    }
}

impl Engine for TrackerEngine {
    fn start(self) -> EngineHandle {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Request>();
        let handle = EngineHandle::new(tx);
        let _ = std::thread::Builder::new()
            .name("bugdesk-engine".to_owned())
            .spawn(move || {
                let rt = tokio::runtime::Runtime::new().expect("tokio runtime init");
                rt.block_on(self.run_loop(rx));
            });
        handle
    }
}

impl TrackerEngine {
    async fn run_loop(self, mut rx: UnboundedReceiver<Request>) {
        let Self { config, client } = self;
        let mut scheduler = RefreshScheduler::new();

        let interval_mins = u64::from(config.defaults.refetch_interval_minutes);
        let tick_dur = Duration::from_secs((interval_mins * 60).max(60));
        let mut refresh_tick = tokio::time::interval(tick_dur);
        // Consume the first immediate tick so refresh fires after one full interval.
        refresh_tick.tick().await;

        loop {
            tokio::select! {
                biased;
                maybe_req = rx.recv() => {
                    match maybe_req {
                        None | Some(Request::Shutdown) => {
                            tracing::debug!("engine: shutting down");
                            break;
                        }
                        Some(req) => {
                            handle_request(req, &config, &client, &mut scheduler).await;
                        }
                    }
                }
                _ = refresh_tick.tick() => {
                    tick_refresh(&client, &mut scheduler).await;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Request dispatch
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_lines)]
async fn handle_request(
    req: Request,
    config: &AppConfig,
    client: &TrackerClient,
    scheduler: &mut RefreshScheduler,
) {
    match req {
        // --- Session ---
        Request::EnsureSession { reply_tx } => {
            tracing::debug!("engine: EnsureSession");
            let credentials = match api::resolve_credentials(&config.server) {
                Ok(c) => c,
                Err(e) => {
                    let _ = reply_tx.send(Event::FetchError {
                        context: "Login".to_owned(),
                        message: format!("{e:#}"),
                    });
                    return;
                }
            };
            match session::establish(client, &credentials).await {
                Ok(user) => {
                    tracing::debug!("engine: session ready for user #{}", user.id);
                    let _ = reply_tx.send(Event::SessionReady { user });
                }
                Err(e) => send_fetch_error(&reply_tx, "Login", &e),
            }
        }

        Request::Logout { reply_tx } => {
            tracing::debug!("engine: Logout");
            match session::logout(client).await {
                Ok(()) => {
                    let _ = reply_tx.send(Event::LoggedOut);
                }
                Err(e) => send_fetch_error(&reply_tx, "Logout", &e),
            }
        }

        // --- Fetch bugs ---
        Request::FetchBugs { reply_tx } => {
            tracing::debug!("engine: FetchBugs");
            match bugs::list_bugs(client).await {
                Ok(bugs) => {
                    scheduler.mark_fetched();
                    tracing::debug!("engine: sending BugsFetched count={}", bugs.len());
                    let _ = reply_tx.send(Event::BugsFetched { bugs });
                }
                Err(e) => send_fetch_error(&reply_tx, "FetchBugs", &e),
            }
        }

        // --- Reference data ---
        Request::FetchActivePriorities { force, reply_tx } => {
            tracing::debug!("engine: FetchActivePriorities force={force}");
            match reference::fetch_active_priorities(client, force).await {
                Ok(priorities) => {
                    let _ = reply_tx.send(Event::PrioritiesFetched { priorities });
                }
                Err(e) => send_reference_error(&reply_tx, ReferenceKind::Priorities, &e),
            }
        }
        Request::FetchActiveStatuses { force, reply_tx } => {
            tracing::debug!("engine: FetchActiveStatuses force={force}");
            match reference::fetch_active_statuses(client, force).await {
                Ok(statuses) => {
                    let _ = reply_tx.send(Event::StatusesFetched { statuses });
                }
                Err(e) => send_reference_error(&reply_tx, ReferenceKind::Statuses, &e),
            }
        }
        Request::FetchActiveUsers { force, reply_tx } => {
            tracing::debug!("engine: FetchActiveUsers force={force}");
            match reference::fetch_active_users(client, force).await {
                Ok(users) => {
                    let _ = reply_tx.send(Event::UsersFetched { users });
                }
                Err(e) => send_reference_error(&reply_tx, ReferenceKind::Users, &e),
            }
        }

        // --- Refresh registration ---
        Request::RegisterBugsRefresh { notify_tx } => {
            let mins = u64::from(config.defaults.refetch_interval_minutes);
            scheduler.register(Duration::from_secs(mins * 60), &notify_tx);
        }

        // --- Mutations ---
        Request::CreateBug {
            ticket,
            payload,
            reply_tx,
        } => {
            tracing::debug!("engine: CreateBug ticket={ticket}");
            let result = bugs::create_bug(client, &payload).await;
            send_save_result(&reply_tx, ticket, result);
        }
        Request::UpdateBug {
            ticket,
            payload,
            reply_tx,
        } => {
            tracing::debug!("engine: UpdateBug #{} ticket={ticket}", payload.id);
            let result = bugs::update_bug(client, &payload).await;
            send_save_result(&reply_tx, ticket, result);
        }

        Request::Shutdown => {}
    }
}

// ---------------------------------------------------------------------------
// Background refresh
// ---------------------------------------------------------------------------

async fn tick_refresh(client: &TrackerClient, scheduler: &mut RefreshScheduler) {
    let Some(notify_tx) = scheduler.due() else {
        return;
    };
    tracing::debug!("engine: background refresh of bug list");
    match bugs::list_bugs(client).await {
        Ok(bugs) => {
            scheduler.mark_fetched();
            let _ = notify_tx.send(Event::BugsFetched { bugs });
        }
        Err(e) => {
            // Retry after a full interval.
            scheduler.mark_fetched();
            send_fetch_error(&notify_tx, "RefreshBugs", &e);
        }
    }
}

// ---------------------------------------------------------------------------
// Reply helpers
// ---------------------------------------------------------------------------

fn send_fetch_error(reply_tx: &Sender<Event>, context: &str, e: &ApiError) {
    tracing::debug!("engine: {context} error: {e}");
    let _ = reply_tx.send(Event::FetchError {
        context: context.to_owned(),
        message: e.to_string(),
    });
}

fn send_reference_error(reply_tx: &Sender<Event>, kind: ReferenceKind, e: &ApiError) {
    tracing::error!("failed to load active {}: {e}", kind.label());
    let _ = reply_tx.send(Event::ReferenceLoadFailed {
        kind,
        message: e.to_string(),
    });
}

fn send_save_result(
    reply_tx: &Sender<Event>,
    ticket: u64,
    result: Result<crate::types::Bug, ApiError>,
) {
    let event = match result {
        Ok(bug) => {
            tracing::debug!("engine: saved bug #{} ticket={ticket}", bug.id);
            Event::BugSaved { ticket, bug }
        }
        Err(e) => {
            tracing::debug!("engine: save ticket={ticket} failed: {e}");
            Event::SaveFailed {
                ticket,
                message: e.to_string(),
            }
        }
    };
    let _ = reply_tx.send(event);
}
