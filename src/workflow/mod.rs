// workflow module: bug list / view / edit state, independent of UI and I/O

pub mod controller;
pub mod draft;
pub mod matcher;
pub mod store;

use thiserror::Error;

pub use controller::{BugListController, Effect, EditSession, Mode, SaveOutcome, SaveState};
pub use draft::{Assignee, EditDraft, ReferenceSnapshot};
pub use matcher::{AssigneeMatcher, Candidate};
pub use store::{BugStore, Upsert};

/// Client-side rejection of a workflow operation. Nothing here has touched
/// the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("title is required")]
    EmptyTitle,
    #[error("title is longer than {max} characters")]
    TitleTooLong { max: usize },
    #[error("description is longer than {max} characters")]
    DescriptionTooLong { max: usize },
    #[error("priority #{0} can no longer be assigned")]
    InvalidPriority(i64),
    #[error("status #{0} can no longer be assigned")]
    InvalidStatus(i64),
    #[error("a save is already in progress")]
    SaveInFlight,
    #[error("bug #{0} is not loaded")]
    UnknownBug(i64),
    #[error("cannot {action} while {mode}")]
    InvalidTransition {
        action: &'static str,
        mode: &'static str,
    },
}
