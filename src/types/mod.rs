// Shared domain types, used by the API client, the engine and the UI layer.
// None of those layers depends on another for these; all import from here.

pub mod bug;
pub mod common;
pub mod reference;

pub use bug::*;
pub use common::*;
pub use reference::*;
