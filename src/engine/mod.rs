// engine module: tracker backend engine

mod interface;
mod refresh;
pub mod stub;
pub mod tracker;

pub use interface::{Engine, EngineHandle, Event, Request};
pub use refresh::RefreshScheduler;
pub use stub::StubEngine;
pub use tracker::TrackerEngine;
