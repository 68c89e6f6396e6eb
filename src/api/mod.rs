// api module: tracker REST client

pub mod auth;
pub mod bugs;
pub mod client;
mod error;
pub mod reference;
pub mod session;

pub use auth::{Credentials, resolve_credentials};
pub use client::TrackerClient;
pub use error::ApiError;
