//! CLI, backend client, OAuth callback handling, event fetching
//!
//! This crate provides the `calbridge` command-line interface.

pub mod actions;
pub mod api;
pub mod callback;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod login;
pub mod session;

pub use api::BackendClient;
pub use callback::{CallbackFailure, CallbackHandler, CallbackParams, CallbackState, ExchangedCodes};
pub use cli::Cli;
pub use error::{ClientError, ClientResult};
pub use fetcher::{EventFetcher, SharedStore};
pub use login::{LoginInitiator, LoginOutcome};
pub use session::{Notice, Session, SessionCommand, SessionOptions};
