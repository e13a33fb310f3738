//! Command-line client library for the Churchen idea API
//!
//! This library provides functionality for submitting ideas to the Churchen
//! backend, publishing them, browsing the public feed, and keeping the local
//! token ledger and session state.

mod api;
mod cli;
mod config;
mod errors;
mod helper;
mod idea;
mod ledger;
mod live;
mod session;
mod types;

// Re-export key components
pub use api::*;
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use idea::*;
pub use ledger::*;
pub use live::*;
pub use session::*;
pub use types::*;
