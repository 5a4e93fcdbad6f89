//! # Pagecraft Workspace
//!
//! Ties one project directory together for the designer client: the document
//! store and patch engine, app generation with caching, variant
//! orchestration, and the JSON-over-HTTP boundary that fronts all of it.

mod server;
mod service;

pub use server::router;
pub use service::{PatchApplied, WorkspaceError, WorkspaceService};
