//! # Pagecraft Project
//!
//! Turns the full document store into a complete, buildable Vue project
//! tree: one SFC per page, a router/entry scaffold, global styles, and the
//! dependency manifest. A fingerprint cache keeps incremental edits cheap by
//! skipping artifacts whose inputs did not change, and a best-effort refresh
//! notifier tells the external preview collaborator to reload.

mod assembler;
mod cache;
mod errors;
mod notify;

pub use assembler::{AssembleOptions, BuildReport, BuildWarning, ProjectAssembler};
pub use cache::GenerationCache;
pub use errors::BuildError;
pub use notify::{BuildEvent, RefreshNotifier};
