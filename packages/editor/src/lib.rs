//! # Pagecraft Editor
//!
//! Document lifecycle + patch mutations for pagecraft design documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ caller: ordered patch batch + selector      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: DocumentStore + PatchEngine         │
//! │  - Load/persist design documents            │
//! │  - Apply patch batches atomically           │
//! │  - Route config vs. page ops by path prefix │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ compiler/project: AST → Vue source tree     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core principles
//!
//! 1. **Documents are source of truth**: generated output is a derived view
//! 2. **All-or-nothing batches**: a failing op leaves its document untouched
//! 3. **Per-document serialization**: batches to different pages may proceed
//!    independently; batches to the same page never interleave
//! 4. **Two-phase routing**: project-config ops commit before page ops, and
//!    the two commits are not one cross-document atomic unit

mod engine;
mod errors;
mod patch;
mod store;

pub use engine::{PatchEngine, PatchOutcome, PatchRequest};
pub use errors::EditorError;
pub use patch::{OpKind, PatchError, PatchErrorKind, PatchOp};
pub use store::{DocumentStore, Snapshot};
