//! # Pagecraft Document Model
//!
//! Typed schema for the two kinds of durable design documents:
//!
//! - **Project Config**: project name, ordered page list, global styles
//! - **Page AST**: one rooted tree of [`Node`]s plus a page-level state map
//!
//! Documents travel as JSON. The patch engine edits them as untyped
//! `serde_json::Value`; this crate is the schema they are deserialized into
//! when the code generator needs a page, so malformed structure surfaces at
//! build time rather than blocking edits.

mod id;
mod model;

pub use id::{DocumentId, SelectorError};
pub use model::{
    Action, DynamicValue, Node, PageAst, PageRef, ProjectConfig, PropValue, StateVar,
};
