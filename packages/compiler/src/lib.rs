//! # Pagecraft Compiler
//!
//! Renders one Page AST into Vue 3 single-file-component source text.
//!
//! Component types resolve through an externally supplied
//! [`ComponentManifest`]; literal text is entity-escaped before it is
//! embedded in markup, while bindings and expressions are emitted as code.

mod errors;
mod generator;
mod manifest;


pub use errors::SchemaError;
pub use generator::{escape_html, generate, pascal_case, SharedFragment};
pub use manifest::{ComponentManifest, EmitRule};
