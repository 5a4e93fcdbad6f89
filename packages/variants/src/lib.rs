//! # Pagecraft Variants
//!
//! Generates N independently styled renditions of a template into isolated
//! directories, each with a deterministic preview port, and promotes one of
//! them into the single active (editable) project.
//!
//! Variant directories are disposable copies: they are never patched in
//! place, only regenerated wholesale or promoted to active.

mod orchestrator;
mod templates;

pub use orchestrator::{
    ActiveProject, Variant, VariantError, VariantOrchestrator, VariantSet, ACTIVE_PREVIEW_PORT,
    VARIANT_PORT_BASE,
};
pub use templates::{synthesize, Palette, TemplateKind, FONTS, PALETTES};
