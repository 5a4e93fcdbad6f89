//! # Variant/Selection Orchestrator
//!
//! `generate_variations` runs the full generator + assembler pipeline once
//! per palette × font combination, each into its own directory with its own
//! seed documents and a deterministic preview port. `select_variation`
//! promotes one variant's documents into the active store and rebuilds the
//! active project in place.

use crate::templates::{synthesize, TemplateKind, FONTS, PALETTES};
use chrono::{DateTime, Utc};
use pagecraft_document::PageRef;
use pagecraft_editor::{DocumentStore, EditorError};
use pagecraft_project::{AssembleOptions, BuildError, GenerationCache, ProjectAssembler};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Variant previews are served at `VARIANT_PORT_BASE + index`
pub const VARIANT_PORT_BASE: u16 = 5180;

/// The active editable project's preview port, distinct from all variants
pub const ACTIVE_PREVIEW_PORT: u16 = 5173;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub index: usize,
    pub palette: String,
    pub font: String,
    pub output_path: PathBuf,
    pub preview_port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSet {
    pub template: TemplateKind,
    pub generated_at: DateTime<Utc>,
    pub variants: Vec<Variant>,
}

/// The single promoted, editable variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveProject {
    pub source_variant_index: usize,
    pub path: PathBuf,
    pub project_name: String,
    pub pages: Vec<PageRef>,
    pub preview_port: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum VariantError {
    #[error("Invalid variant index {index} (variant set has {count})")]
    InvalidVariantIndex { index: usize, count: usize },

    #[error("No variant set has been generated yet")]
    NoVariantSet,

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct VariantOrchestrator {
    root: PathBuf,
    assembler: ProjectAssembler,
}

impl VariantOrchestrator {
    pub fn new(root: impl Into<PathBuf>, assembler: ProjectAssembler) -> Self {
        Self {
            root: root.into(),
            assembler,
        }
    }

    /// Generate one styled variant per palette × font combination. Any
    /// previous variant set is destroyed first; the active project is left
    /// alone.
    pub fn generate_variations(
        &self,
        template: TemplateKind,
        variables: &BTreeMap<String, String>,
    ) -> Result<VariantSet, VariantError> {
        let variants_dir = self.root.join("variants");
        if variants_dir.exists() {
            std::fs::remove_dir_all(&variants_dir)?;
        }
        std::fs::create_dir_all(&variants_dir)?;

        let mut variants = vec![];
        let mut index = 0;
        for palette in &PALETTES {
            for &(font_name, font_stack) in &FONTS {
                let variant_dir = variants_dir.join(format!("variant-{index}"));
                let (config, pages) = synthesize(template, variables, palette, font_stack);

                // Each variant owns an independent, disposable store
                let store = DocumentStore::open(&variant_dir)?;
                store.put_project(&config)?;
                for (ast_file, page) in &pages {
                    store.put_page(ast_file, page)?;
                }

                let port = VARIANT_PORT_BASE + index as u16;
                let options = AssembleOptions::new(&variant_dir).with_port(port);
                let mut cache = GenerationCache::new();
                self.assembler.assemble(&store, &options, &mut cache)?;

                tracing::info!(index, palette = palette.name, font = font_name, "generated variant");
                variants.push(Variant {
                    index,
                    palette: palette.name.to_string(),
                    font: font_name.to_string(),
                    output_path: variant_dir,
                    preview_port: port,
                });
                index += 1;
            }
        }

        let set = VariantSet {
            template,
            generated_at: Utc::now(),
            variants,
        };
        write_record(&self.variant_set_path(), &set)?;
        Ok(set)
    }

    /// Promote one variant: its seed documents become the active store's
    /// documents and the active project is rebuilt at the active port. An
    /// out-of-range index leaves the current active project untouched.
    pub fn select_variation(
        &self,
        index: usize,
        active_store: &DocumentStore,
    ) -> Result<ActiveProject, VariantError> {
        let set = self.variant_set()?.ok_or(VariantError::NoVariantSet)?;
        let variant = set
            .variants
            .get(index)
            .ok_or(VariantError::InvalidVariantIndex {
                index,
                count: set.variants.len(),
            })?;

        // Copy the variant's document state into the active store
        let variant_store = DocumentStore::open(&variant.output_path)?;
        let config = variant_store.project_config()?;
        active_store.put_project(&config)?;
        for ast_file in variant_store.page_files() {
            if let Some(page) = variant_store.page(&ast_file) {
                active_store.put_page(&ast_file, &page?)?;
            }
        }

        // Rebuild the active project location from the promoted documents
        let app_dir = self.root.join("app");
        let options = AssembleOptions::new(&app_dir).with_port(ACTIVE_PREVIEW_PORT);
        let mut cache = GenerationCache::new();
        self.assembler.assemble(active_store, &options, &mut cache)?;

        let active = ActiveProject {
            source_variant_index: index,
            path: app_dir,
            project_name: config.project_name,
            pages: config.pages,
            preview_port: ACTIVE_PREVIEW_PORT,
        };
        write_record(&self.active_project_path(), &active)?;
        tracing::info!(index, "promoted variant to active project");
        Ok(active)
    }

    /// The persisted variant set, if any
    pub fn variant_set(&self) -> Result<Option<VariantSet>, VariantError> {
        read_record(&self.variant_set_path())
    }

    /// The persisted active-project record, if any
    pub fn active_project(&self) -> Result<Option<ActiveProject>, VariantError> {
        read_record(&self.active_project_path())
    }

    fn variant_set_path(&self) -> PathBuf {
        self.root.join(".pagecraft/variants.json")
    }

    fn active_project_path(&self) -> PathBuf {
        self.root.join(".pagecraft/active.json")
    }
}

fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<(), VariantError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut text = serde_json::to_string_pretty(record)?;
    text.push('\n');
    std::fs::write(path, text)?;
    Ok(())
}

fn read_record<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, VariantError> {
    match std::fs::read_to_string(path) {
        Ok(source) => Ok(Some(serde_json::from_str(&source)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
