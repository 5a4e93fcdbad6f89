//! # Document Store
//!
//! Arena of design documents keyed by [`DocumentId`], guarded by a
//! per-document mutex so concurrent batches to different pages proceed
//! independently while batches to the same document serialize.
//!
//! Documents can be:
//! - **Memory-backed**: temporary, for tests and variant seeds
//! - **Disk-backed**: persisted under `<root>/design/`, reloaded at startup
//!
//! A batch commits the in-memory value and its durable JSON file together;
//! readers only ever observe committed batch results.

use crate::patch::{apply_op, PatchError, PatchOp};
use crate::EditorError;
use pagecraft_document::{DocumentId, PageAst, ProjectConfig};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

/// A committed point-in-time view of one document
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub value: Value,
    pub version: u64,
}

struct Entry {
    value: Value,
    version: u64,
    /// False for auto-created scaffolds that have not survived a successful
    /// batch yet; readers skip uncommitted entries.
    committed: bool,
}

enum Backing {
    Memory,
    Disk(PathBuf),
}

pub struct DocumentStore {
    backing: Backing,
    docs: RwLock<HashMap<DocumentId, Arc<Mutex<Entry>>>>,
}

impl DocumentStore {
    /// In-memory store (tests, variant seed documents)
    pub fn in_memory() -> Self {
        Self {
            backing: Backing::Memory,
            docs: RwLock::new(HashMap::new()),
        }
    }

    /// Open a disk-backed store, loading any documents already persisted
    /// under `<root>/design/`.
    pub fn open(root: &Path) -> Result<Self, EditorError> {
        let design_dir = root.join("design");
        std::fs::create_dir_all(&design_dir)?;

        let mut docs = HashMap::new();
        for entry in std::fs::read_dir(&design_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let source = std::fs::read_to_string(&path)?;
            let value: Value = serde_json::from_str(&source)?;
            let id = if file_name == "project.json" {
                DocumentId::Project
            } else {
                DocumentId::Page(file_name.to_string())
            };
            docs.insert(
                id,
                Arc::new(Mutex::new(Entry {
                    value,
                    version: 0,
                    committed: true,
                })),
            );
        }

        Ok(Self {
            backing: Backing::Disk(design_dir),
            docs: RwLock::new(docs),
        })
    }

    /// Apply an ordered batch to one document with all-or-nothing semantics.
    /// Ops carry their index in the caller's original request so rejection
    /// errors point at the right operation.
    ///
    /// Patching a page that does not exist yet auto-creates the minimal empty
    /// page document before applying.
    pub fn apply_batch(
        &self,
        id: &DocumentId,
        ops: &[(usize, PatchOp)],
    ) -> Result<u64, EditorError> {
        let entry = self.entry_or_scaffold(id)?;
        let mut guard = entry.lock().expect("document lock poisoned");

        // All ops run against a scratch copy; the document only moves if
        // every op succeeds and the durable write goes through.
        let mut scratch = guard.value.clone();
        for (index, op) in ops {
            apply_op(&mut scratch, op).map_err(|kind| PatchError {
                index: *index,
                kind,
            })?;
        }

        self.persist(id, &scratch)?;
        guard.value = scratch;
        guard.version += 1;
        guard.committed = true;
        tracing::debug!(document = %id, version = guard.version, "committed patch batch");
        Ok(guard.version)
    }

    /// Committed snapshot of one document, if present
    pub fn snapshot(&self, id: &DocumentId) -> Option<Snapshot> {
        let docs = self.docs.read().expect("store lock poisoned");
        let entry = docs.get(id)?;
        let guard = entry.lock().expect("document lock poisoned");
        if !guard.committed {
            return None;
        }
        Some(Snapshot {
            value: guard.value.clone(),
            version: guard.version,
        })
    }

    /// Typed project config; absence of the record is the built-in default
    pub fn project_config(&self) -> Result<ProjectConfig, serde_json::Error> {
        match self.snapshot(&DocumentId::Project) {
            Some(snapshot) => serde_json::from_value(snapshot.value),
            None => Ok(ProjectConfig::default()),
        }
    }

    /// Typed page AST; `None` means no document exists for this `astFile`
    pub fn page(&self, ast_file: &str) -> Option<Result<PageAst, serde_json::Error>> {
        let snapshot = self.snapshot(&DocumentId::Page(ast_file.to_string()))?;
        Some(serde_json::from_value(snapshot.value))
    }

    /// Replace the project config wholesale (variant seeding, templates)
    pub fn put_project(&self, config: &ProjectConfig) -> Result<(), EditorError> {
        let value = serde_json::to_value(config)?;
        self.put(DocumentId::Project, value)
    }

    /// Replace one page document wholesale (variant seeding, templates)
    pub fn put_page(&self, ast_file: &str, page: &PageAst) -> Result<(), EditorError> {
        let value = serde_json::to_value(page)?;
        self.put(DocumentId::Page(ast_file.to_string()), value)
    }

    /// `astFile` keys of all committed page documents
    pub fn page_files(&self) -> Vec<String> {
        let docs = self.docs.read().expect("store lock poisoned");
        let mut files: Vec<String> = docs
            .iter()
            .filter_map(|(id, entry)| match id {
                DocumentId::Page(name) => {
                    let guard = entry.lock().expect("document lock poisoned");
                    guard.committed.then(|| name.clone())
                }
                DocumentId::Project => None,
            })
            .collect();
        files.sort();
        files
    }

    fn put(&self, id: DocumentId, value: Value) -> Result<(), EditorError> {
        let entry = self.entry_or_scaffold(&id)?;
        let mut guard = entry.lock().expect("document lock poisoned");
        self.persist(&id, &value)?;
        guard.value = value;
        guard.version += 1;
        guard.committed = true;
        Ok(())
    }

    fn entry_or_scaffold(&self, id: &DocumentId) -> Result<Arc<Mutex<Entry>>, EditorError> {
        if let DocumentId::Page(name) = id {
            validate_page_file(name)?;
        }

        {
            let docs = self.docs.read().expect("store lock poisoned");
            if let Some(entry) = docs.get(id) {
                return Ok(entry.clone());
            }
        }

        let mut docs = self.docs.write().expect("store lock poisoned");
        let entry = docs.entry(id.clone()).or_insert_with(|| {
            let value = match id {
                DocumentId::Project => {
                    serde_json::to_value(ProjectConfig::default()).expect("default config is JSON")
                }
                DocumentId::Page(_) => {
                    serde_json::to_value(PageAst::empty()).expect("empty page is JSON")
                }
            };
            Arc::new(Mutex::new(Entry {
                value,
                version: 0,
                committed: false,
            }))
        });
        Ok(entry.clone())
    }

    fn persist(&self, id: &DocumentId, value: &Value) -> Result<(), EditorError> {
        let Backing::Disk(design_dir) = &self.backing else {
            return Ok(());
        };
        let file_name = match id {
            DocumentId::Project => "project.json",
            DocumentId::Page(name) => name.as_str(),
        };
        let mut text = serde_json::to_string_pretty(value)?;
        text.push('\n');

        // Write-then-rename so an interrupted write can never leave a
        // truncated document behind; `open` only picks up `.json` files.
        let tmp_path = design_dir.join(format!("{file_name}.tmp"));
        std::fs::write(&tmp_path, text)?;
        std::fs::rename(&tmp_path, design_dir.join(file_name))?;
        Ok(())
    }
}

fn validate_page_file(name: &str) -> Result<(), EditorError> {
    // astFile keys become file names under design/; keep them flat
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(EditorError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid astFile name: {name}"),
        )));
    }
    Ok(())
}
