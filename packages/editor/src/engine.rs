//! # Patch Engine
//!
//! Routes a caller's ordered patch batch to the documents it targets and
//! applies each sub-batch atomically.
//!
//! A request aimed at a page may still carry project-config ops
//! (`/projectName`, `/globalStyles`, `/pages/...`); those are split out by
//! path prefix and committed to the project document first. The two commits
//! are deliberately NOT one cross-document atomic unit: a failure in the page
//! sub-batch leaves the already-committed project ops in place.

use crate::patch::{first_segment, PatchOp};
use crate::store::DocumentStore;
use crate::EditorError;
use pagecraft_document::DocumentId;
use std::sync::Arc;

/// Path prefixes owned by the project config document
const CONFIG_PREFIXES: [&str; 3] = ["projectName", "globalStyles", "pages"];

/// One caller request: target selector, ordered ops, build-trigger flag.
/// The flag is carried through for the workspace layer; the engine itself
/// only mutates documents.
#[derive(Debug, Clone)]
pub struct PatchRequest {
    pub target: DocumentId,
    pub ops: Vec<PatchOp>,
    pub trigger_build: bool,
}

/// Versions committed by one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchOutcome {
    pub project_version: Option<u64>,
    pub page_version: Option<(String, u64)>,
}

pub struct PatchEngine {
    store: Arc<DocumentStore>,
}

impl PatchEngine {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Apply one request. Errors carry the failing op's index in the
    /// caller's original op list.
    pub fn apply(&self, request: &PatchRequest) -> Result<PatchOutcome, EditorError> {
        let mut outcome = PatchOutcome::default();

        match &request.target {
            DocumentId::Project => {
                let ops: Vec<(usize, PatchOp)> =
                    request.ops.iter().cloned().enumerate().collect();
                if !ops.is_empty() {
                    let version = self.store.apply_batch(&DocumentId::Project, &ops)?;
                    outcome.project_version = Some(version);
                }
            }
            DocumentId::Page(ast_file) => {
                let (project_ops, page_ops) = split_ops(&request.ops);

                // Project-config ops commit first, unconditionally.
                if !project_ops.is_empty() {
                    let version = self.store.apply_batch(&DocumentId::Project, &project_ops)?;
                    outcome.project_version = Some(version);
                }
                if !page_ops.is_empty() {
                    let id = DocumentId::Page(ast_file.clone());
                    let version = self.store.apply_batch(&id, &page_ops)?;
                    outcome.page_version = Some((ast_file.clone(), version));
                }
            }
        }

        Ok(outcome)
    }
}

/// Split a page-targeted op list by path prefix, preserving original indices
fn split_ops(ops: &[PatchOp]) -> (Vec<(usize, PatchOp)>, Vec<(usize, PatchOp)>) {
    let mut project_ops = vec![];
    let mut page_ops = vec![];
    for (index, op) in ops.iter().enumerate() {
        let is_config = first_segment(&op.path)
            .map(|seg| CONFIG_PREFIXES.contains(&seg))
            .unwrap_or(false);
        if is_config {
            project_ops.push((index, op.clone()));
        } else {
            page_ops.push((index, op.clone()));
        }
    }
    (project_ops, page_ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::OpKind;
    use serde_json::json;

    fn add(path: &str, value: serde_json::Value) -> PatchOp {
        PatchOp {
            op: OpKind::Add,
            path: path.to_string(),
            value: Some(value),
        }
    }

    fn engine() -> PatchEngine {
        PatchEngine::new(Arc::new(DocumentStore::in_memory()))
    }

    #[test]
    fn test_mixed_batch_routes_by_prefix() {
        let engine = engine();
        let request = PatchRequest {
            target: DocumentId::Page("home.json".to_string()),
            ops: vec![
                add(
                    "/pages/-",
                    json!({ "name": "Home", "path": "/", "astFile": "home.json" }),
                ),
                add(
                    "/state/count",
                    json!({ "type": "number", "defaultValue": 0 }),
                ),
            ],
            trigger_build: false,
        };

        let outcome = engine.apply(&request).unwrap();
        assert_eq!(outcome.project_version, Some(1));
        assert_eq!(outcome.page_version, Some(("home.json".to_string(), 1)));

        let config = engine.store().project_config().unwrap();
        assert_eq!(config.pages.len(), 1);
        assert_eq!(config.pages[0].ast_file, "home.json");

        let page = engine.store().page("home.json").unwrap().unwrap();
        assert!(page.state.contains_key("count"));
    }

    #[test]
    fn test_project_ops_commit_before_failing_page_ops() {
        let engine = engine();
        let request = PatchRequest {
            target: DocumentId::Page("home.json".to_string()),
            ops: vec![
                add("/globalStyles", json!("body { margin: 0; }")),
                PatchOp {
                    op: OpKind::Replace,
                    path: "/missing/key".to_string(),
                    value: Some(json!(1)),
                },
            ],
            trigger_build: false,
        };

        let err = engine.apply(&request).unwrap_err();
        match err {
            EditorError::Patch(patch) => assert_eq!(patch.index, 1),
            other => panic!("expected patch error, got {other:?}"),
        }

        // Two-phase behavior: the project commit survives the page failure
        let config = engine.store().project_config().unwrap();
        assert_eq!(config.global_styles, "body { margin: 0; }");
        assert!(engine.store().page("home.json").is_none());
    }

    #[test]
    fn test_project_targeted_ops_stay_on_project() {
        let engine = engine();
        let request = PatchRequest {
            target: DocumentId::Project,
            ops: vec![add("/projectName", json!("site"))],
            trigger_build: false,
        };
        let outcome = engine.apply(&request).unwrap();
        assert_eq!(outcome.project_version, Some(1));
        assert_eq!(outcome.page_version, None);
    }
}
