use pagecraft_compiler::ComponentManifest;
use pagecraft_document::{DocumentId, SelectorError};
use pagecraft_editor::{
    DocumentStore, EditorError, PatchEngine, PatchOp, PatchRequest, Snapshot,
};
use pagecraft_project::{
    AssembleOptions, BuildError, BuildEvent, BuildReport, GenerationCache, ProjectAssembler,
    RefreshNotifier,
};
use pagecraft_variants::{
    ActiveProject, TemplateKind, VariantError, VariantOrchestrator, VariantSet,
    ACTIVE_PREVIEW_PORT,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("Invalid document selector: {0}")]
    Selector(#[from] SelectorError),

    #[error("No such document: {0}")]
    DocumentNotFound(String),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Variant(#[from] VariantError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Effect of one committed patch request
pub struct PatchApplied {
    pub project_version: Option<u64>,
    pub page_version: Option<(String, u64)>,
    /// Present only when the caller asked for a synchronous build
    pub build: Option<BuildReport>,
}

/// One open project directory: its document store, patch engine, generated
/// app output, and variant sandbox. Shared across HTTP handlers behind an
/// `Arc`; the generation cache is the only mutable piece handlers contend on.
pub struct WorkspaceService {
    root: PathBuf,
    store: Arc<DocumentStore>,
    engine: PatchEngine,
    assembler: ProjectAssembler,
    orchestrator: VariantOrchestrator,
    cache: Mutex<GenerationCache>,
    notifier: RefreshNotifier,
}

impl WorkspaceService {
    pub fn open(root: PathBuf, notifier: RefreshNotifier) -> Result<Arc<Self>, WorkspaceError> {
        let store = Arc::new(DocumentStore::open(&root)?);
        let manifest = load_manifest(&root)?;
        let cache = GenerationCache::load(&root.join(".pagecraft/cache.json"));
        let orchestrator =
            VariantOrchestrator::new(&root, ProjectAssembler::new(manifest.clone()));
        Ok(Arc::new(Self {
            engine: PatchEngine::new(Arc::clone(&store)),
            assembler: ProjectAssembler::new(manifest),
            orchestrator,
            cache: Mutex::new(cache),
            store,
            notifier,
            root,
        }))
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Apply a patch batch. With `trigger_build` the response waits for the
    /// rebuild and carries its report; otherwise the rebuild runs after the
    /// reply and a failure is reported over the notifier instead.
    pub async fn apply_patches(
        self: &Arc<Self>,
        target: DocumentId,
        ops: Vec<PatchOp>,
        trigger_build: bool,
    ) -> Result<PatchApplied, WorkspaceError> {
        let outcome = self.engine.apply(&PatchRequest {
            target,
            ops,
            trigger_build,
        })?;

        let build = if trigger_build {
            Some(self.rebuild().await?)
        } else {
            let service = Arc::clone(self);
            tokio::spawn(async move {
                // The batch is already committed; the next build picks up the
                // latest store state, so a stale task is harmless
                if let Err(e) = service.rebuild().await {
                    tracing::error!("deferred build failed: {e}");
                    service
                        .notifier
                        .notify(BuildEvent::BuildFailed {
                            message: e.to_string(),
                        })
                        .await;
                }
            });
            None
        };

        Ok(PatchApplied {
            project_version: outcome.project_version,
            page_version: outcome.page_version,
            build,
        })
    }

    /// Regenerate the active app from the current store state, persist the
    /// cache, and signal the preview collaborator.
    pub async fn rebuild(&self) -> Result<BuildReport, WorkspaceError> {
        let options =
            AssembleOptions::new(self.root.join("app")).with_port(ACTIVE_PREVIEW_PORT);
        let report = {
            let mut cache = self.cache.lock().await;
            let report = self.assembler.assemble(&self.store, &options, &mut cache)?;
            cache.save(&self.root.join(".pagecraft/cache.json"))?;
            report
        };
        self.notifier.notify(BuildEvent::Refresh).await;
        Ok(report)
    }

    pub fn document(&self, selector: &str) -> Result<Snapshot, WorkspaceError> {
        let id = DocumentId::parse(selector)?;
        self.store
            .snapshot(&id)
            .ok_or_else(|| WorkspaceError::DocumentNotFound(selector.to_string()))
    }

    pub async fn generate_variations(
        &self,
        template: TemplateKind,
        variables: &BTreeMap<String, String>,
    ) -> Result<VariantSet, WorkspaceError> {
        Ok(self.orchestrator.generate_variations(template, variables)?)
    }

    /// Promote one variant into the active project. The promoted documents
    /// replace the store's, the app is rebuilt from scratch, and future
    /// incremental builds start from an empty cache.
    pub async fn select_variation(&self, index: usize) -> Result<ActiveProject, WorkspaceError> {
        let active = self.orchestrator.select_variation(index, &self.store)?;
        {
            let mut cache = self.cache.lock().await;
            *cache = GenerationCache::new();
            cache.save(&self.root.join(".pagecraft/cache.json"))?;
        }
        self.notifier.notify(BuildEvent::Refresh).await;
        Ok(active)
    }
}

/// An externally supplied manifest feed at `.pagecraft/manifest.json`
/// overrides the built-in component catalog.
fn load_manifest(root: &std::path::Path) -> Result<ComponentManifest, WorkspaceError> {
    match std::fs::read_to_string(root.join(".pagecraft/manifest.json")) {
        Ok(source) => {
            let manifest = ComponentManifest::from_json(&source).map_err(BuildError::Schema)?;
            tracing::info!(version = %manifest.version, "loaded external component manifest");
            Ok(manifest)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ComponentManifest::builtin()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op(kind: &str, path: &str, value: Option<serde_json::Value>) -> PatchOp {
        serde_json::from_value(json!({
            "op": kind,
            "path": path,
            "value": value,
        }))
        .unwrap()
    }

    fn service_with_channel(
        root: &std::path::Path,
    ) -> (
        Arc<WorkspaceService>,
        tokio::sync::mpsc::UnboundedReceiver<BuildEvent>,
    ) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let service =
            WorkspaceService::open(root.to_path_buf(), RefreshNotifier::Channel(tx)).unwrap();
        (service, rx)
    }

    #[tokio::test]
    async fn test_synchronous_build_writes_app_and_signals_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let (service, mut rx) = service_with_channel(dir.path());

        let applied = service
            .apply_patches(
                DocumentId::Page("home.json".to_string()),
                vec![
                    op("replace", "/projectName", Some(json!("demo"))),
                    op(
                        "add",
                        "/pages/-",
                        Some(json!({"name": "Home", "path": "/", "astFile": "home.json"})),
                    ),
                    op(
                        "add",
                        "/tree/slots/default/-",
                        Some(json!({
                            "id": "greeting",
                            "type": "Heading",
                            "props": {"text": "Hello"},
                            "slots": {}
                        })),
                    ),
                ],
                true,
            )
            .await
            .unwrap();

        let report = applied.build.unwrap();
        assert!(report.routes.contains(&"/".to_string()));
        assert_eq!(rx.recv().await.unwrap(), BuildEvent::Refresh);

        let page = std::fs::read_to_string(dir.path().join("app/src/pages/Home.vue")).unwrap();
        assert!(page.contains("Hello"));
        assert!(dir.path().join(".pagecraft/cache.json").exists());
    }

    #[tokio::test]
    async fn test_tree_patch_replaces_root_and_builds_one_route() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _rx) = service_with_channel(dir.path());

        // Register the page, then install a whole new tree at its wire key
        service
            .apply_patches(
                DocumentId::Page("home.json".to_string()),
                vec![
                    op(
                        "add",
                        "/pages/-",
                        Some(json!({"name": "Home", "path": "/", "astFile": "home.json"})),
                    ),
                    op(
                        "add",
                        "/tree",
                        Some(json!({
                            "id": "landing",
                            "type": "Box",
                            "slots": {"default": []}
                        })),
                    ),
                ],
                true,
            )
            .await
            .unwrap();

        let page = service.store().page("home.json").unwrap().unwrap();
        assert_eq!(
            page.root.id, "landing",
            "the patched tree must replace the scaffold root"
        );

        let vue = std::fs::read_to_string(dir.path().join("app/src/pages/Home.vue")).unwrap();
        assert!(vue.contains("data-node-id=\"landing\""));

        let router = std::fs::read_to_string(dir.path().join("app/src/router/index.js")).unwrap();
        assert!(router.contains("{ path: \"/\", name: \"Home\", component: Home }"));
    }

    #[tokio::test]
    async fn test_failed_batch_skips_build() {
        let dir = tempfile::tempdir().unwrap();
        let (service, mut rx) = service_with_channel(dir.path());

        let result = service
            .apply_patches(
                DocumentId::Project,
                vec![op("replace", "/noSuchField/deep", Some(json!(1)))],
                true,
            )
            .await;

        assert!(result.is_err());
        assert!(rx.try_recv().is_err());
        assert!(!dir.path().join("app").exists());
    }

    #[tokio::test]
    async fn test_deferred_build_failure_reported_over_notifier() {
        let dir = tempfile::tempdir().unwrap();
        let (service, mut rx) = service_with_channel(dir.path());

        // Commits fine (patches are schema-agnostic) but the generator has
        // no emit rule for "Mystery", so the deferred build must fail
        service
            .apply_patches(
                DocumentId::Page("home.json".to_string()),
                vec![
                    op(
                        "add",
                        "/pages/-",
                        Some(json!({"name": "Home", "path": "/", "astFile": "home.json"})),
                    ),
                    op("replace", "/tree/type", Some(json!("Mystery"))),
                ],
                false,
            )
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            BuildEvent::BuildFailed { message } => assert!(message.contains("Mystery")),
            other => panic!("expected build failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_document_lookup_by_selector() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _rx) = service_with_channel(dir.path());

        service
            .apply_patches(
                DocumentId::Project,
                vec![op("replace", "/projectName", Some(json!("demo")))],
                false,
            )
            .await
            .unwrap();

        let snapshot = service.document("project").unwrap();
        assert_eq!(snapshot.value["projectName"], json!("demo"));
        assert_eq!(snapshot.version, 1);

        assert!(matches!(
            service.document("page:missing.json"),
            Err(WorkspaceError::DocumentNotFound(_))
        ));
        assert!(matches!(
            service.document("bogus"),
            Err(WorkspaceError::Selector(_))
        ));
    }

    #[tokio::test]
    async fn test_variant_flow_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let (service, mut rx) = service_with_channel(dir.path());

        let set = service
            .generate_variations(TemplateKind::Landing, &BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(set.variants.len(), 4);

        let active = service.select_variation(2).await.unwrap();
        assert_eq!(active.source_variant_index, 2);
        assert_eq!(rx.recv().await.unwrap(), BuildEvent::Refresh);
        assert!(dir.path().join("app/src/pages/Home.vue").exists());

        // The promoted pages are now patchable through the normal path
        let applied = service
            .apply_patches(
                DocumentId::Page("home.json".to_string()),
                vec![op("replace", "/state/subscribed/defaultValue", Some(json!(true)))],
                true,
            )
            .await
            .unwrap();
        assert!(applied.build.is_some());
    }

    #[tokio::test]
    async fn test_select_out_of_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _rx) = service_with_channel(dir.path());
        service
            .generate_variations(TemplateKind::Blank, &BTreeMap::new())
            .await
            .unwrap();

        assert!(matches!(
            service.select_variation(4).await,
            Err(WorkspaceError::Variant(
                VariantError::InvalidVariantIndex { index: 4, count: 4 }
            ))
        ));
    }

    #[tokio::test]
    async fn test_external_manifest_feed_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".pagecraft")).unwrap();
        std::fs::write(
            dir.path().join(".pagecraft/manifest.json"),
            r#"{
                "version": "custom-1",
                "components": {
                    "Box": { "tag": "section" },
                    "Banner": { "tag": "aside", "textProp": "text" }
                }
            }"#,
        )
        .unwrap();
        let (service, _rx) = service_with_channel(dir.path());

        service
            .apply_patches(
                DocumentId::Page("home.json".to_string()),
                vec![
                    op(
                        "add",
                        "/pages/-",
                        Some(json!({"name": "Home", "path": "/", "astFile": "home.json"})),
                    ),
                    op(
                        "add",
                        "/tree/slots/default/-",
                        Some(json!({"id": "promo", "type": "Banner", "props": {"text": "Sale"}})),
                    ),
                ],
                true,
            )
            .await
            .unwrap();

        let page = std::fs::read_to_string(dir.path().join("app/src/pages/Home.vue")).unwrap();
        assert!(page.contains("<section data-node-id=\"root\">"));
        assert!(page.contains("<aside data-node-id=\"promo\">"));
    }
}
