//! # Project Assembler
//!
//! Combines generated page sources with project-wide files into a complete
//! Vite + Vue output tree:
//!
//! ```text
//! out/
//! ├── index.html
//! ├── package.json
//! ├── vite.config.js
//! └── src/
//!     ├── main.js
//!     ├── App.vue
//!     ├── assets/styles.css
//!     ├── router/index.js
//!     └── pages/<Name>.vue
//! ```
//!
//! Every artifact is fingerprinted over the inputs that produce it; matching
//! cache entries whose file still exists on disk are skipped, which is what
//! keeps incremental edits cheap.

use crate::cache::{fingerprint, GenerationCache};
use crate::BuildError;
use pagecraft_compiler::{escape_html, generate, pascal_case, ComponentManifest, SharedFragment};
use pagecraft_document::{PageAst, PageRef};
use pagecraft_editor::DocumentStore;
use pagecraft_document::DocumentId;
use pagecraft_common::{FileSystem, RealFileSystem};
use serde_json::json;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

pub struct AssembleOptions {
    pub out_dir: PathBuf,
    pub preview_port: u16,
}

impl AssembleOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            preview_port: 5173,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.preview_port = port;
        self
    }
}

/// Non-fatal problems surfaced by a build; never silently dropped
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildWarning {
    #[error("missing page AST {ast_file}: page '{name}' omitted from the route table")]
    MissingPageAst { name: String, ast_file: String },
}

#[derive(Debug, Default)]
pub struct BuildReport {
    /// Relative paths written this run
    pub written: Vec<String>,
    /// Relative paths skipped because their fingerprint matched
    pub skipped: Vec<String>,
    pub warnings: Vec<BuildWarning>,
    /// Route table entries, in project config order
    pub routes: Vec<String>,
}

pub struct ProjectAssembler {
    manifest: ComponentManifest,
    fs: Box<dyn FileSystem + Send + Sync>,
}

impl ProjectAssembler {
    pub fn new(manifest: ComponentManifest) -> Self {
        Self::with_fs(manifest, Box::new(RealFileSystem))
    }

    pub fn with_fs(manifest: ComponentManifest, fs: Box<dyn FileSystem + Send + Sync>) -> Self {
        Self { manifest, fs }
    }

    pub fn manifest(&self) -> &ComponentManifest {
        &self.manifest
    }

    /// Assemble the whole store into `options.out_dir`. The caller persists
    /// `cache` after a successful run; entries are only recorded here for
    /// artifacts that were confirmed written.
    pub fn assemble(
        &self,
        store: &DocumentStore,
        options: &AssembleOptions,
        cache: &mut GenerationCache,
    ) -> Result<BuildReport, BuildError> {
        let config = store.project_config()?;
        validate_config(&config.pages)?;

        let mut report = BuildReport::default();

        // Pages with a present, well-formed AST make it into the route
        // table; the rest are reported and omitted.
        let mut routed: Vec<(PageRef, PageAst, String)> = vec![];
        for page_ref in &config.pages {
            let id = DocumentId::Page(page_ref.ast_file.clone());
            match store.snapshot(&id) {
                None => {
                    tracing::warn!(ast_file = %page_ref.ast_file, "page AST missing, omitting route");
                    report.warnings.push(BuildWarning::MissingPageAst {
                        name: page_ref.name.clone(),
                        ast_file: page_ref.ast_file.clone(),
                    });
                }
                Some(snapshot) => {
                    let raw = snapshot.value.to_string();
                    let ast: PageAst = serde_json::from_value(snapshot.value).map_err(|e| {
                        BuildError::MalformedPageAst {
                            ast_file: page_ref.ast_file.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    routed.push((page_ref.clone(), ast, raw));
                }
            }
        }

        let component_names = unique_component_names(&routed);
        let fragments = navigation_fragment(&routed);

        // Per-page sources
        let mut artifacts: Vec<(String, String, String)> = vec![];
        for ((page_ref, ast, raw), component) in routed.iter().zip(&component_names) {
            let source = generate(ast, &self.manifest, &fragments)?;
            let fp = fingerprint(&[
                raw.as_bytes(),
                config.global_styles.as_bytes(),
                self.manifest.version.as_bytes(),
                fragment_inputs(&fragments).as_bytes(),
            ]);
            artifacts.push((format!("src/pages/{component}.vue"), source, fp));
            report.routes.push(page_ref.path.clone());
        }

        // Project-wide files; their fingerprints hash the content itself
        // since the content is a pure function of the config.
        let scaffolds = [
            (
                "src/assets/styles.css".to_string(),
                format!("{}\n", config.global_styles),
            ),
            (
                "src/router/index.js".to_string(),
                router_source(&routed, &component_names),
            ),
            ("src/App.vue".to_string(), app_shell_source()),
            ("src/main.js".to_string(), main_source()),
            (
                "index.html".to_string(),
                index_html(&config.project_name),
            ),
            (
                "package.json".to_string(),
                package_json(&config.project_name),
            ),
            (
                "vite.config.js".to_string(),
                vite_config(options.preview_port),
            ),
        ];
        for (path, content) in scaffolds {
            let fp = fingerprint(&[content.as_bytes()]);
            artifacts.push((path, content, fp));
        }

        for (rel_path, content, fp) in artifacts {
            self.write_artifact(options, cache, &mut report, &rel_path, &content, fp)?;
        }

        tracing::info!(
            written = report.written.len(),
            skipped = report.skipped.len(),
            warnings = report.warnings.len(),
            "assembled project"
        );
        Ok(report)
    }

    fn write_artifact(
        &self,
        options: &AssembleOptions,
        cache: &mut GenerationCache,
        report: &mut BuildReport,
        rel_path: &str,
        content: &str,
        fp: String,
    ) -> Result<(), BuildError> {
        let full_path = options.out_dir.join(rel_path);

        if cache.matches(rel_path, &fp) && self.fs.exists(&full_path) {
            report.skipped.push(rel_path.to_string());
            return Ok(());
        }

        self.fs
            .write(&full_path, content)
            .map_err(|source| BuildError::ArtifactIo {
                artifact: rel_path.to_string(),
                source,
            })?;

        cache.record(rel_path, fp);
        report.written.push(rel_path.to_string());
        Ok(())
    }
}

fn validate_config(pages: &[PageRef]) -> Result<(), BuildError> {
    let mut ast_files = HashSet::new();
    let mut paths = HashSet::new();
    for page in pages {
        if !ast_files.insert(page.ast_file.to_lowercase()) {
            return Err(BuildError::InvalidConfig(format!(
                "duplicate astFile reference: {}",
                page.ast_file
            )));
        }
        if !paths.insert(page.path.clone()) {
            return Err(BuildError::InvalidConfig(format!(
                "duplicate route path: {}",
                page.path
            )));
        }
    }
    Ok(())
}

/// Component/file identifiers for routed pages, deduplicated in config order
fn unique_component_names(routed: &[(PageRef, PageAst, String)]) -> Vec<String> {
    let mut taken = HashSet::new();
    let mut names = vec![];
    for (page_ref, _, _) in routed {
        let base = {
            let pascal = pascal_case(&page_ref.name);
            if pascal.is_empty() {
                "Page".to_string()
            } else {
                pascal
            }
        };
        let mut candidate = base.clone();
        let mut suffix = 2;
        while !taken.insert(candidate.clone()) {
            candidate = format!("{base}{suffix}");
            suffix += 1;
        }
        names.push(candidate);
    }
    names
}

/// Project-scope navigation, spliced into each page render. A single-page
/// project gets no nav.
fn navigation_fragment(routed: &[(PageRef, PageAst, String)]) -> Vec<SharedFragment> {
    if routed.len() < 2 {
        return vec![];
    }
    let mut markup = String::from("<nav class=\"site-nav\">\n");
    for (page_ref, _, _) in routed {
        markup.push_str(&format!(
            "  <RouterLink to=\"{}\">{}</RouterLink>\n",
            escape_html(&page_ref.path),
            escape_html(&page_ref.name)
        ));
    }
    markup.push_str("</nav>");
    vec![SharedFragment {
        name: "site-nav".to_string(),
        markup,
    }]
}

fn fragment_inputs(fragments: &[SharedFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.markup.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn router_source(routed: &[(PageRef, PageAst, String)], components: &[String]) -> String {
    let mut out = String::from("import { createRouter, createWebHistory } from 'vue-router'\n\n");
    for component in components {
        out.push_str(&format!(
            "import {component} from '../pages/{component}.vue'\n"
        ));
    }
    out.push_str("\nconst routes = [\n");
    for ((page_ref, _, _), component) in routed.iter().zip(components) {
        out.push_str(&format!(
            "  {{ path: {}, name: {}, component: {} }},\n",
            js_string(&page_ref.path),
            js_string(&page_ref.name),
            component
        ));
    }
    out.push_str("]\n\nexport const router = createRouter({\n  history: createWebHistory(),\n  routes,\n})\n");
    out
}

fn app_shell_source() -> String {
    "<template>\n  <router-view />\n</template>\n".to_string()
}

fn main_source() -> String {
    [
        "import { createApp } from 'vue'",
        "import App from './App.vue'",
        "import { router } from './router'",
        "import './assets/styles.css'",
        "",
        "createApp(App).use(router).mount('#app')",
        "",
    ]
    .join("\n")
}

fn index_html(project_name: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n  <head>\n    <meta charset=\"UTF-8\" />\n    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n    <title>{}</title>\n  </head>\n  <body>\n    <div id=\"app\"></div>\n    <script type=\"module\" src=\"/src/main.js\"></script>\n  </body>\n</html>\n",
        escape_html(project_name)
    )
}

fn package_json(project_name: &str) -> String {
    let manifest = json!({
        "name": slug(project_name),
        "private": true,
        "version": "0.0.0",
        "type": "module",
        "scripts": {
            "dev": "vite",
            "build": "vite build",
            "preview": "vite preview"
        },
        "dependencies": {
            "vue": "^3.4.0",
            "vue-router": "^4.3.0"
        },
        "devDependencies": {
            "@vitejs/plugin-vue": "^5.0.0",
            "vite": "^5.2.0"
        }
    });
    let mut text = serde_json::to_string_pretty(&manifest).unwrap_or_else(|_| "{}".to_string());
    text.push('\n');
    text
}

fn vite_config(port: u16) -> String {
    format!(
        "import {{ defineConfig }} from 'vite'\nimport vue from '@vitejs/plugin-vue'\n\nexport default defineConfig({{\n  plugins: [vue()],\n  server: {{ port: {port} }},\n}})\n"
    )
}

fn js_string(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

fn slug(text: &str) -> String {
    let mut out = String::new();
    let mut last_dash = true;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    let trimmed = out.trim_end_matches('-').to_string();
    if trimmed.is_empty() {
        "pagecraft-app".to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_document::ProjectConfig;
    use serde_json::json;

    fn store_with(config: ProjectConfig, pages: &[(&str, serde_json::Value)]) -> DocumentStore {
        let store = DocumentStore::in_memory();
        store.put_project(&config).unwrap();
        for (ast_file, value) in pages {
            let ast: PageAst = serde_json::from_value(value.clone()).unwrap();
            store.put_page(ast_file, &ast).unwrap();
        }
        store
    }

    fn home_page() -> serde_json::Value {
        json!({
            "tree": {
                "id": "root",
                "type": "Box",
                "slots": { "default": [
                    { "id": "title", "type": "Heading", "props": { "text": "Hello" } }
                ]}
            },
            "state": {}
        })
    }

    fn one_page_config() -> ProjectConfig {
        ProjectConfig {
            project_name: "Demo Site".to_string(),
            pages: vec![PageRef {
                name: "Home".to_string(),
                path: "/".to_string(),
                ast_file: "home.json".to_string(),
            }],
            global_styles: "body { margin: 0; }".to_string(),
        }
    }

    fn assembler() -> ProjectAssembler {
        ProjectAssembler::new(ComponentManifest::builtin())
    }

    #[test]
    fn test_assemble_into_memory_fs() {
        use pagecraft_common::MemoryFileSystem;
        use std::sync::Arc;

        let fs = Arc::new(MemoryFileSystem::new());
        let assembler =
            ProjectAssembler::with_fs(ComponentManifest::builtin(), Box::new(Arc::clone(&fs)));
        let store = store_with(one_page_config(), &[("home.json", home_page())]);
        let mut cache = GenerationCache::new();
        let options = AssembleOptions::new("/out");

        let report = assembler.assemble(&store, &options, &mut cache).unwrap();
        assert_eq!(report.skipped.len(), 0);
        assert_eq!(fs.len(), report.written.len());

        let page = fs.contents(std::path::Path::new("/out/src/pages/Home.vue")).unwrap();
        assert!(page.contains("Hello"));

        // Same inputs again: fingerprints match and every artifact exists
        let report = assembler.assemble(&store, &options, &mut cache).unwrap();
        assert!(report.written.is_empty());
    }

    #[test]
    fn test_zero_pages_builds_minimal_project() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::in_memory();
        let mut cache = GenerationCache::new();

        let report = assembler()
            .assemble(&store, &AssembleOptions::new(dir.path()), &mut cache)
            .unwrap();

        assert!(report.routes.is_empty());
        assert!(report.warnings.is_empty());
        assert!(dir.path().join("package.json").exists());
        assert!(dir.path().join("src/router/index.js").exists());

        let router = std::fs::read_to_string(dir.path().join("src/router/index.js")).unwrap();
        assert!(router.contains("const routes = [\n]"));
    }

    #[test]
    fn test_one_page_build_produces_route() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(one_page_config(), &[("home.json", home_page())]);
        let mut cache = GenerationCache::new();

        let report = assembler()
            .assemble(&store, &AssembleOptions::new(dir.path()), &mut cache)
            .unwrap();

        assert_eq!(report.routes, vec!["/".to_string()]);
        let page = std::fs::read_to_string(dir.path().join("src/pages/Home.vue")).unwrap();
        assert!(page.contains("Hello"));

        let router = std::fs::read_to_string(dir.path().join("src/router/index.js")).unwrap();
        assert!(router.contains("{ path: \"/\", name: \"Home\", component: Home }"));

        let styles = std::fs::read_to_string(dir.path().join("src/assets/styles.css")).unwrap();
        assert!(styles.contains("body { margin: 0; }"));

        let pkg = std::fs::read_to_string(dir.path().join("package.json")).unwrap();
        assert!(pkg.contains("\"name\": \"demo-site\""));
    }

    #[test]
    fn test_second_assembly_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(one_page_config(), &[("home.json", home_page())]);
        let mut cache = GenerationCache::new();
        let options = AssembleOptions::new(dir.path());

        let first = assembler().assemble(&store, &options, &mut cache).unwrap();
        assert!(!first.written.is_empty());
        assert!(first.skipped.is_empty());

        let cache_before = cache.clone();
        let second = assembler().assemble(&store, &options, &mut cache).unwrap();
        assert!(second.written.is_empty(), "second run must rewrite zero files");
        assert_eq!(second.skipped.len(), first.written.len());
        assert_eq!(cache, cache_before, "idempotent rebuild leaves the cache unchanged");
    }

    #[test]
    fn test_deleted_artifact_rewritten_despite_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(one_page_config(), &[("home.json", home_page())]);
        let mut cache = GenerationCache::new();
        let options = AssembleOptions::new(dir.path());

        assembler().assemble(&store, &options, &mut cache).unwrap();
        std::fs::remove_file(dir.path().join("src/pages/Home.vue")).unwrap();

        let report = assembler().assemble(&store, &options, &mut cache).unwrap();
        assert_eq!(report.written, vec!["src/pages/Home.vue".to_string()]);
    }

    #[test]
    fn test_missing_page_ast_is_warning_not_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = one_page_config();
        config.pages.push(PageRef {
            name: "About".to_string(),
            path: "/about".to_string(),
            ast_file: "about.json".to_string(),
        });
        let store = store_with(config, &[("home.json", home_page())]);
        let mut cache = GenerationCache::new();

        let report = assembler()
            .assemble(&store, &AssembleOptions::new(dir.path()), &mut cache)
            .unwrap();

        assert_eq!(report.routes, vec!["/".to_string()]);
        assert_eq!(
            report.warnings,
            vec![BuildWarning::MissingPageAst {
                name: "About".to_string(),
                ast_file: "about.json".to_string()
            }]
        );
        let router = std::fs::read_to_string(dir.path().join("src/router/index.js")).unwrap();
        assert!(!router.contains("/about"));
    }

    #[test]
    fn test_duplicate_ast_file_rejected_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = one_page_config();
        config.pages.push(PageRef {
            name: "Other".to_string(),
            path: "/other".to_string(),
            ast_file: "Home.json".to_string(),
        });
        let store = store_with(config, &[("home.json", home_page())]);
        let mut cache = GenerationCache::new();

        let err = assembler()
            .assemble(&store, &AssembleOptions::new(dir.path()), &mut cache)
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidConfig(_)));
    }

    #[test]
    fn test_navigation_spliced_into_multi_page_builds() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = one_page_config();
        config.pages.push(PageRef {
            name: "About".to_string(),
            path: "/about".to_string(),
            ast_file: "about.json".to_string(),
        });
        let store = store_with(
            config,
            &[("home.json", home_page()), ("about.json", home_page())],
        );
        let mut cache = GenerationCache::new();

        assembler()
            .assemble(&store, &AssembleOptions::new(dir.path()), &mut cache)
            .unwrap();

        let home = std::fs::read_to_string(dir.path().join("src/pages/Home.vue")).unwrap();
        let about = std::fs::read_to_string(dir.path().join("src/pages/About.vue")).unwrap();
        for source in [&home, &about] {
            assert!(source.contains("class=\"site-nav\""));
            assert!(source.contains("<RouterLink to=\"/about\">About</RouterLink>"));
        }
    }

    #[test]
    fn test_global_style_change_invalidates_pages() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(one_page_config(), &[("home.json", home_page())]);
        let mut cache = GenerationCache::new();
        let options = AssembleOptions::new(dir.path());

        assembler().assemble(&store, &options, &mut cache).unwrap();

        let mut config = one_page_config();
        config.global_styles = "body { margin: 8px; }".to_string();
        store.put_project(&config).unwrap();

        let report = assembler().assemble(&store, &options, &mut cache).unwrap();
        assert!(report.written.contains(&"src/pages/Home.vue".to_string()));
        assert!(report.written.contains(&"src/assets/styles.css".to_string()));
    }

    #[test]
    fn test_schema_error_fails_build() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(
            one_page_config(),
            &[(
                "home.json",
                json!({
                    "tree": { "id": "root", "type": "Mystery" },
                    "state": {}
                }),
            )],
        );
        let mut cache = GenerationCache::new();

        let err = assembler()
            .assemble(&store, &AssembleOptions::new(dir.path()), &mut cache)
            .unwrap_err();
        assert!(matches!(err, BuildError::Schema(_)));
    }
}
