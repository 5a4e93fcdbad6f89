//! # Templates and style axes
//!
//! A template plus caller variables synthesizes one seed document set
//! (project config + page ASTs). The style axes are a fixed palette × font
//! grid; one combination is baked into each variant's global styles.

use pagecraft_document::{
    Action, DynamicValue, Node, PageAst, PageRef, ProjectConfig, PropValue, StateVar,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Landing,
    Blank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub name: &'static str,
    pub background: &'static str,
    pub surface: &'static str,
    pub text: &'static str,
    pub accent: &'static str,
}

pub const PALETTES: [Palette; 2] = [
    Palette {
        name: "aurora",
        background: "#0f172a",
        surface: "#1e293b",
        text: "#e2e8f0",
        accent: "#38bdf8",
    },
    Palette {
        name: "daybreak",
        background: "#fafaf9",
        surface: "#ffffff",
        text: "#1c1917",
        accent: "#ea580c",
    },
];

/// (display name, font-family stack)
pub const FONTS: [(&str, &str); 2] = [
    ("Inter", "'Inter', system-ui, sans-serif"),
    ("Georgia", "Georgia, 'Times New Roman', serif"),
];

/// Synthesize one seed document set from a template, caller variables, and
/// one style-axis combination.
pub fn synthesize(
    kind: TemplateKind,
    variables: &BTreeMap<String, String>,
    palette: &Palette,
    font_stack: &str,
) -> (ProjectConfig, Vec<(String, PageAst)>) {
    let var = |key: &str, fallback: &str| -> String {
        variables
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    };

    let project_name = var("projectName", "My Site");
    let global_styles = global_styles(palette, font_stack);

    match kind {
        TemplateKind::Blank => {
            let config = ProjectConfig {
                project_name,
                pages: vec![page_ref("Home", "/", "home.json")],
                global_styles,
            };
            (config, vec![("home.json".to_string(), PageAst::empty())])
        }
        TemplateKind::Landing => {
            let config = ProjectConfig {
                project_name,
                pages: vec![
                    page_ref("Home", "/", "home.json"),
                    page_ref("About", "/about", "about.json"),
                ],
                global_styles,
            };
            let home = landing_home(
                &var("title", "Build something great"),
                &var("tagline", "Launch your next idea in minutes."),
                &var("cta", "Get started"),
            );
            let about = landing_about(&var("about", "We are a small team with big plans."));
            (
                config,
                vec![
                    ("home.json".to_string(), home),
                    ("about.json".to_string(), about),
                ],
            )
        }
    }
}

fn page_ref(name: &str, path: &str, ast_file: &str) -> PageRef {
    PageRef {
        name: name.to_string(),
        path: path.to_string(),
        ast_file: ast_file.to_string(),
    }
}

fn landing_home(title: &str, tagline: &str, cta: &str) -> PageAst {
    let mut hero = container("hero");
    hero.props.insert(
        "style".to_string(),
        style(&[("padding", "96px 24px"), ("text-align", "center")]),
    );

    push_child(&mut hero, text_node("hero-title", "Heading", "text", title));
    push_child(&mut hero, text_node("hero-tagline", "Text", "text", tagline));

    let mut cta_button = Node {
        id: "hero-cta".to_string(),
        component: "Button".to_string(),
        props: BTreeMap::from([(
            "label".to_string(),
            PropValue::Literal(Value::String(cta.to_string())),
        )]),
        slots: BTreeMap::new(),
        events: BTreeMap::new(),
    };
    cta_button.events.insert(
        "click".to_string(),
        vec![Action::ToggleState {
            key: "subscribed".to_string(),
        }],
    );
    push_child(&mut hero, cta_button);

    push_child(
        &mut hero,
        Node {
            id: "hero-status".to_string(),
            component: "Text".to_string(),
            props: BTreeMap::from([(
                "text".to_string(),
                PropValue::Dynamic(DynamicValue::Expression {
                    source: "Subscribed: {subscribed}".to_string(),
                }),
            )]),
            slots: BTreeMap::new(),
            events: BTreeMap::new(),
        },
    );

    let mut root = container("root");
    push_child(&mut root, hero);

    let mut state = BTreeMap::new();
    state.insert(
        "subscribed".to_string(),
        StateVar {
            value_type: "boolean".to_string(),
            default_value: json!(false),
        },
    );

    PageAst { root, state }
}

fn landing_about(body: &str) -> PageAst {
    let mut root = container("root");
    root.props.insert(
        "style".to_string(),
        style(&[("padding", "64px 24px"), ("max-width", "720px"), ("margin", "0 auto")]),
    );
    push_child(&mut root, text_node("about-title", "Heading", "text", "About"));
    push_child(&mut root, text_node("about-body", "Text", "text", body));

    PageAst {
        root,
        state: BTreeMap::new(),
    }
}

fn container(id: &str) -> Node {
    Node {
        id: id.to_string(),
        component: "Box".to_string(),
        props: BTreeMap::new(),
        slots: BTreeMap::from([("default".to_string(), vec![])]),
        events: BTreeMap::new(),
    }
}

fn text_node(id: &str, component: &str, prop: &str, text: &str) -> Node {
    Node {
        id: id.to_string(),
        component: component.to_string(),
        props: BTreeMap::from([(
            prop.to_string(),
            PropValue::Literal(Value::String(text.to_string())),
        )]),
        slots: BTreeMap::new(),
        events: BTreeMap::new(),
    }
}

fn push_child(parent: &mut Node, child: Node) {
    parent
        .slots
        .entry("default".to_string())
        .or_default()
        .push(child);
}

fn style(entries: &[(&str, &str)]) -> PropValue {
    let map: serde_json::Map<String, Value> = entries
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    PropValue::Literal(Value::Object(map))
}

fn global_styles(palette: &Palette, font_stack: &str) -> String {
    format!(
        ":root {{\n  --background: {};\n  --surface: {};\n  --text: {};\n  --accent: {};\n}}\n\nbody {{\n  margin: 0;\n  font-family: {};\n  background: var(--background);\n  color: var(--text);\n}}\n\n.site-nav {{\n  display: flex;\n  gap: 16px;\n  padding: 16px 24px;\n  background: var(--surface);\n}}\n\n.site-nav a {{\n  color: var(--accent);\n  text-decoration: none;\n}}\n\nbutton {{\n  background: var(--accent);\n  color: var(--background);\n  border: none;\n  padding: 12px 24px;\n  border-radius: 6px;\n  cursor: pointer;\n}}\n",
        palette.background, palette.surface, palette.text, palette.accent, font_stack
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_compiler::{generate, ComponentManifest};

    #[test]
    fn test_landing_template_generates_cleanly() {
        let (config, pages) = synthesize(
            TemplateKind::Landing,
            &BTreeMap::new(),
            &PALETTES[0],
            FONTS[0].1,
        );
        assert_eq!(config.pages.len(), 2);
        assert_eq!(pages.len(), 2);

        let manifest = ComponentManifest::builtin();
        for (_, page) in &pages {
            generate(page, &manifest, &[]).unwrap();
        }
    }

    #[test]
    fn test_variables_flow_into_seed_documents() {
        let variables = BTreeMap::from([
            ("projectName".to_string(), "Acme".to_string()),
            ("title".to_string(), "Hello Acme".to_string()),
        ]);
        let (config, pages) = synthesize(
            TemplateKind::Landing,
            &variables,
            &PALETTES[1],
            FONTS[1].1,
        );
        assert_eq!(config.project_name, "Acme");

        let home = serde_json::to_string(&pages[0].1).unwrap();
        assert!(home.contains("Hello Acme"));
    }

    #[test]
    fn test_palette_lands_in_global_styles() {
        let (config, _) = synthesize(
            TemplateKind::Blank,
            &BTreeMap::new(),
            &PALETTES[0],
            FONTS[0].1,
        );
        assert!(config.global_styles.contains("--accent: #38bdf8"));
        assert!(config.global_styles.contains("'Inter'"));
    }
}
