//! # Code Generator
//!
//! Recursively renders a [`PageAst`] into one Vue 3 SFC. Literal prop text
//! is entity-escaped; state bindings become reactive references and
//! expressions become interpolated reactive expressions. Event handlers and
//! `ref()` declarations for the page's state map are emitted into a
//! `<script setup>` block.

use crate::manifest::ComponentManifest;
use crate::SchemaError;
use pagecraft_document::{Action, DynamicValue, Node, PageAst, PropValue};
use serde_json::Value;
use std::collections::HashSet;

/// A project-scope fragment (e.g. the navigation component) spliced once
/// into each page render rather than duplicated in every Page AST.
#[derive(Debug, Clone)]
pub struct SharedFragment {
    pub name: String,
    /// Target-framework markup, inserted verbatim at the designated slot
    pub markup: String,
}

struct Context {
    depth: usize,
    buffer: String,
}

impl Context {
    fn new() -> Self {
        Self {
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.add("  ");
        }
        self.add(text);
        self.add("\n");
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }
}

/// Script-side facts collected while walking the template
#[derive(Default)]
struct ScriptParts {
    handlers: Vec<(String, Vec<Action>)>,
    taken: HashSet<String>,
    uses_router: bool,
}

impl ScriptParts {
    /// Reserve a handler name. Distinct node ids can collapse to the same
    /// identifier (`a-b` and `aB` both pascal-case to `AB`), so collisions
    /// get a numeric suffix instead of shadowing each other.
    fn claim(&mut self, base: String) -> String {
        if self.taken.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}{}", base, n);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Compile one page to Vue SFC source text
pub fn generate(
    page: &PageAst,
    manifest: &ComponentManifest,
    shared: &[SharedFragment],
) -> Result<String, SchemaError> {
    for key in page.state.keys() {
        if !is_js_ident(key) {
            return Err(SchemaError::InvalidStateKey(key.clone()));
        }
    }
    validate_unique_ids(&page.root, &mut HashSet::new())?;

    let mut ctx = Context::new();
    let mut script = ScriptParts::default();

    ctx.add_line("<template>");
    ctx.indent();
    render_node(&page.root, Some(shared), page, manifest, &mut ctx, &mut script)?;
    ctx.dedent();
    ctx.add_line("</template>");

    if !page.state.is_empty() || !script.handlers.is_empty() {
        ctx.add("\n");
        render_script(page, &script, &mut ctx);
    }

    Ok(ctx.buffer)
}

fn render_node(
    node: &Node,
    shared: Option<&[SharedFragment]>,
    page: &PageAst,
    manifest: &ComponentManifest,
    ctx: &mut Context,
    script: &mut ScriptParts,
) -> Result<(), SchemaError> {
    let rule = manifest.rule(&node.component)?;

    let mut open = format!("<{}", rule.tag);
    open.push_str(&format!(" data-node-id=\"{}\"", escape_html(&node.id)));

    for (prop, value) in &node.props {
        if prop == "style" || Some(prop) == rule.text_prop.as_ref() {
            continue;
        }
        let attr = rule.attrs.get(prop).map(String::as_str).unwrap_or(prop);
        if let Some(rendered) = render_attr(attr, value, node, page)? {
            open.push(' ');
            open.push_str(&rendered);
        }
    }

    if let Some(PropValue::Literal(Value::Object(style))) = node.props.get("style") {
        let body: Vec<String> = style
            .iter()
            .map(|(k, v)| format!("{}: {}", k, style_value(v)))
            .collect();
        open.push_str(&format!(" style=\"{}\"", body.join("; ")));
    }

    for (event, actions) in &node.events {
        let handler = script.claim(handler_name(&node.id, event));
        for action in actions {
            validate_action(action, node, page)?;
        }
        if actions
            .iter()
            .any(|a| matches!(a, Action::Navigate { .. }))
        {
            script.uses_router = true;
        }
        script.handlers.push((handler.clone(), actions.clone()));
        open.push_str(&format!(" @{}=\"{}\"", event, handler));
    }

    let text = rule
        .text_prop
        .as_ref()
        .and_then(|prop| node.props.get(prop));
    let default_children = node.slots.get("default").map(Vec::as_slice).unwrap_or(&[]);
    let named_slots: Vec<(&String, &Vec<Node>)> = node
        .slots
        .iter()
        .filter(|(name, _)| name.as_str() != "default")
        .collect();
    let has_body = text.is_some()
        || !default_children.is_empty()
        || !named_slots.is_empty()
        || shared.map(|s| !s.is_empty()).unwrap_or(false);

    if !has_body && rule.self_closing {
        open.push_str(" />");
        ctx.add_line(&open);
        return Ok(());
    }

    open.push('>');
    ctx.add_line(&open);
    ctx.indent();

    // Shared fragments land before the page's own content
    if let Some(fragments) = shared {
        for fragment in fragments {
            for line in fragment.markup.lines() {
                ctx.add_line(line);
            }
        }
    }

    if let Some(value) = text {
        ctx.add_line(&render_text(value, node, page)?);
    }

    for child in default_children {
        render_node(child, None, page, manifest, ctx, script)?;
    }

    for (name, children) in named_slots {
        ctx.add_line(&format!("<template #{}>", name));
        ctx.indent();
        for child in children {
            render_node(child, None, page, manifest, ctx, script)?;
        }
        ctx.dedent();
        ctx.add_line("</template>");
    }

    ctx.dedent();
    ctx.add_line(&format!("</{}>", rule.tag));
    Ok(())
}

/// Render one prop as an attribute, or `None` to skip it
fn render_attr(
    attr: &str,
    value: &PropValue,
    node: &Node,
    page: &PageAst,
) -> Result<Option<String>, SchemaError> {
    match value {
        PropValue::Literal(Value::String(text)) => {
            Ok(Some(format!("{}=\"{}\"", attr, escape_html(text))))
        }
        PropValue::Literal(Value::Bool(b)) => Ok(Some(format!(":{}=\"{}\"", attr, b))),
        PropValue::Literal(Value::Number(n)) => Ok(Some(format!(":{}=\"{}\"", attr, n))),
        PropValue::Literal(Value::Null) => Ok(None),
        PropValue::Literal(other) => {
            // Structured literals bind as inline JSON; quotes become
            // entities so the attribute cannot terminate early
            let json = serde_json::to_string(other).unwrap_or_default();
            Ok(Some(format!(":{}=\"{}\"", attr, json.replace('"', "&quot;"))))
        }
        PropValue::Dynamic(DynamicValue::StateBinding { key }) => {
            resolve_key(key, node, page)?;
            Ok(Some(format!(":{}=\"{}\"", attr, key)))
        }
        PropValue::Dynamic(DynamicValue::Expression { source }) => {
            let literal = expression_to_template_literal(source, node, page)?;
            Ok(Some(format!(":{}=\"{}\"", attr, literal)))
        }
    }
}

/// Render one prop as element text content
fn render_text(value: &PropValue, node: &Node, page: &PageAst) -> Result<String, SchemaError> {
    match value {
        PropValue::Literal(Value::String(text)) => Ok(escape_html(text)),
        PropValue::Literal(Value::Number(n)) => Ok(n.to_string()),
        PropValue::Literal(Value::Bool(b)) => Ok(b.to_string()),
        PropValue::Literal(_) => Ok(String::new()),
        PropValue::Dynamic(DynamicValue::StateBinding { key }) => {
            resolve_key(key, node, page)?;
            Ok(format!("{{{{ {} }}}}", key))
        }
        PropValue::Dynamic(DynamicValue::Expression { source }) => {
            // `{key}` markers become Vue interpolations; surrounding text is
            // code-adjacent and passes through untouched
            let mut out = String::new();
            for part in expression_parts(source) {
                match part {
                    ExprPart::Text(text) => out.push_str(text),
                    ExprPart::Key(key) => {
                        resolve_key(key, node, page)?;
                        out.push_str(&format!("{{{{ {} }}}}", key));
                    }
                }
            }
            Ok(out)
        }
    }
}

fn render_script(page: &PageAst, script: &ScriptParts, ctx: &mut Context) {
    ctx.add_line("<script setup>");
    if !page.state.is_empty() {
        ctx.add_line("import { ref } from 'vue'");
    }
    if script.uses_router {
        ctx.add_line("import { useRouter } from 'vue-router'");
    }
    ctx.add("\n");

    for (key, var) in &page.state {
        ctx.add_line(&format!(
            "const {} = ref({})",
            key,
            js_literal(&var.default_value)
        ));
    }
    if script.uses_router {
        ctx.add_line("const router = useRouter()");
    }

    for (name, actions) in &script.handlers {
        ctx.add("\n");
        ctx.add_line(&format!("function {}() {{", name));
        ctx.indent();
        for action in actions {
            match action {
                Action::SetState { key, value } => {
                    ctx.add_line(&format!("{}.value = {}", key, js_literal(value)));
                }
                Action::ToggleState { key } => {
                    ctx.add_line(&format!("{}.value = !{}.value", key, key));
                }
                Action::ShowAlert { message } => {
                    ctx.add_line(&format!("alert({})", js_literal(&Value::String(message.clone()))));
                }
                Action::Navigate { to } => {
                    ctx.add_line(&format!("router.push({})", js_literal(&Value::String(to.clone()))));
                }
            }
        }
        ctx.dedent();
        ctx.add_line("}");
    }

    ctx.add_line("</script>");
}

fn validate_unique_ids<'a>(node: &'a Node, seen: &mut HashSet<&'a str>) -> Result<(), SchemaError> {
    if !seen.insert(&node.id) {
        return Err(SchemaError::DuplicateNodeId(node.id.clone()));
    }
    for children in node.slots.values() {
        for child in children {
            validate_unique_ids(child, seen)?;
        }
    }
    Ok(())
}

fn validate_action(action: &Action, node: &Node, page: &PageAst) -> Result<(), SchemaError> {
    match action {
        Action::SetState { key, .. } | Action::ToggleState { key } => resolve_key(key, node, page),
        Action::ShowAlert { .. } | Action::Navigate { .. } => Ok(()),
    }
}

fn resolve_key(key: &str, node: &Node, page: &PageAst) -> Result<(), SchemaError> {
    if page.state.contains_key(key) {
        Ok(())
    } else {
        Err(SchemaError::UnresolvedStateKey {
            key: key.to_string(),
            node_id: node.id.clone(),
        })
    }
}

enum ExprPart<'a> {
    Text(&'a str),
    Key(&'a str),
}

/// Split expression source into literal text and `{key}` markers. Braces
/// that do not wrap a plain identifier pass through as text.
fn expression_parts(source: &str) -> Vec<ExprPart<'_>> {
    let mut parts = vec![];
    let mut rest = source;
    while let Some(open) = rest.find('{') {
        let (before, after_open) = rest.split_at(open);
        if !before.is_empty() {
            parts.push(ExprPart::Text(before));
        }
        match after_open[1..].find('}') {
            Some(close) => {
                let candidate = &after_open[1..1 + close];
                if is_js_ident(candidate) {
                    parts.push(ExprPart::Key(candidate));
                } else {
                    parts.push(ExprPart::Text(&after_open[..close + 2]));
                }
                rest = &after_open[close + 2..];
            }
            None => {
                parts.push(ExprPart::Text(after_open));
                rest = "";
            }
        }
    }
    if !rest.is_empty() {
        parts.push(ExprPart::Text(rest));
    }
    parts
}

/// Compile an expression into a JS template literal for attribute position.
/// Only structural syntax is protected: quotes and backticks cannot
/// terminate the surrounding attribute or literal early.
fn expression_to_template_literal(
    source: &str,
    node: &Node,
    page: &PageAst,
) -> Result<String, SchemaError> {
    let mut body = String::new();
    for part in expression_parts(source) {
        match part {
            ExprPart::Text(text) => {
                body.push_str(&text.replace('\\', "\\\\").replace('`', "\\`").replace('"', "&quot;"));
            }
            ExprPart::Key(key) => {
                resolve_key(key, node, page)?;
                body.push_str(&format!("${{{}}}", key));
            }
        }
    }
    Ok(format!("`{}`", body))
}

/// Escape the five HTML-significant characters for literal text embedded in
/// double-quoted attributes or element content. `&` goes first so entities
/// this introduces are not escaped twice.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn style_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JSON values are valid JS literals as-is
fn js_literal(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn handler_name(node_id: &str, event: &str) -> String {
    format!("on{}{}", pascal_case(node_id), pascal_case(event))
}

fn is_js_ident(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// `hero-title` → `HeroTitle`, `home page` → `HomePage`
pub fn pascal_case(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
