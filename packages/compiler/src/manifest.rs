//! # Component Manifest Registry
//!
//! Read-only catalog mapping component type names to markup emission rules.
//! Supplied externally as JSON; the built-in catalog covers the fixed
//! component vocabulary shipped with pagecraft.

use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How one component type is emitted as target markup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitRule {
    /// Target tag name, e.g. `div` or `RouterLink`
    pub tag: String,

    /// Prop name → attribute name renames; unlisted props keep their name
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,

    /// Prop rendered as the element's text content instead of an attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_prop: Option<String>,

    /// Emit `<tag ... />` when the element has no children
    #[serde(default)]
    pub self_closing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentManifest {
    pub version: String,
    pub components: BTreeMap<String, EmitRule>,
}

impl ComponentManifest {
    /// Parse an externally supplied manifest feed
    pub fn from_json(source: &str) -> Result<Self, SchemaError> {
        let manifest: ComponentManifest = serde_json::from_str(source)
            .map_err(|e| SchemaError::InvalidManifest(e.to_string()))?;
        if manifest.components.is_empty() {
            return Err(SchemaError::InvalidManifest(
                "manifest declares no components".to_string(),
            ));
        }
        Ok(manifest)
    }

    /// Built-in catalog for the fixed component vocabulary
    pub fn builtin() -> Self {
        let mut components = BTreeMap::new();

        components.insert("Box".to_string(), EmitRule::plain("div"));
        components.insert("List".to_string(), EmitRule::plain("ul"));
        components.insert(
            "ListItem".to_string(),
            EmitRule::with_text("li", "text"),
        );
        components.insert(
            "Text".to_string(),
            EmitRule::with_text("p", "text"),
        );
        components.insert(
            "Heading".to_string(),
            EmitRule::with_text("h1", "text"),
        );
        components.insert(
            "Button".to_string(),
            EmitRule::with_text("button", "label"),
        );
        components.insert(
            "Input".to_string(),
            EmitRule {
                tag: "input".to_string(),
                attrs: BTreeMap::new(),
                text_prop: None,
                self_closing: true,
            },
        );
        components.insert(
            "Image".to_string(),
            EmitRule {
                tag: "img".to_string(),
                attrs: BTreeMap::new(),
                text_prop: None,
                self_closing: true,
            },
        );
        components.insert(
            "Link".to_string(),
            EmitRule {
                tag: "RouterLink".to_string(),
                attrs: BTreeMap::from([("href".to_string(), "to".to_string())]),
                text_prop: Some("text".to_string()),
                self_closing: false,
            },
        );

        Self {
            version: "builtin-1".to_string(),
            components,
        }
    }

    /// Resolve one component type, failing for unknown types
    pub fn rule(&self, component: &str) -> Result<&EmitRule, SchemaError> {
        self.components
            .get(component)
            .ok_or_else(|| SchemaError::UnknownComponent(component.to_string()))
    }
}

impl EmitRule {
    fn plain(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            text_prop: None,
            self_closing: false,
        }
    }

    fn with_text(tag: &str, text_prop: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            text_prop: Some(text_prop.to_string()),
            self_closing: false,
        }
    }
}
