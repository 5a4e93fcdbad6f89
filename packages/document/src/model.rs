use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Root project document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub project_name: String,

    #[serde(default)]
    pub pages: Vec<PageRef>,

    #[serde(default)]
    pub global_styles: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_name: "untitled".to_string(),
            pages: vec![],
            global_styles: String::new(),
        }
    }
}

/// One entry in the project's ordered page list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRef {
    pub name: String,
    pub path: String,
    pub ast_file: String,
}

/// One page's UI tree plus its state map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAst {
    /// Root node, addressed on the wire (and in patch paths) as `tree`
    #[serde(rename = "tree")]
    pub root: Node,

    #[serde(default)]
    pub state: BTreeMap<String, StateVar>,
}

impl PageAst {
    /// The minimal page a first patch lands in: an empty container root and
    /// no declared state.
    pub fn empty() -> Self {
        let mut slots = BTreeMap::new();
        slots.insert("default".to_string(), vec![]);
        Self {
            root: Node {
                id: "root".to_string(),
                component: "Box".to_string(),
                props: BTreeMap::new(),
                slots,
                events: BTreeMap::new(),
            },
            state: BTreeMap::new(),
        }
    }
}

/// One UI element: id, component type, props, named child slots, events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,

    #[serde(rename = "type")]
    pub component: String,

    #[serde(default)]
    pub props: BTreeMap<String, PropValue>,

    #[serde(default)]
    pub slots: BTreeMap<String, Vec<Node>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub events: BTreeMap<String, Vec<Action>>,
}

/// A prop value: a state binding, an interpolated expression, or a plain
/// JSON literal. Bindings and expressions are distinguished by their `kind`
/// tag; everything else deserializes as a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Dynamic(DynamicValue),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DynamicValue {
    /// Dereferences one state key directly
    StateBinding { key: String },

    /// Source text with `{key}` interpolation markers; substituted
    /// textually into a reactive expression, never parsed further
    Expression { source: String },
}

/// One entry in a page's state map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateVar {
    #[serde(rename = "type")]
    pub value_type: String,

    pub default_value: Value,
}

/// One event handler step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Action {
    SetState { key: String, value: Value },
    ToggleState { key: String },
    ShowAlert { message: String },
    Navigate { to: String },
}
