//! # Patch Operations
//!
//! Ordered structural edits against an untyped JSON document.
//!
//! ## Resolution rules
//!
//! - A path is a `/`-separated sequence of keys and indices
//! - The terminal segment `-` under an array target means "append" (add only)
//! - Traversing through a missing intermediate segment is an error; `add` may
//!   create the terminal key of an existing mapping but never synthesizes
//!   missing intermediate containers
//! - `add` at an existing scalar or mapping key overwrites it
//! - Array removal and replacement use the literal index

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Supported patch operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Add,
    Replace,
    Remove,
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Add => write!(f, "add"),
            OpKind::Replace => write!(f, "replace"),
            OpKind::Remove => write!(f, "remove"),
        }
    }
}

/// One patch operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOp {
    pub op: OpKind,

    /// Slash-separated path into the document, e.g. `/pages/-` or
    /// `/tree/slots/default/0/props/label`
    pub path: String,

    /// Operand for `add` and `replace`; ignored for `remove`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Why a single operation failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchErrorKind {
    #[error("empty patch path")]
    EmptyPath,

    #[error("malformed path (must start with '/'): {0}")]
    MalformedPath(String),

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("index out of range at {0}")]
    IndexOutOfRange(String),

    #[error("invalid array index at {0}")]
    InvalidIndex(String),

    #[error("cannot traverse into non-container at {0}")]
    NotAContainer(String),

    #[error("{0} requires a value operand")]
    MissingValue(OpKind),

    #[error("append ('-') is only valid for add")]
    AppendNotAllowed,
}

/// A rejected batch: the index of the failing operation plus the reason.
/// The target document is guaranteed unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("patch op {index} failed: {kind}")]
pub struct PatchError {
    pub index: usize,
    pub kind: PatchErrorKind,
}

/// Apply a single operation in place. The caller is responsible for batch
/// atomicity (apply against a scratch copy, commit on success).
pub fn apply_op(doc: &mut Value, op: &PatchOp) -> Result<(), PatchErrorKind> {
    let segments = parse_path(&op.path)?;
    let (terminal, parents) = segments
        .split_last()
        .ok_or(PatchErrorKind::EmptyPath)?;

    // Walk to the parent container; every intermediate segment must exist.
    let mut current = doc;
    let mut walked = String::new();
    for seg in parents {
        walked.push('/');
        walked.push_str(seg);
        current = match current {
            Value::Object(map) => map
                .get_mut(*seg)
                .ok_or_else(|| PatchErrorKind::PathNotFound(walked.clone()))?,
            Value::Array(items) => {
                let index = parse_index(seg)
                    .ok_or_else(|| PatchErrorKind::InvalidIndex(walked.clone()))?;
                let len = items.len();
                items
                    .get_mut(index)
                    .ok_or(PatchErrorKind::IndexOutOfRange(format!(
                        "{} (len {})",
                        walked, len
                    )))?
            }
            _ => return Err(PatchErrorKind::NotAContainer(walked)),
        };
    }

    match op.op {
        OpKind::Add => {
            let value = op
                .value
                .clone()
                .ok_or(PatchErrorKind::MissingValue(OpKind::Add))?;
            apply_add(current, terminal, value, &op.path)
        }
        OpKind::Replace => {
            let value = op
                .value
                .clone()
                .ok_or(PatchErrorKind::MissingValue(OpKind::Replace))?;
            apply_replace(current, terminal, value, &op.path)
        }
        OpKind::Remove => apply_remove(current, terminal, &op.path),
    }
}

fn apply_add(
    parent: &mut Value,
    terminal: &str,
    value: Value,
    path: &str,
) -> Result<(), PatchErrorKind> {
    match parent {
        // Existing keys are overwritten; a new terminal key on an existing
        // mapping is the one creation `add` is allowed to perform.
        Value::Object(map) => {
            map.insert(terminal.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            if terminal == "-" {
                items.push(value);
                return Ok(());
            }
            let index =
                parse_index(terminal).ok_or_else(|| PatchErrorKind::InvalidIndex(path.into()))?;
            if index > items.len() {
                return Err(PatchErrorKind::IndexOutOfRange(format!(
                    "{} (len {})",
                    path,
                    items.len()
                )));
            }
            items.insert(index, value);
            Ok(())
        }
        _ => Err(PatchErrorKind::NotAContainer(path.into())),
    }
}

fn apply_replace(
    parent: &mut Value,
    terminal: &str,
    value: Value,
    path: &str,
) -> Result<(), PatchErrorKind> {
    if terminal == "-" {
        return Err(PatchErrorKind::AppendNotAllowed);
    }
    match parent {
        Value::Object(map) => {
            let slot = map
                .get_mut(terminal)
                .ok_or_else(|| PatchErrorKind::PathNotFound(path.into()))?;
            *slot = value;
            Ok(())
        }
        Value::Array(items) => {
            let index =
                parse_index(terminal).ok_or_else(|| PatchErrorKind::InvalidIndex(path.into()))?;
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or(PatchErrorKind::IndexOutOfRange(format!(
                    "{} (len {})",
                    path, len
                )))?;
            *slot = value;
            Ok(())
        }
        _ => Err(PatchErrorKind::NotAContainer(path.into())),
    }
}

fn apply_remove(parent: &mut Value, terminal: &str, path: &str) -> Result<(), PatchErrorKind> {
    if terminal == "-" {
        return Err(PatchErrorKind::AppendNotAllowed);
    }
    match parent {
        Value::Object(map) => {
            map.remove(terminal)
                .ok_or_else(|| PatchErrorKind::PathNotFound(path.into()))?;
            Ok(())
        }
        Value::Array(items) => {
            let index =
                parse_index(terminal).ok_or_else(|| PatchErrorKind::InvalidIndex(path.into()))?;
            if index >= items.len() {
                return Err(PatchErrorKind::IndexOutOfRange(format!(
                    "{} (len {})",
                    path,
                    items.len()
                )));
            }
            items.remove(index);
            Ok(())
        }
        _ => Err(PatchErrorKind::NotAContainer(path.into())),
    }
}

fn parse_path(path: &str) -> Result<Vec<&str>, PatchErrorKind> {
    if path.is_empty() || path == "/" {
        return Err(PatchErrorKind::EmptyPath);
    }
    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| PatchErrorKind::MalformedPath(path.into()))?;
    Ok(rest.split('/').collect())
}

fn parse_index(seg: &str) -> Option<usize> {
    // Reject "+1", "01" etc. so array indices are unambiguous
    if seg.len() > 1 && seg.starts_with('0') {
        return None;
    }
    seg.parse::<usize>().ok()
}

/// First path segment of an op, used to route config vs. page ops.
pub(crate) fn first_segment(path: &str) -> Option<&str> {
    path.strip_prefix('/')?.split('/').next()
}
