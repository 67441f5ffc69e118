//! Content block trees as handed over by the host.
//!
//! Blocks arrive as JSON in the host's parsed-block format:
//!
//! ```json
//! { "blockName": "core/group", "attrs": { ... }, "innerBlocks": [ ... ] }
//! ```
//!
//! Decoding is defensive. A field of the wrong shape decodes as absent, so a
//! malformed block becomes a block without attributes or children rather than
//! a decoding failure.

use serde_json::Value;

use crate::error::{EngineError, Result};

/// One node of a content tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentNode {
    /// Block type name (e.g., `"core/paragraph"`), if present.
    pub name: Option<String>,
    /// Raw block attributes. Only the visibility path is ever interpreted.
    pub attrs: Value,
    /// Nested blocks, in document order.
    pub children: Vec<ContentNode>,
}

impl ContentNode {
    /// A node with the given block name and no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_attrs(mut self, attrs: Value) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_child(mut self, child: ContentNode) -> Self {
        self.children.push(child);
        self
    }

    /// Decode one block from its JSON representation.
    pub fn from_json(value: &Value) -> Self {
        let name = value
            .get("blockName")
            .and_then(Value::as_str)
            .map(str::to_string);
        let attrs = value.get("attrs").cloned().unwrap_or(Value::Null);
        let children = value
            .get("innerBlocks")
            .map(blocks_from_value)
            .unwrap_or_default();

        Self {
            name,
            attrs,
            children,
        }
    }
}

/// Decode a list of blocks. A single block object is accepted as a
/// one-element list; any other shape yields no blocks.
pub fn blocks_from_value(value: &Value) -> Vec<ContentNode> {
    match value {
        Value::Array(items) => items.iter().map(ContentNode::from_json).collect(),
        Value::Object(_) => vec![ContentNode::from_json(value)],
        _ => Vec::new(),
    }
}

/// Parse a JSON document into content blocks.
///
/// # Errors
///
/// Returns [`EngineError::InvalidContent`] if the text is not JSON at all.
/// JSON of an unexpected shape is not an error; it decodes to fewer blocks.
pub fn parse_blocks(json: &str) -> Result<Vec<ContentNode>> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| EngineError::InvalidContent(e.to_string()))?;
    Ok(blocks_from_value(&value))
}
