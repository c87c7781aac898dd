//! Parser for the restricted indentation-based manifest format.
//!
//! The manifest is a tiny YAML-like dialect: two-space indentation, one
//! `key: value` pair per line, `#` comments, nothing else. A key with no
//! value on its line opens a slot that becomes a nested mapping if (and
//! only if) a deeper-indented line later assigns into it; otherwise the
//! slot stays null. The slot is shared between the parent mapping and the
//! indentation stack, so promotion is visible through both handles.

use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to a parse node.
///
/// The parent mapping and the indentation stack both hold clones of the
/// same `Rc`, so promoting an undetermined slot to a mapping writes
/// through to every holder.
pub type NodeRef = Rc<RefCell<Node>>;

/// A value in the parsed manifest tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A key seen with an empty value and (so far) no nested children.
    /// Exposed as null when the document never nests under it.
    Undetermined,
    /// A plain string value.
    Scalar(String),
    /// A nested mapping, in insertion order.
    Mapping(Vec<(String, NodeRef)>),
}

impl Node {
    /// Return the scalar string, if this node is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Return the mapping entries, if this node is a mapping.
    pub fn entries(&self) -> Option<&[(String, NodeRef)]> {
        match self {
            Node::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// True for a slot that never received nested keys.
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Undetermined)
    }
}

/// Look up a key in a mapping node, cloning the shared handle.
pub fn get(node: &NodeRef, key: &str) -> Option<NodeRef> {
    match &*node.borrow() {
        Node::Mapping(entries) => entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| Rc::clone(value)),
        _ => None,
    }
}

/// Look up a key and return its scalar value, if it has one.
pub fn get_str(node: &NodeRef, key: &str) -> Option<String> {
    get(node, key).and_then(|child| child.borrow().as_str().map(str::to_owned))
}

/// Errors produced while parsing a manifest document.
///
/// Each variant carries the 1-based line number of the offending line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A line's leading-space count was not a multiple of two.
    #[error("odd indentation on line {line}")]
    OddIndentation {
        /// 1-based line number.
        line: usize,
    },

    /// A line was indented more than one level past its predecessor.
    #[error("too much indentation on line {line}")]
    TooMuchIndentation {
        /// 1-based line number.
        line: usize,
    },

    /// A payload line had no `:` separator.
    #[error("missing colon on line {line}")]
    MissingColon {
        /// 1-based line number.
        line: usize,
    },
}

/// Parse a manifest document into its root mapping.
///
/// Blank lines and `#` comments are skipped without affecting the
/// indentation stack. Indentation must be a multiple of two spaces and
/// may deepen by at most one level per line. Returning to a shallower
/// depth permanently discards the deeper containers.
///
/// # Errors
///
/// Returns a [`ParseError`] citing the offending line for odd
/// indentation, over-indentation, or a missing colon.
pub fn parse(text: &str) -> Result<NodeRef, ParseError> {
    let root: NodeRef = Rc::new(RefCell::new(Node::Mapping(Vec::new())));
    // stack[d] is the container receiving keys at depth d; depth 0 is
    // always the root and is never popped.
    let mut stack: Vec<NodeRef> = vec![Rc::clone(&root)];

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim_end();
        let content = line.trim_start_matches(' ');
        if content.is_empty() || content.starts_with('#') {
            continue;
        }

        let indent = line.len() - content.len();
        if indent % 2 != 0 {
            return Err(ParseError::OddIndentation { line: line_no });
        }
        let depth = indent / 2;
        if depth >= stack.len() {
            return Err(ParseError::TooMuchIndentation { line: line_no });
        }
        // Dedenting closes every deeper container for good; a later line
        // at that depth starts a fresh sibling slot.
        stack.truncate(depth + 1);

        let Some(colon) = content.find(':') else {
            return Err(ParseError::MissingColon { line: line_no });
        };
        let key = &content[..colon];
        let value = content[colon + 1..].trim_start_matches(' ');

        let container = Rc::clone(&stack[depth]);
        promote(&container);
        if value.is_empty() {
            let slot: NodeRef = Rc::new(RefCell::new(Node::Undetermined));
            insert(&container, key, Rc::clone(&slot));
            stack.push(slot);
        } else {
            insert(
                &container,
                key,
                Rc::new(RefCell::new(Node::Scalar(value.to_owned()))),
            );
        }
    }

    Ok(root)
}

/// Turn an undetermined slot into an empty mapping, in place.
///
/// Writes through the shared allocation, so the parent mapping sees the
/// promotion too.
fn promote(node: &NodeRef) {
    let mut slot = node.borrow_mut();
    if matches!(*slot, Node::Undetermined) {
        *slot = Node::Mapping(Vec::new());
    }
}

/// Insert `key` into a mapping node, replacing any earlier assignment.
fn insert(container: &NodeRef, key: &str, value: NodeRef) {
    if let Node::Mapping(entries) = &mut *container.borrow_mut() {
        if let Some(existing) = entries.iter_mut().find(|(name, _)| name == key) {
            existing.1 = value;
        } else {
            entries.push((key.to_owned(), value));
        }
    }
}
