//! Indentation-significant configuration tree.
//!
//! Actors describe themselves in a small tree grammar: one node per line, four
//! spaces of indentation per level, and an optional `= value` on every node.
//!
//! ```text
//! capabilities
//!     data
//!         name = "port"
//!         type = "int"
//!         value = "6200"
//! inputs
//!     input
//!         type = "OSC"
//! ```
//!
//! Values may be quoted (with `\"` and `\\` escapes) or bare. Text after an
//! unquoted `#` is a comment.

use std::fmt;
use thiserror::Error;

/// Name given to the synthetic root node that holds top-level entries.
pub const ROOT_NAME: &str = "root";

/// Spaces per indentation level.
const INDENT: usize = 4;

/// Grammar errors. These are the only fatal failures when reading a tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}

/// A single node of the configuration tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigTree {
    name: String,
    value: Option<String>,
    children: Vec<ConfigTree>,
}

impl ConfigTree {
    /// Create a node with no value and no children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            children: Vec::new(),
        }
    }

    /// Create an empty document root.
    pub fn root() -> Self {
        Self::new(ROOT_NAME)
    }

    /// Parse a document. Top-level entries become children of the returned root.
    pub fn parse(text: &str) -> Result<Self, TreeError> {
        // stack[0] is the root; stack[d] is the open node at depth d - 1.
        let mut stack: Vec<ConfigTree> = vec![Self::root()];

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let (depth, rest) = split_indent(raw, line_no)?;
            let rest = rest.trim_end();
            if rest.is_empty() || rest.starts_with('#') {
                continue;
            }

            if depth + 1 > stack.len() {
                return Err(TreeError::Syntax {
                    line: line_no,
                    message: format!(
                        "indentation jumps to level {} under level {}",
                        depth,
                        stack.len() - 1
                    ),
                });
            }

            while stack.len() > depth + 1 {
                close_top(&mut stack);
            }

            let node = parse_entry(rest, line_no)?;
            stack.push(node);
        }

        while stack.len() > 1 {
            close_top(&mut stack);
        }

        Ok(stack.pop().unwrap_or_else(Self::root))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node value, if one was given.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }

    pub fn children(&self) -> &[ConfigTree] {
        &self.children
    }

    /// Append a child node and return a mutable reference to it.
    pub fn add_child(&mut self, child: ConfigTree) -> &mut ConfigTree {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Append a `name = value` leaf.
    pub fn add_entry(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let mut child = ConfigTree::new(name);
        child.set_value(value);
        self.children.push(child);
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&ConfigTree> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut ConfigTree> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// All direct children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ConfigTree> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a slash-separated path of child names, taking the first match at
    /// every level. `"capabilities/data"` yields the first `data` node under the
    /// first `capabilities` node.
    pub fn locate(&self, path: &str) -> Option<&ConfigTree> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// Value of the child at `path`, if both exist.
    pub fn value_at(&self, path: &str) -> Option<&str> {
        self.locate(path).and_then(|n| n.value())
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:width$}{}", "", self.name, width = depth * INDENT)?;
        if let Some(value) = &self.value {
            write!(f, " = \"{}\"", escape(value))?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.write_node(f, depth + 1)?;
        }
        Ok(())
    }
}

/// Writes the node's children as a document, so that
/// `ConfigTree::parse(&tree.to_string())` reproduces `tree`.
impl fmt::Display for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for child in &self.children {
            child.write_node(f, 0)?;
        }
        Ok(())
    }
}

fn close_top(stack: &mut Vec<ConfigTree>) {
    if let Some(node) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(node);
        }
    }
}

fn split_indent(line: &str, line_no: usize) -> Result<(usize, &str), TreeError> {
    let mut spaces = 0;
    let mut depth = 0;
    let mut offset = 0;
    for ch in line.chars() {
        match ch {
            ' ' => {
                spaces += 1;
                if spaces == INDENT {
                    depth += 1;
                    spaces = 0;
                }
            }
            '\t' => depth += 1,
            _ => break,
        }
        offset += ch.len_utf8();
    }

    let rest = &line[offset..];
    if spaces != 0 && !rest.trim().is_empty() && !rest.starts_with('#') {
        return Err(TreeError::Syntax {
            line: line_no,
            message: format!("indentation must be a multiple of {} spaces", INDENT),
        });
    }
    Ok((depth, rest))
}

fn parse_entry(text: &str, line_no: usize) -> Result<ConfigTree, TreeError> {
    let name_end = text
        .find(|c: char| c.is_whitespace() || c == '=' || c == '#')
        .unwrap_or(text.len());
    let name = &text[..name_end];
    if name.is_empty() {
        return Err(TreeError::Syntax {
            line: line_no,
            message: "missing node name".to_string(),
        });
    }

    let mut node = ConfigTree::new(name);
    let rest = text[name_end..].trim_start();
    if let Some(after_eq) = rest.strip_prefix('=') {
        node.value = Some(parse_value(after_eq.trim_start(), line_no)?);
    }
    Ok(node)
}

fn parse_value(text: &str, line_no: usize) -> Result<String, TreeError> {
    let Some(quoted) = text.strip_prefix('"') else {
        let bare = text.split('#').next().unwrap_or("");
        return Ok(bare.trim().to_string());
    };

    let mut value = String::new();
    let mut chars = quoted.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => return Ok(value),
            '\\' => match chars.next() {
                Some(escaped) => value.push(escaped),
                None => break,
            },
            other => value.push(other),
        }
    }

    Err(TreeError::Syntax {
        line: line_no,
        message: "unterminated quoted value".to_string(),
    })
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
