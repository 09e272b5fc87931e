//! Document tree capability surface and an in-memory implementation.
//!
//! Decoration only needs a handful of tree operations: create an element,
//! set attributes and text, append it under a container. `DocumentTree`
//! captures exactly that so the decorator can run against any tree; the
//! `MemoryDocument` arena is the implementation used by the CLI and tests.
//! It is populated from HTML through `scraper` and serializes back to HTML.

use std::fmt;

use crate::{Error, Result};

/// Attribute used to map serialized elements back to arena ids while
/// matching selectors.
pub(crate) const NODE_ID_ATTR: &str = "data-teapot-node";

/// Elements that never have a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text content is emitted unescaped
const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script"];

/// Opaque handle to a node of a `DocumentTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index)
    }
}

/// The two page containers decoration appends into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Head,
    Body,
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Head => f.write_str("head"),
            Container::Body => f.write_str("body"),
        }
    }
}

/// Minimal tree-mutation capabilities required by the decorator.
pub trait DocumentTree {
    /// Create a detached element with the given tag name
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Set (or replace) an attribute on an element
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;

    /// Read an attribute from an element
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Replace all children of an element with a single text node
    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<()>;

    /// Concatenated text of the node and its descendants
    fn text_content(&self, node: NodeId) -> Option<String>;

    /// Append `child` as the last child of `parent`, detaching it first if needed
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()>;

    /// Children of a node in document order
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Lowercase tag name, `None` for non-element nodes
    fn tag_name(&self, node: NodeId) -> Option<String>;

    /// Root node of the tree
    fn root(&self) -> NodeId;

    fn head(&self) -> Option<NodeId>;

    fn body(&self) -> Option<NodeId>;

    fn container(&self, which: Container) -> Option<NodeId> {
        match which {
            Container::Head => self.head(),
            Container::Body => self.body(),
        }
    }

    /// Set a single inline style property, keeping the other declarations.
    fn set_style_property(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        let mut decls = parse_inline_style(&self.attribute(node, "style").unwrap_or_default());
        match decls.iter_mut().find(|(p, _)| p.eq_ignore_ascii_case(property)) {
            Some(existing) => existing.1 = value.to_string(),
            None => decls.push((property.to_string(), value.to_string())),
        }
        self.set_attribute(node, "style", &format_inline_style(&decls))
    }

    /// Elements carrying `name`, in document order
    fn elements_with_attribute(&self, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            if self.attribute(node, name).is_some() {
                found.push(node);
            }
            for child in self.children(node).into_iter().rev() {
                stack.push(child);
            }
        }
        found
    }
}

/// Split a `style` attribute into ordered `(property, value)` pairs.
pub fn parse_inline_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim();
            if prop.is_empty() {
                return None;
            }
            Some((prop.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

pub fn format_inline_style(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(p, v)| format!("{}: {};", p, v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Payload of a node in a `MemoryDocument`
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Doctype(String),
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed HTML document
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<Node>,
}

impl MemoryDocument {
    /// A document holding only an `<html>` element (no head, no body)
    pub fn new() -> Self {
        let mut doc = Self::bare();
        let html = doc.create_element("html");
        doc.attach(doc.root(), html);
        doc
    }

    /// A document with an empty head and body
    pub fn with_containers() -> Self {
        let mut doc = Self::new();
        let html = doc.children(doc.root())[0];
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        doc.attach(html, head);
        doc.attach(html, body);
        doc
    }

    /// Parse an HTML document. Missing `html`/`head`/`body` elements are
    /// synthesized by the HTML parser, as a browser would.
    pub fn parse(html: &str) -> Result<Self> {
        let parsed = scraper::Html::parse_document(html);
        if let Some(first) = parsed.errors.first() {
            log::debug!("HTML parse reported {} recoverable errors (first: {})", parsed.errors.len(), first);
        }

        let mut doc = Self::bare();
        let root = doc.root();
        let mut stack = vec![(parsed.tree.root(), root)];
        while let Some((source, target)) = stack.pop() {
            for child in source.children() {
                let data = match child.value() {
                    scraper::Node::Element(el) => NodeData::Element {
                        name: el.name().to_string(),
                        attrs: el
                            .attrs()
                            .map(|(k, v)| (k.to_string(), v.to_string()))
                            .collect(),
                    },
                    scraper::Node::Text(text) => {
                        let text: &str = text;
                        NodeData::Text(text.to_string())
                    }
                    scraper::Node::Comment(comment) => {
                        let comment: &str = comment;
                        NodeData::Comment(comment.to_string())
                    }
                    scraper::Node::Doctype(doctype) => NodeData::Doctype(doctype.name().to_string()),
                    _ => continue,
                };
                let id = doc.push(data);
                doc.attach(target, id);
                stack.push((child, id));
            }
        }
        Ok(doc)
    }

    /// Serialize the whole document to HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.serialize(self.root(), &mut out, false);
        out
    }

    /// Serialize with every element tagged by its arena id
    pub(crate) fn to_tagged_html(&self) -> String {
        let mut out = String::new();
        self.serialize(self.root(), &mut out, true);
        out
    }

    pub fn data(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0).map(|n| &n.data)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.data(node), Some(NodeData::Element { .. }))
    }

    /// Child elements only, skipping text and comments
    pub fn child_elements(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .into_iter()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    /// All nodes below `node` in document order (excluding `node`)
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            for child in self.children(n).into_iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Elements with the given tag name anywhere in the document
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|n| self.tag_name(*n).as_deref() == Some(tag))
            .collect()
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.parent(n);
        }
        false
    }

    fn bare() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    // Unchecked append for ids known to be fresh and detached.
    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn check(&self, node: NodeId) -> Result<()> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(Error::InvalidNode(node.0))
        }
    }

    fn element_attrs_mut(&mut self, node: NodeId) -> Result<&mut Vec<(String, String)>> {
        self.check(node)?;
        match &mut self.nodes[node.0].data {
            NodeData::Element { attrs, .. } => Ok(attrs),
            _ => Err(Error::HierarchyRequest(format!(
                "node {} is not an element",
                node.0
            ))),
        }
    }

    fn find_child_element(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .into_iter()
            .find(|c| self.tag_name(*c).as_deref() == Some(name))
    }

    fn document_element(&self) -> Option<NodeId> {
        self.find_child_element(self.root(), "html")
    }

    fn serialize(&self, node: NodeId, out: &mut String, tag_ids: bool) {
        let mut stack = vec![Step::Open(node)];
        while let Some(step) = stack.pop() {
            let node = match step {
                Step::Open(node) => node,
                Step::Close(node) => {
                    if let Some(name) = self.tag_name(node) {
                        out.push_str("</");
                        out.push_str(&name);
                        out.push('>');
                    }
                    continue;
                }
            };
            match &self.nodes[node.0].data {
                NodeData::Document => {
                    for child in self.nodes[node.0].children.iter().rev() {
                        stack.push(Step::Open(*child));
                    }
                }
                NodeData::Doctype(name) => {
                    out.push_str("<!DOCTYPE ");
                    out.push_str(name);
                    out.push('>');
                }
                NodeData::Comment(text) => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
                NodeData::Text(text) => {
                    let raw = self
                        .parent(node)
                        .and_then(|p| self.tag_name(p))
                        .map(|t| RAW_TEXT_ELEMENTS.contains(&t.as_str()))
                        .unwrap_or(false);
                    if raw {
                        out.push_str(text);
                    } else {
                        escape_into(text, false, out);
                    }
                }
                NodeData::Element { name, attrs } => {
                    out.push('<');
                    out.push_str(name);
                    for (k, v) in attrs {
                        // The arena id must be the only copy the parser sees.
                        if tag_ids && k.eq_ignore_ascii_case(NODE_ID_ATTR) {
                            continue;
                        }
                        out.push(' ');
                        out.push_str(k);
                        out.push_str("=\"");
                        escape_into(v, true, out);
                        out.push('"');
                    }
                    if tag_ids {
                        out.push_str(&format!(" {}=\"{}\"", NODE_ID_ATTR, node.0));
                    }
                    out.push('>');
                    if VOID_ELEMENTS.contains(&name.as_str()) {
                        continue;
                    }
                    stack.push(Step::Close(node));
                    for child in self.nodes[node.0].children.iter().rev() {
                        stack.push(Step::Open(*child));
                    }
                }
            }
        }
    }
}

/// Pending work of the iterative serializer
enum Step {
    Open(NodeId),
    Close(NodeId),
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree for MemoryDocument {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element {
            name: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        let attrs = self.element_attrs_mut(node)?;
        let name = name.to_ascii_lowercase();
        match attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(existing) => existing.1 = value.to_string(),
            None => attrs.push((name, value.to_string())),
        }
        Ok(())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match self.data(node)? {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.element_attrs_mut(node)?;
        for child in std::mem::take(&mut self.nodes[node.0].children) {
            self.nodes[child.0].parent = None;
        }
        if !text.is_empty() {
            let text_node = self.push(NodeData::Text(text.to_string()));
            self.attach(node, text_node);
        }
        Ok(())
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        match self.data(node)? {
            NodeData::Text(t) | NodeData::Comment(t) => Some(t.clone()),
            _ => Some(
                self.descendants(node)
                    .into_iter()
                    .filter_map(|n| match &self.nodes[n.0].data {
                        NodeData::Text(t) => Some(t.as_str()),
                        _ => None,
                    })
                    .collect(),
            ),
        }
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check(parent)?;
        self.check(child)?;
        if !matches!(
            self.nodes[parent.0].data,
            NodeData::Element { .. } | NodeData::Document
        ) {
            return Err(Error::HierarchyRequest(format!(
                "node {} cannot have children",
                parent.0
            )));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(Error::HierarchyRequest(format!(
                "node {} is an ancestor of node {}",
                child.0, parent.0
            )));
        }
        if let Some(old) = self.nodes[child.0].parent.take() {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        self.attach(parent, child);
        Ok(())
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        match self.data(node)? {
            NodeData::Element { name, .. } => Some(name.clone()),
            _ => None,
        }
    }

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn head(&self) -> Option<NodeId> {
        self.find_child_element(self.document_element()?, "head")
    }

    fn body(&self) -> Option<NodeId> {
        self.find_child_element(self.document_element()?, "body")
    }
}

fn escape_into(text: &str, attr: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attr => out.push_str("&quot;"),
            '<' if !attr => out.push_str("&lt;"),
            '>' if !attr => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
