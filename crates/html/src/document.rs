//! Mutable DOM arena.
//!
//! Invariants:
//! - Node 0 is the document root; it cannot be moved or removed.
//! - A node has at most one parent and appears once in that parent's child list.
//! - Removed nodes stay in the arena (handles are never reused) but are not live;
//!   every accessor treats them as missing.
//! - Detached live nodes (no parent) are allowed and are how fragments are staged
//!   before insertion.
use crate::dom_builder::build_into;
use crate::error::DomError;
use crate::tokenizer::tokenize;
use crate::types::{NodeId, NodeKind};

#[derive(Debug)]
struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    live: bool,
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeRecord>,
}

impl Document {
    const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![NodeRecord {
                kind: NodeKind::Document { doctype: None },
                parent: None,
                children: Vec::new(),
                live: true,
            }],
        }
    }

    pub fn parse(html: &str) -> Self {
        let mut doc = Self::new();
        build_into(&mut doc, tokenize(html), Self::ROOT);
        doc
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    /// The `<body>` element, or the root when the markup has none.
    pub fn body(&self) -> NodeId {
        self.descendants(Self::ROOT)
            .find(|&id| self.is_element_named(id, "body"))
            .unwrap_or(Self::ROOT)
    }

    pub fn doctype(&self) -> Option<&str> {
        match &self.nodes[Self::ROOT.index()].kind {
            NodeKind::Document { doctype } => doctype.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn set_doctype(&mut self, value: String) {
        if let NodeKind::Document { doctype } = &mut self.nodes[Self::ROOT.index()].kind {
            *doctype = Some(value);
        }
    }

    fn record(&self, id: NodeId) -> Result<&NodeRecord, DomError> {
        self.nodes
            .get(id.index())
            .filter(|record| record.live)
            .ok_or(DomError::MissingNode(id))
    }

    fn record_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, DomError> {
        self.nodes
            .get_mut(id.index())
            .filter(|record| record.live)
            .ok_or(DomError::MissingNode(id))
    }

    // -- Queries ---

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.record(id).ok().map(|record| &record.kind)
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        self.record(id).is_ok()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).ok().and_then(|record| record.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.record(id).map_or(&[], |record| record.children.as_slice())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let pos = siblings.iter().position(|&sibling| sibling == id)?;
        siblings.get(pos + 1).copied()
    }

    /// True when the node is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == Self::ROOT {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element_name(id).is_some()
    }

    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.kind(id).and_then(NodeKind::element_name)
    }

    pub fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        self.element_name(id)
            .is_some_and(|actual| actual.eq_ignore_ascii_case(name))
    }

    /// Preorder walk of everything below `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeKind::Text { text }) = self.kind(id) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let Some(NodeKind::Text { text }) = self.kind(node) {
                out.push_str(text);
            }
        }
        out
    }

    // -- Construction ---

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord {
            kind,
            parent: None,
            children: Vec::new(),
            live: true,
        });
        id
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.create_element_with_attributes(name, Vec::new())
    }

    pub fn create_element_with_attributes(
        &mut self,
        name: &str,
        attributes: Vec<(String, Option<String>)>,
    ) -> NodeId {
        self.push_node(NodeKind::Element {
            name: name.to_ascii_lowercase(),
            attributes,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text {
            text: text.to_string(),
        })
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Comment {
            text: text.to_string(),
        })
    }

    /// Parses `html` and appends the result to `parent`; returns the new top-level nodes.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Result<Vec<NodeId>, DomError> {
        let record = self.record(parent)?;
        if !record.kind.allows_children() {
            return Err(DomError::InvalidParent(parent));
        }
        Ok(build_into(self, tokenize(html), parent))
    }

    /// Parses `html` into detached top-level nodes.
    pub fn parse_fragment(&mut self, html: &str) -> Vec<NodeId> {
        let scratch = self.create_element("template");
        let nodes = build_into(self, tokenize(html), scratch);
        for &node in &nodes {
            let _ = self.detach(node);
        }
        let _ = self.remove(scratch);
        nodes
    }

    // -- Tree mutation ---

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if !self.record(parent)?.kind.allows_children() {
            return Err(DomError::InvalidParent(parent));
        }
        self.record(child)?;
        if child == Self::ROOT {
            return Err(DomError::RootImmutable);
        }
        let mut current = Some(parent);
        while let Some(node) = current {
            if node == child {
                return Err(DomError::Cycle { parent, child });
            }
            current = self.parent(node);
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insertable(parent, child)?;
        self.detach(child)?;
        self.record_mut(parent)?.children.push(child);
        self.record_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> Result<(), DomError> {
        self.check_insertable(parent, child)?;
        if child == before {
            return Ok(());
        }
        if self.parent(before) != Some(parent) {
            return Err(DomError::InvalidSibling { parent, before });
        }
        self.detach(child)?;
        let siblings = &mut self.record_mut(parent)?.children;
        let pos = siblings
            .iter()
            .position(|&sibling| sibling == before)
            .ok_or(DomError::InvalidSibling { parent, before })?;
        siblings.insert(pos, child);
        self.record_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Unlinks `id` from its parent; the subtree stays live.
    pub fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        if id == Self::ROOT {
            return Err(DomError::RootImmutable);
        }
        let Some(parent) = self.record_mut(id)?.parent.take() else {
            return Ok(());
        };
        self.record_mut(parent)?
            .children
            .retain(|&sibling| sibling != id);
        Ok(())
    }

    /// Unlinks `id` and retires its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            let record = self.record_mut(node)?;
            record.live = false;
            stack.extend(record.children.drain(..));
        }
        Ok(())
    }

    // -- Attributes ---

    fn attributes(&self, id: NodeId) -> Option<&[(String, Option<String>)]> {
        match self.kind(id)? {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    fn attributes_mut(
        &mut self,
        id: NodeId,
    ) -> Result<&mut Vec<(String, Option<String>)>, DomError> {
        match &mut self.record_mut(id)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    /// Attribute value; valueless attributes read as `""`.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_deref().unwrap_or(""))
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let attributes = self.attributes_mut(id)?;
        match attributes
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = Some(value.to_string()),
            None => attributes.push((name.to_ascii_lowercase(), Some(value.to_string()))),
        }
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        self.attributes_mut(id)?
            .retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        Ok(())
    }

    // -- Classes ---

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attribute(id, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let updated = match self.attribute(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", &updated)
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        let Some(existing) = self.attribute(id, "class") else {
            return Ok(());
        };
        let updated = existing
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(id, "class", &updated)
    }

    // -- Inline style ---

    pub fn style_property(&self, id: NodeId, property: &str) -> Option<String> {
        parse_style(self.attribute(id, "style")?)
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(property))
            .map(|(_, value)| value)
    }

    /// Sets (`Some`) or clears (`None`) one inline style property.
    pub fn set_style_property(
        &mut self,
        id: NodeId,
        property: &str,
        value: Option<&str>,
    ) -> Result<(), DomError> {
        let mut declarations = parse_style(self.attribute(id, "style").unwrap_or(""));
        let existing = declarations
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(property));
        match (existing, value) {
            (Some(pos), Some(value)) => declarations[pos].1 = value.to_string(),
            (None, Some(value)) => declarations.push((property.to_string(), value.to_string())),
            (Some(pos), None) => {
                declarations.remove(pos);
            }
            (None, None) => return Ok(()),
        }
        if declarations.is_empty() {
            return self.remove_attribute(id, "style");
        }
        let serialized = declarations
            .iter()
            .map(|(key, value)| format!("{key}: {value};"))
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(id, "style", &serialized)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (key, value) = declaration.split_once(':')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(next).iter().rev().copied());
        Some(next)
    }
}
