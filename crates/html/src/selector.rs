//! CSS selector subset used by response commands and the placeholder scan.
//!
//! Supported: type and `*`, `#id`, `.class`, `[attr]`, `[attr=value]` (quoted or
//! bare), `:not(<compound>)`, descendant and `>` combinators, `,` lists.
//! An empty selector is valid and matches nothing.
use crate::document::Document;
use crate::error::DomError;
use crate::types::NodeId;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<ComplexSelector>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ComplexSelector {
    compounds: Vec<CompoundSelector>,
    // combinators[i] joins compounds[i] and compounds[i + 1]
    combinators: Vec<Combinator>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct CompoundSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeSelector>,
    negations: Vec<CompoundSelector>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct AttributeSelector {
    name: String,
    value: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

impl Selector {
    pub fn parse(selector: &str) -> Result<Self, DomError> {
        let mut parser = Parser {
            source: selector,
            bytes: selector.as_bytes(),
            pos: 0,
        };
        parser.selector_list()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        doc.is_element(node)
            && self
                .alternatives
                .iter()
                .any(|complex| complex.matches_at(doc, node, complex.compounds.len() - 1))
    }
}

impl ComplexSelector {
    fn matches_at(&self, doc: &Document, node: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(doc, node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => doc
                .parent(node)
                .is_some_and(|parent| doc.is_element(parent) && self.matches_at(doc, parent, index - 1)),
            Combinator::Descendant => {
                let mut current = doc.parent(node);
                while let Some(ancestor) = current {
                    if doc.is_element(ancestor) && self.matches_at(doc, ancestor, index - 1) {
                        return true;
                    }
                    current = doc.parent(ancestor);
                }
                false
            }
        }
    }
}

impl CompoundSelector {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
            && self.negations.is_empty()
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(name) = doc.element_name(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if tag != "*" && !tag.eq_ignore_ascii_case(name) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if doc.attribute(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| doc.has_class(node, class)) {
            return false;
        }
        let attributes_match = self.attributes.iter().all(|attr| {
            match (doc.attribute(node, &attr.name), &attr.value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            }
        });
        attributes_match && !self.negations.iter().any(|negation| negation.matches(doc, node))
    }
}

impl Document {
    /// All connected elements matching `selector`, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        Ok(self.select_all(&Selector::parse(selector)?))
    }

    pub fn select_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.select_within(self.root(), selector)
    }

    /// Matching descendants of `scope` (the scope itself excluded).
    pub fn select_within(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        if selector.is_empty() {
            return Vec::new();
        }
        self.descendants(scope)
            .filter(|&node| selector.matches(self, node))
            .collect()
    }
}

struct Parser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> DomError {
        DomError::InvalidSelector {
            selector: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn selector_list(&mut self) -> Result<Selector, DomError> {
        let mut alternatives = Vec::new();
        self.skip_whitespace();
        if self.peek().is_none() {
            return Ok(Selector::default());
        }
        loop {
            alternatives.push(self.complex()?);
            match self.peek() {
                None => break,
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                }
                Some(other) => {
                    return Err(self.error(format!("unexpected `{}`", other as char)));
                }
            }
        }
        Ok(Selector { alternatives })
    }

    fn complex(&mut self) -> Result<ComplexSelector, DomError> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(b',') => break,
                Some(b'>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some(b'+') | Some(b'~') => {
                    return Err(self.error("sibling combinators are not supported"));
                }
                Some(_) if had_space => Combinator::Descendant,
                Some(other) => {
                    return Err(self.error(format!("unexpected `{}`", other as char)));
                }
            };
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }
        Ok(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<CompoundSelector, DomError> {
        let mut compound = CompoundSelector::default();
        if self.peek() == Some(b'*') {
            self.pos += 1;
            compound.tag = Some("*".to_string());
        } else if self.peek().is_some_and(is_ident_byte) {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
        }
        loop {
            match self.peek() {
                Some(b'#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some(b'.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some(b'[') => {
                    self.pos += 1;
                    compound.attributes.push(self.attribute()?);
                }
                Some(b':') => {
                    self.pos += 1;
                    compound.negations.push(self.negation()?);
                }
                _ => break,
            }
        }
        if compound.is_empty() {
            return Err(self.error("expected a simple selector"));
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Result<String, DomError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_byte) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected an identifier"));
        }
        Ok(self.source[start..self.pos].to_string())
    }

    fn attribute(&mut self) -> Result<AttributeSelector, DomError> {
        self.skip_whitespace();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        let value = match self.peek() {
            Some(b']') => None,
            Some(b'=') => {
                self.pos += 1;
                self.skip_whitespace();
                Some(self.attribute_value()?)
            }
            _ => return Err(self.error("unsupported attribute operator")),
        };
        self.skip_whitespace();
        if self.peek() != Some(b']') {
            return Err(self.error("unterminated attribute selector"));
        }
        self.pos += 1;
        Ok(AttributeSelector { name, value })
    }

    fn attribute_value(&mut self) -> Result<String, DomError> {
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                let start = self.pos + 1;
                let len = self.bytes[start..]
                    .iter()
                    .position(|&b| b == quote)
                    .ok_or_else(|| self.error("unterminated string"))?;
                self.pos = start + len + 1;
                Ok(self.source[start..start + len].to_string())
            }
            _ => self.ident(),
        }
    }

    fn negation(&mut self) -> Result<CompoundSelector, DomError> {
        let pseudo = self.ident()?;
        if !pseudo.eq_ignore_ascii_case("not") || self.peek() != Some(b'(') {
            return Err(self.error(format!("unsupported pseudo-class `:{pseudo}`")));
        }
        self.pos += 1;
        self.skip_whitespace();
        let inner = self.compound()?;
        self.skip_whitespace();
        if self.peek() != Some(b')') {
            return Err(self.error("unterminated :not()"));
        }
        self.pos += 1;
        Ok(inner)
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}
