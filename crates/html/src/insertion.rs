//! jQuery-style insertion relative to a target element.
use std::fmt;
use std::str::FromStr;

use crate::document::Document;
use crate::error::DomError;
use crate::types::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InsertMethod {
    /// Put the node where the target was; the target is removed.
    ReplaceWith,
    Before,
    After,
    Append,
    Prepend,
    /// Replace the target's children with the node.
    Html,
}

impl InsertMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            InsertMethod::ReplaceWith => "replaceWith",
            InsertMethod::Before => "before",
            InsertMethod::After => "after",
            InsertMethod::Append => "append",
            InsertMethod::Prepend => "prepend",
            InsertMethod::Html => "html",
        }
    }
}

impl FromStr for InsertMethod {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replaceWith" | "replace" => Ok(InsertMethod::ReplaceWith),
            "before" => Ok(InsertMethod::Before),
            "after" => Ok(InsertMethod::After),
            "append" => Ok(InsertMethod::Append),
            "prepend" => Ok(InsertMethod::Prepend),
            "html" => Ok(InsertMethod::Html),
            other => Err(DomError::UnknownInsertMethod(other.to_string())),
        }
    }
}

impl fmt::Display for InsertMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Document {
    /// Inserts `node` relative to `target` using `method`.
    ///
    /// `ReplaceWith`, `Before` and `After` need the target to have a parent.
    pub fn insert_relative(
        &mut self,
        target: NodeId,
        method: InsertMethod,
        node: NodeId,
    ) -> Result<(), DomError> {
        match method {
            InsertMethod::ReplaceWith => {
                let parent = self.parent(target).ok_or(DomError::Detached(target))?;
                self.insert_before(parent, node, target)?;
                self.remove(target)
            }
            InsertMethod::Before => {
                let parent = self.parent(target).ok_or(DomError::Detached(target))?;
                self.insert_before(parent, node, target)
            }
            InsertMethod::After => {
                let parent = self.parent(target).ok_or(DomError::Detached(target))?;
                match self.next_sibling(target) {
                    Some(next) => self.insert_before(parent, node, next),
                    None => self.append_child(parent, node),
                }
            }
            InsertMethod::Append => self.append_child(target, node),
            InsertMethod::Prepend => match self.first_child(target) {
                Some(first) => self.insert_before(target, node, first),
                None => self.append_child(target, node),
            },
            InsertMethod::Html => {
                for child in self.children(target).to_vec() {
                    self.remove(child)?;
                }
                self.append_child(target, node)
            }
        }
    }

    /// Replaces `wrapper` with its own children; returns those children.
    pub fn unwrap(&mut self, wrapper: NodeId) -> Result<Vec<NodeId>, DomError> {
        let parent = self.parent(wrapper).ok_or(DomError::Detached(wrapper))?;
        let children = self.children(wrapper).to_vec();
        for &child in &children {
            self.insert_before(parent, child, wrapper)?;
        }
        self.remove(wrapper)?;
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(method: &str) -> String {
        let mut doc = Document::parse(r#"<main><i>1</i><div id="t"><b>old</b></div><i>2</i></main>"#);
        let target = doc.select("#t").unwrap()[0];
        let node = doc.create_element("em");
        doc.insert_relative(target, method.parse().unwrap(), node).unwrap();
        doc.to_html()
    }

    #[test]
    fn every_method_places_the_node() {
        assert_eq!(apply("replaceWith"), "<main><i>1</i><em></em><i>2</i></main>");
        assert_eq!(apply("replace"), "<main><i>1</i><em></em><i>2</i></main>");
        assert_eq!(
            apply("before"),
            r#"<main><i>1</i><em></em><div id="t"><b>old</b></div><i>2</i></main>"#
        );
        assert_eq!(
            apply("after"),
            r#"<main><i>1</i><div id="t"><b>old</b></div><em></em><i>2</i></main>"#
        );
        assert_eq!(
            apply("append"),
            r#"<main><i>1</i><div id="t"><b>old</b><em></em></div><i>2</i></main>"#
        );
        assert_eq!(
            apply("prepend"),
            r#"<main><i>1</i><div id="t"><em></em><b>old</b></div><i>2</i></main>"#
        );
        assert_eq!(
            apply("html"),
            r#"<main><i>1</i><div id="t"><em></em></div><i>2</i></main>"#
        );
    }

    #[test]
    fn unknown_method_is_an_error() {
        assert_eq!(
            "replaceAll".parse::<InsertMethod>(),
            Err(DomError::UnknownInsertMethod("replaceAll".to_string()))
        );
    }

    #[test]
    fn after_last_child_appends() {
        let mut doc = Document::parse("<main><p></p></main>");
        let p = doc.select("p").unwrap()[0];
        let node = doc.create_text("x");
        doc.insert_relative(p, InsertMethod::After, node).unwrap();
        assert_eq!(doc.to_html(), "<main><p></p>x</main>");
    }

    #[test]
    fn detached_target_cannot_be_replaced() {
        let mut doc = Document::new();
        let target = doc.create_element("div");
        let node = doc.create_element("p");
        assert_eq!(
            doc.insert_relative(target, InsertMethod::ReplaceWith, node),
            Err(DomError::Detached(target))
        );
    }

    #[test]
    fn unwrap_leaves_children_in_place() {
        let mut doc = Document::parse("<main><i></i><div><p>a</p>b</div><i></i></main>");
        let wrapper = doc.select("main > div").unwrap()[0];
        let children = doc.unwrap(wrapper).unwrap();
        assert_eq!(children.len(), 2);
        assert!(!doc.is_live(wrapper));
        assert_eq!(doc.to_html(), "<main><i></i><p>a</p>b<i></i></main>");
    }
}
