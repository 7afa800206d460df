use crate::document::Document;
use crate::types::{NodeId, Token, is_void_element};

/// Builds `tokens` as children of `container`, returning the top-level nodes created.
///
/// End tags without a matching open element are ignored; elements left open at
/// the end of the stream are closed implicitly.
pub(crate) fn build_into(doc: &mut Document, tokens: Vec<Token>, container: NodeId) -> Vec<NodeId> {
    let mut open_elements: Vec<(NodeId, String)> = Vec::new();
    let mut top_level = Vec::new();

    for token in tokens {
        let parent = open_elements.last().map_or(container, |(id, _)| *id);
        let created = match token {
            Token::Doctype(doctype) => {
                if container == doc.root() {
                    doc.set_doctype(doctype);
                }
                None
            }
            Token::Comment(text) => Some(doc.create_comment(&text)),
            Token::Text(text) => Some(doc.create_text(&text)),
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let id = doc.create_element_with_attributes(&name, attributes);
                if !self_closing && !is_void_element(&name) {
                    open_elements.push((id, name));
                }
                Some(id)
            }
            Token::EndTag(name) => {
                if let Some(pos) = open_elements.iter().rposition(|(_, open)| *open == name) {
                    open_elements.truncate(pos);
                } else {
                    log::trace!(target: "html.builder", "ignoring stray end tag </{name}>");
                }
                None
            }
        };

        if let Some(id) = created {
            if doc.append_child(parent, id).is_ok() && parent == container {
                top_level.push(id);
            }
        }
    }

    top_level
}

#[cfg(test)]
mod tests {
    use crate::Document;

    #[test]
    fn nests_and_closes_implicitly() {
        let doc = Document::parse("<ul><li>one<li>two</ul><p>tail");
        assert_eq!(
            doc.to_html(),
            "<ul><li>one<li>two</li></li></ul><p>tail</p>"
        );
    }

    #[test]
    fn stray_end_tags_are_ignored() {
        let doc = Document::parse("<div>a</span>b</div>c");
        assert_eq!(doc.to_html(), "<div>ab</div>c");
    }

    #[test]
    fn void_elements_take_no_children() {
        let doc = Document::parse("<p>x<br>y<img src=a.png>z</p>");
        let p = doc.select("p").unwrap()[0];
        assert_eq!(doc.children(p).len(), 5);
        assert_eq!(doc.text_content(p), "xyz");
    }
}
