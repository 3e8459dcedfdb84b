//! XHTML ingestion and markup rendering for the reference document

use std::fmt::Write;

use roxmltree::{NodeType, ParsingOptions};

use super::traits::DocumentAdapter;
use super::tree::{Document, NodeData, NodeId};
use crate::config::MarkupConfig;
use crate::error::Result;

impl Document {
    /// Parse an XHTML (or any XML) string.
    ///
    /// Elements and text are kept; comments and processing instructions are
    /// dropped, and text on either side of a dropped node is coalesced into
    /// one leaf. Attributes keep their local names.
    pub fn from_xhtml(content: &str) -> Result<Self> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let xml = roxmltree::Document::parse_with_options(content, options)?;

        let mut doc = Document::new();
        let root = doc.root();
        doc.append_xml_node(root, xml.root_element())?;

        tracing::debug!(nodes = doc.nodes.len(), "Parsed XHTML document");
        Ok(doc)
    }

    fn append_xml_node(&mut self, parent: NodeId, node: roxmltree::Node<'_, '_>) -> Result<()> {
        let attributes = node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect();
        let element =
            self.append_element_with_attributes(parent, node.tag_name().name(), attributes)?;

        for child in node.children() {
            match child.node_type() {
                NodeType::Element => self.append_xml_node(element, child)?,
                NodeType::Text => {
                    if let Some(text) = child.text() {
                        self.append_text(element, text)?;
                    }
                }
                NodeType::Root | NodeType::Comment | NodeType::PI => {}
            }
        }
        Ok(())
    }

    /// Serialize the document, rendering annotation wrappers as tagged
    /// elements carrying the annotation id and sub-index
    pub fn to_markup(&self, config: &MarkupConfig) -> String {
        let mut out = String::new();
        for child in self.children(self.root()) {
            self.write_node(&mut out, child, config);
        }
        out
    }

    fn write_node(&self, out: &mut String, node: NodeId, config: &MarkupConfig) {
        let slot = &self.nodes[node.index()];
        match &slot.data {
            NodeData::Text(text) => out.push_str(&html_escape::encode_text(text)),
            NodeData::Wrapper(tag) => {
                let _ = write!(
                    out,
                    r#"<{} class="{}" {}="{}" {}="{}">"#,
                    config.tag,
                    html_escape::encode_double_quoted_attribute(&config.class_name),
                    config.id_attribute,
                    tag.annotation,
                    config.sub_attribute,
                    tag.sub_index,
                );
                for &child in &slot.children {
                    self.write_node(out, child, config);
                }
                let _ = write!(out, "</{}>", config.tag);
            }
            NodeData::Element { name, attributes } => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attributes {
                    let _ = write!(
                        out,
                        r#" {}="{}""#,
                        key,
                        html_escape::encode_double_quoted_attribute(value)
                    );
                }
                if slot.children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in &slot.children {
                    self.write_node(out, child, config);
                }
                let _ = write!(out, "</{}>", name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{NodeKind, WrapperTag};
    use crate::error::AnchorError;

    const CHAPTER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<body><p class="intro">Call me <!-- aside -->Ishmael.</p><p>Some <em>years</em> ago</p></body>
</html>"#;

    #[test]
    fn test_from_xhtml_structure() {
        let doc = Document::from_xhtml(CHAPTER).unwrap();
        let html = doc.child(doc.root(), 0).unwrap();
        assert_eq!(doc.element_name(html), Some("html"));

        let body = doc.resolve(&"/0/1".parse().unwrap()).unwrap();
        assert_eq!(doc.element_name(body), Some("body"));

        let intro = doc.child(body, 0).unwrap();
        assert_eq!(doc.children(intro).len(), 1);
        assert_eq!(doc.leaf_texts()[..2], ["\n", "Call me Ishmael."]);
    }

    #[test]
    fn test_from_xhtml_rejects_malformed() {
        let result = Document::from_xhtml("<p>unclosed");
        assert!(matches!(result, Err(AnchorError::Parse(_))));
    }

    #[test]
    fn test_to_markup_renders_wrappers() {
        let mut doc = Document::from_xhtml("<p>Tom &amp; Jerry</p>").unwrap();
        let p = doc.child(doc.root(), 0).unwrap();
        let leaf = doc.child(p, 0).unwrap();
        let outcome = doc.wrap(leaf, 6, 11, WrapperTag::new(3, 0)).unwrap();
        assert_eq!(doc.kind(outcome.wrapper), NodeKind::Wrapper(WrapperTag::new(3, 0)));

        let markup = doc.to_markup(&MarkupConfig::default());
        assert_eq!(
            markup,
            r#"<p>Tom &amp; <span class="ll-highlight" data-annotation-id="3" data-annotation-sub="0">Jerry</span></p>"#
        );
    }

    #[test]
    fn test_to_markup_escapes_attributes_and_self_closes() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc
            .append_element_with_attributes(root, "p", vec![("title".into(), "\"q\"".into())])
            .unwrap();
        doc.append_element(p, "br").unwrap();
        assert_eq!(
            doc.to_markup(&MarkupConfig::default()),
            r#"<p title="&quot;q&quot;"><br/></p>"#
        );
    }
}
