//! Minimal element tree built from quick-xml events.
//!
//! Slide parts are small, so the reader materializes each one and walks it
//! by local name instead of tracking parser state across events.

use deck_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// An element with its attributes and children. Element names are local
/// names; attribute keys stay qualified (`r:id` and `id` can coexist).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlChild {
    Element(XmlNode),
    Text(String),
}

impl XmlNode {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(local_name(start.name().as_ref())).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::XmlError(format!("Bad attribute on <{}>: {}", name, e)))?;
            attributes.push((key, value.into_owned()));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    /// Attribute value by qualified key, else by local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|(key, _)| local_name(key.as_bytes()) == name.as_bytes())
            })
            .map(|(_, value)| value.as_str())
    }

    /// Attribute parsed as an integer.
    pub fn attr_i64(&self, name: &str) -> Option<i64> {
        self.attr(name).and_then(|v| v.trim().parse().ok())
    }

    /// OOXML boolean attribute (`1`/`true`/`on`).
    pub fn attr_flag(&self, name: &str) -> bool {
        matches!(self.attr(name), Some("1" | "true" | "on"))
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlNode> {
        self.children.iter().filter_map(|child| match child {
            XmlChild::Element(node) => Some(node),
            XmlChild::Text(_) => None,
        })
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.elements().find(|node| node.name == name)
    }

    /// All child elements with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.elements().filter(move |node| node.name == name)
    }

    /// Follow a path of child names.
    pub fn path(&self, names: &[&str]) -> Option<&XmlNode> {
        names
            .iter()
            .try_fold(self, |node, name| node.child(name))
    }

    /// First descendant (depth-first, excluding self) with the given name.
    pub fn descendant(&self, name: &str) -> Option<&XmlNode> {
        for node in self.elements() {
            if node.name == name {
                return Some(node);
            }
            if let Some(found) = node.descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text of all `t` descendants.
    pub fn text_of_t(&self) -> String {
        let mut out = String::new();
        self.collect_t(&mut out);
        out
    }

    fn collect_t(&self, out: &mut String) {
        for node in self.elements() {
            if node.name == "t" {
                out.push_str(&node.text());
            } else {
                node.collect_t(out);
            }
        }
    }

    /// Direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlChild::Text(text) => Some(text.as_str()),
                XmlChild::Element(_) => None,
            })
            .collect()
    }
}

/// Parse a document and return its root element.
pub fn parse(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(XmlNode::from_start(e)?),
            Ok(Event::Empty(ref e)) => {
                let node = XmlNode::from_start(e)?;
                attach(&mut stack, &mut root, node);
            }
            Ok(Event::End(_)) => {
                if let Some(node) = stack.pop() {
                    attach(&mut stack, &mut root, node);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::XmlError(format!("Bad text content: {}", e)))?;
                    parent.children.push(XmlChild::Text(text.into_owned()));
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(e).into_owned();
                    parent.children.push(XmlChild::Text(text));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    // Tolerate truncated documents by closing whatever is still open.
    while let Some(node) = stack.pop() {
        attach(&mut stack, &mut root, node);
    }
    root.ok_or_else(|| Error::XmlError("Document has no root element".to_string()))
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlChild::Element(node)),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

/// Extract the local name from a potentially namespaced XML name.
pub fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_parse_tree_with_prefixes() {
        let root = parse(
            r#"<?xml version="1.0"?><p:sld xmlns:p="p" xmlns:r="r"><p:pic><a:blip r:embed="rId2"/></p:pic></p:sld>"#,
        )
        .unwrap();
        assert_eq!(root.name, "sld");
        let blip = root.descendant("blip").unwrap();
        assert_eq!(blip.attr("embed"), Some("rId2"));
    }

    #[test]
    fn test_qualified_attribute_wins() {
        let root = parse(r#"<p:sldId id="256" r:id="rId2"/>"#).unwrap();
        assert_eq!(root.attr("r:id"), Some("rId2"));
        assert_eq!(root.attr("id"), Some("256"));
    }

    #[test]
    fn test_text_keeps_whitespace_and_entities() {
        let root = parse("<a:r><a:t> a &amp; b </a:t></a:r>").unwrap();
        assert_eq!(root.text_of_t(), " a & b ");
    }

    #[test]
    fn test_path_and_flags() {
        let root = parse(r#"<tc hMerge="1"><txBody><p/></txBody></tc>"#).unwrap();
        assert!(root.attr_flag("hMerge"));
        assert!(!root.attr_flag("vMerge"));
        assert!(root.path(&["txBody", "p"]).is_some());
        assert!(root.path(&["txBody", "r"]).is_none());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(parse("<a><b></c></a>").is_err());
        assert!(parse("   ").is_err());
    }
}
