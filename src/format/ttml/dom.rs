//! Owned XML tree built on quick-xml events.
//!
//! Children are plain vectors so subtrees can be moved between documents
//! without copying.

use crate::error::{Result, VdkError};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, XmlNode::Text(_))
    }

    /// True for an element with the given local name.
    pub fn is_named(&self, name: &str) -> bool {
        self.as_element().map(|e| e.local_name() == name).unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.rfind(':') {
            Some(pos) => &self.name[pos + 1..],
            None => &self.name,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(a) => a.value = value.to_string(),
            None => self.attributes.push(XmlAttribute {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn take_attr(&mut self, name: &str) -> Option<XmlAttribute> {
        let pos = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(pos))
    }

    /// Same attribute count and every attribute present with the same value.
    pub fn same_attributes(&self, other: &XmlElement) -> bool {
        self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .all(|a| other.attr(&a.name) == Some(a.value.as_str()))
    }

    /// Index in `children` of the first element with this local name.
    pub fn child_index(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|c| c.is_named(name))
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is_named(name))?.as_element()
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children
            .iter_mut()
            .find(|c| c.is_named(name))?
            .as_element_mut()
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// Concatenated text content of direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) | XmlNode::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A parsed document: its root element and whether it carried a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root: XmlElement,
    pub has_declaration: bool,
}

fn xml_err(e: impl std::fmt::Display) -> VdkError {
    VdkError::Xml(e.to_string())
}

fn start_element(e: &BytesStart<'_>) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        element.attributes.push(XmlAttribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value: attr.unescape_value().map_err(xml_err)?.into_owned(),
        });
    }
    Ok(element)
}

impl XmlDocument {
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut has_declaration = false;

        loop {
            let node = match reader.read_event().map_err(xml_err)? {
                Event::Decl(_) => {
                    has_declaration = true;
                    continue;
                }
                Event::Start(e) => {
                    stack.push(start_element(&e)?);
                    continue;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| VdkError::Xml("unbalanced end tag".into()))?;
                    XmlNode::Element(element)
                }
                Event::Empty(e) => XmlNode::Element(start_element(&e)?),
                Event::Text(e) => XmlNode::Text(e.unescape().map_err(xml_err)?.into_owned()),
                Event::CData(e) => {
                    XmlNode::CData(String::from_utf8_lossy(&e.into_inner()).into_owned())
                }
                Event::Comment(e) => {
                    XmlNode::Comment(String::from_utf8_lossy(&e.into_inner()).into_owned())
                }
                Event::Eof => break,
                _ => continue,
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                // Whitespace and comments outside the root are dropped
                None => {
                    if let XmlNode::Element(element) = node {
                        if root.is_some() {
                            return Err(VdkError::Xml("multiple root elements".into()));
                        }
                        root = Some(element);
                    }
                }
            }
        }

        if !stack.is_empty() {
            return Err(VdkError::Xml(format!(
                "unclosed element <{}>",
                stack.last().map(|e| e.name.as_str()).unwrap_or_default()
            )));
        }
        let root = root.ok_or_else(|| VdkError::Xml("document has no root element".into()))?;
        Ok(Self {
            root,
            has_declaration,
        })
    }

    pub fn serialize(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        if self.has_declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(xml_err)?;
            writer.get_mut().push(b'\n');
        }
        write_element(&mut writer, &self.root)?;
        String::from_utf8(writer.into_inner()).map_err(xml_err)
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for attr in &element.attributes {
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }
    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(xml_err);
    }
    writer.write_event(Event::Start(start)).map_err(xml_err)?;
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e)?,
            XmlNode::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(xml_err)?,
            XmlNode::CData(t) => writer
                .write_event(Event::CData(BytesCData::new(t.as_str())))
                .map_err(xml_err)?,
            XmlNode::Comment(t) => writer
                .write_event(Event::Comment(BytesText::from_escaped(t.as_str())))
                .map_err(xml_err)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_tree() {
        let doc = XmlDocument::parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<tt xmlns="http://www.w3.org/ns/ttml" xml:lang="en"><head/><body><div region="r1"><p begin="1s">a &amp; b</p></div></body></tt>"#,
        )
        .unwrap();

        assert!(doc.has_declaration);
        assert_eq!(doc.root.name, "tt");
        assert_eq!(doc.root.attr("xml:lang"), Some("en"));
        let body = doc.root.child("body").unwrap();
        let div = body.child("div").unwrap();
        assert_eq!(div.attr("region"), Some("r1"));
        assert_eq!(div.child("p").unwrap().text(), "a & b");
    }

    #[test]
    fn test_local_name_match() {
        let doc = XmlDocument::parse(r#"<tt:tt xmlns:tt="x"><tt:body/></tt:tt>"#).unwrap();
        assert_eq!(doc.root.local_name(), "tt");
        assert!(doc.root.child("body").is_some());
    }

    #[test]
    fn test_serialize_round_trip() {
        let src = r#"<tt><body><div><p begin="0s" end="1s">x &lt; y</p>
</div></body></tt>"#;
        let doc = XmlDocument::parse(src).unwrap();
        assert!(!doc.has_declaration);
        assert_eq!(doc.serialize().unwrap(), src);
    }

    #[test]
    fn test_malformed() {
        assert!(XmlDocument::parse("<tt><body></tt>").is_err());
        assert!(XmlDocument::parse("   ").is_err());
        assert!(XmlDocument::parse("<a/><b/>").is_err());
    }

    #[test]
    fn test_same_attributes_ignores_order() {
        let mut a = XmlElement::new("p");
        a.set_attr("begin", "1s");
        a.set_attr("end", "2s");
        let mut b = XmlElement::new("p");
        b.set_attr("end", "2s");
        b.set_attr("begin", "1s");
        assert!(a.same_attributes(&b));
        b.set_attr("end", "3s");
        assert!(!a.same_attributes(&b));
        let c = XmlElement::new("p");
        assert!(!a.same_attributes(&c));
    }
}
