//! Minimal XML element tree for the XML-speaking sources.
//!
//! Upstream XML documents are small, so they are read into an owned tree
//! with [`quick_xml`] and then walked by the per-source normalizers.
//! Namespace prefixes are dropped and text is trimmed.

use quick_xml::events::{BytesStart, Event};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlNode>,
}

fn start_node(e: &BytesStart<'_>) -> XmlNode {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let attrs = e
        .attributes()
        .flatten()
        .map(|a| {
            let key = String::from_utf8_lossy(a.key.local_name().as_ref()).into_owned();
            let value = a
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned());
            (key, value)
        })
        .collect();
    XmlNode {
        name,
        attrs,
        ..Default::default()
    }
}

impl XmlNode {
    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<XmlNode, String> {
        let mut reader = quick_xml::Reader::from_reader(xml.as_bytes());
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => stack.push(start_node(&e)),
                Ok(Event::Empty(e)) => {
                    let node = start_node(&e);
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => root = Some(node),
                    }
                }
                Ok(Event::Text(t)) => {
                    if let Some(top) = stack.last_mut() {
                        let text = t
                            .unescape()
                            .map(|s| s.into_owned())
                            .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                        top.text.push_str(&text);
                    }
                }
                Ok(Event::CData(c)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Ok(Event::End(_)) => {
                    let node = stack.pop().ok_or("unbalanced closing tag")?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => root = Some(node),
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.to_string()),
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err("document ended inside an element".into());
        }
        root.ok_or_else(|| "empty document".into())
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a `/`-separated path of child names.
    pub fn find(&self, path: &str) -> Option<&XmlNode> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, name| node.child(name))
    }

    /// Trimmed, non-empty text at `path`.
    pub fn text_at(&self, path: &str) -> Option<String> {
        self.find(path)
            .map(|n| n.text.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_attributes_and_text() {
        let doc = r#"<?xml version="1.0"?>
            <items total="1">
              <item type="rpgitem" id="42">
                <name type="primary" value="Traveller"/>
                <description>Science &amp; fiction</description>
              </item>
            </items>"#;
        let root = XmlNode::parse(doc).unwrap();
        assert_eq!(root.name, "items");
        assert_eq!(root.attr("total"), Some("1"));

        let item = root.child("item").unwrap();
        assert_eq!(item.attr("id"), Some("42"));
        assert_eq!(item.child("name").unwrap().attr("value"), Some("Traveller"));
        assert_eq!(item.text_at("description").as_deref(), Some("Science & fiction"));
    }

    #[test]
    fn find_walks_paths() {
        let root = XmlNode::parse("<a><b><c>deep</c></b></a>").unwrap();
        assert_eq!(root.text_at("b/c").as_deref(), Some("deep"));
        assert!(root.find("b/x").is_none());
    }

    #[test]
    fn cdata_is_kept_as_text() {
        let root = XmlNode::parse("<a><![CDATA[<b>bold</b>]]></a>").unwrap();
        assert_eq!(root.text, "<b>bold</b>");
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(XmlNode::parse("").is_err());
        assert!(XmlNode::parse("<a><b></a>").is_err());
    }
}
