//! A small owned XML tree over quick-xml events.
//!
//! The tree keeps every node it does not understand (comments, processing
//! instructions, foreign elements and attributes) so a part can be parsed,
//! edited in a few places and written back without losing content.

use crate::error::{Error, Result};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node inside an element.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Element(Element),
    /// Unescaped character data
    Text(String),
    CData(String),
    /// Comments, processing instructions and anything else kept verbatim
    Misc(Event<'static>),
}

/// An element with its qualified name and attributes.
#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub name: String,
    /// Qualified attribute names with unescaped values, in source order
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// A parsed XML part.
#[derive(Debug, Clone)]
pub(crate) struct XmlDocument {
    prolog: Vec<Event<'static>>,
    pub root: Element,
    epilog: Vec<Event<'static>>,
}

fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::CorruptDocument(format!("bad attribute: {}", e)))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            element.attrs.push((key, value));
        }
        Ok(element)
    }

    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// Qualify `local` with this element's namespace prefix.
    pub fn qualified(&self, local: &str) -> String {
        match self.name.split_once(':') {
            Some((prefix, _)) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        }
    }

    fn attr_position(&self, local: &str) -> Option<usize> {
        self.attrs
            .iter()
            .position(|(key, _)| !key.starts_with("xmlns") && local_part(key) == local)
    }

    /// Attribute value by local name.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attr_position(local).map(|i| self.attrs[i].1.as_str())
    }

    /// Set an attribute by local name, adding it with this element's prefix if absent.
    pub fn set_attr(&mut self, local: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attr_position(local) {
            Some(i) => self.attrs[i].1 = value,
            None => {
                let key = self.qualified(local);
                self.attrs.push((key, value));
            }
        }
    }

    /// Set an attribute by its exact qualified name (e.g. `xml:space`).
    pub fn set_raw_attr(&mut self, key: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.attrs.push((key.to_string(), value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, local: &str) {
        while let Some(i) = self.attr_position(local) {
            self.attrs.remove(i);
        }
    }

    /// Child elements in order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn child(&self, local: &str) -> Option<&Element> {
        self.elements().find(|el| el.is(local))
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(el) if el.is(local) => Some(el),
            _ => None,
        })
    }

    /// Indices into `children` of the child elements named `local`.
    pub fn child_indices(&self, local: &str) -> Vec<usize> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node {
                Node::Element(el) if el.is(local) => Some(i),
                _ => None,
            })
            .collect()
    }

    /// The element at `children[index]`, if that node is an element.
    pub fn element_at(&self, index: usize) -> Option<&Element> {
        match self.children.get(index) {
            Some(Node::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn element_at_mut(&mut self, index: usize) -> Option<&mut Element> {
        match self.children.get_mut(index) {
            Some(Node::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn remove_children(&mut self, local: &str) {
        self.children
            .retain(|node| !matches!(node, Node::Element(el) if el.is(local)));
    }

    /// Concatenated text and CDATA content of this element.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all content with a single text node.
    pub fn set_text(&mut self, text: &str) {
        self.children = vec![Node::Text(text.to_string())];
    }

    /// Find the child `local`, or insert it as the first child.
    pub fn ensure_first_child(&mut self, local: &str) -> &mut Element {
        let index = match self.child_indices(local).first() {
            Some(&i) => i,
            None => {
                let name = self.qualified(local);
                self.children.insert(0, Node::Element(Element::new(name)));
                0
            }
        };
        self.expect_element(index)
    }

    /// Find the child `local`, or insert it where `order` (the schema's
    /// child sequence) places it among the existing children.
    pub fn ensure_child(&mut self, local: &str, order: &[&str]) -> &mut Element {
        let index = match self.child_indices(local).first() {
            Some(&i) => i,
            None => {
                let index = self.insertion_index(local, order);
                let name = self.qualified(local);
                self.children.insert(index, Node::Element(Element::new(name)));
                index
            }
        };
        self.expect_element(index)
    }

    fn insertion_index(&self, local: &str, order: &[&str]) -> usize {
        let Some(rank) = order.iter().position(|name| *name == local) else {
            return self.children.len();
        };
        self.children
            .iter()
            .position(|node| match node {
                Node::Element(el) => order
                    .iter()
                    .position(|name| *name == el.local_name())
                    .is_some_and(|other| other > rank),
                _ => false,
            })
            .unwrap_or(self.children.len())
    }

    fn expect_element(&mut self, index: usize) -> &mut Element {
        match &mut self.children[index] {
            Node::Element(el) => el,
            _ => unreachable!("index was produced from an element position"),
        }
    }
}

impl XmlDocument {
    /// Parse an XML part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => stack.push(Element::from_start(e)?),
                Event::Empty(ref e) => {
                    let element = Element::from_start(e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::CorruptDocument("unbalanced end tag".into()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(t) => match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(t.unescape()?.into_owned())),
                    None => outside_root(&root, &mut prolog, &mut epilog, Event::Text(t.into_owned())),
                },
                Event::CData(c) => match stack.last_mut() {
                    Some(parent) => parent
                        .children
                        .push(Node::CData(String::from_utf8_lossy(&c).into_owned())),
                    None => outside_root(&root, &mut prolog, &mut epilog, Event::CData(c.into_owned())),
                },
                Event::Eof => break,
                other => match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Misc(other.into_owned())),
                    None => outside_root(&root, &mut prolog, &mut epilog, other.into_owned()),
                },
            }
        }

        if !stack.is_empty() {
            return Err(Error::CorruptDocument("unclosed element at end of part".into()));
        }
        let root = root.ok_or_else(|| Error::CorruptDocument("part has no root element".into()))?;

        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    /// Serialize back to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for event in &self.prolog {
            writer.write_event(event.clone())?;
        }
        write_element(&mut writer, &self.root)?;
        for event in &self.epilog {
            writer.write_event(event.clone())?;
        }
        Ok(writer.into_inner())
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::CorruptDocument("multiple root elements".into())),
    }
    Ok(())
}

fn outside_root(
    root: &Option<Element>,
    prolog: &mut Vec<Event<'static>>,
    epilog: &mut Vec<Event<'static>>,
    event: Event<'static>,
) {
    if root.is_none() {
        prolog.push(event);
    } else {
        epilog.push(event);
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(el) => write_element(writer, el)?,
            Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            Node::CData(data) => writer.write_event(Event::CData(BytesCData::new(data.as_str())))?,
            Node::Misc(event) => writer.write_event(event.clone())?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}
