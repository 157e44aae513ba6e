// Generic XML -> tree conversion for tracking responses
//
// Every element becomes an `XmlNode`: its attributes (the `@attributes`
// mapping of the service's documentation), its child elements keyed by tag
// name and its text. Repeated sibling tags are collected into a list.
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::error::TrackingError;

pub type Attributes = BTreeMap<String, String>;

pub const ATTRIBUTES_KEY: &str = "@attributes";
pub const TEXT_KEY: &str = "0";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlNode {
    pub attributes: Attributes,
    pub children: BTreeMap<String, XmlValue>,
    pub text: Option<String>,
}

// A child tag seen once, or several times under the same parent
#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    Single(XmlNode),
    List(Vec<XmlNode>),
}

impl XmlValue {
    pub fn as_single(&self) -> Option<&XmlNode> {
        match self {
            XmlValue::Single(node) => Some(node),
            XmlValue::List(_) => None,
        }
    }

    pub fn nodes(&self) -> &[XmlNode] {
        match self {
            XmlValue::Single(node) => std::slice::from_ref(node),
            XmlValue::List(nodes) => nodes,
        }
    }

    fn push(&mut self, node: XmlNode) {
        let previous = std::mem::replace(self, XmlValue::List(Vec::new()));
        *self = match previous {
            XmlValue::Single(first) => XmlValue::List(vec![first, node]),
            XmlValue::List(mut nodes) => {
                nodes.push(node);
                XmlValue::List(nodes)
            }
        };
    }

    pub fn to_json(&self) -> Value {
        match self {
            XmlValue::Single(node) => node.to_json(),
            XmlValue::List(nodes) => Value::Array(nodes.iter().map(XmlNode::to_json).collect()),
        }
    }
}

impl XmlNode {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, TrackingError> {
        let mut attributes = Attributes::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| TrackingError::Xml(e.to_string()))?;
            let key = utf8(attr.key.as_ref())?;
            let value = unescape(utf8(&attr.value)?)
                .map_err(|e| TrackingError::Xml(e.to_string()))?;
            attributes.insert(key.to_string(), value.into_owned());
        }

        Ok(Self {
            attributes,
            ..Default::default()
        })
    }

    // No attributes, no children, no text
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty() && self.text.is_none()
    }

    fn insert_child(&mut self, name: String, node: XmlNode) {
        match self.children.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(XmlValue::Single(node));
            }
            Entry::Occupied(mut slot) => slot.get_mut().push(node),
        }
    }

    /// Follows `path` through child elements.
    ///
    /// Only single elements can be traversed: a repeated tag in the middle of
    /// the path yields `None`, as does any missing tag.
    pub fn lookup(&self, path: &[&str]) -> Option<&XmlValue> {
        let (first, rest) = path.split_first()?;
        let mut value = self.children.get(*first)?;
        for name in rest {
            value = value.as_single()?.children.get(*name)?;
        }
        Some(value)
    }

    pub fn node_at(&self, path: &[&str]) -> Option<&XmlNode> {
        if path.is_empty() {
            return Some(self);
        }
        self.lookup(path).and_then(XmlValue::as_single)
    }

    /// Attributes of the single element at `path`.
    ///
    /// Fails with `MissingField` when the element is absent, repeated or has
    /// no attributes at all.
    pub fn attributes_at(&self, path: &[&str]) -> Result<&Attributes, TrackingError> {
        self.node_at(path)
            .map(|node| &node.attributes)
            .filter(|attributes| !attributes.is_empty())
            .ok_or_else(|| TrackingError::MissingField(field_path(path)))
    }

    // Render as the generic mapping: `@attributes`, children by tag, the bare
    // text for leaf elements and `"0"` for text beside attributes.
    pub fn to_json(&self) -> Value {
        if self.attributes.is_empty() && self.children.is_empty() {
            return match &self.text {
                Some(text) => Value::String(text.clone()),
                None => Value::Object(Map::new()),
            };
        }

        let mut map = Map::new();
        if !self.attributes.is_empty() {
            let attributes = self
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            map.insert(ATTRIBUTES_KEY.to_string(), Value::Object(attributes));
        }
        for (name, value) in &self.children {
            map.insert(name.clone(), value.to_json());
        }
        // Text next to attributes is kept under the first positional key
        if self.children.is_empty() {
            if let Some(text) = &self.text {
                map.insert(TEXT_KEY.to_string(), Value::String(text.clone()));
            }
        }
        Value::Object(map)
    }
}

impl Serialize for XmlNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn field_path(path: &[&str]) -> String {
    if path.is_empty() {
        ATTRIBUTES_KEY.to_string()
    } else {
        format!("{}.{}", path.join("."), ATTRIBUTES_KEY)
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, TrackingError> {
    std::str::from_utf8(bytes).map_err(|e| TrackingError::Xml(e.to_string()))
}

// Element under construction: tag name, node, collected text
struct OpenElement {
    name: String,
    node: XmlNode,
    text: String,
}

impl OpenElement {
    fn close(mut self) -> (String, XmlNode) {
        let text = self.text.trim();
        if !text.is_empty() {
            self.node.text = Some(text.to_string());
        }
        (self.name, self.node)
    }
}

fn attach(
    stack: &mut [OpenElement],
    root: &mut Option<XmlNode>,
    name: String,
    node: XmlNode,
) -> Result<(), TrackingError> {
    match stack.last_mut() {
        Some(parent) => parent.node.insert_child(name, node),
        None if root.is_none() => *root = Some(node),
        None => {
            return Err(TrackingError::Xml(format!(
                "unexpected second root element <{}>",
                name
            )))
        }
    }
    Ok(())
}

/// Parses a response body and returns its root element.
pub fn parse_document(xml: &str) -> Result<XmlNode, TrackingError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(OpenElement {
                name: utf8(e.name().as_ref())?.to_string(),
                node: XmlNode::from_start(&e)?,
                text: String::new(),
            }),
            Ok(Event::Empty(e)) => {
                let name = utf8(e.name().as_ref())?.to_string();
                let node = XmlNode::from_start(&e)?;
                attach(&mut stack, &mut root, name, node)?;
            }
            Ok(Event::End(_)) => {
                if let Some(open) = stack.pop() {
                    let (name, node) = open.close();
                    attach(&mut stack, &mut root, name, node)?;
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(open) = stack.last_mut() {
                    let text = unescape(utf8(&e)?).map_err(|e| TrackingError::Xml(e.to_string()))?;
                    open.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(utf8(&e)?);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(open) = stack.last_mut() {
                    let reference = format!("&{};", utf8(&e)?);
                    let text =
                        unescape(&reference).map_err(|e| TrackingError::Xml(e.to_string()))?;
                    open.text.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TrackingError::Xml(format!(
                    "Error at position {}: {}",
                    reader.error_position(),
                    e
                )))
            }
            _ => (), // declarations, comments, processing instructions
        }
    }

    if let Some(open) = stack.last() {
        return Err(TrackingError::Xml(format!(
            "unclosed element <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| TrackingError::Xml("document has no root element".to_string()))
}

// A small piece-detail response for inline testing
#[cfg(test)]
pub(crate) const SAMPLE_DETAIL_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<data name="piece-shipment-list" code="0" request-id="a8b7c6">
  <data name="piece-shipment" piece-code="00340434161094042557" status="Die Sendung wurde zugestellt." delivery-event-flag="1">
    <data name="piece-event-list" piece-identifier="3SKAAA0000001">
      <data name="piece-event" event-timestamp="18.03.2016 10:02" event-status="Die Sendung wurde elektronisch angekündigt." ice="SHRCU"/>
      <data name="piece-event" event-timestamp="19.03.2016 08:45" event-status="Die Sendung wurde im Start-Paketzentrum bearbeitet." ice="LDTMV"/>
      <data name="piece-event" event-timestamp="21.03.2016 12:31" event-status="Die Sendung wurde zugestellt." ice="DLVRD"/>
    </data>
  </data>
</data>"#;
