//! XML document to JSON text conversion.
//!
//! The mapping keeps the shape receipt consumers expect:
//!
//! - the document becomes `{"<Root>": <element>}`
//! - an element without attributes or children becomes its text (`""` if empty)
//! - otherwise it becomes an object: attributes under `-<name>`, child
//!   elements under their tag name, non-blank text under `#text`
//! - sibling elements sharing a tag name are collected into an array in
//!   document order
//!
//! All leaf values are strings; no numeric or boolean inference is made.

use crate::{CoreError, CoreResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

const ATTRIBUTE_PREFIX: &str = "-";
const TEXT_KEY: &str = "#text";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

struct Frame {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<(String, Value)>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> CoreResult<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| CoreError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| CoreError::Xml(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn into_value(self) -> (String, Value) {
        if self.attributes.is_empty() && self.children.is_empty() {
            return (self.name, Value::String(self.text));
        }

        let mut object = Map::new();
        for (key, value) in self.attributes {
            object.insert(format!("{ATTRIBUTE_PREFIX}{key}"), Value::String(value));
        }
        for (key, value) in self.children {
            match object.get_mut(&key) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    object.insert(key, value);
                }
            }
        }
        if !self.text.is_empty() {
            object.insert(TEXT_KEY.to_string(), Value::String(self.text));
        }

        (self.name, Value::Object(object))
    }
}

/// Convert an XML document to a JSON value.
pub fn xml_to_value(document: &[u8]) -> CoreResult<Value> {
    let document = document.strip_prefix(UTF8_BOM).unwrap_or(document);
    let text = std::str::from_utf8(document)
        .map_err(|e| CoreError::Xml(format!("document is not valid UTF-8: {e}")))?;

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| CoreError::Xml(format!("at byte {}: {e}", reader.buffer_position())))?;

        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(CoreError::Xml("more than one root element".to_string()));
                }
                stack.push(Frame::open(&start)?);
            }
            Event::Empty(start) => {
                let element = Frame::open(&start)?.into_value();
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| CoreError::Xml("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, frame.into_value())?;
            }
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    let unescaped = text.unescape().map_err(|e| CoreError::Xml(e.to_string()))?;
                    frame.text.push_str(&unescaped);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(CoreError::Xml(format!("unclosed element <{}>", open.name)));
    }

    let (name, value) = root.ok_or_else(|| CoreError::Xml("document has no root element".to_string()))?;
    let mut document = Map::new();
    document.insert(name, value);
    Ok(Value::Object(document))
}

/// Convert an XML document to compact JSON text.
pub fn xml_to_json(document: &[u8]) -> CoreResult<String> {
    let value = xml_to_value(document)?;
    Ok(serde_json::to_string(&value)?)
}

fn attach(
    stack: &mut [Frame],
    root: &mut Option<(String, Value)>,
    element: (String, Value),
) -> CoreResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(CoreError::Xml("more than one root element".to_string())),
    }
    Ok(())
}
