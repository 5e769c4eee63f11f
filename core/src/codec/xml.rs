//! XML document to JSON value conversion.
//!
//! Mapping rules: the root element becomes the single key of the resulting
//! object. Attributes become plain keys with no marker prefix. Repeated child
//! names collapse into an array in document order. An element with neither
//! attributes nor children becomes its text, or `null` when empty. Text that
//! sits next to attributes or children is stored under `#text`.

use std::collections::HashSet;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::CodecError;

const TEXT_KEY: &str = "#text";

#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, CodecError> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(parse_error)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(parse_error)?.into_owned();
            attributes.push((key, value));
        }
        Ok(Element {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn into_value(self) -> Value {
        if self.attributes.is_empty() && self.children.is_empty() {
            return if self.text.is_empty() {
                Value::Null
            } else {
                Value::String(self.text)
            };
        }

        let mut map = Map::new();
        let mut grouped = HashSet::new();
        let entries = self
            .attributes
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .chain(self.children.into_iter().map(|child| {
                let name = child.name.clone();
                (name, child.into_value())
            }));

        for (key, value) in entries {
            match map.get_mut(&key) {
                Some(Value::Array(items)) if grouped.contains(&key) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                    grouped.insert(key);
                }
                None => {
                    map.insert(key, value);
                }
            }
        }

        if !self.text.is_empty() {
            map.insert(TEXT_KEY.to_string(), Value::String(self.text));
        }
        Value::Object(map)
    }
}

/// Parses `xml` and converts the whole document into a JSON value.
pub(super) fn document_to_value(xml: &str) -> Result<Value, CodecError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::open(&start)?),
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| CodecError::Parse("closing tag without matching opening tag".into()))?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => append_text(&mut stack, &text.unescape().map_err(parse_error)?)?,
            Event::CData(data) => append_text(&mut stack, &String::from_utf8_lossy(&data.into_inner()))?,
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(CodecError::Parse(format!("unexpected end of document inside <{}>", open.name)));
    }
    let root = root.ok_or_else(|| CodecError::Parse("document has no root element".into()))?;

    let mut document = Map::new();
    let name = root.name.clone();
    document.insert(name, root.into_value());
    Ok(Value::Object(document))
}

fn parse_error(err: impl std::fmt::Display) -> CodecError {
    CodecError::Parse(err.to_string())
}

fn attach(element: Element, stack: &mut [Element], root: &mut Option<Element>) -> Result<(), CodecError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(CodecError::Parse(format!("second root element <{}>", element.name)));
    }
    *root = Some(element);
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) -> Result<(), CodecError> {
    if text.is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(element) => {
            element.text.push_str(text);
            Ok(())
        }
        None => Err(CodecError::Parse("text outside the root element".into())),
    }
}
