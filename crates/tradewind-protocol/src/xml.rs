//! Conversion between [`Element`] trees and XML text.
//!
//! Reading is strict about structure: a closing tag that does not match
//! the open one, input that ends inside an element, or anything other
//! than exactly one root element is reported as
//! [`ProtocolError::StreamCorruption`]. Once the tree is built, any
//! further problem belongs to the message decoders and is a content
//! error.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::{Element, ProtocolError};

fn corrupt(detail: impl std::fmt::Display) -> ProtocolError {
    ProtocolError::StreamCorruption(detail.to_string())
}

fn encode(detail: impl std::fmt::Display) -> ProtocolError {
    ProtocolError::Encode(detail.to_string())
}

fn name_of(raw: &[u8]) -> Result<String, ProtocolError> {
    std::str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|e| corrupt(format!("tag name is not UTF-8: {e}")))
}

fn open_element(start: &BytesStart<'_>) -> Result<Element, ProtocolError> {
    let mut element = Element::new(name_of(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr.map_err(corrupt)?;
        let key = name_of(attr.key.as_ref())?;
        let value = attr.unescape_value().map_err(corrupt)?;
        element.attributes_mut().set(key, value.into_owned());
    }
    Ok(element)
}

/// Attaches a finished element to its parent, or makes it the root.
fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), ProtocolError> {
    if let Some(parent) = stack.last_mut() {
        parent.push_child(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(corrupt(format!(
            "second root element <{}>",
            element.tag()
        )));
    }
    *root = Some(element);
    Ok(())
}

/// Parses a single XML document into an element tree.
pub fn read_element(data: &[u8]) -> Result<Element, ProtocolError> {
    let text = std::str::from_utf8(data).map_err(|e| corrupt(format!("input is not UTF-8: {e}")))?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event().map_err(corrupt)? {
            Event::Start(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(corrupt("content after the root element"));
                }
                stack.push(open_element(&start)?);
            }
            Event::Empty(start) => {
                let element = open_element(&start)?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::End(end) => {
                let name = name_of(end.name().as_ref())?;
                let element = stack
                    .pop()
                    .ok_or_else(|| corrupt(format!("unmatched </{name}>")))?;
                if element.tag() != name {
                    return Err(corrupt(format!(
                        "</{name}> closes <{}>",
                        element.tag()
                    )));
                }
                close_element(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(corrupt)?;
                if !text.trim().is_empty() {
                    let tag = stack
                        .last()
                        .map(|e| e.tag().to_string())
                        .unwrap_or_default();
                    return Err(ProtocolError::UnexpectedContent {
                        tag,
                        detail: format!("stray text {:?}", text.trim()),
                    });
                }
            }
            Event::Eof => break,
            // Declarations, comments, and processing instructions carry
            // nothing a message needs.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(corrupt(format!("input ends inside <{}>", open.tag())));
    }
    root.ok_or_else(|| corrupt("no root element"))
}

fn write_into(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), ProtocolError> {
    let mut start = BytesStart::new(element.tag());
    for (key, value) in element.attributes().iter() {
        start.push_attribute((key, value));
    }

    if element.children().is_empty() {
        writer.write_event(Event::Empty(start)).map_err(encode)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(encode)?;
    for child in element.children() {
        write_into(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.tag())))
        .map_err(encode)?;
    Ok(())
}

/// Serializes an element tree as compact XML.
pub fn write_element(element: &Element) -> Result<Vec<u8>, ProtocolError> {
    let mut writer = Writer::new(Vec::new());
    write_into(&mut writer, element)?;
    Ok(writer.into_inner())
}
