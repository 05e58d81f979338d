//! Stack-based markup decoder
//!
//! Reads one document with `quick-xml` and folds every closed element into
//! its parent under the element's logical tag. No grammar is required: the
//! shape of each child is decided by what was observed, and repeated
//! siblings are promoted to lists as soon as the second one closes.
//!
//! Scalars stay opaque text. Mixed content (text interleaved with child
//! elements) is rejected rather than silently dropped.

use crate::metadata::Position;
use crate::value::{ATTRIBUTE_PREFIX, Map, TEXT_KEY, Value, insert_child};
use crate::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::trace;

/// An element that has been opened but not yet closed
#[derive(Debug)]
struct OpenElement {
    /// Logical tag (`prefix:Trailing`)
    label: String,
    attributes: Map,
    children: Map,
    text: Option<String>,
}

impl OpenElement {
    fn into_value(self) -> Value {
        let OpenElement {
            mut attributes,
            children,
            text,
            ..
        } = self;

        if !children.is_empty() {
            attributes.extend(children);
            return Value::Map(attributes);
        }

        match text {
            Some(text) if attributes.is_empty() => Value::Text(text),
            Some(text) => {
                attributes.insert(TEXT_KEY.to_string(), Value::Text(text));
                Value::Map(attributes)
            }
            None => Value::Map(attributes),
        }
    }
}

/// Strip the inheritance chain from a tag: `cim:Base.Derived` becomes `cim:Derived`.
pub fn logical_label(raw: &str) -> String {
    fn trailing(local: &str) -> &str {
        local.rsplit('.').next().unwrap_or(local)
    }

    match raw.split_once(':') {
        Some((prefix, local)) => format!("{prefix}:{}", trailing(local)),
        None => trailing(raw).to_string(),
    }
}

/// Decode a UTF-8 document held in memory.
pub fn decode_str(input: &str) -> Result<Value> {
    decode(input.as_bytes())
}

/// Decode one document into a root value.
///
/// The result is a map with a single entry: the root element's logical tag
/// mapped to its decoded value. No partial tree is returned on error.
pub fn decode(input: &[u8]) -> Result<Value> {
    let mut reader = Reader::from_reader(input);
    let config = reader.config_mut();
    config.trim_text(true);
    config.expand_empty_elements = true;
    config.check_end_names = true;

    let mut buf = Vec::new();
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        let offset = usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX);
        let at = || Position::locate(input, offset);

        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::structural(at(), e.to_string()))?;

        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(Error::structural(
                        at(),
                        "element found after the root element was closed",
                    ));
                }
                let element =
                    open_element(&start).map_err(|message| Error::structural(at(), message))?;
                trace!(label = %element.label, "open element");

                if let Some(parent) = stack.last() {
                    if parent.text.is_some() {
                        return Err(Error::mixed_content(parent.label.clone(), at()));
                    }
                }
                stack.push(element);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| {
                        Error::structural(at(), "closing tag without matching opening tag")
                    })?;
                let label = element.label.clone();
                let value = element.into_value();

                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.children, label, value),
                    None => {
                        let mut document = Map::new();
                        document.insert(label, value);
                        root = Some(Value::Map(document));
                    }
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| Error::structural(at(), e.to_string()))?;
                push_text(&mut stack, text.trim(), at())?;
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                push_text(&mut stack, text.trim(), at())?;
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {
                trace!("skipping non-element token");
            }
            Event::Empty(_) => {
                // expand_empty_elements turns these into Start/End pairs
            }
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(Error::structural(
            Position::locate(input, input.len()),
            format!("unexpected end of document: element '{}' is not closed", open.label),
        ));
    }

    root.ok_or_else(|| {
        Error::structural(Position::locate(input, 0), "document has no root element")
    })
}

fn open_element(start: &BytesStart<'_>) -> std::result::Result<OpenElement, String> {
    let raw = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Map::new();

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(|e| e.to_string())?;
        attributes.insert(
            format!("{ATTRIBUTE_PREFIX}{key}"),
            Value::Text(value.into_owned()),
        );
    }

    Ok(OpenElement {
        label: logical_label(&raw),
        attributes,
        children: Map::new(),
        text: None,
    })
}

fn push_text(stack: &mut [OpenElement], text: &str, position: Position) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }

    let Some(element) = stack.last_mut() else {
        return Err(Error::structural(position, "text outside of the root element"));
    };

    if !element.children.is_empty() {
        return Err(Error::mixed_content(element.label.clone(), position));
    }

    match &mut element.text {
        Some(existing) => existing.push_str(text),
        None => element.text = Some(text.to_string()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_of(value: &Value, tag: &str) -> Map {
        value
            .get(tag)
            .and_then(Value::as_map)
            .cloned()
            .expect("root element should decode to a map")
    }

    #[test]
    fn test_logical_label_strips_inheritance_prefix() {
        assert_eq!(logical_label("cim:IdentifiedObject.name"), "cim:name");
        assert_eq!(logical_label("cim:A.B.C"), "cim:C");
        assert_eq!(logical_label("rdf:Description"), "rdf:Description");
        assert_eq!(logical_label("Plain.Name"), "Name");
    }

    #[test]
    fn test_decode_scalar_and_attributes() {
        let doc = decode_str(
            r#"<rdf:RDF xmlns:rdf="urn:rdf"><rdfs:label xml:lang="en">Breaker</rdfs:label><cims:note>plain</cims:note><rdf:type rdf:resource="urn:x#Class"/></rdf:RDF>"#,
        )
        .unwrap();

        let root = root_of(&doc, "rdf:RDF");
        assert_eq!(root["@xmlns:rdf"], Value::Text("urn:rdf".into()));
        assert_eq!(root["cims:note"], Value::Text("plain".into()));
        assert_eq!(root["rdfs:label"].as_text(), Some("Breaker"));
        assert_eq!(root["rdfs:label"].attribute("xml:lang"), Some("en"));
        assert_eq!(root["rdf:type"].attribute("rdf:resource"), Some("urn:x#Class"));
    }

    #[test]
    fn test_empty_element_is_empty_map() {
        let doc = decode_str("<root><child/></root>").unwrap();
        let root = root_of(&doc, "root");
        assert_eq!(root["child"], Value::Map(Map::new()));
    }

    #[test]
    fn test_repeated_siblings_promote_to_list() {
        let doc = decode_str("<r><a>1</a><a>2</a><a>3</a></r>").unwrap();
        let root = root_of(&doc, "r");
        assert_eq!(
            root["a"],
            Value::TextList(vec!["1".into(), "2".into(), "3".into()])
        );
    }

    #[test]
    fn test_scalar_then_structured_sibling() {
        let doc =
            decode_str(r#"<r><s>Entsoe</s><s rdf:resource="urn:uml#concrete"/></r>"#).unwrap();
        let root = root_of(&doc, "r");
        let Value::MapList(maps) = &root["s"] else {
            panic!("expected list of maps");
        };
        assert_eq!(maps.len(), 2);
        assert_eq!(maps[0][TEXT_KEY], Value::Text("Entsoe".into()));
        assert_eq!(
            maps[1]["@rdf:resource"],
            Value::Text("urn:uml#concrete".into())
        );
    }

    #[test]
    fn test_structured_then_scalar_sibling() {
        let doc =
            decode_str(r#"<r><s rdf:resource="urn:uml#concrete"/><s>Entsoe</s></r>"#).unwrap();
        let root = root_of(&doc, "r");
        assert!(matches!(&root["s"], Value::MapList(maps) if maps.len() == 2));
    }

    #[test]
    fn test_inherited_tags_share_one_logical_key() {
        let doc = decode_str(
            "<r><cim:IdentifiedObject.name>a</cim:IdentifiedObject.name><cim:name>b</cim:name></r>",
        )
        .unwrap();
        let root = root_of(&doc, "r");
        assert_eq!(root["cim:name"].len(), 2);
    }

    #[test]
    fn test_entities_are_unescaped() {
        let doc = decode_str("<r><c>a &lt; b &amp; c</c></r>").unwrap();
        let root = root_of(&doc, "r");
        assert_eq!(root["c"], Value::Text("a < b & c".into()));
    }

    #[test]
    fn test_comments_and_declaration_are_skipped() {
        let doc = decode_str("<?xml version=\"1.0\"?>\n<!-- header --><r><a>1</a></r>").unwrap();
        assert!(doc.get("r").is_some());
    }

    #[test]
    fn test_mixed_content_text_after_child_is_rejected() {
        let err = decode_str("<r><a>1</a>stray</r>").unwrap_err();
        assert!(matches!(err, Error::MixedContent { ref element, .. } if element == "r"));
    }

    #[test]
    fn test_mixed_content_child_after_text_is_rejected() {
        let err = decode_str("<r>stray<a>1</a></r>").unwrap_err();
        assert!(matches!(err, Error::MixedContent { .. }));
    }

    #[test]
    fn test_unclosed_element_is_structural_error() {
        let err = decode_str("<r><a>1</a>").unwrap_err();
        assert!(matches!(err, Error::Structural { .. }));
        assert!(err.to_string().contains("not closed"));
    }

    #[test]
    fn test_mismatched_end_tag_is_structural_error() {
        let err = decode_str("<r><a>1</b></r>").unwrap_err();
        assert!(matches!(err, Error::Structural { .. }));
    }

    #[test]
    fn test_empty_document_has_no_root() {
        let err = decode_str("   ").unwrap_err();
        assert!(err.to_string().contains("no root element"));
    }

    #[test]
    fn test_text_outside_root_is_rejected() {
        let err = decode_str("stray<r/>").unwrap_err();
        assert!(matches!(err, Error::Structural { .. }));
    }
}
