//! XML renderer.
//!
//! # Responsibilities
//! - Emit a UTF-8 prolog, a root element, and one empty element per record
//! - Write every field as an attribute, null as an empty value
//! - Escape attribute text so any parser recovers the original string
//!
//! # Design Decisions
//! - `\t`, `\n`, `\r` are written as character references; parsers would
//!   otherwise normalize them to spaces
//! - Characters outside the XML 1.0 `Char` production fail the render

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Writer;
use std::borrow::Cow;

use crate::records::{Record, ResultSet, TimestampStyle};
use crate::render::{RenderError, Shape};

pub fn render(set: &ResultSet, shape: Shape) -> Result<Vec<u8>, RenderError> {
    let mut writer = Writer::new(Vec::new());
    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    match shape {
        Shape::Collection => {
            write(&mut writer, Event::Start(BytesStart::new(set.collection())))?;
            for record in set.records() {
                write(&mut writer, Event::Empty(element(set.element(), record)?))?;
            }
            write(&mut writer, Event::End(BytesEnd::new(set.collection())))?;
        }
        Shape::Single => {
            let record = set.first().ok_or(RenderError::Empty)?;
            write(&mut writer, Event::Empty(element(set.element(), record)?))?;
        }
    }

    Ok(writer.into_inner())
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), RenderError> {
    writer
        .write_event(event)
        .map_err(|e| RenderError::Xml(e.to_string()))
}

fn element(name: &'static str, record: &Record) -> Result<BytesStart<'static>, RenderError> {
    let mut element = BytesStart::new(name);
    for (field, value) in record.iter() {
        let text = value.to_text(TimestampStyle::Iso8601).unwrap_or_default();
        let escaped = escape_attribute(field, &text)?;
        element.push_attribute(Attribute {
            key: QName(field.as_bytes()),
            value: Cow::Owned(escaped.into_bytes()),
        });
    }
    Ok(element)
}

/// Escape text for use inside a double-quoted attribute value.
pub(crate) fn escape_attribute(field: &'static str, text: &str) -> Result<String, RenderError> {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' => escaped.push_str("&#9;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            c if is_xml_char(c) => escaped.push(c),
            c => {
                return Err(RenderError::Unrepresentable {
                    field,
                    codepoint: c as u32,
                })
            }
        }
    }
    Ok(escaped)
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::render::fixtures::{person, persons};
    use quick_xml::Reader;

    /// Attributes of every empty element, in document order.
    pub(crate) fn parse_elements(body: &[u8]) -> Vec<Vec<(String, String)>> {
        let mut reader = Reader::from_str(std::str::from_utf8(body).unwrap());
        let mut elements = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Empty(e) => {
                    let attrs = e
                        .attributes()
                        .map(|a| {
                            let a = a.unwrap();
                            (
                                String::from_utf8(a.key.as_ref().to_vec()).unwrap(),
                                a.unescape_value().unwrap().into_owned(),
                            )
                        })
                        .collect();
                    elements.push(attrs);
                }
                Event::Eof => break,
                _ => {}
            }
        }
        elements
    }

    #[test]
    fn test_collection_layout() {
        let set = persons(vec![person(1, "Anna", Some("Budapest, Fő utca 1."))]);
        let body = String::from_utf8(render(&set, Shape::Collection).unwrap()).unwrap();
        assert_eq!(
            body,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <persons><person person_id=\"1\" name=\"Anna\" address=\"Budapest, Fő utca 1.\"/></persons>"
        );
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let set = persons(vec![person(3, "O'Brien & <Co>", Some("\"quoted\""))]);
        let body = String::from_utf8(render(&set, Shape::Collection).unwrap()).unwrap();

        assert!(body.contains("name=\"O&apos;Brien &amp; &lt;Co&gt;\""));
        assert!(body.contains("address=\"&quot;quoted&quot;\""));

        let parsed = parse_elements(body.as_bytes());
        assert_eq!(parsed[0][1], ("name".to_string(), "O'Brien & <Co>".to_string()));
        assert_eq!(parsed[0][2], ("address".to_string(), "\"quoted\"".to_string()));
    }

    #[test]
    fn test_whitespace_survives_parsing() {
        let set = persons(vec![person(4, "Tab\there", Some("Line1\r\nLine2"))]);
        let body = render(&set, Shape::Collection).unwrap();
        let parsed = parse_elements(&body);
        assert_eq!(parsed[0][1].1, "Tab\there");
        assert_eq!(parsed[0][2].1, "Line1\r\nLine2");
    }

    #[test]
    fn test_null_is_empty_attribute() {
        let set = persons(vec![person(5, "Béla", None)]);
        let parsed = parse_elements(&render(&set, Shape::Collection).unwrap());
        assert_eq!(parsed[0].len(), 3);
        assert_eq!(parsed[0][2], ("address".to_string(), String::new()));
    }

    #[test]
    fn test_control_character_fails_render() {
        let set = persons(vec![person(6, "bell\u{7}", None)]);
        match render(&set, Shape::Collection) {
            Err(RenderError::Unrepresentable { field, codepoint }) => {
                assert_eq!(field, "name");
                assert_eq!(codepoint, 7);
            }
            other => panic!("expected Unrepresentable, got {:?}", other),
        }
    }

    #[test]
    fn test_single_is_bare_element() {
        let set = persons(vec![person(7, "Anna", None)]);
        let body = String::from_utf8(render(&set, Shape::Single).unwrap()).unwrap();
        assert!(body.ends_with("<person person_id=\"7\" name=\"Anna\" address=\"\"/>"));
        assert!(!body.contains("<persons>"));
    }

    #[test]
    fn test_empty_collection() {
        let body = String::from_utf8(render(&persons(Vec::new()), Shape::Collection).unwrap()).unwrap();
        assert!(body.ends_with("<persons></persons>"));
    }
}
