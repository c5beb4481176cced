//! Core Properties codec: `docProps/core.xml` (spec §4.7).
//!
//! A schema-directed mapping between a flat record and the OPC Core Properties XML
//! dialect (package core-properties + Dublin Core + DC Terms + XML Schema Instance
//! namespaces). Stateless: decode walks the document once, encode emits only the
//! fields that are set.

use crate::error::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{BufRead, Write};

pub const NS_CORE_PROPERTIES: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
pub const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
pub const NS_DCTERMS: &str = "http://purl.org/dc/terms/";
pub const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// A single keyword, optionally tagged with an `xml:lang` language code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keyword {
    pub lang: Option<String>,
    pub text: String,
}

/// Core Properties of an OPC package. All fields are optional; absent fields are
/// simply not emitted on encode and remain unset on decode when the source document
/// lacks them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoreProperties {
    pub category: Option<String>,
    pub content_status: Option<String>,
    pub created: Option<String>,
    pub creator: Option<String>,
    pub description: Option<String>,
    pub identifier: Option<String>,
    pub keywords: Vec<Keyword>,
    pub language: Option<String>,
    pub last_modified_by: Option<String>,
    pub last_printed: Option<String>,
    pub modified: Option<String>,
    pub revision: Option<String>,
    pub subject: Option<String>,
    pub title: Option<String>,
    pub version: Option<String>,
}

/// One row of the field <-> element binding table the codec dispatches on. Dates
/// are kept as raw W3CDTF strings here (parsing/formatting them further is a
/// caller concern); the codec's job is the XML shape, not calendar arithmetic.
enum Field {
    Category,
    ContentStatus,
    Created,
    Creator,
    Description,
    Identifier,
    Keywords,
    Language,
    LastModifiedBy,
    LastPrinted,
    Modified,
    Revision,
    Subject,
    Title,
    Version,
}

fn field_for_tag(local_name: &[u8]) -> Option<Field> {
    Some(match local_name {
        b"category" => Field::Category,
        b"contentStatus" => Field::ContentStatus,
        b"created" => Field::Created,
        b"creator" => Field::Creator,
        b"description" => Field::Description,
        b"identifier" => Field::Identifier,
        b"keywords" => Field::Keywords,
        b"language" => Field::Language,
        b"lastModifiedBy" => Field::LastModifiedBy,
        b"lastPrinted" => Field::LastPrinted,
        b"modified" => Field::Modified,
        b"revision" => Field::Revision,
        b"subject" => Field::Subject,
        b"title" => Field::Title,
        b"version" => Field::Version,
        _ => return None,
    })
}

impl CoreProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        Self::from_reader(&mut reader)
    }

    /// Iterative pull-parse; dispatches by (namespace-qualified) element name,
    /// ignoring unknown elements.
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<Self> {
        let mut props = Self::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let local_name = e.name().local_name();
                    if let Some(field) = field_for_tag(local_name.as_ref()) {
                        let tag = String::from_utf8_lossy(local_name.as_ref()).into_owned();
                        match field {
                            Field::Keywords => props.keywords = read_keywords(reader)?,
                            other => {
                                let text = read_text(reader, &tag)?;
                                assign_text(&mut props, other, text);
                            }
                        }
                    }
                }
                Event::Empty(_) => {}
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(props)
    }

    pub fn to_xml(&self) -> String {
        let mut buf = Vec::new();
        self.write_to(&mut buf).expect("write to Vec should not fail");
        String::from_utf8(buf).expect("XML should be valid UTF-8")
    }

    /// Emit only set fields, in the schema's declared order, as `cp:coreProperties`.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml = Writer::new(writer);
        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut root = BytesStart::new("cp:coreProperties");
        root.push_attribute(("xmlns:cp", NS_CORE_PROPERTIES));
        root.push_attribute(("xmlns:dc", NS_DC));
        root.push_attribute(("xmlns:dcterms", NS_DCTERMS));
        root.push_attribute(("xmlns:xsi", NS_XSI));
        xml.write_event(Event::Start(root))?;

        write_text(&mut xml, "cp:category", &self.category)?;
        write_text(&mut xml, "cp:contentStatus", &self.content_status)?;
        write_date(&mut xml, "dcterms:created", &self.created)?;
        write_text(&mut xml, "dc:creator", &self.creator)?;
        write_text(&mut xml, "dc:description", &self.description)?;
        write_text(&mut xml, "dc:identifier", &self.identifier)?;
        if !self.keywords.is_empty() {
            write_keywords(&mut xml, &self.keywords)?;
        }
        write_text(&mut xml, "dc:language", &self.language)?;
        write_text(&mut xml, "cp:lastModifiedBy", &self.last_modified_by)?;
        write_text(&mut xml, "cp:lastPrinted", &self.last_printed)?;
        write_date(&mut xml, "dcterms:modified", &self.modified)?;
        write_text(&mut xml, "cp:revision", &self.revision)?;
        write_text(&mut xml, "dc:subject", &self.subject)?;
        write_text(&mut xml, "dc:title", &self.title)?;
        write_text(&mut xml, "cp:version", &self.version)?;

        xml.write_event(Event::End(BytesEnd::new("cp:coreProperties")))?;
        Ok(())
    }
}

fn assign_text(props: &mut CoreProperties, field: Field, text: Option<String>) {
    match field {
        Field::Category => props.category = text,
        Field::ContentStatus => props.content_status = text,
        Field::Created => props.created = text,
        Field::Creator => props.creator = text,
        Field::Description => props.description = text,
        Field::Identifier => props.identifier = text,
        Field::Language => props.language = text,
        Field::LastModifiedBy => props.last_modified_by = text,
        Field::LastPrinted => props.last_printed = text,
        Field::Modified => props.modified = text,
        Field::Revision => props.revision = text,
        Field::Subject => props.subject = text,
        Field::Title => props.title = text,
        Field::Version => props.version = text,
        Field::Keywords => unreachable!("keywords handled separately"),
    }
}

/// Read text content up to the matching end tag. Reaching end-of-document first
/// means `tag` was never closed, which is a structural malformation rather than
/// the raw XML passthrough error quick_xml would otherwise never raise here (an
/// unterminated element is perfectly well-formed token-by-token; only the caller
/// watching for a specific closing tag can tell it's missing).
fn read_text<R: BufRead>(reader: &mut Reader<R>, tag: &str) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let mut text = String::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::End(_) => break,
            Event::Eof => {
                return Err(Error::MalformedXml {
                    part: "coreProperties".into(),
                    detail: format!("reached end of document before closing <{tag}>"),
                })
            }
            _ => {}
        }
        buf.clear();
    }
    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

fn read_keywords<R: BufRead>(reader: &mut Reader<R>) -> Result<Vec<Keyword>> {
    let mut keywords = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().local_name().as_ref() == b"value" => {
                let lang = e
                    .attributes()
                    .filter_map(|a| a.ok())
                    .find(|a| a.key.local_name().as_ref() == b"lang")
                    .map(|a| String::from_utf8_lossy(&a.value).to_string());
                let text = read_text(reader, "cp:value")?.unwrap_or_default();
                keywords.push(Keyword { lang, text });
            }
            Event::Empty(e) if e.name().local_name().as_ref() == b"value" => {
                let lang = e
                    .attributes()
                    .filter_map(|a| a.ok())
                    .find(|a| a.key.local_name().as_ref() == b"lang")
                    .map(|a| String::from_utf8_lossy(&a.value).to_string());
                keywords.push(Keyword { lang, text: String::new() });
            }
            Event::End(e) if e.name().local_name().as_ref() == b"keywords" => break,
            Event::Eof => {
                return Err(Error::MalformedXml {
                    part: "coreProperties".into(),
                    detail: "reached end of document before closing <cp:keywords>".into(),
                })
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(keywords)
}

fn write_text<W: Write>(xml: &mut Writer<W>, tag: &str, value: &Option<String>) -> Result<()> {
    if let Some(v) = value {
        xml.write_event(Event::Start(BytesStart::new(tag)))?;
        xml.write_event(Event::Text(BytesText::new(v)))?;
        xml.write_event(Event::End(BytesEnd::new(tag)))?;
    }
    Ok(())
}

fn write_date<W: Write>(xml: &mut Writer<W>, tag: &str, value: &Option<String>) -> Result<()> {
    if let Some(v) = value {
        let mut start = BytesStart::new(tag);
        start.push_attribute(("xsi:type", "dcterms:W3CDTF"));
        xml.write_event(Event::Start(start))?;
        xml.write_event(Event::Text(BytesText::new(v)))?;
        xml.write_event(Event::End(BytesEnd::new(tag)))?;
    }
    Ok(())
}

fn write_keywords<W: Write>(xml: &mut Writer<W>, keywords: &[Keyword]) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new("cp:keywords")))?;
    for kw in keywords {
        let mut value = BytesStart::new("cp:value");
        if let Some(lang) = &kw.lang {
            value.push_attribute(("xml:lang", lang.as_str()));
        }
        xml.write_event(Event::Start(value))?;
        xml.write_event(Event::Text(BytesText::new(&kw.text)))?;
        xml.write_event(Event::End(BytesEnd::new("cp:value")))?;
    }
    xml.write_event(Event::End(BytesEnd::new("cp:keywords")))?;
    Ok(())
}
