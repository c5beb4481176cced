//! Relationships codec: `.rels` parts (spec §4.3).

use crate::error::{Error, Result};
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::{BufRead, Write};

/// Namespace of a `.rels` part.
pub const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Target mode of a relationship. `Internal` is the default when absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetMode {
    #[default]
    Internal,
    External,
}

impl TargetMode {
    fn from_serialization(s: &str) -> Result<Self> {
        match s {
            "Internal" => Ok(TargetMode::Internal),
            "External" => Ok(TargetMode::External),
            other => Err(Error::MalformedRelationship(format!("unknown TargetMode '{other}'"))),
        }
    }

    fn serialize(self) -> &'static str {
        match self {
            TargetMode::Internal => "Internal",
            TargetMode::External => "External",
        }
    }
}

/// A single relationship record.
#[derive(Clone, Debug)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub target_mode: TargetMode,
}

/// An ordered collection of relationships, keyed by id, preserving insertion order
/// for encode round trips (spec §8).
#[derive(Clone, Debug, Default)]
pub struct Relationships {
    items: IndexMap<String, Relationship>,
    next_id: u32,
}

impl Relationships {
    pub fn new() -> Self {
        Self {
            items: IndexMap::new(),
            next_id: 1,
        }
    }

    /// Parse from an XML string. Unknown attributes are ignored; missing
    /// `TargetMode` defaults to Internal; an unrecognized `TargetMode` fails.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        Self::from_reader(&mut reader)
    }

    /// Lazily pull `Relationship` elements from a streaming reader.
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<Self> {
        let mut rels = Self::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) if e.name().local_name().as_ref() == b"Relationship" => {
                    let rel = parse_relationship(&e)?;
                    rels.items.insert(rel.id.clone(), rel);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        rels.update_next_id();
        Ok(rels)
    }

    pub fn to_xml(&self) -> String {
        let mut buf = Vec::new();
        self.write_to(&mut buf).expect("write to Vec should not fail");
        String::from_utf8(buf).expect("XML should be valid UTF-8")
    }

    /// Writes `Id, Type, Target, TargetMode` in that attribute order, one child per
    /// record, preserving insertion order.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml = Writer::new(writer);

        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut rels_elem = BytesStart::new("Relationships");
        rels_elem.push_attribute(("xmlns", NS_RELATIONSHIPS));
        xml.write_event(Event::Start(rels_elem))?;

        for rel in self.items.values() {
            let mut rel_elem = BytesStart::new("Relationship");
            rel_elem.push_attribute(("Id", rel.id.as_str()));
            rel_elem.push_attribute(("Type", rel.rel_type.as_str()));
            rel_elem.push_attribute(("Target", rel.target.as_str()));
            if rel.target_mode == TargetMode::External {
                rel_elem.push_attribute(("TargetMode", rel.target_mode.serialize()));
            }
            xml.write_event(Event::Empty(rel_elem))?;
        }

        xml.write_event(Event::End(BytesEnd::new("Relationships")))?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.get(id)
    }

    /// All relationships of a given type, in encounter order.
    pub fn all_by_type<'a, 'b>(&'a self, rel_type: &'b str) -> impl Iterator<Item = &'a Relationship> + 'b
    where
        'a: 'b,
    {
        self.items.values().filter(move |r| r.rel_type == rel_type)
    }

    pub fn by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.items.values().find(|r| r.rel_type == rel_type)
    }

    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let id = self.generate_id();
        self.add_with_id(&id, rel_type, target, TargetMode::Internal);
        id
    }

    pub fn add_external(&mut self, rel_type: &str, target: &str) -> String {
        let id = self.generate_id();
        self.add_with_id(&id, rel_type, target, TargetMode::External);
        id
    }

    pub fn add_with_id(&mut self, id: &str, rel_type: &str, target: &str, mode: TargetMode) {
        self.items.insert(
            id.to_string(),
            Relationship {
                id: id.to_string(),
                rel_type: rel_type.to_string(),
                target: target.to_string(),
                target_mode: mode,
            },
        );
    }

    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        self.items.shift_remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn generate_id(&mut self) -> String {
        let id = format!("rId{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn update_next_id(&mut self) {
        let max_id = self
            .items
            .keys()
            .filter_map(|id| id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
            .max()
            .unwrap_or(0);
        self.next_id = max_id + 1;
    }
}

fn parse_relationship(element: &BytesStart) -> Result<Relationship> {
    let mut id = None;
    let mut rel_type = None;
    let mut target = None;
    let mut target_mode = TargetMode::Internal;

    for attr in element.attributes() {
        let attr = attr?;
        let key = attr.key.local_name();
        let value = String::from_utf8_lossy(&attr.value).to_string();

        match key.as_ref() {
            b"Id" => id = Some(value),
            b"Type" => rel_type = Some(value),
            b"Target" => target = Some(value),
            b"TargetMode" => target_mode = TargetMode::from_serialization(&value)?,
            _ => {}
        }
    }

    Ok(Relationship {
        id: id.ok_or_else(|| Error::MissingAttribute {
            element: "Relationship".into(),
            attr: "Id".into(),
        })?,
        rel_type: rel_type.ok_or_else(|| Error::MissingAttribute {
            element: "Relationship".into(),
            attr: "Type".into(),
        })?,
        target: target.ok_or_else(|| Error::MissingAttribute {
            element: "Relationship".into(),
            attr: "Target".into(),
        })?,
        target_mode,
    })
}

/// Well-known relationship types used throughout OOXML packages.
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const HYPERLINK: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_relationships() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#;

        let rels = Relationships::from_xml(xml).unwrap();
        assert_eq!(rels.len(), 2);

        let r1 = rels.get("rId1").unwrap();
        assert_eq!(r1.target, "word/document.xml");
        assert_eq!(r1.target_mode, TargetMode::Internal);

        let r2 = rels.get("rId2").unwrap();
        assert_eq!(r2.target_mode, TargetMode::External);
    }

    #[test]
    fn unknown_target_mode_is_malformed() {
        let xml = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="t" Target="x" TargetMode="Sideways"/>
</Relationships>"#;
        assert!(Relationships::from_xml(xml).is_err());
    }

    #[test]
    fn roundtrip_preserves_order() {
        let mut rels = Relationships::new();
        rels.add(rel_types::IMAGE, "media/image1.png");
        rels.add_external(rel_types::HYPERLINK, "https://example.com");

        let xml = rels.to_xml();
        let rels2 = Relationships::from_xml(&xml).unwrap();

        let ids: Vec<_> = rels.iter().map(|r| r.id.clone()).collect();
        let ids2: Vec<_> = rels2.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, ids2);
    }

    #[test]
    fn auto_id_increments() {
        let mut rels = Relationships::new();
        let id1 = rels.add(rel_types::IMAGE, "media/image1.png");
        let id2 = rels.add(rel_types::IMAGE, "media/image2.png");
        assert_eq!(id1, "rId1");
        assert_eq!(id2, "rId2");
    }

    #[test]
    fn by_type_returns_first_match() {
        let mut rels = Relationships::new();
        rels.add(rel_types::IMAGE, "media/image1.png");
        rels.add(rel_types::IMAGE, "media/image2.png");
        assert_eq!(rels.all_by_type(rel_types::IMAGE).count(), 2);
        assert!(rels.by_type(rel_types::IMAGE).is_some());
    }
}
