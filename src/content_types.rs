//! Content-types manifest: `[Content_Types].xml` (spec §4.2).

use crate::error::{Error, Result};
use crate::part_name;
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::{BufRead, Write};

/// Namespace of `[Content_Types].xml`.
pub const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Well-known content types.
pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const XML: &str = "application/xml";

/// In-memory model of Defaults (extension -> MIME) and Overrides (normalized part
/// name -> MIME). Insertion order is preserved for both tables, per spec §8.
#[derive(Clone, Debug, Default)]
pub struct ContentTypes {
    defaults: IndexMap<String, String>,
    overrides: IndexMap<String, String>,
}

impl ContentTypes {
    /// Empty manifest, no defaults registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from an XML string.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        Self::from_reader(&mut reader)
    }

    /// Parse from a streaming reader, pulling events lazily.
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<Self> {
        let mut ct = Self::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) => {
                    let local = e.name();
                    match local.local_name().as_ref() {
                        b"Default" => {
                            let ext = get_attr(&e, "Extension")?;
                            let content_type = get_attr(&e, "ContentType")?;
                            ct.defaults.insert(ext.to_lowercase(), content_type);
                        }
                        b"Override" => {
                            let part_name = get_attr(&e, "PartName")?;
                            let content_type = get_attr(&e, "ContentType")?;
                            ct.overrides.insert(part_name::normalize(&part_name), content_type);
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(ct)
    }

    /// Serialize to an XML string.
    pub fn to_xml(&self) -> String {
        let mut buf = Vec::new();
        self.write_to(&mut buf).expect("write to Vec should not fail");
        String::from_utf8(buf).expect("XML should be valid UTF-8")
    }

    /// Write Defaults first, then Overrides, both in insertion order.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml = Writer::new(writer);

        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut types = BytesStart::new("Types");
        types.push_attribute(("xmlns", NS_CONTENT_TYPES));
        xml.write_event(Event::Start(types))?;

        for (ext, content_type) in &self.defaults {
            let mut default = BytesStart::new("Default");
            default.push_attribute(("Extension", ext.as_str()));
            default.push_attribute(("ContentType", content_type.as_str()));
            xml.write_event(Event::Empty(default))?;
        }

        for (name, content_type) in &self.overrides {
            let mut over = BytesStart::new("Override");
            over.push_attribute(("PartName", name.as_str()));
            over.push_attribute(("ContentType", content_type.as_str()));
            xml.write_event(Event::Empty(over))?;
        }

        xml.write_event(Event::End(BytesEnd::new("Types")))?;
        Ok(())
    }

    /// Register a Default extension mapping. The extension is lowercased.
    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.defaults.insert(extension.to_lowercase(), content_type.to_string());
    }

    /// Register an Override for a (not necessarily normalized) part name.
    pub fn add_override(&mut self, part_name: &str, content_type: &str) {
        self.overrides
            .insert(part_name::normalize(part_name), content_type.to_string());
    }

    /// Remove an Override, returning its previous content type.
    pub fn remove_override(&mut self, part_name: &str) -> Option<String> {
        self.overrides.shift_remove(&part_name::normalize(part_name))
    }

    /// Resolve the content type for a part name: Override first, then Default by
    /// extension, else `None` (spec §3 resolution order).
    pub fn get(&self, part_name: &str) -> Option<&str> {
        let normalized = part_name::normalize(part_name);
        if let Some(ct) = self.overrides.get(&normalized) {
            return Some(ct);
        }
        let default = part_name::extension(&normalized).and_then(|ext| self.defaults.get(&ext)).map(|s| s.as_str());
        if default.is_some() {
            log::trace!("{normalized} has no Override; falling back to extension default");
        }
        default
    }
}

fn get_attr(element: &BytesStart, name: &str) -> Result<String> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    Err(Error::MissingAttribute {
        element: String::from_utf8_lossy(element.name().as_ref()).to_string(),
        attr: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_DOCUMENT: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

    #[test]
    fn parse_content_types() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

        let ct = ContentTypes::from_xml(xml).unwrap();
        assert_eq!(ct.get("/word/document.xml"), Some(MAIN_DOCUMENT));
        assert_eq!(ct.get("/word/styles.xml"), Some(XML));
    }

    #[test]
    fn roundtrip_preserves_insertion_order() {
        let mut ct = ContentTypes::new();
        ct.add_default("xml", XML);
        ct.add_default("rels", RELATIONSHIPS);
        ct.add_override("/word/document.xml", MAIN_DOCUMENT);
        ct.add_override("/docProps/core.xml", "application/vnd.openxmlformats-package.core-properties+xml");

        let xml = ct.to_xml();
        let ct2 = ContentTypes::from_xml(&xml).unwrap();

        assert_eq!(ct2.defaults.keys().collect::<Vec<_>>(), ct.defaults.keys().collect::<Vec<_>>());
        assert_eq!(ct2.overrides.keys().collect::<Vec<_>>(), ct.overrides.keys().collect::<Vec<_>>());
    }

    #[test]
    fn get_falls_back_to_extension_default() {
        let mut ct = ContentTypes::new();
        ct.add_default("png", "image/png");
        assert_eq!(ct.get("/word/media/image1.png"), Some("image/png"));
        assert_eq!(ct.get("/word/media/image1.PNG"), Some("image/png"));
    }

    #[test]
    fn override_wins_over_default() {
        let mut ct = ContentTypes::new();
        ct.add_default("xml", XML);
        ct.add_override("/word/document.xml", MAIN_DOCUMENT);
        assert_eq!(ct.get("/word/document.xml"), Some(MAIN_DOCUMENT));
        assert_eq!(ct.get("/word/styles.xml"), Some(XML));
    }

    #[test]
    fn missing_type_is_none() {
        let ct = ContentTypes::new();
        assert_eq!(ct.get("/word/document.xml"), None);
    }
}
