//! Package reader: orchestrates physical enumeration into a logical part index
//! and serves part opens and relationship queries (spec §4.5).

use crate::backend::ReadBackend;
use crate::content_types::ContentTypes;
use crate::core_properties::CoreProperties;
use crate::error::{Error, Result};
use crate::fragment::FragmentedPartReader;
use crate::part_name;
use crate::relationships::{rel_types, Relationships, TargetMode};
use indexmap::IndexMap;
use std::io::{Cursor, Read};

#[derive(Clone, Debug)]
struct PartEntry {
    content_type: Option<String>,
    fragmented: bool,
    /// For a plain part: the physical item name. For a fragmented part: the base
    /// name fragments are named after (`{base}/[k].piece`).
    physical_name: String,
}

/// Orchestrates a physical backend into the logical part/relationship view of
/// spec §3-§4.5. The part index is built once, at construction.
pub struct PackageReader<B: ReadBackend> {
    backend: B,
    parts: IndexMap<String, PartEntry>,
}

/// A part's byte stream: either the backend's own stream or a reassembled
/// fragmented-part stream (spec §4.4).
pub enum PartReader<'a, B: ReadBackend> {
    Whole(Cursor<Vec<u8>>),
    Fragmented(FragmentedPartReader<'a, B>),
}

impl<'a, B: ReadBackend> Read for PartReader<'a, B> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            PartReader::Whole(c) => c.read(buf),
            PartReader::Fragmented(f) => f.read(buf),
        }
    }
}

impl<B: ReadBackend> PackageReader<B> {
    /// Open a reader over `backend`, building the part index immediately.
    pub fn new(mut backend: B) -> Result<Self> {
        let items = backend.list_items()?;
        log::debug!("opening package with {} physical items", items.len());
        let mut parts: IndexMap<String, PartEntry> = IndexMap::new();

        for item_name in items {
            match parse_fragment_item(&item_name) {
                Some((base, 0, _)) => {
                    let normalized = part_name::normalize(&base);
                    parts.entry(normalized).or_insert(PartEntry {
                        content_type: None,
                        fragmented: true,
                        physical_name: base,
                    });
                }
                Some(_) => continue, // non-zero fragment index: grouped silently under index 0
                None => {
                    let normalized = part_name::normalize(&item_name);
                    parts.insert(
                        normalized,
                        PartEntry {
                            content_type: None,
                            fragmented: false,
                            physical_name: item_name,
                        },
                    );
                }
            }
        }

        let ct_stream = backend.content_types_stream_name().map(str::to_string);
        if let Some(ct_name) = ct_stream {
            let ct_normalized = part_name::normalize(&ct_name);
            let manifest_bytes = backend.read_item(&ct_name)?;
            let manifest_xml = String::from_utf8_lossy(&manifest_bytes).into_owned();
            let manifest = ContentTypes::from_xml(&manifest_xml)?;

            for (name, entry) in parts.iter_mut() {
                if *name == ct_normalized {
                    continue;
                }
                match manifest.get(name) {
                    Some(ct) => entry.content_type = Some(ct.to_string()),
                    None => return Err(Error::UnknownContentType(name.clone())),
                }
            }

            parts.shift_remove(&ct_normalized);
        }

        log::debug!("indexed {} logical parts", parts.len());
        Ok(Self { backend, parts })
    }

    /// List parts as `(normalized_name, content_type)`. `.rels` parts are
    /// excluded unless `include_rels` is set.
    pub fn list_parts(&self, include_rels: bool) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.parts.iter().filter(move |(name, _)| include_rels || !is_rels_part(name)).map(|(name, entry)| {
            (name.as_str(), entry.content_type.as_deref())
        })
    }

    /// Open a part's byte stream by (not necessarily normalized) name.
    pub fn open_part(&mut self, name: &str) -> Result<PartReader<'_, B>> {
        let normalized = part_name::normalize(name);
        let entry = self
            .parts
            .get(&normalized)
            .ok_or_else(|| Error::NotFound(normalized.clone()))?
            .clone();

        if entry.fragmented {
            Ok(PartReader::Fragmented(FragmentedPartReader::new(&mut self.backend, entry.physical_name)?))
        } else {
            let bytes = self.backend.read_item(&entry.physical_name)?;
            Ok(PartReader::Whole(Cursor::new(bytes)))
        }
    }

    /// Relationships stored in `source`'s `.rels` companion (`"/"` for the package
    /// root). Returns an empty sequence, not an error, if no `.rels` part exists.
    pub fn raw_relationships(&mut self, source: &str) -> Result<Relationships> {
        let rels_name = part_name::rels_part_for(source);
        let normalized = part_name::normalize(&rels_name);
        if !self.parts.contains_key(&normalized) {
            return Ok(Relationships::new());
        }
        let mut stream = self.open_part(&rels_name)?;
        let mut xml = String::new();
        stream.read_to_string(&mut xml)?;
        Relationships::from_xml(&xml)
    }

    /// INTERNAL relationships from `source`, grouped by type with targets resolved
    /// and normalized, preserving encounter order within each group.
    pub fn related_parts_by_type(&mut self, source: &str) -> Result<IndexMap<String, Vec<String>>> {
        let rels = self.raw_relationships(source)?;
        let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();

        for rel in rels.iter() {
            if rel.target_mode != TargetMode::Internal {
                continue;
            }
            let resolved = part_name::resolve(&rel.target, source)?;
            grouped.entry(rel.rel_type.clone()).or_default().push(resolved);
        }

        Ok(grouped)
    }

    /// Core Properties of the package, found via the package-root relationship of
    /// type `core-properties`. An empty record if no such relationship exists.
    pub fn core_properties(&mut self) -> Result<CoreProperties> {
        let rels = self.raw_relationships("/")?;
        let Some(rel) = rels.by_type(rel_types::CORE_PROPERTIES) else {
            return Ok(CoreProperties::default());
        };
        let target = part_name::resolve(&rel.target, "/")?;
        let mut stream = self.open_part(&target)?;
        let mut xml = String::new();
        stream.read_to_string(&mut xml)?;
        CoreProperties::from_xml(&xml)
    }
}

fn is_rels_part(name: &str) -> bool {
    name.ends_with(".rels") && (name.contains("/_rels/") || name == "/_rels/.rels")
}

/// Parse `{base}/[{idx}].piece` or `{base}/[{idx}].last.piece` (case-insensitive on
/// the fixed parts of the pattern), per spec §4.5 step 2.
fn parse_fragment_item(item_name: &str) -> Option<(String, u32, bool)> {
    let lower = item_name.to_lowercase();
    let rest = lower.strip_suffix(".piece")?;
    let (rest, is_last) = match rest.strip_suffix(".last") {
        Some(r) => (r, true),
        None => (rest, false),
    };
    if !rest.ends_with(']') {
        return None;
    }
    let open = rest.rfind('[')?;
    if open == 0 || rest.as_bytes()[open - 1] != b'/' {
        return None;
    }
    let idx: u32 = rest[open + 1..rest.len() - 1].parse().ok()?;
    // recover original (non-lowercased) base, same byte length as `rest[..open-1]`
    let base = &item_name[..open - 1];
    Some((base.to_string(), idx, is_last))
}
