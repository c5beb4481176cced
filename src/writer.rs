//! Package writer: manifest-consistent part creation, relationship emission, and
//! a guaranteed-once content-types flush (spec §4.6).

use crate::backend::WriteBackend;
use crate::content_types::{ContentTypes, RELATIONSHIPS, XML};
use crate::error::{Error, Result};
use crate::fragment::FragmentedPartWriter;
use crate::part_name;
use crate::relationships::Relationships;

/// Accumulates manifest state and part writes against a physical backend, emitting
/// the content-types stream at most once per writer lifetime.
pub struct PackageWriter<B: WriteBackend> {
    backend: B,
    content_types: ContentTypes,
    content_types_written: bool,
}

impl<B: WriteBackend> PackageWriter<B> {
    /// A fresh writer with the standard `rels`/`xml` extension defaults seeded.
    pub fn new(backend: B) -> Self {
        let mut content_types = ContentTypes::new();
        content_types.add_default("rels", RELATIONSHIPS);
        content_types.add_default("xml", XML);
        Self {
            backend,
            content_types,
            content_types_written: false,
        }
    }

    /// Open a part for writing. Adds a content-types Override if the manifest
    /// would not otherwise resolve `name` to `content_type`, unless the manifest
    /// has already been flushed, in which case a mismatch is an error.
    pub fn open_part(&mut self, name: &str, content_type: &str) -> Result<B::ItemWriter<'_>> {
        let normalized = part_name::normalize(name);
        part_name::check(&normalized, false)?;
        self.reconcile_content_type(&normalized, content_type)?;
        self.backend.create_item(&normalized, content_type)
    }

    /// Same manifest discipline as [`Self::open_part`], returning a fragment
    /// emitter instead of a single-shot write stream (spec §4.4). The returned
    /// handle holds no reference to this writer, so other parts may be opened and
    /// written in between calls to [`Self::write_fragment`] (spec §5).
    pub fn create_fragmented_part(&mut self, name: &str, content_type: &str) -> Result<FragmentedPartWriter> {
        let normalized = part_name::normalize(name);
        part_name::check(&normalized, false)?;
        self.reconcile_content_type(&normalized, content_type)?;
        Ok(FragmentedPartWriter::new(normalized, content_type.to_string()))
    }

    /// Create `handle`'s next fragment and return a writer for its bytes. `last`
    /// seals the part, matching [`FragmentedPartWriter::next`].
    pub fn write_fragment<'a>(&'a mut self, handle: &mut FragmentedPartWriter, last: bool) -> Result<B::ItemWriter<'a>> {
        handle.next(&mut self.backend, last)
    }

    /// Write `source`'s (or the package root's) `.rels` part.
    pub fn write_relationships(&mut self, relationships: &Relationships, source: &str) -> Result<()> {
        let rels_name = part_name::rels_part_for(source);
        let mut writer = self.open_part(&rels_name, RELATIONSHIPS)?;
        relationships.write_to(&mut writer)?;
        Ok(())
    }

    /// Flush the content-types manifest, if the backend uses one and it hasn't
    /// been flushed yet. A no-op on repeat calls; an error for backends that carry
    /// native per-item content types and thus have no such stream.
    pub fn write_content_types_stream(&mut self) -> Result<()> {
        if self.content_types_written {
            return Ok(());
        }
        let Some(name) = self.backend.content_types_stream_name().map(str::to_string) else {
            return Err(Error::OperationNotApplicable(
                "backend uses native per-item content types; no content-types stream".into(),
            ));
        };
        let mut writer = self.backend.create_item(&name, "application/xml")?;
        self.content_types.write_to(&mut writer)?;
        self.content_types_written = true;
        log::debug!("flushed content-types stream to {name}");
        Ok(())
    }

    /// Ensure the content-types stream has been emitted (if applicable) and
    /// release the backend.
    pub fn close(mut self) -> Result<B> {
        if self.backend.content_types_stream_name().is_some() {
            self.write_content_types_stream()?;
        }
        Ok(self.backend)
    }

    fn reconcile_content_type(&mut self, normalized_name: &str, content_type: &str) -> Result<()> {
        if self.content_types.get(normalized_name) == Some(content_type) {
            return Ok(());
        }
        if self.content_types_written {
            return Err(Error::InconsistentManifest {
                part: normalized_name.to_string(),
                existing: self.content_types.get(normalized_name).unwrap_or("").to_string(),
                requested: content_type.to_string(),
            });
        }
        self.content_types.add_override(normalized_name, content_type);
        Ok(())
    }
}
