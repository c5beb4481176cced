//! Physical backend contract (spec §4.8).
//!
//! The logical reader/writer never touches a concrete archive format directly; they
//! are generic over these two traits. [`zip`] provides the canonical ZIP-based
//! adapter; other physical formats implement the same traits without touching the
//! logical layer.

pub mod zip;

use crate::error::Result;
use std::io::Write;

/// Read-side physical item access: enumerate item names and fetch an item's bytes.
///
/// Items are opaque to the logical layer other than their name; reading an item is
/// eager (returns the whole byte vector) because physical containers in scope here
/// (ZIP) are seekable archives with cheap random access to any entry, and the XML
/// decoders that sit on top of these bytes (content types, relationships, core
/// properties) are themselves streaming pull-parsers, which is where the spec's
/// "avoid holding whole DOMs" requirement actually bites.
pub trait ReadBackend {
    /// Enumerate physical item names, in physical archive order.
    fn list_items(&self) -> Result<Vec<String>>;

    /// Read one item's contents in full. Returns [`crate::Error::NotFound`] if no
    /// such item exists.
    fn read_item(&mut self, name: &str) -> Result<Vec<u8>>;

    /// The physical name of the content-types stream, if this backend uses one
    /// (ZIP does; a hypothetical backend with native per-item MIME types would not).
    fn content_types_stream_name(&self) -> Option<&str> {
        Some("/[Content_Types].xml")
    }
}

/// Write-side physical item creation.
///
/// `create_item` returns a handle implementing [`Write`] for exactly one physical
/// item; backends that serialize entries (ZIP) require the caller to drop that
/// handle before creating the next item, which this trait's lifetime encodes: the
/// returned `ItemWriter` borrows the backend mutably for as long as it is alive.
pub trait WriteBackend {
    type ItemWriter<'a>: Write
    where
        Self: 'a;

    /// Start a new physical item with the given content type (ignored by backends
    /// that don't carry per-item metadata) and return a writer for its bytes.
    fn create_item<'a>(&'a mut self, name: &str, content_type: &str) -> Result<Self::ItemWriter<'a>>;

    /// See [`ReadBackend::content_types_stream_name`].
    fn content_types_stream_name(&self) -> Option<&str> {
        Some("/[Content_Types].xml")
    }
}
