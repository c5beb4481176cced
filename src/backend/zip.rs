//! The canonical ZIP-based physical backend (spec §6 "ZIP backend mapping").
//!
//! Part `/foo/bar` maps to ZIP entry `foo/bar`; this adapter strips and restores the
//! leading `/`. Directory-style entries (trailing `/`) are not parts.

use super::{ReadBackend, WriteBackend};
use crate::error::{Error, Result};
use std::io::{Read, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

fn strip_leading_slash(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

/// Read-side ZIP adapter, wrapping any seekable byte source.
pub struct ZipReadBackend<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> ZipReadBackend<R> {
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
        })
    }
}

impl<R: Read + Seek> ReadBackend for ZipReadBackend<R> {
    fn list_items(&self) -> Result<Vec<String>> {
        Ok(self
            .archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(|name| format!("/{name}"))
            .collect())
    }

    fn read_item(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry_name = strip_leading_slash(name);
        let mut file = self
            .archive
            .by_name(entry_name)
            .map_err(|_| Error::NotFound(name.to_string()))?;
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// Write-side ZIP adapter, wrapping any seekable byte sink.
pub struct ZipWriteBackend<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
}

impl<W: Write + Seek> ZipWriteBackend<W> {
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    /// Finalize the ZIP central directory and return the underlying writer.
    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

impl<W: Write + Seek> WriteBackend for ZipWriteBackend<W> {
    type ItemWriter<'a>
        = &'a mut ZipWriter<W>
    where
        W: 'a;

    fn create_item<'a>(&'a mut self, name: &str, _content_type: &str) -> Result<Self::ItemWriter<'a>> {
        let entry_name = strip_leading_slash(name);
        self.zip.start_file(entry_name, self.options)?;
        Ok(&mut self.zip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn roundtrip_single_entry() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut backend = ZipWriteBackend::new(&mut buf);
            let w = backend.create_item("/word/document.xml", "application/xml").unwrap();
            w.write_all(b"<doc/>").unwrap();
            backend.finish().unwrap();
        }

        let mut backend = ZipReadBackend::new(Cursor::new(buf.into_inner())).unwrap();
        let items = backend.list_items().unwrap();
        assert_eq!(items, vec!["/word/document.xml".to_string()]);
        assert_eq!(backend.read_item("/word/document.xml").unwrap(), b"<doc/>");
    }

    #[test]
    fn missing_item_is_not_found() {
        let buf = Cursor::new(Vec::new());
        let mut backend = ZipWriteBackend::new(buf);
        let w = backend.create_item("/a.xml", "application/xml").unwrap();
        w.write_all(b"x").unwrap();
        let bytes = backend.finish().unwrap().into_inner();

        let mut read_backend = ZipReadBackend::new(Cursor::new(bytes)).unwrap();
        assert!(read_backend.read_item("/missing.xml").is_err());
    }
}
