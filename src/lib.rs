//! # opc-rs
//!
//! Reader and writer for Open Packaging Conventions (ECMA-376 Part 2) containers:
//! the ZIP-based package format underlying Office Open XML documents and its
//! derivatives.
//!
//! ## Scope
//!
//! This crate implements the logical package layer: part-name normalization and
//! validation, the content-types manifest, the relationships codec, fragmented
//! ("interleaved") part reassembly and emission, and the Core Properties metadata
//! part. The physical container format is abstracted behind [`backend`]; the
//! bundled [`backend::zip`] adapter is the canonical one.
//!
//! Digital signatures, markup-compatibility processing, interleaved content-types
//! streams, random-access seeking into interleaved parts, and schema validation
//! beyond what OPC requires are out of scope.
//!
//! ## Quick start
//!
//! ```
//! use opc_rs::backend::zip::ZipWriteBackend;
//! use opc_rs::relationships::{rel_types, Relationships};
//! use opc_rs::writer::PackageWriter;
//! use std::io::{Cursor, Write};
//!
//! let mut writer = PackageWriter::new(ZipWriteBackend::new(Cursor::new(Vec::new())));
//! writer
//!     .open_part("/word/document.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml")
//!     .unwrap()
//!     .write_all(b"<document/>")
//!     .unwrap();
//!
//! let mut rels = Relationships::new();
//! rels.add(rel_types::OFFICE_DOCUMENT, "word/document.xml");
//! writer.write_relationships(&rels, "/").unwrap();
//!
//! let backend = writer.close().unwrap();
//! backend.finish().unwrap();
//! ```

pub mod backend;
pub mod content_types;
pub mod core_properties;
pub mod error;
pub mod fragment;
pub mod part_name;
pub mod reader;
pub mod relationships;
pub mod writer;

pub use content_types::ContentTypes;
pub use core_properties::CoreProperties;
pub use error::{Error, Result};
pub use reader::PackageReader;
pub use relationships::{Relationship, Relationships, TargetMode};
pub use writer::PackageWriter;

/// Normalized content-types stream part name (spec §6).
pub const CONTENT_TYPES_PART_NAME: &str = "/[Content_Types].xml";
/// Default Core Properties part name (spec §6).
pub const CORE_PROPERTIES_PART_NAME: &str = "/docProps/core.xml";
