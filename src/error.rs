//! Error types for opc-rs

use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML encoding error: {0}")]
    XmlEncoding(#[from] quick_xml::encoding::EncodingError),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed part name '{0}'")]
    MalformedName(String),

    #[error("malformed reference '{reference}' from source '{source_part}'")]
    MalformedReference { reference: String, source_part: String },

    #[error("malformed relationship: {0}")]
    MalformedRelationship(String),

    #[error("unknown content type for part '{0}'")]
    UnknownContentType(String),

    #[error("part not found: '{0}'")]
    NotFound(String),

    #[error("missing fragment {index} of part '{part}'")]
    MissingFragment { part: String, index: u32 },

    #[error("content type of part '{part}' is inconsistent: manifest has '{existing}', requested '{requested}'")]
    InconsistentManifest {
        part: String,
        existing: String,
        requested: String,
    },

    #[error("fragmented part '{0}' has already been finished")]
    AlreadyFinished(String),

    #[error("operation not applicable: {0}")]
    OperationNotApplicable(String),

    #[error("malformed XML in '{part}': {detail}")]
    MalformedXml { part: String, detail: String },

    #[error("missing attribute '{attr}' on element '{element}'")]
    MissingAttribute { element: String, attr: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
