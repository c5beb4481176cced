//! Part-name normalization, validation and reference resolution (spec §4.1).
//!
//! Part names are absolute URI paths such as `/word/document.xml`. This module is
//! pure: no I/O, no knowledge of packages or parts, just string grammar.

use crate::error::{Error, Result};

/// Characters allowed unescaped in a part-name segment, beyond ASCII alphanumerics.
/// Mirrors `RE_PART_NAME`'s character class in the OPC reference implementation.
const UNRESERVED_EXTRA: &[u8] = b"-._~%:@!$&'()*+,;=";

/// Percent-encode every byte outside the OPC unreserved set, then lowercase.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for &b in name.as_bytes() {
        if b == b'/' || b == b'#' || b == b'[' || b == b']' || b.is_ascii_alphanumeric() || UNRESERVED_EXTRA.contains(&b)
        {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out.to_lowercase()
}

/// Validate that `name` matches the part-name grammar of spec §3.
///
/// Accepts `"/"` on its own only when `allow_root` is set (used for the package-root
/// relationships part).
pub fn check(name: &str, allow_root: bool) -> Result<()> {
    if name == "/" {
        return if allow_root {
            Ok(())
        } else {
            Err(Error::MalformedName(name.to_string()))
        };
    }

    if !name.starts_with('/') || name.ends_with('/') || name.len() < 2 {
        return Err(Error::MalformedName(name.to_string()));
    }

    let lower = name.to_lowercase();
    if lower.contains("%2f") || lower.contains("%5c") {
        return Err(Error::MalformedName(name.to_string()));
    }

    for segment in name[1..].split('/') {
        if segment.is_empty() {
            return Err(Error::MalformedName(name.to_string()));
        }
        if segment.chars().all(|c| c == '.') {
            return Err(Error::MalformedName(name.to_string()));
        }
        if !segment_is_valid(segment) {
            return Err(Error::MalformedName(name.to_string()));
        }
    }

    Ok(())
}

fn segment_is_valid(segment: &str) -> bool {
    let mut chars = segment.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if hex.len() != 2 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return false;
            }
            continue;
        }
        if c.is_ascii_alphanumeric() || UNRESERVED_EXTRA.contains(&(c as u8)) {
            continue;
        }
        return false;
    }
    true
}

/// Resolve a relationship `target` reference against the part it is stored in.
///
/// `source` is the part name the relationship's `.rels` companion belongs to (use
/// `"/"` for the package-root relationships). Absolute references (`ref` starting
/// with `/`) reset to root; everything else is resolved relative to `source`'s
/// parent, consuming `.` and popping on `..`.
pub fn resolve(reference: &str, source: &str) -> Result<String> {
    if reference.starts_with('/') {
        return Ok(normalize(reference));
    }

    let parent = parent_segments(source);
    let mut segments = parent;

    for part in reference.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(Error::MalformedReference {
                        reference: reference.to_string(),
                        source_part: source.to_string(),
                    });
                }
            }
            s => segments.push(s.to_string()),
        }
    }

    Ok(normalize(&format!("/{}", segments.join("/"))))
}

fn parent_segments(part_name: &str) -> Vec<String> {
    let trimmed = part_name.trim_start_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut segments: Vec<String> = trimmed.split('/').map(String::from).collect();
    segments.pop();
    segments
}

/// Compute the relationships part name for any part name (spec §3).
///
/// `/word/document.xml` -> `/word/_rels/document.xml.rels`; the package root `/`
/// maps to `/_rels/.rels`.
pub fn rels_part_for(part_name: &str) -> String {
    if part_name == "/" {
        return "/_rels/.rels".to_string();
    }
    let trimmed = part_name.trim_start_matches('/');
    match trimmed.rsplit_once('/') {
        Some((dir, file)) => format!("/{}/_rels/{}.rels", dir, file),
        None => format!("/_rels/{}.rels", trimmed),
    }
}

/// The lowercased extension of a part name's last segment, if any.
pub fn extension(part_name: &str) -> Option<String> {
    let file_name = part_name.rsplit('/').next()?;
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        let n1 = normalize("/Word/Document.XML");
        let n2 = normalize(&n1);
        assert_eq!(n1, n2);
    }

    #[test]
    fn normalize_lowercases_and_encodes() {
        assert_eq!(normalize("/Wörd/a.xml"), "/w%c3%b6rd/a.xml");
    }

    #[test]
    fn reject_missing_leading_slash() {
        assert!(check("word/document.xml", false).is_err());
    }

    #[test]
    fn reject_trailing_slash() {
        assert!(check("/word/document/", false).is_err());
    }

    #[test]
    fn reject_non_ascii_segment() {
        assert!(check("/schönes/Dokument", false).is_err());
    }

    #[test]
    fn reject_encoded_slash() {
        assert!(check("/ein%2fDokument.xml", false).is_err());
    }

    #[test]
    fn accept_well_formed_name() {
        assert!(check("/word/document.xml", false).is_ok());
    }

    #[test]
    fn root_rejected_unless_allowed() {
        assert!(check("/", false).is_err());
        assert!(check("/", true).is_ok());
    }

    #[test]
    fn resolve_absolute_from_root() {
        assert_eq!(resolve("word/document.xml", "/").unwrap(), "/word/document.xml");
    }

    #[test]
    fn resolve_same_dir() {
        assert_eq!(resolve("./document.xml", "/word/a.xml").unwrap(), "/word/document.xml");
    }

    #[test]
    fn resolve_parent_dir() {
        assert_eq!(resolve("../document.xml", "/word/a.xml").unwrap(), "/document.xml");
    }

    #[test]
    fn resolve_absolute_reference() {
        assert_eq!(resolve("/document.xml", "/word/a.xml").unwrap(), "/document.xml");
    }

    #[test]
    fn resolve_past_root_fails() {
        assert!(resolve("../../document.xml", "/word/a.xml").is_err());
    }

    #[test]
    fn rels_part_for_nested() {
        assert_eq!(rels_part_for("/word/document.xml"), "/word/_rels/document.xml.rels");
    }

    #[test]
    fn rels_part_for_root() {
        assert_eq!(rels_part_for("/"), "/_rels/.rels");
    }

    #[test]
    fn extension_lowercase_last_segment() {
        assert_eq!(extension("/word/media/image1.PNG"), Some("png".to_string()));
        assert_eq!(extension("/word/document"), None);
    }
}
