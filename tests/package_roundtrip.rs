//! Integration tests exercising `PackageReader`/`PackageWriter` together over
//! real ZIP-backed packages (spec §8 scenarios 4 and 6).

use opc_rs::backend::zip::{ZipReadBackend, ZipWriteBackend};
use opc_rs::relationships::{rel_types, Relationships};
use opc_rs::{PackageReader, PackageWriter};
use std::io::{Cursor, Read, Write};

fn build_sample_package() -> Vec<u8> {
    let mut writer = PackageWriter::new(ZipWriteBackend::new(Cursor::new(Vec::new())));

    writer
        .open_part("/word/document.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml")
        .unwrap()
        .write_all(b"<document/>")
        .unwrap();

    let mut doc_rels = Relationships::new();
    doc_rels.add(rel_types::IMAGE, "media/image1.png");
    writer.write_relationships(&doc_rels, "/word/document.xml").unwrap();

    writer
        .open_part("/word/media/image1.png", "image/png")
        .unwrap()
        .write_all(b"\x89PNG\r\n\x1a\n")
        .unwrap();

    let mut root_rels = Relationships::new();
    root_rels.add(rel_types::OFFICE_DOCUMENT, "word/document.xml");
    writer.write_relationships(&root_rels, "/").unwrap();

    let backend = writer.close().unwrap();
    backend.finish().unwrap().into_inner()
}

#[test]
fn rewrite_a_package_preserves_parts_and_root_relationships() {
    let original_bytes = build_sample_package();

    let mut reader = PackageReader::new(ZipReadBackend::new(Cursor::new(original_bytes)).unwrap()).unwrap();

    let part_names: Vec<String> = reader.list_parts(false).map(|(name, _)| name.to_string()).collect();
    assert!(part_names.contains(&"/word/document.xml".to_string()));
    assert!(part_names.contains(&"/word/media/image1.png".to_string()));

    let mut rewritten = PackageWriter::new(ZipWriteBackend::new(Cursor::new(Vec::new())));

    let root_rels = reader.raw_relationships("/").unwrap();
    rewritten.write_relationships(&root_rels, "/").unwrap();

    let parts: Vec<(String, String)> = reader
        .list_parts(false)
        .map(|(name, content_type)| (name.to_string(), content_type.unwrap().to_string()))
        .collect();

    for (name, content_type) in parts {
        let mut bytes = Vec::new();
        reader.open_part(&name).unwrap().read_to_end(&mut bytes).unwrap();
        rewritten.open_part(&name, &content_type).unwrap().write_all(&bytes).unwrap();

        let part_rels = reader.raw_relationships(&name).unwrap();
        if !part_rels.is_empty() {
            rewritten.write_relationships(&part_rels, &name).unwrap();
        }
    }

    let rewritten_backend = rewritten.close().unwrap();
    let rewritten_bytes = rewritten_backend.finish().unwrap().into_inner();

    let mut reread = PackageReader::new(ZipReadBackend::new(Cursor::new(rewritten_bytes)).unwrap()).unwrap();

    let mut reread_names: Vec<String> = reread.list_parts(false).map(|(name, _)| name.to_string()).collect();
    let mut original_names: Vec<String> = reader.list_parts(false).map(|(name, _)| name.to_string()).collect();
    reread_names.sort();
    original_names.sort();
    assert_eq!(reread_names, original_names);

    for name in &reread_names {
        let original_ct = reader.list_parts(false).find(|(n, _)| n == name).unwrap().1;
        let reread_ct = reread.list_parts(false).find(|(n, _)| n == name).unwrap().1;
        assert_eq!(original_ct, reread_ct, "content type mismatch for {name}");
    }

    let reread_root_rels = reread.raw_relationships("/").unwrap();
    assert!(!reread_root_rels.is_empty());
    assert!(reread_root_rels.by_type(rel_types::OFFICE_DOCUMENT).is_some());
}

/// Spec scenario 5: a fragmented part's fragments are written with a whole other
/// part's write interleaved between them, through the public `PackageWriter` API.
#[test]
fn interleaved_fragmented_and_whole_part_writes() {
    let mut writer = PackageWriter::new(ZipWriteBackend::new(Cursor::new(Vec::new())));

    let mut foo = writer.create_fragmented_part("/foo.txt", "text/plain").unwrap();
    writer.write_fragment(&mut foo, false).unwrap().write_all(b"Hello, ").unwrap();

    writer.open_part("/bar.txt", "text/plain").unwrap().write_all(b"Other part's contents").unwrap();

    writer.write_fragment(&mut foo, true).unwrap().write_all(b"World!").unwrap();

    let backend = writer.close().unwrap();
    let bytes = backend.finish().unwrap().into_inner();

    let mut reader = PackageReader::new(ZipReadBackend::new(Cursor::new(bytes)).unwrap()).unwrap();

    let mut foo_contents = String::new();
    reader.open_part("/foo.txt").unwrap().read_to_string(&mut foo_contents).unwrap();
    assert_eq!(foo_contents, "Hello, World!");

    let mut bar_contents = String::new();
    reader.open_part("/bar.txt").unwrap().read_to_string(&mut bar_contents).unwrap();
    assert_eq!(bar_contents, "Other part's contents");
}

#[test]
fn empty_package_has_no_parts_relationships_or_core_properties() {
    let writer = PackageWriter::new(ZipWriteBackend::new(Cursor::new(Vec::new())));
    let backend = writer.close().unwrap();
    let bytes = backend.finish().unwrap().into_inner();

    let mut reader = PackageReader::new(ZipReadBackend::new(Cursor::new(bytes)).unwrap()).unwrap();

    assert_eq!(reader.list_parts(false).count(), 0);
    assert_eq!(reader.list_parts(true).count(), 0);

    let related = reader.related_parts_by_type("/").unwrap();
    assert!(related.is_empty());

    let core_props = reader.core_properties().unwrap();
    assert_eq!(core_props, opc_rs::CoreProperties::default());
}
