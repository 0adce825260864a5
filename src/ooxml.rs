//! Small helpers shared by the PPTX reader and the DOCX writer.
//!
//! Both formats are Office Open XML packages: a ZIP archive of XML parts tied
//! together by `.rels` relationship files. Only the handful of operations the
//! pipeline needs live here.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive};

/// Read a package part as UTF-8 text.
pub(crate) fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, String> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| format!("part '{}' not found in package: {}", name, e))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| format!("failed to read part '{}': {}", name, e))?;

    Ok(content)
}

/// Relationship type of a package's main part (`word/document.xml`, `ppt/presentation.xml`).
pub(crate) const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// One `<Relationship>` entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub kind: String,
    pub target: String,
}

/// Parse a `.rels` part into its relationships, in document order.
pub(crate) fn relationships(xml: &str) -> Result<Vec<Relationship>, String> {
    let mut rels = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut kind = String::new();
                let mut target = None;
                for attr in e.attributes().flatten() {
                    let value = attr
                        .unescape_value()
                        .map_err(|e| format!("bad relationship attribute: {}", e))?
                        .into_owned();
                    match attr.key.as_ref() {
                        b"Id" => id = Some(value),
                        b"Type" => kind = value,
                        b"Target" => target = Some(value),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    rels.push(Relationship { id, kind, target });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("error parsing relationships: {}", e)),
            _ => {}
        }
    }

    Ok(rels)
}

/// Parse a `.rels` part into an `Id → Target` map.
pub(crate) fn parse_relationships(xml: &str) -> Result<HashMap<String, String>, String> {
    Ok(relationships(xml)?
        .into_iter()
        .map(|rel| (rel.id, rel.target))
        .collect())
}

/// Locate the main part of a package through its root `_rels/.rels`.
///
/// Falls back to `default` when the package has no root relationships or no
/// officeDocument entry.
pub(crate) fn main_part<R: Read + Seek>(archive: &mut ZipArchive<R>, default: &str) -> String {
    read_part(archive, "_rels/.rels")
        .and_then(|xml| relationships(&xml))
        .ok()
        .and_then(|rels| {
            rels.into_iter()
                .find(|rel| rel.kind == OFFICE_DOCUMENT_REL)
                .map(|rel| resolve_target("", &rel.target))
        })
        .unwrap_or_else(|| default.to_string())
}

/// Resolve a relationship target against the directory of its source part.
///
/// `resolve_target("ppt", "slides/slide1.xml")` → `ppt/slides/slide1.xml`;
/// absolute targets (`/ppt/...`) drop the leading slash; `..` segments pop.
pub(crate) fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(abs) = target.strip_prefix('/') {
        return abs.to_string();
    }

    let mut parts: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Options for every entry this crate writes.
///
/// The timestamp is pinned to the ZIP epoch so identical content always
/// produces identical bytes.
pub(crate) fn entry_options() -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}
