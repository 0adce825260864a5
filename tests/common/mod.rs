//! Fixture builders shared by the integration tests.
//!
//! Presentations and templates are assembled in-test with `zip` so the suite
//! needs no binary files on disk.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

/// One shape on a fixture slide.
pub enum Shape<'a> {
    /// Text frame with these paragraphs.
    Text(&'a [&'a str]),
    /// Text frame holding a single empty paragraph.
    EmptyFrame,
    /// Picture: no text frame.
    Picture,
}

fn shape_xml(id: usize, shape: &Shape<'_>) -> String {
    match shape {
        Shape::Text(paragraphs) => {
            let body: String = paragraphs
                .iter()
                .map(|p| format!("<a:p><a:r><a:rPr lang=\"en-GB\"/><a:t>{}</a:t></a:r></a:p>", escape(p)))
                .collect();
            format!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{body}</p:txBody></p:sp>"#
            )
        }
        Shape::EmptyFrame => format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Placeholder {id}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p/></p:txBody></p:sp>"#
        ),
        Shape::Picture => format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill/><p:spPr/></p:pic>"#
        ),
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn slide_xml(shapes: &[Shape<'_>]) -> String {
    let body: String = shapes
        .iter()
        .enumerate()
        .map(|(i, s)| shape_xml(i + 2, s))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{body}</p:spTree></p:cSld></p:sld>"#
    )
}

fn write_entries(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        zip.start_file(name.as_str(), FileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// A `.pptx` package whose slides hold `slides`, in order.
///
/// Slide parts are named in reverse so that order can only come from the
/// presentation's slide list.
pub fn build_pptx(slides: &[&[Shape<'_>]]) -> Vec<u8> {
    let n = slides.len();
    let part_name = |i: usize| format!("slide{}.xml", n - i);

    let sld_ids: String = (0..n)
        .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2))
        .collect();
    let presentation = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{sld_ids}</p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#
    );

    let slide_rels: String = (0..n)
        .map(|i| {
            format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/{}"/>"#,
                i + 2,
                part_name(i)
            )
        })
        .collect();
    let rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>{slide_rels}</Relationships>"#
    );

    let mut entries = vec![
        (
            "[Content_Types].xml".to_string(),
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#.to_vec(),
        ),
        (
            "docProps/core.xml".to_string(),
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Pump P-101 Incident Review</dc:title></cp:coreProperties>"#.to_vec(),
        ),
        ("ppt/presentation.xml".to_string(), presentation.into_bytes()),
        ("ppt/_rels/presentation.xml.rels".to_string(), rels.into_bytes()),
    ];
    for (i, shapes) in slides.iter().enumerate() {
        entries.push((
            format!("ppt/slides/{}", part_name(i)),
            slide_xml(shapes).into_bytes(),
        ));
    }
    write_entries(&entries)
}

/// The deck most tests use: two slides, a picture, an empty placeholder.
pub fn incident_deck() -> Vec<u8> {
    build_pptx(&[
        &[
            Shape::Text(&["Pump P-101 trip"]),
            Shape::Picture,
            Shape::Text(&["Event: seal failure", "Date: 3 March"]),
        ],
        &[Shape::EmptyFrame, Shape::Text(&["Root cause: worn seal"])],
    ])
}

pub const STYLES_PART: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/></w:style></w:styles>"#;

/// A `.docx` template whose body is `body_xml` (raw `w:p`/`w:tbl` markup).
pub fn build_docx_template(body_xml: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body_xml}<w:sectPr/></w:body></w:document>"#
    );
    let entries = vec![
        (
            "[Content_Types].xml".to_string(),
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#.to_vec(),
        ),
        (
            "_rels/.rels".to_string(),
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#.to_vec(),
        ),
        ("word/document.xml".to_string(), document.into_bytes()),
        ("word/styles.xml".to_string(), STYLES_PART.to_vec()),
    ];
    write_entries(&entries)
}

/// Uncompressed content of one package part.
pub fn read_entry(package: &Path, name: &str) -> Vec<u8> {
    let file = std::fs::File::open(package).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut data = Vec::new();
    entry.read_to_end(&mut data).unwrap();
    data
}

/// A well-formed reply in the layout the prompt asks for.
pub const SAMPLE_REPLY: &str = "Title:
Pump P-101 Seal Failure

Event Summary:
Pump P-101 tripped on high vibration.
Production was halted for four hours.

Contributing Factors:
- Worn mechanical seal
- Vibration alarm bypassed

Lessons Learned:
- Replace seals on the planned interval
- Never bypass protective alarms";
