//! Slide text extraction from PPTX packages.
//!
//! Produces the RawText sent to the model: for every slide in presentation
//! order, for every shape in shape-tree order, the text of each shape that
//! carries a text frame, followed by a newline.
//!
//! Slide order comes from `p:sldIdLst` in `ppt/presentation.xml` resolved
//! through its relationships, not from part names: `slide10.xml` may well be
//! the second slide after a reorder.
//!
//! Only direct children of the shape tree count as shapes. Group members,
//! pictures, tables and charts have no text frame of their own and are
//! skipped without error, as is anything wrapped in `mc:AlternateContent`.

use crate::error::Pptx2DocxError;
use crate::ooxml::{parse_relationships, read_part, resolve_target};
use crate::output::PresentationMetadata;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::{debug, info};
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
const CORE_PROPS_PART: &str = "docProps/core.xml";

/// Text of one slide: one entry per text-bearing shape, in shape order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSlide {
    /// 1-indexed position in the deck.
    pub number: usize,
    /// Text of each shape with a text frame. Empty frames yield `""`.
    pub shapes: Vec<String>,
}

/// Everything the extractor read from a deck.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPresentation {
    /// Slides in presentation order.
    pub slides: Vec<ExtractedSlide>,
    /// `dc:title` from the package core properties, if set.
    pub title: Option<String>,
}

impl ExtractedPresentation {
    /// Concatenate all shape texts, each followed by `\n`.
    pub fn raw_text(&self) -> String {
        let mut text = String::new();
        for slide in &self.slides {
            for shape in &slide.shapes {
                text.push_str(shape);
                text.push('\n');
            }
        }
        text
    }

    /// Counts for `inspect` and the run statistics.
    pub fn metadata(&self) -> PresentationMetadata {
        PresentationMetadata {
            title: self.title.clone(),
            slide_count: self.slides.len(),
            text_shape_count: self.slides.iter().map(|s| s.shapes.len()).sum(),
            char_count: self
                .slides
                .iter()
                .flat_map(|s| s.shapes.iter())
                .map(|t| t.chars().count())
                .sum(),
        }
    }
}

/// Extract RawText from the presentation at `path`.
///
/// An empty deck yields an empty string. Anything that is not a readable PPTX
/// package is a fatal [`Pptx2DocxError::CorruptPresentation`].
pub fn extract_text(path: &Path) -> Result<String, Pptx2DocxError> {
    Ok(extract_presentation(path)?.raw_text())
}

/// Extract per-slide shape texts from the presentation at `path`.
pub fn extract_presentation(path: &Path) -> Result<ExtractedPresentation, Pptx2DocxError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Pptx2DocxError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => Pptx2DocxError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Pptx2DocxError::CorruptPresentation {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })?;

    let presentation = extract_from_reader(BufReader::new(file)).map_err(|detail| {
        Pptx2DocxError::CorruptPresentation {
            path: path.to_path_buf(),
            detail,
        }
    })?;

    let meta = presentation.metadata();
    info!(
        "Extracted {} text shapes from {} slides ({} chars)",
        meta.text_shape_count, meta.slide_count, meta.char_count
    );
    Ok(presentation)
}

/// Extract from any seekable reader holding a PPTX package.
pub fn extract_from_reader<R: Read + Seek>(reader: R) -> Result<ExtractedPresentation, String> {
    let mut archive =
        ZipArchive::new(reader).map_err(|e| format!("not a valid PPTX container: {}", e))?;

    let slide_paths = slide_order(&mut archive)?;
    debug!("Presentation lists {} slides", slide_paths.len());

    let mut slides = Vec::with_capacity(slide_paths.len());
    for (idx, part) in slide_paths.iter().enumerate() {
        let xml = read_part(&mut archive, part)?;
        let shapes = shape_texts(&xml).map_err(|e| format!("{}: {}", part, e))?;
        slides.push(ExtractedSlide {
            number: idx + 1,
            shapes,
        });
    }

    // Core properties are optional; a deck without them is still a deck.
    let title = read_part(&mut archive, CORE_PROPS_PART)
        .ok()
        .and_then(|xml| core_title(&xml));

    Ok(ExtractedPresentation { slides, title })
}

/// Slide part names in presentation order.
fn slide_order<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>, String> {
    let presentation = read_part(archive, PRESENTATION_PART)?;
    let rels = parse_relationships(&read_part(archive, PRESENTATION_RELS)?)?;

    let mut reader = Reader::from_str(&presentation);
    reader.trim_text(true);

    let mut ids = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"sldId" =>
            {
                if let Some(rid) = relationship_id(e)? {
                    ids.push(rid);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("error parsing {}: {}", PRESENTATION_PART, e)),
            _ => {}
        }
    }

    ids.into_iter()
        .map(|rid| {
            rels.get(&rid)
                .map(|target| resolve_target("ppt", target))
                .ok_or_else(|| format!("slide relationship '{}' has no target", rid))
        })
        .collect()
}

/// The `r:id` attribute of a `p:sldId` element (prefixed `id`, not the numeric `id`).
fn relationship_id(e: &BytesStart<'_>) -> Result<Option<String>, String> {
    for attr in e.attributes().flatten() {
        if attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id" {
            let value = attr
                .unescape_value()
                .map_err(|e| format!("bad sldId attribute: {}", e))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Shape currently being read.
struct OpenShape {
    /// Stack depth at which the `p:sp` element was opened.
    depth: usize,
    has_text_frame: bool,
    paragraphs: Vec<String>,
}

impl OpenShape {
    fn current_paragraph(&mut self) -> &mut String {
        if self.paragraphs.is_empty() {
            self.paragraphs.push(String::new());
        }
        let last = self.paragraphs.len() - 1;
        &mut self.paragraphs[last]
    }
}

/// Texts of the top-level text-bearing shapes of one slide.
///
/// Paragraphs (`a:p`) are joined with `\n`; runs and fields (`a:t`) are
/// concatenated; line breaks (`a:br`) become `\n`.
pub fn shape_texts(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut shape: Option<OpenShape> = None;
    let mut in_text = false;
    let mut shapes = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name().as_ref().to_vec();
                let parent = stack.last().map(|n| n.as_slice());
                match name.as_slice() {
                    b"sp" if shape.is_none() && parent == Some(b"spTree".as_slice()) => {
                        shape = Some(OpenShape {
                            depth: stack.len(),
                            has_text_frame: false,
                            paragraphs: Vec::new(),
                        });
                    }
                    b"txBody" => {
                        if let Some(s) = shape.as_mut() {
                            s.has_text_frame = true;
                        }
                    }
                    b"p" if parent == Some(b"txBody".as_slice()) => {
                        if let Some(s) = shape.as_mut() {
                            s.paragraphs.push(String::new());
                        }
                    }
                    b"t" => in_text = shape.is_some(),
                    b"br" => {
                        if let Some(s) = shape.as_mut() {
                            s.current_paragraph().push('\n');
                        }
                    }
                    _ => {}
                }
                stack.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                let parent = stack.last().map(|n| n.as_slice());
                match e.local_name().as_ref() {
                    b"txBody" => {
                        if let Some(s) = shape.as_mut() {
                            s.has_text_frame = true;
                        }
                    }
                    b"p" if parent == Some(b"txBody".as_slice()) => {
                        if let Some(s) = shape.as_mut() {
                            s.paragraphs.push(String::new());
                        }
                    }
                    b"br" => {
                        if let Some(s) = shape.as_mut() {
                            s.current_paragraph().push('\n');
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref t)) => {
                if in_text {
                    if let Some(s) = shape.as_mut() {
                        let text = t.unescape().map_err(|e| format!("bad text: {}", e))?;
                        s.current_paragraph().push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                stack.pop();
                match e.local_name().as_ref() {
                    b"t" => in_text = false,
                    b"sp" if shape.as_ref().is_some_and(|s| s.depth == stack.len()) => {
                        if let Some(done) = shape.take() {
                            if done.has_text_frame {
                                shapes.push(done.paragraphs.join("\n"));
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML error: {}", e)),
            _ => {}
        }
    }

    Ok(shapes)
}

/// `dc:title` from `docProps/core.xml`, when present and non-empty.
fn core_title(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut in_title = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"title" => in_title = true,
            Ok(Event::Text(ref t)) if in_title => {
                let title = t.unescape().ok()?.trim().to_string();
                return (!title.is_empty()).then_some(title);
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"title" => return None,
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{body}</p:spTree></p:cSld></p:sld>"#
        )
    }

    #[test]
    fn shapes_in_document_order() {
        let xml = slide(
            r#"<p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:t>Pump trip</a:t></a:r></a:p></p:txBody></p:sp>
<p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:t>Seal </a:t></a:r><a:r><a:t>failure</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        assert_eq!(shape_texts(&xml).unwrap(), vec!["Pump trip", "Seal failure"]);
    }

    #[test]
    fn paragraphs_and_breaks_become_newlines() {
        let xml = slide(
            r#"<p:sp><p:txBody><a:p><a:r><a:t>one</a:t></a:r><a:br/><a:r><a:t>two</a:t></a:r></a:p><a:p><a:r><a:t>three</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        assert_eq!(shape_texts(&xml).unwrap(), vec!["one\ntwo\nthree"]);
    }

    #[test]
    fn shape_without_text_frame_is_skipped() {
        let xml = slide(
            r#"<p:sp><p:spPr/></p:sp><p:pic><p:blipFill/></p:pic><p:sp><p:txBody><a:p><a:r><a:t>kept</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        assert_eq!(shape_texts(&xml).unwrap(), vec!["kept"]);
    }

    #[test]
    fn empty_text_frame_contributes_empty_entry() {
        let xml = slide(r#"<p:sp><p:txBody><a:bodyPr/><a:p/></p:txBody></p:sp>"#);
        assert_eq!(shape_texts(&xml).unwrap(), vec![String::new()]);
    }

    #[test]
    fn group_members_are_not_top_level_shapes() {
        let xml = slide(
            r#"<p:grpSp><p:sp><p:txBody><a:p><a:r><a:t>grouped</a:t></a:r></a:p></p:txBody></p:sp></p:grpSp><p:sp><p:txBody><a:p><a:r><a:t>top</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        assert_eq!(shape_texts(&xml).unwrap(), vec!["top"]);
    }

    #[test]
    fn entities_are_unescaped() {
        let xml = slide(
            r#"<p:sp><p:txBody><a:p><a:r><a:t>P&amp;ID &lt;rev 2&gt;</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        assert_eq!(shape_texts(&xml).unwrap(), vec!["P&ID <rev 2>"]);
    }

    #[test]
    fn fields_are_included() {
        let xml = slide(
            r#"<p:sp><p:txBody><a:p><a:r><a:t>Slide </a:t></a:r><a:fld id="{1}" type="slidenum"><a:t>4</a:t></a:fld></a:p></p:txBody></p:sp>"#,
        );
        assert_eq!(shape_texts(&xml).unwrap(), vec!["Slide 4"]);
    }

    #[test]
    fn raw_text_has_one_segment_per_shape() {
        let pres = ExtractedPresentation {
            slides: vec![
                ExtractedSlide {
                    number: 1,
                    shapes: vec!["a".into(), "".into()],
                },
                ExtractedSlide {
                    number: 2,
                    shapes: vec!["b".into()],
                },
            ],
            title: None,
        };
        assert_eq!(pres.raw_text(), "a\n\nb\n");
        assert_eq!(pres.metadata().text_shape_count, 3);
        assert_eq!(pres.metadata().char_count, 2);
    }

    #[test]
    fn core_title_is_read() {
        let xml = r#"<cp:coreProperties xmlns:cp="x" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Q3 Incident Review</dc:title></cp:coreProperties>"#;
        assert_eq!(core_title(xml).as_deref(), Some("Q3 Incident Review"));
        assert_eq!(core_title("<cp:coreProperties/>"), None);
    }

    #[test]
    fn garbage_is_an_error() {
        let err = extract_from_reader(std::io::Cursor::new(b"not a zip".to_vec())).unwrap_err();
        assert!(err.contains("not a valid PPTX"), "got: {err}");
    }
}
