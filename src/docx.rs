//! Minimal WordprocessingML: an in-memory block tree, a package writer, and
//! the paragraph-level rewriting used by template mode.
//!
//! The writer emits the smallest package Word opens without complaint:
//! content types, package and document relationships, a style sheet with
//! `Heading1`, `Heading2` and `ListBullet`, one bullet numbering definition,
//! and core properties. No part carries a timestamp, so the same
//! [`Document`] always serialises to the same bytes.

use crate::ooxml::{entry_options, main_part, read_part};
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::{ZipArchive, ZipWriter};

/// WordprocessingML main namespace.
pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Default location of the main document part.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// MIME type of a `.docx` file.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

// ── Document model ───────────────────────────────────────────────────────

/// One top-level body element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `Heading1` / `Heading2` paragraph.
    Heading { level: u8, text: String },
    /// Body paragraph; `\n` inside the text becomes a line break.
    Paragraph(String),
    /// One item of the bulleted list.
    Bullet(String),
}

/// A document as an ordered list of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heading(&mut self, level: u8, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Heading {
            level: level.clamp(1, 2),
            text: text.into(),
        });
        self
    }

    pub fn paragraph(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Paragraph(text.into()));
        self
    }

    pub fn bullet(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Bullet(text.into()));
        self
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Text of the first level-1 heading.
    pub fn title(&self) -> Option<&str> {
        self.blocks.iter().find_map(|b| match b {
            Block::Heading { level: 1, text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Blocks between the heading titled `heading` and the next heading.
    pub fn section(&self, heading: &str) -> Option<&[Block]> {
        let start = self
            .blocks
            .iter()
            .position(|b| matches!(b, Block::Heading { text, .. } if text == heading))?
            + 1;
        let len = self.blocks[start..]
            .iter()
            .position(|b| matches!(b, Block::Heading { .. }))
            .unwrap_or(self.blocks.len() - start);
        Some(&self.blocks[start..start + len])
    }

    /// Serialise into a complete `.docx` package.
    pub fn to_bytes(&self) -> Result<Vec<u8>, String> {
        let document = self.document_xml()?;
        let core = core_properties(self.title().unwrap_or_default());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let parts: [(&str, &[u8]); 7] = [
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("_rels/.rels", PACKAGE_RELS.as_bytes()),
            ("docProps/core.xml", core.as_bytes()),
            (DOCUMENT_PART, &document),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
            ("word/styles.xml", STYLES.as_bytes()),
            ("word/numbering.xml", NUMBERING.as_bytes()),
        ];
        for (name, data) in parts {
            zip.start_file(name, entry_options())
                .map_err(|e| format!("zip entry {name}: {e}"))?;
            zip.write_all(data)
                .map_err(|e| format!("zip write {name}: {e}"))?;
        }
        let cursor = zip.finish().map_err(|e| format!("zip finish: {e}"))?;
        Ok(cursor.into_inner())
    }

    fn document_xml(&self) -> Result<Vec<u8>, String> {
        let mut w = Writer::new(Vec::new());
        write_decl(&mut w)?;
        let mut root = BytesStart::new("w:document");
        root.push_attribute(("xmlns:w", W_NS));
        emit(&mut w, Event::Start(root))?;
        emit(&mut w, Event::Start(BytesStart::new("w:body")))?;

        for block in &self.blocks {
            match block {
                Block::Heading { level, text } => {
                    let style = format!("Heading{level}");
                    write_paragraph(&mut w, Some(&style), false, text)?;
                }
                Block::Paragraph(text) => write_paragraph(&mut w, None, false, text)?,
                Block::Bullet(text) => write_paragraph(&mut w, Some("ListBullet"), true, text)?,
            }
        }

        emit(&mut w, Event::Start(BytesStart::new("w:sectPr")))?;
        let mut size = BytesStart::new("w:pgSz");
        size.push_attribute(("w:w", "11906"));
        size.push_attribute(("w:h", "16838"));
        emit(&mut w, Event::Empty(size))?;
        emit(&mut w, Event::End(BytesEnd::new("w:sectPr")))?;

        emit(&mut w, Event::End(BytesEnd::new("w:body")))?;
        emit(&mut w, Event::End(BytesEnd::new("w:document")))?;
        Ok(w.into_inner())
    }
}

// ── XML writing helpers ──────────────────────────────────────────────────

fn emit<W: Write>(w: &mut Writer<W>, event: Event<'_>) -> Result<(), String> {
    w.write_event(event).map_err(|e| format!("xml write: {e}"))
}

fn write_decl<W: Write>(w: &mut Writer<W>) -> Result<(), String> {
    emit(w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
}

fn val_element<W: Write>(w: &mut Writer<W>, name: &str, val: &str) -> Result<(), String> {
    let mut e = BytesStart::new(name);
    e.push_attribute(("w:val", val));
    emit(w, Event::Empty(e))
}

fn write_paragraph<W: Write>(
    w: &mut Writer<W>,
    style: Option<&str>,
    numbered: bool,
    text: &str,
) -> Result<(), String> {
    emit(w, Event::Start(BytesStart::new("w:p")))?;
    if style.is_some() || numbered {
        emit(w, Event::Start(BytesStart::new("w:pPr")))?;
        if let Some(style) = style {
            val_element(w, "w:pStyle", style)?;
        }
        if numbered {
            emit(w, Event::Start(BytesStart::new("w:numPr")))?;
            val_element(w, "w:ilvl", "0")?;
            val_element(w, "w:numId", "1")?;
            emit(w, Event::End(BytesEnd::new("w:numPr")))?;
        }
        emit(w, Event::End(BytesEnd::new("w:pPr")))?;
    }
    if !text.is_empty() {
        write_run(w, "w:", &[], text)?;
    }
    emit(w, Event::End(BytesEnd::new("w:p")))
}

/// One run holding `text`, with `rpr` (already-serialised run properties
/// events) first and `\n` rendered as `<w:br/>`.
fn write_run<W: Write>(
    w: &mut Writer<W>,
    prefix: &str,
    rpr: &[Event<'static>],
    text: &str,
) -> Result<(), String> {
    let tag = |local: &str| format!("{prefix}{local}");
    emit(w, Event::Start(BytesStart::new(tag("r"))))?;
    for ev in rpr {
        emit(w, ev.clone())?;
    }
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            emit(w, Event::Empty(BytesStart::new(tag("br"))))?;
        }
        let mut t = BytesStart::new(tag("t"));
        t.push_attribute(("xml:space", "preserve"));
        emit(w, Event::Start(t))?;
        emit(w, Event::Text(BytesText::new(line)))?;
        emit(w, Event::End(BytesEnd::new(tag("t"))))?;
    }
    emit(w, Event::End(BytesEnd::new(tag("r"))))
}

fn core_properties(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title><dc:creator>edgequake-pptx2docx</dc:creator></cp:coreProperties>"#,
        escape(title)
    )
}

// ── Reading ──────────────────────────────────────────────────────────────

/// A body paragraph as read back from a package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphText {
    /// `w:pStyle` value, e.g. `Heading1`.
    pub style: Option<String>,
    /// Whether the paragraph carries list numbering.
    pub numbered: bool,
    /// Run text with breaks as `\n` and tabs as `\t`.
    pub text: String,
}

/// Read every paragraph of the main document part of the package at `path`,
/// table cells included, in document order.
pub fn paragraph_texts(path: &Path) -> Result<Vec<ParagraphText>, String> {
    let file = std::fs::File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    paragraph_texts_from_reader(file)
}

pub fn paragraph_texts_from_reader<R: Read + Seek>(reader: R) -> Result<Vec<ParagraphText>, String> {
    let mut archive = ZipArchive::new(reader).map_err(|e| format!("not a zip package: {e}"))?;
    let part = main_part(&mut archive, DOCUMENT_PART);
    let xml = read_part(&mut archive, &part)?;
    parse_paragraphs(&xml)
}

fn parse_paragraphs(xml: &str) -> Result<Vec<ParagraphText>, String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<ParagraphText> = None;
    let mut depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => {
                    if depth == 0 {
                        current = Some(ParagraphText::default());
                    }
                    depth += 1;
                }
                b"t" => in_text = true,
                b"numPr" => {
                    if let Some(p) = current.as_mut() {
                        p.numbered = true;
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                let Some(p) = current.as_mut() else {
                    if e.local_name().as_ref() == b"p" {
                        paragraphs.push(ParagraphText::default());
                    }
                    continue;
                };
                match e.local_name().as_ref() {
                    b"br" | b"cr" => p.text.push('\n'),
                    b"tab" => p.text.push('\t'),
                    b"numPr" => p.numbered = true,
                    b"pStyle" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.local_name().as_ref() == b"val" {
                                let value = attr
                                    .unescape_value()
                                    .map_err(|e| format!("bad attribute: {e}"))?;
                                p.style = Some(value.into_owned());
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref t)) if in_text => {
                if let Some(p) = current.as_mut() {
                    let text = t.unescape().map_err(|e| format!("bad text: {e}"))?;
                    p.text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(p) = current.take() {
                            paragraphs.push(p);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "invalid XML at position {}: {e}",
                    reader.buffer_position()
                ))
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

// ── Template rewriting ───────────────────────────────────────────────────

/// Rewrite the paragraphs of a WordprocessingML part.
///
/// `replace` sees the concatenated `w:t` text of each outermost paragraph
/// (so tokens split across runs are still found). When it returns
/// `Some(text)` the paragraph keeps its `w:pPr` and the run properties of its
/// first run, and its content becomes a single run holding `text`. All other
/// markup passes through unchanged.
pub fn rewrite_paragraphs<F>(xml: &str, mut replace: F) -> Result<Vec<u8>, String>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut buffered: Vec<Event<'static>> = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            format!("invalid XML at position {}: {e}", reader.buffer_position())
        })?;
        let paragraph_edge = match &event {
            Event::Start(e) if e.local_name().as_ref() == b"p" => Some(true),
            Event::End(e) if e.local_name().as_ref() == b"p" => Some(false),
            _ => None,
        };

        match (paragraph_edge, event) {
            (_, Event::Eof) => break,
            (Some(true), event) => {
                depth += 1;
                buffered.push(event.into_owned());
            }
            (Some(false), event) if depth > 0 => {
                depth -= 1;
                buffered.push(event.into_owned());
                if depth == 0 {
                    let paragraph = std::mem::take(&mut buffered);
                    flush_paragraph(&mut writer, paragraph, &mut replace)?;
                }
            }
            (_, event) if depth > 0 => buffered.push(event.into_owned()),
            (_, event) => emit(&mut writer, event)?,
        }
    }

    Ok(writer.into_inner())
}

fn flush_paragraph<W, F>(
    w: &mut Writer<W>,
    events: Vec<Event<'static>>,
    replace: &mut F,
) -> Result<(), String>
where
    W: Write,
    F: FnMut(&str) -> Option<String>,
{
    let text = concatenated_text(&events)?;
    let Some(new_text) = replace(&text) else {
        for ev in events {
            emit(w, ev)?;
        }
        return Ok(());
    };

    let (Some(Event::Start(open)), Some(Event::End(close))) = (events.first(), events.last())
    else {
        return Err("unbalanced paragraph".to_string());
    };
    let name = open.name();
    let name = String::from_utf8_lossy(name.as_ref());
    let prefix = name.strip_suffix('p').unwrap_or("");

    let (ppr, rpr) = kept_properties(&events[1..events.len() - 1]);

    emit(w, Event::Start(open.clone()))?;
    for ev in ppr {
        emit(w, ev)?;
    }
    write_run(w, prefix, &rpr, &new_text)?;
    emit(w, Event::End(close.clone()))
}

/// Text of all `w:t` elements in a buffered paragraph.
fn concatenated_text(events: &[Event<'static>]) -> Result<String, String> {
    let mut text = String::new();
    let mut in_text = false;
    for ev in events {
        match ev {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) if e.local_name().as_ref() == b"t" => in_text = false,
            Event::Text(t) if in_text => {
                text.push_str(&t.unescape().map_err(|e| format!("bad text: {e}"))?);
            }
            _ => {}
        }
    }
    Ok(text)
}

/// Split out the paragraph's `pPr` and its first run's `rPr` from the
/// paragraph children (`inner` excludes the `p` start and end tags).
fn kept_properties(inner: &[Event<'static>]) -> (Vec<Event<'static>>, Vec<Event<'static>>) {
    #[derive(PartialEq)]
    enum Capture {
        None,
        Ppr,
        Rpr,
    }

    let mut ppr = Vec::new();
    let mut rpr = Vec::new();
    let mut level = 0usize;
    let mut capture = Capture::None;
    let mut seen_run = false;
    let mut in_first_run = false;

    for ev in inner {
        match ev {
            Event::Start(e) => {
                let local = e.local_name();
                if capture == Capture::None {
                    if level == 0 && local.as_ref() == b"pPr" {
                        capture = Capture::Ppr;
                    } else if level == 0 && local.as_ref() == b"r" && !seen_run {
                        seen_run = true;
                        in_first_run = true;
                    } else if level == 1 && in_first_run && local.as_ref() == b"rPr" {
                        capture = Capture::Rpr;
                    }
                }
                level += 1;
            }
            Event::End(e) => {
                level = level.saturating_sub(1);
                if level == 0 && e.local_name().as_ref() == b"r" {
                    in_first_run = false;
                }
            }
            Event::Empty(e) if capture == Capture::None => {
                let local = e.local_name();
                if level == 0 && local.as_ref() == b"pPr" {
                    ppr.push(ev.clone());
                } else if level == 1 && in_first_run && local.as_ref() == b"rPr" {
                    rpr.push(ev.clone());
                }
                continue;
            }
            _ => {}
        }

        match capture {
            Capture::Ppr => ppr.push(ev.clone()),
            Capture::Rpr => rpr.push(ev.clone()),
            Capture::None => {}
        }
        let closes = matches!(ev, Event::End(_))
            && ((capture == Capture::Ppr && level == 0)
                || (capture == Capture::Rpr && level == 1));
        if closes {
            capture = Capture::None;
        }
    }

    (ppr, rpr)
}

// ── Static parts ─────────────────────────────────────────────────────────

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Calibri" w:cs="Calibri"/><w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="480" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:color w:val="2F5496"/><w:sz w:val="32"/><w:szCs w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:color w:val="2F5496"/><w:sz w:val="26"/><w:szCs w:val="26"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/><w:pPr><w:numPr><w:numId w:val="1"/></w:numPr><w:spacing w:after="60"/><w:ind w:left="720" w:hanging="360"/></w:pPr></w:style></w:styles>"#;

const NUMBERING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:abstractNum w:abstractNumId="0"><w:multiLevelType w:val="hybridMultilevel"/><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="•"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum><w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num></w:numbering>"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.heading(1, "Pump trip")
            .heading(2, "Event Summary")
            .paragraph("The pump tripped & stopped.")
            .heading(2, "Lessons Learned")
            .bullet("Check seals")
            .bullet("Test alarms");
        doc
    }

    #[test]
    fn section_slices_until_next_heading() {
        let doc = sample();
        assert_eq!(doc.title(), Some("Pump trip"));
        assert_eq!(
            doc.section("Event Summary").unwrap(),
            &[Block::Paragraph("The pump tripped & stopped.".into())][..]
        );
        assert_eq!(doc.section("Lessons Learned").unwrap().len(), 2);
        assert!(doc.section("Missing").is_none());
    }

    #[test]
    fn written_package_reads_back() {
        let bytes = sample().to_bytes().unwrap();
        let paragraphs = paragraph_texts_from_reader(Cursor::new(bytes)).unwrap();
        let summary: Vec<(Option<&str>, bool, &str)> = paragraphs
            .iter()
            .map(|p| (p.style.as_deref(), p.numbered, p.text.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Some("Heading1"), false, "Pump trip"),
                (Some("Heading2"), false, "Event Summary"),
                (None, false, "The pump tripped & stopped."),
                (Some("Heading2"), false, "Lessons Learned"),
                (Some("ListBullet"), true, "Check seals"),
                (Some("ListBullet"), true, "Test alarms"),
            ]
        );
    }

    #[test]
    fn serialisation_is_deterministic() {
        assert_eq!(sample().to_bytes().unwrap(), sample().to_bytes().unwrap());
    }

    #[test]
    fn line_breaks_round_trip_through_runs() {
        let mut doc = Document::new();
        doc.paragraph("one\ntwo");
        let bytes = doc.to_bytes().unwrap();
        let paragraphs = paragraph_texts_from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(paragraphs[0].text, "one\ntwo");
    }

    #[test]
    fn rewrite_replaces_split_token_and_keeps_properties() {
        let xml = concat!(
            r#"<w:document xmlns:w="x"><w:body>"#,
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr>"#,
            r#"<w:r><w:rPr><w:b/></w:rPr><w:t>{{Ti</w:t></w:r><w:r><w:t>tle}}</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Keep me</w:t></w:r></w:p>"#,
            r#"</w:body></w:document>"#
        );
        let out = rewrite_paragraphs(xml, |text| {
            text.contains("{{Title}}").then(|| "Pump <trip>".to_string())
        })
        .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Pump &lt;trip&gt;</w:t></w:r></w:p>"#
        ));
        assert!(out.contains(r#"<w:p><w:r><w:t>Keep me</w:t></w:r></w:p>"#));
        assert!(!out.contains("{{Ti"));
    }

    #[test]
    fn rewrite_renders_newlines_as_breaks() {
        let xml = r#"<w:body xmlns:w="x"><w:p><w:r><w:t>{{X}}</w:t></w:r></w:p></w:body>"#;
        let out = rewrite_paragraphs(xml, |_| Some("a\nb".to_string())).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(
            r#"<w:t xml:space="preserve">a</w:t><w:br/><w:t xml:space="preserve">b</w:t>"#
        ));
    }

    #[test]
    fn rewrite_without_match_is_identity() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="x"><w:body><w:p><w:r><w:t xml:space="preserve"> a &amp; b </w:t></w:r></w:p><w:p/></w:body></w:document>"#;
        let out = rewrite_paragraphs(xml, |_| None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), xml);
    }
}
