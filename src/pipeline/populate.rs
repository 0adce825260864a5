//! Document population: turn a [`SectionMap`] into a Word document.
//!
//! Two mutually exclusive modes, selected by [`DocumentMode`]:
//!
//! - **From scratch**: [`build_document`] lays out a title heading, an
//!   "Event Summary" paragraph, and bulleted "Contributing Factors" and
//!   "Lessons Learned" lists, serialised by [`crate::docx`].
//! - **Template**: [`fill_template`] copies an existing `.docx` and swaps
//!   every paragraph holding a placeholder token for that section's text.
//!   The token → section → join table is [`PLACEHOLDERS`].
//!
//! Section lines are written as parsed: a blank line is an empty bullet or an
//! extra space, and list markers stay in the text. Tidying the reply is the
//! job of [`crate::pipeline::postprocess`]. Whatever is written goes through
//! [`write_atomic`], so a failed run leaves no partial file.

use crate::config::{DocumentMode, GenerationConfig};
use crate::docx::{rewrite_paragraphs, Document};
use crate::error::Pptx2DocxError;
use crate::ooxml::{entry_options, main_part, read_part};
use crate::pipeline::sections::SectionMap;
use serde::Serialize;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::{ZipArchive, ZipWriter};

/// How a section's lines become one piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStrategy {
    /// First line only.
    FirstLine,
    /// Lines joined by single spaces.
    Spaces,
    /// Lines joined by newlines (rendered as line breaks).
    Lines,
}

impl JoinStrategy {
    pub fn apply(self, lines: &[String]) -> String {
        match self {
            JoinStrategy::FirstLine => lines.first().cloned().unwrap_or_default(),
            JoinStrategy::Spaces => lines.join(" "),
            JoinStrategy::Lines => lines.join("\n"),
        }
    }
}

/// One template token and where its replacement comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    pub token: &'static str,
    pub section: &'static str,
    pub join: JoinStrategy,
}

/// Template tokens in precedence order: a paragraph holding several tokens
/// is replaced by the first one listed here.
pub const PLACEHOLDERS: [Placeholder; 4] = [
    Placeholder {
        token: "{{Title}}",
        section: "Title",
        join: JoinStrategy::FirstLine,
    },
    Placeholder {
        token: "{{Event_Summary}}",
        section: "Event Summary",
        join: JoinStrategy::Spaces,
    },
    Placeholder {
        token: "{{Contributing_Factors}}",
        section: "Contributing Factors",
        join: JoinStrategy::Lines,
    },
    Placeholder {
        token: "{{Lessons_Learned}}",
        section: "Lessons Learned",
        join: JoinStrategy::Lines,
    },
];

/// What template mode did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateReport {
    /// Tokens that matched at least one paragraph, in table order.
    pub replaced: Vec<String>,
    /// Tokens that matched no paragraph, in table order.
    pub missing: Vec<String>,
    /// Number of paragraphs rewritten.
    pub paragraphs_replaced: usize,
}

/// Result of [`populate`].
#[derive(Debug, Clone)]
pub struct Populated {
    pub path: PathBuf,
    pub bytes: u64,
    /// `Some` in template mode.
    pub template: Option<TemplateReport>,
}

// ── From scratch ─────────────────────────────────────────────────────────

/// Lay out a fresh Lessons Learned document.
///
/// The heading is the first line of `Title`, or `default_title` when that
/// section is absent or has no lines. Missing sections give an empty summary
/// paragraph or an empty list. Every list line becomes one bullet.
pub fn build_document(sections: &SectionMap, default_title: &str) -> Document {
    let title = sections
        .first_line("Title")
        .unwrap_or(default_title)
        .to_string();

    let mut doc = Document::new();
    doc.heading(1, title);

    doc.heading(2, "Event Summary");
    doc.paragraph(JoinStrategy::Spaces.apply(sections.get_or("Event Summary", &[])));

    for name in ["Contributing Factors", "Lessons Learned"] {
        doc.heading(2, name);
        for item in sections.get_or(name, &[]) {
            doc.bullet(item.as_str());
        }
    }

    doc
}

// ── Template ─────────────────────────────────────────────────────────────

/// The replacement text for a paragraph, if it holds a known token.
fn replacement_for(text: &str, sections: &SectionMap) -> Option<(&'static str, String)> {
    PLACEHOLDERS
        .iter()
        .find(|p| text.contains(p.token))
        .map(|p| (p.token, p.join.apply(sections.get_or(p.section, &[]))))
}

/// Fill the template package held in `template`, returning the new package.
///
/// Only the main document part is rewritten; every other entry is copied
/// byte-for-byte. `Err` carries a human-readable reason.
pub fn fill_template_bytes(
    template: &[u8],
    sections: &SectionMap,
) -> Result<(Vec<u8>, TemplateReport), String> {
    let mut archive =
        ZipArchive::new(Cursor::new(template)).map_err(|e| format!("not a DOCX package: {e}"))?;
    let part = main_part(&mut archive, crate::docx::DOCUMENT_PART);
    let xml = read_part(&mut archive, &part)?;

    let mut hits: Vec<&'static str> = Vec::new();
    let mut paragraphs_replaced = 0usize;
    let rewritten = rewrite_paragraphs(&xml, |text| {
        let (token, value) = replacement_for(text, sections)?;
        debug!("Replacing {} ({} chars)", token, value.len());
        if !hits.contains(&token) {
            hits.push(token);
        }
        paragraphs_replaced += 1;
        Some(value)
    })?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for i in 0..archive.len() {
        let entry = archive
            .by_index_raw(i)
            .map_err(|e| format!("zip entry {i}: {e}"))?;
        if entry.name() == part {
            drop(entry);
            zip.start_file(part.as_str(), entry_options())
                .map_err(|e| format!("zip entry {part}: {e}"))?;
            zip.write_all(&rewritten)
                .map_err(|e| format!("zip write {part}: {e}"))?;
        } else {
            zip.raw_copy_file(entry)
                .map_err(|e| format!("zip copy: {e}"))?;
        }
    }
    let bytes = zip
        .finish()
        .map_err(|e| format!("zip finish: {e}"))?
        .into_inner();

    let (replaced, missing): (Vec<_>, Vec<_>) = PLACEHOLDERS
        .iter()
        .map(|p| p.token)
        .partition(|token| hits.contains(token));

    Ok((
        bytes,
        TemplateReport {
            replaced: replaced.into_iter().map(String::from).collect(),
            missing: missing.into_iter().map(String::from).collect(),
            paragraphs_replaced,
        },
    ))
}

/// Read `template`, fill it from `sections`, and write the result to `output`.
pub async fn fill_template(
    template: &Path,
    sections: &SectionMap,
    output: &Path,
) -> Result<(u64, TemplateReport), Pptx2DocxError> {
    let data = tokio::fs::read(template).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Pptx2DocxError::TemplateNotFound {
            path: template.to_path_buf(),
        },
        _ => Pptx2DocxError::CorruptTemplate {
            path: template.to_path_buf(),
            detail: e.to_string(),
        },
    })?;

    let owned = sections.clone();
    let (bytes, report) = tokio::task::spawn_blocking(move || fill_template_bytes(&data, &owned))
        .await
        .map_err(|e| Pptx2DocxError::Internal(format!("template task panicked: {e}")))?
        .map_err(|detail| Pptx2DocxError::CorruptTemplate {
            path: template.to_path_buf(),
            detail,
        })?;

    for token in &report.missing {
        warn!(
            "Template '{}' has no paragraph containing {}",
            template.display(),
            token
        );
    }

    write_atomic(output, &bytes).await?;
    Ok((bytes.len() as u64, report))
}

// ── Entry point ──────────────────────────────────────────────────────────

/// Write the document for `sections` to `output` in the configured mode.
pub async fn populate(
    sections: &SectionMap,
    config: &GenerationConfig,
    output: &Path,
) -> Result<Populated, Pptx2DocxError> {
    match &config.mode {
        DocumentMode::FromScratch => {
            let doc = build_document(sections, &config.default_title);
            let bytes = doc.to_bytes().map_err(Pptx2DocxError::Internal)?;
            write_atomic(output, &bytes).await?;
            info!(
                "Wrote document '{}' ({} blocks, {} bytes)",
                output.display(),
                doc.blocks().len(),
                bytes.len()
            );
            Ok(Populated {
                path: output.to_path_buf(),
                bytes: bytes.len() as u64,
                template: None,
            })
        }
        DocumentMode::Template(template) => {
            let (bytes, report) = fill_template(template, sections, output).await?;
            info!(
                "Filled template '{}' → '{}' ({} paragraphs replaced)",
                template.display(),
                output.display(),
                report.paragraphs_replaced
            );
            Ok(Populated {
                path: output.to_path_buf(),
                bytes,
                template: Some(report),
            })
        }
    }
}

/// Atomic write: temp file next to `path`, then rename over it.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Pptx2DocxError> {
    let fail = |source| Pptx2DocxError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let tmp_path = path.with_extension("docx.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::Block;

    fn map(pairs: &[(&str, Vec<&str>)]) -> SectionMap {
        let mut m = SectionMap::new();
        for (name, lines) in pairs {
            m.insert(*name, lines.iter().map(|s| s.to_string()).collect());
        }
        m
    }

    #[test]
    fn join_strategies_keep_every_line() {
        let lines: Vec<String> = ["a", "", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(JoinStrategy::FirstLine.apply(&lines), "a");
        assert_eq!(JoinStrategy::Spaces.apply(&lines), "a  b");
        assert_eq!(JoinStrategy::Lines.apply(&lines), "a\n\nb");
        assert_eq!(JoinStrategy::FirstLine.apply(&[]), "");
        assert_eq!(JoinStrategy::Lines.apply(&[]), "");
    }

    #[test]
    fn from_scratch_with_partial_sections() {
        let sections = map(&[("Title", vec!["X"]), ("Contributing Factors", vec!["a", "b"])]);
        let doc = build_document(&sections, "Lessons Learned");
        assert_eq!(doc.title(), Some("X"));
        assert_eq!(
            doc.section("Event Summary").unwrap(),
            &[Block::Paragraph(String::new())][..]
        );
        assert_eq!(
            doc.section("Contributing Factors").unwrap(),
            &[Block::Bullet("a".into()), Block::Bullet("b".into())][..]
        );
        assert!(doc.section("Lessons Learned").unwrap().is_empty());
    }

    #[test]
    fn missing_title_uses_default() {
        let doc = build_document(&SectionMap::new(), "Lessons Learned");
        assert_eq!(doc.title(), Some("Lessons Learned"));
        let doc = build_document(&map(&[("Title", vec![])]), "Fallback");
        assert_eq!(doc.title(), Some("Fallback"));
        // A present but blank first line is still the title.
        let doc = build_document(&map(&[("Title", vec!["", "Pump trip"])]), "Fallback");
        assert_eq!(doc.title(), Some(""));
    }

    #[test]
    fn list_lines_become_bullets_verbatim() {
        let sections = map(&[("Lessons Learned", vec!["- one", "", "two"])]);
        let doc = build_document(&sections, "T");
        assert_eq!(
            doc.section("Lessons Learned").unwrap(),
            &[
                Block::Bullet("- one".into()),
                Block::Bullet(String::new()),
                Block::Bullet("two".into()),
            ][..]
        );
    }

    #[test]
    fn summary_lines_are_space_joined() {
        let sections = map(&[("Event Summary", vec!["A", "", "B"])]);
        let doc = build_document(&sections, "T");
        assert_eq!(
            doc.section("Event Summary").unwrap(),
            &[Block::Paragraph("A  B".into())][..]
        );
    }

    #[test]
    fn template_values_keep_blank_lines_and_markers() {
        let sections = map(&[("Contributing Factors", vec!["- a", "", "- b"])]);
        let hit = replacement_for("{{Contributing_Factors}}", &sections);
        assert_eq!(
            hit,
            Some(("{{Contributing_Factors}}", "- a\n\n- b".to_string()))
        );
    }

    #[test]
    fn first_token_in_table_order_wins() {
        let sections = map(&[("Title", vec!["T"]), ("Lessons Learned", vec!["L"])]);
        let hit = replacement_for("{{Lessons_Learned}} and {{Title}}", &sections);
        assert_eq!(hit, Some(("{{Title}}", "T".to_string())));
        assert_eq!(replacement_for("plain text", &sections), None);
    }

    #[test]
    fn absent_section_replaces_with_empty_text() {
        let hit = replacement_for("{{Event_Summary}}", &SectionMap::new());
        assert_eq!(hit, Some(("{{Event_Summary}}", String::new())));
    }

    #[tokio::test]
    async fn write_atomic_creates_parents_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.docx");
        write_atomic(&path, b"data").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"data");
        assert!(!path.with_extension("docx.tmp").exists());
    }

    #[tokio::test]
    async fn missing_template_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = fill_template(
            &dir.path().join("nope.docx"),
            &SectionMap::new(),
            &dir.path().join("out.docx"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Pptx2DocxError::TemplateNotFound { .. }));
    }
}
