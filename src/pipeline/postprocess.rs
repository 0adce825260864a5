//! Post-processing: deterministic clean-up of the model reply before parsing.
//!
//! The section parser only recognises a bare `Name:` line as a header. Models
//! asked for that format still drift from it: they wrap the answer in a code
//! fence, bold or `##` the headers, or put the title on the header line
//! (`Title: Reactor trip`). These rules bring such replies back to the
//! documented layout, then drop blank lines and list markers so the document
//! holds only the items themselves.
//!
//! Clean-up is opt-in ([`crate::config::GenerationConfig::normalise_reply`]).
//! Without it the parser sees the reply exactly as the model wrote it.
//!
//! ## Rule Order
//!
//! Fences are stripped before line endings are normalised so the fence regex
//! sees the raw reply; headers are normalised last, line by line.

use crate::prompts::REQUIRED_SECTIONS;
use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all clean-up rules to the raw reply.
///
/// Rules (applied in order):
/// 1. Strip outer markdown fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 4. Undecorate header lines (`## Title:`, `**Title:**`, `**Title**:` → `Title:`)
/// 5. Split inline headers of the required sections (`Title: X` → `Title:` + `X`)
/// 6. Drop blank lines and leading `- `, `* ` or `• ` list markers
pub fn clean_reply(input: &str) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = normalise_headers(&s);
    tidy_content_lines(&s)
}

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\r?\n(.*?)\r?\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Strip invisible Unicode ──────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rules 4 + 5: Header lines ────────────────────────────────────────────────

static RE_INLINE_HEADER: Lazy<Regex> = Lazy::new(|| {
    let names = REQUIRED_SECTIONS
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)^({names})\s*:\s*(\S.*)$")).unwrap()
});

fn normalise_headers(input: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in input.split('\n') {
        let line = undecorate_header(line).unwrap_or_else(|| line.to_string());
        match RE_INLINE_HEADER.captures(line.trim()) {
            Some(caps) => {
                out.push(format!("{}:", canonical_name(&caps[1])));
                out.push(caps[2].trim().to_string());
            }
            None => out.push(line),
        }
    }
    out.join("\n")
}

/// `## Title:`, `**Title:**`, `**Title**:`, `__Title__:` and `## Title` → `Title:`.
///
/// Decorated inline headers (`**Title:** X`) lose their emphasis so rule 5
/// can split them. Returns `None` for lines that carry no header decoration,
/// or whose undecorated form is not a header.
fn undecorate_header(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let had_hash = trimmed.starts_with('#');
    let had_emphasis = trimmed.contains("**") || trimmed.contains("__");
    if !had_hash && !had_emphasis {
        return None;
    }

    let bare = trimmed
        .trim_start_matches('#')
        .replace("**", "")
        .replace("__", "");
    let bare = bare.trim();

    if RE_INLINE_HEADER.is_match(bare) {
        return Some(bare.to_string());
    }

    if let Some(name) = bare.strip_suffix(':') {
        let name = name.trim();
        if name.is_empty() || name.contains(':') {
            return None;
        }
        return Some(format!("{}:", canonical_name(name)));
    }

    // A markdown heading without a colon is only a header for the known sections.
    if had_hash && is_required_section(bare) {
        return Some(format!("{}:", canonical_name(bare)));
    }

    None
}

// ── Rule 6: Blank lines and list markers ─────────────────────────────────────

fn tidy_content_lines(input: &str) -> String {
    input
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            ["- ", "* ", "• "]
                .iter()
                .find_map(|marker| line.strip_prefix(marker))
                .map(str::trim_start)
                .unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_required_section(name: &str) -> bool {
    REQUIRED_SECTIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(name))
}

/// Required section names in their documented spelling; others unchanged.
fn canonical_name(name: &str) -> String {
    REQUIRED_SECTIONS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(name))
        .map(|known| known.to_string())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sections::parse_sections;

    #[test]
    fn test_strip_fences() {
        let input = "```\nTitle:\nX\n```";
        assert_eq!(strip_markdown_fences(input), "Title:\nX");
        let input = "```text\nTitle:\nX\n```\n";
        assert_eq!(strip_markdown_fences(input), "Title:\nX");
    }

    #[test]
    fn test_plain_reply_unchanged() {
        let input = "Title:\nPump trip\nEvent Summary:\nThe pump tripped.";
        assert_eq!(clean_reply(input), input);
    }

    #[test]
    fn test_undecorate_headers() {
        assert_eq!(undecorate_header("## Title:").as_deref(), Some("Title:"));
        assert_eq!(undecorate_header("**Event Summary:**").as_deref(), Some("Event Summary:"));
        assert_eq!(undecorate_header("**Lessons Learned**:").as_deref(), Some("Lessons Learned:"));
        assert_eq!(undecorate_header("### contributing factors").as_deref(), Some("Contributing Factors:"));
        assert_eq!(undecorate_header("## Background").as_deref(), None);
        assert_eq!(undecorate_header("**Note:** valve was open"), None);
        assert_eq!(undecorate_header("- plain bullet"), None);
    }

    #[test]
    fn test_split_inline_title() {
        let out = clean_reply("Title: Reactor trip\nEvent Summary: Brief outage.");
        assert_eq!(out, "Title:\nReactor trip\nEvent Summary:\nBrief outage.");
    }

    #[test]
    fn test_inline_split_only_for_known_sections() {
        let out = clean_reply("Lessons Learned:\n- Root cause: seal wear");
        assert_eq!(out, "Lessons Learned:\nRoot cause: seal wear");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "Title:\u{200B}\nPump\u{FEFF} trip";
        assert_eq!(remove_invisible_chars(input), "Title:\nPump trip");
    }

    #[test]
    fn test_decorated_reply_parses_like_plain_one() {
        let decorated = "```markdown\r\n**Title:** Pump P-101 trip\r\n\r\n## Event Summary\r\nThe pump tripped.\r\n\r\n**Contributing Factors:**\r\n- Worn seal\r\n```";
        let map = parse_sections(&clean_reply(decorated));
        assert_eq!(map.first_line("Title"), Some("Pump P-101 trip"));
        assert_eq!(
            map.get("Event Summary").unwrap(),
            &["The pump tripped.".to_string()][..]
        );
        assert_eq!(map.get("Contributing Factors").unwrap(), &["Worn seal".to_string()][..]);
    }

    #[test]
    fn test_tidy_drops_blanks_and_markers() {
        let out = clean_reply("Contributing Factors:\n- a\n\n*  b\n• c\nplain\n");
        assert_eq!(out, "Contributing Factors:\na\nb\nc\nplain");
    }
}
