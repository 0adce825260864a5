//! Section parsing: split the model reply into named sections.
//!
//! The heuristic is deliberately simple. A line whose trimmed form ends in a
//! colon opens a section named by that line without the colon; every other
//! line belongs to the section most recently opened. Lines before the first
//! header are dropped. There is no schema: whatever headers the reply contains
//! become keys, and consumers supply defaults for the ones it lacks.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered mapping from section name to its content lines.
///
/// Insertion order is the order headers first appeared in the reply.
/// Serialises as a JSON object with keys in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    entries: Vec<(String, Vec<String>)>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or re-open) `name`, clearing any previous content, and return its lines.
    ///
    /// A re-opened section keeps its original position.
    pub fn open(&mut self, name: impl Into<String>) -> &mut Vec<String> {
        let idx = self.open_index(name.into());
        &mut self.entries[idx].1
    }

    /// Insert a complete section, replacing an existing one of the same name.
    pub fn insert(&mut self, name: impl Into<String>, lines: Vec<String>) {
        *self.open(name) = lines;
    }

    /// Lines of `name`, if the reply had that section.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.position(name).map(|idx| self.entries[idx].1.as_slice())
    }

    /// Lines of `name`, or `default` when the section is absent.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a [String]) -> &'a [String] {
        self.get(name).unwrap_or(default)
    }

    /// First line of `name`, if the section exists and is non-empty.
    pub fn first_line(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|lines| lines.first()).map(String::as_str)
    }

    /// All lines of `name` joined with `sep`; empty string when absent.
    pub fn joined(&self, name: &str, sep: &str) -> String {
        self.get(name).map(|lines| lines.join(sep)).unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Section names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// `(name, lines)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, lines)| (name.as_str(), lines.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    fn open_index(&mut self, name: String) -> usize {
        match self.position(&name) {
            Some(idx) => {
                self.entries[idx].1.clear();
                idx
            }
            None => {
                self.entries.push((name, Vec::new()));
                self.entries.len() - 1
            }
        }
    }
}

impl Serialize for SectionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, lines) in &self.entries {
            map.serialize_entry(name, lines)?;
        }
        map.end()
    }
}

/// Parse a reply into a [`SectionMap`] in a single pass.
pub fn parse_sections(reply: &str) -> SectionMap {
    let mut sections = SectionMap::new();
    let mut current: Option<usize> = None;

    for line in reply.split('\n') {
        let line = line.trim();
        if let Some(name) = line.strip_suffix(':') {
            current = Some(sections.open_index(name.to_string()));
        } else if let Some(idx) = current {
            sections.entries[idx].1.push(line.to_string());
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lines_before_first_header_are_dropped() {
        let map = parse_sections("ignored\nTitle:\nReactor trip\nEvent Summary:\nBrief outage.");
        let expected: Vec<(&str, Vec<String>)> = vec![
            ("Title", lines(&["Reactor trip"])),
            ("Event Summary", lines(&["Brief outage."])),
        ];
        let actual: Vec<(&str, Vec<String>)> =
            map.iter().map(|(n, l)| (n, l.to_vec())).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn no_headers_yields_empty_map() {
        assert!(parse_sections("just prose\nand more prose").is_empty());
        assert!(parse_sections("").is_empty());
    }

    #[test]
    fn lines_are_trimmed_and_kept_verbatim() {
        let map = parse_sections("  Contributing Factors:  \n  - worn seal \n- no alarm\n");
        assert_eq!(
            map.get("Contributing Factors").unwrap(),
            &lines(&["- worn seal", "- no alarm", ""])[..]
        );
    }

    #[test]
    fn empty_header_line_is_a_section_named_empty() {
        let map = parse_sections(":\nvalue");
        assert_eq!(map.get("").unwrap(), &lines(&["value"])[..]);
    }

    #[test]
    fn repeated_header_resets_content_but_keeps_position() {
        let map = parse_sections("A:\none\nB:\ntwo\nA:\nthree");
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(map.get("A").unwrap(), &lines(&["three"])[..]);
    }

    #[test]
    fn header_with_inline_value_is_content() {
        // "Title: X" does not end in a colon, so it is an ordinary line.
        let map = parse_sections("Title: Reactor trip\nEvent Summary:\ntext");
        assert!(!map.contains("Title"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn every_line_belongs_to_nearest_header() {
        let reply = "x\nA:\n1\n2\nB:\n3\nC:\n";
        let map = parse_sections(reply);
        assert_eq!(map.get("A").unwrap(), &lines(&["1", "2"])[..]);
        assert_eq!(map.get("B").unwrap(), &lines(&["3"])[..]);
        assert_eq!(map.get("C").unwrap(), &lines(&[""])[..]);
    }

    #[test]
    fn accessors_supply_defaults() {
        let map = parse_sections("Title:\nX");
        let fallback = lines(&["Lessons Learned"]);
        assert_eq!(map.get_or("Missing", &fallback), &fallback[..]);
        assert_eq!(map.first_line("Title"), Some("X"));
        assert_eq!(map.first_line("Missing"), None);
        assert_eq!(map.joined("Missing", " "), "");
    }

    #[test]
    fn serialises_as_ordered_object() {
        let map = parse_sections("Title:\nX\nEvent Summary:\nY");
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"Title":["X"],"Event Summary":["Y"]}"#);
    }

    #[test]
    fn crlf_lines_are_trimmed() {
        let map = parse_sections("Title:\r\nPump trip\r\n");
        assert_eq!(map.first_line("Title"), Some("Pump trip"));
    }
}
