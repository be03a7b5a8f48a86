//! Logical zone detection.
//!
//! A document arrives as a flat list of paragraphs. The detector walks it
//! once, classifying each paragraph as empty, a chapter heading, a keyword
//! anchor or body text, and groups paragraphs into zones:
//!
//! - every chapter heading ("BAB II", "Chapter 3") is a one-paragraph zone;
//! - a keyword anchor ("Abstrak", "Daftar Pustaka", "Daftar Isi") opens a
//!   zone whose members are the non-empty paragraphs after it, up to the
//!   next chapter heading.
//!
//! Only the first anchor of each kind opens a zone, and no paragraph
//! belongs to more than one zone.

mod classifier;

use crate::model::Document;
use classifier::{Action, LineClass, State};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of logical zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Abstract,
    ChapterHeadings,
    Bibliography,
    TableOfContents,
}

impl ZoneKind {
    /// All kinds, in the order the formatter processes them.
    pub const ALL: [ZoneKind; 4] = [
        ZoneKind::Abstract,
        ZoneKind::ChapterHeadings,
        ZoneKind::Bibliography,
        ZoneKind::TableOfContents,
    ];

    /// Rule-schema key of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ZoneKind::Abstract => "abstract",
            ZoneKind::ChapterHeadings => "chapter_headings",
            ZoneKind::Bibliography => "bibliography",
            ZoneKind::TableOfContents => "table_of_contents",
        }
    }

    /// Whether zones of this kind are opened by a keyword anchor.
    pub fn is_keyword_zone(self) -> bool {
        self != ZoneKind::ChapterHeadings
    }
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone kind
    pub kind: ZoneKind,

    /// Index of the paragraph that opened the zone
    pub anchor: usize,

    /// Indices of the paragraphs the zone's rules apply to, ascending.
    /// Keyword zones exclude their anchor; a chapter heading is its own
    /// only member.
    pub members: Vec<usize>,
}

impl Zone {
    fn keyword(kind: ZoneKind, anchor: usize) -> Self {
        Self {
            kind,
            anchor,
            members: Vec::new(),
        }
    }

    fn chapter(index: usize) -> Self {
        Self {
            kind: ZoneKind::ChapterHeadings,
            anchor: index,
            members: vec![index],
        }
    }

    /// Whether `index` is the anchor or a member of this zone.
    pub fn contains(&self, index: usize) -> bool {
        self.anchor == index || self.members.binary_search(&index).is_ok()
    }

    /// Total word count of the member paragraphs.
    pub fn word_count(&self, doc: &Document) -> usize {
        self.members
            .iter()
            .filter_map(|&i| doc.paragraph(i))
            .map(|p| p.word_count())
            .sum()
    }
}

/// Zones of a document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSet {
    zones: Vec<Zone>,
}

impl ZoneSet {
    /// All zones.
    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    /// Zones of one kind.
    pub fn of_kind(&self, kind: ZoneKind) -> impl Iterator<Item = &Zone> {
        self.zones.iter().filter(move |z| z.kind == kind)
    }

    /// Whether at least one zone of `kind` was found.
    pub fn has(&self, kind: ZoneKind) -> bool {
        self.of_kind(kind).next().is_some()
    }

    /// Member paragraph indices of every zone of `kind`, ascending.
    pub fn members(&self, kind: ZoneKind) -> Vec<usize> {
        self.of_kind(kind)
            .flat_map(|z| z.members.iter().copied())
            .collect()
    }

    /// The zone containing paragraph `index`, if any.
    pub fn zone_at(&self, index: usize) -> Option<&Zone> {
        self.zones.iter().find(|z| z.contains(index))
    }

    /// Whether paragraph `index` belongs to any zone.
    pub fn contains(&self, index: usize) -> bool {
        self.zone_at(index).is_some()
    }

    /// Number of zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Check if no zone was found.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl<'a> IntoIterator for &'a ZoneSet {
    type Item = &'a Zone;
    type IntoIter = std::slice::Iter<'a, Zone>;

    fn into_iter(self) -> Self::IntoIter {
        self.zones.iter()
    }
}

/// Options for zone detection.
#[derive(Debug, Clone)]
pub struct DetectorOptions {
    /// Keyword sets per keyword kind, in classification precedence order
    keywords: Vec<(ZoneKind, Vec<String>)>,

    /// Let a new anchor close the open keyword zone
    pub split_on_anchor: bool,
}

impl DetectorOptions {
    /// Create new detector options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the keywords of a keyword zone kind. Matching is
    /// case-insensitive substring search. Ignored for chapter headings,
    /// which are recognized by pattern.
    pub fn with_keywords<I, S>(mut self, kind: ZoneKind, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.into().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if let Some(entry) = self.keywords.iter_mut().find(|(k, _)| *k == kind) {
            entry.1 = keywords;
        }
        self
    }

    /// Enable or disable closing a keyword zone at the next unseen anchor.
    pub fn with_split_on_anchor(mut self, split: bool) -> Self {
        self.split_on_anchor = split;
        self
    }

    /// Keywords of a kind (empty for chapter headings).
    pub fn keywords(&self, kind: ZoneKind) -> &[String] {
        self.keywords
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, words)| words.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for DetectorOptions {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            keywords: vec![
                (ZoneKind::Abstract, words(&["abstract", "abstrak"])),
                (
                    ZoneKind::Bibliography,
                    words(&["daftar pustaka", "bibliography", "references", "referensi"]),
                ),
                (
                    ZoneKind::TableOfContents,
                    words(&["daftar isi", "table of contents", "contents"]),
                ),
            ],
            split_on_anchor: false,
        }
    }
}

/// Zone detector.
pub struct ZoneDetector {
    options: DetectorOptions,
    chapter_regex: Regex,
}

impl ZoneDetector {
    /// Create a new detector with the given options.
    pub fn new(options: DetectorOptions) -> Self {
        Self {
            options,
            chapter_regex: Regex::new(r"(?i)^(BAB|CHAPTER)\s+[IVX0-9]+")
                .expect("chapter heading pattern is valid"),
        }
    }

    /// Detector options.
    pub fn options(&self) -> &DetectorOptions {
        &self.options
    }

    /// Whether `text` looks like a chapter heading.
    pub fn is_chapter_heading(&self, text: &str) -> bool {
        self.chapter_regex.is_match(text.trim())
    }

    /// The first keyword kind (in precedence order) whose keywords occur in `text`.
    pub fn anchor_kind(&self, text: &str) -> Option<ZoneKind> {
        let lowered = text.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }
        self.options
            .keywords
            .iter()
            .find(|(_, words)| words.iter().any(|w| lowered.contains(w.as_str())))
            .map(|(kind, _)| *kind)
    }

    /// Whether `text` marks a zone boundary: a chapter heading or any keyword.
    pub fn is_section_marker(&self, text: &str) -> bool {
        self.is_chapter_heading(text) || self.anchor_kind(text).is_some()
    }

    fn classify(&self, text: &str, seen: &[ZoneKind]) -> LineClass {
        if text.trim().is_empty() {
            return LineClass::Empty;
        }
        if self.is_chapter_heading(text) {
            return LineClass::ChapterHeading;
        }
        match self.anchor_kind(text) {
            Some(kind) if !seen.contains(&kind) => LineClass::Anchor(kind),
            _ => LineClass::Body,
        }
    }

    /// Detect the zones of a document.
    pub fn detect(&self, doc: &Document) -> ZoneSet {
        let mut zones: Vec<Zone> = Vec::new();
        let mut open: Option<Zone> = None;
        let mut seen: Vec<ZoneKind> = Vec::new();
        let mut state = State::Seeking;

        for (index, paragraph) in doc.paragraphs().iter().enumerate() {
            let class = self.classify(&paragraph.text(), &seen);
            let (next, action) = classifier::step(state, class, self.options.split_on_anchor);

            match action {
                Action::Skip => {}
                Action::Open(kind) => {
                    seen.push(kind);
                    open = Some(Zone::keyword(kind, index));
                }
                Action::Switch(kind) => {
                    zones.extend(open.take());
                    seen.push(kind);
                    open = Some(Zone::keyword(kind, index));
                }
                Action::Append => {
                    if let Some(zone) = open.as_mut() {
                        zone.members.push(index);
                    }
                }
                Action::Chapter => {
                    zones.extend(open.take());
                    zones.push(Zone::chapter(index));
                }
            }
            state = next;
        }
        zones.extend(open.take());
        zones.sort_by_key(|z| z.anchor);

        let set = ZoneSet { zones };
        for kind in ZoneKind::ALL {
            let found: Vec<&Zone> = set.of_kind(kind).collect();
            if found.is_empty() {
                log::info!("No {} zone detected", kind);
            } else {
                log::debug!(
                    "Detected {} {} zone(s) covering {} paragraph(s)",
                    found.len(),
                    kind,
                    found.iter().map(|z| z.members.len()).sum::<usize>()
                );
            }
        }
        set
    }
}

impl Default for ZoneDetector {
    fn default() -> Self {
        Self::new(DetectorOptions::default())
    }
}

/// Detect zones with the default options.
pub fn detect(doc: &Document) -> ZoneSet {
    ZoneDetector::default().detect(doc)
}

/// Check a paragraph text against the default chapter pattern and keywords.
pub fn is_section_marker(text: &str) -> bool {
    ZoneDetector::default().is_section_marker(text)
}
