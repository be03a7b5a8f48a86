//! Line classification and the detector's transition table.

use super::ZoneKind;

/// What a single paragraph looks like to the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineClass {
    /// Whitespace only
    Empty,
    /// Matches the chapter heading pattern
    ChapterHeading,
    /// Contains a keyword of a kind that has not opened a zone yet
    Anchor(ZoneKind),
    /// Anything else, including anchors of an already seen kind
    Body,
}

/// Detector state between paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Seeking,
    InZone(ZoneKind),
}

/// What the detector does with the current paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    /// Not part of any zone
    Skip,
    /// Open a keyword zone anchored at this paragraph
    Open(ZoneKind),
    /// Close the open keyword zone (if any) and open another at this paragraph
    Switch(ZoneKind),
    /// Add this paragraph to the open zone
    Append,
    /// Close the open keyword zone (if any) and record a chapter heading
    Chapter,
}

/// One step of the state machine.
pub(crate) fn step(state: State, class: LineClass, split_on_anchor: bool) -> (State, Action) {
    use LineClass as L;
    use State as S;

    match (state, class) {
        (_, L::Empty) => (state, Action::Skip),
        (_, L::ChapterHeading) => (S::Seeking, Action::Chapter),

        (S::Seeking, L::Anchor(kind)) => (S::InZone(kind), Action::Open(kind)),
        (S::Seeking, L::Body) => (S::Seeking, Action::Skip),

        (S::InZone(_), L::Anchor(kind)) if split_on_anchor => (S::InZone(kind), Action::Switch(kind)),
        (S::InZone(_), L::Anchor(_) | L::Body) => (state, Action::Append),
    }
}
