pub mod date;

use std::fmt;

pub use date::{PartialDate, RecordDate};

/// Modes `elementtype` value of the home location.
pub const NORMAL_TAG: &str = "normal location";
/// Modes `elementtype` value of the current location.
pub const CURRENT_TAG: &str = "current location";
/// Modes `elementtype` value of a historical location.
pub const PREVIOUS_TAG: &str = "previous location";

/// The role a location record plays in an object's history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocationKind {
    /// Designated home location. Carries no dates.
    Normal,
    /// Where the object is now. Has a begin date and no end date.
    Current,
    /// A closed historical interval.
    Previous,
    /// Any tag Modes does not define. Kept so it can be reported.
    Other(String),
}

impl LocationKind {
    /// Parses a Modes `elementtype` attribute, ignoring case and surrounding space.
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag.trim().to_lowercase();
        match normalized.as_str() {
            NORMAL_TAG => LocationKind::Normal,
            CURRENT_TAG => LocationKind::Current,
            PREVIOUS_TAG => LocationKind::Previous,
            _ => LocationKind::Other(tag.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            LocationKind::Normal => NORMAL_TAG,
            LocationKind::Current => CURRENT_TAG,
            LocationKind::Previous => PREVIOUS_TAG,
            LocationKind::Other(tag) => tag.as_str(),
        }
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One location entry of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRecord {
    pub kind: LocationKind,
    /// Location label. `None` when the record has no `Location` element.
    pub text: Option<String>,
    pub date_begin: Option<RecordDate>,
    pub date_end: Option<RecordDate>,
    pub reason: Option<String>,
    /// Child elements the engine does not interpret, as raw XML.
    pub extras: Vec<String>,
}

impl LocationRecord {
    pub fn new(kind: LocationKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: Some(text.into()),
            date_begin: None,
            date_end: None,
            reason: None,
            extras: Vec::new(),
        }
    }

    pub fn normal(text: impl Into<String>) -> Self {
        Self::new(LocationKind::Normal, text)
    }

    pub fn current(text: impl Into<String>, begin: PartialDate) -> Self {
        Self::new(LocationKind::Current, text).with_begin(begin)
    }

    pub fn previous(text: impl Into<String>, begin: PartialDate, end: PartialDate) -> Self {
        Self::new(LocationKind::Previous, text)
            .with_begin(begin)
            .with_end(end)
    }

    pub fn with_begin(mut self, begin: impl Into<RecordDate>) -> Self {
        self.date_begin = Some(begin.into());
        self
    }

    pub fn with_end(mut self, end: impl Into<RecordDate>) -> Self {
        self.date_end = Some(end.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Location label as used for comparisons: trimmed and upper case.
    pub fn comparable_text(&self) -> String {
        self.text.as_deref().map(comparable).unwrap_or_default()
    }

    /// True when the label matches `other` ignoring case and surrounding space.
    pub fn same_location(&self, other: &str) -> bool {
        self.comparable_text() == comparable(other)
    }

    pub fn is_placeholder(&self) -> bool {
        self.text.as_deref().is_some_and(|text| text.trim().is_empty())
    }
}

/// Canonical form of a location label.
pub fn comparable(text: &str) -> String {
    text.trim().to_uppercase()
}

/// All location records of one object, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectLocationSet {
    pub records: Vec<LocationRecord>,
}

impl ObjectLocationSet {
    pub fn new(records: Vec<LocationRecord>) -> Self {
        Self { records }
    }

    pub fn position(&self, kind: &LocationKind) -> Option<usize> {
        self.records.iter().position(|record| &record.kind == kind)
    }

    pub fn normal(&self) -> Option<&LocationRecord> {
        self.records
            .iter()
            .find(|record| record.kind == LocationKind::Normal)
    }

    pub fn current(&self) -> Option<&LocationRecord> {
        self.records
            .iter()
            .find(|record| record.kind == LocationKind::Current)
    }

    pub fn previous(&self) -> impl Iterator<Item = &LocationRecord> {
        self.records
            .iter()
            .filter(|record| record.kind == LocationKind::Previous)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
