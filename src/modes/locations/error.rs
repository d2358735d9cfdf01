use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned by the batch driver and I/O layers.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Raised when an accession number cannot be brought into canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The identifier was empty or whitespace only.
    #[error("empty identifier")]
    EmptyInput,

    /// A coded identifier did not split into three or four fields.
    #[error("identifier '{raw}' has {count} fields, expected 3 or 4")]
    BadFieldCount { raw: String, count: usize },

    /// A numeric field is longer than the canonical width.
    #[error("identifier '{raw}' has a field longer than {width} digits")]
    FieldTooLong { raw: String, width: usize },

    /// The identifier matches neither the coded nor the short family.
    #[error("identifier '{0}' has an unsupported format")]
    UnsupportedFormat(String),

    /// A `start-end` range could not be expanded.
    #[error("invalid identifier range '{0}'")]
    BadRange(String),
}

/// Raised when a Modes date string is not of the form `d.m.yyyy`, `m.yyyy` or `yyyy`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("empty date")]
    Empty,

    #[error("date '{0}' must have one to three fields")]
    BadFieldCount(String),

    #[error("date '{0}' contains a non-numeric field")]
    NotNumeric(String),

    #[error("date '{0}' is out of range")]
    OutOfRange(String),
}

/// The rule a location history broke. Several rules share a code number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    MissingCurrentDateBegin,
    InvalidCurrentDateBegin,
    CurrentHasDateEnd,
    InvalidPreviousDateBegin,
    MissingPreviousDateEnd,
    InvalidPreviousDateEnd,
    UnexpectedKind(String),
    WrongNormalCount(usize),
    CurrentNotYoungest,
    WrongCurrentCount(usize),
    EndBeforeBegin,
    MissingLocationElement,
    GapOrOverlap,
    Overlap,
}

impl Violation {
    /// Stable code reported to operators.
    pub fn code(&self) -> &'static str {
        match self {
            Violation::MissingCurrentDateBegin => "E01",
            Violation::InvalidCurrentDateBegin => "E02",
            Violation::CurrentHasDateEnd => "E03",
            Violation::InvalidPreviousDateBegin => "E04",
            Violation::MissingPreviousDateEnd => "E05",
            Violation::InvalidPreviousDateEnd => "E06",
            Violation::UnexpectedKind(_) => "E07",
            Violation::WrongNormalCount(_) | Violation::CurrentNotYoungest => "E08",
            Violation::WrongCurrentCount(_) | Violation::EndBeforeBegin => "E09",
            Violation::MissingLocationElement | Violation::GapOrOverlap => "E10",
            Violation::Overlap => "E11",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingCurrentDateBegin => write!(f, "current location has no begin date"),
            Violation::InvalidCurrentDateBegin => {
                write!(f, "current location has an invalid begin date")
            }
            Violation::CurrentHasDateEnd => write!(f, "current location has an end date"),
            Violation::InvalidPreviousDateBegin => {
                write!(f, "previous location has a missing or invalid begin date")
            }
            Violation::MissingPreviousDateEnd => write!(f, "previous location has no end date"),
            Violation::InvalidPreviousDateEnd => {
                write!(f, "previous location has an invalid end date")
            }
            Violation::UnexpectedKind(tag) => write!(f, "unexpected location type '{tag}'"),
            Violation::WrongNormalCount(count) => {
                write!(f, "expected one normal location, found {count}")
            }
            Violation::CurrentNotYoungest => {
                write!(f, "current location is not the most recent location")
            }
            Violation::WrongCurrentCount(count) => {
                write!(f, "expected one current location, found {count}")
            }
            Violation::EndBeforeBegin => write!(f, "previous location ends before it begins"),
            Violation::MissingLocationElement => {
                write!(f, "current location has no Location element")
            }
            Violation::GapOrOverlap => {
                write!(f, "location dates do not abut the next location")
            }
            Violation::Overlap => write!(f, "location dates overlap the next location"),
        }
    }
}

/// A location history that breaks one of the structural or temporal rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} {object}: {violation}{}", .violation.code(), format_trace(.trace))]
pub struct ValidationError {
    /// Display identifier of the offending object.
    pub object: String,
    pub violation: Violation,
    /// The dates involved, youngest first.
    pub trace: String,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        self.violation.code()
    }
}

fn format_trace(trace: &str) -> String {
    if trace.is_empty() {
        String::new()
    } else {
        format!(" [{trace}]")
    }
}

/// Failures of the location updater.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    /// The operation exists but has no defined behaviour.
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    #[error("{0}: no normal location to update")]
    NoNormalLocation(String),

    #[error("{0}: no current location to update")]
    NoCurrentLocation(String),

    /// The requested location text is blank.
    #[error("{0}: requested location is empty")]
    EmptyLocation(String),

    /// The mutation would have produced an invalid history and was discarded.
    #[error("update rejected: {0}")]
    Rejected(#[from] ValidationError),
}

/// Error type covering every failure the command line driver can report.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the JSON configuration file cannot be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the Modes XML source is not well formed.
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Raised when a CSV directive file cannot be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Identifier(#[from] ParseError),

    #[error(transparent)]
    Date(#[from] DateError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when a directive file does not follow the expected conventions.
    #[error("invalid directive file: {0}")]
    InvalidDirectives(String),

    /// Raised when two directive rows target the same object.
    #[error("more than one directive for object {0}")]
    DuplicateDirective(String),

    /// Raised when an object record lacks a required element.
    #[error("invalid Modes document: {0}")]
    InvalidDocument(String),

    /// Raised by the validate command when any object failed.
    #[error("{failures} object(s) failed validation")]
    ValidationFailed { failures: usize },

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
