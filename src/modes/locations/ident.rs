//! Accession number handling.
//!
//! Modes identifiers come in two families: the coded form
//! `<MDA code>.<year>.<sequence>[.<sub-number>]` and the short form
//! `<letters><digits>[<letter>][.<sub-number>]`. The canonical form pads every
//! sequence and sub-number field with zeros so that plain string comparison
//! orders identifiers numerically.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::modes::locations::error::ParseError;

/// Institution prefix used when no other code is configured.
pub const DEFAULT_MDA_CODE: &str = "LDHRM";

/// Width of every padded numeric field in canonical form.
const CANONICAL_WIDTH: usize = 6;

/// Width used when redisplaying `JB` and `L` numbers.
const DISPLAY_WIDTH: usize = 3;

static SHORT_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]+)(\d+)([A-Z]?)(?:\.(\d+))?$").expect("short form regex must be valid")
});

/// An identifier in canonical, sortable form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CanonicalId(String);

impl CanonicalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts accession numbers between display and canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCodec {
    mda_code: String,
}

impl Default for IdCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MDA_CODE)
    }
}

impl IdCodec {
    pub fn new(mda_code: impl Into<String>) -> Self {
        Self {
            mda_code: mda_code.into().trim().to_uppercase(),
        }
    }

    pub fn mda_code(&self) -> &str {
        &self.mda_code
    }

    /// Parses `raw` into canonical form.
    ///
    /// In non-strict mode malformed input is returned upper-cased and
    /// unchanged, and empty input becomes an empty identifier.
    pub fn normalize(&self, raw: &str, strict: bool) -> Result<CanonicalId, ParseError> {
        let upper = raw.trim().to_uppercase();
        if upper.is_empty() {
            return if strict {
                Err(ParseError::EmptyInput)
            } else {
                Ok(CanonicalId(String::new()))
            };
        }

        match self.normalize_upper(&upper) {
            Ok(canonical) => Ok(CanonicalId(canonical)),
            Err(error) if !strict => {
                warn!(identifier = %upper, %error, "keeping malformed identifier unchanged");
                Ok(CanonicalId(upper))
            }
            Err(error) => Err(error),
        }
    }

    fn normalize_upper(&self, upper: &str) -> Result<String, ParseError> {
        let coded = if upper.starts_with(|c: char| c.is_ascii_digit()) {
            format!("{}.{upper}", self.mda_code)
        } else {
            upper.to_string()
        };

        if let Some(rest) = coded.strip_prefix(self.mda_code.as_str()) {
            return self.normalize_coded(upper, rest);
        }

        let captures = SHORT_FORM
            .captures(upper)
            .ok_or_else(|| ParseError::UnsupportedFormat(upper.to_string()))?;
        let letters = &captures[1];
        let number = pad_field(upper, &captures[2])?;
        let suffix = &captures[3];
        let mut canonical = format!("{letters}{number}{suffix}");
        if let Some(sub) = captures.get(4) {
            canonical.push('.');
            canonical.push_str(&pad_field(upper, sub.as_str())?);
        }
        Ok(canonical)
    }

    fn normalize_coded(&self, raw: &str, rest: &str) -> Result<String, ParseError> {
        let rest = match rest.strip_prefix(':') {
            Some(after_colon) => format!(".{after_colon}"),
            None => rest.to_string(),
        };
        let fields: Vec<&str> = rest.split(['.', '/']).skip(1).collect();
        if !rest.starts_with(['.', '/']) || !(2..=3).contains(&fields.len()) {
            return Err(ParseError::BadFieldCount {
                raw: raw.to_string(),
                count: fields.len() + 1,
            });
        }

        let mut canonical = vec![self.mda_code.clone()];
        for (index, field) in fields.iter().enumerate() {
            check_numeric(raw, field)?;
            if index == 0 {
                canonical.push((*field).to_string());
            } else {
                canonical.push(pad_field(raw, field)?);
            }
        }
        Ok(canonical.join("."))
    }

    /// Strips the zero padding from a canonical identifier for display.
    ///
    /// `JB` and `L` numbers keep three digits. Strings that are not in
    /// canonical form are returned unchanged.
    pub fn denormalize(&self, canonical: &str) -> String {
        if let Some(rest) = canonical.strip_prefix(self.mda_code.as_str()) {
            if let Some(fields) = rest.strip_prefix('.') {
                let mut parts = vec![self.mda_code.clone()];
                parts.extend(fields.split('.').map(strip_zeros));
                return parts.join(".");
            }
            return canonical.to_string();
        }

        let Some(captures) = SHORT_FORM.captures(canonical) else {
            return canonical.to_string();
        };
        let letters = &captures[1];
        let digits = &captures[2];
        let number = if letters == "JB" || letters == "L" {
            let stripped = strip_zeros(digits);
            format!("{stripped:0>width$}", width = DISPLAY_WIDTH)
        } else {
            strip_zeros(digits)
        };
        let mut display = format!("{letters}{number}{}", &captures[3]);
        if let Some(sub) = captures.get(4) {
            display.push('.');
            display.push_str(&strip_zeros(sub.as_str()));
        }
        display
    }

    /// Splits the trailing sub-number off an identifier without touching padding.
    pub fn split_subid(&self, id: &str) -> (String, Option<u32>) {
        let has_code = id
            .strip_prefix(self.mda_code.as_str())
            .is_some_and(|rest| rest.starts_with('.'));
        let separators = id.matches('.').count();
        let has_sub = if has_code {
            separators == 3
        } else {
            separators == 1
        };
        if !has_sub {
            return (id.to_string(), None);
        }

        match id.rsplit_once('.') {
            Some((main, sub)) => match sub.parse::<u32>() {
                Ok(number) => (main.to_string(), Some(number)),
                Err(_) => (id.to_string(), None),
            },
            None => (id.to_string(), None),
        }
    }

    /// Expands `JB021-024` into `JB021`, `JB022`, `JB023`, `JB024`.
    ///
    /// The width of the start number pads every generated value. Input
    /// without a `-` yields itself.
    pub fn expand_range(&self, raw: &str) -> Result<Vec<String>, ParseError> {
        let trimmed = raw.trim();
        let Some((start, end)) = trimmed.split_once('-') else {
            return Ok(vec![trimmed.to_string()]);
        };
        let (start, end) = (start.trim(), end.trim());

        let digits_at = start
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(index, _)| index)
            .ok_or_else(|| ParseError::BadRange(trimmed.to_string()))?;
        let (prefix, first) = start.split_at(digits_at);
        let width = first.len();

        if end.is_empty() || !end.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseError::BadRange(trimmed.to_string()));
        }
        // No valid accession number has a longer sequence field.
        if width > CANONICAL_WIDTH || end.len() > CANONICAL_WIDTH {
            return Err(ParseError::BadRange(trimmed.to_string()));
        }
        let first: u64 = first
            .parse()
            .map_err(|_| ParseError::BadRange(trimmed.to_string()))?;
        let last: u64 = end
            .parse()
            .map_err(|_| ParseError::BadRange(trimmed.to_string()))?;
        if last < first {
            return Err(ParseError::BadRange(trimmed.to_string()));
        }

        Ok((first..=last)
            .map(|number| format!("{prefix}{number:0>width$}"))
            .collect())
    }
}

fn check_numeric(raw: &str, field: &str) -> Result<(), ParseError> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::UnsupportedFormat(raw.to_string()));
    }
    if field.len() > CANONICAL_WIDTH {
        return Err(ParseError::FieldTooLong {
            raw: raw.to_string(),
            width: CANONICAL_WIDTH,
        });
    }
    Ok(())
}

fn pad_field(raw: &str, field: &str) -> Result<String, ParseError> {
    check_numeric(raw, field)?;
    Ok(format!("{field:0>width$}", width = CANONICAL_WIDTH))
}

fn strip_zeros(field: &str) -> String {
    let stripped = field.trim_start_matches('0');
    if stripped.is_empty() && !field.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}
