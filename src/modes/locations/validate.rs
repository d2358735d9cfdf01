//! Structural and chronological checks on an object's location history.
//!
//! A valid history has exactly one normal and one current location. Every
//! previous location is a closed interval, and sorted youngest first the
//! intervals chain back from the current location without overlapping. In
//! strict mode they must also abut exactly.
//!
//! An object whose current location text is empty has not been placed yet
//! and passes unconditionally.

use crate::modes::locations::error::{ValidationError, Violation};
use crate::modes::locations::model::{LocationKind, ObjectLocationSet, PartialDate, RecordDate};

type Interval = (PartialDate, Option<PartialDate>);

/// Checks `set` and returns the first rule it breaks.
///
/// `object` only labels the error. With `strict` unset, a gap between
/// consecutive locations is tolerated but an overlap is not.
pub fn validate(
    object: &str,
    set: &ObjectLocationSet,
    strict: bool,
) -> Result<(), ValidationError> {
    let fail = |violation: Violation, trace: String| ValidationError {
        object: object.to_string(),
        violation,
        trace,
    };

    let mut normal_count = 0;
    let mut current_count = 0;
    let mut intervals: Vec<Interval> = Vec::new();

    for record in &set.records {
        match &record.kind {
            LocationKind::Normal => normal_count += 1,
            LocationKind::Current => {
                let Some(text) = record.text.as_deref() else {
                    return Err(fail(Violation::MissingLocationElement, String::new()));
                };
                if text.trim().is_empty() {
                    return Ok(());
                }
                current_count += 1;
                let begin = match &record.date_begin {
                    None => return Err(fail(Violation::MissingCurrentDateBegin, String::new())),
                    Some(RecordDate::Invalid(raw)) => {
                        return Err(fail(Violation::InvalidCurrentDateBegin, raw.clone()));
                    }
                    Some(RecordDate::Valid(date)) => *date,
                };
                if let Some(end) = &record.date_end {
                    return Err(fail(Violation::CurrentHasDateEnd, end.to_string()));
                }
                intervals.push((begin, None));
            }
            LocationKind::Previous => {
                let begin = match &record.date_begin {
                    Some(RecordDate::Valid(date)) => *date,
                    Some(RecordDate::Invalid(raw)) => {
                        return Err(fail(Violation::InvalidPreviousDateBegin, raw.clone()));
                    }
                    None => return Err(fail(Violation::InvalidPreviousDateBegin, String::new())),
                };
                let end = match &record.date_end {
                    Some(RecordDate::Valid(date)) => *date,
                    Some(RecordDate::Invalid(raw)) => {
                        return Err(fail(Violation::InvalidPreviousDateEnd, raw.clone()));
                    }
                    None => return Err(fail(Violation::MissingPreviousDateEnd, begin.to_string())),
                };
                intervals.push((begin, Some(end)));
            }
            LocationKind::Other(tag) => {
                return Err(fail(Violation::UnexpectedKind(tag.clone()), String::new()));
            }
        }
    }

    if normal_count != 1 {
        return Err(fail(Violation::WrongNormalCount(normal_count), String::new()));
    }
    if current_count != 1 {
        return Err(fail(
            Violation::WrongCurrentCount(current_count),
            String::new(),
        ));
    }
    if intervals.len() == 1 {
        return Ok(());
    }

    // Youngest first; on equal begin dates the open interval leads.
    intervals.sort_by(|lhs, rhs| {
        rhs.0
            .cmp(&lhs.0)
            .then_with(|| lhs.1.is_some().cmp(&rhs.1.is_some()))
    });

    let trace = render_trace(&intervals);
    let (youngest_begin, youngest_end) = intervals[0];
    if youngest_end.is_some() {
        return Err(fail(Violation::CurrentNotYoungest, trace));
    }

    let mut next_begin = youngest_begin;
    for &(begin, end) in &intervals[1..] {
        let Some(end) = end else {
            return Err(fail(Violation::WrongCurrentCount(current_count), trace));
        };
        if end < begin {
            return Err(fail(Violation::EndBeforeBegin, trace));
        }
        if end != next_begin {
            if strict {
                return Err(fail(Violation::GapOrOverlap, trace));
            }
            if end > next_begin {
                return Err(fail(Violation::Overlap, trace));
            }
        }
        next_begin = begin;
    }

    Ok(())
}

fn render_trace(intervals: &[Interval]) -> String {
    intervals
        .iter()
        .map(|(begin, end)| match end {
            Some(end) => format!("{begin} - {end}"),
            None => format!("{begin} -"),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
