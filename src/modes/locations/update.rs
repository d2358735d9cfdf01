//! Location history mutations.
//!
//! Every operation edits a copy of the history, re-validates it and only then
//! replaces the caller's set. A rejected change leaves the input untouched.

use crate::modes::locations::error::UpdateError;
use crate::modes::locations::model::{
    LocationKind, LocationRecord, ObjectLocationSet, PartialDate, RecordDate, comparable,
};
use crate::modes::locations::validate::validate;

/// How a new current location is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateMode {
    /// Demote the current location to a previous one and add a new current.
    #[default]
    Insert,
    /// Overwrite the current location in place.
    Patch,
    /// Insert, using the object's normal location as the target.
    MoveToNormal,
}

/// A request to change an object's current location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUpdate {
    pub text: String,
    pub as_of: PartialDate,
    pub mode: UpdateMode,
    /// Reason supplied for the whole run.
    pub reason: Option<String>,
    /// Reason supplied for this object only.
    pub row_reason: Option<String>,
    /// Report a mutation even when the location is unchanged.
    pub force: bool,
    /// Drop all earlier previous locations after an insert.
    pub reset_current: bool,
    pub strict: bool,
}

impl CurrentUpdate {
    pub fn new(text: impl Into<String>, as_of: PartialDate) -> Self {
        Self {
            text: text.into(),
            as_of,
            mode: UpdateMode::Insert,
            reason: None,
            row_reason: None,
            force: false,
            reset_current: false,
            strict: true,
        }
    }

    pub fn mode(mut self, mode: UpdateMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn row_reason(mut self, reason: Option<String>) -> Self {
        self.row_reason = reason;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn reset_current(mut self, reset: bool) -> Self {
        self.reset_current = reset;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn supplied_reason(&self) -> Option<String> {
        self.row_reason.clone().or_else(|| self.reason.clone())
    }
}

/// Replaces the normal location text. Returns whether anything changed.
pub fn update_normal(
    set: &mut ObjectLocationSet,
    object: &str,
    new_text: &str,
    strict: bool,
) -> Result<bool, UpdateError> {
    let index = set
        .position(&LocationKind::Normal)
        .ok_or_else(|| UpdateError::NoNormalLocation(object.to_string()))?;
    if comparable(new_text).is_empty() {
        return Err(UpdateError::EmptyLocation(object.to_string()));
    }
    if set.records[index].same_location(new_text) {
        return Ok(false);
    }

    let mut working = set.clone();
    working.records[index].text = Some(comparable(new_text));
    commit(set, working, object, strict)?;
    Ok(true)
}

/// Moves the object to `request.text` as of `request.as_of`.
///
/// Returns `Ok(false)` when the object is already there, unless
/// `request.force` is set.
pub fn update_current(
    set: &mut ObjectLocationSet,
    object: &str,
    request: &CurrentUpdate,
) -> Result<bool, UpdateError> {
    let index = set
        .position(&LocationKind::Current)
        .ok_or_else(|| UpdateError::NoCurrentLocation(object.to_string()))?;
    let target = match request.mode {
        UpdateMode::MoveToNormal => set
            .normal()
            .and_then(|record| record.text.clone())
            .ok_or_else(|| UpdateError::NoNormalLocation(object.to_string()))?,
        UpdateMode::Insert | UpdateMode::Patch => request.text.clone(),
    };
    // An empty current location marks an unplaced object; never write one.
    if comparable(&target).is_empty() {
        return Err(UpdateError::EmptyLocation(object.to_string()));
    }
    let mut working = set.clone();

    if working.records[index].is_placeholder() {
        let record = &mut working.records[index];
        record.text = Some(comparable(&target));
        record.date_begin = Some(RecordDate::Valid(request.as_of));
        commit(set, working, object, request.strict)?;
        return Ok(true);
    }

    if working.records[index].same_location(&target) {
        return Ok(request.force);
    }

    match request.mode {
        UpdateMode::Patch => {
            let record = &mut working.records[index];
            record.text = Some(comparable(&target));
            record.date_begin = Some(RecordDate::Valid(request.as_of));
            record.reason = patched_reason(record.reason.take(), request);
        }
        UpdateMode::Insert | UpdateMode::MoveToNormal => {
            let former = &mut working.records[index];
            former.kind = LocationKind::Previous;
            former.date_end = Some(RecordDate::Valid(request.as_of));

            let mut fresh = LocationRecord::current(comparable(&target), request.as_of);
            fresh.reason = request.supplied_reason();
            working.records.insert(index, fresh);

            if request.reset_current {
                let demoted = index + 1;
                working.records = working
                    .records
                    .into_iter()
                    .enumerate()
                    .filter(|(position, record)| {
                        *position == demoted || record.kind != LocationKind::Previous
                    })
                    .map(|(_, record)| record)
                    .collect();
            }
        }
    }

    commit(set, working, object, request.strict)?;
    Ok(true)
}

/// Adding an arbitrary historical location has no defined semantics.
pub fn update_previous(
    _set: &mut ObjectLocationSet,
    _object: &str,
    _new_text: &str,
    _as_of: PartialDate,
) -> Result<bool, UpdateError> {
    Err(UpdateError::Unsupported("adding a previous location"))
}

fn patched_reason(existing: Option<String>, request: &CurrentUpdate) -> Option<String> {
    match (&existing, &request.reason, &request.row_reason) {
        (Some(old), Some(_), Some(_)) => Some(format!("{old} (Patched)")),
        _ => request.supplied_reason().or(existing),
    }
}

fn commit(
    set: &mut ObjectLocationSet,
    working: ObjectLocationSet,
    object: &str,
    strict: bool,
) -> Result<(), UpdateError> {
    validate(object, &working, strict)?;
    *set = working;
    Ok(())
}
