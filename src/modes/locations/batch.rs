use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::modes::locations::config::Config;
use crate::modes::locations::error::{Result, ToolError};
use crate::modes::locations::ident::{CanonicalId, IdCodec};
use crate::modes::locations::io::directives::{LocationDirective, PendingUpdates};
use crate::modes::locations::io::modes_xml::{self, Edit, ObjectRecord};
use crate::modes::locations::io::report::ReportTable;
use crate::modes::locations::model::{LocationRecord, PartialDate};
use crate::modes::locations::update::{
    CurrentUpdate, UpdateMode, update_current, update_normal, update_previous,
};
use crate::modes::locations::validate::validate;

/// Which location kinds a command looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Targets {
    pub normal: bool,
    pub current: bool,
    pub previous: bool,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            normal: false,
            current: true,
            previous: false,
        }
    }
}

/// Settings of one update run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOptions {
    pub targets: Targets,
    pub mode: UpdateMode,
    pub force: bool,
    pub reset_current: bool,
    /// Date used for objects whose directive carries none.
    pub as_of: PartialDate,
    pub reason: Option<String>,
    /// Stop after the first object that had a directive.
    pub single: bool,
}

impl UpdateOptions {
    pub fn new(as_of: PartialDate) -> Self {
        Self {
            targets: Targets::default(),
            mode: UpdateMode::Insert,
            force: false,
            reset_current: false,
            as_of,
            reason: None,
            single: false,
        }
    }
}

/// One object that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub object: String,
    pub code: String,
    pub message: String,
}

/// Outcome of validating a whole export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub checked: usize,
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fails with [`ToolError::ValidationFailed`] when any object failed.
    pub fn ensure_clean(&self) -> Result<()> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(ToolError::ValidationFailed {
                failures: self.failures.len(),
            })
        }
    }
}

/// A recorded location that differs from the requested one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRow {
    pub object: String,
    pub kind: String,
    pub recorded: String,
    pub requested: String,
}

/// Outcome of an update run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    pub objects: usize,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    /// Directives that matched no object.
    pub unmatched: Vec<String>,
    /// Directives left unprocessed because the run stopped early.
    pub skipped: Vec<String>,
}

/// Validates every object of a Modes export.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn validate_file(input: &Path, config: &Config) -> Result<ValidationReport> {
    let source = read_source(input)?;
    let report = validate_source(&source, config)?;
    info!(
        checked = report.checked,
        failures = report.failures.len(),
        "validation finished"
    );
    Ok(report)
}

pub fn validate_source(source: &str, config: &Config) -> Result<ValidationReport> {
    let objects = modes_xml::read_objects(source, config)?;
    let mut report = ValidationReport {
        checked: objects.len(),
        failures: Vec::new(),
    };
    for object in &objects {
        if let Err(error) = validate(&object.id, &object.locations, config.strict_dates) {
            debug!(object = %object.id, code = error.code(), "validation failed");
            report.failures.push(ValidationFailure {
                object: object.id.clone(),
                code: error.code().to_string(),
                message: error.to_string(),
            });
        }
    }
    Ok(report)
}

/// Expands and normalizes identifiers given on the command line.
pub fn selection_from_ids(
    raw: &[String],
    codec: &IdCodec,
    strict: bool,
) -> Result<BTreeSet<CanonicalId>> {
    let mut selection = BTreeSet::new();
    for entry in raw {
        for id in codec.expand_range(entry)? {
            selection.insert(codec.normalize(&id, strict)?);
        }
    }
    Ok(selection)
}

/// Writes a copy of the export containing only the selected objects.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn select_file(
    input: &Path,
    output: &Path,
    selection: &BTreeSet<CanonicalId>,
    config: &Config,
) -> Result<usize> {
    let source = read_source(input)?;
    let (selected, kept) = select_source(&source, selection, config)?;
    fs::write(output, selected)?;
    info!(kept, requested = selection.len(), "selection written");
    Ok(kept)
}

pub fn select_source(
    source: &str,
    selection: &BTreeSet<CanonicalId>,
    config: &Config,
) -> Result<(String, usize)> {
    let codec = config.codec();
    let objects = modes_xml::read_objects(source, config)?;
    let mut edits = Vec::new();
    let mut kept = 0;
    for object in &objects {
        let key = codec.normalize(&object.id, config.strict_ids)?;
        if selection.contains(&key) {
            kept += 1;
        } else {
            edits.push(object.removal_edit(source));
        }
    }
    Ok((modes_xml::apply_edits(source, edits)?, kept))
}

/// Lists objects whose recorded location differs from the requested one.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn diff_file(
    input: &Path,
    pending: &PendingUpdates,
    targets: Targets,
    config: &Config,
) -> Result<Vec<DiffRow>> {
    let source = read_source(input)?;
    let rows = diff_source(&source, pending, targets, config)?;
    info!(differences = rows.len(), "diff finished");
    Ok(rows)
}

pub fn diff_source(
    source: &str,
    pending: &PendingUpdates,
    targets: Targets,
    config: &Config,
) -> Result<Vec<DiffRow>> {
    let codec = config.codec();
    let mut rows = Vec::new();
    for object in modes_xml::read_objects(source, config)? {
        let key = codec.normalize(&object.id, config.strict_ids)?;
        let Some(directive) = pending.get(&key) else {
            continue;
        };
        if targets.normal {
            push_difference(&mut rows, &object, object.locations.normal(), directive);
        }
        if targets.current {
            push_difference(&mut rows, &object, object.locations.current(), directive);
        }
    }
    Ok(rows)
}

fn push_difference(
    rows: &mut Vec<DiffRow>,
    object: &ObjectRecord,
    record: Option<&LocationRecord>,
    directive: &LocationDirective,
) {
    let Some(record) = record else {
        return;
    };
    if record.same_location(&directive.location) {
        return;
    }
    rows.push(DiffRow {
        object: object.id.clone(),
        kind: record.kind.to_string(),
        recorded: record.text.clone().unwrap_or_default(),
        requested: directive.location.clone(),
    });
}

/// Lays the diff out as a report sheet.
pub fn diff_table(rows: &[DiffRow]) -> ReportTable {
    ReportTable {
        sheet_name: "Differences".to_string(),
        columns: ["Object", "Kind", "Recorded", "Requested"]
            .into_iter()
            .map(String::from)
            .collect(),
        rows: rows
            .iter()
            .map(|row| {
                vec![
                    row.object.clone(),
                    row.kind.clone(),
                    row.recorded.clone(),
                    row.requested.clone(),
                ]
            })
            .collect(),
    }
}

/// Applies pending directives to an export and writes the result.
///
/// Nothing is written when any object fails validation before or after its
/// update.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn update_file(
    input: &Path,
    output: &Path,
    pending: &mut PendingUpdates,
    options: &UpdateOptions,
    config: &Config,
) -> Result<UpdateSummary> {
    let source = read_source(input)?;
    let (updated, summary) = update_source(&source, pending, options, config)?;
    fs::write(output, updated)?;
    info!(
        objects = summary.objects,
        updated = summary.updated.len(),
        unchanged = summary.unchanged.len(),
        unmatched = summary.unmatched.len(),
        skipped = summary.skipped.len(),
        "update finished"
    );
    Ok(summary)
}

pub fn update_source(
    source: &str,
    pending: &mut PendingUpdates,
    options: &UpdateOptions,
    config: &Config,
) -> Result<(String, UpdateSummary)> {
    let codec = config.codec();
    let mut objects = modes_xml::read_objects(source, config)?;
    let mut summary = UpdateSummary {
        objects: objects.len(),
        ..UpdateSummary::default()
    };
    let mut edits: Vec<Edit> = Vec::new();
    let mut previous_key: Option<CanonicalId> = None;
    let mut stopped_early = false;

    for object in &mut objects {
        let key = codec.normalize(&object.id, config.strict_ids)?;
        if previous_key.as_ref().is_some_and(|previous| key < *previous) {
            warn!(object = %object.id, "objects are not in ascending order");
        }
        previous_key = Some(key.clone());

        let Some(directive) = pending.remove(&key) else {
            continue;
        };
        if apply_directive(object, &directive, options, config)? {
            info!(object = %object.id, location = %directive.location, "location updated");
            edits.extend(object.location_edits(source, config));
            summary.updated.push(object.id.clone());
        } else {
            debug!(object = %object.id, "location unchanged");
            summary.unchanged.push(object.id.clone());
        }
        if options.single {
            stopped_early = true;
            break;
        }
    }

    let mut leftover: Vec<&LocationDirective> = pending.values().collect();
    leftover.sort_by(|lhs, rhs| lhs.id.cmp(&rhs.id));
    for directive in leftover {
        if stopped_early {
            debug!(object = %directive.id, "directive skipped");
            summary.skipped.push(directive.id.clone());
        } else {
            warn!(object = %directive.id, "no object matched directive");
            summary.unmatched.push(directive.id.clone());
        }
    }

    Ok((modes_xml::apply_edits(source, edits)?, summary))
}

fn apply_directive(
    object: &mut ObjectRecord,
    directive: &LocationDirective,
    options: &UpdateOptions,
    config: &Config,
) -> Result<bool> {
    let strict = config.strict_dates;
    validate(&object.id, &object.locations, strict)?;

    let as_of = directive.date.unwrap_or(options.as_of);
    let mut changed = false;
    if options.targets.normal {
        changed |= update_normal(&mut object.locations, &object.id, &directive.location, strict)?;
    }
    if options.targets.current {
        let request = CurrentUpdate::new(directive.location.clone(), as_of)
            .mode(options.mode)
            .reason(options.reason.clone())
            .row_reason(directive.reason.clone())
            .force(options.force)
            .reset_current(options.reset_current)
            .strict(strict);
        changed |= update_current(&mut object.locations, &object.id, &request)?;
    }
    if options.targets.previous {
        changed |= update_previous(&mut object.locations, &object.id, &directive.location, as_of)?;
    }
    Ok(changed)
}

fn read_source(input: &Path) -> Result<String> {
    if !input.exists() {
        return Err(ToolError::MissingInput(input.to_path_buf()));
    }
    Ok(fs::read_to_string(input)?)
}
