use std::collections::HashMap;
use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use tracing::{debug, warn};

use crate::modes::locations::error::{Result, ToolError};
use crate::modes::locations::ident::{CanonicalId, IdCodec};
use crate::modes::locations::model::PartialDate;

/// Requested location for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationDirective {
    /// Accession number as written in the directive file.
    pub id: String,
    pub location: String,
    /// Overrides the run's as-of date for this object.
    pub date: Option<PartialDate>,
    pub reason: Option<String>,
}

/// Outstanding directives keyed by canonical accession number.
///
/// The batch driver removes each entry once the matching object is processed.
pub type PendingUpdates = HashMap<CanonicalId, LocationDirective>;

const ID_HEADERS: [&str; 4] = ["object", "number", "id", "objectnumber"];
const LOCATION_HEADER: &str = "location";
const DATE_HEADER: &str = "date";
const REASON_HEADER: &str = "reason";

#[derive(Debug)]
struct Columns {
    id: usize,
    location: usize,
    date: Option<usize>,
    reason: Option<usize>,
}

/// Reads a CSV or XLSX directive file, chosen by extension.
pub fn read_directives(path: &Path, codec: &IdCodec, strict: bool) -> Result<PendingUpdates> {
    let is_xlsx = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("xlsx"));
    let rows = if is_xlsx {
        read_xlsx_rows(path)?
    } else {
        read_csv_rows(path)?
    };
    directives_from_rows(&rows, codec, strict)
}

/// Builds pending updates from a header row followed by data rows.
pub fn directives_from_rows(
    rows: &[Vec<String>],
    codec: &IdCodec,
    strict: bool,
) -> Result<PendingUpdates> {
    let (header, body) = rows
        .split_first()
        .ok_or_else(|| ToolError::InvalidDirectives("file is empty".into()))?;
    let columns = find_columns(header)?;
    debug!(?columns, rows = body.len(), "reading directives");

    let mut pending = PendingUpdates::new();
    for (line, row) in body.iter().enumerate() {
        let raw_id = cell(row, Some(columns.id));
        if raw_id.is_empty() {
            continue;
        }
        let location = cell(row, Some(columns.location));
        if location.is_empty() {
            return Err(ToolError::InvalidDirectives(format!(
                "row {} ({raw_id}) has no location",
                line + 2
            )));
        }
        let date = match cell(row, columns.date) {
            text if text.is_empty() => None,
            text => Some(text.parse::<PartialDate>()?),
        };
        let reason = Some(cell(row, columns.reason)).filter(|text| !text.is_empty());
        insert_range(&mut pending, &raw_id, &location, date, reason, codec, strict)?;
    }

    Ok(pending)
}

/// Builds pending updates sending every listed object to the same location.
///
/// `location` may be empty when the run moves objects to their normal location.
pub fn directives_for_ids(
    ids: &[String],
    location: &str,
    codec: &IdCodec,
    strict: bool,
) -> Result<PendingUpdates> {
    let mut pending = PendingUpdates::new();
    for raw_id in ids {
        insert_range(&mut pending, raw_id, location, None, None, codec, strict)?;
    }
    Ok(pending)
}

fn insert_range(
    pending: &mut PendingUpdates,
    raw_id: &str,
    location: &str,
    date: Option<PartialDate>,
    reason: Option<String>,
    codec: &IdCodec,
    strict: bool,
) -> Result<()> {
    for id in codec.expand_range(raw_id)? {
        let key = match codec.normalize(&id, true) {
            Ok(key) => key,
            Err(error) if !strict => {
                warn!(identifier = %id, %error, "skipping directive");
                continue;
            }
            Err(error) => return Err(error.into()),
        };
        if pending.contains_key(&key) {
            return Err(ToolError::DuplicateDirective(id));
        }
        pending.insert(
            key,
            LocationDirective {
                id,
                location: location.to_string(),
                date,
                reason: reason.clone(),
            },
        );
    }
    Ok(())
}

fn find_columns(header: &[String]) -> Result<Columns> {
    let names: Vec<String> = header
        .iter()
        .map(|name| name.trim().to_lowercase().replace([' ', '_'], ""))
        .collect();
    let position = |wanted: &str| names.iter().position(|name| name == wanted);

    let id = ID_HEADERS
        .iter()
        .find_map(|wanted| position(*wanted))
        .ok_or_else(|| ToolError::InvalidDirectives("missing object number column".into()))?;
    let location = position(LOCATION_HEADER)
        .ok_or_else(|| ToolError::InvalidDirectives("missing location column".into()))?;

    Ok(Columns {
        id,
        location,
        date: position(DATE_HEADER),
        reason: position(REASON_HEADER),
    })
}

fn cell(row: &[String], column: Option<usize>) -> String {
    column
        .and_then(|index| row.get(index))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn read_xlsx_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ToolError::InvalidDirectives("workbook has no sheets".into()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .ok_or_else(|| ToolError::InvalidDirectives(format!("missing sheet '{sheet}'")))?
        .map_err(ToolError::from)?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(value) => value.clone(),
        DataType::Float(value) => value.to_string(),
        DataType::Int(value) => value.to_string(),
        DataType::Bool(value) => value.to_string(),
        DataType::Empty => String::new(),
        other => other.to_string(),
    }
}
