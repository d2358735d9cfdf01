//! Reading object records from a Modes XML export and writing them back.
//!
//! Output is produced by splicing edits into the original text, so everything
//! outside the rewritten location elements survives byte for byte.

use std::ops::Range;

use roxmltree::{Document, Node};

use crate::modes::locations::config::Config;
use crate::modes::locations::error::{Result, ToolError};
use crate::modes::locations::model::{LocationKind, LocationRecord, ObjectLocationSet, RecordDate};

const LOCATION: &str = "Location";
const DATE: &str = "Date";
const DATE_BEGIN: &str = "DateBegin";
const DATE_END: &str = "DateEnd";
const REASON: &str = "Reason";
const DEFAULT_STEP: &str = "    ";

/// One object of the export together with where it sits in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    /// Accession number as written in the file.
    pub id: String,
    /// Byte range of the whole record element.
    pub span: Range<usize>,
    pub locations: ObjectLocationSet,
    location_spans: Vec<Range<usize>>,
    insert_at: usize,
    indent: String,
    step: String,
}

/// A replacement of a byte range of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

/// Parses every record element of `source`.
pub fn read_objects(source: &str, config: &Config) -> Result<Vec<ObjectRecord>> {
    let document = Document::parse(source)?;
    let record_tag = config.record_tag.as_str();

    document
        .descendants()
        .filter(|node| node.has_tag_name(record_tag))
        .filter(|node| {
            !node
                .ancestors()
                .skip(1)
                .any(|ancestor| ancestor.has_tag_name(record_tag))
        })
        .map(|node| read_object(source, node, config))
        .collect()
}

fn read_object(source: &str, node: Node<'_, '_>, config: &Config) -> Result<ObjectRecord> {
    let id = object_id(node, config).ok_or_else(|| {
        ToolError::InvalidDocument(format!(
            "record at byte {} has no {} element",
            node.range().start,
            config.id_path.join("/")
        ))
    })?;

    let location_nodes: Vec<Node<'_, '_>> = node
        .children()
        .filter(|child| child.has_tag_name(config.location_tag.as_str()))
        .collect();

    let records = location_nodes
        .iter()
        .map(|location| read_location(source, *location, config))
        .collect();
    let location_spans: Vec<Range<usize>> = location_nodes.iter().map(Node::range).collect();

    let anchor = location_nodes
        .first()
        .copied()
        .or_else(|| node.last_element_child())
        .ok_or_else(|| {
            ToolError::InvalidDocument(format!("object {id} has no child elements"))
        })?;
    let indent = line_indent(source, anchor.range().start).to_string();
    let step = anchor
        .first_element_child()
        .map(|child| line_indent(source, child.range().start))
        .and_then(|inner| inner.strip_prefix(indent.as_str()))
        .filter(|step| !step.is_empty())
        .unwrap_or(DEFAULT_STEP)
        .to_string();

    Ok(ObjectRecord {
        id,
        span: node.range(),
        locations: ObjectLocationSet::new(records),
        location_spans,
        insert_at: anchor.range().end,
        indent,
        step,
    })
}

fn object_id(node: Node<'_, '_>, config: &Config) -> Option<String> {
    let mut current = node;
    for step in &config.id_path {
        current = current
            .children()
            .find(|child| child.has_tag_name(step.as_str()))?;
    }
    current.text().map(|text| text.trim().to_string())
}

fn read_location(source: &str, node: Node<'_, '_>, config: &Config) -> LocationRecord {
    let kind = LocationKind::from_tag(node.attribute(config.kind_attribute.as_str()).unwrap_or(""));
    let mut record = LocationRecord {
        kind,
        text: None,
        date_begin: None,
        date_end: None,
        reason: None,
        extras: Vec::new(),
    };

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            LOCATION => record.text = Some(child.text().unwrap_or_default().trim().to_string()),
            DATE => {
                for part in child.children().filter(Node::is_element) {
                    match part.tag_name().name() {
                        DATE_BEGIN => record.date_begin = date_text(part),
                        DATE_END => record.date_end = date_text(part),
                        _ => {}
                    }
                }
            }
            REASON => record.reason = child.text().map(|text| text.trim().to_string()),
            _ => record.extras.push(source[child.range()].to_string()),
        }
    }

    record
}

fn date_text(node: Node<'_, '_>) -> Option<RecordDate> {
    node.text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(RecordDate::parse)
}

/// Returns the spaces and tabs between the start of the line and `position`.
fn line_indent(source: &str, position: usize) -> &str {
    let before = &source[..position];
    let start = before.trim_end_matches([' ', '\t']).len();
    &before[start..]
}

/// Widens `range` backwards over the indentation and line break before it.
fn with_leading_whitespace(source: &str, range: &Range<usize>) -> Range<usize> {
    let mut start = range.start - line_indent(source, range.start).len();
    let before = &source[..start];
    if before.ends_with("\r\n") {
        start -= 2;
    } else if before.ends_with('\n') {
        start -= 1;
    }
    start..range.end
}

impl ObjectRecord {
    /// Edits replacing the record's location elements with its current set.
    pub fn location_edits(&self, source: &str, config: &Config) -> Vec<Edit> {
        let rendered = self
            .locations
            .records
            .iter()
            .map(|record| render_location(record, &self.indent, &self.step, config))
            .collect::<Vec<_>>()
            .join(&format!("\n{}", self.indent));

        let Some((first, rest)) = self.location_spans.split_first() else {
            return vec![Edit {
                range: self.insert_at..self.insert_at,
                replacement: format!("\n{}{rendered}", self.indent),
            }];
        };

        let mut edits = vec![Edit {
            range: first.clone(),
            replacement: rendered,
        }];
        edits.extend(rest.iter().map(|span| Edit {
            range: with_leading_whitespace(source, span),
            replacement: String::new(),
        }));
        edits
    }

    /// Edit removing the whole record from the output.
    pub fn removal_edit(&self, source: &str) -> Edit {
        Edit {
            range: with_leading_whitespace(source, &self.span),
            replacement: String::new(),
        }
    }
}

fn render_location(record: &LocationRecord, indent: &str, step: &str, config: &Config) -> String {
    let inner = format!("{indent}{step}");
    let mut lines = vec![format!(
        "<{} {}=\"{}\">",
        config.location_tag,
        config.kind_attribute,
        escape(record.kind.tag())
    )];

    if let Some(text) = &record.text {
        lines.push(format!("{inner}<{LOCATION}>{}</{LOCATION}>", escape(text)));
    }
    if record.date_begin.is_some() || record.date_end.is_some() {
        lines.push(format!("{inner}<{DATE}>"));
        if let Some(begin) = &record.date_begin {
            lines.push(format!(
                "{inner}{step}<{DATE_BEGIN}>{}</{DATE_BEGIN}>",
                escape(&begin.to_string())
            ));
        }
        if let Some(end) = &record.date_end {
            lines.push(format!(
                "{inner}{step}<{DATE_END}>{}</{DATE_END}>",
                escape(&end.to_string())
            ));
        }
        lines.push(format!("{inner}</{DATE}>"));
    }
    if let Some(reason) = &record.reason {
        lines.push(format!("{inner}<{REASON}>{}</{REASON}>", escape(reason)));
    }
    for extra in &record.extras {
        lines.push(format!("{inner}{extra}"));
    }
    lines.push(format!("{indent}</{}>", config.location_tag));
    lines.join("\n")
}

/// Applies non-overlapping edits to `source`.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> Result<String> {
    edits.sort_by_key(|edit| edit.range.start);

    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.range.start < cursor {
            return Err(ToolError::InvalidDocument(format!(
                "overlapping edits at byte {}",
                edit.range.start
            )));
        }
        output.push_str(&source[cursor..edit.range.start]);
        output.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    output.push_str(&source[cursor..]);
    Ok(output)
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
