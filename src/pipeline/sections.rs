//! The two-section document shared by the merge, final clean, and
//! translate stages:
//!
//! ```text
//! **factories**
//! caption,innCode
//! <rows>
//!
//! **suppliers**
//! caption,innCode
//! <rows>
//! ```
//!
//! The layout is line-oriented, so rows go through the CSV writer (commas
//! and quotes in captions are quoted instead of corrupting the file) and
//! embedded newlines are flattened to spaces before writing.

use crate::common::constants::{FACTORIES_MARKER, SECTION_HEADER, SUPPLIERS_MARKER};
use crate::common::error::{PipelineError, Result};
use crate::common::types::{SectionRow, SectionedDoc};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;
use tracing::warn;

enum Section {
    Factories,
    Suppliers,
}

pub fn write_sectioned(doc: &SectionedDoc, path: &Path) -> Result<()> {
    let mut out = String::new();
    out.push_str(FACTORIES_MARKER);
    out.push('\n');
    out.push_str(&section_body(&doc.factories)?);
    out.push('\n');
    out.push_str(SUPPLIERS_MARKER);
    out.push('\n');
    out.push_str(&section_body(&doc.suppliers)?);
    fs::write(path, out)?;
    Ok(())
}

pub fn read_sectioned(path: &Path) -> Result<SectionedDoc> {
    let raw = fs::read_to_string(path)?;
    parse_sectioned(&raw)
}

fn flatten(value: &str) -> String {
    value.replace(['\n', '\r'], " ")
}

fn section_body(rows: &[SectionRow]) -> Result<String> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(vec![]);
    writer.write_record(["caption", "innCode"])?;
    for row in rows {
        writer.write_record([flatten(&row.caption), flatten(&row.inn_code)])?;
    }
    writer_into_string(writer)
}

fn writer_into_string(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| {
        PipelineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse the two-section layout. Rows before the first marker, blank
/// lines, and per-section header lines are skipped; rows that do not
/// split into exactly two fields are dropped with a warning.
pub fn parse_sectioned(raw: &str) -> Result<SectionedDoc> {
    let mut factories_body = String::new();
    let mut suppliers_body = String::new();
    let mut current: Option<Section> = None;

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed == FACTORIES_MARKER {
            current = Some(Section::Factories);
            continue;
        }
        if trimmed == SUPPLIERS_MARKER {
            current = Some(Section::Suppliers);
            continue;
        }
        if trimmed.is_empty() || trimmed == SECTION_HEADER {
            continue;
        }
        let body = match current {
            Some(Section::Factories) => &mut factories_body,
            Some(Section::Suppliers) => &mut suppliers_body,
            None => continue,
        };
        body.push_str(line);
        body.push('\n');
    }

    Ok(SectionedDoc {
        factories: parse_rows(&factories_body)?,
        suppliers: parse_rows(&suppliers_body)?,
    })
}

fn parse_rows(body: &str) -> Result<Vec<SectionRow>> {
    let mut rows = Vec::new();
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unparsable section row: {}", e);
                continue;
            }
        };
        if record.len() != 2 {
            warn!(
                "Skipping section row with {} fields instead of 2",
                record.len()
            );
            continue;
        }
        rows.push(SectionRow {
            caption: record.get(0).unwrap_or("").trim().to_string(),
            inn_code: record.get(1).unwrap_or("").trim().to_string(),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(caption: &str, inn: &str) -> SectionRow {
        SectionRow {
            caption: caption.to_string(),
            inn_code: inn.to_string(),
        }
    }

    #[test]
    fn serializes_the_expected_layout() {
        let doc = SectionedDoc {
            factories: vec![row("A", "111")],
            suppliers: vec![row("B", "222")],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.csv");
        write_sectioned(&doc, &path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            raw,
            "**factories**\ncaption,innCode\nA,111\n\n**suppliers**\ncaption,innCode\nB,222\n"
        );
    }

    #[test]
    fn round_trips_captions_containing_commas() {
        let doc = SectionedDoc {
            factories: vec![row("Plant, JSC \"Iron\"", "111")],
            suppliers: vec![row("B", "222")],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.csv");
        write_sectioned(&doc, &path).unwrap();
        let parsed = read_sectioned(&path).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn parser_skips_junk_and_out_of_section_lines() {
        let raw = "stray,line\n**factories**\ncaption,innCode\nA,111\nnot a pair at all,x,y\n\n**suppliers**\ncaption,innCode\nB,222\n";
        let doc = parse_sectioned(raw).unwrap();
        assert_eq!(doc.factories, vec![row("A", "111")]);
        assert_eq!(doc.suppliers, vec![row("B", "222")]);
    }

    #[test]
    fn newlines_in_captions_are_flattened() {
        let doc = SectionedDoc {
            factories: vec![row("Two\nLines", "111")],
            suppliers: vec![],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.csv");
        write_sectioned(&doc, &path).unwrap();
        let parsed = read_sectioned(&path).unwrap();
        assert_eq!(parsed.factories[0].caption, "Two Lines");
    }
}
