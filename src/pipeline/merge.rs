use crate::common::error::{PipelineError, Result};
use crate::common::types::{SectionRow, SectionedDoc, SupplierRecord};
use crate::pipeline::sections;
use std::path::Path;
use tracing::{info, instrument};

/// Read `caption` and `innCode` out of the factories CSV by header name,
/// dropping whatever other columns (`id`, `schema`) happen to be present.
fn read_factories(input: &Path) -> Result<Vec<SectionRow>> {
    let mut reader = csv::Reader::from_path(input)?;
    let headers = reader.headers()?.clone();
    let caption_idx = headers
        .iter()
        .position(|h| h == "caption")
        .ok_or_else(|| PipelineError::Api {
            message: format!("{} has no 'caption' column", input.display()),
        })?;
    let inn_idx = headers
        .iter()
        .position(|h| h == "innCode")
        .ok_or_else(|| PipelineError::Api {
            message: format!("{} has no 'innCode' column", input.display()),
        })?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(SectionRow {
            caption: record.get(caption_idx).unwrap_or("").to_string(),
            inn_code: record.get(inn_idx).unwrap_or("").to_string(),
        });
    }
    Ok(rows)
}

fn read_suppliers(input: &Path) -> Result<Vec<SectionRow>> {
    let mut reader = csv::Reader::from_path(input)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let record: SupplierRecord = record?;
        rows.push(SectionRow {
            caption: record.supplier_name,
            inn_code: record.supplier_inn,
        });
    }
    Ok(rows)
}

/// Stage 4: combine the cleaned entities (the "factories") with the
/// enriched supplier list into the two-section document.
#[instrument]
pub fn run_merge(factories_input: &Path, suppliers_input: &Path, output: &Path) -> Result<()> {
    let doc = SectionedDoc {
        factories: read_factories(factories_input)?,
        suppliers: read_suppliers(suppliers_input)?,
    };

    sections::write_sectioned(&doc, output)?;

    info!(
        "Merged {} factories and {} suppliers into {}",
        doc.factories.len(),
        doc.suppliers.len(),
        output.display()
    );
    println!(
        "✅ Merged {} factories and {} suppliers into {}",
        doc.factories.len(),
        doc.suppliers.len(),
        output.display()
    );
    Ok(())
}
