use crate::apis::clearspending::{ContractsClient, QueryOutcome};
use crate::common::constants::TOP_SUPPLIERS_PER_COMPANY;
use crate::common::error::Result;
use crate::common::types::{CleanEntity, RawApiData, SupplierRecord};
use csv::WriterBuilder;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// One supplier's share of a company's contract volume.
#[derive(Debug, PartialEq)]
pub struct SupplierTotal {
    pub inn: String,
    pub name: String,
    pub total: f64,
}

fn json_scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Group a contract set by supplier INN, summing `amount_rur` (a contract
/// with several suppliers counts its full amount once per supplier, and
/// the first name seen for an INN wins). Sorted descending, truncated to
/// `limit`.
pub fn top_suppliers(contracts: &[RawApiData], limit: usize) -> Vec<SupplierTotal> {
    let mut totals: Vec<SupplierTotal> = Vec::new();
    for contract in contracts {
        let amount = contract["amount_rur"].as_f64().unwrap_or(0.0);
        let inns = contract["supplier_inns"].as_array().cloned().unwrap_or_default();
        let names = contract["supplier_names"].as_array().cloned().unwrap_or_default();
        for (inn, name) in inns.iter().zip(names.iter()) {
            let inn = json_scalar_to_string(inn);
            match totals.iter_mut().find(|t| t.inn == inn) {
                Some(existing) => existing.total += amount,
                None => totals.push(SupplierTotal {
                    inn,
                    name: json_scalar_to_string(name),
                    total: amount,
                }),
            }
        }
    }
    totals.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    totals.truncate(limit);
    totals
}

/// Stage 3: for every cleaned entity with a usable INN, query its
/// contracts and keep the top suppliers by summed value. The output file
/// is written even when no entity yielded suppliers; key-ring exhaustion
/// aborts the whole run before anything is written.
#[instrument(skip(client))]
pub async fn run_enrich(
    client: &mut ContractsClient,
    input: &Path,
    output: &Path,
    delay: Duration,
) -> Result<()> {
    let mut reader = csv::Reader::from_path(input)?;
    let entities = reader
        .deserialize()
        .collect::<std::result::Result<Vec<CleanEntity>, _>>()?;

    let mut records: Vec<SupplierRecord> = Vec::new();
    for (index, entity) in entities.iter().enumerate() {
        println!(
            "--- Searching contracts for {} ({}/{}) ---",
            entity.caption,
            index + 1,
            entities.len()
        );
        let inn: u64 = match entity.inn_code.trim().parse() {
            Ok(inn) => inn,
            Err(_) => {
                info!("Skipping '{}': no usable INN", entity.caption);
                continue;
            }
        };

        match client.contracts_for_customer(inn).await? {
            QueryOutcome::Contracts(contracts) => {
                for supplier in top_suppliers(&contracts, TOP_SUPPLIERS_PER_COMPANY) {
                    records.push(SupplierRecord {
                        company_name: entity.caption.clone(),
                        supplier_name: supplier.name,
                        supplier_inn: supplier.inn,
                        total_contract_value: supplier.total,
                    });
                }
            }
            QueryOutcome::Empty => {
                info!("No contracts found for '{}'", entity.caption);
                println!("No results found for company: {}", entity.caption);
            }
            QueryOutcome::Failed(reason) => {
                warn!("Contracts lookup failed for '{}': {}", entity.caption, reason);
            }
        }

        // Stay under the external rate limit regardless of outcome
        tokio::time::sleep(delay).await;
    }

    let mut writer = WriterBuilder::new().has_headers(false).from_path(output)?;
    writer.write_record([
        "Company Name",
        "Supplier Name",
        "Supplier INN",
        "Total Contract Value",
    ])?;
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!(
        "Saved {} supplier rows to {}",
        records.len(),
        output.display()
    );
    println!(
        "✅ Saved {} supplier rows to {}",
        records.len(),
        output.display()
    );
    Ok(())
}
