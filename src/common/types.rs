use serde::{Deserialize, Serialize};

/// Raw JSON payload as returned from the external APIs.
pub type RawApiData = serde_json::Value;

/// One row of the fetch stage output: a sanctioned entity as reported by
/// the sanctions directory, with its tax identifiers flattened out of the
/// list-valued properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanctionedEntity {
    pub id: String,
    pub caption: String,
    pub schema: String,
    #[serde(rename = "taxNumber")]
    pub tax_number: String,
    #[serde(rename = "innCode")]
    pub inn_code: String,
}

/// One row of the clean stage output. Invariants: no two rows share a
/// non-empty `inn_code`, and `schema` is never `person`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanEntity {
    pub caption: String,
    pub schema: String,
    #[serde(rename = "innCode")]
    pub inn_code: String,
}

/// One row of the enrich stage output: a top supplier of one company,
/// with that supplier's summed contract volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierRecord {
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Supplier Name")]
    pub supplier_name: String,
    #[serde(rename = "Supplier INN")]
    pub supplier_inn: String,
    #[serde(rename = "Total Contract Value")]
    pub total_contract_value: f64,
}

/// A `caption,innCode` projection used by both sections of the merged
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRow {
    pub caption: String,
    #[serde(rename = "innCode")]
    pub inn_code: String,
}

/// The ordered two-section container written by the merge stage and
/// rewritten by the final clean stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionedDoc {
    pub factories: Vec<SectionRow>,
    pub suppliers: Vec<SectionRow>,
}

impl SectionedDoc {
    pub fn row_count(&self) -> usize {
        self.factories.len() + self.suppliers.len()
    }
}
