use crate::common::error::Result;
use crate::common::types::{SectionRow, SectionedDoc};
use crate::pipeline::sections;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument};

/// Drop rows whose `innCode` already appeared anywhere earlier in the
/// combined factories-then-suppliers order. First occurrence wins, so an
/// identifier present in both sections survives only in factories. Rows
/// with an empty `innCode` never collapse.
pub fn dedup_sections(doc: &SectionedDoc) -> SectionedDoc {
    let mut seen: HashSet<String> = HashSet::new();
    let mut deduped = SectionedDoc::default();
    for row in &doc.factories {
        if row.inn_code.is_empty() || seen.insert(row.inn_code.clone()) {
            deduped.factories.push(row.clone());
        }
    }
    for row in &doc.suppliers {
        if row.inn_code.is_empty() || seen.insert(row.inn_code.clone()) {
            deduped.suppliers.push(row.clone());
        }
    }
    deduped
}

/// Stage 5: re-parse the merged document, deduplicate identifiers across
/// both sections, and rewrite the same two-section layout with the
/// deduplicated row sets.
#[instrument]
pub fn run_final_clean(input: &Path, output: &Path) -> Result<()> {
    let doc = sections::read_sectioned(input)?;
    let deduped = dedup_sections(&doc);

    let removed = doc.row_count() - deduped.row_count();
    sections::write_sectioned(&deduped, output)?;

    info!(
        "Removed {} duplicate rows across sections, saved to {}",
        removed,
        output.display()
    );
    println!("✅ Removed {removed} cross-section duplicates");
    Ok(())
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
    fn identifier_in_both_sections_survives_once() {
        let doc = SectionedDoc {
            factories: vec![row("Plant", "111"), row("Other", "333")],
            suppliers: vec![row("Plant Again", "111"), row("Fresh", "222")],
        };
        let deduped = dedup_sections(&doc);
        assert_eq!(deduped.factories, vec![row("Plant", "111"), row("Other", "333")]);
        assert_eq!(deduped.suppliers, vec![row("Fresh", "222")]);
    }

    #[test]
    fn duplicates_within_a_section_are_removed_too() {
        let doc = SectionedDoc {
            factories: vec![row("A", "111"), row("B", "111")],
            suppliers: vec![],
        };
        let deduped = dedup_sections(&doc);
        assert_eq!(deduped.factories, vec![row("A", "111")]);
    }

    #[test]
    fn empty_identifiers_are_kept() {
        let doc = SectionedDoc {
            factories: vec![row("A", ""), row("B", "")],
            suppliers: vec![row("C", "")],
        };
        let deduped = dedup_sections(&doc);
        assert_eq!(deduped.row_count(), 3);
    }
}
