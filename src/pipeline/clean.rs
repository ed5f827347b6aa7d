use crate::common::error::Result;
use crate::common::types::{CleanEntity, SanctionedEntity};
use csv::WriterBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument};

/// Strict INN format: exactly ten digits.
static INN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").unwrap());

/// Apply the cleaning rules in order: drop rows repeating an earlier
/// non-empty `innCode` (a dropped person row still claims its code), drop
/// person rows, backfill empty `innCode` from a ten-digit `taxNumber`,
/// drop `taxNumber`.
pub fn clean_entities(rows: Vec<SanctionedEntity>) -> Vec<CleanEntity> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut cleaned = Vec::new();
    for row in rows {
        if !row.inn_code.is_empty() && !seen.insert(row.inn_code.clone()) {
            continue;
        }
        if row.schema.eq_ignore_ascii_case("person") {
            continue;
        }
        let inn_code = if row.inn_code.is_empty() && INN_PATTERN.is_match(&row.tax_number) {
            row.tax_number
        } else {
            row.inn_code
        };
        cleaned.push(CleanEntity {
            caption: row.caption,
            schema: row.schema,
            inn_code,
        });
    }
    cleaned
}

/// Stage 2: read the fetch output, clean it, write `caption,schema,innCode`.
#[instrument]
pub fn run_clean(input: &Path, output: &Path) -> Result<()> {
    let mut reader = csv::Reader::from_path(input)?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<SanctionedEntity>, _>>()?;
    let total = rows.len();

    let cleaned = clean_entities(rows);

    let mut writer = WriterBuilder::new().has_headers(false).from_path(output)?;
    writer.write_record(["caption", "schema", "innCode"])?;
    for row in &cleaned {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(
        "Cleaned {} rows down to {}, saved to {}",
        total,
        cleaned.len(),
        output.display()
    );
    println!(
        "✅ Cleaned {} rows down to {} entities",
        total,
        cleaned.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(caption: &str, schema: &str, tax_number: &str, inn_code: &str) -> SanctionedEntity {
        SanctionedEntity {
            id: format!("id-{caption}"),
            caption: caption.to_string(),
            schema: schema.to_string(),
            tax_number: tax_number.to_string(),
            inn_code: inn_code.to_string(),
        }
    }

    #[test]
    fn no_two_rows_share_a_non_empty_inn() {
        let rows = vec![
            entity("First", "Company", "", "1111111111"),
            entity("Second", "Company", "", "1111111111"),
            entity("Third", "Company", "", "2222222222"),
        ];
        let cleaned = clean_entities(rows);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].caption, "First");
        assert_eq!(cleaned[1].caption, "Third");
    }

    #[test]
    fn rows_with_empty_inn_never_collapse() {
        let rows = vec![
            entity("A", "Company", "", ""),
            entity("B", "Company", "", ""),
        ];
        assert_eq!(clean_entities(rows).len(), 2);
    }

    #[test]
    fn person_rows_are_dropped() {
        let rows = vec![
            entity("Ivanov", "Person", "", "3333333333"),
            entity("Plant", "Company", "", "4444444444"),
        ];
        let cleaned = clean_entities(rows);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].caption, "Plant");
    }

    #[test]
    fn dropped_person_still_claims_its_inn() {
        // Dedup runs before the person filter, so a later duplicate of a
        // person's code is still removed.
        let rows = vec![
            entity("Ivanov", "person", "", "5555555555"),
            entity("Shadow Plant", "Company", "", "5555555555"),
        ];
        assert!(clean_entities(rows).is_empty());
    }

    #[test]
    fn ten_digit_tax_number_backfills_missing_inn() {
        let rows = vec![entity("Plant", "Company", "1234567890", "")];
        let cleaned = clean_entities(rows);
        assert_eq!(cleaned[0].inn_code, "1234567890");
    }

    #[test]
    fn short_tax_number_leaves_inn_empty() {
        let rows = vec![entity("Plant", "Company", "12345", "")];
        let cleaned = clean_entities(rows);
        assert_eq!(cleaned[0].inn_code, "");
    }

    #[test]
    fn existing_inn_is_not_overwritten() {
        let rows = vec![entity("Plant", "Company", "1234567890", "9999999999")];
        let cleaned = clean_entities(rows);
        assert_eq!(cleaned[0].inn_code, "9999999999");
    }
}
