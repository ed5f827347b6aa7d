use crate::apis::open_sanctions::SanctionsClient;
use crate::common::constants::EXCLUDE_KEYWORDS;
use crate::common::error::Result;
use crate::common::types::{RawApiData, SanctionedEntity};
use csv::WriterBuilder;
use std::path::Path;
use tracing::{info, instrument, warn};

/// First element of a possibly-list-valued entity property, empty when
/// the property is absent.
fn first_property(properties: &RawApiData, key: &str) -> String {
    properties[key]
        .as_array()
        .and_then(|values| values.first())
        .and_then(|value| value.as_str())
        .unwrap_or("")
        .to_string()
}

/// Flatten one raw search result into a fetch-stage row.
pub fn entity_from_result(result: &RawApiData) -> SanctionedEntity {
    let properties = &result["properties"];
    SanctionedEntity {
        id: result["id"].as_str().unwrap_or("").to_string(),
        caption: result["caption"].as_str().unwrap_or("").to_string(),
        schema: result["schema"].as_str().unwrap_or("").to_string(),
        tax_number: first_property(properties, "taxNumber"),
        inn_code: first_property(properties, "innCode"),
    }
}

/// Case-insensitive substring match against the exclusion list.
pub fn is_excluded(caption: &str) -> bool {
    let caption = caption.to_lowercase();
    EXCLUDE_KEYWORDS.iter().any(|keyword| caption.contains(*keyword))
}

/// Stage 1: query the sanctions directory for every keyword and write the
/// collected entities. Duplicates across keywords are kept; the clean
/// stage resolves them. Writes nothing when no keyword matched anything,
/// which the runner's existence gate turns into a halt.
#[instrument(skip(client, keywords))]
pub async fn run_fetch(
    client: &SanctionsClient,
    keywords: &[String],
    output: &Path,
) -> Result<()> {
    let mut entities: Vec<SanctionedEntity> = Vec::new();
    for keyword in keywords {
        println!("🔎 Searching sanctions directory for '{keyword}'...");
        let results = client.search_keyword(keyword).await;
        if results.is_empty() {
            info!("No results found for keyword '{}'", keyword);
            continue;
        }

        let before = entities.len();
        for result in &results {
            let entity = entity_from_result(result);
            if is_excluded(&entity.caption) {
                continue;
            }
            entities.push(entity);
        }
        info!(
            "Keyword '{}' contributed {} entities after exclusions",
            keyword,
            entities.len() - before
        );
    }

    if entities.is_empty() {
        warn!("No entities collected; not writing {}", output.display());
        println!("⚠️  No results found across all keywords.");
        return Ok(());
    }

    let mut writer = WriterBuilder::new().has_headers(false).from_path(output)?;
    writer.write_record(["id", "caption", "schema", "taxNumber", "innCode"])?;
    for entity in &entities {
        writer.serialize(entity)?;
    }
    writer.flush()?;

    info!("Saved {} entities to {}", entities.len(), output.display());
    println!(
        "✅ Saved {} sanctioned entities to {}",
        entities.len(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_list_valued_tax_properties() {
        let result = json!({
            "id": "ru-entity-1",
            "caption": "Uralvagonzavod",
            "schema": "Company",
            "properties": {
                "taxNumber": ["6623029538", "0000000000"],
                "innCode": ["6623029538"]
            }
        });
        let entity = entity_from_result(&result);
        assert_eq!(entity.id, "ru-entity-1");
        assert_eq!(entity.tax_number, "6623029538");
        assert_eq!(entity.inn_code, "6623029538");
    }

    #[test]
    fn absent_properties_become_empty() {
        let result = json!({
            "id": "ru-entity-2",
            "caption": "Some Plant",
            "schema": "LegalEntity",
            "properties": {}
        });
        let entity = entity_from_result(&result);
        assert_eq!(entity.tax_number, "");
        assert_eq!(entity.inn_code, "");
    }

    #[test]
    fn exclusion_list_is_case_insensitive() {
        assert!(is_excluded("First Industrial BANK of Moscow"));
        assert!(is_excluded("Wagner PMC"));
        assert!(is_excluded("Ministry of Defense"));
        assert!(!is_excluded("Tula Arms Plant"));
    }
}
