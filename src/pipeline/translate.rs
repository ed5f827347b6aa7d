use crate::apis::translate::{contains_cyrillic, TranslateClient};
use crate::common::constants::{FACTORIES_MARKER, SECTION_HEADER, SUPPLIERS_MARKER};
use crate::common::error::{PipelineError, Result};
use crate::config::RowRange;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

/// Split one flat line into `(caption, innCode)`. Section markers, header
/// lines, blank lines, and anything that is not a two-field record return
/// None and pass through the stage untouched.
fn split_data_row(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty()
        || trimmed == FACTORIES_MARKER
        || trimmed == SUPPLIERS_MARKER
        || trimmed == SECTION_HEADER
    {
        return None;
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_reader(line.as_bytes());
    let record = reader.records().next()?.ok()?;
    if record.len() != 2 {
        return None;
    }
    Some((
        record.get(0).unwrap_or("").to_string(),
        record.get(1).unwrap_or("").to_string(),
    ))
}

fn encode_data_row(caption: &str, inn: &str) -> Result<String> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(vec![]);
    writer.write_record([caption, inn])?;
    let bytes = writer.into_inner().map_err(|e| {
        PipelineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    })?;
    Ok(String::from_utf8_lossy(&bytes).trim_end().to_string())
}

/// Stage 6: rewrite non-Cyrillic captions in Russian. The input is
/// treated as flat lines, not as a parsed two-section document; `rows`
/// optionally restricts the pass to an inclusive window of data-row
/// indices. A translation failure aborts the run.
#[instrument(skip(client))]
pub async fn run_translate(
    client: &TranslateClient,
    input: &Path,
    output: &Path,
    rows: Option<RowRange>,
) -> Result<()> {
    let raw = fs::read_to_string(input)?;
    let mut out_lines: Vec<String> = Vec::new();
    let mut data_index = 0usize;
    let mut translated = 0usize;

    for line in raw.lines() {
        let Some((caption, inn)) = split_data_row(line) else {
            out_lines.push(line.to_string());
            continue;
        };
        let in_window = rows.map_or(true, |range| range.contains(data_index));
        data_index += 1;

        if !in_window || caption.trim().is_empty() || contains_cyrillic(&caption) {
            out_lines.push(line.to_string());
            continue;
        }

        let russian = client.translate(&caption, "ru").await?;
        info!("Translated '{}' to '{}'", caption, russian);
        out_lines.push(encode_data_row(&russian, &inn)?);
        translated += 1;
    }

    let content = if out_lines.is_empty() {
        String::new()
    } else {
        out_lines.join("\n") + "\n"
    };
    fs::write(output, content)?;

    info!(
        "Translated {} captions, saved to {}",
        translated,
        output.display()
    );
    println!("✅ Translated {translated} captions into Russian");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_headers_and_blanks_are_not_data_rows() {
        assert!(split_data_row("**factories**").is_none());
        assert!(split_data_row("**suppliers**").is_none());
        assert!(split_data_row("caption,innCode").is_none());
        assert!(split_data_row("").is_none());
        assert!(split_data_row("   ").is_none());
    }

    #[test]
    fn two_field_lines_split() {
        assert_eq!(
            split_data_row("Acme Corp,1234567890"),
            Some(("Acme Corp".to_string(), "1234567890".to_string()))
        );
        // quoted captions keep their embedded comma
        assert_eq!(
            split_data_row("\"Plant, JSC\",111"),
            Some(("Plant, JSC".to_string(), "111".to_string()))
        );
    }

    #[test]
    fn other_arities_pass_through() {
        assert!(split_data_row("one").is_none());
        assert!(split_data_row("a,b,c").is_none());
    }

    #[test]
    fn encoding_quotes_when_needed() {
        assert_eq!(encode_data_row("Acme", "111").unwrap(), "Acme,111");
        assert_eq!(
            encode_data_row("Plant, JSC", "111").unwrap(),
            "\"Plant, JSC\",111"
        );
    }
}
