use crate::common::constants::{
    CONTRACTS_PAGE_SIZE, REQUEST_DELAY_SECS, SANCTIONS_PAGE_SIZE, SIGN_DATE_GTE, SIGN_DATE_LTE,
};
use crate::common::error::{PipelineError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Tuning knobs for a pipeline run, read from an optional `config.toml`
/// in the working directory. Missing file means defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output_dir: String,
    /// Seconds to wait after every contracts query.
    pub request_delay_secs: u64,
    pub sanctions_page_size: usize,
    pub contracts_page_size: usize,
    pub sign_date_gte: String,
    pub sign_date_lte: String,
    /// Restricts the translate stage to an inclusive window of data-row
    /// indices. Unset means every data row is considered.
    pub translate_rows: Option<RowRange>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: "output".to_string(),
            request_delay_secs: REQUEST_DELAY_SECS,
            sanctions_page_size: SANCTIONS_PAGE_SIZE,
            contracts_page_size: CONTRACTS_PAGE_SIZE,
            sign_date_gte: SIGN_DATE_GTE.to_string(),
            sign_date_lte: SIGN_DATE_LTE.to_string(),
            translate_rows: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        if !Path::new(config_path).exists() {
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file '{config_path}': {e}"))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}

/// An inclusive window of zero-based data-row indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }
}

impl FromStr for RowRange {
    type Err = String;

    /// Parses `START:END`, both inclusive.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| format!("expected START:END, got '{s}'"))?;
        let start: usize = start
            .trim()
            .parse()
            .map_err(|e| format!("bad start index '{start}': {e}"))?;
        let end: usize = end
            .trim()
            .parse()
            .map_err(|e| format!("bad end index '{end}': {e}"))?;
        if end < start {
            return Err(format!("end {end} is before start {start}"));
        }
        Ok(Self { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_range_parses_and_bounds() {
        let range: RowRange = "2:268".parse().unwrap();
        assert!(range.contains(2));
        assert!(range.contains(268));
        assert!(!range.contains(1));
        assert!(!range.contains(269));
    }

    #[test]
    fn row_range_rejects_backwards_window() {
        assert!("10:3".parse::<RowRange>().is_err());
        assert!("10".parse::<RowRange>().is_err());
    }

    #[test]
    fn default_config_matches_constants() {
        let config = Config::default();
        assert_eq!(config.request_delay_secs, REQUEST_DELAY_SECS);
        assert_eq!(config.sign_date_gte, SIGN_DATE_GTE);
        assert!(config.translate_rows.is_none());
    }
}
