//! Endpoint and tuning constants shared across the pipeline stages.

// External endpoints
pub const SANCTIONS_SEARCH_URL: &str = "https://api.opensanctions.org/search/sanctions";
pub const CONTRACTS_SEARCH_URL: &str =
    "https://newapi.clearspending.ru/csinternalapi/v1/filtered-contracts/";
pub const TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

// Paging and throttling
pub const SANCTIONS_PAGE_SIZE: usize = 100;
pub const CONTRACTS_PAGE_SIZE: usize = 50;
/// Pause after every contracts query, and before a rate-limit retry.
pub const REQUEST_DELAY_SECS: u64 = 5;
pub const MAX_CONTRACT_KEYS: usize = 3;
pub const TOP_SUPPLIERS_PER_COMPANY: usize = 3;

// Contract sign-date window: start of sanctions to the 2022 invasion.
pub const SIGN_DATE_GTE: &str = "2014-07-31";
pub const SIGN_DATE_LTE: &str = "2022-02-23";

/// Default search keywords for sanctioned defense-sector companies.
pub const DEFAULT_KEYWORDS: [&str; 8] = [
    "military production",
    "weapons manufacture",
    "arms industry",
    "aerospace",
    "shipbuilding",
    "military research",
    "tank production",
    "aircraft production",
];

/// Entities whose display name contains any of these are dropped at fetch
/// time. Kept lowercase; captions are lowercased before matching.
pub const EXCLUDE_KEYWORDS: [&str; 14] = [
    "political",
    "bank",
    "pmc",
    "finance",
    "insurance",
    "fund",
    "investment",
    "lobbying",
    "military organization",
    "political groups",
    "media",
    "propaganda",
    "ministry",
    "agency",
];

// Per-stage output file names inside the output directory
pub const FETCH_OUTPUT: &str = "sanctioned_entities_with_inn.csv";
pub const CLEAN_OUTPUT: &str = "data_cleaned_final.csv";
pub const ENRICH_OUTPUT: &str = "top_3_suppliers_by_company.csv";
pub const MERGE_OUTPUT: &str = "merged_sections.csv";
pub const FINAL_CLEAN_OUTPUT: &str = "merged_sections_no_duplicates.csv";
pub const TRANSLATE_OUTPUT: &str = "data_request.csv";

// Two-section document markers and the per-section header line
pub const FACTORIES_MARKER: &str = "**factories**";
pub const SUPPLIERS_MARKER: &str = "**suppliers**";
pub const SECTION_HEADER: &str = "caption,innCode";

/// Default location of the translation-service credentials file,
/// relative to the working directory.
pub const DEFAULT_CREDENTIALS_FILE: &str = "translate-credentials.json";
