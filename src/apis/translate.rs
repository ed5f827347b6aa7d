use crate::common::constants::TRANSLATE_URL;
use crate::common::error::{PipelineError, Result};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tracing::instrument;

/// Client for the machine-translation service. Returned text arrives
/// HTML-entity-encoded and is decoded before use.
pub struct TranslateClient {
    client: reqwest::Client,
    api_key: String,
}

impl TranslateClient {
    /// Reads the API key from a credentials file: either a JSON object
    /// with an `api_key` field or the bare key on its own.
    pub fn from_credentials_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read credentials file '{}': {e}",
                path.display()
            ))
        })?;

        let api_key = match serde_json::from_str::<Value>(&raw) {
            Ok(value) => value["api_key"]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| {
                    PipelineError::Config(format!(
                        "credentials file '{}' has no 'api_key' field",
                        path.display()
                    ))
                })?,
            Err(_) => raw.trim().to_string(),
        };

        if api_key.is_empty() {
            return Err(PipelineError::Config(format!(
                "credentials file '{}' is empty",
                path.display()
            )));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }

    /// Translate `text` into `target_language`. Failures propagate: the
    /// translate stage has no skip path.
    #[instrument(skip(self, text))]
    pub async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let response = self
            .client
            .post(TRANSLATE_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "q": text, "target": target_language }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Api {
                message: format!("translation request returned {status}: {body}"),
            });
        }

        let data: Value = response.json().await?;
        let translated = data["data"]["translations"][0]["translatedText"]
            .as_str()
            .ok_or_else(|| PipelineError::Api {
                message: "translation response missing translatedText".to_string(),
            })?;

        Ok(unescape_html(translated))
    }
}

/// True when the text already contains Cyrillic and needs no translation.
pub fn contains_cyrillic(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё'))
}

/// Decode the HTML entities the translation service escapes into its
/// output: the common named entities plus `&#NNN;` / `&#xHH;` numeric
/// forms. Unrecognized sequences pass through unchanged.
pub fn unescape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let Some(end) = rest.find(';') else { break };
        let entity = &rest[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => entity.strip_prefix('#').and_then(|num| {
                let code = if let Some(hex) =
                    num.strip_prefix('x').or_else(|| num.strip_prefix('X'))
                {
                    u32::from_str_radix(hex, 16).ok()
                } else {
                    num.parse::<u32>().ok()
                };
                code.and_then(char::from_u32)
            }),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_cyrillic_text() {
        assert!(contains_cyrillic("Рога и копыта"));
        assert!(contains_cyrillic("завод Ёлочка"));
        assert!(!contains_cyrillic("Acme Corp"));
        assert!(!contains_cyrillic(""));
    }

    #[test]
    fn unescapes_named_entities() {
        assert_eq!(unescape_html("Smith &amp; Wesson"), "Smith & Wesson");
        assert_eq!(unescape_html("&lt;b&gt;&quot;x&quot;&lt;/b&gt;"), "<b>\"x\"</b>");
        assert_eq!(unescape_html("O&apos;Neil"), "O'Neil");
    }

    #[test]
    fn unescapes_numeric_entities() {
        assert_eq!(unescape_html("&#1071;"), "Я");
        assert_eq!(unescape_html("&#x416;"), "Ж");
    }

    #[test]
    fn leaves_plain_and_malformed_text_alone() {
        assert_eq!(unescape_html("no entities here"), "no entities here");
        assert_eq!(unescape_html("AT&T"), "AT&T");
        assert_eq!(unescape_html("trailing &"), "trailing &");
        assert_eq!(unescape_html("&bogus;"), "&bogus;");
    }
}
