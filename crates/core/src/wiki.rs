//! Wikipedia REST summary client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{check_status, Result};
use crate::types::Language;

/// Summaries longer than this are cut and end with an ellipsis
pub const SUMMARY_MAX_CHARS: usize = 340;

/// Short encyclopedia extract for a subject; `Ok(None)` when there is none
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    async fn summary(&self, subject: &str, lang: Language) -> Result<Option<String>>;
}

#[derive(Deserialize, Debug)]
struct SummaryResponse {
    #[serde(default)]
    extract: Option<String>,
}

/// Truncate to `max` characters, appending `…` when anything was cut
pub fn truncate_summary(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}

/// Page titles use underscores for spaces
fn page_title(subject: &str) -> String {
    urlencoding::encode(&subject.trim().replace(' ', "_")).into_owned()
}

/// `https://{lang}.wikipedia.org/api/rest_v1/page/summary/{title}` client
pub struct WikipediaSummary {
    client: Client,
}

impl WikipediaSummary {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Encyclopedia for WikipediaSummary {
    async fn summary(&self, subject: &str, lang: Language) -> Result<Option<String>> {
        let url = format!(
            "https://{}.wikipedia.org/api/rest_v1/page/summary/{}",
            lang.code(),
            page_title(subject)
        );

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(subject, "no encyclopedia page");
            return Ok(None);
        }

        let resp: SummaryResponse = check_status("encyclopedia API", response).await?.json().await?;
        Ok(resp.extract.filter(|e| !e.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_summary("  Romania is a country. ", 340), "Romania is a country.");
    }

    #[test]
    fn test_truncate_long_text() {
        let text = "ă".repeat(400);
        let cut = truncate_summary(&text, SUMMARY_MAX_CHARS);
        assert!(cut.ends_with('…'));
        assert_eq!(cut.chars().count(), SUMMARY_MAX_CHARS + 1);
    }

    #[test]
    fn test_truncate_exact_length() {
        let text = "a".repeat(SUMMARY_MAX_CHARS);
        assert_eq!(truncate_summary(&text, SUMMARY_MAX_CHARS), text);
    }

    #[test]
    fn test_page_title_encoding() {
        assert_eq!(page_title("New York"), "New_York");
        assert_eq!(page_title("București"), "Bucure%C8%99ti");
    }

    #[test]
    fn test_parse_summary() {
        let resp: SummaryResponse = serde_json::from_str(
            r#"{"type":"standard","title":"Romania","extract":"Romania is a country in Europe."}"#,
        )
        .unwrap();
        assert_eq!(resp.extract.as_deref(), Some("Romania is a country in Europe."));
    }
}
