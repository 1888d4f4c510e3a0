//! Text translation via a LibreTranslate-compatible server

use async_trait::async_trait;

use crate::{Error, Result};

/// Response from the translation endpoint
#[derive(serde::Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Request body for the translation endpoint
#[derive(serde::Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

/// One entry of the server's language inventory
#[derive(serde::Deserialize)]
struct Language {
    code: String,
    #[serde(default)]
    targets: Vec<String>,
}

/// Translates text between a fixed language pair
///
/// Implementations are shared across concurrently running pipeline
/// tasks, so they take `&self`.
#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Verify the service is reachable and supports the language pair
    ///
    /// # Errors
    ///
    /// Returns error if the service is unreachable or either language
    /// is unavailable
    async fn ensure_ready(&self) -> Result<()>;

    /// Translate text from the source to the target language
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    async fn translate(&self, text: &str) -> Result<String>;

    /// Target language code
    fn target(&self) -> &str;
}

/// LibreTranslate HTTP client
pub struct Translator {
    client: reqwest::Client,
    base_url: String,
    source: String,
    target: String,
}

impl Translator {
    #[must_use]
    pub fn new(base_url: &str, source: String, target: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            source,
            target,
        }
    }
}

#[async_trait]
impl TranslationService for Translator {
    async fn ensure_ready(&self) -> Result<()> {
        let url = format!("{}/languages", self.base_url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!(error = %e, "language list request failed");
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "language list error");
            return Err(Error::Translate(format!(
                "language list error {status}: {body}"
            )));
        }

        let languages: Vec<Language> = response.json().await?;

        let source_entry = languages
            .iter()
            .find(|l| l.code == self.source)
            .ok_or_else(|| Error::UnavailableLanguage(self.source.clone()))?;

        // Older servers omit per-language targets; fall back to the
        // plain language inventory in that case
        let target_supported = if source_entry.targets.is_empty() {
            languages.iter().any(|l| l.code == self.target)
        } else {
            source_entry.targets.contains(&self.target)
        };

        if !target_supported {
            return Err(Error::UnavailableLanguage(self.target.clone()));
        }

        tracing::info!(
            source = %self.source,
            target = %self.target,
            languages = languages.len(),
            "translation service ready"
        );
        Ok(())
    }

    async fn translate(&self, text: &str) -> Result<String> {
        let url = format!("{}/translate", self.base_url);
        let request = TranslateRequest {
            q: text,
            source: &self.source,
            target: &self.target,
            format: "text",
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "translation request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "translation API error");
            return Err(Error::Translate(format!(
                "translation API error {status}: {body}"
            )));
        }

        let result: TranslateResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse translation response");
            e
        })?;

        tracing::debug!(chars = result.translated_text.len(), "translation complete");
        Ok(result.translated_text)
    }

    fn target(&self) -> &str {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_translation_response() {
        let reply: TranslateResponse =
            serde_json::from_str(r#"{"translatedText": "سلام دنیا"}"#).unwrap();
        assert_eq!(reply.translated_text, "سلام دنیا");
    }

    #[test]
    fn test_parses_language_inventory_without_targets() {
        let languages: Vec<Language> =
            serde_json::from_str(r#"[{"code": "de", "name": "German"}]"#).unwrap();
        assert_eq!(languages[0].code, "de");
        assert!(languages[0].targets.is_empty());
    }

    #[test]
    fn test_request_body_shape() {
        let request = TranslateRequest {
            q: "hallo",
            source: "de",
            target: "fa",
            format: "text",
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["q"], "hallo");
        assert_eq!(body["format"], "text");
    }
}
