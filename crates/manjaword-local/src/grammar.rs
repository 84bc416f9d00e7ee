use manjaword_core::{GrammarMatch, GrammarResponse};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::BackendError;

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<CheckMatch>,
}

#[derive(Debug, Deserialize)]
struct CheckMatch {
    message: String,
    offset: usize,
    length: usize,
    #[serde(default)]
    replacements: Vec<Replacement>,
}

#[derive(Debug, Deserialize)]
struct Replacement {
    value: String,
}

impl From<CheckResponse> for GrammarResponse {
    fn from(r: CheckResponse) -> Self {
        GrammarResponse {
            matches: r.matches.into_iter().map(GrammarMatch::from).collect(),
        }
    }
}

impl From<CheckMatch> for GrammarMatch {
    fn from(m: CheckMatch) -> Self {
        GrammarMatch {
            message: m.message,
            offset: m.offset,
            length: m.length,
            replacements: m.replacements.into_iter().map(|r| r.value).collect(),
        }
    }
}

/// Client for a LanguageTool `/v2/check` endpoint.
#[derive(Debug, Clone)]
pub struct LanguageToolClient {
    http: reqwest::Client,
    url: String,
    language: String,
}

impl LanguageToolClient {
    pub fn new(url: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            language: language.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    #[instrument(skip(self, text), fields(len = text.len()), level = "debug")]
    pub async fn check(&self, text: String) -> Result<GrammarResponse, BackendError> {
        let response = self
            .http
            .post(&self.url)
            .form(&[("text", text.as_str()), ("language", self.language.as_str())])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| BackendError::GrammarUnavailable(e.to_string()))?;

        let parsed: CheckResponse = response
            .json()
            .await
            .map_err(|e| BackendError::GrammarUnavailable(format!("malformed response: {}", e)))?;

        debug!("Grammar service returned {} match(es)", parsed.matches.len());
        Ok(parsed.into())
    }
}
