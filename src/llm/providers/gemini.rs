use crate::config::LlmConfig;
use crate::llm::models::{GenerateContentRequest, GenerateContentResponse};
use crate::llm::{LlmError, TextGenerator};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info};

pub struct GeminiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::ConfigError(
                "API key is required for the Gemini provider".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.api_url.trim_end_matches('/'),
            config.model
        );

        info!("Gemini provider initialized with model {}", config.model);

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

fn is_language_tag(line: &str) -> bool {
    const STATEMENT_KEYWORDS: [&str; 4] = ["SELECT", "INSERT", "UPDATE", "DELETE"];
    !line.contains(' ')
        && !STATEMENT_KEYWORDS
            .iter()
            .any(|keyword| line.eq_ignore_ascii_case(keyword))
}

/// Removes a single Markdown code fence wrapped around the answer.
/// Text without a fence is returned trimmed but otherwise untouched.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };

    // Drop the language tag on the opening line, e.g. ```sql
    match body.split_once('\n') {
        Some((tag, sql)) if is_language_tag(tag.trim()) => sql.trim(),
        _ => body.trim(),
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateContentRequest::from_prompt(prompt, 0.1);

        debug!("Sending request to Gemini model {}", self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = match response.text().await {
                Ok(body) => format!(" - Response body: {}", body),
                Err(_) => String::new(),
            };

            error!("Gemini API responded with status code: {}{}", status, error_body);
            return Err(LlmError::ResponseError(format!(
                "API responded with status code: {}",
                status
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| LlmError::ResponseError(format!("Failed to read response body: {}", e)))?;

        let parsed: GenerateContentResponse = serde_json::from_str(&response_text)
            .map_err(|e| LlmError::ResponseError(format!("Failed to parse response: {}", e)))?;

        let content = parsed.text().ok_or_else(|| {
            let reason = parsed
                .prompt_feedback
                .as_ref()
                .and_then(|feedback| feedback.block_reason.clone())
                .or_else(|| {
                    parsed
                        .candidates
                        .first()
                        .and_then(|candidate| candidate.finish_reason.clone())
                })
                .unwrap_or_else(|| "no candidates".to_string());
            LlmError::ResponseError(format!("Response contained no text ({})", reason))
        })?;

        debug!("Raw response from Gemini: {}", content);
        Ok(strip_code_fence(&content).to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}
