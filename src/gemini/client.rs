use crate::config::GeminiSettings;
use crate::gemini::{
    GeminiContent, GeminiErrorResponse, GeminiGenerationConfig, GeminiRequest, GeminiResponse,
};
use crate::models::{ConversationTurn, Part, Role};
use crate::provider::{ChatSession, GenerationProvider, ProviderError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    http_client: Arc<reqwest::Client>,
    settings: Arc<GeminiSettings>,
}

impl GeminiProvider {
    pub fn new(http_client: Arc<reqwest::Client>, settings: GeminiSettings) -> Self {
        Self { http_client, settings: Arc::new(settings) }
    }

    // The key goes in the query string; keep it out of this value so the URL
    // can be logged.
    fn build_target_url(settings: &GeminiSettings) -> String {
        let api_base = &settings.api_base;
        let path = format!("models/{}:generateContent", settings.model);
        if api_base.ends_with('/') {
            format!("{}{}", api_base, path)
        } else {
            format!("{}/{}", api_base, path)
        }
    }
}

impl GenerationProvider for GeminiProvider {
    fn start_chat(
        &self,
        history: Vec<ConversationTurn>,
    ) -> Result<Box<dyn ChatSession>, ProviderError> {
        if !self.settings.has_api_key() {
            return Err(ProviderError::NotConfigured("GEMINI_API_KEY is not set".to_string()));
        }
        Ok(Box::new(GeminiSession {
            http_client: self.http_client.clone(),
            settings: self.settings.clone(),
            history,
        }))
    }
}

pub struct GeminiSession {
    http_client: Arc<reqwest::Client>,
    settings: Arc<GeminiSettings>,
    history: Vec<ConversationTurn>,
}

impl GeminiSession {
    fn build_request(&self, parts: &[Part]) -> GeminiRequest {
        let mut contents: Vec<GeminiContent> =
            self.history.iter().cloned().map(GeminiContent::from).collect();
        contents.push(GeminiContent::user(parts.to_vec()));

        GeminiRequest {
            contents,
            system_instruction: self
                .settings
                .system_instruction
                .as_deref()
                .map(|s| GeminiContent::text(None, s)),
            generation_config: self
                .settings
                .generation_config
                .as_ref()
                .map(GeminiGenerationConfig::from),
        }
    }
}

#[async_trait]
impl ChatSession for GeminiSession {
    async fn send_message(&mut self, parts: Vec<Part>) -> Result<String, ProviderError> {
        let request = self.build_request(&parts);
        let target_url = GeminiProvider::build_target_url(&self.settings);
        let api_key = self.settings.api_key.as_deref().unwrap_or_default();

        info!("Forwarding chat to: {} ({} turns)", target_url, request.contents.len());
        debug!("request body: {}", serde_json::to_string(&request).unwrap_or_default());

        let response = self
            .http_client
            .post(&target_url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Gemini request failed with status {}: {}", status, body);
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::Api { status: status.as_u16(), message });
        }

        let body: GeminiResponse = response.json().await?;
        if let Some(usage) = &body.usage_metadata {
            debug!(
                "usage: prompt={:?} candidates={:?} total={:?}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        let text = match body.text() {
            Some(text) => text,
            None if body.candidates.is_empty() => {
                let reason = body
                    .prompt_feedback
                    .and_then(|f| f.block_reason)
                    .unwrap_or_else(|| "no candidates returned".to_string());
                return Err(ProviderError::Blocked(reason));
            }
            None => {
                let reason = body
                    .finish_reason()
                    .map(|r| format!("{:?}", r))
                    .unwrap_or_else(|| "unspecified".to_string());
                return Err(ProviderError::EmptyResponse(reason));
            }
        };

        self.history.push(ConversationTurn::new(Role::User, parts));
        self.history.push(ConversationTurn::new(Role::Model, vec![Part::text(text.clone())]));
        Ok(text)
    }

    fn history(&self) -> &[ConversationTurn] {
        &self.history
    }
}
