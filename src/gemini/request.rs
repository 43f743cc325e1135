use crate::config::GenerationSettings;
use crate::gemini::GeminiContent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    #[serde(rename = "generationConfig")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeminiGenerationConfig {
    #[serde(rename = "stopSequences")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(rename = "topP")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(rename = "topK")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(rename = "maxOutputTokens")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl From<&GenerationSettings> for GeminiGenerationConfig {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            stop_sequences: settings.stop_sequences.clone(),
            temperature: settings.temperature,
            top_p: settings.top_p,
            top_k: settings.top_k,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversationTurn, Part, Role};
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let history = vec![
            ConversationTurn::new(Role::User, vec![Part::text("A")]),
            ConversationTurn::new(Role::Model, vec![Part::Plain("B".to_string())]),
        ];
        let mut contents: Vec<GeminiContent> =
            history.into_iter().map(GeminiContent::from).collect();
        contents.push(GeminiContent::user(vec![Part::text("C")]));

        let request = GeminiRequest {
            contents,
            system_instruction: Some(GeminiContent::text(None, "be terse")),
            generation_config: Some(GeminiGenerationConfig {
                temperature: Some(0.5),
                ..Default::default()
            }),
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value["contents"],
            json!([
                {"role": "user", "parts": [{"text": "A"}]},
                {"role": "model", "parts": [{"text": "B"}]},
                {"role": "user", "parts": [{"text": "C"}]}
            ])
        );
        assert_eq!(value["systemInstruction"], json!({"parts": [{"text": "be terse"}]}));
        assert_eq!(value["generationConfig"], json!({"temperature": 0.5}));
    }

    #[test]
    fn test_request_omits_empty_options() {
        let request = GeminiRequest {
            contents: vec![GeminiContent::user(vec![Part::text("hi")])],
            system_instruction: None,
            generation_config: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("systemInstruction").is_none());
        assert!(value.get("generationConfig").is_none());
    }
}
