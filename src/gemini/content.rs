use crate::models::{ConversationTurn, InlineData, Part, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>, // "user" or "model"
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiInlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeminiPart {
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    // Function calls and the like are not relayed, only tolerated in replies
    Other(serde_json::Value),
}

impl GeminiPart {
    /// Visible answer text, skipping thought summaries.
    pub fn answer_text(&self) -> Option<&str> {
        match self {
            GeminiPart::Text { text, thought } if *thought != Some(true) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl From<Part> for GeminiPart {
    fn from(part: Part) -> Self {
        match part {
            Part::Text { text } | Part::Plain(text) => GeminiPart::Text { text, thought: None },
            Part::InlineData { inline_data: InlineData { mime_type, data } } => {
                GeminiPart::InlineData { inline_data: GeminiInlineData { mime_type, data } }
            }
        }
    }
}

impl GeminiContent {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some(String::from(Role::User)),
            parts: parts.into_iter().map(GeminiPart::from).collect(),
        }
    }

    pub fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![GeminiPart::Text { text: text.to_string(), thought: None }],
        }
    }
}

impl From<ConversationTurn> for GeminiContent {
    fn from(turn: ConversationTurn) -> Self {
        Self {
            role: Some(turn.role.into()),
            parts: turn.parts.into_iter().map(GeminiPart::from).collect(),
        }
    }
}
