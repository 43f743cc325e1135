use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    User,
    Model,
    // Unknown roles are forwarded as-is and left for the provider to judge
    Other(String),
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Role::User,
            "model" => Role::Model,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::User => "user".to_string(),
            Role::Model => "model".to_string(),
            Role::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineData {
    #[serde(rename = "mimeType", alias = "mime_type")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: InlineData,
    },
    /// A bare string, accepted as shorthand for `{"text": ...}`.
    Plain(String),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl ConversationTurn {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub contents: Vec<ConversationTurn>,
}

impl ChatRequest {
    /// Splits off the newest message. The caller has already checked that
    /// `contents` is not empty.
    pub fn into_history_and_latest(mut self) -> Option<(Vec<ConversationTurn>, Vec<Part>)> {
        let latest = self.contents.pop()?;
        Some((self.contents, latest.parts))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_passthrough() {
        let turns: Vec<ConversationTurn> = serde_json::from_value(json!([
            {"role": "user", "parts": [{"text": "a"}]},
            {"role": "model", "parts": [{"text": "b"}]},
            {"role": "system", "parts": [{"text": "c"}]}
        ]))
        .unwrap();
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::Model);
        assert_eq!(turns[2].role, Role::Other("system".to_string()));

        let back = serde_json::to_value(&turns[2]).unwrap();
        assert_eq!(back["role"], "system");
    }

    #[test]
    fn test_part_shapes() {
        let turn: ConversationTurn = serde_json::from_value(json!({
            "role": "user",
            "parts": [
                {"text": "look at this"},
                "and this",
                {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
            ]
        }))
        .unwrap();
        assert_eq!(turn.parts[0], Part::text("look at this"));
        assert_eq!(turn.parts[1], Part::Plain("and this".to_string()));
        match &turn.parts[2] {
            Part::InlineData { inline_data } => assert_eq!(inline_data.mime_type, "image/png"),
            other => panic!("unexpected part: {:?}", other),
        }
    }

    #[test]
    fn test_split_history_and_latest() {
        let request: ChatRequest = serde_json::from_value(json!({
            "contents": [
                {"role": "user", "parts": [{"text": "A"}]},
                {"role": "model", "parts": [{"text": "B"}]},
                {"role": "user", "parts": [{"text": "C"}]}
            ]
        }))
        .unwrap();
        let (history, latest) = request.into_history_and_latest().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, Role::Model);
        assert_eq!(latest, vec![Part::text("C")]);
    }

    #[test]
    fn test_split_empty_contents() {
        let request = ChatRequest { contents: vec![] };
        assert!(request.into_history_and_latest().is_none());
    }
}
