use crate::error::RelayError;
use crate::models::{ChatRequest, ChatResponse, ConversationTurn};
use crate::provider::GenerationProvider;
use crate::request_id::RequestId;
use crate::server::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension, State},
    Json,
};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Validates the raw body. Shape problems the caller can fix are 400s;
/// turns that do not look like turns are a processing failure.
pub fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, RelayError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| RelayError::MalformedRequest(e.to_string()))?;

    let contents = match value {
        Value::Object(mut map) => map.remove("contents").ok_or(RelayError::MissingField)?,
        _ => return Err(RelayError::MissingField),
    };

    match &contents {
        Value::Null => return Err(RelayError::MissingField),
        Value::Array(items) if items.is_empty() => return Err(RelayError::EmptyContents),
        Value::Array(_) => {}
        _ => {
            return Err(RelayError::InvalidHistory(
                "'contents' must be a list of messages".to_string(),
            ));
        }
    }

    let contents: Vec<ConversationTurn> =
        serde_json::from_value(contents).map_err(|e| RelayError::InvalidHistory(e.to_string()))?;
    if let Some(index) = contents.iter().position(|turn| turn.parts.is_empty()) {
        return Err(RelayError::InvalidHistory(format!("message {} has no parts", index)));
    }

    Ok(ChatRequest { contents })
}

/// Opens a one-off session seeded with everything but the last turn, sends
/// the last turn and returns the reply text.
pub async fn relay_chat(
    provider: &dyn GenerationProvider,
    request: ChatRequest,
    timeout: Duration,
) -> Result<String, RelayError> {
    let (history, latest) =
        request.into_history_and_latest().ok_or(RelayError::EmptyContents)?;
    debug!("Starting provider session with {} prior turns", history.len());

    let mut session = provider.start_chat(history)?;
    let text = tokio::time::timeout(timeout, session.send_message(latest))
        .await
        .map_err(|_| RelayError::Timeout(timeout))??;
    debug!("Session closed after {} turns", session.history().len());
    Ok(text)
}

#[axum_macros::debug_handler]
pub async fn chat(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ChatResponse>, RelayError> {
    let body = body.map_err(|rejection| RelayError::UnreadableBody {
        status: rejection.status(),
        message: rejection.body_text(),
    })?;
    let request = parse_chat_request(&body)?;
    info!("Chat request {} with {} messages", request_id.0, request.contents.len());

    let response = relay_chat(state.provider.as_ref(), request, state.timeout).await?;
    debug!("Reply length: {} chars", response.chars().count());
    Ok(Json(ChatResponse { response }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Part, Role};
    use crate::provider::stub::{StubBehavior, StubProvider};
    use serde_json::json;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn single_turn(text: &str) -> ChatRequest {
        ChatRequest { contents: vec![ConversationTurn::new(Role::User, vec![Part::text(text)])] }
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = parse_chat_request(b"not json at all").unwrap_err();
        assert!(matches!(err, RelayError::MalformedRequest(_)));
        assert!(matches!(parse_chat_request(b"").unwrap_err(), RelayError::MalformedRequest(_)));
    }

    #[test]
    fn test_parse_missing_contents() {
        let cases = [
            json!({}),
            json!({"messages": []}),
            json!(null),
            json!([1, 2]),
            json!("contents"),
            json!({"contents": null}),
        ];
        for value in cases {
            let err = parse_chat_request(&body(value.clone())).unwrap_err();
            assert!(matches!(err, RelayError::MissingField), "{} gave {:?}", value, err);
        }
    }

    #[test]
    fn test_parse_empty_contents() {
        let err = parse_chat_request(&body(json!({"contents": []}))).unwrap_err();
        assert!(matches!(err, RelayError::EmptyContents));
    }

    #[test]
    fn test_parse_malformed_history() {
        let cases = [
            json!({"contents": "hello"}),
            json!({"contents": [{"parts": [{"text": "no role"}]}]}),
            json!({"contents": [{"role": "user", "parts": [{"image": 1}]}]}),
            json!({"contents": [{"role": "user", "parts": []}]}),
        ];
        for value in cases {
            let err = parse_chat_request(&body(value.clone())).unwrap_err();
            assert!(matches!(err, RelayError::InvalidHistory(_)), "{} gave {:?}", value, err);
        }
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let request = parse_chat_request(&body(json!({
            "contents": [{"role": "user", "parts": [{"text": "Hi"}]}],
            "generationConfig": {"temperature": 1.0}
        })))
        .unwrap();
        assert_eq!(request.contents.len(), 1);
    }

    #[tokio::test]
    async fn test_relay_splits_history_and_latest() {
        let provider = StubProvider::replying("D");
        let request = parse_chat_request(&body(json!({
            "contents": [
                {"role": "user", "parts": [{"text": "A"}]},
                {"role": "model", "parts": [{"text": "B"}]},
                {"role": "user", "parts": [{"text": "C"}]}
            ]
        })))
        .unwrap();

        let text = relay_chat(&provider, request, Duration::from_secs(1)).await.unwrap();
        assert_eq!(text, "D");

        let calls = provider.recorded();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].history,
            vec![
                ConversationTurn::new(Role::User, vec![Part::text("A")]),
                ConversationTurn::new(Role::Model, vec![Part::text("B")]),
            ]
        );
        assert_eq!(calls[0].message, vec![Part::text("C")]);
    }

    #[tokio::test]
    async fn test_relay_single_turn_has_empty_history() {
        let provider = StubProvider::new(StubBehavior::Echo);
        let request = single_turn("ping");

        assert_eq!(relay_chat(&provider, request, Duration::from_secs(1)).await.unwrap(), "ping");
        assert!(provider.recorded()[0].history.is_empty());
    }

    #[tokio::test]
    async fn test_relay_timeout() {
        let provider =
            StubProvider::new(StubBehavior::Delay(Duration::from_secs(5), "late".to_string()));
        let request = single_turn("hi");

        let err = relay_chat(&provider, request, Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, RelayError::Timeout(d) if d == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_relay_provider_failure() {
        let provider = StubProvider::new(StubBehavior::Fail("quota exceeded".to_string()));
        let request = single_turn("hi");

        let err = relay_chat(&provider, request, Duration::from_secs(1)).await.unwrap_err();
        assert_eq!(err.to_string(), "API error (403): quota exceeded");
    }
}
