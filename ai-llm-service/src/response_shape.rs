//! Single normalization step for completion payloads.
//!
//! Providers answer in a handful of shapes. Every client in this crate decodes
//! the body into a [`serde_json::Value`] and hands it to [`normalize_completion`],
//! which returns one canonical `String` or a
//! [`ProviderErrorKind::UnrecognizedShape`] error.
//!
//! Accepted shapes:
//! - plain JSON string: `"text"`
//! - Ollama generate: `{ "response": "text" }`
//! - mapping with a text field: `{ "text": "text" }`
//! - structured message: `{ "message": { "content": "text" } }`
//! - OpenAI chat: `{ "choices": [ { "message": { "content": "text" } } ] }`

use serde_json::Value;

use crate::error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind};

/// Extracts the completion text from a decoded provider body.
///
/// # Errors
/// - [`ProviderErrorKind::EmptyChoices`] when `choices` is present but carries
///   no message content.
/// - [`ProviderErrorKind::UnrecognizedShape`] for anything else that does not
///   match a known shape.
/// - [`ProviderErrorKind::EmptyCompletion`] when the text is blank.
pub fn normalize_completion(provider: Provider, body: &Value) -> Result<String, AiLlmError> {
    let text = extract_text(provider, body)?;
    if text.trim().is_empty() {
        return Err(ProviderError::new(provider, ProviderErrorKind::EmptyCompletion).into());
    }
    Ok(text)
}

fn extract_text(provider: Provider, body: &Value) -> Result<String, AiLlmError> {
    if let Some(text) = body.as_str() {
        return Ok(text.to_string());
    }

    let Some(obj) = body.as_object() else {
        return Err(unrecognized(provider, body));
    };

    for key in ["response", "text"] {
        if let Some(text) = obj.get(key).and_then(Value::as_str) {
            return Ok(text.to_string());
        }
    }

    if let Some(text) = obj.get("message").and_then(message_content) {
        return Ok(text);
    }

    if let Some(choices) = obj.get("choices").and_then(Value::as_array) {
        return choices
            .iter()
            .find_map(|c| {
                c.get("message")
                    .and_then(message_content)
                    .or_else(|| c.get("text").and_then(Value::as_str).map(str::to_string))
            })
            .ok_or_else(|| ProviderError::new(provider, ProviderErrorKind::EmptyChoices).into());
    }

    Err(unrecognized(provider, body))
}

fn message_content(msg: &Value) -> Option<String> {
    msg.get("content")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn unrecognized(provider: Provider, body: &Value) -> AiLlmError {
    let kind = match body {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(m) => {
            let keys: Vec<&str> = m.keys().map(String::as_str).take(8).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
    };
    ProviderError::new(provider, ProviderErrorKind::UnrecognizedShape(kind)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(body: Value) -> String {
        normalize_completion(Provider::OpenAI, &body).unwrap()
    }

    #[test]
    fn accepts_every_known_shape() {
        assert_eq!(ok(json!("plain")), "plain");
        assert_eq!(ok(json!({ "response": "ollama", "done": true })), "ollama");
        assert_eq!(ok(json!({ "text": "mapped" })), "mapped");
        assert_eq!(
            ok(json!({ "message": { "role": "assistant", "content": "chat" } })),
            "chat"
        );
        assert_eq!(
            ok(json!({ "choices": [ { "message": { "content": null } }, { "message": { "content": "second" } } ] })),
            "second"
        );
    }

    #[test]
    fn empty_choices_is_its_own_error() {
        let err = normalize_completion(Provider::OpenAI, &json!({ "choices": [] })).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError { kind: ProviderErrorKind::EmptyChoices, .. })
        ));
    }

    #[test]
    fn blank_text_is_rejected() {
        for body in [json!(""), json!({ "response": "  \n" }), json!({ "message": { "content": "" } })] {
            let err = normalize_completion(Provider::Ollama, &body).unwrap_err();
            assert!(matches!(
                err,
                AiLlmError::Provider(ProviderError { kind: ProviderErrorKind::EmptyCompletion, .. })
            ));
        }
    }

    #[test]
    fn unknown_shapes_fail_loudly() {
        let err = normalize_completion(Provider::Ollama, &json!({ "output": 1 })).unwrap_err();
        match err {
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::UnrecognizedShape(detail),
                provider,
            }) => {
                assert_eq!(provider, Provider::Ollama);
                assert!(detail.contains("output"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(normalize_completion(Provider::Ollama, &json!(42)).is_err());
    }
}
