pub mod fallback;

use std::time::Duration;

use serde_json::{Value, json};

use crate::{ApiResult, GetField, db::Message, rooms::Room};

const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How many stored messages are replayed to the provider as context.
pub const HISTORY_WINDOW: usize = 20;

/// Where a reply came from. Selected here, at the service boundary, so the
/// caller deals in values rather than catching provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Provider,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    fn fallback(room: Room, user_text: &str) -> Reply {
        Reply {
            text: fallback::fallback_reply(room, user_text),
            source: ReplySource::Fallback,
        }
    }
}

#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
}

impl AiClient {
    /// Reads `GEMINI_API_KEY` (absent, empty, or the sample placeholder all
    /// count as unconfigured) and an optional `GEMINI_API_URL` override.
    pub fn from_env() -> anyhow::Result<AiClient> {
        let api_key = dotenv::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty() && k != "your-gemini-api-key-here");
        let api_url = dotenv::var("GEMINI_API_URL").unwrap_or(DEFAULT_API_URL.to_owned());
        AiClient::new(api_key, api_url)
    }

    pub fn new(api_key: Option<String>, api_url: String) -> anyhow::Result<AiClient> {
        let http = reqwest::ClientBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(AiClient { http, api_key, api_url })
    }

    /// Generate a reply for `user_text` in `room`. Total: a provider failure
    /// of any kind (no key, network, non-2xx, malformed body, blank text)
    /// degrades to the room's fallback pool instead of erroring.
    pub async fn generate_reply(&self, room: Room, history: &[Message], user_text: &str) -> Reply {
        let Some(api_key) = &self.api_key else {
            return Reply::fallback(room, user_text);
        };

        match self.provider_reply(api_key, room, history, user_text).await {
            Ok(text) if !text.trim().is_empty() => Reply {
                text: text.trim().to_owned(),
                source: ReplySource::Provider,
            },
            Ok(_) => {
                tracing::warn!(room = %room, "provider returned blank text, using fallback");
                Reply::fallback(room, user_text)
            }
            Err(err) => {
                tracing::warn!(room = %room, "provider call failed, using fallback: {err:#}");
                Reply::fallback(room, user_text)
            }
        }
    }

    async fn provider_reply(
        &self,
        api_key: &str,
        room: Room,
        history: &[Message],
        user_text: &str,
    ) -> ApiResult<String> {
        let response = self
            .http
            .post(format!("{}?key={api_key}", self.api_url))
            .json(&request_body(room, history, user_text))
            .send()
            .await
            .map_err(anyhow::Error::from)?
            .error_for_status()
            .map_err(anyhow::Error::from)?;

        let body: Value = response.json().await.map_err(anyhow::Error::from)?;
        extract_text(&body)
    }

    /// Startup connectivity check. Never fatal; the server runs on fallback
    /// replies when this reports false.
    pub async fn probe(&self) -> bool {
        let Some(api_key) = &self.api_key else {
            return false;
        };

        self.provider_reply(
            api_key,
            Room::Kyle,
            &[],
            "Hello, this is a test message. Please respond with just 'Hello!'",
        )
        .await
        .is_ok()
    }
}

fn request_body(room: Room, history: &[Message], user_text: &str) -> Value {
    let mut contents: Vec<Value> = history
        .iter()
        .map(|msg| {
            let role = if msg.is_ai { "model" } else { "user" };
            json!({ "role": role, "parts": [{ "text": msg.text }] })
        })
        .collect();
    contents.push(json!({ "role": "user", "parts": [{ "text": user_text }] }));

    json!({
        "systemInstruction": { "parts": [{ "text": room.persona_prompt() }] },
        "contents": contents,
    })
}

fn extract_text(body: &Value) -> ApiResult<String> {
    body.get_obj_field("candidates")?
        .as_array()
        .and_then(|candidates| candidates.first())
        .ok_or_else(|| anyhow::anyhow!("no candidates in response"))?
        .get_obj_field("content")?
        .get_obj_field("parts")?
        .as_array()
        .and_then(|parts| parts.first())
        .ok_or_else(|| anyhow::anyhow!("no parts in candidate"))?
        .get_str_field("text")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_candidate_text() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hello!" }], "role": "model" },
                "finishReason": "STOP",
            }]
        });
        assert_eq!(extract_text(&body).unwrap(), "Hello!");
    }

    #[test]
    fn rejects_malformed_body() {
        assert!(extract_text(&json!({ "candidates": [] })).is_err());
        assert!(extract_text(&json!({ "error": { "code": 429 } })).is_err());
    }

    #[test]
    fn request_body_maps_history_roles() {
        let history = vec![
            Message::sample(false, "hi"),
            Message::sample(true, "Hi there! How's your day going?"),
        ];
        let body = request_body(Room::Jane, &history, "not bad");
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "not bad");
        let system = body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
        assert!(system.contains("Jane"));
    }
}
