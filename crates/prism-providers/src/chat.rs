use std::time::Duration;

use serde_json::Value;

use crate::{Error, Result, auth_headers};

/// Issues a JSON-mode chat completion and returns the parsed JSON payload
/// from the first choice. `priority` attaches a priority-tier hint for the
/// backend's scheduler.
pub async fn chat_json(
	cfg: &prism_config::ChatProviderConfig,
	messages: &[Value],
	temperature: f32,
	priority: bool,
) -> Result<Value> {
	let client = reqwest::Client::builder()
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut body = serde_json::json!({
		"model": cfg.model,
		"temperature": temperature,
		"response_format": { "type": "json_object" },
		"messages": messages,
	});

	if priority {
		body["service_tier"] = Value::String("priority".to_string());
	}

	let res = client
		.post(&url)
		.headers(auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await
		.map_err(|err| classify(err, cfg.timeout_ms))?;
	let status = res.status();

	if !status.is_success() {
		let body = res.text().await.unwrap_or_default();

		return Err(Error::Status { status: status.as_u16(), body });
	}

	let json: Value = res.json().await.map_err(|err| classify(err, cfg.timeout_ms))?;

	parse_chat_content(json)
}

fn classify(err: reqwest::Error, timeout_ms: u64) -> Error {
	if err.is_timeout() { Error::Timeout { timeout_ms } } else { Error::Reqwest(err) }
}

fn parse_chat_content(json: Value) -> Result<Value> {
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		return serde_json::from_str(content).map_err(|_| Error::InvalidResponse {
			message: "Chat completion content is not valid JSON.".to_string(),
		});
	}

	// Some backends return the JSON object directly instead of wrapping it
	// in a chat envelope.
	if json.get("choices").is_none() && json.is_object() {
		return Ok(json);
	}

	Err(Error::InvalidResponse {
		message: "Chat completion response is missing JSON content.".to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::parse_chat_content;

	#[test]
	fn parses_choice_content_json() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "{\"answer_markdown\": \"ok\"}" } }
			]
		});
		let parsed = parse_chat_content(json).expect("parse failed");

		assert_eq!(parsed["answer_markdown"], "ok");
	}

	#[test]
	fn passes_bare_objects_through() {
		let json = serde_json::json!({ "questions": [] });
		let parsed = parse_chat_content(json).expect("parse failed");

		assert!(parsed.get("questions").is_some());
	}

	#[test]
	fn rejects_non_json_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "plain prose, not json" } }
			]
		});

		assert!(parse_chat_content(json).is_err());
	}
}
