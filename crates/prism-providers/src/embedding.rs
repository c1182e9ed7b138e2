use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result, auth_headers};

/// Embeds a batch of texts, returning one vector per input in input order.
pub async fn embed(
	cfg: &prism_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
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
	let vectors = parse_embedding_response(json)?;

	for vector in &vectors {
		if vector.len() != cfg.dimensions as usize {
			return Err(Error::InvalidResponse {
				message: format!(
					"Embedding dimension {} does not match configured dimensions {}.",
					vector.len(),
					cfg.dimensions
				),
			});
		}
	}

	Ok(vectors)
}

/// Scales a vector to unit length in place. Zero vectors are left unchanged.
pub fn l2_normalize(vector: &mut [f32]) {
	let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm > 0.0 {
		for value in vector.iter_mut() {
			*value /= norm;
		}
	}
}

fn classify(err: reqwest::Error, timeout_ms: u64) -> Error {
	if err.is_timeout() { Error::Timeout { timeout_ms } } else { Error::Reqwest(err) }
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;

	if data.is_empty() {
		return Err(Error::InvalidResponse {
			message: "Embedding response contains no vectors.".to_string(),
		});
	}

	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index =
			item.get("index").and_then(|v| v.as_u64()).map(|v| v as usize).unwrap_or(fallback_index);
		let embedding = item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
			Error::InvalidResponse { message: "Embedding item missing embedding array.".to_string() }
		})?;

		if embedding.is_empty() {
			return Err(Error::InvalidResponse {
				message: "Embedding item contains an empty vector.".to_string(),
			});
		}

		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".to_string(),
			})?;

			vec.push(number as f32);
		}

		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_embeddings_in_index_order() {
		let json = serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});
		let parsed = parse_embedding_response(json).expect("parse failed");

		assert_eq!(parsed.len(), 2);
		assert_eq!(parsed[0], vec![0.5, 1.5]);
		assert_eq!(parsed[1], vec![2.0, 3.0]);
	}

	#[test]
	fn rejects_empty_and_malformed_payloads() {
		assert!(parse_embedding_response(serde_json::json!({})).is_err());
		assert!(parse_embedding_response(serde_json::json!({ "data": [] })).is_err());
		assert!(
			parse_embedding_response(serde_json::json!({ "data": [{ "embedding": [] }] })).is_err()
		);
		assert!(
			parse_embedding_response(serde_json::json!({ "data": [{ "embedding": ["x"] }] }))
				.is_err()
		);
	}

	#[test]
	fn normalizes_to_unit_length() {
		let mut vector = vec![3.0, 4.0];

		l2_normalize(&mut vector);

		assert!((vector[0] - 0.6).abs() < 1e-6);
		assert!((vector[1] - 0.8).abs() < 1e-6);

		let mut zero = vec![0.0, 0.0];

		l2_normalize(&mut zero);

		assert_eq!(zero, vec![0.0, 0.0]);
	}
}
