pub mod chat;
pub mod embedding;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) fn auth_headers(
	api_key: &str,
	default_headers: &serde_json::Map<String, serde_json::Value>,
) -> Result<reqwest::header::HeaderMap> {
	let mut headers = reqwest::header::HeaderMap::new();

	headers.insert(reqwest::header::AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: format!("Default header {key} must be a string."),
			});
		};

		headers.insert(reqwest::header::HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}
