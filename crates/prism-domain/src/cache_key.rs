use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use uuid::Uuid;

/// Derives the content address for an insight bundle:
/// `<insight_type>:<base64url(query)>:<sorted document ids joined by ",">`.
pub fn derive(insight_type: &str, query: &str, document_ids: &[Uuid]) -> String {
	let mut ids: Vec<String> = document_ids.iter().map(Uuid::to_string).collect();

	ids.sort();

	format!("{insight_type}:{}:{}", URL_SAFE_NO_PAD.encode(query.as_bytes()), ids.join(","))
}
