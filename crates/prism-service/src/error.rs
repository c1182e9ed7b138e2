#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Unauthorized: {message}")]
	Unauthorized { message: String },
	#[error("Embedding failure: {message}")]
	Embedding { message: String },
	#[error("Retrieval failure: {message}")]
	Retrieval { message: String },
	#[error("LLM request timed out after {timeout_ms} ms.")]
	LlmTimeout { timeout_ms: u64 },
	#[error("LLM error: {message}")]
	Llm { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}

impl From<prism_storage::Error> for Error {
	fn from(err: prism_storage::Error) -> Self {
		match err {
			prism_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			prism_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}
