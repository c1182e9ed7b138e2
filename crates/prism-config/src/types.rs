use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub insights: Insights,
	pub providers: Providers,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	/// Dense-retrieval similarity floor.
	pub similarity_threshold: f32,
	/// Per-retriever result limit.
	pub max_chunks: u32,
	/// Reciprocal rank fusion constant.
	pub rrf_k: u32,
	/// Filtered result count below which the broadening fallback fires.
	pub min_results_threshold: usize,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self { similarity_threshold: 0.6, max_chunks: 50, rrf_k: 10, min_results_threshold: 3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Insights {
	pub cache_ttl_seconds: i64,
}
impl Default for Insights {
	fn default() -> Self {
		Self { cache_ttl_seconds: 86_400 }
	}
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub chat: ChatProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	#[serde(default = "default_embedding_dimensions")]
	pub dimensions: u32,
	#[serde(default = "default_embedding_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChatProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	#[serde(default = "default_chat_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Security {
	/// Bearer tokens that authenticate as internal service callers.
	pub service_tokens: Vec<String>,
	/// Static bearer token to caller id bindings for user callers.
	pub static_identities: HashMap<String, String>,
}

fn default_embedding_dimensions() -> u32 {
	384
}

fn default_embedding_timeout_ms() -> u64 {
	5_000
}

fn default_chat_timeout_ms() -> u64 {
	15_000
}
