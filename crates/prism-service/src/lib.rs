pub mod insights;
pub mod prompts;
pub mod retrieve;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use prism_config::{ChatProviderConfig, Config, EmbeddingProviderConfig};
use prism_storage::db::Db;

pub use error::Error;
pub use insights::{
	DirectAnswer, DocumentSummary, InsightBundle, InsightBreakdown, InsightMetrics, InsightType,
	InsightsRequest, InsightsResponse, QuestionCategory, RelatedQuestion,
};
pub use retrieve::{
	ChunkResult, DocumentResult, FallbackInfo, PerformanceMetrics, RequestDateRange,
	RequestFilters, RetrieveRequest, RetrieveResponse,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider: Send + Sync {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, prism_providers::Result<Vec<Vec<f32>>>>;
}

pub trait ChatProvider: Send + Sync {
	fn chat_json<'a>(
		&'a self,
		cfg: &'a ChatProviderConfig,
		messages: &'a [serde_json::Value],
		temperature: f32,
		priority: bool,
	) -> BoxFuture<'a, prism_providers::Result<serde_json::Value>>;
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, prism_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(prism_providers::embedding::embed(cfg, texts))
	}
}

impl ChatProvider for DefaultProviders {
	fn chat_json<'a>(
		&'a self,
		cfg: &'a ChatProviderConfig,
		messages: &'a [serde_json::Value],
		temperature: f32,
		priority: bool,
	) -> BoxFuture<'a, prism_providers::Result<serde_json::Value>> {
		Box::pin(prism_providers::chat::chat_json(cfg, messages, temperature, priority))
	}
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub chat: Arc<dyn ChatProvider>,
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, chat: Arc<dyn ChatProvider>) -> Self {
		Self { embedding, chat }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), chat: provider }
	}
}

pub struct PrismService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
}

impl PrismService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, db, providers }
	}
}
