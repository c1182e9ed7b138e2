pub mod cache_key;
pub mod citation;
pub mod filter;
pub mod fusion;
pub mod grouping;

use uuid::Uuid;

/// Which retrieval pass produced a fused hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
	Dense,
	Lexical,
	Hybrid,
	DenseFallback,
	LexicalFallback,
	HybridFallback,
}
impl SourceTag {
	pub fn into_fallback(self) -> Self {
		match self {
			Self::Dense => Self::DenseFallback,
			Self::Lexical => Self::LexicalFallback,
			Self::Hybrid => Self::HybridFallback,
			other => other,
		}
	}

	pub fn is_fallback(self) -> bool {
		matches!(self, Self::DenseFallback | Self::LexicalFallback | Self::HybridFallback)
	}
}

/// A single chunk returned by one retriever, before fusion.
///
/// `score` is cosine similarity for dense hits and the lexical rank measure
/// for lexical hits. `total_chunks` is attached by the storage layer; zero
/// means the total is unknown.
#[derive(Debug, Clone)]
pub struct ChunkHit {
	pub chunk_id: Uuid,
	pub document_id: Uuid,
	pub document_title: String,
	pub document_type: Option<String>,
	pub chunk_text: String,
	pub chunk_index: i32,
	pub metadata: serde_json::Value,
	pub score: f32,
	pub total_chunks: i32,
}

/// A chunk after reciprocal rank fusion, carrying per-source provenance.
#[derive(Debug, Clone)]
pub struct FusedHit {
	pub chunk_id: Uuid,
	pub document_id: Uuid,
	pub document_title: String,
	pub document_type: Option<String>,
	pub chunk_text: String,
	pub chunk_index: i32,
	pub metadata: serde_json::Value,
	pub rrf_score: f32,
	pub semantic_rank: Option<u32>,
	pub lexical_rank: Option<u32>,
	pub raw_semantic_score: Option<f32>,
	pub raw_lexical_score: Option<f32>,
	pub source: SourceTag,
	pub total_chunks: i32,
}

/// Fused hits collapsed to one entry per document.
#[derive(Debug, Clone)]
pub struct DocumentGroup {
	pub document_id: Uuid,
	pub document_title: String,
	pub document_type: Option<String>,
	pub chunks: Vec<FusedHit>,
	pub best_rrf_score: f32,
	pub best_raw_similarity: f32,
	pub relevance_density: f32,
}
