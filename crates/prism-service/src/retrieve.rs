use std::time::Instant;

use prism_domain::{
	ChunkHit, DocumentGroup, FusedHit, SourceTag,
	filter::{self, DateRange, SearchFilters},
	fusion, grouping,
};
use prism_storage::models::ChunkSearchRow;
use tracing::warn;
use uuid::Uuid;

use crate::{Error, PrismService, Result};

/// Fallback relaxation: how much the similarity floor drops, and its hard
/// minimum.
const FALLBACK_THRESHOLD_DELTA: f32 = 0.2;
const FALLBACK_THRESHOLD_FLOOR: f32 = 0.3;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RetrieveRequest {
	pub user_query: String,
	#[serde(default)]
	pub filters: Option<RequestFilters>,
	#[serde(default)]
	pub limit: Option<u32>,
	#[serde(default)]
	pub min_similarity: Option<f32>,
	#[serde(default)]
	pub include_public_only: Option<bool>,
	#[serde(default)]
	pub enable_fallback: Option<bool>,
	#[serde(default)]
	pub enable_density_calc: Option<bool>,
	#[serde(default)]
	pub debug: Option<bool>,
	/// Only honored for internal service callers.
	#[serde(default)]
	pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RequestFilters {
	#[serde(default)]
	pub document_id: Vec<String>,
	#[serde(default)]
	pub document_type: Vec<String>,
	#[serde(default, rename = "dateRange")]
	pub date_range: Option<RequestDateRange>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RequestDateRange {
	#[serde(default)]
	pub start: Option<String>,
	#[serde(default)]
	pub end: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct RetrieveResponse {
	pub results: Vec<DocumentResult>,
	pub total_documents: usize,
	pub total_chunks: usize,
	pub query: String,
	pub performance_metrics: PerformanceMetrics,
	pub fallback_info: FallbackInfo,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DocumentResult {
	pub document_id: Uuid,
	pub document_title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub document_type: Option<String>,
	pub chunks: Vec<ChunkResult>,
	pub best_rrf_score: f32,
	#[serde(default)]
	pub best_raw_similarity: f32,
	#[serde(default)]
	pub relevance_density: f32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChunkResult {
	pub chunk_id: Uuid,
	pub chunk_text: String,
	pub chunk_index: i32,
	#[serde(default)]
	pub metadata: serde_json::Value,
	pub rrf_score: f32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source_tag: Option<SourceTag>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub semantic_rank: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub lexical_rank: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub raw_semantic_score: Option<f32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub raw_lexical_score: Option<f32>,
}

#[derive(Debug, Default, serde::Serialize)]
pub struct PerformanceMetrics {
	pub embedding_generation_ms: u64,
	pub semantic_search_ms: u64,
	pub keyword_search_ms: u64,
	pub parallel_retrieval_ms: u64,
	pub rrf_fusion_ms: u64,
	pub document_grouping_ms: u64,
	/// Sum of the component timings, kept for compatibility with existing
	/// consumers. Under-reports because the two retrievers overlap.
	pub total_search_ms: u64,
	/// Wall-clock duration of the whole pipeline.
	pub wall_clock_ms: u64,
	pub partial: bool,
}

#[derive(Debug, Default, serde::Serialize)]
pub struct FallbackInfo {
	pub used: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub precision_results: Option<usize>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub fallback_results: Option<usize>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub total_combined: Option<usize>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub threshold: Option<f32>,
}

impl PrismService {
	pub async fn retrieve(
		&self,
		caller_id: Option<String>,
		req: RetrieveRequest,
	) -> Result<RetrieveResponse> {
		let query = req.user_query.trim().to_string();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "user_query is required".to_string() });
		}

		let filters = parse_filters(req.filters.as_ref())?;
		let limit = req.limit.unwrap_or(self.cfg.retrieval.max_chunks).max(1);
		let min_similarity =
			req.min_similarity.unwrap_or(self.cfg.retrieval.similarity_threshold);

		if !(0.0..=1.0).contains(&min_similarity) {
			return Err(Error::InvalidRequest {
				message: "min_similarity must be within [0, 1].".to_string(),
			});
		}

		let public_only = req.include_public_only.unwrap_or(false);
		let enable_fallback = req.enable_fallback.unwrap_or(true);
		let enable_density = req.enable_density_calc.unwrap_or(true);
		let debug = req.debug.unwrap_or(false);
		let caller = caller_id.as_deref();
		let wall_clock = Instant::now();

		// Query embedding. Failures here are fatal for the request.
		let embed_started = Instant::now();
		let query_vec = self.embed_query(&query).await?;
		let embedding_generation_ms = elapsed_ms(embed_started);

		// Both retrievers run concurrently with independent timings.
		let parallel_started = Instant::now();
		let (dense_outcome, lexical_outcome) =
			self.run_searches(&query_vec, &query, min_similarity, limit, caller, public_only).await;
		let parallel_retrieval_ms = elapsed_ms(parallel_started);
		let (dense_rows, semantic_search_ms) = dense_outcome;
		let (lexical_rows, keyword_search_ms) = lexical_outcome;
		let mut partial = false;
		let dense_hits = match dense_rows {
			Ok(rows) => rows.into_iter().map(hit_from_row).collect::<Vec<_>>(),
			Err(err) => {
				if lexical_rows.is_err() {
					return Err(Error::Retrieval {
						message: format!("Both retrievers failed: {err}."),
					});
				}

				warn!(error = %err, "Dense retrieval failed; continuing with lexical only.");
				partial = true;

				Vec::new()
			},
		};
		let lexical_hits = match lexical_rows {
			Ok(rows) => rows.into_iter().map(hit_from_row).collect::<Vec<_>>(),
			Err(err) => {
				warn!(error = %err, "Lexical retrieval failed; continuing with dense only.");
				partial = true;

				Vec::new()
			},
		};

		let fusion_started = Instant::now();
		let fused = fusion::fuse(dense_hits, lexical_hits, self.cfg.retrieval.rrf_k, false);
		let filtered = filter::apply_filters(fused, &filters);
		let rrf_fusion_ms = elapsed_ms(fusion_started);

		// Broadening fallback when the filtered result is too sparse.
		let mut fallback_info = FallbackInfo::default();
		let mut combined = filtered;

		if combined.len() < self.cfg.retrieval.min_results_threshold && enable_fallback {
			let (relaxed_threshold, relaxed_limit) = fallback_params(min_similarity, limit);
			let precision_count = combined.len();

			match self
				.run_fallback(&query_vec, &query, relaxed_threshold, relaxed_limit, caller, public_only)
				.await
			{
				Ok(fallback_hits) => {
					let added = merge_fallback(&mut combined, fallback_hits);

					fallback_info = FallbackInfo {
						used: true,
						precision_results: Some(precision_count),
						fallback_results: Some(added),
						total_combined: Some(combined.len()),
						threshold: Some(relaxed_threshold),
					};
				},
				Err(err) => {
					warn!(error = %err, "Fallback retrieval failed; returning precision results.");
				},
			}
		}

		let grouping_started = Instant::now();
		let groups = grouping::group_by_document(combined, enable_density);
		let document_grouping_ms = elapsed_ms(grouping_started);
		let total_chunks = groups.iter().map(|group| group.chunks.len()).sum();
		let results: Vec<DocumentResult> =
			groups.into_iter().map(|group| document_result(group, debug)).collect();
		let total_search_ms = embedding_generation_ms
			+ semantic_search_ms
			+ keyword_search_ms
			+ rrf_fusion_ms
			+ document_grouping_ms;

		Ok(RetrieveResponse {
			total_documents: results.len(),
			total_chunks,
			results,
			query,
			performance_metrics: PerformanceMetrics {
				embedding_generation_ms,
				semantic_search_ms,
				keyword_search_ms,
				parallel_retrieval_ms,
				rrf_fusion_ms,
				document_grouping_ms,
				total_search_ms,
				wall_clock_ms: elapsed_ms(wall_clock),
				partial,
			},
			fallback_info,
		})
	}

	async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let embeddings = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, std::slice::from_ref(&query.to_string()))
			.await
			.map_err(|err| Error::Embedding { message: err.to_string() })?;
		let mut query_vec = embeddings.into_iter().next().ok_or_else(|| Error::Embedding {
			message: "Embedding provider returned no vectors.".to_string(),
		})?;

		if query_vec.is_empty() {
			return Err(Error::Embedding {
				message: "Embedding provider returned an empty vector.".to_string(),
			});
		}
		if query_vec.len() != self.cfg.providers.embedding.dimensions as usize {
			return Err(Error::Embedding {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		prism_providers::embedding::l2_normalize(&mut query_vec);

		Ok(query_vec)
	}

	#[allow(clippy::type_complexity)]
	async fn run_searches(
		&self,
		query_vec: &[f32],
		query: &str,
		similarity_threshold: f32,
		limit: u32,
		caller_id: Option<&str>,
		public_only: bool,
	) -> (
		(prism_storage::Result<Vec<ChunkSearchRow>>, u64),
		(prism_storage::Result<Vec<ChunkSearchRow>>, u64),
	) {
		let dense = async {
			let started = Instant::now();
			let rows = prism_storage::search::dense_search(
				&self.db.pool,
				query_vec,
				similarity_threshold,
				limit,
				caller_id,
				public_only,
			)
			.await;

			(rows, elapsed_ms(started))
		};
		let lexical = async {
			let started = Instant::now();
			let rows = prism_storage::search::lexical_search(
				&self.db.pool,
				query,
				limit,
				caller_id,
				public_only,
			)
			.await;

			(rows, elapsed_ms(started))
		};

		tokio::join!(dense, lexical)
	}

	async fn run_fallback(
		&self,
		query_vec: &[f32],
		query: &str,
		relaxed_threshold: f32,
		relaxed_limit: u32,
		caller_id: Option<&str>,
		public_only: bool,
	) -> Result<Vec<FusedHit>> {
		let ((dense_rows, _), (lexical_rows, _)) = self
			.run_searches(query_vec, query, relaxed_threshold, relaxed_limit, caller_id, public_only)
			.await;
		let dense_hits: Vec<ChunkHit> =
			dense_rows.map_err(Error::from)?.into_iter().map(hit_from_row).collect();
		let lexical_hits: Vec<ChunkHit> =
			lexical_rows.map_err(Error::from)?.into_iter().map(hit_from_row).collect();

		Ok(fusion::fuse(dense_hits, lexical_hits, self.cfg.retrieval.rrf_k, true))
	}
}

/// Relaxed parameters for the broadening pass: drop the floor by 0.2 (never
/// below 0.3) and double the per-retriever limit.
pub(crate) fn fallback_params(similarity_threshold: f32, limit: u32) -> (f32, u32) {
	(
		(similarity_threshold - FALLBACK_THRESHOLD_DELTA).max(FALLBACK_THRESHOLD_FLOOR),
		limit.saturating_mul(2),
	)
}

/// Unions fallback hits into the primary set, keeping primary entries on
/// chunk-id conflict. Returns how many fallback hits were added.
pub(crate) fn merge_fallback(primary: &mut Vec<FusedHit>, fallback: Vec<FusedHit>) -> usize {
	let existing: std::collections::HashSet<Uuid> =
		primary.iter().map(|hit| hit.chunk_id).collect();
	let mut added = 0;

	for hit in fallback {
		if !existing.contains(&hit.chunk_id) {
			primary.push(hit);
			added += 1;
		}
	}

	added
}

pub(crate) fn parse_filters(raw: Option<&RequestFilters>) -> Result<SearchFilters> {
	let Some(raw) = raw else {
		return Ok(SearchFilters::default());
	};
	let mut document_ids = Vec::with_capacity(raw.document_id.len());

	for id in &raw.document_id {
		let parsed = Uuid::parse_str(id).map_err(|_| Error::InvalidRequest {
			message: format!("filters.document_id contains a non-UUID value: {id}."),
		})?;

		document_ids.push(parsed);
	}

	let date_range = match &raw.date_range {
		Some(range) => {
			let start = parse_bound(range.start.as_deref(), "filters.dateRange.start")?;
			let end = parse_bound(range.end.as_deref(), "filters.dateRange.end")?;

			Some(DateRange { start, end })
		},
		None => None,
	};

	Ok(SearchFilters { document_ids, document_types: raw.document_type.clone(), date_range })
}

fn parse_bound(
	raw: Option<&str>,
	field: &str,
) -> Result<Option<time::OffsetDateTime>> {
	let Some(raw) = raw else {
		return Ok(None);
	};

	filter::parse_date(raw).map(Some).ok_or_else(|| Error::InvalidRequest {
		message: format!("{field} must be an RFC3339 timestamp or a calendar date."),
	})
}

fn hit_from_row(row: ChunkSearchRow) -> ChunkHit {
	ChunkHit {
		chunk_id: row.chunk_id,
		document_id: row.document_id,
		document_title: row.document_title,
		document_type: row.document_type,
		chunk_text: row.chunk_text,
		chunk_index: row.chunk_index,
		metadata: row.metadata,
		score: row.score,
		total_chunks: row.total_chunks,
	}
}

fn document_result(group: DocumentGroup, debug: bool) -> DocumentResult {
	DocumentResult {
		document_id: group.document_id,
		document_title: group.document_title,
		document_type: group.document_type,
		chunks: group.chunks.into_iter().map(|chunk| chunk_result(chunk, debug)).collect(),
		best_rrf_score: group.best_rrf_score,
		best_raw_similarity: group.best_raw_similarity,
		relevance_density: group.relevance_density,
	}
}

fn chunk_result(hit: FusedHit, debug: bool) -> ChunkResult {
	ChunkResult {
		chunk_id: hit.chunk_id,
		chunk_text: hit.chunk_text,
		chunk_index: hit.chunk_index,
		metadata: hit.metadata,
		rrf_score: hit.rrf_score,
		source_tag: debug.then_some(hit.source),
		semantic_rank: if debug { hit.semantic_rank } else { None },
		lexical_rank: if debug { hit.lexical_rank } else { None },
		raw_semantic_score: if debug { hit.raw_semantic_score } else { None },
		raw_lexical_score: if debug { hit.raw_lexical_score } else { None },
	}
}

fn elapsed_ms(started: Instant) -> u64 {
	started.elapsed().as_millis() as u64
}
