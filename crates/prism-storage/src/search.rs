use sqlx::PgPool;

use crate::{Result, models::ChunkSearchRow, vector_to_pg};

/// Dense retrieval over pgvector: cosine similarity with a floor, visible
/// rows only (indexed documents that are public or owned by the caller).
pub async fn dense_search(
	pool: &PgPool,
	query_vec: &[f32],
	similarity_threshold: f32,
	max_results: u32,
	caller_id: Option<&str>,
	public_only: bool,
) -> Result<Vec<ChunkSearchRow>> {
	let vec_text = vector_to_pg(query_vec);
	let rows = sqlx::query_as::<_, ChunkSearchRow>(
		"SELECT c.chunk_id, c.document_id, d.title AS document_title, \
		 d.doc_type AS document_type, c.content AS chunk_text, c.chunk_index, c.metadata, \
		 (1 - (c.embedding <=> $1::vector))::real AS score, d.chunk_count AS total_chunks \
		 FROM document_chunks c \
		 JOIN documents d ON d.document_id = c.document_id \
		 WHERE d.status = 'indexed' \
		 AND c.embedding IS NOT NULL \
		 AND (d.is_public OR d.owner_id = $2) \
		 AND (NOT $3 OR d.is_public) \
		 AND (1 - (c.embedding <=> $1::vector)) >= $4 \
		 ORDER BY c.embedding <=> $1::vector ASC, c.chunk_id ASC \
		 LIMIT $5",
	)
	.bind(vec_text)
	.bind(caller_id)
	.bind(public_only)
	.bind(similarity_threshold)
	.bind(max_results as i64)
	.fetch_all(pool)
	.await?;

	Ok(rows)
}

/// Lexical retrieval over the generated tsvector column, ranked by cover
/// density. Visibility rules match `dense_search`.
pub async fn lexical_search(
	pool: &PgPool,
	query_text: &str,
	max_results: u32,
	caller_id: Option<&str>,
	public_only: bool,
) -> Result<Vec<ChunkSearchRow>> {
	let rows = sqlx::query_as::<_, ChunkSearchRow>(
		"SELECT c.chunk_id, c.document_id, d.title AS document_title, \
		 d.doc_type AS document_type, c.content AS chunk_text, c.chunk_index, c.metadata, \
		 ts_rank_cd(c.tsv, websearch_to_tsquery('english', $1))::real AS score, \
		 d.chunk_count AS total_chunks \
		 FROM document_chunks c \
		 JOIN documents d ON d.document_id = c.document_id \
		 WHERE d.status = 'indexed' \
		 AND c.tsv @@ websearch_to_tsquery('english', $1) \
		 AND (d.is_public OR d.owner_id = $2) \
		 AND (NOT $3 OR d.is_public) \
		 ORDER BY score DESC, c.chunk_id ASC \
		 LIMIT $4",
	)
	.bind(query_text)
	.bind(caller_id)
	.bind(public_only)
	.bind(max_results as i64)
	.fetch_all(pool)
	.await?;

	Ok(rows)
}
