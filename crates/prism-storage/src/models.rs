/// One chunk hit as returned by either search primitive. `score` is cosine
/// similarity for dense search and the `ts_rank_cd` measure for lexical
/// search.
#[derive(Debug, sqlx::FromRow)]
pub struct ChunkSearchRow {
	pub chunk_id: uuid::Uuid,
	pub document_id: uuid::Uuid,
	pub document_title: String,
	pub document_type: Option<String>,
	pub chunk_text: String,
	pub chunk_index: i32,
	pub metadata: serde_json::Value,
	pub score: f32,
	pub total_chunks: i32,
}
