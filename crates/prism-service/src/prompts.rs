use serde_json::Value;
use uuid::Uuid;

use crate::retrieve::DocumentResult;

pub(crate) const SUMMARY_TEMPERATURE: f32 = 0.2;
pub(crate) const ANSWER_TEMPERATURE: f32 = 0.3;
pub(crate) const QUESTIONS_TEMPERATURE: f32 = 0.3;

/// Chunks fed into a per-document summary prompt.
pub(crate) const SUMMARY_CONTEXT_CHUNKS: usize = 6;
/// Chunks taken from each document before the global re-sort.
pub(crate) const ANSWER_CHUNKS_PER_DOCUMENT: usize = 4;
/// Hard cap on the globally assembled context.
pub(crate) const ANSWER_CONTEXT_CHUNKS: usize = 16;

/// Concatenates a document's strongest chunks, best first, separated by
/// blank lines.
pub(crate) fn document_context(document: &DocumentResult, max_chunks: usize) -> String {
	let mut chunks: Vec<(f32, &str)> = document
		.chunks
		.iter()
		.map(|chunk| (chunk.rrf_score, chunk.chunk_text.as_str()))
		.collect();

	chunks.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
	chunks.truncate(max_chunks);

	chunks.iter().map(|(_, text)| *text).collect::<Vec<_>>().join("\n\n")
}

/// Builds the shared answer/questions context: up to four top chunks per
/// document, re-sorted globally by fused score, capped at sixteen chunks.
/// Each block is headed by its source title so the model can cite it.
/// Returns the context and the documents that contributed to it, in first
/// appearance order.
pub(crate) fn global_context(documents: &[DocumentResult]) -> (String, Vec<(Uuid, String)>) {
	let mut pool: Vec<(f32, &DocumentResult, &str)> = Vec::new();

	for document in documents {
		let mut chunks: Vec<(f32, &str)> = document
			.chunks
			.iter()
			.map(|chunk| (chunk.rrf_score, chunk.chunk_text.as_str()))
			.collect();

		chunks.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

		for (score, text) in chunks.into_iter().take(ANSWER_CHUNKS_PER_DOCUMENT) {
			pool.push((score, document, text));
		}
	}

	pool.sort_by(|a, b| {
		b.0.partial_cmp(&a.0)
			.unwrap_or(std::cmp::Ordering::Equal)
			.then_with(|| a.1.document_id.cmp(&b.1.document_id))
	});
	pool.truncate(ANSWER_CONTEXT_CHUNKS);

	let mut contributing: Vec<(Uuid, String)> = Vec::new();
	let mut blocks = Vec::with_capacity(pool.len());

	for (_, document, text) in pool {
		if !contributing.iter().any(|(id, _)| *id == document.document_id) {
			contributing.push((document.document_id, document.document_title.clone()));
		}
		blocks.push(format!("[Source: {}]\n{}", document.document_title, text));
	}

	(blocks.join("\n\n"), contributing)
}

pub(crate) fn summary_messages(query: &str, document_title: &str, context: &str) -> Vec<Value> {
	let schema = serde_json::json!({
		"relevance_summary": "string",
		"confidence_score": 0.0
	});
	let system_prompt = "You summarize why a retrieved document matters for a user's query. \
Output must be valid JSON only and must match the provided schema exactly. \
Write relevance_summary as a single impactful sentence that directly addresses the query. \
Set confidence_score between 0 and 1. Do not add explanations or extra fields.";
	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema}\nUser query:\n{query}\n\nDocument: \
		 {title}\n\nExcerpts:\n{context}",
		schema = pretty_schema(&schema),
		query = query,
		title = document_title,
		context = context
	);

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

pub(crate) fn answer_messages(query: &str, context: &str) -> Vec<Value> {
	let schema = serde_json::json!({
		"answer_markdown": "string",
		"confidence": 0.0,
		"source_document_titles": ["string"]
	});
	let system_prompt = "You answer questions strictly from the provided excerpts. \
Output must be valid JSON only and must match the provided schema exactly. \
Write answer_markdown in markdown and cite every claim inline with a literal marker of the \
form [Source: <exact document title>], copying titles exactly as they appear in the excerpt \
headers. Set confidence between 0 and 1. If the excerpts do not answer the question, say so \
in answer_markdown with low confidence. Do not add extra fields.";
	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema}\nUser query:\n{query}\n\nExcerpts:\n{context}",
		schema = pretty_schema(&schema),
		query = query,
		context = context
	);

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

pub(crate) fn questions_messages(query: &str, context: &str) -> Vec<Value> {
	let schema = serde_json::json!({
		"questions": [
			{ "question": "string", "relevance": 0.0, "category": "Strategic | Technical | Adoption" }
		]
	});
	let system_prompt = "You propose follow-up questions a reader would ask next. \
Output must be valid JSON only and must match the provided schema exactly. \
Return exactly three questions. Tag each with one category: Strategic, Technical, or Adoption. \
Score relevance between 0.5 and 0.95; avoid round numbers like 0.5, 0.8, or 0.9 and prefer \
values such as 0.63 or 0.87. Do not add explanations or extra fields.";
	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema}\nOriginal query:\n{query}\n\nContext:\n{context}",
		schema = pretty_schema(&schema),
		query = query,
		context = context
	);

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

fn pretty_schema(schema: &Value) -> String {
	serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string())
}
