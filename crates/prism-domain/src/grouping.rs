use std::collections::HashMap;

use uuid::Uuid;

use crate::{DocumentGroup, FusedHit};

/// Collapses fused hits into one entry per document.
///
/// Chunks within a document are ordered by descending `rrf_score`, ties by
/// ascending `chunk_index`; documents by descending `best_rrf_score`, ties
/// by descending `best_raw_similarity`, then ascending document id.
pub fn group_by_document(hits: Vec<FusedHit>, enable_density: bool) -> Vec<DocumentGroup> {
	let mut by_document: HashMap<Uuid, DocumentGroup> = HashMap::new();

	for hit in hits {
		let group = by_document.entry(hit.document_id).or_insert_with(|| DocumentGroup {
			document_id: hit.document_id,
			document_title: hit.document_title.clone(),
			document_type: hit.document_type.clone(),
			chunks: Vec::new(),
			best_rrf_score: 0.0,
			best_raw_similarity: 0.0,
			relevance_density: 0.0,
		});

		group.best_rrf_score = group.best_rrf_score.max(hit.rrf_score);
		if let Some(similarity) = hit.raw_semantic_score {
			group.best_raw_similarity = group.best_raw_similarity.max(similarity);
		}
		group.chunks.push(hit);
	}

	let mut groups: Vec<DocumentGroup> = by_document.into_values().collect();

	for group in &mut groups {
		group.chunks.sort_by(|a, b| {
			b.rrf_score
				.partial_cmp(&a.rrf_score)
				.unwrap_or(std::cmp::Ordering::Equal)
				.then_with(|| a.chunk_index.cmp(&b.chunk_index))
		});
		group.relevance_density =
			if enable_density { density(&group.chunks) } else { 0.0 };
	}

	groups.sort_by(|a, b| {
		b.best_rrf_score
			.partial_cmp(&a.best_rrf_score)
			.unwrap_or(std::cmp::Ordering::Equal)
			.then_with(|| {
				b.best_raw_similarity
					.partial_cmp(&a.best_raw_similarity)
					.unwrap_or(std::cmp::Ordering::Equal)
			})
			.then_with(|| a.document_id.cmp(&b.document_id))
	});

	groups
}

/// Fraction of a document's chunks that matched, clamped to [0, 1]. Zero
/// when the storage layer did not attach a usable total.
fn density(chunks: &[FusedHit]) -> f32 {
	let total = chunks.iter().map(|chunk| chunk.total_chunks).find(|total| *total > 0);
	let Some(total) = total else {
		return 0.0;
	};

	(chunks.len() as f32 / total as f32).clamp(0.0, 1.0)
}
