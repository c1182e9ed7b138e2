use std::collections::HashMap;

use uuid::Uuid;

use crate::{ChunkHit, FusedHit, SourceTag};

/// Merges the dense and lexical ranked lists with additive reciprocal rank
/// fusion.
///
/// A hit at 0-based rank `i` contributes `1 / (rrf_k + i)` from its list; a
/// chunk present in both lists sums both contributions and is tagged
/// `hybrid`. `fallback_pass` rewrites every tag to its `*_fallback` variant.
pub fn fuse(
	dense: Vec<ChunkHit>,
	lexical: Vec<ChunkHit>,
	rrf_k: u32,
	fallback_pass: bool,
) -> Vec<FusedHit> {
	let mut by_chunk: HashMap<Uuid, FusedHit> = HashMap::with_capacity(dense.len() + lexical.len());

	for (rank, hit) in dense.into_iter().enumerate() {
		let contribution = rrf_contribution(rrf_k, rank);
		let entry = by_chunk.entry(hit.chunk_id).or_insert_with(|| seed_hit(&hit, SourceTag::Dense));

		entry.rrf_score += contribution;
		entry.semantic_rank = Some(rank as u32);
		entry.raw_semantic_score = Some(hit.score);
	}
	for (rank, hit) in lexical.into_iter().enumerate() {
		let contribution = rrf_contribution(rrf_k, rank);
		match by_chunk.entry(hit.chunk_id) {
			std::collections::hash_map::Entry::Occupied(mut occupied) => {
				let entry = occupied.get_mut();

				// A chunk id can only repeat across lists, not within one;
				// a second lexical rank for the same id keeps the better one.
				if entry.lexical_rank.is_none() {
					entry.rrf_score += contribution;
					entry.lexical_rank = Some(rank as u32);
					entry.raw_lexical_score = Some(hit.score);
					entry.source = SourceTag::Hybrid;
				}
			},
			std::collections::hash_map::Entry::Vacant(vacant) => {
				let entry = vacant.insert(seed_hit(&hit, SourceTag::Lexical));

				entry.rrf_score += contribution;
				entry.lexical_rank = Some(rank as u32);
				entry.raw_lexical_score = Some(hit.score);
			},
		}
	}

	let mut fused: Vec<FusedHit> = by_chunk.into_values().collect();

	if fallback_pass {
		for hit in &mut fused {
			hit.source = hit.source.into_fallback();
		}
	}

	fused.sort_by(|a, b| {
		b.rrf_score
			.partial_cmp(&a.rrf_score)
			.unwrap_or(std::cmp::Ordering::Equal)
			.then_with(|| a.chunk_id.cmp(&b.chunk_id))
	});

	fused
}

fn rrf_contribution(rrf_k: u32, rank: usize) -> f32 {
	1.0 / (rrf_k as f32 + rank as f32)
}

fn seed_hit(hit: &ChunkHit, source: SourceTag) -> FusedHit {
	FusedHit {
		chunk_id: hit.chunk_id,
		document_id: hit.document_id,
		document_title: hit.document_title.clone(),
		document_type: hit.document_type.clone(),
		chunk_text: hit.chunk_text.clone(),
		chunk_index: hit.chunk_index,
		metadata: hit.metadata.clone(),
		rrf_score: 0.0,
		semantic_rank: None,
		lexical_rank: None,
		raw_semantic_score: None,
		raw_lexical_score: None,
		source,
		total_chunks: hit.total_chunks,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hit(chunk_id: Uuid, document_id: Uuid, score: f32) -> ChunkHit {
		ChunkHit {
			chunk_id,
			document_id,
			document_title: "Doc".to_string(),
			document_type: None,
			chunk_text: "text".to_string(),
			chunk_index: 0,
			metadata: serde_json::Value::Null,
			score,
			total_chunks: 1,
		}
	}

	#[test]
	fn empty_lists_fuse_to_nothing() {
		assert!(fuse(Vec::new(), Vec::new(), 10, false).is_empty());
	}

	#[test]
	fn dense_only_preserves_rank_order() {
		let doc = Uuid::new_v4();
		let first = Uuid::new_v4();
		let second = Uuid::new_v4();
		let fused =
			fuse(vec![hit(first, doc, 0.9), hit(second, doc, 0.8)], Vec::new(), 10, false);

		assert_eq!(fused.len(), 2);
		assert_eq!(fused[0].chunk_id, first);
		assert_eq!(fused[0].rrf_score, 1.0 / 10.0);
		assert_eq!(fused[0].source, SourceTag::Dense);
		assert_eq!(fused[1].chunk_id, second);
		assert_eq!(fused[1].rrf_score, 1.0 / 11.0);
	}

	#[test]
	fn overlapping_chunk_sums_both_contributions() {
		let doc = Uuid::new_v4();
		let a = Uuid::new_v4();
		let b = Uuid::new_v4();
		let c = Uuid::new_v4();
		let fused = fuse(
			vec![hit(a, doc, 0.9), hit(b, doc, 0.8)],
			vec![hit(b, doc, 2.0), hit(c, doc, 1.0)],
			10,
			false,
		);

		assert_eq!(fused.len(), 3);
		assert_eq!(fused[0].chunk_id, b);
		assert!((fused[0].rrf_score - (1.0 / 11.0 + 1.0 / 10.0)).abs() < 1e-6);
		assert_eq!(fused[0].source, SourceTag::Hybrid);
		assert_eq!(fused[0].semantic_rank, Some(1));
		assert_eq!(fused[0].lexical_rank, Some(0));
		assert_eq!(fused[0].raw_semantic_score, Some(0.8));
		assert_eq!(fused[0].raw_lexical_score, Some(2.0));
		assert_eq!(fused[1].chunk_id, a);
		assert_eq!(fused[2].chunk_id, c);
	}

	#[test]
	fn fallback_pass_rewrites_source_tags() {
		let doc = Uuid::new_v4();
		let shared = Uuid::new_v4();
		let fused = fuse(
			vec![hit(shared, doc, 0.9), hit(Uuid::new_v4(), doc, 0.8)],
			vec![hit(shared, doc, 1.0)],
			10,
			true,
		);

		assert!(fused.iter().all(|hit| hit.source.is_fallback()));
		assert!(fused.iter().any(|hit| hit.source == SourceTag::HybridFallback));
	}

	#[test]
	fn chunk_ids_are_unique_after_fusion() {
		let doc = Uuid::new_v4();
		let shared = Uuid::new_v4();
		let fused =
			fuse(vec![hit(shared, doc, 0.9)], vec![hit(shared, doc, 1.0)], 10, false);

		assert_eq!(fused.len(), 1);
	}
}
