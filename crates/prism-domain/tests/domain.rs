use prism_domain::{
	ChunkHit, SourceTag, citation,
	filter::{self, SearchFilters},
	fusion, grouping,
};
use uuid::Uuid;

fn hit(chunk_id: Uuid, document_id: Uuid, score: f32) -> ChunkHit {
	ChunkHit {
		chunk_id,
		document_id,
		document_title: "Doc".to_string(),
		document_type: None,
		chunk_text: "chunk text".to_string(),
		chunk_index: 0,
		metadata: serde_json::Value::Null,
		score,
		total_chunks: 4,
	}
}

#[test]
fn pure_dense_match_orders_by_rank() {
	let doc = Uuid::new_v4();
	let c1 = Uuid::new_v4();
	let c2 = Uuid::new_v4();
	let fused = fusion::fuse(
		vec![hit(c1, doc, 0.9), hit(c2, doc, 0.8)],
		Vec::new(),
		10,
		false,
	);

	assert_eq!(fused.len(), 2);
	assert_eq!(fused[0].chunk_id, c1);
	assert!((fused[0].rrf_score - 1.0 / 10.0).abs() < 1e-6);
	assert_eq!(fused[1].chunk_id, c2);
	assert!((fused[1].rrf_score - 1.0 / 11.0).abs() < 1e-6);
	assert!(fused.iter().all(|hit| hit.source == SourceTag::Dense));
}

#[test]
fn hybrid_overlap_sums_contributions_and_reorders() {
	let doc = Uuid::new_v4();
	let a = Uuid::new_v4();
	let b = Uuid::new_v4();
	let c = Uuid::new_v4();
	let fused = fusion::fuse(
		vec![hit(a, doc, 0.9), hit(b, doc, 0.8)],
		vec![hit(b, doc, 2.0), hit(c, doc, 1.5)],
		10,
		false,
	);
	let order: Vec<Uuid> = fused.iter().map(|hit| hit.chunk_id).collect();

	assert_eq!(order, vec![b, a, c]);
	assert!((fused[0].rrf_score - (1.0 / 11.0 + 1.0 / 10.0)).abs() < 1e-6);
	assert_eq!(fused[0].source, SourceTag::Hybrid);
	assert!((fused[1].rrf_score - 1.0 / 10.0).abs() < 1e-6);
	assert!((fused[2].rrf_score - 1.0 / 11.0).abs() < 1e-6);
}

#[test]
fn fused_chunk_ids_are_unique_for_any_overlap() {
	let doc = Uuid::new_v4();
	let shared: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
	let dense: Vec<ChunkHit> =
		shared.iter().enumerate().map(|(i, id)| hit(*id, doc, 0.9 - i as f32 * 0.05)).collect();
	let lexical: Vec<ChunkHit> =
		shared.iter().rev().enumerate().map(|(i, id)| hit(*id, doc, 5.0 - i as f32)).collect();
	let fused = fusion::fuse(dense, lexical, 10, false);
	let mut ids: Vec<Uuid> = fused.iter().map(|hit| hit.chunk_id).collect();

	ids.sort();
	ids.dedup();

	assert_eq!(ids.len(), shared.len());
}

#[test]
fn density_distinguishes_dense_and_sparse_documents() {
	let dense_doc = Uuid::new_v4();
	let sparse_doc = Uuid::new_v4();
	// Retriever order: the sparse document's two chunks score highest.
	let mut dense_hits: Vec<ChunkHit> = (0..2)
		.map(|i| {
			let mut h = hit(Uuid::new_v4(), sparse_doc, 0.95);
			h.chunk_index = i;
			h.total_chunks = 100;
			h
		})
		.collect();

	for i in 0..73 {
		let mut h = hit(Uuid::new_v4(), dense_doc, 0.7);
		h.chunk_index = i;
		h.total_chunks = 100;
		dense_hits.push(h);
	}

	let fused = fusion::fuse(dense_hits, Vec::new(), 10, false);
	let groups = grouping::group_by_document(fused, true);
	let dense_group =
		groups.iter().find(|group| group.document_id == dense_doc).expect("dense doc grouped");
	let sparse_group =
		groups.iter().find(|group| group.document_id == sparse_doc).expect("sparse doc grouped");

	assert!((dense_group.relevance_density - 0.73).abs() < 1e-6);
	assert!((sparse_group.relevance_density - 0.02).abs() < 1e-6);
	// Ranked by best fused score, not by density.
	assert_eq!(groups[0].document_id, sparse_doc);
}

#[test]
fn citation_resolution_matches_known_titles_only() {
	let answer = "X is true [Source: Intro to ML]. Y follows [Source: Unknown Doc].";
	let documents =
		vec![("doc-1".to_string(), "Intro to ML".to_string()), ("doc-2".to_string(), "Advanced RAG".to_string())];
	let cited = citation::extract_citations(answer);
	let resolved: Vec<&str> = cited
		.iter()
		.filter_map(|title| {
			documents.iter().find(|(_, known)| known == title).map(|(id, _)| id.as_str())
		})
		.collect();

	assert_eq!(cited, vec!["Intro to ML", "Unknown Doc"]);
	assert_eq!(resolved, vec!["doc-1"]);
}

#[test]
fn post_filters_compose_and_stay_stable() {
	let keep = Uuid::new_v4();
	let drop = Uuid::new_v4();
	let mut first = hit(Uuid::new_v4(), keep, 0.9);

	first.document_type = Some("report".to_string());
	first.metadata = serde_json::json!({ "created_at": "2024-03-01T00:00:00Z" });

	let mut second = hit(Uuid::new_v4(), keep, 0.8);

	second.document_type = Some("memo".to_string());

	let mut third = hit(Uuid::new_v4(), drop, 0.7);

	third.document_type = Some("report".to_string());

	let fused = fusion::fuse(vec![first, second, third], Vec::new(), 10, false);
	let filters = SearchFilters {
		document_ids: vec![keep],
		document_types: vec!["report".to_string()],
		date_range: Some(filter::DateRange {
			start: filter::parse_date("2024-01-01"),
			end: None,
		}),
	};
	let kept = filter::apply_filters(fused, &filters);

	assert_eq!(kept.len(), 1);
	assert_eq!(kept[0].document_id, keep);
	assert_eq!(kept[0].document_type.as_deref(), Some("report"));
}

#[test]
fn fusion_and_grouping_are_deterministic() {
	let doc_a = Uuid::new_v4();
	let doc_b = Uuid::new_v4();
	let ids: Vec<Uuid> = (0..6).map(|_| Uuid::new_v4()).collect();
	let build = || {
		let dense = vec![
			hit(ids[0], doc_a, 0.9),
			hit(ids[1], doc_a, 0.8),
			hit(ids[2], doc_b, 0.7),
		];
		let lexical = vec![
			hit(ids[1], doc_a, 3.0),
			hit(ids[3], doc_b, 2.0),
			hit(ids[4], doc_a, 1.0),
			hit(ids[5], doc_b, 0.5),
		];

		grouping::group_by_document(fusion::fuse(dense, lexical, 10, false), true)
	};
	let first = build();
	let second = build();
	let shape = |groups: &[prism_domain::DocumentGroup]| {
		groups
			.iter()
			.map(|group| {
				(
					group.document_id,
					group.chunks.iter().map(|chunk| chunk.chunk_id).collect::<Vec<_>>(),
				)
			})
			.collect::<Vec<_>>()
	};

	assert_eq!(shape(&first), shape(&second));
}
