use time::{
	Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description,
};
use uuid::Uuid;

use crate::FusedHit;

/// Caller-supplied post-retrieval filters. Empty collections mean "no
/// restriction".
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
	pub document_ids: Vec<Uuid>,
	pub document_types: Vec<String>,
	pub date_range: Option<DateRange>,
}
impl SearchFilters {
	pub fn is_empty(&self) -> bool {
		self.document_ids.is_empty()
			&& self.document_types.is_empty()
			&& self.date_range.map(|range| range.start.is_none() && range.end.is_none()).unwrap_or(true)
	}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
	pub start: Option<OffsetDateTime>,
	pub end: Option<OffsetDateTime>,
}

/// Applies the filters in order (id set, type set, date range), preserving
/// the incoming order. Hits whose metadata carries no parseable date pass
/// the date-range filters.
pub fn apply_filters(hits: Vec<FusedHit>, filters: &SearchFilters) -> Vec<FusedHit> {
	if filters.is_empty() {
		return hits;
	}

	hits.into_iter()
		.filter(|hit| {
			if !filters.document_ids.is_empty() && !filters.document_ids.contains(&hit.document_id)
			{
				return false;
			}
			if !filters.document_types.is_empty()
				&& let Some(doc_type) = &hit.document_type
				&& !filters.document_types.contains(doc_type)
			{
				return false;
			}
			if let Some(range) = filters.date_range {
				let date = chunk_date(&hit.metadata);

				if let (Some(start), Some(date)) = (range.start, date)
					&& date < start
				{
					return false;
				}
				if let (Some(end), Some(date)) = (range.end, date)
					&& date > end
				{
					return false;
				}
			}

			true
		})
		.collect()
}

/// Parses a chunk's `created_at` or `date` metadata field as RFC3339 or a
/// plain calendar date.
pub fn chunk_date(metadata: &serde_json::Value) -> Option<OffsetDateTime> {
	let raw = metadata
		.get("created_at")
		.and_then(serde_json::Value::as_str)
		.or_else(|| metadata.get("date").and_then(serde_json::Value::as_str))?;

	parse_date(raw)
}

pub fn parse_date(raw: &str) -> Option<OffsetDateTime> {
	if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
		return Some(parsed);
	}

	Date::parse(raw, format_description!("[year]-[month]-[day]"))
		.ok()
		.map(|date| date.midnight().assume_utc())
}

#[cfg(test)]
mod tests {
	use serde_json::json;
	use time::macros::datetime;

	use super::*;
	use crate::SourceTag;

	fn hit(document_id: Uuid, document_type: Option<&str>, metadata: serde_json::Value) -> FusedHit {
		FusedHit {
			chunk_id: Uuid::new_v4(),
			document_id,
			document_title: "Doc".to_string(),
			document_type: document_type.map(str::to_string),
			chunk_text: "text".to_string(),
			chunk_index: 0,
			metadata,
			rrf_score: 0.1,
			semantic_rank: Some(0),
			lexical_rank: None,
			raw_semantic_score: Some(0.9),
			raw_lexical_score: None,
			source: SourceTag::Dense,
			total_chunks: 1,
		}
	}

	#[test]
	fn id_filter_keeps_listed_documents_only() {
		let keep = Uuid::new_v4();
		let drop = Uuid::new_v4();
		let filters = SearchFilters { document_ids: vec![keep], ..Default::default() };
		let kept = apply_filters(
			vec![hit(keep, None, json!({})), hit(drop, None, json!({}))],
			&filters,
		);

		assert_eq!(kept.len(), 1);
		assert_eq!(kept[0].document_id, keep);
	}

	#[test]
	fn type_filter_passes_hits_without_a_type() {
		let filters =
			SearchFilters { document_types: vec!["report".to_string()], ..Default::default() };
		let kept = apply_filters(
			vec![
				hit(Uuid::new_v4(), Some("report"), json!({})),
				hit(Uuid::new_v4(), Some("memo"), json!({})),
				hit(Uuid::new_v4(), None, json!({})),
			],
			&filters,
		);

		assert_eq!(kept.len(), 2);
	}

	#[test]
	fn date_range_drops_out_of_range_and_passes_dateless() {
		let filters = SearchFilters {
			date_range: Some(DateRange {
				start: Some(datetime!(2024-01-01 00:00 UTC)),
				end: Some(datetime!(2024-12-31 00:00 UTC)),
			}),
			..Default::default()
		};
		let kept = apply_filters(
			vec![
				hit(Uuid::new_v4(), None, json!({ "created_at": "2024-06-15T12:00:00Z" })),
				hit(Uuid::new_v4(), None, json!({ "date": "2023-06-15" })),
				hit(Uuid::new_v4(), None, json!({ "created_at": "2025-02-01T00:00:00Z" })),
				hit(Uuid::new_v4(), None, json!({})),
			],
			&filters,
		);

		assert_eq!(kept.len(), 2);
	}

	#[test]
	fn filtering_is_stable() {
		let first = Uuid::new_v4();
		let second = Uuid::new_v4();
		let filters =
			SearchFilters { document_ids: vec![first, second], ..Default::default() };
		let kept = apply_filters(
			vec![
				hit(first, None, json!({})),
				hit(Uuid::new_v4(), None, json!({})),
				hit(second, None, json!({})),
			],
			&filters,
		);

		assert_eq!(kept.len(), 2);
		assert_eq!(kept[0].document_id, first);
		assert_eq!(kept[1].document_id, second);
	}

	#[test]
	fn parse_date_accepts_rfc3339_and_calendar_dates() {
		assert!(parse_date("2024-06-15T12:00:00Z").is_some());
		assert!(parse_date("2024-06-15").is_some());
		assert!(parse_date("June 2024").is_none());
	}
}
