const MARKER: &str = "[Source:";

/// Extracts the ordered, deduplicated titles cited as `[Source: TITLE]` in
/// generated text.
///
/// The scanner is deliberately tolerant of model output: `\]` inside a title
/// is an escaped literal bracket, and an unterminated `[Source:` is treated
/// as plain text rather than an error.
pub fn extract_citations(text: &str) -> Vec<String> {
	let mut titles = Vec::new();
	let mut seen = std::collections::HashSet::new();
	let bytes = text.as_bytes();
	let mut pos = 0;

	while let Some(found) = text[pos..].find(MARKER) {
		let start = pos + found + MARKER.len();
		let mut cursor = start;
		let mut end = None;

		while cursor < bytes.len() {
			match bytes[cursor] {
				b']' => {
					end = Some(cursor);
					break;
				},
				b'\\' => cursor += 2,
				_ => cursor += 1,
			}
		}

		let Some(end) = end else {
			// Unterminated marker; everything from here on is literal text.
			break;
		};
		let title = text[start..end].replace("\\]", "]");
		let title = title.trim();

		if !title.is_empty() && seen.insert(title.to_string()) {
			titles.push(title.to_string());
		}

		pos = end + 1;
	}

	titles
}

#[cfg(test)]
mod tests {
	use super::extract_citations;

	#[test]
	fn extracts_titles_in_order_without_duplicates() {
		let text = "X is true [Source: Intro to ML]. Y follows [Source: Advanced RAG], \
		            and again [Source: Intro to ML].";

		assert_eq!(extract_citations(text), vec!["Intro to ML", "Advanced RAG"]);
	}

	#[test]
	fn ignores_unterminated_markers() {
		let text = "Cited [Source: Real Title]. Broken [Source: never closed";

		assert_eq!(extract_citations(text), vec!["Real Title"]);
	}

	#[test]
	fn unescapes_bracket_in_title() {
		let text = r"See [Source: Risks \] Rewards] for details.";

		assert_eq!(extract_citations(text), vec!["Risks ] Rewards"]);
	}

	#[test]
	fn skips_empty_titles() {
		let text = "Nothing here [Source: ] or here [Source:].";

		assert!(extract_citations(text).is_empty());
	}

	#[test]
	fn handles_text_without_markers() {
		assert!(extract_citations("No citations at all.").is_empty());
		assert!(extract_citations("").is_empty());
	}

	#[test]
	fn tolerates_multibyte_text_around_markers() {
		let text = "Résumé ✓ [Source: Étude économique], done.";

		assert_eq!(extract_citations(text), vec!["Étude économique"]);
	}
}
