pub mod cache;
pub mod db;
pub mod history;
pub mod models;
pub mod search;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Renders a vector as the pgvector text literal `[v0,v1,...]`.
pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');
	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}
		out.push_str(&value.to_string());
	}
	out.push(']');

	out
}

#[cfg(test)]
mod tests {
	use super::vector_to_pg;

	#[test]
	fn formats_pgvector_literals() {
		assert_eq!(vector_to_pg(&[]), "[]");
		assert_eq!(vector_to_pg(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
	}
}
