use sqlx::PgPool;

use crate::Result;

/// Records a served insight bundle. Callers treat failures as non-fatal.
pub async fn history_append(
	pool: &PgPool,
	caller_id: Option<&str>,
	user_query: &str,
	insight_type: &str,
	bundle: &serde_json::Value,
) -> Result<()> {
	sqlx::query(
		"INSERT INTO search_history (history_id, caller_id, user_query, insight_type, bundle) \
		 VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(uuid::Uuid::new_v4())
	.bind(caller_id)
	.bind(user_query)
	.bind(insight_type)
	.bind(bundle)
	.execute(pool)
	.await?;

	Ok(())
}
