use sqlx::PgPool;

use crate::Result;

/// Returns the cached bundle iff it has not expired.
pub async fn cache_get(pool: &PgPool, cache_key: &str) -> Result<Option<serde_json::Value>> {
	let bundle = sqlx::query_scalar::<_, serde_json::Value>(
		"SELECT bundle FROM insight_cache WHERE cache_key = $1 AND expires_at > now()",
	)
	.bind(cache_key)
	.fetch_optional(pool)
	.await?;

	Ok(bundle)
}

/// Upserts a bundle under its content address with a fresh TTL.
pub async fn cache_put(
	pool: &PgPool,
	cache_key: &str,
	bundle: &serde_json::Value,
	ttl_seconds: i64,
) -> Result<()> {
	sqlx::query(
		"INSERT INTO insight_cache (cache_key, bundle, created_at, expires_at) \
		 VALUES ($1, $2, now(), now() + make_interval(secs => $3)) \
		 ON CONFLICT (cache_key) DO UPDATE \
		 SET bundle = EXCLUDED.bundle, created_at = EXCLUDED.created_at, \
		 expires_at = EXCLUDED.expires_at",
	)
	.bind(cache_key)
	.bind(bundle)
	.bind(ttl_seconds as f64)
	.execute(pool)
	.await?;

	Ok(())
}

/// Drops expired entries. Callers treat this as housekeeping, not a
/// correctness requirement; `cache_get` already ignores expired rows.
pub async fn purge_expired(pool: &PgPool) -> Result<u64> {
	let result =
		sqlx::query("DELETE FROM insight_cache WHERE expires_at <= now()").execute(pool).await?;

	Ok(result.rows_affected())
}
