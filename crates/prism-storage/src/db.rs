use crate::Result;

const SCHEMA_TEMPLATE: &str = include_str!("../../../sql/init.sql");
const SCHEMA_LOCK_ID: i64 = 7_715_273;

pub struct Db {
	pub pool: sqlx::PgPool,
}

impl Db {
	pub async fn connect(cfg: &prism_config::Postgres) -> Result<Self> {
		let pool = sqlx::postgres::PgPoolOptions::new()
			.max_connections(cfg.pool_max_conns)
			.connect(&cfg.dsn)
			.await?;

		Ok(Self { pool })
	}

	/// Builds the pool without touching the server; connections are opened
	/// on first use. Useful for exercising request validation in tests.
	pub fn connect_lazy(cfg: &prism_config::Postgres) -> Result<Self> {
		let pool = sqlx::postgres::PgPoolOptions::new()
			.max_connections(cfg.pool_max_conns)
			.connect_lazy(&cfg.dsn)?;

		Ok(Self { pool })
	}

	/// Applies the idempotent schema, rendered for the configured embedding
	/// dimension. An advisory lock serializes concurrent boots so they do
	/// not race the DDL; the lock is released even when a statement fails
	/// (and dies with the session if the release itself does).
	pub async fn ensure_schema(&self, vector_dim: u32) -> Result<()> {
		sqlx::query("SELECT pg_advisory_lock($1)")
			.bind(SCHEMA_LOCK_ID)
			.execute(&self.pool)
			.await?;

		let applied = self.apply_schema(vector_dim).await;
		let _ = sqlx::query("SELECT pg_advisory_unlock($1)")
			.bind(SCHEMA_LOCK_ID)
			.execute(&self.pool)
			.await;

		applied
	}

	async fn apply_schema(&self, vector_dim: u32) -> Result<()> {
		for statement in schema_statements(vector_dim) {
			sqlx::query(&statement).execute(&self.pool).await?;
		}

		Ok(())
	}
}

/// Renders `sql/init.sql` for the given vector dimension and splits it into
/// individual executable statements.
fn schema_statements(vector_dim: u32) -> Vec<String> {
	SCHEMA_TEMPLATE
		.replace("<VECTOR_DIM>", &vector_dim.to_string())
		.split(';')
		.map(str::trim)
		.filter(|statement| !statement.is_empty())
		.map(str::to_string)
		.collect()
}
