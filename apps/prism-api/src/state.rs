use std::sync::Arc;

use prism_service::PrismService;
use prism_storage::db::Db;

use crate::auth::{IdentityVerifier, StaticTokenVerifier};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<PrismService>,
	pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
	pub async fn new(cfg: prism_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&cfg.storage.postgres).await?;

		db.ensure_schema(cfg.providers.embedding.dimensions).await?;

		let verifier = Arc::new(StaticTokenVerifier::from_config(&cfg.security));
		let service = Arc::new(PrismService::new(cfg, db));

		Ok(Self { service, verifier })
	}

	pub fn with_parts(service: Arc<PrismService>, verifier: Arc<dyn IdentityVerifier>) -> Self {
		Self { service, verifier }
	}
}
