mod types;

pub use types::*;

pub fn load(path: &std::path::Path) -> color_eyre::Result<Config> {
	let raw = std::fs::read_to_string(path)?;
	let cfg: Config = toml::from_str(&raw)?;

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> color_eyre::Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(color_eyre::eyre::eyre!("service.http_bind must be non-empty."));
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(color_eyre::eyre::eyre!("storage.postgres.pool_max_conns must be at least 1."));
	}
	if !(0.0..=1.0).contains(&cfg.retrieval.similarity_threshold) {
		return Err(color_eyre::eyre::eyre!(
			"retrieval.similarity_threshold must be within [0, 1]."
		));
	}
	if cfg.retrieval.max_chunks == 0 {
		return Err(color_eyre::eyre::eyre!("retrieval.max_chunks must be at least 1."));
	}
	if cfg.retrieval.rrf_k == 0 {
		return Err(color_eyre::eyre::eyre!("retrieval.rrf_k must be at least 1."));
	}
	if cfg.insights.cache_ttl_seconds <= 0 {
		return Err(color_eyre::eyre::eyre!("insights.cache_ttl_seconds must be positive."));
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(color_eyre::eyre::eyre!(
			"providers.embedding.dimensions must be greater than zero."
		));
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("chat", &cfg.providers.chat.api_key),
	] {
		if key.trim().is_empty() {
			return Err(color_eyre::eyre::eyre!("Provider {label} api_key must be non-empty."));
		}
	}

	Ok(())
}
