use std::{
	collections::{HashMap, HashSet},
	future::Future,
	pin::Pin,
};

use axum::http::HeaderMap;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of verifying a bearer token. Internal callers are trusted
/// services; they see only public documents unless a request carries an
/// explicit user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerIdentity {
	User(String),
	Internal,
}

/// Hook to the external auth provider. The engine never issues tokens; it
/// only asks whether a presented one is valid and for whom.
pub trait IdentityVerifier: Send + Sync {
	fn verify<'a>(&'a self, bearer: &'a str) -> BoxFuture<'a, Option<CallerIdentity>>;
}

/// Config-backed verifier: fixed service tokens plus static token-to-user
/// bindings.
pub struct StaticTokenVerifier {
	service_tokens: HashSet<String>,
	identities: HashMap<String, String>,
}

impl StaticTokenVerifier {
	pub fn from_config(cfg: &prism_config::Security) -> Self {
		Self {
			service_tokens: cfg.service_tokens.iter().cloned().collect(),
			identities: cfg.static_identities.clone(),
		}
	}
}

impl IdentityVerifier for StaticTokenVerifier {
	fn verify<'a>(&'a self, bearer: &'a str) -> BoxFuture<'a, Option<CallerIdentity>> {
		Box::pin(async move {
			if self.service_tokens.contains(bearer) {
				return Some(CallerIdentity::Internal);
			}

			self.identities.get(bearer).cloned().map(CallerIdentity::User)
		})
	}
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
	headers
		.get(axum::http::header::AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "))
		.map(str::trim)
		.filter(|token| !token.is_empty())
}

/// Binds the verified identity to the caller id used by the storage
/// visibility rules. A `user_id` in the body is an internal-caller
/// privilege.
pub fn resolve_caller_id(
	identity: &CallerIdentity,
	requested_user_id: Option<String>,
) -> Result<Option<String>, String> {
	match identity {
		CallerIdentity::User(id) =>
			if requested_user_id.is_some() {
				Err("user_id is only accepted from service callers.".to_string())
			} else {
				Ok(Some(id.clone()))
			},
		CallerIdentity::Internal => Ok(requested_user_id),
	}
}

#[cfg(test)]
mod tests {
	use axum::http::HeaderValue;

	use super::*;

	fn verifier() -> StaticTokenVerifier {
		let mut cfg = prism_config::Security::default();

		cfg.service_tokens.push("svc-token".to_string());
		cfg.static_identities.insert("user-token".to_string(), "user-1".to_string());

		StaticTokenVerifier::from_config(&cfg)
	}

	#[tokio::test]
	async fn service_tokens_verify_as_internal() {
		assert_eq!(verifier().verify("svc-token").await, Some(CallerIdentity::Internal));
	}

	#[tokio::test]
	async fn user_tokens_verify_to_their_caller_id() {
		assert_eq!(
			verifier().verify("user-token").await,
			Some(CallerIdentity::User("user-1".to_string()))
		);
	}

	#[tokio::test]
	async fn unknown_tokens_are_rejected() {
		assert_eq!(verifier().verify("nope").await, None);
	}

	#[test]
	fn bearer_extraction_requires_the_scheme() {
		let mut headers = HeaderMap::new();

		assert!(bearer_token(&headers).is_none());

		headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));

		assert!(bearer_token(&headers).is_none());

		headers
			.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Bearer token-1"));

		assert_eq!(bearer_token(&headers), Some("token-1"));
	}

	#[test]
	fn user_callers_cannot_impersonate() {
		let identity = CallerIdentity::User("user-1".to_string());

		assert_eq!(resolve_caller_id(&identity, None), Ok(Some("user-1".to_string())));
		assert!(resolve_caller_id(&identity, Some("user-2".to_string())).is_err());
	}

	#[test]
	fn internal_callers_bind_the_requested_user() {
		assert_eq!(resolve_caller_id(&CallerIdentity::Internal, None), Ok(None));
		assert_eq!(
			resolve_caller_id(&CallerIdentity::Internal, Some("user-2".to_string())),
			Ok(Some("user-2".to_string()))
		);
	}
}
