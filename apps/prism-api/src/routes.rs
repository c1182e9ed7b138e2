use axum::{
	Json, Router,
	extract::State,
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use prism_service::{
	Error as ServiceError, InsightsRequest, InsightsResponse, RetrieveRequest, RetrieveResponse,
};
use serde::Serialize;

use crate::{
	auth::{self, CallerIdentity},
	state::AppState,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/retrieve", post(retrieve))
		.route("/v1/insights", post(insights))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn retrieve(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(raw): Json<serde_json::Value>,
) -> Result<Json<RetrieveResponse>, ApiError> {
	let identity = authenticate(&state, &headers).await?;
	let mut payload: RetrieveRequest = decode_body(raw)?;
	let caller_id = resolve_caller(&identity, payload.user_id.take())?;
	let response = state.service.retrieve(caller_id, payload).await?;

	Ok(Json(response))
}

async fn insights(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(raw): Json<serde_json::Value>,
) -> Result<Json<InsightsResponse>, ApiError> {
	let identity = authenticate(&state, &headers).await?;
	let mut payload: InsightsRequest = decode_body(raw)?;
	let caller_id = resolve_caller(&identity, payload.user_id.take())?;
	let response = state.service.insights(caller_id, payload).await?;

	Ok(Json(response))
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<CallerIdentity, ApiError> {
	let Some(bearer) = auth::bearer_token(headers) else {
		return Err(ApiError::new(
			StatusCode::UNAUTHORIZED,
			"A bearer token is required.",
			None,
		));
	};

	state.verifier.verify(bearer).await.ok_or_else(|| {
		ApiError::new(StatusCode::UNAUTHORIZED, "The bearer token is not recognized.", None)
	})
}

fn resolve_caller(
	identity: &CallerIdentity,
	requested_user_id: Option<String>,
) -> Result<Option<String>, ApiError> {
	auth::resolve_caller_id(identity, requested_user_id)
		.map_err(|message| ApiError::new(StatusCode::BAD_REQUEST, message, None))
}

/// Strict body decoding: any shape or type mismatch (including string
/// booleans) is a 400 naming the offending field.
fn decode_body<T: serde::de::DeserializeOwned>(raw: serde_json::Value) -> Result<T, ApiError> {
	serde_json::from_value(raw).map_err(|err| {
		ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid request body: {err}."), None)
	})
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	details: Option<serde_json::Value>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error: String,
	details: Option<serde_json::Value>,
}

impl ApiError {
	fn new(
		status: StatusCode,
		error: impl Into<String>,
		details: Option<serde_json::Value>,
	) -> Self {
		Self { status, error: error.into(), details }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, message, None),
			ServiceError::Unauthorized { message } =>
				Self::new(StatusCode::UNAUTHORIZED, message, None),
			ServiceError::Embedding { message } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, None),
			ServiceError::Retrieval { message } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, None),
			ServiceError::LlmTimeout { timeout_ms } => Self::new(
				StatusCode::INTERNAL_SERVER_ERROR,
				format!("LLM request timed out after {timeout_ms} ms."),
				None,
			),
			ServiceError::Llm { message } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, None),
			ServiceError::Storage { message } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, None),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error: self.error, details: self.details };

		(self.status, Json(body)).into_response()
	}
}
