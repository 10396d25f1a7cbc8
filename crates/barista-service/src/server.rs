//! HTTP chat gateway.
//!
//! Exposes the order engine to chat front-ends: one endpoint feeds a user
//! input into a conversation, another reads the conversation back.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Json, Response},
	routing::{get, post},
	Router,
};
use barista_config::ApiConfig;
use barista_core::{
	Choice, Input, OrderEngine, Reply, SessionBusy, SessionSnapshot, UnknownChoice,
};
use barista_types::ConversationId;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<OrderEngine>,
}

/// Errors returned to API clients.
#[derive(Debug, Error)]
pub enum ApiError {
	#[error(transparent)]
	UnknownChoice(#[from] UnknownChoice),
	#[error("Conversation {0} not found")]
	NotFound(ConversationId),
	#[error(transparent)]
	Busy(#[from] SessionBusy),
	#[error("Turn failed: {0}")]
	Internal(String),
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = match &self {
			ApiError::UnknownChoice(_) => StatusCode::BAD_REQUEST,
			ApiError::NotFound(_) => StatusCode::NOT_FOUND,
			ApiError::Busy(_) => StatusCode::CONFLICT,
			ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		};
		(status, Json(json!({ "error": self.to_string() }))).into_response()
	}
}

/// What the user did, as sent by the front-end.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputBody {
	Start,
	Text { text: String },
	Choice { token: String },
}

/// Body of `POST /api/conversations/{id}/input`.
#[derive(Debug, Deserialize)]
pub struct InputRequest {
	#[serde(flatten)]
	pub input: InputBody,
	#[serde(default)]
	pub username: Option<String>,
}

impl TryFrom<InputBody> for Input {
	type Error = UnknownChoice;

	fn try_from(body: InputBody) -> Result<Self, Self::Error> {
		Ok(match body {
			InputBody::Start => Input::Start,
			InputBody::Text { text } => Input::Text(text),
			InputBody::Choice { token } => Input::Choice(token.parse::<Choice>()?),
		})
	}
}

/// Builds the router with all routes and middleware.
pub fn router(engine: Arc<OrderEngine>, request_timeout: Duration) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/conversations/{id}", get(handle_get_conversation))
				.route("/conversations/{id}/input", post(handle_input)),
		)
		.route("/health", get(handle_health))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(request_timeout))
				.layer(CorsLayer::permissive()),
		)
		.with_state(AppState { engine })
}

/// Starts the HTTP server and serves until the listener fails.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<OrderEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(engine, Duration::from_secs(api_config.timeout_seconds));

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Barista API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles POST /api/conversations/{id}/input.
///
/// The turn runs detached from the request, so a request timeout never
/// interrupts an order submission half way.
async fn handle_input(
	Path(id): Path<i64>,
	State(state): State<AppState>,
	Json(request): Json<InputRequest>,
) -> Result<Json<Reply>, ApiError> {
	let input = Input::try_from(request.input).map_err(|e| {
		tracing::warn!(conversation = id, error = %e, "Rejected input");
		e
	})?;

	let reply = state
		.engine
		.handle_detached(ConversationId(id), request.username, input)
		.await
		.map_err(|e| {
			tracing::error!(conversation = id, error = %e, "Turn task failed");
			ApiError::Internal(e.to_string())
		})?;
	Ok(Json(reply))
}

/// Handles GET /api/conversations/{id}.
///
/// Answers 409 while a turn of the conversation is in flight.
async fn handle_get_conversation(
	Path(id): Path<i64>,
	State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, ApiError> {
	let conversation = ConversationId(id);
	state
		.engine
		.try_snapshot(conversation)?
		.map(Json)
		.ok_or(ApiError::NotFound(conversation))
}

async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
	Json(json!({
		"status": "ok",
		"active_sessions": state.engine.active_sessions(),
	}))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::factory_registry::build_engine_from_config;
	use axum::body::{to_bytes, Body};
	use axum::http::Request;
	use serde_json::Value;
	use tower::ServiceExt;

	const CONFIG: &str = r#"
[shop]
name = "Bean There"

[catalog]
primary = "memory"

[[catalog.implementations.memory.products]]
id = "1"
name = "Latte"
price = 250
category = "Coffee"
"#;

	fn app() -> Router {
		let engine = build_engine_from_config(CONFIG.parse().unwrap()).unwrap();
		router(Arc::new(engine), Duration::from_secs(5))
	}

	async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
		let response = app.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		let body = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap()
		};
		(status, body)
	}

	fn post_input(id: i64, body: Value) -> Request<Body> {
		Request::post(format!("/api/conversations/{}/input", id))
			.header("content-type", "application/json")
			.body(Body::from(body.to_string()))
			.unwrap()
	}

	#[test]
	fn test_input_request_parsing() {
		let request: InputRequest =
			serde_json::from_value(json!({ "type": "choice", "token": "quantity_2", "username": "ann" }))
				.unwrap();
		assert_eq!(request.username.as_deref(), Some("ann"));
		assert_eq!(
			Input::try_from(request.input).unwrap(),
			Input::Choice(Choice::Quantity(2))
		);

		let request: InputRequest = serde_json::from_value(json!({ "type": "start" })).unwrap();
		assert!(request.username.is_none());
		assert_eq!(Input::try_from(request.input).unwrap(), Input::Start);
	}

	#[tokio::test]
	async fn test_conversation_round_trip() {
		let app = app();

		let (status, _) = send(
			&app,
			Request::get("/api/conversations/5").body(Body::empty()).unwrap(),
		)
		.await;
		assert_eq!(status, StatusCode::NOT_FOUND);

		let (status, reply) = send(&app, post_input(5, json!({ "type": "choice", "token": "menu" }))).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(reply["state"], "browsing_categories");
		assert_eq!(reply["messages"][0]["menu"]["rows"][0][0]["token"], "category_Coffee");

		let (status, snapshot) = send(
			&app,
			Request::get("/api/conversations/5").body(Body::empty()).unwrap(),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(snapshot["state"], "browsing_categories");
		assert_eq!(snapshot["total"], 0);
	}

	#[tokio::test]
	async fn test_unknown_token_is_bad_request() {
		let app = app();

		let (status, body) =
			send(&app, post_input(5, json!({ "type": "choice", "token": "checkout" }))).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert!(body["error"].as_str().unwrap().contains("checkout"));
	}

	#[test]
	fn test_error_statuses() {
		let status = |e: ApiError| e.into_response().status();
		assert_eq!(status(SessionBusy(ConversationId(5)).into()), StatusCode::CONFLICT);
		assert_eq!(status(ApiError::NotFound(ConversationId(5))), StatusCode::NOT_FOUND);
		assert_eq!(
			status(ApiError::Internal("task panicked".into())),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}

	#[tokio::test]
	async fn test_health() {
		let (status, body) = send(&app(), Request::get("/health").body(Body::empty()).unwrap()).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "ok");
	}
}
