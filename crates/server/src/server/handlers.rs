//! Axum request handlers for all service endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{
        header::{AUTHORIZATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{
    CreateSecretRequest, Credentials, ErrorResponse, HealthResponse, SecretBody,
    SecretIdResponse, SecretListResponse, SessionResponse, UpdateSecretRequest,
};
use common::{SecretKind, ServiceError};
use serde::Deserialize;

use super::error::ApiError;
use super::middleware::{session_cookie, SessionToken};
use super::state::AppState;
use crate::secrets::{NewSecret, SecretId, SecretUpdate};

/// `POST /api/user/register`: create a user and open a session.
pub async fn register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, ApiError> {
    let sid = state.accounts.register(credentials).await?;
    session_response(&state, sid)
}

/// `POST /api/user/login`: verify credentials and open a session.
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, ApiError> {
    let sid = state.accounts.login(credentials).await?;
    session_response(&state, sid)
}

/// `POST /api/user/logout`: revoke the calling session.
pub async fn logout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<StatusCode, ApiError> {
    state.accounts.logout(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Session token in the body, the `session` cookie, and the `Authorization`
/// header, so both cookie-based and header-based clients pick it up.
fn session_response(state: &AppState, sid: String) -> Result<Response, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, session_cookie(&sid, state.sessions.ttl())?);
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&sid)
            .map_err(|_| ServiceError::Internal("session token is not a valid header value".into()))?,
    );
    Ok((StatusCode::OK, headers, Json(SessionResponse { sid })).into_response())
}

/// `POST /api/secret`: store a new secret for the caller.
pub async fn create_secret(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Json(req): Json<CreateSecretRequest>,
) -> Result<(StatusCode, Json<SecretIdResponse>), ApiError> {
    let secret = NewSecret {
        name: req.name,
        kind: req.kind,
        payload: req.payload,
        meta: req.meta,
    };
    let id = state.secrets.create(&token, secret).await?;
    Ok((StatusCode::CREATED, Json(SecretIdResponse { id })))
}

/// Query string of `GET /api/secret`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Secret kind as its wire integer; absent or empty lists every kind.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// `GET /api/secret?type=N`: list the caller's secrets.
pub async fn list_secrets(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Query(query): Query<ListQuery>,
) -> Result<Json<SecretListResponse>, ApiError> {
    let kind = SecretKind::from_query(query.kind.as_deref().unwrap_or_default())
        .map_err(|e| ServiceError::BadRequest(e.to_string()))?;
    let secrets = state.secrets.list(&token, kind).await?;
    Ok(Json(SecretListResponse {
        secrets: secrets.into_iter().map(SecretBody::from).collect(),
    }))
}

/// `GET /api/secret/{id}`: fetch one of the caller's secrets.
pub async fn get_secret(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(id): Path<SecretId>,
) -> Result<Json<SecretBody>, ApiError> {
    let secret = state.secrets.get(&token, id).await?;
    Ok(Json(secret.into()))
}

/// `PUT /api/secret/{id}`: replace the content of one of the caller's secrets.
pub async fn update_secret(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(id): Path<SecretId>,
    Json(req): Json<UpdateSecretRequest>,
) -> Result<Json<SecretIdResponse>, ApiError> {
    let update = SecretUpdate {
        kind: req.kind,
        payload: req.payload,
        meta: req.meta,
    };
    let id = state.secrets.update(&token, id, update).await?;
    Ok(Json(SecretIdResponse { id }))
}

/// `DELETE /api/secret/{id}`: delete one of the caller's secrets.
pub async fn delete_secret(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(id): Path<SecretId>,
) -> Result<StatusCode, ApiError> {
    state.secrets.delete(&token, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /health`: liveness check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        sessions: state.sessions.len().await,
    })
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}
