//! HTTP driver for the keeper server.
//!
//! [`KeeperClient`] owns the session token and the parsed private key of the
//! logged-in user. Payload and metadata are encrypted before they leave the
//! process and decrypted after they come back; the server only ever handles
//! ciphertext.

use std::fmt;

use common::protocol::{
    CreateSecretRequest, Credentials, ErrorResponse, SecretBody, SecretIdResponse,
    SecretListResponse, SessionResponse, UpdateSecretRequest, LOGIN_PATH, LOGOUT_PATH,
    REGISTER_PATH, SECRET_PATH,
};
use common::{SecretKind, ServiceError};
use reqwest::{header::AUTHORIZATION, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::crypto::{EnvelopeError, EnvelopeKey};
use crate::keys::{KeyFileError, KeyStore};
use crate::payload::{self, PayloadError, SecretPayload};

/// Errors surfaced by [`KeeperClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error status.
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    KeyFile(#[from] KeyFileError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("key generation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A secret to create, in plaintext.
#[derive(Debug, Clone)]
pub struct NewSecret {
    pub name: String,
    pub payload: SecretPayload,
    pub meta: String,
}

/// A secret fetched and decrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    pub id: i64,
    pub name: String,
    pub kind: SecretKind,
    pub payload: SecretPayload,
    pub meta: String,
}

/// One row of a listing. Contents stay encrypted; only identity is exposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretSummary {
    pub id: i64,
    pub name: String,
    pub kind: SecretKind,
}

struct Session {
    token: String,
    key: EnvelopeKey,
}

/// Client for one user at a time.
pub struct KeeperClient {
    http: reqwest::Client,
    base_url: String,
    keys: KeyStore,
    session: Option<Session>,
}

impl fmt::Debug for KeeperClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeeperClient")
            .field("base_url", &self.base_url)
            .field("keys", &self.keys)
            .field("logged_in", &self.session.is_some())
            .finish()
    }
}

impl KeeperClient {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:8080`).
    pub fn new(base_url: impl Into<String>, keys: KeyStore) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("keeper/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            keys,
            session: None,
        })
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// Register `login`, generate its key pair, and store the private key.
    ///
    /// The key is generated before the server is contacted and written only
    /// once registration succeeds.
    pub async fn register(&mut self, login: &str, password: &str) -> Result<(), ClientError> {
        self.keys.path_for(login)?;

        let key = tokio::task::spawn_blocking(EnvelopeKey::generate).await??;
        let pem = key.to_pem()?;

        let sid = self.open_session(REGISTER_PATH, login, password).await?;
        let path = self.keys.save(login, &pem).await?;
        info!(path = %path.display(), "registered; key file written");

        self.session = Some(Session { token: sid, key });
        Ok(())
    }

    /// Log in as `login` and load its private key.
    pub async fn login(&mut self, login: &str, password: &str) -> Result<(), ClientError> {
        self.keys.path_for(login)?;

        let sid = self.open_session(LOGIN_PATH, login, password).await?;
        let pem = self.keys.load(login).await?;
        let key = EnvelopeKey::from_pem(&pem)?;
        debug!("logged in");

        self.session = Some(Session { token: sid, key });
        Ok(())
    }

    /// Revoke the current session. Local state is cleared even if the
    /// server call fails.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let session = self.session.take().ok_or_else(not_logged_in)?;
        let req = self
            .http
            .post(self.url(LOGOUT_PATH))
            .header(AUTHORIZATION, &session.token);
        send(req).await?;
        Ok(())
    }

    /// List the caller's secrets, optionally of one kind only.
    pub async fn list(&self, kind: Option<SecretKind>) -> Result<Vec<SecretSummary>, ClientError> {
        let (token, _) = self.session()?;
        let mut req = self.http.get(self.url(SECRET_PATH)).header(AUTHORIZATION, token);
        if let Some(kind) = kind {
            req = req.query(&[("type", u8::from(kind))]);
        }
        let list: SecretListResponse = json(send(req).await?).await?;
        Ok(list
            .secrets
            .into_iter()
            .map(|s| SecretSummary {
                id: s.id,
                name: s.name,
                kind: s.kind,
            })
            .collect())
    }

    /// Encrypt and store a new secret; returns its id.
    pub async fn create(&self, secret: NewSecret) -> Result<i64, ClientError> {
        let (token, key) = self.session()?;
        let body = CreateSecretRequest {
            name: secret.name,
            kind: secret.payload.kind(),
            payload: key.encrypt(&secret.payload.to_bytes()?)?,
            meta: key.encrypt(secret.meta.as_bytes())?,
        };
        let req = self
            .http
            .post(self.url(SECRET_PATH))
            .header(AUTHORIZATION, token)
            .json(&body);
        let created: SecretIdResponse = json(send(req).await?).await?;
        Ok(created.id)
    }

    /// Fetch and decrypt one secret.
    pub async fn get(&self, id: i64) -> Result<Secret, ClientError> {
        let (token, key) = self.session()?;
        let req = self
            .http
            .get(self.url(&format!("{SECRET_PATH}/{id}")))
            .header(AUTHORIZATION, token);
        let body: SecretBody = json(send(req).await?).await?;

        let plaintext = key.decrypt(&body.payload)?;
        Ok(Secret {
            id: body.id,
            name: body.name,
            kind: body.kind,
            payload: SecretPayload::from_bytes(body.kind, &plaintext)?,
            meta: payload::meta_from_bytes(key.decrypt(&body.meta)?)?,
        })
    }

    /// Replace the content of an existing secret. The name cannot change.
    pub async fn update(&self, id: i64, payload: SecretPayload, meta: &str) -> Result<i64, ClientError> {
        let (token, key) = self.session()?;
        let body = UpdateSecretRequest {
            kind: payload.kind(),
            payload: key.encrypt(&payload.to_bytes()?)?,
            meta: key.encrypt(meta.as_bytes())?,
        };
        let req = self
            .http
            .put(self.url(&format!("{SECRET_PATH}/{id}")))
            .header(AUTHORIZATION, token)
            .json(&body);
        let updated: SecretIdResponse = json(send(req).await?).await?;
        Ok(updated.id)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        let (token, _) = self.session()?;
        let req = self
            .http
            .delete(self.url(&format!("{SECRET_PATH}/{id}")))
            .header(AUTHORIZATION, token);
        send(req).await?;
        Ok(())
    }

    async fn open_session(&self, path: &str, login: &str, password: &str) -> Result<String, ClientError> {
        let credentials = Credentials {
            login: login.to_owned(),
            password: password.to_owned(),
        };
        let req = self.http.post(self.url(path)).json(&credentials);
        let session: SessionResponse = json(send(req).await?).await?;
        Ok(session.sid)
    }

    fn session(&self) -> Result<(&str, &EnvelopeKey), ClientError> {
        self.session
            .as_ref()
            .map(|s| (s.token.as_str(), &s.key))
            .ok_or_else(not_logged_in)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn not_logged_in() -> ClientError {
    ServiceError::Unauthorized("not logged in".into()).into()
}

/// Send `req`, mapping non-2xx statuses onto [`ServiceError`].
async fn send(req: RequestBuilder) -> Result<Response, ClientError> {
    let resp = req.send().await?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_owned());
    debug!(status = status.as_u16(), %message, "server returned an error");
    Err(ServiceError::from_status(status.as_u16(), message).into())
}

async fn json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    Ok(resp.json().await?)
}
