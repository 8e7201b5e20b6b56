//! Request and response types exchanged between the client and the server.
//!
//! Secret `payload` and `meta` fields are ciphertext produced on the client.
//! They travel as standard base64 strings and are never interpreted by the
//! server.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// `POST`: create a user and open a session.
pub const REGISTER_PATH: &str = "/api/user/register";
/// `POST`: open a session for an existing user.
pub const LOGIN_PATH: &str = "/api/user/login";
/// `POST`: revoke the calling session.
pub const LOGOUT_PATH: &str = "/api/user/logout";
/// Collection of the caller's secrets; individual secrets live under `/{id}`.
pub const SECRET_PATH: &str = "/api/secret";

// ---------------------------------------------------------------------------
// Secret kinds
// ---------------------------------------------------------------------------

/// The kind of data a secret holds. Encoded as an integer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SecretKind {
    /// A login/password pair.
    LoginPassword = 1,
    /// Free text.
    Text = 2,
    /// An arbitrary file.
    Binary = 3,
    /// Bank card details.
    BankCard = 4,
}

impl SecretKind {
    /// Every kind, in wire order.
    pub const ALL: [SecretKind; 4] = [
        SecretKind::LoginPassword,
        SecretKind::Text,
        SecretKind::Binary,
        SecretKind::BankCard,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            SecretKind::LoginPassword => "Login & password",
            SecretKind::Text => "Text",
            SecretKind::Binary => "Binary (file)",
            SecretKind::BankCard => "Bank card",
        }
    }

    /// Parse the `type` query parameter of the list endpoint.
    ///
    /// An empty value means "every kind" and yields `Ok(None)`.
    pub fn from_query(raw: &str) -> Result<Option<Self>, InvalidSecretKind> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let n: u8 = raw.parse().map_err(|_| InvalidSecretKind(raw.to_owned()))?;
        SecretKind::try_from(n).map(Some)
    }
}

impl TryFrom<u8> for SecretKind {
    type Error = InvalidSecretKind;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SecretKind::LoginPassword),
            2 => Ok(SecretKind::Text),
            3 => Ok(SecretKind::Binary),
            4 => Ok(SecretKind::BankCard),
            other => Err(InvalidSecretKind(other.to_string())),
        }
    }
}

impl From<SecretKind> for u8 {
    fn from(kind: SecretKind) -> Self {
        kind as u8
    }
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A secret type value outside `1..=4`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid secret type: {0}")]
pub struct InvalidSecretKind(pub String);

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Request body for `POST /api/user/register` and `POST /api/user/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful response body for register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Opaque session token; also set as the `session` cookie.
    pub sid: String,
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// Request body for `POST /api/secret`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSecretRequest {
    /// Globally unique secret name.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SecretKind,
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub meta: Vec<u8>,
}

/// Request body for `PUT /api/secret/{id}`. The name is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSecretRequest {
    #[serde(rename = "type")]
    pub kind: SecretKind,
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub meta: Vec<u8>,
}

/// Response body for create and update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SecretIdResponse {
    pub id: i64,
}

/// A stored secret as returned by `GET /api/secret/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretBody {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: SecretKind,
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub meta: Vec<u8>,
}

/// Response body for `GET /api/secret`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretListResponse {
    pub secrets: Vec<SecretBody>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"forbidden"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: String,
    /// Number of sessions currently held in memory, expired or not.
    pub sessions: usize,
}

/// Serde adapter encoding `Vec<u8>` as a standard base64 string.
pub mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}
