//! Plaintext payload models.
//!
//! Each [`SecretKind`] has one JSON shape. The JSON bytes are what gets
//! encrypted into a secret's `payload`; the server never sees them.

use std::fmt;

use common::protocol::base64_bytes;
use common::SecretKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    /// The decrypted bytes are not the JSON shape of the expected kind.
    #[error("payload is not a valid {kind} record: {source}")]
    Decode {
        kind: SecretKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("metadata is not valid UTF-8")]
    Meta,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginPassword {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for LoginPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginPassword")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Text {
    pub value: String,
}

/// A file stored under its original name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Binary {
    pub name: String,
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BankCard {
    pub number: String,
    pub expire_at: String,
    pub name: String,
    pub surname: String,
}

impl fmt::Debug for BankCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankCard")
            .field("number", &"<redacted>")
            .field("expire_at", &self.expire_at)
            .field("name", &self.name)
            .field("surname", &self.surname)
            .finish()
    }
}

/// The decrypted content of a secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretPayload {
    LoginPassword(LoginPassword),
    Text(Text),
    Binary(Binary),
    BankCard(BankCard),
}

impl SecretPayload {
    pub fn kind(&self) -> SecretKind {
        match self {
            SecretPayload::LoginPassword(_) => SecretKind::LoginPassword,
            SecretPayload::Text(_) => SecretKind::Text,
            SecretPayload::Binary(_) => SecretKind::Binary,
            SecretPayload::BankCard(_) => SecretKind::BankCard,
        }
    }

    /// Serialize to the JSON bytes that get encrypted.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PayloadError> {
        let encoded = match self {
            SecretPayload::LoginPassword(v) => serde_json::to_vec(v),
            SecretPayload::Text(v) => serde_json::to_vec(v),
            SecretPayload::Binary(v) => serde_json::to_vec(v),
            SecretPayload::BankCard(v) => serde_json::to_vec(v),
        };
        encoded.map_err(PayloadError::Encode)
    }

    /// Parse decrypted bytes as the shape belonging to `kind`.
    ///
    /// Bytes written for a different kind are rejected.
    pub fn from_bytes(kind: SecretKind, bytes: &[u8]) -> Result<Self, PayloadError> {
        let decoded = match kind {
            SecretKind::LoginPassword => serde_json::from_slice(bytes).map(SecretPayload::LoginPassword),
            SecretKind::Text => serde_json::from_slice(bytes).map(SecretPayload::Text),
            SecretKind::Binary => serde_json::from_slice(bytes).map(SecretPayload::Binary),
            SecretKind::BankCard => serde_json::from_slice(bytes).map(SecretPayload::BankCard),
        };
        decoded.map_err(|source| PayloadError::Decode { kind, source })
    }
}

/// Decode secret metadata, which is free-form UTF-8 text.
pub fn meta_from_bytes(bytes: Vec<u8>) -> Result<String, PayloadError> {
    String::from_utf8(bytes).map_err(|_| PayloadError::Meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card() -> SecretPayload {
        SecretPayload::BankCard(BankCard {
            number: "4111111111111111".into(),
            expire_at: "12/29".into(),
            name: "Alice".into(),
            surname: "Liddell".into(),
        })
    }

    #[test]
    fn kind_follows_variant() {
        assert_eq!(card().kind(), SecretKind::BankCard);
        assert_eq!(
            SecretPayload::Text(Text { value: "x".into() }).kind(),
            SecretKind::Text
        );
    }

    #[test]
    fn json_field_names() {
        let bytes = card().to_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            json!({"number": "4111111111111111", "expire_at": "12/29", "name": "Alice", "surname": "Liddell"})
        );

        let file = SecretPayload::Binary(Binary {
            name: "id_rsa".into(),
            value: vec![0, 1, 2],
        });
        let value: serde_json::Value = serde_json::from_slice(&file.to_bytes().unwrap()).unwrap();
        assert_eq!(value, json!({"name": "id_rsa", "value": "AAEC"}));
    }

    #[test]
    fn decode_with_matching_kind() {
        let bytes = card().to_bytes().unwrap();
        assert_eq!(SecretPayload::from_bytes(SecretKind::BankCard, &bytes).unwrap(), card());
    }

    #[test]
    fn decode_rejects_other_kinds_shape() {
        let text = SecretPayload::Text(Text { value: "note".into() }).to_bytes().unwrap();
        for kind in [SecretKind::LoginPassword, SecretKind::Binary, SecretKind::BankCard] {
            assert!(
                matches!(SecretPayload::from_bytes(kind, &text), Err(PayloadError::Decode { .. })),
                "{kind}"
            );
        }

        let file = SecretPayload::Binary(Binary {
            name: "a".into(),
            value: vec![1],
        })
        .to_bytes()
        .unwrap();
        assert!(SecretPayload::from_bytes(SecretKind::Text, &file).is_err());
    }

    #[test]
    fn debug_redacts_sensitive_fields() {
        let lp = LoginPassword {
            login: "alice".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{lp:?}").contains("hunter2"));
        assert!(!format!("{:?}", card()).contains("4111"));
    }

    #[test]
    fn meta_must_be_utf8() {
        assert_eq!(meta_from_bytes(b"bank".to_vec()).unwrap(), "bank");
        assert!(matches!(meta_from_bytes(vec![0xff, 0xfe]), Err(PayloadError::Meta)));
    }
}
