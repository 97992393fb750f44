//! Firestore adapter error types.

use firebridge_domain::error::BridgeError;
use firebridge_domain::id::DocumentKey;

/// Errors specific to the Firestore adapter.
#[derive(Debug, thiserror::Error)]
pub enum FirestoreError {
    /// The reqwest client returned an error (connection, timeout, TLS).
    #[error("HTTP transport error")]
    Transport(#[from] reqwest::Error),

    /// Firestore answered with a non-success status.
    #[error("Firestore returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A document resource name has no key segment.
    #[error("invalid document name {0:?}")]
    InvalidDocumentName(String),

    /// The access token cannot be sent as a header.
    #[error("access token is not a valid header value")]
    InvalidToken,
}

impl FirestoreError {
    /// Convert a failed upsert into [`BridgeError::StoreWrite`].
    pub fn into_write(self, key: &DocumentKey) -> BridgeError {
        BridgeError::StoreWrite {
            key: key.clone(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_into_store_write_with_key() {
        let err = FirestoreError::Status {
            status: 403,
            body: "PERMISSION_DENIED".to_string(),
        }
        .into_write(&DocumentKey::new("lamp1"));
        assert_eq!(err.to_string(), "failed to write document lamp1");
        assert!(matches!(err, BridgeError::StoreWrite { ref key, .. } if key.as_str() == "lamp1"));
    }

    #[test]
    fn should_display_invalid_document_name() {
        let err = FirestoreError::InvalidDocumentName(String::new());
        assert_eq!(err.to_string(), "invalid document name \"\"");
    }
}
