//! Content key layout.
//!
//! Version content lives under `documents/{document_id}/versions/{version_id}`.
//! The version id is allocated before the bytes are written, so a key is
//! only ever written once and never shared between two uploads.

use uuid::Uuid;

/// Key prefix for everything belonging to a document.
pub fn document_prefix(document_id: Uuid) -> String {
    format!("documents/{document_id}")
}

/// Key for the bytes first written by `version_id`.
pub fn version_key(document_id: Uuid, version_id: Uuid) -> String {
    format!("{}/versions/{version_id}", document_prefix(document_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_key_layout() {
        let id = Uuid::nil();
        let version = Uuid::from_u128(1);
        assert_eq!(
            version_key(id, version),
            "documents/00000000-0000-0000-0000-000000000000/versions/00000000-0000-0000-0000-000000000001"
        );
    }

    #[test]
    fn test_versions_never_share_a_key() {
        let doc = Uuid::new_v4();
        assert_ne!(version_key(doc, Uuid::new_v4()), version_key(doc, Uuid::new_v4()));
    }
}
