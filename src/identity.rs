//! Document identity keys.
//!
//! The markup and script phases are invoked as independent callbacks, so the
//! only thing they share is the document path. Both phases derive the same
//! key from it and use that key to address the query store.

use sha2::{Digest, Sha256};

/// Derive the stable identity key for a document path.
///
/// Separators are normalized first so that the same document reached through
/// a Windows-style path and a POSIX-style path maps to one key.
pub fn document_key(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(feature = "napi")]
#[napi_derive::napi]
pub fn document_key_native(path: String) -> String {
    document_key(&path)
}
