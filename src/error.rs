//! Error kinds surfaced by registry operations

use thiserror::Error;

use crate::registry::MAX_DOMAINS;

/// Error from a registry operation
///
/// Network and certificate failures never appear here: they are folded into
/// the per-domain result fields by the checker.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Hostname failed grammar validation
    #[error("invalid domain: {0}")]
    InvalidDomain(String),
    /// Single add of a domain already present in the registry
    #[error("domain already exists: {0}")]
    DuplicateDomain(String),
    /// Registry already holds the maximum number of domains
    #[error("registry already has {MAX_DOMAINS} domains")]
    QuotaExceeded,
    /// No record with the given domain
    #[error("domain not found: {0}")]
    NotFound(String),
    /// Storage failure that survived the retry budget
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Registry file held malformed JSON
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
