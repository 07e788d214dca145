#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

//! Domain liveness and certificate expiry monitor

pub use certificate::CertificateInspector;
pub use checker::Checker;
pub use error::RegistryError;
pub use record::{DomainRecord, DomainStatus, ProbeResult, RegistryStats, NOT_AVAILABLE};
pub use registry::{AddReport, MergeReport, Registry, MAX_DOMAINS};
pub use retry::RetryPolicy;

mod certificate;
mod checker;
mod error;
mod record;
mod registry;
mod retry;
pub mod validate;
