//! Per-user domain registries: durable storage and result merging

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, error, info};

use crate::error::RegistryError;
use crate::record::{DomainRecord, DomainStatus, ProbeResult, RegistryStats};
use crate::retry::RetryPolicy;
use crate::validate::is_valid_domain;

/// Maximum number of domains one user registry may hold
pub const MAX_DOMAINS: usize = 100;

/// Outcome of an add operation
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AddReport {
    /// Records appended to the registry
    pub records_written: usize,
    /// Lines rejected by hostname validation
    pub bad_domains: usize,
}

/// Outcome of a merge operation
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MergeReport {
    /// Results applied to a matching record
    pub updated: usize,
    /// Results without a matching record, dropped
    pub dropped: usize,
}

/// Durable per-user collection of domain records
///
/// One JSON array per user under `data_dir`, keyed by the lower-cased
/// username. Every mutation runs load-mutate-rewrite under that user's lock;
/// the file reads and writes are additionally wrapped in the bounded retry
/// policy to absorb transient filesystem errors.
#[derive(Debug)]
pub struct Registry {
    data_dir: PathBuf,
    retry: RetryPolicy,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Registry {
    /// Registry rooted at `data_dir`
    ///
    /// ```
    /// # use dms::Registry;
    /// let registry = Registry::new("data/domains");
    /// ```
    pub fn new<P>(data_dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Registry {
            data_dir: data_dir.into(),
            retry: RetryPolicy::default(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Append one domain with `Pending` status
    ///
    /// The domain is validated after prefix stripping but stored exactly as
    /// given. Fails with `InvalidDomain`, `QuotaExceeded` or
    /// `DuplicateDomain`.
    pub fn add(&self, username: &str, domain: &str) -> Result<AddReport, RegistryError> {
        if !is_valid_domain(domain) {
            error!("user {username} failed to add domain: {domain}");
            return Err(RegistryError::InvalidDomain(domain.to_string()));
        }

        let lock = self.user_lock(username);
        let _guard = lock.lock().unwrap();

        let path = self.user_file(username);
        let mut records = self.read_records(&path)?;
        if records.len() >= MAX_DOMAINS {
            error!("user {username} already has {MAX_DOMAINS} domains");
            return Err(RegistryError::QuotaExceeded);
        }
        if records.iter().any(|r| r.domain == domain) {
            return Err(RegistryError::DuplicateDomain(domain.to_string()));
        }

        records.push(DomainRecord::new(domain));
        self.write_records(&path, &records)?;
        info!("user {username} added domain {domain}");
        Ok(AddReport {
            records_written: 1,
            bad_domains: 0,
        })
    }

    /// Append every valid, non-duplicate line of a domain list, up to the
    /// remaining quota
    ///
    /// Invalid lines are counted as bad domains and skipped; duplicates
    /// against the registry or earlier in the batch are skipped silently.
    /// Fails with `QuotaExceeded` only when the registry is already full.
    pub fn add_bulk<T>(&self, username: &str, domains: &[T]) -> Result<AddReport, RegistryError>
    where
        T: AsRef<str>,
    {
        let lock = self.user_lock(username);
        let _guard = lock.lock().unwrap();

        let path = self.user_file(username);
        let mut records = self.read_records(&path)?;
        if records.len() >= MAX_DOMAINS {
            error!("user {username} already has {MAX_DOMAINS} domains");
            return Err(RegistryError::QuotaExceeded);
        }

        let mut allowed = MAX_DOMAINS - records.len();
        let mut report = AddReport::default();
        for domain in domains {
            if allowed == 0 {
                break;
            }
            let domain = domain.as_ref();
            if !is_valid_domain(domain) {
                debug!("user {username} uploaded bad domain {domain}");
                report.bad_domains += 1;
                continue;
            }
            if records.iter().any(|r| r.domain == domain) {
                debug!("user {username} skipped duplicate domain {domain}");
                continue;
            }
            records.push(DomainRecord::new(domain));
            allowed -= 1;
            report.records_written += 1;
        }

        if report.records_written > 0 {
            self.write_records(&path, &records)?;
        }
        info!(
            "user {username} imported {} domain(s) with {} bad domain(s)",
            report.records_written, report.bad_domains
        );
        Ok(report)
    }

    /// Remove the first record matching `domain` exactly
    ///
    /// Repeated deletes of an absent domain keep returning `NotFound` with
    /// no side effects.
    pub fn delete(&self, username: &str, domain: &str) -> Result<(), RegistryError> {
        let lock = self.user_lock(username);
        let _guard = lock.lock().unwrap();

        let path = self.user_file(username);
        let mut records = self.read_records(&path)?;
        match records.iter().position(|r| r.domain == domain) {
            Some(index) => {
                records.remove(index);
                self.write_records(&path, &records)?;
                info!("user {username} deleted domain {domain}");
                Ok(())
            }
            None => Err(RegistryError::NotFound(domain.to_string())),
        }
    }

    /// Overwrite matching records with freshly produced probe results
    ///
    /// Each result updates the first record with an equal `domain`. Results
    /// without a match are dropped, so a domain removed between dispatch and
    /// merge keeps its last known state. The file is rewritten only when
    /// something matched.
    pub fn merge(
        &self,
        username: &str,
        results: &[ProbeResult],
    ) -> Result<MergeReport, RegistryError> {
        let lock = self.user_lock(username);
        let _guard = lock.lock().unwrap();

        let path = self.user_file(username);
        let mut records = self.read_records(&path)?;
        let mut report = MergeReport::default();
        for result in results {
            match records.iter_mut().find(|r| r.domain == result.domain) {
                Some(record) => {
                    record.status = result.status;
                    record.ssl_issuer = result.ssl_issuer.clone();
                    record.ssl_expiration = result.ssl_expiration.clone();
                    record.last_chk = result.last_chk.clone();
                    report.updated += 1;
                }
                None => {
                    debug!("dropping result for unknown domain {}", result.domain);
                    report.dropped += 1;
                }
            }
        }

        if report.updated > 0 {
            self.write_records(&path, &records)?;
        }
        Ok(report)
    }

    /// All records of `username`, empty if the registry does not exist yet
    ///
    /// Takes the user lock: a plain file mid-rewrite is not safe to read
    /// concurrently.
    pub fn load(&self, username: &str) -> Result<Vec<DomainRecord>, RegistryError> {
        let lock = self.user_lock(username);
        let _guard = lock.lock().unwrap();
        self.read_records(&self.user_file(username))
    }

    /// Domain names of `username` in registry order
    pub fn domains(&self, username: &str) -> Result<Vec<String>, RegistryError> {
        Ok(self.load(username)?.into_iter().map(|r| r.domain).collect())
    }

    /// Aggregate liveness and certificate counts over the registry
    pub fn stats(&self, username: &str) -> Result<RegistryStats, RegistryError> {
        let records = self.load(username)?;
        let mut stats = RegistryStats {
            total_domains: records.len(),
            ..Default::default()
        };
        for record in &records {
            match record.status {
                DomainStatus::Ok => stats.online_domains += 1,
                DomainStatus::Failed => stats.offline_domains += 1,
                DomainStatus::Pending => stats.pending_domains += 1,
            }
            if record.ssl_expiration.starts_with("EXPIRED:") {
                stats.ssl_expired += 1;
            }
        }
        Ok(stats)
    }

    fn user_file(&self, username: &str) -> PathBuf {
        let username = username.to_lowercase();
        self.data_dir.join(format!("{username}_domains.json"))
    }

    fn user_lock(&self, username: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks.entry(username.to_lowercase()).or_default().clone()
    }

    fn read_records(&self, path: &Path) -> Result<Vec<DomainRecord>, RegistryError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = self.retry.run(|| fs::read_to_string(path))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_records(&self, path: &Path, records: &[DomainRecord]) -> Result<(), RegistryError> {
        let serialized = serde_json::to_string_pretty(records)?;
        self.retry.run(|| {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &serialized)
        })?;
        Ok(())
    }
}
