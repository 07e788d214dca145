use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel for the ssl fields of a record no successful secured check has
/// populated yet
pub const NOT_AVAILABLE: &str = "N/A";

/// Liveness classification of a domain's most recent probe
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DomainStatus {
    /// Not probed since the record was created
    Pending,
    /// Last probe returned HTTP 200
    #[serde(rename = "OK")]
    Ok,
    /// Last probe failed on the network or returned a non-200 status
    #[serde(rename = "FAILED")]
    Failed,
}

impl Default for DomainStatus {
    fn default() -> Self {
        DomainStatus::Pending
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainStatus::Pending => write!(f, "Pending"),
            DomainStatus::Ok => write!(f, "OK"),
            DomainStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// One monitored domain as persisted in a user registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Hostname exactly as given when the record was added
    pub domain: String,
    /// Liveness classification of the most recent probe
    pub status: DomainStatus,
    /// `"N/A"`, a formatted timestamp or `"EXPIRED: <timestamp>"`
    pub ssl_expiration: String,
    /// Certificate issuer organization, `"N/A"` until a secured check succeeds
    pub ssl_issuer: String,
    /// When the domain was last probed, empty until the first check
    pub last_chk: String,
}

impl DomainRecord {
    /// Fresh record for a newly added domain
    ///
    /// ```
    /// # use dms::DomainRecord;
    /// let record = DomainRecord::new("example.com");
    /// ```
    pub fn new<T>(domain: T) -> Self
    where
        T: Into<String>,
    {
        DomainRecord {
            domain: domain.into(),
            status: DomainStatus::Pending,
            ssl_expiration: NOT_AVAILABLE.to_string(),
            ssl_issuer: NOT_AVAILABLE.to_string(),
            last_chk: String::new(),
        }
    }
}

impl fmt::Display for DomainRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.domain, self.status)?;
        if self.ssl_expiration != NOT_AVAILABLE {
            write!(
                f,
                ", certificate by {} expires {}",
                self.ssl_issuer, self.ssl_expiration
            )?;
        }
        if !self.last_chk.is_empty() {
            write!(f, ", last checked {}", self.last_chk)?;
        }
        Ok(())
    }
}

/// Outcome of one probe, produced fresh per check and persisted only through
/// the merger
#[derive(Clone, Debug)]
pub struct ProbeResult {
    /// Domain exactly as it was dispatched
    pub domain: String,
    /// Liveness classification of this probe
    pub status: DomainStatus,
    /// Certificate issuer organization, `"N/A"` unless the probe succeeded
    /// over HTTPS
    pub ssl_issuer: String,
    /// Certificate expiration, `"N/A"` unless the probe succeeded over HTTPS
    pub ssl_expiration: String,
    /// When the probe ran, stamped on every outcome
    pub last_chk: String,
}

impl ProbeResult {
    /// Result skeleton for a dispatched probe
    pub fn new<T>(domain: T) -> Self
    where
        T: Into<String>,
    {
        ProbeResult {
            domain: domain.into(),
            status: DomainStatus::Pending,
            ssl_issuer: NOT_AVAILABLE.to_string(),
            ssl_expiration: NOT_AVAILABLE.to_string(),
            last_chk: String::new(),
        }
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.domain, self.status)?;
        if self.ssl_expiration != NOT_AVAILABLE {
            write!(
                f,
                ", certificate by {} expires {}",
                self.ssl_issuer, self.ssl_expiration
            )?;
        }
        Ok(())
    }
}

/// Aggregate counts over one user registry
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RegistryStats {
    /// Records in the registry
    pub total_domains: usize,
    /// Records whose last probe returned HTTP 200
    pub online_domains: usize,
    /// Records whose last probe failed
    pub offline_domains: usize,
    /// Records never probed
    pub pending_domains: usize,
    /// Records with an expired certificate
    pub ssl_expired: usize,
}

impl fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} domain(s): {} online, {} offline, {} pending, {} expired certificate(s)",
            self.total_domains,
            self.online_domains,
            self.offline_domains,
            self.pending_domains,
            self.ssl_expired
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn t_new_record_is_pending() {
        let record = DomainRecord::new("example.com");
        assert_eq!("example.com", record.domain);
        assert_eq!(DomainStatus::Pending, record.status);
        assert_eq!(NOT_AVAILABLE, record.ssl_issuer);
        assert_eq!(NOT_AVAILABLE, record.ssl_expiration);
        assert!(record.last_chk.is_empty());
    }

    #[test]
    fn t_wire_format() {
        let record = DomainRecord::new("example.com");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!("example.com", value["domain"]);
        assert_eq!("Pending", value["status"]);
        assert_eq!("N/A", value["ssl_expiration"]);
        assert_eq!("N/A", value["ssl_issuer"]);
        assert_eq!("", value["last_chk"]);
    }

    #[test]
    fn t_wire_status_values() {
        let mut record = DomainRecord::new("example.com");
        record.status = DomainStatus::Ok;
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!("OK", value["status"]);

        record.status = DomainStatus::Failed;
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!("FAILED", value["status"]);
    }

    #[test]
    fn t_deserialize_registry_row() {
        let raw = r#"{
            "domain": "example.com",
            "status": "OK",
            "ssl_expiration": "2026-11-01 12:00:00",
            "ssl_issuer": "Let's Encrypt",
            "last_chk": "2026-08-06 09:30:00 UTC"
        }"#;
        let record: DomainRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(DomainStatus::Ok, record.status);
        assert_eq!("Let's Encrypt", record.ssl_issuer);
    }

    #[test]
    fn t_display_plain() {
        let record = DomainRecord::new("example.com");
        assert_eq!("example.com: Pending", format!("{record}"));
    }

    #[test]
    fn t_display_with_certificate() {
        let mut result = ProbeResult::new("example.com");
        result.status = DomainStatus::Ok;
        result.ssl_issuer = "Let's Encrypt".to_string();
        result.ssl_expiration = "2026-11-01 12:00:00".to_string();
        assert_eq!(
            "example.com: OK, certificate by Let's Encrypt expires 2026-11-01 12:00:00",
            format!("{result}")
        );
    }
}
