//! Certificate inspection over an independent TLS connection

use std::fmt;
use std::io::Write as _;
use std::net::{TcpStream, ToSocketAddrs as _};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use chrono::{DateTime, TimeZone, Utc};
use log::error;
use rustls::{ClientConfig, OwnedTrustAnchor, ServerName};
use x509_parser::parse_x509_certificate;

use crate::validate::strip_prefixes;

/// Formatting of certificate expiration instants
const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Socket timeout covering connect, handshake and read so a stalled peer
/// cannot pin a probe worker
const TLS_TIMEOUT: Duration = Duration::from_secs(10);

/// Inspects the certificate a host serves on port 443
///
/// Opens its own TLS connection instead of reusing the prober's HTTP client:
/// that client may have redirected or pooled a connection to a different
/// endpoint, while certificate semantics must reflect the canonical host.
#[derive(Clone)]
pub struct CertificateInspector {
    config: Arc<ClientConfig>,
    timeout: Duration,
}

impl fmt::Debug for CertificateInspector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateInspector")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for CertificateInspector {
    fn default() -> CertificateInspector {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.add_server_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.0.iter().map(|ta| {
            OwnedTrustAnchor::from_subject_spki_name_constraints(
                ta.subject,
                ta.spki,
                ta.name_constraints,
            )
        }));

        let config = ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        CertificateInspector {
            config: Arc::new(config),
            timeout: TLS_TIMEOUT,
        }
    }
}

impl CertificateInspector {
    /// Issuer organization and expiration of the certificate at `url`
    ///
    /// The scheme and a leading `www.` are stripped before use. Failures
    /// never propagate: any connection, handshake or parsing error is folded
    /// into an `("Error", "Failed to check certificate: …")` pair.
    ///
    /// ```no_run
    /// # use dms::CertificateInspector;
    /// let inspector = CertificateInspector::default();
    /// let (issuer, expiration) = inspector.inspect("https://example.com");
    /// ```
    pub fn inspect(&self, url: &str) -> (String, String) {
        let hostname = strip_prefixes(url);
        match self.fetch_certificate(hostname) {
            Ok((issuer, not_after)) => {
                let formatted = not_after.format(EXPIRY_FORMAT).to_string();
                if not_after < Utc::now() {
                    (issuer, format!("EXPIRED: {formatted}"))
                } else {
                    (issuer, formatted)
                }
            }
            Err(e) => {
                error!("failed to check certificate for {hostname}: {e}");
                (
                    "Error".to_string(),
                    format!("Failed to check certificate: {e}"),
                )
            }
        }
    }

    fn fetch_certificate(&self, hostname: &str) -> anyhow::Result<(String, DateTime<Utc>)> {
        let server_name = ServerName::try_from(hostname)?;
        let mut conn = rustls::ClientConnection::new(self.config.clone(), server_name)?;

        let addr = (hostname, 443)
            .to_socket_addrs()?
            .next()
            .context("hostname did not resolve")?;
        let mut stream = TcpStream::connect_timeout(&addr, self.timeout)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let mut tls = rustls::Stream::new(&mut conn, &mut stream);
        // peer certificates are unavailable until a write drives the handshake
        tls.write_all(Self::build_http_headers(hostname).as_bytes())?;

        let certificates = tls
            .conn
            .peer_certificates()
            .context("no peer certificates presented")?;
        let certificate = certificates.first().context("no peer certificate found")?;

        let (_, cert) = parse_x509_certificate(certificate.as_ref())?;
        let issuer = cert
            .issuer()
            .iter_organization()
            .next()
            .and_then(|o| o.as_str().ok())
            .unwrap_or("Unknown")
            .to_string();
        let not_after = Utc.timestamp(cert.validity().not_after.timestamp(), 0);
        Ok((issuer, not_after))
    }

    fn build_http_headers(domain_name: &str) -> String {
        format!(
            "GET / HTTP/1.1\r\n\
            Host: {domain_name}\r\n\
            Connection: close\r\n\
            Accept-Encoding: identity\r\n\
            \r\n"
        )
    }
}
