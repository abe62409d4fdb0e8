//! Certificate store validation
//!
//! A store is usable through a deadline when:
//! - all three files are readable
//! - the leaf certificate, private key and CA bundle parse as PEM
//! - `not_before <= now` and `not_after >= deadline` for the leaf and its issuing CA
//! - the leaf is signed by a CA from the bundle
//! - the leaf is issued for the store's DNS name, when one is set
//!
//! Nothing is cached: every call re-reads the files, so rotated material is
//! seen on the next check.

use chrono::{DateTime, Utc};
use pem::Pem;
use std::net::IpAddr;
use std::path::Path;
use x509_parser::prelude::{FromDer, GeneralName, X509Certificate};

use crate::deadline::ValidityDeadline;
use crate::outcome::{InvalidReason, ValidationOutcome};
use crate::store::CertificateStoreRef;

const CERTIFICATE_TAG: &str = "CERTIFICATE";
const PRIVATE_KEY_SUFFIX: &str = "PRIVATE KEY";

/// Validate `store` against `deadline` using the system clock
pub fn validate(store: &CertificateStoreRef, deadline: ValidityDeadline) -> ValidationOutcome {
    validate_at(store, deadline, Utc::now())
}

/// Validate `store` against `deadline` with an explicit clock reading
pub fn validate_at(
    store: &CertificateStoreRef,
    deadline: ValidityDeadline,
    now: DateTime<Utc>,
) -> ValidationOutcome {
    check_store(store, deadline, now).into()
}

fn check_store(
    store: &CertificateStoreRef,
    deadline: ValidityDeadline,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, InvalidReason> {
    let cert_path = store.cert_path();
    let key_path = store.key_path();
    let ca_path = store.ca_path();

    // All three files must be readable before anything is parsed.
    let cert_bytes = read_file(&cert_path)?;
    let key_bytes = read_file(&key_path)?;
    let ca_bytes = read_file(&ca_path)?;

    let cert_blocks = parse_pem_blocks(&cert_path, &cert_bytes)?;
    let leaf_block = cert_blocks
        .iter()
        .find(|block| block.tag() == CERTIFICATE_TAG)
        .ok_or_else(|| unparsable(&cert_path, "no CERTIFICATE block"))?;
    let leaf = parse_certificate(&cert_path, leaf_block.contents())?;

    check_private_key(&key_path, &key_bytes)?;

    let ca_blocks = parse_pem_blocks(&ca_path, &ca_bytes)?;
    let authorities = ca_blocks
        .iter()
        .filter(|block| block.tag() == CERTIFICATE_TAG)
        .map(|block| parse_certificate(&ca_path, block.contents()))
        .collect::<Result<Vec<_>, _>>()?;
    if authorities.is_empty() {
        return Err(unparsable(&ca_path, "no CERTIFICATE block"));
    }

    let leaf_window = ValidityWindow::of(&cert_path, &leaf)?;
    leaf_window.check(deadline, now)?;

    let issuer = find_issuer(&leaf, &authorities)?;
    ValidityWindow::of(&ca_path, issuer)?.check(deadline, now)?;

    if let Some(dns_name) = store.dns_name() {
        check_hostname(&cert_path, &leaf, dns_name)?;
    }

    Ok(leaf_window.not_after)
}

fn read_file(path: &Path) -> Result<Vec<u8>, InvalidReason> {
    std::fs::read(path).map_err(|e| InvalidReason::FileUnreadable {
        file: path.to_path_buf(),
        kind: e.kind(),
    })
}

fn unparsable(path: &Path, detail: impl Into<String>) -> InvalidReason {
    InvalidReason::Unparsable {
        file: path.to_path_buf(),
        detail: detail.into(),
    }
}

fn parse_pem_blocks(path: &Path, bytes: &[u8]) -> Result<Vec<Pem>, InvalidReason> {
    pem::parse_many(bytes).map_err(|e| unparsable(path, e.to_string()))
}

fn parse_certificate<'a>(path: &Path, der: &'a [u8]) -> Result<X509Certificate<'a>, InvalidReason> {
    X509Certificate::from_der(der)
        .map(|(_rem, cert)| cert)
        .map_err(|e| unparsable(path, format!("invalid X.509 certificate: {e}")))
}

fn check_private_key(path: &Path, bytes: &[u8]) -> Result<(), InvalidReason> {
    let blocks = parse_pem_blocks(path, bytes)?;
    if blocks
        .iter()
        .any(|block| block.tag().ends_with(PRIVATE_KEY_SUFFIX) && !block.contents().is_empty())
    {
        Ok(())
    } else {
        Err(unparsable(path, "no PRIVATE KEY block"))
    }
}

/// not-before / not-after of one certificate
struct ValidityWindow {
    subject: String,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl ValidityWindow {
    fn of(path: &Path, cert: &X509Certificate<'_>) -> Result<Self, InvalidReason> {
        let validity = cert.validity();
        let not_before = DateTime::<Utc>::from_timestamp(validity.not_before.timestamp(), 0)
            .ok_or_else(|| unparsable(path, "not_before out of range"))?;
        let not_after = DateTime::<Utc>::from_timestamp(validity.not_after.timestamp(), 0)
            .ok_or_else(|| unparsable(path, "not_after out of range"))?;
        Ok(Self {
            subject: cert.subject().to_string(),
            not_before,
            not_after,
        })
    }

    fn check(&self, deadline: ValidityDeadline, now: DateTime<Utc>) -> Result<(), InvalidReason> {
        if now < self.not_before {
            return Err(InvalidReason::NotYetValid {
                subject: self.subject.clone(),
                not_before: self.not_before,
                now,
            });
        }
        if self.not_after < deadline.instant() {
            return Err(InvalidReason::ExpiredByDeadline {
                subject: self.subject.clone(),
                not_after: self.not_after,
                deadline: deadline.instant(),
            });
        }
        Ok(())
    }
}

fn find_issuer<'c, 'a>(
    leaf: &X509Certificate<'_>,
    authorities: &'c [X509Certificate<'a>],
) -> Result<&'c X509Certificate<'a>, InvalidReason> {
    let issuer_name = leaf.issuer();
    let mut named = authorities
        .iter()
        .filter(|ca| ca.subject().as_raw() == issuer_name.as_raw())
        .peekable();

    if named.peek().is_none() {
        return Err(InvalidReason::CaMismatch {
            detail: format!("no CA in the bundle is named {issuer_name}"),
        });
    }

    named
        .find(|ca| leaf.verify_signature(Some(ca.public_key())).is_ok())
        .ok_or_else(|| InvalidReason::CaMismatch {
            detail: format!("signature does not verify against {issuer_name}"),
        })
}

fn check_hostname(path: &Path, leaf: &X509Certificate<'_>, dns_name: &str) -> Result<(), InvalidReason> {
    let mismatch = || InvalidReason::HostnameMismatch {
        dns_name: dns_name.to_string(),
    };

    let san = leaf
        .subject_alternative_name()
        .map_err(|e| unparsable(path, format!("invalid subjectAltName: {e}")))?
        .ok_or_else(mismatch)?;

    let target_ip = dns_name.parse::<IpAddr>().ok();
    let matched = san.value.general_names.iter().any(|name| match (name, target_ip) {
        (GeneralName::DNSName(pattern), None) => hostname_matches(pattern, dns_name),
        (GeneralName::IPAddress(octets), Some(ip)) => ip_matches(octets, ip),
        _ => false,
    });

    if matched {
        Ok(())
    } else {
        Err(mismatch())
    }
}

/// Exact match or a single-label leading wildcard, case-insensitive
fn hostname_matches(pattern: &str, host: &str) -> bool {
    let pattern = pattern.trim_end_matches('.');
    let host = host.trim_end_matches('.');
    if pattern.eq_ignore_ascii_case(host) {
        return true;
    }
    match (pattern.strip_prefix("*."), host.split_once('.')) {
        (Some(suffix), Some((label, rest))) => {
            !label.is_empty() && !suffix.is_empty() && rest.eq_ignore_ascii_case(suffix)
        }
        _ => false,
    }
}

fn ip_matches(octets: &[u8], ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => octets == v4.octets().as_slice(),
        IpAddr::V6(v6) => octets == v6.octets().as_slice(),
    }
}
