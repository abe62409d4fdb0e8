//! Shared fixtures: a throwaway CA, leaf certificates with chosen validity
//! windows, and a certificate store directory to put them in.

#![allow(dead_code)]

use cert_watchdog::{CertificateStoreRef, Clock};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rcgen::{BasicConstraints, Certificate, CertificateParams, DnType, IsCa, KeyPair};
use std::fs;
use tempfile::TempDir;

pub const CERT_NAME: &str = "tls.crt";
pub const KEY_NAME: &str = "tls.key";
pub const CA_NAME: &str = "ca.crt";

/// Fixed reference instant, whole seconds so it survives X.509 encoding
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn to_offset(instant: DateTime<Utc>) -> time::OffsetDateTime {
    time::OffsetDateTime::from_unix_timestamp(instant.timestamp()).unwrap()
}

pub struct TestCa {
    key: KeyPair,
    cert: Certificate,
}

impl TestCa {
    pub fn new(common_name: &str, not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> Self {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.distinguished_name.push(DnType::CommonName, common_name);
        params.not_before = to_offset(not_before);
        params.not_after = to_offset(not_after);
        let cert = params.self_signed(&key).unwrap();
        Self { key, cert }
    }

    /// A CA valid for ten years around [`t0`]
    pub fn long_lived() -> Self {
        Self::new(
            "certguard test ca",
            t0() - TimeDelta::days(365),
            t0() + TimeDelta::days(3650),
        )
    }

    pub fn pem(&self) -> String {
        self.cert.pem()
    }

    pub fn issue(&self, sans: &[&str], not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> Leaf {
        let key = KeyPair::generate().unwrap();
        let mut params =
            CertificateParams::new(sans.iter().map(|s| s.to_string()).collect::<Vec<_>>()).unwrap();
        params.distinguished_name.push(DnType::CommonName, "webhook");
        params.not_before = to_offset(not_before);
        params.not_after = to_offset(not_after);
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
        Leaf {
            cert_pem: cert.pem(),
            key_pem: key.serialize_pem(),
        }
    }
}

pub struct Leaf {
    pub cert_pem: String,
    pub key_pem: String,
}

/// A certificate store directory that lives as long as the value
pub struct TestStore {
    pub dir: TempDir,
    pub store: CertificateStoreRef,
}

impl TestStore {
    pub fn empty() -> Self {
        let dir = TempDir::new().unwrap();
        let store = CertificateStoreRef::new(dir.path(), CERT_NAME, KEY_NAME, CA_NAME).unwrap();
        Self { dir, store }
    }

    pub fn with(leaf: &Leaf, ca_pem: &str) -> Self {
        let store = Self::empty();
        store.write(leaf, ca_pem);
        store
    }

    /// Replace the material in place, as a rotating agent would
    pub fn write(&self, leaf: &Leaf, ca_pem: &str) {
        fs::write(self.dir.path().join(CERT_NAME), &leaf.cert_pem).unwrap();
        fs::write(self.dir.path().join(KEY_NAME), &leaf.key_pem).unwrap();
        fs::write(self.dir.path().join(CA_NAME), ca_pem).unwrap();
    }

    pub fn remove(&self, name: &str) {
        fs::remove_file(self.dir.path().join(name)).unwrap();
    }

    pub fn with_dns_name(&self, dns_name: &str) -> CertificateStoreRef {
        self.store.clone().with_dns_name(dns_name)
    }
}

/// Store whose leaf is valid for `lifetime` starting at [`t0`]
pub fn store_valid_for(lifetime: TimeDelta) -> TestStore {
    let ca = TestCa::long_lived();
    let leaf = ca.issue(&["localhost"], t0(), t0() + lifetime);
    TestStore::with(&leaf, &ca.pem())
}

/// Wall clock anchored at [`t0`] that follows tokio's (pausable) clock
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn start() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.origin.elapsed()).unwrap();
        t0() + elapsed
    }
}
