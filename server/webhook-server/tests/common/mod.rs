#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, Utc};
use config_engine::CertGuardConfig;
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use tempfile::TempDir;

fn to_offset(instant: DateTime<Utc>) -> time::OffsetDateTime {
    time::OffsetDateTime::from_unix_timestamp(instant.timestamp()).unwrap()
}

/// Write a CA and a `localhost` leaf valid from one hour ago for `lifetime`
pub fn write_store(dir: &TempDir, lifetime: TimeDelta) {
    let now = Utc::now();

    let ca_key = KeyPair::generate().unwrap();
    let mut ca_params = CertificateParams::new(Vec::<String>::new()).unwrap();
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    ca_params.distinguished_name.push(DnType::CommonName, "webhook test ca");
    ca_params.not_before = to_offset(now - TimeDelta::days(1));
    ca_params.not_after = to_offset(now + TimeDelta::days(365));
    let ca = ca_params.self_signed(&ca_key).unwrap();

    let leaf_key = KeyPair::generate().unwrap();
    let mut leaf_params = CertificateParams::new(vec!["localhost".to_string()]).unwrap();
    leaf_params.not_before = to_offset(now - TimeDelta::hours(1));
    leaf_params.not_after = to_offset(now - TimeDelta::hours(1) + lifetime);
    let leaf = leaf_params.signed_by(&leaf_key, &ca, &ca_key).unwrap();

    std::fs::write(dir.path().join("tls.crt"), leaf.pem()).unwrap();
    std::fs::write(dir.path().join("tls.key"), leaf_key.serialize_pem()).unwrap();
    std::fs::write(dir.path().join("ca.crt"), ca.pem()).unwrap();
}

/// Configuration pointing at `dir`, on an ephemeral port, without metrics
pub fn config_for(dir: &TempDir) -> CertGuardConfig {
    CertGuardConfig {
        cert_dir: dir.path().to_path_buf(),
        listen_addr: "127.0.0.1:0".to_string(),
        metrics_addr: String::new(),
        ..CertGuardConfig::default()
    }
}
