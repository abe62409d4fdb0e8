//! Location of the mounted certificate material

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The three files a certificate store must provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileRole {
    Certificate,
    PrivateKey,
    CaBundle,
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Certificate => "certificate",
            Self::PrivateKey => "private key",
            Self::CaBundle => "CA bundle",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{role} file name must not be empty")]
    EmptyFileName { role: FileRole },
}

/// Where certificate material lives
///
/// Constructed once from configuration and never mutated. The directory is
/// only ever read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateStoreRef {
    dir: PathBuf,
    cert_name: String,
    key_name: String,
    ca_name: String,
    dns_name: Option<String>,
}

impl CertificateStoreRef {
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyFileName`] if any file name is blank.
    pub fn new(
        dir: impl Into<PathBuf>,
        cert_name: impl Into<String>,
        key_name: impl Into<String>,
        ca_name: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let cert_name = non_empty(cert_name.into(), FileRole::Certificate)?;
        let key_name = non_empty(key_name.into(), FileRole::PrivateKey)?;
        let ca_name = non_empty(ca_name.into(), FileRole::CaBundle)?;
        Ok(Self {
            dir: dir.into(),
            cert_name,
            key_name,
            ca_name,
            dns_name: None,
        })
    }

    /// Require the leaf to be issued for `dns_name`
    pub fn with_dns_name(mut self, dns_name: impl Into<String>) -> Self {
        self.dns_name = Some(dns_name.into());
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn dns_name(&self) -> Option<&str> {
        self.dns_name.as_deref()
    }

    pub fn path(&self, role: FileRole) -> PathBuf {
        let name = match role {
            FileRole::Certificate => &self.cert_name,
            FileRole::PrivateKey => &self.key_name,
            FileRole::CaBundle => &self.ca_name,
        };
        self.dir.join(name)
    }

    pub fn cert_path(&self) -> PathBuf {
        self.path(FileRole::Certificate)
    }

    pub fn key_path(&self) -> PathBuf {
        self.path(FileRole::PrivateKey)
    }

    pub fn ca_path(&self) -> PathBuf {
        self.path(FileRole::CaBundle)
    }
}

fn non_empty(name: String, role: FileRole) -> Result<String, StoreError> {
    if name.trim().is_empty() {
        Err(StoreError::EmptyFileName { role })
    } else {
        Ok(name)
    }
}
