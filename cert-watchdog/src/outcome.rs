//! Validation results

use chrono::{DateTime, Utc};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a certificate store is unusable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    #[error("{} is missing or unreadable: {kind}", .file.display())]
    FileUnreadable { file: PathBuf, kind: io::ErrorKind },

    #[error("{} could not be parsed: {detail}", .file.display())]
    Unparsable { file: PathBuf, detail: String },

    #[error("{subject} is not valid before {not_before} (now {now})")]
    NotYetValid {
        subject: String,
        not_before: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("{subject} expires at {not_after}, before the deadline {deadline}")]
    ExpiredByDeadline {
        subject: String,
        not_after: DateTime<Utc>,
        deadline: DateTime<Utc>,
    },

    #[error("certificate is not issued by the CA bundle: {detail}")]
    CaMismatch { detail: String },

    #[error("certificate is not valid for {dns_name}")]
    HostnameMismatch { dns_name: String },
}

impl InvalidReason {
    /// Short stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileUnreadable { .. } => "file_unreadable",
            Self::Unparsable { .. } => "unparsable",
            Self::NotYetValid { .. } => "not_yet_valid",
            Self::ExpiredByDeadline { .. } => "expired_by_deadline",
            Self::CaMismatch { .. } => "ca_mismatch",
            Self::HostnameMismatch { .. } => "hostname_mismatch",
        }
    }
}

/// Result of checking a certificate store against a deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Usable through the deadline; `not_after` is the leaf's expiry
    Valid { not_after: DateTime<Utc> },
    Invalid(InvalidReason),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn reason(&self) -> Option<&InvalidReason> {
        match self {
            Self::Valid { .. } => None,
            Self::Invalid(reason) => Some(reason),
        }
    }
}

impl From<Result<DateTime<Utc>, InvalidReason>> for ValidationOutcome {
    fn from(result: Result<DateTime<Utc>, InvalidReason>) -> Self {
        match result {
            Ok(not_after) => Self::Valid { not_after },
            Err(reason) => Self::Invalid(reason),
        }
    }
}
