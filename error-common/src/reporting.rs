// Error reporting utilities
// Fatal errors are reported once, at the top level, before the process exits

use crate::types::CertGuardError;

/// Log a fatal error with its code and the exit status it maps to
pub fn report_fatal(context: &str, error: &CertGuardError) {
    tracing::error!(
        context = context,
        error_code = error.code(),
        exit_code = error.exit_code(),
        error = %error,
        "CertGuard fatal error"
    );
}
