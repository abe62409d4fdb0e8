// Error codes and exit statuses
// Codes are stable identifiers for log correlation; exit statuses are what a supervisor sees

pub mod configuration {
    pub const INVALID: &str = "CONFIG_4001";
}

pub mod certificates {
    pub const STARTUP_REFUSED: &str = "CERT_1001";
    pub const INVALID_AT_RECHECK: &str = "CERT_1002";
}

pub mod serving {
    pub const COMPONENT_FAILED: &str = "SERVE_2001";
}

pub mod telemetry {
    pub const INIT_FAILED: &str = "TELEMETRY_3001";
}

pub mod system {
    pub const INTERNAL: &str = "SYS_9001";
}

/// Process exit statuses
pub mod exit {
    pub const SUCCESS: u8 = 0;
    /// Serving component or runtime failure
    pub const FAILURE: u8 = 1;
    /// Certificates unusable before serving started
    pub const STARTUP_REFUSED: u8 = 2;
    /// EX_CONFIG from sysexits.h
    pub const CONFIG: u8 = 78;
}
