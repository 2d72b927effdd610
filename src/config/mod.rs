use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LogShieldError, Result};

/// Top-level configuration from `.logshield.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where and how to reach the scanning service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the scanning service.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Path of the upload endpoint, resolved under `endpoint` (a path prefix
    /// on the endpoint is kept).
    #[serde(default = "default_scan_path")]
    pub scan_path: String,
    /// Seconds to wait for a scan before giving up.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Refuse to upload files larger than this.
    #[serde(default)]
    pub max_upload_bytes: Option<u64>,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8000".into()
}

fn default_scan_path() -> String {
    "/scan".into()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            scan_path: default_scan_path(),
            timeout_secs: default_timeout_secs(),
            max_upload_bytes: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Default file name for exported reports.
    #[serde(default = "default_output")]
    pub output: String,
}

fn default_output() -> String {
    "logshield-report.pdf".into()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.service.endpoint).map_err(|e| {
            LogShieldError::Config(format!(
                "invalid service endpoint '{}': {e}",
                self.service.endpoint
            ))
        })?;
        if self.service.timeout_secs == 0 {
            return Err(LogShieldError::Config(
                "service.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# LogShield configuration

[service]
# Base URL of the scanning service.
endpoint = "http://127.0.0.1:8000"
# Upload path on that service, relative to the endpoint.
scan_path = "/scan"
# Give up on a scan after this many seconds.
timeout_secs = 30
# Refuse to upload larger files.
# max_upload_bytes = 52428800

[report]
# Default export file name.
output = "logshield-report.pdf"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load(Path::new("/nonexistent/.logshield.toml")).unwrap();
        assert_eq!(config.service.endpoint, "http://127.0.0.1:8000");
        assert_eq!(config.service.scan_path, "/scan");
        assert_eq!(config.service.timeout_secs, 30);
        assert_eq!(config.report.output, "logshield-report.pdf");
    }

    #[test]
    fn starter_toml_round_trips_to_defaults() {
        let config: Config = toml::from_str(Config::starter_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.service.timeout_secs, 30);
        assert_eq!(config.service.max_upload_bytes, None);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[service]\nendpoint = \"https://scanner.internal:9000\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.service.endpoint, "https://scanner.internal:9000");
        assert_eq!(config.service.timeout_secs, 30);
    }

    #[test]
    fn bad_endpoint_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[service]\nendpoint = \"not a url\"").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, LogShieldError::Config(_)));
    }

    #[test]
    fn zero_timeout_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[service]\ntimeout_secs = 0").unwrap();
        assert!(Config::load(file.path()).is_err());
    }
}
