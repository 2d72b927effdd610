//! LogShield: security audit for web-server access logs.
//!
//! Sends an access log to a scanning service, then turns the classified
//! result into a health score, a threat breakdown, firewall ban commands and
//! exportable reports (console, JSON, HTML, PDF).
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use logshield::{load_config, run_scan, ScanOptions};
//! use logshield::session::{Completion, ScanSession};
//!
//! let config = load_config(&ScanOptions::default()).unwrap();
//! let mut session = ScanSession::new();
//! let completion = run_scan(&mut session, Path::new("access.log"), &config).unwrap();
//! if completion == Some(Completion::Displayed) {
//!     println!("Health: {}", session.health());
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod remediation;
pub mod service;
pub mod session;

use std::path::{Path, PathBuf};

use config::Config;
use error::Result;
use model::{ScanResponse, ScanResult};
use service::HttpScanService;
use session::{Completion, ScanSession};

/// Options for a scan invocation.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Path to config file (defaults to `.logshield.toml` in the working directory).
    pub config_path: Option<PathBuf>,
    /// CLI override for the service endpoint.
    pub endpoint_override: Option<String>,
    /// CLI override for the submission timeout.
    pub timeout_override: Option<u64>,
}

/// Load config and apply CLI overrides.
pub fn load_config(options: &ScanOptions) -> Result<Config> {
    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(".logshield.toml"));
    let mut config = Config::load(&config_path)?;

    if let Some(endpoint) = &options.endpoint_override {
        config.service.endpoint = endpoint.clone();
    }
    if let Some(timeout) = options.timeout_override {
        config.service.timeout_secs = timeout;
    }
    config.validate()?;
    Ok(config)
}

/// Read `path` and submit it through `session` to the configured service.
///
/// Submission failures do not surface here: they move the session back to
/// idle and queue a notice. Only local errors (bad endpoint, unreadable
/// file) are returned as `Err`.
pub fn run_scan(
    session: &mut ScanSession,
    path: &Path,
    config: &Config,
) -> Result<Option<Completion>> {
    let service = HttpScanService::new(&config.service)?;
    let content = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.log".into());

    Ok(session.scan_with(&service, file_name, content))
}

/// Replay a captured service response through `session` without a network call.
pub fn replay_response(session: &mut ScanSession, path: &Path) -> Result<Option<Completion>> {
    let body = std::fs::read_to_string(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "response.json".into());

    let Some(submission) = session.select_file(file_name, Vec::new()) else {
        return Ok(None);
    };
    let outcome = ScanResponse::from_json(&body).and_then(ScanResult::from_response);
    Ok(Some(session.complete(submission.id, outcome)))
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::analysis::HealthStatus;
    use crate::error::LogShieldError;
    use crate::output::OutputFormat;
    use crate::service::ScanService;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::io::Write;

    const THREE_THREATS: &str = r#"{
        "total_lines": 100,
        "threats_found": 3,
        "details": [
            {"type": "sqli", "ip": "1.2.3.4", "country": "US", "line": "GET /?id=1 OR 1=1"},
            {"type": "xss", "ip": "5.6.7.8", "country": "DE", "line": "GET /?q=<script>"},
            {"type": "sqli", "ip": "9.9.9.9", "country": "US", "line": "GET /?id=' --"}
        ]
    }"#;

    /// Answers every submission with a fixed body and records what it saw.
    struct ScriptedService {
        reply: std::result::Result<&'static str, &'static str>,
        seen: RefCell<Vec<(String, usize)>>,
    }

    impl ScriptedService {
        fn replying(body: &'static str) -> Self {
            Self {
                reply: Ok(body),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn failing(message: &'static str) -> Self {
            Self {
                reply: Err(message),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl ScanService for ScriptedService {
        fn submit(&self, file_name: &str, content: &[u8]) -> Result<ScanResponse> {
            self.seen
                .borrow_mut()
                .push((file_name.to_string(), content.len()));
            match self.reply {
                Ok(body) => ScanResponse::from_json(body),
                Err(message) => Err(LogShieldError::Transport {
                    endpoint: "http://scanner.test/scan".into(),
                    message: message.into(),
                }),
            }
        }

        fn health(&self) -> Result<String> {
            Ok("ok".into())
        }
    }

    #[test]
    fn three_threat_scan_end_to_end() {
        let service = ScriptedService::replying(THREE_THREATS);
        let mut session = ScanSession::new();
        let completion = session.scan_with(&service, "access.log", b"log".to_vec());
        assert_eq!(completion, Some(Completion::Displayed));
        assert_eq!(service.seen.borrow().as_slice(), &[("access.log".to_string(), 3usize)]);

        let health = session.health();
        assert_eq!(health.value, 85);
        assert_eq!(health.status, HealthStatus::Healthy);

        let tally = session.tally().unwrap();
        assert_eq!(tally.get("sqli"), Some(&2));
        assert_eq!(tally.get("xss"), Some(&1));
        assert_eq!(tally.len(), 2);

        let report = session.report(Utc::now()).unwrap();
        let ips: Vec<&str> = report.rows.iter().map(|r| r.source_address.as_str()).collect();
        assert_eq!(ips, vec!["1.2.3.4", "5.6.7.8", "9.9.9.9"]);
        assert!(session.result().unwrap().fingerprint.is_some());
        assert!(session.take_notices().is_empty());
    }

    #[test]
    fn empty_scan_end_to_end() {
        let service =
            ScriptedService::replying(r#"{"total_lines": 50, "threats_found": 0, "details": []}"#);
        let mut session = ScanSession::new();
        session.scan_with(&service, "clean.log", b"GET /\n".to_vec());

        assert_eq!(session.health().value, 100);
        assert!(session.report(Utc::now()).unwrap().rows.is_empty());
        let pdf = session.export(OutputFormat::Pdf, Utc::now()).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[test]
    fn transport_failure_returns_to_idle_with_notice() {
        let service = ScriptedService::failing("connection refused");
        let mut session = ScanSession::new();
        let completion = session.scan_with(&service, "access.log", b"x".to_vec());
        assert_eq!(completion, Some(Completion::Failed));
        assert!(session.result().is_none());
        assert!(!session.is_submitting());
        assert_eq!(session.take_notices().len(), 1);

        let retry = ScriptedService::replying(THREE_THREATS);
        assert_eq!(
            session.scan_with(&retry, "access.log", b"x".to_vec()),
            Some(Completion::Displayed)
        );
    }

    #[test]
    fn malformed_body_is_a_failure_not_a_crash() {
        let service = ScriptedService::replying(r#"{"detail": "Not Found"}"#);
        let mut session = ScanSession::new();
        assert_eq!(
            session.scan_with(&service, "a.log", vec![]),
            Some(Completion::Failed)
        );
    }

    #[test]
    fn scan_another_file_after_reset() {
        let service = ScriptedService::replying(THREE_THREATS);
        let mut session = ScanSession::new();
        session.scan_with(&service, "first.log", vec![]);
        assert_eq!(session.scan_with(&service, "second.log", vec![]), None);

        session.reset();
        assert!(session.result().is_none());
        assert_eq!(
            session.scan_with(&service, "second.log", vec![]),
            Some(Completion::Displayed)
        );
    }

    #[test]
    fn replay_reads_captured_response() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(THREE_THREATS.as_bytes()).unwrap();

        let mut session = ScanSession::new();
        let completion = replay_response(&mut session, file.path()).unwrap();
        assert_eq!(completion, Some(Completion::Displayed));
        assert_eq!(session.result().unwrap().total_lines_scanned, 100);
        assert_eq!(session.result().unwrap().fingerprint, None);
    }

    #[test]
    fn overrides_apply_on_top_of_config() {
        let options = ScanOptions {
            config_path: Some(PathBuf::from("/nonexistent/.logshield.toml")),
            endpoint_override: Some("http://10.1.1.1:9000".into()),
            timeout_override: Some(5),
        };
        let config = load_config(&options).unwrap();
        assert_eq!(config.service.endpoint, "http://10.1.1.1:9000");
        assert_eq!(config.service.timeout_secs, 5);
    }

    #[test]
    fn bad_endpoint_override_is_rejected() {
        let options = ScanOptions {
            config_path: Some(PathBuf::from("/nonexistent/.logshield.toml")),
            endpoint_override: Some("::nope::".into()),
            timeout_override: None,
        };
        assert!(load_config(&options).is_err());
    }
}
