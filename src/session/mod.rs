//! View state machine for one operator session.
//!
//! ```text
//! Idle --select_file--> Submitting --success--> Displaying --reset--> Idle
//!                          |  ^
//!                          |  +-- select_file (ignored while in flight)
//!                          +--failure / reset--> Idle
//! ```
//!
//! The session is the only owner of the current [`ScanResult`]. Everything a
//! view shows (tally, score, report) is derived from it on each call.
//! Every submission gets a fresh [`SubmissionId`]; a completion carrying any
//! other id is stale and is dropped, so a response that arrives after a reset
//! can never bring a discarded result back.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::{tally, CategoryTally, HealthScore};
use crate::error::{LogShieldError, Result};
use crate::model::ScanResult;
use crate::output::{self, OutputFormat, ReportDocument};
use crate::remediation::{self, Clipboard};
use crate::service::ScanService;

/// Identifies one submission. Monotonic within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SubmissionId(u64);

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A file handed out for submission. The session keeps only its id and name.
#[derive(Debug)]
pub struct Submission {
    pub id: SubmissionId,
    pub file_name: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// No result; ready for a file.
    Idle,
    /// A submission is in flight.
    Submitting { id: SubmissionId, file_name: String },
    /// A result is on screen.
    Displaying { file_name: String, result: ScanResult },
}

impl ViewState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting { .. } => "submitting",
            Self::Displaying { .. } => "displaying",
        }
    }
}

/// What happened to a completion handed to [`ScanSession::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result is now displayed.
    Displayed,
    /// The submission failed; the session is back to idle.
    Failed,
    /// The completion did not belong to the current submission and was ignored.
    Stale,
}

/// Operator-facing message queued by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Error(String),
    Warning(String),
    Info(String),
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error(m) => write!(f, "error: {m}"),
            Self::Warning(m) => write!(f, "warning: {m}"),
            Self::Info(m) => write!(f, "{m}"),
        }
    }
}

#[derive(Debug)]
pub struct ScanSession {
    state: ViewState,
    next_id: u64,
    notices: Vec<Notice>,
}

impl ScanSession {
    pub fn new() -> Self {
        Self {
            state: ViewState::Idle,
            next_id: 1,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, ViewState::Submitting { .. })
    }

    /// The current result, if one is displayed.
    pub fn result(&self) -> Option<&ScanResult> {
        match &self.state {
            ViewState::Displaying { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Start a submission. Only accepted from `Idle`; while a submission is
    /// in flight or a result is displayed, the selection is ignored.
    pub fn select_file(
        &mut self,
        file_name: impl Into<String>,
        content: Vec<u8>,
    ) -> Option<Submission> {
        let file_name = file_name.into();
        if !matches!(self.state, ViewState::Idle) {
            tracing::debug!(
                state = self.state.name(),
                file = %file_name,
                "file selection ignored"
            );
            return None;
        }

        let id = SubmissionId(self.next_id);
        self.next_id += 1;
        tracing::info!(submission = %id, file = %file_name, bytes = content.len(), "submitting");
        self.state = ViewState::Submitting {
            id,
            file_name: file_name.clone(),
        };
        Some(Submission {
            id,
            file_name,
            content,
        })
    }

    /// Apply the outcome of submission `id`.
    pub fn complete(&mut self, id: SubmissionId, outcome: Result<ScanResult>) -> Completion {
        let file_name = match &self.state {
            ViewState::Submitting {
                id: current,
                file_name,
            } if *current == id => file_name.clone(),
            _ => {
                tracing::debug!(submission = %id, state = self.state.name(), "discarding stale completion");
                return Completion::Stale;
            }
        };

        match outcome {
            Ok(result) => {
                for warning in &result.warnings {
                    self.notices.push(Notice::Warning(warning.to_string()));
                }
                tracing::info!(
                    submission = %id,
                    threats = result.display_threat_count(),
                    lines = result.total_lines_scanned,
                    "scan displayed"
                );
                self.state = ViewState::Displaying { file_name, result };
                Completion::Displayed
            }
            Err(e) => {
                tracing::warn!(
                    submission = %id,
                    boundary = e.is_submission_failure(),
                    error = %e,
                    "scan failed"
                );
                self.notices
                    .push(Notice::Error(format!("Scan of {file_name} failed: {e}")));
                self.state = ViewState::Idle;
                Completion::Failed
            }
        }
    }

    /// Drop the current result or abandon the in-flight submission.
    pub fn reset(&mut self) {
        if !matches!(self.state, ViewState::Idle) {
            tracing::info!(from = self.state.name(), "session reset");
        }
        self.state = ViewState::Idle;
    }

    /// Run one submission against `service` from start to finish.
    ///
    /// Returns `None` if the selection was ignored.
    pub fn scan_with(
        &mut self,
        service: &dyn ScanService,
        file_name: impl Into<String>,
        content: Vec<u8>,
    ) -> Option<Completion> {
        let submission = self.select_file(file_name, content)?;
        let outcome = service
            .submit(&submission.file_name, &submission.content)
            .and_then(ScanResult::from_response)
            .map(|result| result.with_fingerprint(&submission.content));
        Some(self.complete(submission.id, outcome))
    }

    /// Category distribution of the current result.
    pub fn tally(&self) -> Option<CategoryTally> {
        self.result().map(|r| tally(&r.threats))
    }

    /// Health of the current result; a session with no result is at 100.
    pub fn health(&self) -> HealthScore {
        HealthScore::from_threat_count(self.result().map_or(0, |r| r.display_threat_count()))
    }

    pub fn report(&self, generated_at: DateTime<Utc>) -> Option<ReportDocument> {
        match &self.state {
            ViewState::Displaying { file_name, result } => {
                Some(ReportDocument::build(file_name, result, generated_at))
            }
            _ => None,
        }
    }

    /// Render the current result. Failures are queued as notices and leave
    /// the session untouched.
    pub fn export(&mut self, format: OutputFormat, generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
        let rendered = match self.report(generated_at) {
            Some(doc) => output::render(&doc, format),
            None => Err(LogShieldError::Export {
                format: format.to_string(),
                message: "no scan result to export".into(),
            }),
        };
        if let Err(e) = &rendered {
            tracing::warn!(%format, error = %e, "export failed");
            self.notices.push(Notice::Error(e.to_string()));
        }
        rendered
    }

    /// Copy the ban command for the threat at `index` in the current result.
    pub fn copy_ban(&mut self, clipboard: &mut dyn Clipboard, index: usize) -> Result<()> {
        let address = self
            .result()
            .and_then(|r| r.threats.get(index))
            .map(|t| t.source_address.clone())
            .ok_or_else(|| LogShieldError::Internal(format!("no threat at row {index}")))?;
        match remediation::copy_ban_command(clipboard, &address) {
            Ok(notice) => {
                self.notices.push(Notice::Info(notice));
                Ok(())
            }
            Err(e) => {
                self.notices.push(Notice::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Drain queued notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScanResponse, ThreatRecord};
    use crate::remediation::MemoryClipboard;

    fn result_with(n: usize) -> ScanResult {
        let threats = (0..n)
            .map(|i| ThreatRecord::new("XSS", format!("10.0.0.{i}"), None, "GET /<script>"))
            .collect();
        ScanResult::new(100, threats)
    }

    fn displaying(n: usize) -> ScanSession {
        let mut session = ScanSession::new();
        let sub = session.select_file("access.log", b"x".to_vec()).unwrap();
        assert_eq!(session.complete(sub.id, Ok(result_with(n))), Completion::Displayed);
        session
    }

    #[test]
    fn starts_idle_with_perfect_health() {
        let session = ScanSession::new();
        assert_eq!(session.state(), &ViewState::Idle);
        assert!(session.result().is_none());
        assert_eq!(session.health().value, 100);
        assert!(session.tally().is_none());
    }

    #[test]
    fn selection_moves_to_submitting() {
        let mut session = ScanSession::new();
        let sub = session.select_file("access.log", b"GET /".to_vec()).unwrap();
        assert_eq!(sub.content, b"GET /");
        assert!(session.is_submitting());
    }

    #[test]
    fn second_selection_is_ignored_while_in_flight() {
        let mut session = ScanSession::new();
        let first = session.select_file("a.log", vec![]).unwrap();
        assert!(session.select_file("b.log", vec![]).is_none());
        assert_eq!(
            session.state(),
            &ViewState::Submitting {
                id: first.id,
                file_name: "a.log".into()
            }
        );
    }

    #[test]
    fn selection_is_ignored_while_displaying() {
        let mut session = displaying(1);
        assert!(session.select_file("b.log", vec![]).is_none());
        assert!(session.result().is_some());
    }

    #[test]
    fn success_displays_result() {
        let session = displaying(3);
        assert_eq!(session.result().unwrap().threats.len(), 3);
        assert_eq!(session.health().value, 85);
    }

    #[test]
    fn failure_returns_to_idle_with_notice() {
        let mut session = ScanSession::new();
        let sub = session.select_file("a.log", vec![]).unwrap();
        let outcome = session.complete(
            sub.id,
            Err(LogShieldError::Transport {
                endpoint: "http://127.0.0.1:8000/scan".into(),
                message: "connection refused".into(),
            }),
        );
        assert_eq!(outcome, Completion::Failed);
        assert_eq!(session.state(), &ViewState::Idle);
        let notices = session.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(matches!(&notices[0], Notice::Error(m) if m.contains("connection refused")));
        assert!(session.take_notices().is_empty());
    }

    #[test]
    fn reset_from_displaying_discards_result() {
        for n in [0, 1, 30] {
            let mut session = displaying(n);
            session.reset();
            assert_eq!(session.state(), &ViewState::Idle);
            assert!(session.result().is_none());
            assert!(session.report(Utc::now()).is_none());
        }
    }

    #[test]
    fn late_response_after_reset_is_stale() {
        let mut session = ScanSession::new();
        let sub = session.select_file("a.log", vec![]).unwrap();
        session.reset();
        assert_eq!(session.complete(sub.id, Ok(result_with(2))), Completion::Stale);
        assert_eq!(session.state(), &ViewState::Idle);
    }

    #[test]
    fn late_response_does_not_hijack_newer_submission() {
        let mut session = ScanSession::new();
        let old = session.select_file("a.log", vec![]).unwrap();
        session.reset();
        let new = session.select_file("b.log", vec![]).unwrap();
        assert_ne!(old.id, new.id);

        assert_eq!(session.complete(old.id, Ok(result_with(5))), Completion::Stale);
        assert!(session.is_submitting());

        assert_eq!(session.complete(new.id, Ok(result_with(1))), Completion::Displayed);
        assert_eq!(session.result().unwrap().threats.len(), 1);
    }

    #[test]
    fn late_failure_after_reset_is_silent() {
        let mut session = ScanSession::new();
        let sub = session.select_file("a.log", vec![]).unwrap();
        session.reset();
        let outcome = session.complete(sub.id, Err(LogShieldError::MalformedResponse("x".into())));
        assert_eq!(outcome, Completion::Stale);
        assert!(session.take_notices().is_empty());
    }

    #[test]
    fn integrity_warnings_become_notices() {
        let body = r#"{"total_lines": 5, "threats_found": 9, "details": []}"#;
        let result = ScanResult::from_response(ScanResponse::from_json(body).unwrap()).unwrap();
        let mut session = ScanSession::new();
        let sub = session.select_file("a.log", vec![]).unwrap();
        session.complete(sub.id, Ok(result));
        let notices = session.take_notices();
        assert!(matches!(&notices[..], [Notice::Warning(m)] if m.contains("reported 9")));
        assert_eq!(session.health().value, 100);
    }

    #[test]
    fn export_without_result_is_reported_and_state_kept() {
        let mut session = ScanSession::new();
        let err = session.export(OutputFormat::Json, Utc::now()).unwrap_err();
        assert!(matches!(err, LogShieldError::Export { .. }));
        assert_eq!(session.state(), &ViewState::Idle);
        assert_eq!(session.take_notices().len(), 1);
    }

    #[test]
    fn export_with_zero_threats_succeeds() {
        let mut session = displaying(0);
        for format in [
            OutputFormat::Console,
            OutputFormat::Json,
            OutputFormat::Html,
            OutputFormat::Pdf,
        ] {
            let bytes = session.export(format, Utc::now()).unwrap();
            assert!(!bytes.is_empty());
        }
        assert!(session.result().is_some());
    }

    #[test]
    fn copy_ban_queues_notice() {
        let mut session = displaying(2);
        let mut clipboard = MemoryClipboard::default();
        session.copy_ban(&mut clipboard, 1).unwrap();
        assert_eq!(
            clipboard.contents.as_deref(),
            Some("sudo iptables -A INPUT -s 10.0.0.1 -j DROP")
        );
        assert_eq!(
            session.take_notices(),
            vec![Notice::Info("Copied ban command for 10.0.0.1".into())]
        );
        assert!(session.copy_ban(&mut clipboard, 7).is_err());
    }
}
