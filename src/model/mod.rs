pub mod threat;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{LogShieldError, Result};

pub use threat::{MissingField, ThreatRecord, WireThreat};

/// The outcome of one submitted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Number of log lines the classifier examined.
    pub total_lines_scanned: u64,
    /// Threat count as reported by the classifier. May disagree with
    /// `threats.len()`; use [`ScanResult::display_threat_count`] for display.
    pub threat_count: u64,
    /// Detections in classifier order.
    pub threats: Vec<ThreatRecord>,
    /// Non-fatal problems found while ingesting the response.
    #[serde(default)]
    pub warnings: Vec<IntegrityWarning>,
    /// SHA-256 of the submitted content, hex encoded.
    #[serde(default)]
    pub fingerprint: Option<String>,
}

/// A data-integrity problem in a scan response. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityWarning {
    /// `threats_found` disagrees with the number of usable records.
    CountMismatch { reported: Option<u64>, actual: usize },
    /// Record at `index` in `details` lacked a required text field and was dropped.
    MalformedRecord { index: usize, missing_field: MissingField },
    /// Entry at `index` in `details` was not a JSON object and was dropped.
    UnreadableRecord { index: usize },
}

impl std::fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CountMismatch {
                reported: Some(reported),
                actual,
            } => write!(
                f,
                "service reported {reported} threat(s) but returned {actual}; showing {actual}"
            ),
            Self::CountMismatch {
                reported: None,
                actual,
            } => write!(
                f,
                "service omitted the threat count; showing {actual} returned record(s)"
            ),
            Self::MalformedRecord {
                index,
                missing_field,
            } => write!(
                f,
                "threat record #{index} has no text '{missing_field}' and was skipped"
            ),
            Self::UnreadableRecord { index } => {
                write!(f, "threat record #{index} is not an object and was skipped")
            }
        }
    }
}

impl ScanResult {
    /// Build a consistent result (reported count equals record count).
    pub fn new(total_lines_scanned: u64, threats: Vec<ThreatRecord>) -> Self {
        Self {
            total_lines_scanned,
            threat_count: threats.len() as u64,
            threats,
            warnings: Vec::new(),
            fingerprint: None,
        }
    }

    /// Validate a wire response into the internal model.
    ///
    /// Records missing a required field are dropped with a warning; a count
    /// mismatch is recorded as a warning. Only a response without
    /// `total_lines` or `details` is rejected outright.
    pub fn from_response(response: ScanResponse) -> Result<Self> {
        let total_lines_scanned = response
            .total_lines
            .ok_or_else(|| LogShieldError::MalformedResponse("missing 'total_lines'".into()))?;
        let details = response
            .details
            .ok_or_else(|| LogShieldError::MalformedResponse("missing 'details'".into()))?;

        let mut threats = Vec::with_capacity(details.len());
        let mut warnings = Vec::new();

        for (index, entry) in details.into_iter().enumerate() {
            let wire = entry
                .is_object()
                .then(|| serde_json::from_value::<WireThreat>(entry).ok())
                .flatten();
            let Some(wire) = wire else {
                tracing::warn!(index, "dropping threat record that is not an object");
                warnings.push(IntegrityWarning::UnreadableRecord { index });
                continue;
            };
            match wire.validate() {
                Ok(record) => threats.push(record),
                Err(missing_field) => {
                    tracing::warn!(index, field = %missing_field, "dropping malformed threat record");
                    warnings.push(IntegrityWarning::MalformedRecord {
                        index,
                        missing_field,
                    });
                }
            }
        }

        let actual = threats.len();
        if response.threats_found != Some(actual as u64) {
            tracing::warn!(
                reported = ?response.threats_found,
                actual,
                "threat count disagrees with returned records"
            );
            warnings.push(IntegrityWarning::CountMismatch {
                reported: response.threats_found,
                actual,
            });
        }

        Ok(Self {
            total_lines_scanned,
            threat_count: response.threats_found.unwrap_or(actual as u64),
            threats,
            warnings,
            fingerprint: None,
        })
    }

    /// Attach the fingerprint of the content this result describes.
    pub fn with_fingerprint(mut self, content: &[u8]) -> Self {
        self.fingerprint = Some(fingerprint(content));
        self
    }

    /// Threat count derived from the records themselves.
    pub fn display_threat_count(&self) -> usize {
        self.threats.len()
    }

    pub fn has_integrity_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Scan response body as sent by the scanning service.
///
/// `details` stays untyped here; each entry is checked on its own in
/// [`ScanResult::from_response`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanResponse {
    pub total_lines: Option<u64>,
    pub threats_found: Option<u64>,
    pub details: Option<Vec<serde_json::Value>>,
}

impl ScanResponse {
    /// Parse a response body. Anything that is not the expected JSON object
    /// is a [`LogShieldError::MalformedResponse`].
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| LogShieldError::MalformedResponse(e.to_string()))
    }
}

/// Hex-encoded SHA-256 of `content`.
pub fn fingerprint(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}
