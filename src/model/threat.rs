use serde::{Deserialize, Deserializer, Serialize};

/// One detected malicious log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatRecord {
    /// Attack class tag (e.g. "SQL_INJECTION"). Open vocabulary.
    pub category: String,
    /// Address the request appears to come from. Not validated.
    pub source_address: String,
    /// Apparent geographic/network origin, when the classifier resolved one.
    pub origin_label: Option<String>,
    /// The log line that triggered the detection, stored verbatim.
    pub raw_line: String,
}

impl ThreatRecord {
    pub fn new(
        category: impl Into<String>,
        source_address: impl Into<String>,
        origin_label: Option<String>,
        raw_line: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            source_address: source_address.into(),
            origin_label: origin_label.filter(|o| !o.is_empty()),
            raw_line: raw_line.into(),
        }
    }

    /// Origin for display; "-" when the classifier gave none.
    pub fn origin_or_dash(&self) -> &str {
        self.origin_label.as_deref().unwrap_or("-")
    }
}

/// A threat record as it arrives from the scanning service, before validation.
///
/// Fields that are present but not strings deserialize as `None`, so a
/// mistyped field fails validation for this record only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireThreat {
    #[serde(rename = "type", default, deserialize_with = "text_or_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub line: Option<String>,
}

fn text_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Some(text),
        _ => None,
    })
}

/// The required field a wire record was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    Category,
    SourceAddress,
    RawLine,
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Category => write!(f, "type"),
            Self::SourceAddress => write!(f, "ip"),
            Self::RawLine => write!(f, "line"),
        }
    }
}

impl WireThreat {
    /// Structural validation. Empty strings are accepted; absent fields are not.
    pub fn validate(self) -> std::result::Result<ThreatRecord, MissingField> {
        let category = self.kind.ok_or(MissingField::Category)?;
        let source_address = self.ip.ok_or(MissingField::SourceAddress)?;
        let raw_line = self.line.ok_or(MissingField::RawLine)?;
        Ok(ThreatRecord::new(
            category,
            source_address,
            self.country,
            raw_line,
        ))
    }
}
