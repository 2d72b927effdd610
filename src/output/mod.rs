pub mod console;
pub mod html;
pub mod json;
pub mod pdf;
pub mod report;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use report::{chart_series, excerpt, ChartEntry, ReportDocument, ReportRow};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
    Html,
    Pdf,
}

impl OutputFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "console" | "text" => Some(Self::Console),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Console => "txt",
            Self::Json => "json",
            Self::Html => "html",
            Self::Pdf => "pdf",
        }
    }

    /// `logshield-report.<ext>`
    pub fn default_file_name(&self) -> String {
        format!("logshield-report.{}", self.extension())
    }

    /// Binary formats are never written to a terminal.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Console => write!(f, "console"),
            Self::Json => write!(f, "json"),
            Self::Html => write!(f, "html"),
            Self::Pdf => write!(f, "pdf"),
        }
    }
}

/// Render a report document into the specified format.
pub fn render(doc: &ReportDocument, format: OutputFormat) -> Result<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Console => console::render(doc).into_bytes(),
        OutputFormat::Json => json::render(doc)?.into_bytes(),
        OutputFormat::Html => html::render(doc)?.into_bytes(),
        OutputFormat::Pdf => pdf::render(doc)?,
    };
    tracing::debug!(%format, bytes = bytes.len(), rows = doc.rows.len(), "report rendered");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_format_names() {
        assert_eq!(OutputFormat::from_str_lenient("PDF"), Some(OutputFormat::Pdf));
        assert_eq!(OutputFormat::from_str_lenient("text"), Some(OutputFormat::Console));
        assert_eq!(OutputFormat::from_str_lenient("sarif"), None);
    }

    #[test]
    fn default_file_names_follow_convention() {
        assert_eq!(OutputFormat::Pdf.default_file_name(), "logshield-report.pdf");
        assert_eq!(OutputFormat::Html.default_file_name(), "logshield-report.html");
    }
}
