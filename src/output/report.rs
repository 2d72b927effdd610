use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::{tally, HealthScore};
use crate::model::ScanResult;
use crate::remediation::{ban_command, ban_list};

pub const REPORT_TITLE: &str = "LogShield Security Audit Report";

/// Characters of the raw line kept in a table excerpt.
pub const EXCERPT_CHARS: usize = 50;

/// Bar colours, assigned cyclically in chart order.
pub const PALETTE: [&str; 4] = ["#ef4444", "#3b82f6", "#f59e0b", "#8b5cf6"];

/// Everything an exported report shows, in layout order.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub title: &'static str,
    pub source_file: String,
    pub generated_at: DateTime<Utc>,
    pub total_lines_scanned: u64,
    pub threat_count: usize,
    pub health: HealthScore,
    pub rows: Vec<ReportRow>,
    pub chart: Vec<ChartEntry>,
    pub ban_commands: Vec<String>,
    pub warnings: Vec<String>,
    pub fingerprint: Option<String>,
}

/// One table row. Rows keep detection order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub category: String,
    pub source_address: String,
    pub origin: Option<String>,
    pub excerpt: String,
    pub ban_command: String,
}

/// One bar of the threat distribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartEntry {
    pub category: String,
    pub count: usize,
    pub color: &'static str,
}

impl ReportDocument {
    pub fn build(source_file: &str, result: &ScanResult, generated_at: DateTime<Utc>) -> Self {
        let rows = result
            .threats
            .iter()
            .map(|t| ReportRow {
                category: t.category.clone(),
                source_address: t.source_address.clone(),
                origin: t.origin_label.clone(),
                excerpt: excerpt(&t.raw_line, EXCERPT_CHARS),
                ban_command: ban_command(&t.source_address),
            })
            .collect();

        Self {
            title: REPORT_TITLE,
            source_file: source_file.to_string(),
            generated_at,
            total_lines_scanned: result.total_lines_scanned,
            threat_count: result.display_threat_count(),
            health: HealthScore::from_threat_count(result.display_threat_count()),
            rows,
            chart: chart_series(result),
            ban_commands: ban_list(&result.threats),
            warnings: result.warnings.iter().map(|w| w.to_string()).collect(),
            fingerprint: result.fingerprint.clone(),
        }
    }

    pub fn date_line(&self) -> String {
        format!("Date: {}", self.generated_at.format("%Y-%m-%d"))
    }

    pub fn score_line(&self) -> String {
        format!("Security Health Score: {}", self.health)
    }
}

/// Chart-ready distribution: one entry per category, sorted by name.
pub fn chart_series(result: &ScanResult) -> Vec<ChartEntry> {
    tally(&result.threats)
        .into_iter()
        .enumerate()
        .map(|(i, (category, count))| ChartEntry {
            category,
            count,
            color: PALETTE[i % PALETTE.len()],
        })
        .collect()
}

/// First `max_chars` characters of `line`, with `...` appended if cut.
pub fn excerpt(line: &str, max_chars: usize) -> String {
    match line.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &line[..cut]),
        None => line.to_string(),
    }
}
