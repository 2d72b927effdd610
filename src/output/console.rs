use crate::analysis::HealthStatus;
use crate::output::ReportDocument;

/// Widest bar in the distribution chart.
const BAR_WIDTH: usize = 30;

/// Render the report as plain console text: summary, distribution, table.
pub fn render(doc: &ReportDocument) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n  {}\n", doc.title));
    output.push_str(&format!("  {}\n", doc.date_line()));
    output.push_str(&format!("  File: {}\n\n", terminal_safe(&doc.source_file)));

    let health_tag = match doc.health.status {
        HealthStatus::Healthy => "[OK]  ",
        HealthStatus::AtRisk => "[RISK]",
    };
    output.push_str(&format!("  Lines scanned:   {}\n", doc.total_lines_scanned));
    output.push_str(&format!("  Threats found:   {}\n", doc.threat_count));
    output.push_str(&format!(
        "  Security health: {} {} {}\n",
        health_tag,
        doc.health,
        doc.health.status.label()
    ));

    for warning in &doc.warnings {
        output.push_str(&format!("  warning: {}\n", warning));
    }

    if doc.rows.is_empty() {
        output.push_str("\n  No threats detected.\n\n");
        return output;
    }

    output.push_str("\n  Threat distribution:\n");
    let max = doc.chart.iter().map(|e| e.count).max().unwrap_or(1);
    let label_width = doc
        .chart
        .iter()
        .map(|e| e.category.chars().count())
        .max()
        .unwrap_or(0);
    for entry in &doc.chart {
        let len = (entry.count * BAR_WIDTH).div_ceil(max);
        output.push_str(&format!(
            "    {:<width$} {} {}\n",
            terminal_safe(&entry.category),
            "#".repeat(len),
            entry.count,
            width = label_width
        ));
    }

    output.push_str(&format!(
        "\n  {:<16} {:<16} {:<10} LOG FRAGMENT\n",
        "TYPE", "ATTACKER IP", "ORIGIN"
    ));
    output.push_str(&format!("  {}\n", "-".repeat(96)));
    for row in &doc.rows {
        output.push_str(&format!(
            "  {:<16} {:<16} {:<10} {}\n",
            terminal_safe(&row.category),
            terminal_safe(&row.source_address),
            terminal_safe(row.origin.as_deref().unwrap_or("-")),
            terminal_safe(&row.excerpt),
        ));
    }
    output.push('\n');

    output
}

/// Replace control characters so log text cannot drive the terminal.
/// Whitespace becomes a space; escapes and other controls become `?`.
fn terminal_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\t' | '\r' | '\n' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScanResult, ThreatRecord};
    use chrono::Utc;

    #[test]
    fn empty_scan_prints_summary_only() {
        let doc = ReportDocument::build("a.log", &ScanResult::new(40, vec![]), Utc::now());
        let text = render(&doc);
        assert!(text.contains("Lines scanned:   40"));
        assert!(text.contains("100% Excellent"));
        assert!(text.contains("No threats detected."));
    }

    #[test]
    fn rows_and_bars_are_listed() {
        let threats = (0..5)
            .map(|i| ThreatRecord::new("SQL_INJECTION", format!("10.0.0.{i}"), None, "x"))
            .collect();
        let doc = ReportDocument::build("a.log", &ScanResult::new(5, threats), Utc::now());
        let text = render(&doc);
        assert!(text.contains("75% Risk Detected"));
        assert!(text.contains(&format!("SQL_INJECTION {} 5", "#".repeat(BAR_WIDTH))));
        assert_eq!(text.matches("10.0.0.").count(), 5);
    }

    #[test]
    fn terminal_escapes_in_log_text_are_neutralised() {
        let threat = ThreatRecord::new(
            "XSS\x1b[31m",
            "1.1.1.1\u{9b}2J",
            Some("\x07".into()),
            "GET /\x1b[2J\x1b]0;owned\x07\r\nHost: x",
        );
        let doc = ReportDocument::build("a\x1b.log", &ScanResult::new(1, vec![threat]), Utc::now());
        let text = render(&doc);
        assert!(!text.contains('\x1b'));
        assert!(!text.contains('\x07'));
        assert!(!text.contains('\u{9b}'));
        assert!(text.contains("GET /?[2J?]0;owned?  Host: x"));
    }
}
