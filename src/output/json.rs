use crate::error::Result;
use crate::output::ReportDocument;

/// Render the report document as pretty-printed JSON.
pub fn render(doc: &ReportDocument) -> Result<String> {
    let json = serde_json::to_string_pretty(doc)?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScanResult, ThreatRecord};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    #[test]
    fn json_carries_rows_chart_and_score() {
        let result = ScanResult::new(
            10,
            vec![ThreatRecord::new("XSS", "5.6.7.8", Some("DE".into()), "GET /<script>")],
        );
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let doc = ReportDocument::build("a.log", &result, at);
        let value: Value = serde_json::from_str(&render(&doc).unwrap()).unwrap();

        assert_eq!(value["title"], "LogShield Security Audit Report");
        assert_eq!(value["health"]["value"], 95);
        assert_eq!(value["health"]["status"], "healthy");
        assert_eq!(value["rows"][0]["source_address"], "5.6.7.8");
        assert_eq!(value["chart"][0]["color"], "#ef4444");
        assert_eq!(
            value["ban_commands"][0],
            "sudo iptables -A INPUT -s 5.6.7.8 -j DROP"
        );
    }
}
