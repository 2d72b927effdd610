use crate::analysis::HealthStatus;
use crate::error::Result;
use crate::output::ReportDocument;

/// Render the report as a self-contained HTML page.
pub fn render(doc: &ReportDocument) -> Result<String> {
    let health_class = match doc.health.status {
        HealthStatus::Healthy => "healthy",
        HealthStatus::AtRisk => "risk",
    };
    let threats_class = if doc.threat_count > 0 { "risk" } else { "healthy" };

    let max = doc.chart.iter().map(|e| e.count).max().unwrap_or(1);
    let chart_rows: String = doc
        .chart
        .iter()
        .map(|e| {
            format!(
                r#"<div class="bar-row"><span class="bar-label">{category}</span><span class="bar" style="width: {pct}%; background: {color};"></span><span class="bar-count">{count}</span></div>
"#,
                category = html_escape(&e.category),
                pct = e.count * 100 / max,
                color = e.color,
                count = e.count,
            )
        })
        .collect();

    let table_rows: String = doc
        .rows
        .iter()
        .map(|r| {
            format!(
                r#"<tr>
  <td><span class="badge">{category}</span></td>
  <td><code>{ip}</code></td>
  <td>{origin}</td>
  <td class="line"><code>{excerpt}</code></td>
  <td><code class="cmd">{ban}</code></td>
</tr>
"#,
                category = html_escape(&r.category),
                ip = html_escape(&r.source_address),
                origin = html_escape(r.origin.as_deref().unwrap_or("-")),
                excerpt = html_escape(&r.excerpt),
                ban = html_escape(&r.ban_command),
            )
        })
        .collect();

    let warnings: String = doc
        .warnings
        .iter()
        .map(|w| format!("<li>{}</li>", html_escape(w)))
        .collect();

    let html = format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
  :root {{
    --bg: #020617; --fg: #e2e8f0; --muted: #64748b; --border: #1e293b;
    --card: #0f172a; --accent: #3b82f6; --ok: #4ade80; --risk: #facc15; --bad: #ef4444;
  }}
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
    background: var(--bg); color: var(--fg); line-height: 1.5; padding: 2rem; }}
  .container {{ max-width: 1000px; margin: 0 auto; }}
  header {{ margin-bottom: 1.5rem; }}
  header h1 {{ font-size: 1.6rem; color: var(--accent); }}
  header p {{ color: var(--muted); font-size: 0.9rem; }}
  .summary {{ display: grid; grid-template-columns: repeat(3, 1fr); gap: 1rem; margin-bottom: 1.5rem; }}
  .stat {{ background: var(--card); border: 1px solid var(--border); border-radius: 8px; padding: 1rem; }}
  .stat .label {{ font-size: 0.85rem; color: var(--muted); }}
  .stat .count {{ font-size: 1.8rem; font-weight: 700; }}
  .stat .note {{ font-size: 0.75rem; color: var(--muted); }}
  .healthy {{ color: var(--ok); }}
  .risk {{ color: var(--risk); }}
  .card {{ background: var(--card); border: 1px solid var(--border); border-radius: 8px;
    padding: 1rem; margin-bottom: 1.5rem; }}
  .card h2 {{ font-size: 0.9rem; color: var(--muted); margin-bottom: 0.75rem; }}
  .bar-row {{ display: flex; align-items: center; gap: 0.5rem; margin-bottom: 0.4rem; }}
  .bar-label {{ width: 160px; font-size: 0.8rem; font-family: monospace; }}
  .bar {{ display: inline-block; height: 1rem; border-radius: 4px 4px 0 0; }}
  .bar-count {{ font-size: 0.8rem; color: var(--muted); }}
  .warnings {{ color: var(--risk); font-size: 0.85rem; margin: 0 0 1.5rem 1.5rem; }}
  table {{ width: 100%; border-collapse: collapse; background: var(--card);
    border: 1px solid var(--border); border-radius: 8px; overflow: hidden; }}
  th {{ text-align: left; padding: 0.75rem 1rem; background: var(--bg);
    font-size: 0.7rem; text-transform: uppercase; color: var(--muted); letter-spacing: 0.05em; }}
  td {{ padding: 0.6rem 1rem; border-top: 1px solid var(--border); font-size: 0.85rem; vertical-align: top; }}
  td.line {{ max-width: 300px; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }}
  .badge {{ display: inline-block; padding: 0.1rem 0.5rem; border-radius: 4px; font-size: 0.75rem;
    font-family: monospace; color: var(--bad); border: 1px solid var(--bad); }}
  .cmd {{ font-size: 0.75rem; color: var(--accent); }}
  .empty {{ text-align: center; padding: 3rem; color: var(--ok); font-size: 1.2rem; }}
  footer {{ margin-top: 1.5rem; text-align: center; font-size: 0.75rem; color: var(--muted); }}
</style>
</head>
<body>
<div class="container">
  <header>
    <h1>{title}</h1>
    <p>{date} &middot; {file}</p>
  </header>

  <div class="summary">
    <div class="stat"><div class="label">Lines Scanned</div><div class="count">{lines}</div></div>
    <div class="stat"><div class="label">Threats Found</div><div class="count {threats_class}">{threats}</div></div>
    <div class="stat"><div class="label">Security Health</div><div class="count {health_class}">{score}</div><div class="note">{health_label}</div></div>
  </div>

  {warnings}

  {content}

  <footer>
    Generated by LogShield {version}{fingerprint}.
    Ban commands contain addresses taken from the scanned log; review before running.
  </footer>
</div>
</body>
</html>"##,
        title = html_escape(doc.title),
        date = html_escape(&doc.date_line()),
        file = html_escape(&doc.source_file),
        lines = doc.total_lines_scanned,
        threats_class = threats_class,
        threats = doc.threat_count,
        health_class = health_class,
        score = doc.health,
        health_label = doc.health.status.label(),
        version = env!("CARGO_PKG_VERSION"),
        fingerprint = doc
            .fingerprint
            .as_ref()
            .map(|f| format!(" &middot; sha256 {f}"))
            .unwrap_or_default(),
        warnings = if warnings.is_empty() {
            String::new()
        } else {
            format!(r#"<ul class="warnings">{warnings}</ul>"#)
        },
        content = if doc.rows.is_empty() {
            "<div class=\"empty\">No threats detected.</div>".to_string()
        } else {
            format!(
                r#"<div class="card">
    <h2>Threat Distribution</h2>
    {chart_rows}
  </div>

  <table>
  <thead>
    <tr><th>Type</th><th>Attacker IP</th><th>Origin</th><th>Log Fragment</th><th>Action</th></tr>
  </thead>
  <tbody>
    {table_rows}
  </tbody>
</table>"#
            )
        },
    );

    Ok(html)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
