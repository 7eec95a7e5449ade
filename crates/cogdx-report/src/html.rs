//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use cogdx_core::results::{DiagnosisState, DiagnosticResult};
use cogdx_core::triage::PathMutation;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// The payload embedded in the raw-data section.
#[derive(Serialize)]
struct RawData<'a> {
    result: &'a DiagnosticResult,
    plan: &'a [PathMutation],
}

fn state_class(state: DiagnosisState) -> &'static str {
    match state {
        DiagnosisState::Misconception => "misconception",
        DiagnosisState::Gap => "gap",
        DiagnosisState::Mastered => "mastered",
        DiagnosisState::Unknown => "unknown",
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Generate an HTML report for a diagnostic result and its remediation plan.
pub fn generate_html(result: &DiagnosticResult, plan: &[PathMutation]) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>cogdx diagnosis: {}</title>\n",
        html_escape(&result.attempt_id)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>cogdx diagnosis</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Learner: <strong>{}</strong> | attempt {} | score {}% | {}</p>\n",
        html_escape(&result.learner_id),
        html_escape(&result.attempt_id),
        result.overall_score,
        result.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Calibration and behavior
    let cal = &result.calibration;
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Metacognition</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Status</th><th>Certainty</th><th>Accuracy</th><th>ECE</th><th>Blind spots</th><th>Fragile knowledge</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td>{}%</td><td>{}%</td><td>{}</td><td>{}</td><td>{}</td></tr></tbody>\n",
        cal.calibration_status,
        cal.certainty_average,
        cal.accuracy_average,
        cal.ece_score,
        cal.blind_spots,
        cal.fragile_knowledge,
    ));
    html.push_str("</table>\n");
    html.push_str(&generate_bar_chart(&[
        ("Certainty", cal.certainty_average),
        ("Accuracy", cal.accuracy_average),
        ("Score", result.overall_score),
    ]));

    let profile = &result.behavior_profile;
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Impulsive</th><th>Anxious</th><th>Consistent</th><th>Rapid guesses</th><th>High entropy</th><th>Fragile certainty</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr></tbody>\n",
        yes_no(profile.is_impulsive),
        yes_no(profile.is_anxious),
        yes_no(profile.is_consistent),
        profile.rapid_guess_count,
        profile.high_entropy_count,
        profile.fragile_certainty_count,
    ));
    html.push_str("</table>\n");
    html.push_str("</section>\n");

    // Per-competency diagnoses
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Diagnoses</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"diagnoses\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Competency</th><th onclick=\"sortTable(1)\">State</th><th onclick=\"sortTable(2)\">Confidence</th><th>Evidence</th><th>Questions</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for d in &result.diagnoses {
        html.push_str(&format!(
            "<tr><td>{}</td><td class=\"{}\">{}</td><td>{:.2}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&d.competency_id),
            state_class(d.state),
            d.state,
            d.evidence.confidence,
            html_escape(&d.evidence.reason),
            html_escape(&d.evidence.source_question_ids.join(", ")),
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Remediation plan
    html.push_str("<section class=\"plan\">\n");
    html.push_str("<h2>Remediation plan</h2>\n");
    if plan.is_empty() {
        html.push_str("<p class=\"meta\">No path changes.</p>\n");
    } else {
        html.push_str("<ol>\n");
        for m in plan {
            let content = m
                .metadata
                .content_id
                .as_deref()
                .map(|c| format!(" &rarr; <code>{}</code>", html_escape(c)))
                .unwrap_or_default();
            html.push_str(&format!(
                "<li><strong>{}</strong> on <code>{}</code> ({}){}<br><span class=\"meta\">{}</span></li>\n",
                m.action,
                html_escape(&m.target_node_id),
                m.metadata.new_status,
                content,
                html_escape(&m.reason),
            ));
        }
        html.push_str("</ol>\n");
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(&RawData { result, plan })
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(result: &DiagnosticResult, plan: &[PathMutation], path: &Path) -> Result<()> {
    let html = generate_html(result, plan);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

/// Horizontal bars for percentage values in `0..=100`.
fn generate_bar_chart(bars: &[(&str, u32)]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 120;

    let total_height = bars.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (label, value)) in bars.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let pct = (*value).min(100) as usize;
        let width = pct * max_width / 100;

        let color = if pct >= 80 {
            "#22c55e"
        } else if pct >= 50 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(label)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            value
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --mastered: #dcfce7; --gap: #fef9c3; --misconception: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --mastered: #064e3b; --gap: #713f12; --misconception: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.mastered { background: var(--mastered); }
.gap { background: var(--gap); }
.misconception { background: var(--misconception); }
.unknown { color: #6b7280; }
ol li { margin: 0.5rem 0; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('diagnoses');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
