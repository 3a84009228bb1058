//! Report rendering for tileset coverage.

use std::fmt::Write;
use std::path::Path;

use serde::Serialize;

use crate::coverage::{CoverageStats, TilesetCoverage};

/// Stylesheet linked by every HTML report, written next to them as `coverage.css`.
pub const COVERAGE_CSS: &str = r#"body {
  font-family: sans-serif;
  margin: 2em;
}
.flex-table {
  display: flex;
  flex-direction: column;
  border: 1px solid #ccc;
}
.flex-row {
  display: flex;
  flex-direction: row;
  border-bottom: 1px solid #eee;
}
.flex-row > div {
  flex: 1 1 0;
  padding: 0.3em 0.5em;
}
.flex-row > div:first-child {
  flex: 4 1 0;
}
.flex-row:first-child {
  font-weight: bold;
  background: #f4f4f4;
}
.flex-column {
  display: flex;
  flex-direction: column;
}
.indented-text {
  padding-left: 0.5em;
}
.coverage-cell {
  display: flex;
  flex-direction: row;
  align-items: center;
}
.coverage-bar {
  height: 0.8em;
  margin-right: 0.5em;
}
.coverage-bar[color="red"] {
  background: #d9534f;
}
.coverage-bar[color="blue"] {
  background: #428bca;
}
.coverage-bar[color="green"] {
  background: #5cb85c;
}
"#;

/// Render the HTML report of one tileset; paths are shown relative to `game_root`.
pub fn render_tileset_html(coverage: &TilesetCoverage, game_root: &Path) -> String {
    let display_name = escape_html(coverage.display_name());
    let mut output = String::new();
    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(output, "<html lang=\"en\">");
    let _ = writeln!(output, "<head>");
    let _ = writeln!(output, "<meta charset=\"utf-8\">");
    let _ = writeln!(output, "<link rel=\"stylesheet\" href=\"coverage.css\">");
    let _ = writeln!(
        output,
        "<title>{display_name} - Tileset Coverage Report</title>"
    );
    let _ = writeln!(output, "</head>");
    let _ = writeln!(output, "<body>");
    let _ = writeln!(output, "<h1>{display_name}</h1>");
    let _ = writeln!(output, "<hr>");
    let _ = writeln!(output, "<div class=\"flex-table\">");
    append_header_row(&mut output);
    for (path, file) in coverage.files() {
        append_file_row(&mut output, path, game_root, &file.stats);
    }
    let _ = writeln!(output, "</div>");
    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");
    output
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

/// One line per tileset with totals over all of its files.
pub fn render_summary_text(coverages: &[TilesetCoverage]) -> String {
    let mut output = String::new();
    for coverage in coverages {
        let totals = total_stats(coverage);
        let _ = writeln!(
            output,
            "{} ({}): {} files, {} objects, {} unique, {} inherited, {} without coverage ({})",
            coverage.display_name(),
            coverage.name(),
            coverage.files().count(),
            totals.total,
            totals.unique,
            totals.inherited,
            totals.no_coverage,
            format_percent(totals.covered_percent()),
        );
    }
    output
}

/// Sum of the stats of every file of a tileset.
pub fn total_stats(coverage: &TilesetCoverage) -> CoverageStats {
    coverage
        .files()
        .fold(CoverageStats::default(), |mut totals, (_, file)| {
            totals.total += file.stats.total;
            totals.unique += file.stats.unique;
            totals.inherited += file.stats.inherited;
            totals.no_coverage += file.stats.no_coverage;
            totals
        })
}

/// Bar color for a coverage percentage.
pub fn coverage_color(percent: f64) -> &'static str {
    if percent < 33.0 {
        "red"
    } else if percent < 66.0 {
        "blue"
    } else {
        "green"
    }
}

fn format_percent(percent: f64) -> String {
    format!("{percent:.1}%")
}

fn append_header_row(output: &mut String) {
    let _ = writeln!(output, "<div class=\"flex-row\">");
    for title in ["Files", "Total", "Inherited", "No coverage", "Coverage"] {
        let _ = writeln!(
            output,
            "<div class=\"flex-column\"><div class=\"indented-text\">{title}</div></div>"
        );
    }
    let _ = writeln!(output, "</div>");
}

fn append_file_row(output: &mut String, path: &Path, game_root: &Path, stats: &CoverageStats) {
    let percent = stats.covered_percent();
    let percent_text = format_percent(percent);
    let shown = path
        .strip_prefix(game_root)
        .unwrap_or(path)
        .display()
        .to_string()
        .replace('\\', "/");
    let link = path.display().to_string().replace('\\', "/");
    let link = link.trim_start_matches('/');

    let _ = writeln!(output, "<div class=\"flex-row\">");
    let _ = writeln!(
        output,
        "<div><div class=\"indented-text\"><a href=\"file:///{}\" target=\"blank\">{}</a></div></div>",
        escape_html(link),
        escape_html(&shown)
    );
    let _ = writeln!(output, "<div>{}</div>", stats.total);
    let _ = writeln!(output, "<div>{}</div>", stats.inherited);
    let _ = writeln!(output, "<div>{}</div>", stats.no_coverage);
    let _ = writeln!(
        output,
        "<div class=\"coverage-cell\"><div class=\"coverage-bar\" color=\"{}\" style=\"flex: 0 0 {percent_text}\"></div><div class=\"coverage-text\">{percent_text}</div></div>",
        coverage_color(percent)
    );
    let _ = writeln!(output, "</div>");
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
