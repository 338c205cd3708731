//! Markdown and JSON rendering of views and reports.
//!
//! Charts are rendered as the tables of numbers behind them so the
//! output stays readable in a terminal or a Markdown viewer.

use crate::models::{
    ChartData, ChartSpec, FilterWidget, Notice, NoticeLevel, Panel, PanelContent, Report,
    ReportMetadata, TableSpec, ViewOutput,
};
use crate::views::format_count;
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// Generate a complete Markdown report covering every view.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Bird Observation Analysis\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(&report.views));

    for view in &report.views {
        output.push_str(&generate_view_section(view, 2));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the Markdown for one view on its own.
pub fn generate_markdown_view(view: &ViewOutput) -> String {
    generate_view_section(view, 1)
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Database:** `{}`\n", metadata.database));
    section.push_str(&format!(
        "- **Loaded At:** {}\n",
        metadata.loaded_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Generated At:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Observations:** {}\n",
        format_count(metadata.observations as u64)
    ));
    section.push_str(&format!("- **Species:** {}\n", metadata.species));
    section.push_str(&format!("- **Admin Units:** {}\n", metadata.admin_units));
    section.push_str(&format!(
        "- **Render Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents(views: &[ViewOutput]) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    for view in views {
        toc.push_str(&format!("- [{}](#{})\n", view.view, anchor(view.view.label())));
    }
    toc.push('\n');

    toc
}

/// GitHub-style heading anchor.
fn anchor(heading: &str) -> String {
    heading
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' => Some(c),
            ' ' => Some('-'),
            _ => None,
        })
        .collect()
}

fn generate_view_section(view: &ViewOutput, level: usize) -> String {
    let mut section = String::new();
    let hashes = "#".repeat(level);

    section.push_str(&format!("{} {}\n\n", hashes, view.view));
    if view.title != view.view.label() {
        section.push_str(&format!("*{}*\n\n", view.title));
    }

    for filter in &view.filters {
        section.push_str(&generate_filter_line(filter));
    }
    if !view.filters.is_empty() {
        section.push('\n');
    }

    for panel in &view.panels {
        section.push_str(&generate_panel(panel, level + 1));
    }

    section
}

fn generate_filter_line(filter: &FilterWidget) -> String {
    format!(
        "- **{}** `{}` ({} options)\n",
        filter.label.trim_end_matches(':'),
        filter.selected,
        filter.options.len()
    )
}

fn generate_panel(panel: &Panel, level: usize) -> String {
    let mut block = String::new();
    let hashes = "#".repeat(level);

    if let Some(ref subheading) = panel.subheading {
        block.push_str(&format!("{} {}\n\n", hashes, subheading));
    }

    match &panel.content {
        PanelContent::Chart(chart) => block.push_str(&generate_chart_block(chart)),
        PanelContent::Table(table) => block.push_str(&generate_table_block(table)),
        PanelContent::Notice(notice) => block.push_str(&generate_notice_block(notice)),
    }

    block
}

fn generate_chart_block(chart: &ChartSpec) -> String {
    let mut block = String::new();

    block.push_str(&format!("**{}** ({})\n\n", chart.title, chart.kind));

    let mut notes = Vec::new();
    if let (Some(x), Some(y)) = (&chart.x_label, &chart.y_label) {
        notes.push(format!("x: {} | y: {}", x, y));
    }
    if let Some(scale) = &chart.color_scale {
        notes.push(format!("color scale: {}", scale));
    }
    if let Some(angle) = chart.x_tick_angle {
        notes.push(format!("labels rotated {}°", angle));
    }
    if !notes.is_empty() {
        block.push_str(&format!("*{}*\n\n", notes.join(" · ")));
    }

    if chart.data.is_empty() {
        block.push_str("_No data points._\n\n");
        return block;
    }

    let (header, rows) = chart_rows(chart);
    block.push_str(&markdown_table(&header, &rows));
    block.push('\n');

    block
}

/// Flatten chart data into a header and string rows.
fn chart_rows(chart: &ChartSpec) -> (Vec<String>, Vec<Vec<String>>) {
    let x = chart.x_label.clone().unwrap_or_else(|| "Category".to_string());
    let y = chart.y_label.clone().unwrap_or_else(|| "Value".to_string());

    match &chart.data {
        ChartData::Categories { categories, series } => {
            let mut header = vec![x];
            if series.len() == 1 {
                header.push(y);
            } else {
                header.extend(series.iter().map(|s| s.name.clone()));
            }
            let rows = categories
                .iter()
                .enumerate()
                .map(|(i, category)| {
                    let mut row = vec![category.clone()];
                    row.extend(series.iter().map(|s| s.values[i].to_string()));
                    row
                })
                .collect();
            (header, rows)
        }
        ChartData::TimeSeries { points } => {
            let rows = points
                .iter()
                .map(|p| vec![p.date.format("%Y-%m-%d").to_string(), p.value.to_string()])
                .collect();
            (vec![x, y], rows)
        }
        ChartData::Scatter { points } => {
            let rows = points
                .iter()
                .map(|p| vec![format!("{:.2}", p.x), p.y.to_string()])
                .collect();
            (vec![x, y], rows)
        }
        ChartData::Slices { slices } => {
            let total: u64 = slices.iter().map(|s| s.value).sum();
            let rows = slices
                .iter()
                .map(|s| {
                    let share = if total > 0 {
                        s.value as f64 / total as f64 * 100.0
                    } else {
                        0.0
                    };
                    vec![s.label.clone(), s.value.to_string(), format!("{:.1}%", share)]
                })
                .collect();
            (vec!["Label".to_string(), "Count".to_string(), "Share".to_string()], rows)
        }
        ChartData::Matrix { rows, columns, cells } => {
            let mut header = vec![format!("{} \\ {}", y, x)];
            header.extend(columns.iter().cloned());
            let body = rows
                .iter()
                .zip(cells)
                .map(|(label, counts)| {
                    let mut row = vec![label.clone()];
                    row.extend(counts.iter().map(|n| n.to_string()));
                    row
                })
                .collect();
            (header, body)
        }
    }
}

fn generate_table_block(table: &TableSpec) -> String {
    let mut block = String::new();

    if table.rows.is_empty() {
        block.push_str("_No rows._\n\n");
        return block;
    }

    block.push_str(&markdown_table(&table.columns, &table.rows));
    block.push('\n');

    block
}

fn generate_notice_block(notice: &Notice) -> String {
    let badge = match notice.level {
        NoticeLevel::Warning => "⚠️ **Warning:**",
    };
    format!("> {} {}\n\n", badge, notice.message)
}

fn markdown_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut table = String::new();

    table.push_str(&format!("| {} |\n", escape_cells(header).join(" | ")));
    table.push_str(&format!(
        "|{}|\n",
        header.iter().map(|_| ":---").collect::<Vec<_>>().join("|")
    ));
    for row in rows {
        table.push_str(&format!("| {} |\n", escape_cells(row).join(" | ")));
    }

    table
}

fn escape_cells(cells: &[String]) -> Vec<String> {
    cells.iter().map(|c| c.replace('|', "\\|")).collect()
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by birdscope v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Generate the JSON for one view.
pub fn generate_json_view(view: &ViewOutput) -> Result<String> {
    serde_json::to_string_pretty(view).map_err(Into::into)
}

/// Write rendered content to a file.
pub fn write_output(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{obs, snapshot};
    use crate::views::{render, Filters, View};
    use chrono::Utc;

    fn create_test_report() -> Report {
        let snap = snapshot(vec![
            obs("ANTI", "Forest", "ANTI-0001", "Turdus merula"),
            obs("ANTI", "Grassland", "ANTI-0002", "Corvus corax"),
            obs("CATO", "Forest", "CATO-0001", "Turdus merula"),
        ]);

        let views = View::ALL
            .iter()
            .map(|v| render(*v, &Filters::default(), &snap).unwrap())
            .collect();

        Report {
            metadata: ReportMetadata {
                database: "bird_observations.db".to_string(),
                loaded_at: Utc::now(),
                generated_at: Utc::now(),
                observations: 3,
                species: 2,
                admin_units: 2,
                duration_seconds: 0.01,
            },
            views,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Bird Observation Analysis"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Table of Contents"));
        for view in View::ALL {
            assert!(markdown.contains(&format!("## {}", view.label())));
        }
        assert!(markdown.contains("- [Distance & Behavior](#distance--behavior)"));
        assert!(markdown.contains("Turdus merula"));
    }

    #[test]
    fn test_anchor() {
        assert_eq!(anchor("Species Distribution"), "species-distribution");
        assert_eq!(anchor("Distance & Behavior"), "distance--behavior");
    }

    #[test]
    fn test_chart_block_renders_stacked_series() {
        let report = create_test_report();
        let chart = report.views[0].charts().next().unwrap();
        let block = generate_chart_block(chart);

        assert!(block.contains("Stacked bar chart"));
        assert!(block.contains("| Admin Unit | Forest | Grassland |"));
        assert!(block.contains("| ANTI | 1 | 1 |"));
        assert!(block.contains("| CATO | 1 | 0 |"));
    }

    #[test]
    fn test_notice_block() {
        let block = generate_notice_block(&Notice::warning("No data available for heatmap visualization."));
        assert!(block.starts_with("> ⚠️ **Warning:**"));
        assert!(block.contains("No data available"));
    }

    #[test]
    fn test_markdown_table_escapes_pipes() {
        let table = markdown_table(
            &["Sky".to_string()],
            &[vec!["Fog|Smoke".to_string()]],
        );
        assert!(table.contains("Fog\\|Smoke"));
    }

    #[test]
    fn test_single_view_markdown_lists_filters() {
        let snap = snapshot(vec![obs("ANTI", "Forest", "ANTI-0001", "Turdus merula")]);
        let view = render(View::TemporalAnalysis, &Filters::default(), &snap).unwrap();
        let markdown = generate_markdown_view(&view);

        assert!(markdown.starts_with("# Temporal Analysis"));
        assert!(markdown.contains("**Select Admin Unit** `All` (2 options)"));
        assert!(markdown.contains("| 2024-01-01 | 1 |"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"views\""));
        assert!(json.contains("\"Conservation Insights\""));
        assert!(json.contains("\"type\": \"heatmap\""));
    }
}
