//! Species Analysis: sex ratio of the most observed species and the
//! share of each identification method.

use crate::analysis::{value_counts, CrossTab};
use crate::data::Snapshot;
use crate::models::{
    BarMode, ChartData, ChartKind, ChartSpec, Observation, Panel, Series, Slice, ViewOutput,
};
use crate::views::{View, ViewSettings};
use std::collections::HashSet;

pub(super) fn render(snapshot: &Snapshot, settings: &ViewSettings) -> ViewOutput {
    let records = snapshot.records();

    let top: HashSet<&str> = value_counts(records, |o| o.scientific_name.as_deref())
        .into_iter()
        .take(settings.top_n)
        .map(|(name, _)| name)
        .collect();

    let subset: Vec<&Observation> = records
        .iter()
        .filter(|o| o.scientific_name.as_deref().is_some_and(|n| top.contains(n)))
        .collect();

    let sex_ratio = CrossTab::build(
        &subset,
        |o| o.scientific_name.as_deref(),
        |o| o.sex.as_deref(),
    );

    let sex_chart = ChartSpec::new(
        ChartKind::Bar {
            mode: BarMode::Group,
        },
        format!("Sex Ratio for Top {} Species", settings.top_n),
        grouped_by_column(&sex_ratio),
    )
    .with_axes("Scientific Name", "Count")
    .with_tick_angle(45);

    let slices = value_counts(records, |o| o.id_method.as_deref())
        .into_iter()
        .map(|(label, value)| Slice {
            label: label.to_string(),
            value,
        })
        .collect();

    let method_chart = ChartSpec::new(
        ChartKind::Pie,
        "Observation Methods by ID",
        ChartData::Slices { slices },
    )
    .with_color_scale("RdBu");

    ViewOutput {
        view: View::SpeciesAnalysis,
        title: "Species Diversity and Activity Patterns".to_string(),
        filters: Vec::new(),
        panels: vec![
            Panel::chart(sex_chart).titled("Sex Ratio by Species"),
            Panel::chart(method_chart).titled("Activity Patterns by ID Method"),
        ],
    }
}

/// Rows become categories, columns become the hue series.
fn grouped_by_column(table: &CrossTab) -> ChartData {
    let series = table
        .columns
        .iter()
        .enumerate()
        .map(|(c, name)| Series {
            name: name.clone(),
            values: table.cells.iter().map(|row| row[c]).collect(),
        })
        .collect();

    ChartData::Categories {
        categories: table.rows.clone(),
        series,
    }
}
