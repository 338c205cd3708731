//! Spatial Analysis: biodiversity by habitat and by plot.

use crate::analysis::{distinct_count_by, sort_by_key, top_n};
use crate::data::Snapshot;
use crate::models::{BarMode, ChartData, ChartKind, ChartSpec, Panel, Series, ViewOutput};
use crate::views::{View, ViewSettings};
use tracing::debug;

pub(super) fn render(snapshot: &Snapshot, settings: &ViewSettings) -> ViewOutput {
    let records = snapshot.records();
    let by_location = sort_by_key(distinct_count_by(
        records,
        |o| o.location_type.as_deref(),
        |o| o.scientific_name.as_deref(),
    ));

    // One series per habitat so each bar gets its own color.
    let location_chart = ChartSpec::new(
        ChartKind::Bar {
            mode: BarMode::Group,
        },
        "Unique Species by Location Type",
        ChartData::Categories {
            categories: by_location.iter().map(|(k, _)| k.to_string()).collect(),
            series: by_location
                .iter()
                .enumerate()
                .map(|(i, (name, _))| Series {
                    name: name.to_string(),
                    values: by_location
                        .iter()
                        .enumerate()
                        .map(|(j, (_, n))| if i == j { *n } else { 0 })
                        .collect(),
                })
                .collect(),
        },
    )
    .with_axes("Location Type", "Unique Species");

    let by_plot = distinct_count_by(
        records,
        |o| o.plot_name.as_deref(),
        |o| o.scientific_name.as_deref(),
    );
    let plot_total = by_plot.len();
    let top_plots = top_n(by_plot, settings.top_n);
    debug!("Top {} of {} plots by diversity", top_plots.len(), plot_total);

    let plot_chart = ChartSpec::new(
        ChartKind::Bar {
            mode: BarMode::Group,
        },
        format!("Top {} Plots by Species Diversity", settings.top_n),
        ChartData::Categories {
            categories: top_plots.iter().map(|(k, _)| k.to_string()).collect(),
            series: vec![Series {
                name: "Unique Species".to_string(),
                values: top_plots.iter().map(|(_, n)| *n).collect(),
            }],
        },
    )
    .with_axes("Plot Name", "Unique Species")
    .with_tick_angle(45);

    ViewOutput {
        view: View::SpatialAnalysis,
        title: "Biodiversity by Location Type and Plot".to_string(),
        filters: Vec::new(),
        panels: vec![Panel::chart(location_chart), Panel::chart(plot_chart)],
    }
}
