//! Temporal Analysis: observations per day, optionally filtered.

use super::{optional_selection, ALL};
use crate::analysis::{count_by, sort_by_key};
use crate::data::Snapshot;
use crate::error::DashboardError;
use crate::models::{
    ChartData, ChartKind, ChartSpec, FilterKind, FilterWidget, Observation, Panel, TimePoint,
    ViewOutput,
};
use crate::views::{Filters, View};
use tracing::debug;

pub(super) fn render(snapshot: &Snapshot, filters: &Filters) -> Result<ViewOutput, DashboardError> {
    let admin_options = snapshot.admin_units();
    let species_options = snapshot.species();

    let admin = optional_selection(
        FilterKind::AdminUnit,
        filters.admin_unit.as_deref(),
        &admin_options,
    )?;
    let species = optional_selection(
        FilterKind::Species,
        filters.species.as_deref(),
        &species_options,
    )?;

    let filtered = filter_rows(snapshot.records(), admin, species);
    debug!("Temporal filter kept {} of {} rows", filtered.len(), snapshot.len());

    let points = sort_by_key(count_by(&filtered, |o| o.date))
        .into_iter()
        .map(|(date, value)| TimePoint { date, value })
        .collect();

    let chart = ChartSpec::new(
        ChartKind::Line,
        "Observation Frequency Over Time",
        ChartData::TimeSeries { points },
    )
    .with_axes("Date", "Number of Observations");

    Ok(ViewOutput {
        view: View::TemporalAnalysis,
        title: "Bird Observation Frequency Over Time".to_string(),
        filters: vec![
            all_widget(FilterKind::AdminUnit, "Select Admin Unit", admin_options, admin),
            all_widget(FilterKind::Species, "Select Species", species_options, species),
        ],
        panels: vec![Panel::chart(chart)],
    })
}

/// Rows matching both equality filters; `None` lets everything through.
fn filter_rows<'a>(
    records: &'a [Observation],
    admin: Option<&str>,
    species: Option<&str>,
) -> Vec<&'a Observation> {
    records
        .iter()
        .filter(|o| admin.map_or(true, |a| o.admin_unit_code.as_deref() == Some(a)))
        .filter(|o| species.map_or(true, |s| o.scientific_name.as_deref() == Some(s)))
        .collect()
}

fn all_widget(
    kind: FilterKind,
    label: &str,
    options: Vec<String>,
    selected: Option<&str>,
) -> FilterWidget {
    let mut with_all = Vec::with_capacity(options.len() + 1);
    with_all.push(ALL.to_string());
    with_all.extend(options);

    FilterWidget {
        kind,
        label: label.to_string(),
        options: with_all,
        selected: selected.unwrap_or(ALL).to_string(),
    }
}
