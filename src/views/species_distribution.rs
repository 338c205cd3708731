//! Species Distribution: distinct species per admin unit and habitat.

use crate::analysis::{distinct_count_by, sort_by_key};
use crate::data::Snapshot;
use crate::models::{BarMode, ChartData, ChartKind, ChartSpec, Panel, Series, ViewOutput};
use crate::views::View;
use std::collections::{BTreeSet, HashMap};

pub(super) fn render(snapshot: &Snapshot) -> ViewOutput {
    let counts = sort_by_key(distinct_count_by(
        snapshot.records(),
        |o| Some((o.admin_unit_code.as_deref()?, o.location_type.as_deref()?)),
        |o| o.scientific_name.as_deref(),
    ));

    let chart = ChartSpec::new(
        ChartKind::Bar {
            mode: BarMode::Stack,
        },
        "Species Distribution by Habitat Type Across All Admin Units",
        stacked(&counts),
    )
    .with_axes("Admin Unit", "Unique Species Count");

    ViewOutput {
        view: View::SpeciesDistribution,
        title: "Species Distribution by Admin Unit and Habitat Type".to_string(),
        filters: Vec::new(),
        panels: vec![Panel::chart(chart)],
    }
}

/// Pivot ((unit, habitat), count) pairs into one series per habitat.
fn stacked(counts: &[((&str, &str), u64)]) -> ChartData {
    let units: Vec<&str> = counts
        .iter()
        .map(|((unit, _), _)| *unit)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let habitats: BTreeSet<&str> = counts.iter().map(|((_, habitat), _)| *habitat).collect();
    let lookup: HashMap<(&str, &str), u64> = counts.iter().copied().collect();

    let series = habitats
        .into_iter()
        .map(|habitat| Series {
            name: habitat.to_string(),
            values: units
                .iter()
                .map(|unit| lookup.get(&(*unit, habitat)).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    ChartData::Categories {
        categories: units.into_iter().map(str::to_string).collect(),
        series,
    }
}
