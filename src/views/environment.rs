//! Environmental Conditions: weather against observation counts within
//! one admin unit, and sky against wind over all observations.

use crate::analysis::{mean, sort_by_key, CrossTab};
use crate::data::Snapshot;
use crate::error::DashboardError;
use crate::models::{
    ChartData, ChartKind, ChartSpec, FilterKind, FilterWidget, Observation, Panel, ScatterPoint,
    ViewOutput,
};
use crate::views::{chart_or_notice, Filters, View, ALL};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

/// Per-day aggregate within the selected admin unit.
#[derive(Debug, Clone, PartialEq)]
struct DailyConditions {
    date: NaiveDate,
    observations: u64,
    avg_temperature: Option<f64>,
    avg_humidity: Option<f64>,
}

const NO_ADMIN_UNITS: &str = "No admin units available for weather analysis.";

pub(super) fn render(snapshot: &Snapshot, filters: &Filters) -> Result<ViewOutput, DashboardError> {
    let options = snapshot.admin_units();
    let selected = select_admin_unit(filters.admin_unit.as_deref(), &options)?;

    let (temperature, humidity) = match selected.as_deref() {
        Some(unit) => {
            let in_unit: Vec<&Observation> = snapshot
                .records()
                .iter()
                .filter(|o| o.admin_unit_code.as_deref() == Some(unit))
                .collect();

            let daily = daily_conditions(&in_unit);
            debug!("{} observation days in {}", daily.len(), unit);

            (
                Ok(temperature_chart(unit, &daily)),
                Ok(humidity_chart(unit, &daily)),
            )
        }
        None => (Err(no_admin_units()), Err(no_admin_units())),
    };

    let sky_wind = CrossTab::build(snapshot.records(), |o| o.sky.as_deref(), |o| o.wind.as_deref());
    let heatmap = ChartSpec::new(
        ChartKind::Heatmap,
        "Observation Count by Sky and Wind Conditions",
        ChartData::Matrix {
            rows: sky_wind.rows,
            columns: sky_wind.columns,
            cells: sky_wind.cells,
        },
    )
    .with_axes("Wind", "Sky")
    .with_color_scale("YlGnBu")
    .annotated();

    // Without admin units there is nothing to select from.
    let widgets = selected
        .map(|selected| FilterWidget {
            kind: FilterKind::AdminUnit,
            label: "Select Admin Unit:".to_string(),
            options,
            selected,
        })
        .into_iter()
        .collect();

    Ok(ViewOutput {
        view: View::EnvironmentalConditions,
        title: "Environmental Impact within Admin Unit".to_string(),
        filters: widgets,
        panels: vec![
            chart_or_notice(temperature)?.titled("Temperature vs Observation Count"),
            chart_or_notice(humidity)?.titled("Humidity vs Observation Count"),
            Panel::chart(heatmap).titled("Sky vs Wind Heatmap"),
        ],
    })
}

/// Resolve the admin unit selection. No selection or "All" means the
/// first unit; `None` only when there are no units at all.
fn select_admin_unit(
    selected: Option<&str>,
    options: &[String],
) -> Result<Option<String>, DashboardError> {
    match selected {
        None | Some(ALL) => Ok(options.first().cloned()),
        Some(unit) if options.iter().any(|o| o == unit) => Ok(Some(unit.to_string())),
        Some(unit) => Err(DashboardError::InvalidFilter {
            filter: FilterKind::AdminUnit.to_string(),
            value: unit.to_string(),
        }),
    }
}

fn no_admin_units() -> DashboardError {
    DashboardError::EmptyResult(NO_ADMIN_UNITS.to_string())
}

fn temperature_chart(unit: &str, daily: &[DailyConditions]) -> ChartSpec {
    ChartSpec::new(
        ChartKind::Scatter,
        format!("Effect of Temperature on Bird Observations in {}", unit),
        scatter(daily, |d| d.avg_temperature),
    )
    .with_axes("Average Temperature (°C)", "Observation Count")
    .with_color_scale("Viridis")
}

fn humidity_chart(unit: &str, daily: &[DailyConditions]) -> ChartSpec {
    ChartSpec::new(
        ChartKind::Scatter,
        format!("Effect of Humidity on Bird Observations in {}", unit),
        scatter(daily, |d| d.avg_humidity),
    )
    .with_axes("Average Humidity (%)", "Observation Count")
    .with_color_scale("Blues")
}

/// Group by date: species-bearing row count and mean weather readings.
fn daily_conditions(rows: &[&Observation]) -> Vec<DailyConditions> {
    let mut by_date: HashMap<NaiveDate, Vec<&Observation>> = HashMap::new();
    for &o in rows {
        if let Some(date) = o.date {
            by_date.entry(date).or_default().push(o);
        }
    }

    let days: Vec<(NaiveDate, Vec<&Observation>)> = sort_by_key(by_date.into_iter().collect());

    days.into_iter()
        .map(|(date, group)| DailyConditions {
            date,
            observations: group.iter().filter(|o| o.scientific_name.is_some()).count() as u64,
            avg_temperature: mean(group.iter().filter_map(|o| o.temperature)),
            avg_humidity: mean(group.iter().filter_map(|o| o.humidity)),
        })
        .collect()
}

fn scatter<F>(daily: &[DailyConditions], x: F) -> ChartData
where
    F: Fn(&DailyConditions) -> Option<f64>,
{
    let points = daily
        .iter()
        .filter_map(|d| {
            Some(ScatterPoint {
                x: x(d)?,
                y: d.observations,
                color: d.observations,
            })
        })
        .collect();

    ChartData::Scatter { points }
}
