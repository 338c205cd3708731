//! Distance & Behavior: identification method against distance bucket.

use crate::analysis::CrossTab;
use crate::data::Snapshot;
use crate::error::DashboardError;
use crate::models::{ChartData, ChartKind, ChartSpec, ViewOutput};
use crate::views::{chart_or_notice, View};
use tracing::debug;

const NO_DATA: &str = "No data available for heatmap visualization.";

pub(super) fn render(snapshot: &Snapshot) -> Result<ViewOutput, DashboardError> {
    let table = CrossTab::build(
        snapshot.records(),
        |o| o.id_method.as_deref(),
        |o| o.distance.as_deref(),
    );
    debug!(
        "{} ID method and distance pairs across {}x{} cells",
        table.total(),
        table.rows.len(),
        table.columns.len()
    );

    Ok(ViewOutput {
        view: View::DistanceBehavior,
        title: "Heatmap: ID Method × Distance".to_string(),
        filters: Vec::new(),
        panels: vec![chart_or_notice(heatmap(table))?],
    })
}

fn heatmap(table: CrossTab) -> Result<ChartSpec, DashboardError> {
    if table.is_empty() {
        return Err(DashboardError::EmptyResult(NO_DATA.to_string()));
    }

    Ok(ChartSpec::new(
        ChartKind::Heatmap,
        "Observation Count by ID Method and Distance",
        ChartData::Matrix {
            rows: table.rows,
            columns: table.columns,
            cells: table.cells,
        },
    )
    .with_axes("Distance", "ID Method")
    .with_color_scale("YlGnBu")
    .annotated())
}
