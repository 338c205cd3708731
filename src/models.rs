//! Data models for the dashboard.
//!
//! This module contains the typed observation record read from the
//! database and the chart and table descriptions the views produce.

use crate::views::View;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

/// One row of the `observations` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Observation {
    /// Administrative unit the plot belongs to.
    pub admin_unit_code: Option<String>,
    /// Habitat of the plot (e.g. Forest, Grassland).
    pub location_type: Option<String>,
    /// Named observation site.
    pub plot_name: Option<String>,
    /// Species name.
    pub scientific_name: Option<String>,
    pub sex: Option<String>,
    /// How the species was identified (e.g. Singing, Calling, Visualization).
    pub id_method: Option<String>,
    pub date: Option<NaiveDate>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub sky: Option<String>,
    pub wind: Option<String>,
    /// Distance bucket between observer and bird.
    pub distance: Option<String>,
}

/// How bars of different series share a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarMode {
    /// Series stacked on top of each other.
    Stack,
    /// Series side by side.
    Group,
}

/// The kind of chart to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartKind {
    Bar { mode: BarMode },
    Line,
    Scatter,
    Pie,
    Heatmap,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Bar { mode: BarMode::Stack } => write!(f, "Stacked bar chart"),
            ChartKind::Bar { mode: BarMode::Group } => write!(f, "Bar chart"),
            ChartKind::Line => write!(f, "Line chart"),
            ChartKind::Scatter => write!(f, "Scatter plot"),
            ChartKind::Pie => write!(f, "Pie chart"),
            ChartKind::Heatmap => write!(f, "Heatmap"),
        }
    }
}

/// A named series of values aligned with the chart's categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<u64>,
}

/// One point of a time-ordered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub value: u64,
}

/// One point of a scatter plot, colored by `color` on the chart's scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: u64,
    pub color: u64,
}

/// One slice of a pie chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: u64,
}

/// The data behind a chart, shaped per chart kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ChartData {
    Categories {
        categories: Vec<String>,
        series: Vec<Series>,
    },
    TimeSeries {
        points: Vec<TimePoint>,
    },
    Scatter {
        points: Vec<ScatterPoint>,
    },
    Slices {
        slices: Vec<Slice>,
    },
    /// Row-major count matrix; absent combinations are zero.
    Matrix {
        rows: Vec<String>,
        columns: Vec<String>,
        cells: Vec<Vec<u64>>,
    },
}

impl ChartData {
    /// Returns true if the chart has nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Categories { categories, .. } => categories.is_empty(),
            ChartData::TimeSeries { points } => points.is_empty(),
            ChartData::Scatter { points } => points.is_empty(),
            ChartData::Slices { slices } => slices.is_empty(),
            ChartData::Matrix { rows, columns, .. } => rows.is_empty() || columns.is_empty(),
        }
    }
}

/// A complete chart description handed to the display surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    /// Rotation of the category labels, in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_tick_angle: Option<i32>,
    /// Named continuous color scale (e.g. "Viridis").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_scale: Option<String>,
    /// Draw the value inside each cell/bar.
    pub annotate: bool,
    pub data: ChartData,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: impl Into<String>, data: ChartData) -> Self {
        Self {
            title: title.into(),
            kind,
            x_label: None,
            y_label: None,
            x_tick_angle: None,
            color_scale: None,
            annotate: false,
            data,
        }
    }

    pub fn with_axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = Some(x_label.into());
        self.y_label = Some(y_label.into());
        self
    }

    pub fn with_tick_angle(mut self, degrees: i32) -> Self {
        self.x_tick_angle = Some(degrees);
        self
    }

    pub fn with_color_scale(mut self, scale: impl Into<String>) -> Self {
        self.color_scale = Some(scale.into());
        self
    }

    pub fn annotated(mut self) -> Self {
        self.annotate = true;
        self
    }
}

/// A formatted table of already-stringified cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSpec {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
}

/// A message shown in place of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// What a panel displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "spec", rename_all = "lowercase")]
pub enum PanelContent {
    Chart(ChartSpec),
    Table(TableSpec),
    Notice(Notice),
}

/// One block of a view, optionally introduced by a subheading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subheading: Option<String>,
    pub content: PanelContent,
}

impl Panel {
    pub fn chart(chart: ChartSpec) -> Self {
        Self {
            subheading: None,
            content: PanelContent::Chart(chart),
        }
    }

    pub fn table(table: TableSpec) -> Self {
        Self {
            subheading: None,
            content: PanelContent::Table(table),
        }
    }

    pub fn notice(notice: Notice) -> Self {
        Self {
            subheading: None,
            content: PanelContent::Notice(notice),
        }
    }

    pub fn titled(mut self, subheading: impl Into<String>) -> Self {
        self.subheading = Some(subheading.into());
        self
    }

    /// Returns the chart of this panel, if it holds one.
    pub fn as_chart(&self) -> Option<&ChartSpec> {
        match &self.content {
            PanelContent::Chart(chart) => Some(chart),
            _ => None,
        }
    }
}

/// Identifies which selection a filter widget controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    AdminUnit,
    Species,
}

impl FilterKind {
    /// The command-line flag that sets this filter.
    pub fn flag(&self) -> &'static str {
        match self {
            FilterKind::AdminUnit => "admin-unit",
            FilterKind::Species => "species",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::AdminUnit => write!(f, "admin unit"),
            FilterKind::Species => write!(f, "species"),
        }
    }
}

/// A drop-down offered by a view, with the value it rendered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterWidget {
    pub kind: FilterKind,
    pub label: String,
    pub options: Vec<String>,
    pub selected: String,
}

/// Everything one view renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewOutput {
    pub view: View,
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterWidget>,
    pub panels: Vec<Panel>,
}

impl ViewOutput {
    /// Iterate over the charts of this view, skipping tables and notices.
    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        self.panels.iter().filter_map(Panel::as_chart)
    }
}

/// Metadata about a full dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Database the snapshot was read from.
    pub database: String,
    /// When the snapshot was loaded.
    pub loaded_at: DateTime<Utc>,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    pub observations: usize,
    pub species: usize,
    pub admin_units: usize,
    pub duration_seconds: f64,
}

/// Every view rendered against one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub views: Vec<ViewOutput>,
}
