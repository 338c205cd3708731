//! The seven dashboard views and the router that dispatches to them.
//!
//! Every view is a pure function of the snapshot and the user's filter
//! selections. Rendering never touches the database.

mod conservation;
mod distance;
mod environment;
mod spatial;
mod species;
mod species_distribution;
mod temporal;

use crate::data::Snapshot;
use crate::error::DashboardError;
use crate::models::{ChartSpec, FilterKind, Notice, Panel, ViewOutput};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Option shown first in optional filters; selecting it disables the filter.
pub const ALL: &str = "All";

/// Default length of "top N" and "least N" lists.
pub const DEFAULT_TOP_N: usize = 10;

/// A sidebar entry. Variants are declared in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum View {
    #[serde(rename = "Species Distribution")]
    SpeciesDistribution,
    #[serde(rename = "Temporal Analysis")]
    TemporalAnalysis,
    #[serde(rename = "Spatial Analysis")]
    SpatialAnalysis,
    #[serde(rename = "Species Analysis")]
    SpeciesAnalysis,
    #[serde(rename = "Environmental Conditions")]
    EnvironmentalConditions,
    #[serde(rename = "Distance & Behavior")]
    DistanceBehavior,
    #[serde(rename = "Conservation Insights")]
    ConservationInsights,
}

impl View {
    /// All views in sidebar order.
    pub const ALL: [View; 7] = [
        View::SpeciesDistribution,
        View::TemporalAnalysis,
        View::SpatialAnalysis,
        View::SpeciesAnalysis,
        View::EnvironmentalConditions,
        View::DistanceBehavior,
        View::ConservationInsights,
    ];

    /// The sidebar label.
    pub fn label(&self) -> &'static str {
        match self {
            View::SpeciesDistribution => "Species Distribution",
            View::TemporalAnalysis => "Temporal Analysis",
            View::SpatialAnalysis => "Spatial Analysis",
            View::SpeciesAnalysis => "Species Analysis",
            View::EnvironmentalConditions => "Environmental Conditions",
            View::DistanceBehavior => "Distance & Behavior",
            View::ConservationInsights => "Conservation Insights",
        }
    }

    /// Short kebab-case name for the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            View::SpeciesDistribution => "species-distribution",
            View::TemporalAnalysis => "temporal",
            View::SpatialAnalysis => "spatial",
            View::SpeciesAnalysis => "species",
            View::EnvironmentalConditions => "environment",
            View::DistanceBehavior => "distance",
            View::ConservationInsights => "conservation",
        }
    }

    /// 1-based position in the sidebar.
    pub fn number(&self) -> usize {
        View::ALL.iter().position(|v| v == self).map_or(0, |i| i + 1)
    }

    /// Filters this view offers.
    pub fn filter_kinds(&self) -> &'static [FilterKind] {
        match self {
            View::TemporalAnalysis => &[FilterKind::AdminUnit, FilterKind::Species],
            View::EnvironmentalConditions => &[FilterKind::AdminUnit],
            _ => &[],
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for View {
    type Err = DashboardError;

    /// Accepts the label (any case), the slug, or the menu number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();

        if let Ok(n) = needle.parse::<usize>() {
            return n
                .checked_sub(1)
                .and_then(|i| View::ALL.get(i).copied())
                .ok_or_else(|| DashboardError::UnknownView(s.to_string()));
        }

        View::ALL
            .iter()
            .copied()
            .find(|v| v.label().eq_ignore_ascii_case(needle) || v.slug().eq_ignore_ascii_case(needle))
            .ok_or_else(|| DashboardError::UnknownView(s.to_string()))
    }
}

/// User selections for the filter widgets. `None` means the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub admin_unit: Option<String>,
    pub species: Option<String>,
}

impl Filters {
    /// Selections that `view` has no widget for and will ignore.
    pub fn unused_by(&self, view: View) -> Vec<FilterKind> {
        let offered = view.filter_kinds();
        let mut unused = Vec::new();

        if self.admin_unit.is_some() && !offered.contains(&FilterKind::AdminUnit) {
            unused.push(FilterKind::AdminUnit);
        }
        if self.species.is_some() && !offered.contains(&FilterKind::Species) {
            unused.push(FilterKind::Species);
        }

        unused
    }
}

#[cfg(test)]
impl Filters {
    pub fn admin_unit(mut self, unit: impl Into<String>) -> Self {
        self.admin_unit = Some(unit.into());
        self
    }

    pub fn species(mut self, name: impl Into<String>) -> Self {
        self.species = Some(name.into());
        self
    }
}

/// Tunables that are not user selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSettings {
    /// Length of "top N" and "least N" lists.
    pub top_n: usize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Render one view with default settings.
pub fn render(view: View, filters: &Filters, snapshot: &Snapshot) -> Result<ViewOutput, DashboardError> {
    render_with(view, filters, snapshot, &ViewSettings::default())
}

/// Render one view.
pub fn render_with(
    view: View,
    filters: &Filters,
    snapshot: &Snapshot,
    settings: &ViewSettings,
) -> Result<ViewOutput, DashboardError> {
    debug!("Rendering '{}' over {} observations", view, snapshot.len());

    match view {
        View::SpeciesDistribution => Ok(species_distribution::render(snapshot)),
        View::TemporalAnalysis => temporal::render(snapshot, filters),
        View::SpatialAnalysis => Ok(spatial::render(snapshot, settings)),
        View::SpeciesAnalysis => Ok(species::render(snapshot, settings)),
        View::EnvironmentalConditions => environment::render(snapshot, filters),
        View::DistanceBehavior => distance::render(snapshot),
        View::ConservationInsights => Ok(conservation::render(snapshot, settings)),
    }
}

/// Resolve an optional "All"-able selection against its options.
///
/// Returns `None` when the filter is off.
fn optional_selection<'a>(
    kind: FilterKind,
    selected: Option<&'a str>,
    options: &[String],
) -> Result<Option<&'a str>, DashboardError> {
    match selected {
        None => Ok(None),
        Some(value) if value == ALL => Ok(None),
        Some(value) if options.iter().any(|o| o == value) => Ok(Some(value)),
        Some(value) => Err(DashboardError::InvalidFilter {
            filter: kind.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Show a chart, or a warning in its place when it had nothing to aggregate.
fn chart_or_notice(chart: Result<ChartSpec, DashboardError>) -> Result<Panel, DashboardError> {
    match chart {
        Ok(chart) => Ok(Panel::chart(chart)),
        Err(DashboardError::EmptyResult(message)) => Ok(Panel::notice(Notice::warning(message))),
        Err(e) => Err(e),
    }
}

/// Format a count with thousands separators.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{obs, snapshot};

    #[test]
    fn test_menu_order_and_labels() {
        let labels: Vec<&str> = View::ALL.iter().map(|v| v.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Species Distribution",
                "Temporal Analysis",
                "Spatial Analysis",
                "Species Analysis",
                "Environmental Conditions",
                "Distance & Behavior",
                "Conservation Insights",
            ]
        );
        assert_eq!(View::SpeciesDistribution.number(), 1);
        assert_eq!(View::ConservationInsights.number(), 7);
    }

    #[test]
    fn test_parse_view() {
        assert_eq!("Distance & Behavior".parse::<View>().unwrap(), View::DistanceBehavior);
        assert_eq!("temporal analysis".parse::<View>().unwrap(), View::TemporalAnalysis);
        assert_eq!("spatial".parse::<View>().unwrap(), View::SpatialAnalysis);
        assert_eq!("5".parse::<View>().unwrap(), View::EnvironmentalConditions);
        assert!("0".parse::<View>().is_err());
        assert!("8".parse::<View>().is_err());
        assert!(matches!(
            "Migration".parse::<View>(),
            Err(DashboardError::UnknownView(_))
        ));
    }

    #[test]
    fn test_view_serializes_as_label() {
        let json = serde_json::to_string(&View::DistanceBehavior).unwrap();
        assert_eq!(json, "\"Distance & Behavior\"");
    }

    #[test]
    fn test_render_dispatches_to_requested_view() {
        let snap = snapshot(vec![
            obs("ANTI", "Forest", "ANTI-0001", "Turdus merula"),
            obs("CATO", "Grassland", "CATO-0002", "Corvus corax"),
        ]);

        for view in View::ALL {
            let output = render(view, &Filters::default(), &snap).unwrap();
            assert_eq!(output.view, view);
            assert!(!output.panels.is_empty());
            let offered: Vec<FilterKind> = output.filters.iter().map(|f| f.kind).collect();
            assert_eq!(offered, view.filter_kinds());
        }
    }

    #[test]
    fn test_optional_selection() {
        let options = vec!["ANTI".to_string(), "CATO".to_string()];
        assert_eq!(optional_selection(FilterKind::AdminUnit, None, &options).unwrap(), None);
        assert_eq!(optional_selection(FilterKind::AdminUnit, Some("All"), &options).unwrap(), None);
        assert_eq!(
            optional_selection(FilterKind::AdminUnit, Some("CATO"), &options).unwrap(),
            Some("CATO")
        );
        assert!(optional_selection(FilterKind::AdminUnit, Some("MONO"), &options).is_err());
    }

    #[test]
    fn test_unused_filters() {
        let filters = Filters::default().admin_unit("ANTI").species("Corvus corax");
        assert!(filters.unused_by(View::TemporalAnalysis).is_empty());
        assert_eq!(
            filters.unused_by(View::EnvironmentalConditions),
            vec![FilterKind::Species]
        );
        assert_eq!(
            filters.unused_by(View::SpatialAnalysis),
            vec![FilterKind::AdminUnit, FilterKind::Species]
        );
        assert!(Filters::default().unused_by(View::SpatialAnalysis).is_empty());
    }

    #[test]
    fn test_chart_or_notice() {
        use crate::models::{ChartData, ChartKind, NoticeLevel, PanelContent};

        let chart = ChartSpec::new(ChartKind::Line, "Counts", ChartData::TimeSeries { points: vec![] });
        assert!(chart_or_notice(Ok(chart)).unwrap().as_chart().is_some());

        let panel = chart_or_notice(Err(DashboardError::EmptyResult("Nothing here.".to_string()))).unwrap();
        match panel.content {
            PanelContent::Notice(notice) => {
                assert_eq!(notice.level, NoticeLevel::Warning);
                assert_eq!(notice.message, "Nothing here.");
            }
            other => panic!("expected notice, got {:?}", other),
        }

        let err = chart_or_notice(Err(DashboardError::UnknownView("9".to_string()))).unwrap_err();
        assert!(matches!(err, DashboardError::UnknownView(_)));
    }

    #[test]
    fn test_every_view_renders_with_all_admin_unit() {
        let snap = snapshot(vec![
            obs("ANTI", "Forest", "ANTI-0001", "Turdus merula"),
            obs("CATO", "Grassland", "CATO-0002", "Corvus corax"),
        ]);
        let filters = Filters::default().admin_unit(ALL);

        for view in View::ALL {
            assert!(render(view, &filters, &snap).is_ok(), "{} rejected All", view);
        }
    }

    #[test]
    fn test_every_view_renders_from_empty_snapshot() {
        let snap = snapshot(Vec::new());

        for view in View::ALL {
            let output = render(view, &Filters::default(), &snap).unwrap();
            assert!(!output.panels.is_empty(), "{} has no panels", view);
        }
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }
}
