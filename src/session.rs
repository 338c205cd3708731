//! Interactive sidebar session.
//!
//! Reads one command per line, re-renders the selected view after every
//! selection or filter change, and re-reads the database only when asked
//! to with `reload`.

use crate::cli::OutputFormat;
use crate::data::SnapshotStore;
use crate::error::DashboardError;
use crate::models::{FilterKind, ViewOutput};
use crate::report;
use crate::views::{render_with, Filters, View, ViewSettings, ALL};
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use tracing::{debug, info};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Switch view and/or change filters, then re-render.
    Select {
        view: Option<View>,
        admin_unit: Option<String>,
        species: Option<String>,
    },
    Menu,
    Options,
    Reload,
    Help,
    Quit,
}

impl Command {
    /// Parse an input line. Returns `Ok(None)` for a blank line.
    ///
    /// Filter values run until the next `key=` token, so species names
    /// with spaces need no quoting: `2 species=Vireo olivaceus admin=ANTI`.
    pub fn parse(line: &str) -> Result<Option<Command>, DashboardError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        match line.to_ascii_lowercase().as_str() {
            "q" | "quit" | "exit" => return Ok(Some(Command::Quit)),
            "h" | "?" | "help" => return Ok(Some(Command::Help)),
            "m" | "menu" | "views" => return Ok(Some(Command::Menu)),
            "o" | "options" => return Ok(Some(Command::Options)),
            "r" | "reload" => return Ok(Some(Command::Reload)),
            _ => {}
        }

        let mut view_words: Vec<&str> = Vec::new();
        let mut admin_unit: Option<String> = None;
        let mut species: Option<String> = None;
        let mut current: Option<FilterKind> = None;

        for token in line.split_whitespace() {
            if let Some((key, value)) = token.split_once('=') {
                let kind = match key.to_ascii_lowercase().as_str() {
                    "admin" | "admin_unit" | "admin-unit" => FilterKind::AdminUnit,
                    "species" => FilterKind::Species,
                    _ => {
                        return Err(DashboardError::InvalidFilter {
                            filter: key.to_string(),
                            value: value.to_string(),
                        })
                    }
                };
                let slot = match kind {
                    FilterKind::AdminUnit => &mut admin_unit,
                    FilterKind::Species => &mut species,
                };
                *slot = Some(value.to_string());
                current = Some(kind);
                continue;
            }

            let slot = match current {
                Some(FilterKind::AdminUnit) => admin_unit.as_mut(),
                Some(FilterKind::Species) => species.as_mut(),
                None => None,
            };
            match slot {
                Some(value) => {
                    value.push(' ');
                    value.push_str(token);
                }
                None => view_words.push(token),
            }
        }

        let view = if view_words.is_empty() {
            None
        } else {
            Some(view_words.join(" ").parse::<View>()?)
        };

        Ok(Some(Command::Select {
            view,
            admin_unit,
            species,
        }))
    }
}

/// State of one interactive session.
pub struct Session<'a> {
    store: &'a mut SnapshotStore,
    view: View,
    filters: Filters,
    settings: ViewSettings,
    format: OutputFormat,
}

impl<'a> Session<'a> {
    pub fn new(store: &'a mut SnapshotStore, settings: ViewSettings, format: OutputFormat) -> Self {
        Self {
            store,
            view: View::SpeciesDistribution,
            filters: Filters::default(),
            settings,
            format,
        }
    }

    /// Start with filter selections given on the command line.
    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    #[cfg(test)]
    pub fn view(&self) -> View {
        self.view
    }

    #[cfg(test)]
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Run until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        self.write_menu(out)?;
        self.write_current(out)?;
        self.prompt(out)?;

        for line in input.lines() {
            let line = line.context("Failed to read session input")?;

            match Command::parse(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => self.handle(command, out)?,
                Ok(None) => {}
                Err(e) => writeln!(out, "Error: {}", e)?,
            }

            self.prompt(out)?;
        }

        writeln!(out)?;
        Ok(())
    }

    fn handle<W: Write>(&mut self, command: Command, out: &mut W) -> Result<()> {
        debug!("Session command: {:?}", command);

        match command {
            Command::Select {
                view,
                admin_unit,
                species,
            } => self.select(view, admin_unit, species, out),
            Command::Menu => self.write_menu(out),
            Command::Options => self.write_options(out),
            Command::Reload => self.reload(out),
            Command::Help => write_help(out),
            Command::Quit => Ok(()),
        }
    }

    /// Apply a selection. A selection that fails to render is not kept.
    fn select<W: Write>(
        &mut self,
        view: Option<View>,
        admin_unit: Option<String>,
        species: Option<String>,
        out: &mut W,
    ) -> Result<()> {
        let view = view.unwrap_or(self.view);
        let mut filters = self.filters.clone();
        if let Some(unit) = admin_unit {
            filters.admin_unit = clear_if_all(unit);
        }
        if let Some(name) = species {
            filters.species = clear_if_all(name);
        }

        let snapshot = self.store.current();
        match render_with(view, &filters, &snapshot, &self.settings) {
            Ok(output) => {
                self.view = view;
                self.filters = filters;
                self.write_output(&output, out)
            }
            Err(e) => {
                writeln!(out, "Error: {}", e)?;
                Ok(())
            }
        }
    }

    fn reload<W: Write>(&mut self, out: &mut W) -> Result<()> {
        match self.store.reload() {
            Ok(snapshot) => {
                writeln!(
                    out,
                    "Reloaded {} observations from {}",
                    snapshot.len(),
                    self.store.path().display()
                )?;
                self.write_current(out)
            }
            Err(e) => {
                writeln!(out, "Reload failed, keeping previous data: {}", e)?;
                Ok(())
            }
        }
    }

    /// Render the current view. A selection that no longer matches the
    /// data after a reload is cleared on its own; the others are kept.
    fn write_current<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let snapshot = self.store.current();

        let output = loop {
            match render_with(self.view, &self.filters, &snapshot, &self.settings) {
                Ok(output) => break output,
                Err(DashboardError::InvalidFilter { filter, value }) => {
                    let Some(kind) = self.clear_selection(&filter) else {
                        writeln!(out, "Error: invalid {} selection '{}'", filter, value)?;
                        return Ok(());
                    };
                    info!("Dropping {} selection '{}'", kind, value);
                    writeln!(
                        out,
                        "The {} selection '{}' is no longer available; showing {}.",
                        kind,
                        value,
                        fallback_label(self.view, kind)
                    )?;
                }
                Err(e) => {
                    writeln!(out, "Error: {}", e)?;
                    return Ok(());
                }
            }
        };

        self.write_output(&output, out)
    }

    /// Clear the selection named by an `InvalidFilter` error. Returns the
    /// filter that was cleared, or `None` if it was not set.
    fn clear_selection(&mut self, filter: &str) -> Option<FilterKind> {
        let kind = [FilterKind::AdminUnit, FilterKind::Species]
            .into_iter()
            .find(|k| k.to_string() == filter)?;
        let slot = match kind {
            FilterKind::AdminUnit => &mut self.filters.admin_unit,
            FilterKind::Species => &mut self.filters.species,
        };
        slot.take().map(|_| kind)
    }

    fn write_output<W: Write>(&self, output: &ViewOutput, out: &mut W) -> Result<()> {
        let rendered = match self.format {
            OutputFormat::Markdown => report::generate_markdown_view(output),
            OutputFormat::Json => report::generate_json_view(output)?,
        };
        writeln!(out, "{}", rendered)?;
        Ok(())
    }

    fn write_menu<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "Bird Observation Analysis")?;
        writeln!(out, "Select a view:")?;
        for view in View::ALL {
            let marker = if view == self.view { '>' } else { ' ' };
            writeln!(out, "{} {}. {}", marker, view.number(), view.label())?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn write_options<W: Write>(&self, out: &mut W) -> Result<()> {
        let snapshot = self.store.current();
        writeln!(out, "Admin units: {}", snapshot.admin_units().join(", "))?;
        writeln!(out, "Species: {}", snapshot.species().join(", "))?;
        Ok(())
    }

    fn prompt<W: Write>(&self, out: &mut W) -> Result<()> {
        write!(out, "[{}] > ", self.view.label())?;
        out.flush()?;
        Ok(())
    }
}

/// What a view shows once a selection is cleared.
fn fallback_label(view: View, kind: FilterKind) -> &'static str {
    match (view, kind) {
        (View::EnvironmentalConditions, FilterKind::AdminUnit) => "the first admin unit",
        _ => ALL,
    }
}

fn clear_if_all(value: String) -> Option<String> {
    if value == ALL {
        None
    } else {
        Some(value)
    }
}

fn write_help<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  <view>                     show a view by number, name or slug")?;
    writeln!(out, "  [view] admin=X species=Y   change filters (use All to clear)")?;
    writeln!(out, "  menu                       list the views")?;
    writeln!(out, "  options                    list admin units and species")?;
    writeln!(out, "  reload                     re-read the database")?;
    writeln!(out, "  quit                       leave the session")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{obs, snapshot, write_database};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn run_session(store: &mut SnapshotStore, input: &str) -> (String, View, Filters) {
        let mut session = Session::new(store, ViewSettings::default(), OutputFormat::Markdown);
        let mut out = Vec::new();
        session.run(Cursor::new(input.to_string()), &mut out).unwrap();
        let view = session.view();
        let filters = session.filters().clone();
        (String::from_utf8(out).unwrap(), view, filters)
    }

    fn sample_store() -> SnapshotStore {
        SnapshotStore::with_snapshot(snapshot(vec![
            obs("ANTI", "Forest", "ANTI-0001", "Vireo olivaceus"),
            obs("CATO", "Grassland", "CATO-0001", "Corvus corax"),
        ]))
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  ").unwrap(), None);
        assert_eq!(Command::parse("quit").unwrap(), Some(Command::Quit));
        assert_eq!(Command::parse("Reload").unwrap(), Some(Command::Reload));
        assert_eq!(
            Command::parse("3").unwrap(),
            Some(Command::Select {
                view: Some(View::SpatialAnalysis),
                admin_unit: None,
                species: None,
            })
        );
    }

    #[test]
    fn test_parse_multi_word_view_and_filters() {
        let command = Command::parse("Temporal Analysis admin=ANTI species=Vireo olivaceus").unwrap();
        assert_eq!(
            command,
            Some(Command::Select {
                view: Some(View::TemporalAnalysis),
                admin_unit: Some("ANTI".to_string()),
                species: Some("Vireo olivaceus".to_string()),
            })
        );

        let command = Command::parse("species=Corvus corax").unwrap();
        assert_eq!(
            command,
            Some(Command::Select {
                view: None,
                admin_unit: None,
                species: Some("Corvus corax".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_rejects_unknown_input() {
        assert!(matches!(Command::parse("9"), Err(DashboardError::UnknownView(_))));
        assert!(matches!(
            Command::parse("2 month=May"),
            Err(DashboardError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn test_menu_lists_views_in_order() {
        let mut store = sample_store();
        let (out, view, _) = run_session(&mut store, "quit\n");

        assert_eq!(view, View::SpeciesDistribution);
        let first = out.find("1. Species Distribution").unwrap();
        let last = out.find("7. Conservation Insights").unwrap();
        assert!(first < last);
        assert!(out.contains("> 1. Species Distribution"));
    }

    #[test]
    fn test_selection_updates_view_and_filters() {
        let mut store = sample_store();
        let (out, view, filters) = run_session(&mut store, "2 admin=ANTI\nspecies=Vireo olivaceus\n");

        assert_eq!(view, View::TemporalAnalysis);
        assert_eq!(filters, Filters::default().admin_unit("ANTI").species("Vireo olivaceus"));
        assert!(out.contains("[Temporal Analysis] > "));
    }

    #[test]
    fn test_invalid_filter_is_not_kept() {
        let mut store = sample_store();
        let (out, view, filters) = run_session(&mut store, "2 admin=ANTI\nadmin=MONO\n");

        assert!(out.contains("invalid admin unit selection 'MONO'"));
        assert_eq!(view, View::TemporalAnalysis);
        assert_eq!(filters.admin_unit.as_deref(), Some("ANTI"));
    }

    #[test]
    fn test_all_clears_filter() {
        let mut store = sample_store();
        let (_, _, filters) = run_session(&mut store, "2 admin=ANTI\nadmin=All\n");
        assert_eq!(filters.admin_unit, None);
    }

    #[test]
    fn test_reload_failure_keeps_snapshot() {
        let mut store = sample_store();
        let before = store.current();

        let (out, _, _) = run_session(&mut store, "reload\n");

        assert!(out.contains("Reload failed, keeping previous data"));
        assert_eq!(store.current().len(), before.len());
    }

    #[test]
    fn test_reload_reads_new_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("birds.db");
        write_database(&path, &[obs("ANTI", "Forest", "ANTI-0001", "Vireo olivaceus")]);

        let mut store = SnapshotStore::open(&path).unwrap();
        assert_eq!(store.current().len(), 1);

        write_database(
            &path,
            &[
                obs("ANTI", "Forest", "ANTI-0001", "Vireo olivaceus"),
                obs("CATO", "Forest", "CATO-0001", "Corvus corax"),
            ],
        );

        let (out, _, _) = run_session(&mut store, "1\nreload\n");
        assert!(out.contains("Reloaded 2 observations"));
        assert_eq!(store.current().len(), 2);
    }

    #[test]
    fn test_reload_clears_only_the_stale_selection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("birds.db");
        write_database(
            &path,
            &[
                obs("ANTI", "Forest", "ANTI-0001", "Vireo olivaceus"),
                obs("CATO", "Forest", "CATO-0001", "Vireo olivaceus"),
            ],
        );
        let mut store = SnapshotStore::open(&path).unwrap();

        write_database(&path, &[obs("ANTI", "Forest", "ANTI-0001", "Vireo olivaceus")]);

        let (out, view, filters) =
            run_session(&mut store, "2 admin=CATO species=Vireo olivaceus\nreload\n");

        assert_eq!(view, View::TemporalAnalysis);
        assert!(out.contains("The admin unit selection 'CATO' is no longer available; showing All."));
        assert_eq!(filters.admin_unit, None);
        assert_eq!(filters.species.as_deref(), Some("Vireo olivaceus"));
    }

    #[test]
    fn test_reload_message_names_environment_fallback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("birds.db");
        write_database(
            &path,
            &[
                obs("ANTI", "Forest", "ANTI-0001", "Vireo olivaceus"),
                obs("CATO", "Forest", "CATO-0001", "Vireo olivaceus"),
            ],
        );
        let mut store = SnapshotStore::open(&path).unwrap();

        write_database(&path, &[obs("ANTI", "Forest", "ANTI-0001", "Vireo olivaceus")]);

        let (out, view, filters) = run_session(&mut store, "5 admin=CATO\nreload\n");

        assert_eq!(view, View::EnvironmentalConditions);
        assert!(out.contains(
            "The admin unit selection 'CATO' is no longer available; showing the first admin unit."
        ));
        assert_eq!(filters.admin_unit, None);
    }

    #[test]
    fn test_options_lists_filter_values() {
        let mut store = SnapshotStore::with_snapshot(snapshot(vec![
            obs("CATO", "Forest", "CATO-0001", "Corvus corax"),
            obs("ANTI", "Forest", "ANTI-0001", "Anas platyrhynchos"),
        ]));
        let (out, _, _) = run_session(&mut store, "options\n");

        assert!(out.contains("Admin units: ANTI, CATO"));
        assert!(out.contains("Species: Anas platyrhynchos, Corvus corax"));
    }
}
