//! SQLite loading of observation records.
//!
//! Opens the database read-only, runs the one fixed query and maps every
//! row onto the typed [`Observation`] schema.

use crate::data::snapshot::Snapshot;
use crate::error::DashboardError;
use crate::models::Observation;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row, Statement};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// The only query ever run against the database.
pub const OBSERVATIONS_QUERY: &str = "SELECT * FROM observations";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Column positions of the fields we read, resolved once per query.
struct ColumnMap {
    admin_unit_code: usize,
    location_type: usize,
    plot_name: usize,
    scientific_name: usize,
    sex: usize,
    id_method: usize,
    date: usize,
    temperature: usize,
    humidity: usize,
    sky: usize,
    wind: usize,
    distance: usize,
}

impl ColumnMap {
    fn resolve(stmt: &Statement<'_>) -> Result<Self, String> {
        let index = |name: &str| {
            stmt.column_index(name)
                .map_err(|_| format!("column '{}' is missing from observations", name))
        };

        Ok(Self {
            admin_unit_code: index("Admin_Unit_Code")?,
            location_type: index("Location_Type")?,
            plot_name: index("Plot_Name")?,
            scientific_name: index("Scientific_Name")?,
            sex: index("Sex")?,
            id_method: index("ID_Method")?,
            date: index("Date")?,
            temperature: index("Temperature")?,
            humidity: index("Humidity")?,
            sky: index("Sky")?,
            wind: index("Wind")?,
            distance: index("Distance")?,
        })
    }
}

/// Load every observation from the database at `path`.
pub fn load_observations(path: &Path) -> Result<Snapshot, DashboardError> {
    let start = Instant::now();

    if !path.is_file() {
        return Err(DashboardError::unavailable(path, "database file not found"));
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| DashboardError::unavailable(path, e))?;

    let records = read_observations(&conn).map_err(|reason| DashboardError::unavailable(path, reason))?;

    conn.close()
        .map_err(|(_, e)| DashboardError::unavailable(path, e))?;

    info!(
        "Loaded {} observations from {} in {:.2}s",
        records.len(),
        path.display(),
        start.elapsed().as_secs_f64()
    );

    Ok(Snapshot::new(path.to_path_buf(), records))
}

fn read_observations(conn: &Connection) -> Result<Vec<Observation>, String> {
    let mut stmt = conn
        .prepare(OBSERVATIONS_QUERY)
        .map_err(|e| e.to_string())?;
    let columns = ColumnMap::resolve(&stmt)?;
    debug!("observations has {} columns", stmt.column_count());

    let mut rows = stmt.query([]).map_err(|e| e.to_string())?;
    let mut records = Vec::new();

    while let Some(row) = rows.next().map_err(|e| e.to_string())? {
        let record = map_row(row, &columns)
            .map_err(|e| format!("row {}: {}", records.len() + 1, e))?;
        records.push(record);
    }

    Ok(records)
}

fn map_row(row: &Row<'_>, columns: &ColumnMap) -> Result<Observation, String> {
    let value = |idx: usize| row.get_ref(idx).map_err(|e| e.to_string());

    Ok(Observation {
        admin_unit_code: text_value(value(columns.admin_unit_code)?),
        location_type: text_value(value(columns.location_type)?),
        plot_name: text_value(value(columns.plot_name)?),
        scientific_name: text_value(value(columns.scientific_name)?),
        sex: text_value(value(columns.sex)?),
        id_method: text_value(value(columns.id_method)?),
        date: date_value(value(columns.date)?)?,
        temperature: number_value(value(columns.temperature)?),
        humidity: number_value(value(columns.humidity)?),
        sky: text_value(value(columns.sky)?),
        wind: text_value(value(columns.wind)?),
        distance: text_value(value(columns.distance)?),
    })
}

/// Nominal column: any scalar becomes text, blank text is null.
fn text_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
}

/// Numeric column: integers, reals and numeric text; anything else is null.
fn number_value(value: ValueRef<'_>) -> Option<f64> {
    match value {
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) if f.is_finite() => Some(f),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|f| f.is_finite()),
        _ => None,
    }
}

fn date_value(value: ValueRef<'_>) -> Result<Option<NaiveDate>, String> {
    match text_value(value) {
        None => Ok(None),
        Some(text) => parse_date(&text)
            .map(Some)
            .ok_or_else(|| format!("unrecognized date '{}'", text)),
    }
}

/// Parse a calendar date, dropping any time-of-day component.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{obs, write_database};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2018-05-14"), Some(date(2018, 5, 14)));
        assert_eq!(parse_date("2018-05-14 07:30:00"), Some(date(2018, 5, 14)));
        assert_eq!(parse_date("2018-05-14T07:30:00"), Some(date(2018, 5, 14)));
        assert_eq!(parse_date("05/14/2018"), Some(date(2018, 5, 14)));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_text_and_number_values() {
        assert_eq!(text_value(ValueRef::Text(b"  Forest ")), Some("Forest".to_string()));
        assert_eq!(text_value(ValueRef::Text(b"   ")), None);
        assert_eq!(text_value(ValueRef::Integer(3)), Some("3".to_string()));
        assert_eq!(text_value(ValueRef::Null), None);

        assert_eq!(number_value(ValueRef::Real(19.5)), Some(19.5));
        assert_eq!(number_value(ValueRef::Integer(20)), Some(20.0));
        assert_eq!(number_value(ValueRef::Text(b"21.25")), Some(21.25));
        assert_eq!(number_value(ValueRef::Text(b"n/a")), None);
        assert_eq!(number_value(ValueRef::Null), None);
    }

    #[test]
    fn test_load_round_trips_typed_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("birds.db");

        let mut first = obs("ANTI", "Forest", "ANTI-0036", "Vireo olivaceus");
        first.date = Some(date(2018, 5, 22));
        first.temperature = Some(19.9);
        first.humidity = Some(79.4);
        first.sky = Some("Cloudy/Overcast".to_string());
        first.wind = Some("Calm (< 1 mph) smoke rises vertically".to_string());

        let mut second = obs("CATO", "Grassland", "CATO-0012", "Turdus migratorius");
        second.temperature = None;
        second.sex = None;

        write_database(&path, &[first.clone(), second.clone()]);

        let snapshot = load_observations(&path).unwrap();
        assert_eq!(snapshot.records(), &[first, second]);
        assert_eq!(snapshot.source(), path.as_path());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");

        let err = load_observations(&path).unwrap_err();
        assert!(matches!(err, DashboardError::DataUnavailable { .. }));
        // Opening read-only must never create the file.
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_table_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE other (id INTEGER);")
            .unwrap();

        let err = load_observations(&path).unwrap_err();
        match err {
            DashboardError::DataUnavailable { reason, .. } => {
                assert!(reason.contains("observations"), "reason: {}", reason)
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_column_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE observations (Admin_Unit_Code TEXT, Date TEXT);")
            .unwrap();

        let err = load_observations(&path).unwrap_err();
        assert!(err.to_string().contains("Location_Type"));
    }

    #[test]
    fn test_bad_date_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad_date.db");
        write_database(&path, &[obs("ANTI", "Forest", "ANTI-0036", "Vireo olivaceus")]);
        Connection::open(&path)
            .unwrap()
            .execute("UPDATE observations SET Date = 'not a date'", [])
            .unwrap();

        let err = load_observations(&path).unwrap_err();
        assert!(err.to_string().contains("not a date"));
    }
}
