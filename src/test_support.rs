//! Shared builders for unit tests.

use crate::data::Snapshot;
use crate::models::Observation;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// An observation with the four most-grouped fields set and neutral
/// values elsewhere.
pub fn obs(admin: &str, location: &str, plot: &str, species: &str) -> Observation {
    Observation {
        admin_unit_code: Some(admin.to_string()),
        location_type: Some(location.to_string()),
        plot_name: Some(plot.to_string()),
        scientific_name: Some(species.to_string()),
        sex: Some("Undetermined".to_string()),
        id_method: Some("Singing".to_string()),
        date: NaiveDate::from_ymd_opt(2024, 1, 1),
        temperature: Some(20.0),
        humidity: Some(70.0),
        sky: Some("Clear or Few Clouds".to_string()),
        wind: Some("Calm (< 1 mph) smoke rises vertically".to_string()),
        distance: Some("<= 50 Meters".to_string()),
    }
}

/// A snapshot that did not come from a database file.
pub fn snapshot(records: Vec<Observation>) -> Snapshot {
    Snapshot::new(PathBuf::from(":memory:"), records)
}

/// (Re)create `path` with an `observations` table holding `records`.
pub fn write_database(path: &Path, records: &[Observation]) {
    let mut conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "DROP TABLE IF EXISTS observations;
         CREATE TABLE observations (
             Admin_Unit_Code TEXT,
             Sub_Unit_Code TEXT,
             Location_Type TEXT,
             Plot_Name TEXT,
             Date TEXT,
             Scientific_Name TEXT,
             Sex TEXT,
             ID_Method TEXT,
             Distance TEXT,
             Temperature REAL,
             Humidity REAL,
             Sky TEXT,
             Wind TEXT
         );",
    )
    .unwrap();

    let tx = conn.transaction().unwrap();
    for o in records {
        tx.execute(
            "INSERT INTO observations (
                 Admin_Unit_Code, Location_Type, Plot_Name, Date, Scientific_Name,
                 Sex, ID_Method, Distance, Temperature, Humidity, Sky, Wind
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                o.admin_unit_code,
                o.location_type,
                o.plot_name,
                o.date.map(|d| d.format("%Y-%m-%d").to_string()),
                o.scientific_name,
                o.sex,
                o.id_method,
                o.distance,
                o.temperature,
                o.humidity,
                o.sky,
                o.wind,
            ],
        )
        .unwrap();
    }
    tx.commit().unwrap();
}
