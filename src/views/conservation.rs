//! Conservation Insights: the least observed species.

use crate::analysis::{bottom_n, value_counts};
use crate::data::Snapshot;
use crate::models::{Panel, TableSpec, ViewOutput};
use crate::views::{format_count, View, ViewSettings};

pub(super) fn render(snapshot: &Snapshot, settings: &ViewSettings) -> ViewOutput {
    let counts = value_counts(snapshot.records(), |o| o.scientific_name.as_deref());
    let least = bottom_n(counts, settings.top_n);

    let table = TableSpec {
        title: format!("Least Observed Species (Top {})", settings.top_n),
        columns: vec!["Scientific_Name".to_string(), "Observation_Count".to_string()],
        rows: least
            .into_iter()
            .map(|(name, count)| vec![name.to_string(), format_count(count)])
            .collect(),
    };

    ViewOutput {
        view: View::ConservationInsights,
        title: "Conservation Insights".to_string(),
        filters: Vec::new(),
        panels: vec![Panel::table(table).titled(format!(
            "Least Observed Species (Top {})",
            settings.top_n
        ))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PanelContent;
    use crate::test_support::{obs, snapshot};

    fn rows(output: &ViewOutput) -> Vec<(String, u64)> {
        match &output.panels[0].content {
            PanelContent::Table(table) => table
                .rows
                .iter()
                .map(|r| (r[0].clone(), r[1].replace(',', "").parse().unwrap()))
                .collect(),
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_least_observed_sorted_ascending() {
        let mut records = Vec::new();
        for i in 0..14u64 {
            for _ in 0..(14 - i) {
                records.push(obs("ANTI", "Forest", "P1", &format!("Species {:02}", i)));
            }
        }
        let snap = snapshot(records);

        let output = render(&snap, &ViewSettings::default());
        let least = rows(&output);

        assert_eq!(least.len(), 10);
        assert!(least.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(least[0], ("Species 13".to_string(), 1));
        assert_eq!(least[9], ("Species 04".to_string(), 10));
    }

    #[test]
    fn test_ties_keep_first_occurrence() {
        let snap = snapshot(vec![
            obs("ANTI", "Forest", "P1", "Corvus corax"),
            obs("ANTI", "Forest", "P1", "Vireo olivaceus"),
            obs("ANTI", "Forest", "P1", "Anas platyrhynchos"),
            obs("ANTI", "Forest", "P1", "Vireo olivaceus"),
        ]);

        let least = rows(&render(&snap, &ViewSettings::default()));
        assert_eq!(
            least,
            vec![
                ("Corvus corax".to_string(), 1),
                ("Anas platyrhynchos".to_string(), 1),
                ("Vireo olivaceus".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_counts_formatted_as_integers() {
        let records = (0..1200)
            .map(|_| obs("ANTI", "Forest", "P1", "Turdus migratorius"))
            .collect();
        let snap = snapshot(records);

        let output = render(&snap, &ViewSettings::default());
        let PanelContent::Table(table) = &output.panels[0].content else {
            panic!("expected table");
        };
        assert_eq!(table.columns, vec!["Scientific_Name", "Observation_Count"]);
        assert_eq!(table.rows, vec![vec!["Turdus migratorius".to_string(), "1,200".to_string()]]);
    }
}
