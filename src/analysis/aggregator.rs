//! Grouping and counting primitives shared by the views.
//!
//! Keyed results come back in first-occurrence order unless a function
//! says otherwise, so that stable sorts on top of them break ties by the
//! order in which keys first appear in the snapshot.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// Count items per key. Items whose key is `None` are skipped.
pub fn count_by<'a, T, K, F>(items: &'a [T], key: F) -> Vec<(K, u64)>
where
    K: Eq + Hash + Clone,
    F: Fn(&'a T) -> Option<K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, u64)> = Vec::new();

    for item in items {
        let Some(k) = key(item) else { continue };
        match index.get(&k) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(k.clone(), counts.len());
                counts.push((k, 1));
            }
        }
    }

    counts
}

/// Count distinct non-null values per key.
///
/// Items whose key is `None` are skipped entirely; items whose value is
/// `None` still create their key (with whatever count the other items give).
pub fn distinct_count_by<'a, T, K, V, FK, FV>(items: &'a [T], key: FK, value: FV) -> Vec<(K, u64)>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash,
    FK: Fn(&'a T) -> Option<K>,
    FV: Fn(&'a T) -> Option<V>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, HashSet<V>)> = Vec::new();

    for item in items {
        let Some(k) = key(item) else { continue };
        let i = *index.entry(k.clone()).or_insert_with(|| {
            groups.push((k, HashSet::new()));
            groups.len() - 1
        });
        if let Some(v) = value(item) {
            groups[i].1.insert(v);
        }
    }

    groups
        .into_iter()
        .map(|(k, values)| (k, values.len() as u64))
        .collect()
}

/// Sort keyed results by key, ascending.
pub fn sort_by_key<K: Ord, V>(mut entries: Vec<(K, V)>) -> Vec<(K, V)> {
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

/// Largest `n` counts, descending. Ties keep their input order.
pub fn top_n<K>(mut counts: Vec<(K, u64)>, n: usize) -> Vec<(K, u64)> {
    counts.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    counts.truncate(n);
    counts
}

/// Smallest `n` counts, ascending. Ties keep their input order.
pub fn bottom_n<K>(mut counts: Vec<(K, u64)>, n: usize) -> Vec<(K, u64)> {
    counts.sort_by_key(|(_, count)| *count);
    counts.truncate(n);
    counts
}

/// Value counts the way a frequency table reports them: descending by
/// count, ties in first-occurrence order.
pub fn value_counts<'a, T, K, F>(items: &'a [T], key: F) -> Vec<(K, u64)>
where
    K: Eq + Hash + Clone,
    F: Fn(&'a T) -> Option<K>,
{
    let counts = count_by(items, key);
    let n = counts.len();
    top_n(counts, n)
}

/// Distinct non-null values, sorted ascending.
pub fn distinct_sorted<'a, T, F>(items: &'a [T], value: F) -> Vec<String>
where
    F: Fn(&'a T) -> Option<&'a str>,
{
    items
        .iter()
        .filter_map(value)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Arithmetic mean, `None` for an empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0u64), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// A two-way frequency table with sorted axes and zero-filled cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrossTab {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `cells[r][c]` counts items with row label `rows[r]` and column label `columns[c]`.
    pub cells: Vec<Vec<u64>>,
}

impl CrossTab {
    /// Tabulate items by two nominal attributes. Items missing either
    /// attribute are not counted.
    pub fn build<'a, T, FR, FC>(items: &'a [T], row: FR, column: FC) -> Self
    where
        FR: Fn(&'a T) -> Option<&'a str>,
        FC: Fn(&'a T) -> Option<&'a str>,
    {
        let pairs: Vec<(&str, &str)> = items
            .iter()
            .filter_map(|item| Some((row(item)?, column(item)?)))
            .collect();

        let rows: Vec<&str> = pairs
            .iter()
            .map(|(r, _)| *r)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let columns: Vec<&str> = pairs
            .iter()
            .map(|(_, c)| *c)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let row_index: HashMap<&str, usize> =
            rows.iter().enumerate().map(|(i, r)| (*r, i)).collect();
        let column_index: HashMap<&str, usize> =
            columns.iter().enumerate().map(|(i, c)| (*c, i)).collect();

        let mut cells = vec![vec![0u64; columns.len()]; rows.len()];
        for (r, c) in &pairs {
            cells[row_index[r]][column_index[c]] += 1;
        }

        Self {
            rows: rows.into_iter().map(str::to_string).collect(),
            columns: columns.into_iter().map(str::to_string).collect(),
            cells,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// Count for a (row, column) pair; zero for labels not in the table.
    #[cfg(test)]
    pub fn get(&self, row: &str, column: &str) -> u64 {
        let r = self.rows.iter().position(|x| x == row);
        let c = self.columns.iter().position(|x| x == column);
        match (r, c) {
            (Some(r), Some(c)) => self.cells[r][c],
            _ => 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }
}
