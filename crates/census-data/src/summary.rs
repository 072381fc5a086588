//! Descriptive Summaries
//!
//! Counting and cross-tabulation helpers used by the chart report.

use crate::record::{CategoricalColumn, Dataset, Income};
use std::collections::BTreeMap;

/// Age bins: (lower exclusive, upper inclusive, label)
pub const AGE_GROUPS: [(i64, i64, &str); 6] = [
    (16, 25, "<25"),
    (25, 35, "25-34"),
    (35, 45, "35-44"),
    (45, 55, "45-54"),
    (55, 65, "55-64"),
    (65, 100, "65+"),
];

/// Age group label for an age, if it falls inside the binned range
pub fn age_group(age: i64) -> Option<&'static str> {
    AGE_GROUPS
        .iter()
        .find(|(lo, hi, _)| age > *lo && age <= *hi)
        .map(|(_, _, label)| *label)
}

/// Count occurrences, most frequent first (ties broken by label)
pub fn value_counts<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Row-normalized cross tabulation in percent
///
/// Rows and columns are sorted by label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Crosstab {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `percent[row][col]`
    pub percent: Vec<Vec<f64>>,
}

impl Crosstab {
    /// Build from (row, column) pairs
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut counts: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
        let mut columns: BTreeMap<&str, ()> = BTreeMap::new();
        for (row, col) in pairs {
            *counts.entry(row).or_default().entry(col).or_insert(0) += 1;
            columns.insert(col, ());
        }

        let columns: Vec<&str> = columns.into_keys().collect();
        let mut rows = Vec::with_capacity(counts.len());
        let mut percent = Vec::with_capacity(counts.len());
        for (row, cells) in &counts {
            let total: usize = cells.values().sum();
            rows.push(row.to_string());
            percent.push(
                columns
                    .iter()
                    .map(|c| {
                        let n = cells.get(c).copied().unwrap_or(0);
                        if total == 0 {
                            0.0
                        } else {
                            n as f64 * 100.0 / total as f64
                        }
                    })
                    .collect(),
            );
        }

        Self {
            rows,
            columns: columns.into_iter().map(str::to_string).collect(),
            percent,
        }
    }

    /// Index of a column label
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Percentages of one column keyed by row, in row order
    pub fn column(&self, label: &str) -> Vec<(String, f64)> {
        match self.column_index(label) {
            Some(idx) => self
                .rows
                .iter()
                .zip(&self.percent)
                .map(|(r, p)| (r.clone(), p[idx]))
                .collect(),
            None => self.rows.iter().map(|r| (r.clone(), 0.0)).collect(),
        }
    }

    /// Reorder rows by one column, descending (ties keep label order)
    pub fn sort_by_column_desc(&mut self, label: &str) {
        let Some(idx) = self.column_index(label) else {
            return;
        };
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        order.sort_by(|&a, &b| {
            self.percent[b][idx]
                .partial_cmp(&self.percent[a][idx])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.rows = order.iter().map(|&i| self.rows[i].clone()).collect();
        self.percent = order.iter().map(|&i| self.percent[i].clone()).collect();
    }
}

/// Row-normalized percentages of one categorical column against another
pub fn crosstab_percent(
    dataset: &Dataset,
    row: CategoricalColumn,
    column: CategoricalColumn,
) -> Crosstab {
    Crosstab::from_pairs(
        dataset
            .records()
            .iter()
            .map(|record| (record.categorical(row), record.categorical(column))),
    )
}

/// Percentage of `>50K` earners per category of a column, highest first
pub fn income_rate_by(dataset: &Dataset, column: CategoricalColumn) -> Vec<(String, f64)> {
    let mut tab = Crosstab::from_pairs(
        dataset
            .iter()
            .map(|(record, income)| (record.categorical(column), income.as_str())),
    );
    tab.sort_by_column_desc(Income::Above50K.as_str());
    tab.column(Income::Above50K.as_str())
}

/// Percentage of `>50K` earners per age group, in age order
pub fn income_rate_by_age_group(dataset: &Dataset) -> Vec<(String, f64)> {
    let tab = Crosstab::from_pairs(
        dataset
            .iter()
            .filter_map(|(record, income)| age_group(record.age).map(|g| (g, income.as_str()))),
    );
    let rates = tab.column(Income::Above50K.as_str());
    AGE_GROUPS
        .iter()
        .filter_map(|(_, _, label)| rates.iter().find(|(g, _)| g.as_str() == *label).cloned())
        .collect()
}
