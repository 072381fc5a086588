//! CSV Dataset Loader

use crate::error::DataError;
use crate::record::{CategoricalColumn, CensusRecord, Dataset, Income, NumericColumn};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Name of the target column
pub const INCOME_COLUMN: &str = "income";

/// Load the census dataset from a CSV file with a header row
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset, DataError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let dataset = read_dataset(file)?;
    info!("Dataset loaded from {} with {} records", path.display(), dataset.len());
    Ok(dataset)
}

/// Read the census dataset from any CSV source
///
/// Model columns absent from the header are filled with `0` (numeric) or
/// `"0"` (categorical). The `income` column is mandatory.
pub fn read_dataset<R: Read>(source: R) -> Result<Dataset, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let positions: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), i))
        .collect();

    let income_idx = *positions
        .get(INCOME_COLUMN)
        .ok_or(DataError::ColumnNotFound(INCOME_COLUMN))?;

    let numeric_idx: Vec<(NumericColumn, Option<usize>)> = NumericColumn::ALL
        .iter()
        .map(|&c| (c, lookup_column(&positions, c.name())))
        .collect();
    let categorical_idx: Vec<(CategoricalColumn, Option<usize>)> = CategoricalColumn::ALL
        .iter()
        .map(|&c| (c, lookup_column(&positions, c.name())))
        .collect();

    let mut dataset = Dataset::new();
    for (row_number, row) in reader.records().enumerate() {
        let row = row?;
        // Header is line 1
        let row_number = row_number + 2;

        let mut numbers = [0i64; 6];
        for (slot, (column, idx)) in numbers.iter_mut().zip(&numeric_idx) {
            if let Some(idx) = idx {
                let raw = row.get(*idx).unwrap_or("");
                *slot = raw.parse::<i64>().map_err(|_| DataError::InvalidNumber {
                    row: row_number,
                    column: column.name(),
                    value: raw.to_string(),
                })?;
            }
        }

        let mut categories: Vec<String> = Vec::with_capacity(categorical_idx.len());
        for (_, idx) in &categorical_idx {
            let value = match idx {
                Some(idx) => row.get(*idx).unwrap_or("").to_string(),
                None => "0".to_string(),
            };
            categories.push(value);
        }

        let raw_income = row.get(income_idx).unwrap_or("");
        let income = raw_income
            .parse::<Income>()
            .map_err(|value| DataError::InvalidLabel { row: row_number, value })?;

        let mut categories = categories.into_iter();
        let mut next = || categories.next().unwrap_or_default();
        let record = CensusRecord {
            age: numbers[0],
            fnlwgt: numbers[1],
            educational_num: numbers[2],
            capital_gain: numbers[3],
            capital_loss: numbers[4],
            hours_per_week: numbers[5],
            workclass: next(),
            education: next(),
            marital_status: next(),
            occupation: next(),
            relationship: next(),
            race: next(),
            gender: next(),
            native_country: next(),
        };
        dataset.push(record, income);
    }

    if dataset.is_empty() {
        return Err(DataError::Empty);
    }
    Ok(dataset)
}

fn lookup_column(positions: &HashMap<String, usize>, name: &'static str) -> Option<usize> {
    let idx = positions.get(name).copied();
    if idx.is_none() {
        warn!("Missing required column: {}, creating column with default values", name);
    }
    idx
}
