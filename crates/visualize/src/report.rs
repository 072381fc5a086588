//! Analysis Page Charts
//!
//! Renders the thirteen charts linked from the analysis page, one PNG per
//! chart, named after the chart.

use crate::canvas::{hex, Canvas, WHITE};
use crate::charts::{
    box_plot, histogram, horizontal_bars, palette, pie, scatter, vertical_bars, PieStyle,
    ScatterSeries, Series, BLUE, RED,
};
use crate::ChartError;
use ab_glyph::FontVec;
use census_data::summary::{
    crosstab_percent, income_rate_by, income_rate_by_age_group, value_counts, Crosstab,
};
use census_data::{CategoricalColumn, Dataset, Income, NumericColumn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default output directory, served under `/static/img`
pub const DEFAULT_OUTPUT_DIR: &str = "static/img";

type Render = for<'f> fn(&Dataset, Option<&'f FontVec>) -> Canvas<'f>;

/// Chart names in generation order
pub const CHART_NAMES: [&str; 13] = [
    "income_distribution",
    "gender_distribution",
    "age_distribution",
    "education_income",
    "education_distribution",
    "occupation_income",
    "occupation_distribution",
    "age_income",
    "gender_income",
    "gender_education_income",
    "education_hours",
    "occupation_gender",
    "age_hours_income",
];

const RENDERERS: [Render; 13] = [
    income_distribution,
    gender_distribution,
    age_distribution,
    education_income,
    education_distribution,
    occupation_income,
    occupation_distribution,
    age_income,
    gender_income,
    gender_education_income,
    education_hours,
    occupation_gender,
    age_hours_income,
];

/// Render every chart into `out_dir`, returning the written paths
pub fn generate_all(
    dataset: &Dataset,
    out_dir: &Path,
    font: Option<&FontVec>,
) -> Result<Vec<PathBuf>, ChartError> {
    if dataset.is_empty() {
        return Err(ChartError::EmptyDataset);
    }
    std::fs::create_dir_all(out_dir)?;

    let mut written = Vec::with_capacity(CHART_NAMES.len());
    for (name, render) in CHART_NAMES.iter().zip(RENDERERS) {
        let path = out_dir.join(format!("{}.png", name));
        render(dataset, font).save(&path)?;
        info!("Generated {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn column_values<'a>(dataset: &'a Dataset, column: CategoricalColumn) -> impl Iterator<Item = &'a str> {
    dataset.records().iter().map(move |r| r.categorical(column))
}

fn numeric_values(dataset: &Dataset, column: NumericColumn) -> Vec<f64> {
    dataset.records().iter().map(|r| r.numeric(column) as f64).collect()
}

fn counts_as_f64(counts: Vec<(String, usize)>) -> Vec<(String, f64)> {
    counts.into_iter().map(|(k, v)| (k, v as f64)).collect()
}

fn two_slice_pie<'f>(
    font: Option<&'f FontVec>,
    heading: &str,
    slices: Vec<(String, f64)>,
    legend: Option<Vec<String>>,
) -> Canvas<'f> {
    let mut canvas = Canvas::new(800, 600, font);
    let style = PieStyle {
        colors: vec![hex(BLUE), hex(RED)],
        explode: 0.05,
        slice_labels: true,
        percentages: true,
        legend,
        edge: None,
    };
    pie(&mut canvas, heading, &slices, &style);
    canvas
}

fn income_distribution<'f>(dataset: &Dataset, font: Option<&'f FontVec>) -> Canvas<'f> {
    let counts = value_counts(dataset.incomes().iter().map(Income::as_str));
    let legend = counts
        .iter()
        .map(|(label, _)| match label.as_str() {
            ">50K" => "> $50K".to_string(),
            _ => "≤ $50K".to_string(),
        })
        .collect();
    two_slice_pie(font, "Income Distribution", counts_as_f64(counts), Some(legend))
}

fn gender_distribution<'f>(dataset: &Dataset, font: Option<&'f FontVec>) -> Canvas<'f> {
    let counts = value_counts(column_values(dataset, CategoricalColumn::Gender));
    two_slice_pie(font, "Gender Distribution", counts_as_f64(counts), None)
}

fn age_distribution<'f>(dataset: &Dataset, font: Option<&'f FontVec>) -> Canvas<'f> {
    let mut canvas = Canvas::new(1000, 600, font);
    let ages = numeric_values(dataset, NumericColumn::Age);
    histogram(&mut canvas, "Age Distribution", ("Age", "Count"), &ages, 20, palette(0), true);
    canvas
}

fn rate_bars<'f>(
    font: Option<&'f FontVec>,
    heading: &str,
    y_label: &str,
    rates: Vec<(String, f64)>,
) -> Canvas<'f> {
    let mut canvas = Canvas::new(1200, 800, font);
    let (categories, values): (Vec<String>, Vec<f64>) = rates.into_iter().unzip();
    let series = [Series {
        label: Income::Above50K.as_str().to_string(),
        color: hex(BLUE),
        values,
    }];
    horizontal_bars(
        &mut canvas,
        heading,
        ("Percentage (%)", y_label),
        &categories,
        &series,
        100.0,
        None,
    );
    canvas
}

fn education_income<'f>(dataset: &Dataset, font: Option<&'f FontVec>) -> Canvas<'f> {
    rate_bars(
        font,
        "Percentage of Individuals with Income >$50K by Education Level",
        "Education Level",
        income_rate_by(dataset, CategoricalColumn::Education),
    )
}

fn education_distribution<'f>(dataset: &Dataset, font: Option<&'f FontVec>) -> Canvas<'f> {
    let mut canvas = Canvas::new(1000, 600, font);
    let counts = counts_as_f64(value_counts(column_values(dataset, CategoricalColumn::Education)));
    let style = PieStyle {
        colors: (0..counts.len()).map(palette).collect(),
        explode: 0.0,
        slice_labels: false,
        percentages: false,
        legend: Some(counts.iter().map(|(label, _)| label.clone()).collect()),
        edge: Some(WHITE),
    };
    pie(&mut canvas, "Education Level Distribution", &counts, &style);
    canvas
}

fn occupation_income<'f>(dataset: &Dataset, font: Option<&'f FontVec>) -> Canvas<'f> {
    rate_bars(
        font,
        "Percentage of Individuals with Income >$50K by Occupation",
        "Occupation",
        income_rate_by(dataset, CategoricalColumn::Occupation),
    )
}

fn occupation_distribution<'f>(dataset: &Dataset, font: Option<&'f FontVec>) -> Canvas<'f> {
    let mut canvas = Canvas::new(1000, 600, font);
    let counts = counts_as_f64(value_counts(column_values(dataset, CategoricalColumn::Occupation)));
    vertical_bars(
        &mut canvas,
        "Occupation Distribution",
        ("Occupation", "Count"),
        &counts,
        hex(BLUE),
        None,
    );
    canvas
}

fn age_income<'f>(dataset: &Dataset, font: Option<&'f FontVec>) -> Canvas<'f> {
    let mut canvas = Canvas::new(1000, 600, font);
    vertical_bars(
        &mut canvas,
        "Percentage of Individuals with Income >$50K by Age Group",
        ("Age Group", "Percentage (%)"),
        &income_rate_by_age_group(dataset),
        hex(BLUE),
        Some(50.0),
    );
    canvas
}

fn gender_income<'f>(dataset: &Dataset, font: Option<&'f FontVec>) -> Canvas<'f> {
    let mut canvas = Canvas::new(1000, 600, font);
    let tab = Crosstab::from_pairs(
        dataset
            .iter()
            .map(|(r, income)| (r.gender.as_str(), income.as_str())),
    );
    vertical_bars(
        &mut canvas,
        "Percentage of Individuals with Income >$50K by Gender",
        ("Gender", "Percentage (%)"),
        &tab.column(Income::Above50K.as_str()),
        hex(BLUE),
        Some(40.0),
    );
    canvas
}

/// Share of `>50K` per (education, gender), rows sorted by the `Male` share
fn rate_by_education_and_gender(dataset: &Dataset) -> (Vec<String>, Vec<Series>) {
    let mut cells: BTreeMap<(&str, &str), (usize, usize)> = BTreeMap::new();
    let mut genders: Vec<&str> = Vec::new();
    for (record, income) in dataset.iter() {
        let cell = cells
            .entry((record.education.as_str(), record.gender.as_str()))
            .or_default();
        cell.1 += 1;
        if income == Income::Above50K {
            cell.0 += 1;
        }
        if !genders.contains(&record.gender.as_str()) {
            genders.push(record.gender.as_str());
        }
    }
    genders.sort_unstable();

    let mut educations: Vec<&str> = cells.keys().map(|(e, _)| *e).collect();
    educations.dedup();
    let rate = |education: &str, gender: &str| {
        cells
            .get(&(education, gender))
            .map(|(high, total)| *high as f64 * 100.0 / *total as f64)
    };
    educations.sort_by(|a, b| {
        let (ra, rb) = (rate(*a, "Male").unwrap_or(0.0), rate(*b, "Male").unwrap_or(0.0));
        rb.total_cmp(&ra)
    });

    let series = genders
        .iter()
        .enumerate()
        .map(|(i, gender)| Series {
            label: gender.to_string(),
            color: palette(i),
            values: educations
                .iter()
                .map(|e| rate(*e, *gender).unwrap_or(0.0))
                .collect(),
        })
        .collect();
    (educations.into_iter().map(str::to_string).collect(), series)
}

fn gender_education_income<'f>(dataset: &Dataset, font: Option<&'f FontVec>) -> Canvas<'f> {
    let mut canvas = Canvas::new(1200, 800, font);
    let (categories, series) = rate_by_education_and_gender(dataset);
    horizontal_bars(
        &mut canvas,
        "Percentage with Income >$50K by Gender and Education",
        ("Percentage (%)", "Education Level"),
        &categories,
        &series,
        80.0,
        Some("Gender"),
    );
    canvas
}

fn education_hours<'f>(dataset: &Dataset, font: Option<&'f FontVec>) -> Canvas<'f> {
    let mut canvas = Canvas::new(1000, 600, font);
    let mut hours: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in dataset.records() {
        hours
            .entry(record.education.as_str())
            .or_default()
            .push(record.hours_per_week as f64);
    }
    // Same order as the education income chart
    let groups: Vec<(String, Vec<f64>)> = income_rate_by(dataset, CategoricalColumn::Education)
        .into_iter()
        .map(|(education, _)| {
            let values = hours.remove(education.as_str()).unwrap_or_default();
            (education, values)
        })
        .collect();
    box_plot(
        &mut canvas,
        "Hours Worked per Week by Education Level",
        ("Education Level", "Hours per Week"),
        &groups,
    );
    canvas
}

fn occupation_gender<'f>(dataset: &Dataset, font: Option<&'f FontVec>) -> Canvas<'f> {
    let mut canvas = Canvas::new(1200, 800, font);
    let mut tab = crosstab_percent(
        dataset,
        CategoricalColumn::Occupation,
        CategoricalColumn::Gender,
    );
    tab.sort_by_column_desc("Male");
    let series: Vec<Series> = tab
        .columns
        .iter()
        .enumerate()
        .map(|(i, gender)| Series {
            label: gender.clone(),
            color: palette(i),
            values: tab.percent.iter().map(|row| row[i]).collect(),
        })
        .collect();
    horizontal_bars(
        &mut canvas,
        "Gender Distribution by Occupation",
        ("Percentage (%)", "Occupation"),
        &tab.rows,
        &series,
        100.0,
        Some("Gender"),
    );
    canvas
}

fn age_hours_income<'f>(dataset: &Dataset, font: Option<&'f FontVec>) -> Canvas<'f> {
    let mut canvas = Canvas::new(1000, 800, font);
    let series: Vec<ScatterSeries> = Income::all()
        .into_iter()
        .map(|class| ScatterSeries {
            label: class.as_str().to_string(),
            color: hex(if class == Income::Above50K { RED } else { BLUE }),
            points: dataset
                .iter()
                .filter(|(_, income)| *income == class)
                .map(|(r, _)| (r.age as f64, r.hours_per_week as f64))
                .collect(),
        })
        .collect();
    scatter(
        &mut canvas,
        "Age vs. Hours Worked by Income",
        ("Age", "Hours per Week"),
        &series,
        0.5,
        Some("Income"),
    );
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use census_data::CensusRecord;

    fn sample() -> Dataset {
        (0..40)
            .map(|i| {
                let high = i % 4 == 0;
                let mut record = if high {
                    CensusRecord::executive_profile()
                } else {
                    CensusRecord::young_service_profile()
                };
                record.age += i % 9;
                record.hours_per_week += i % 6;
                if i % 3 == 0 {
                    record.gender = "Male".to_string();
                }
                let income = if high { Income::Above50K } else { Income::AtMost50K };
                (record, income)
            })
            .collect()
    }

    #[test]
    fn test_generates_every_chart() {
        let dir = tempfile::tempdir().unwrap();
        let written = generate_all(&sample(), dir.path(), None).unwrap();
        assert_eq!(written.len(), 13);
        for name in CHART_NAMES {
            let path = dir.path().join(format!("{}.png", name));
            assert!(path.exists(), "missing {}", name);
            let img = image::open(&path).unwrap();
            assert!(img.width() >= 800);
        }
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let empty: Dataset = Vec::new().into_iter().collect();
        assert!(matches!(
            generate_all(&empty, dir.path(), None),
            Err(ChartError::EmptyDataset)
        ));
    }

    #[test]
    fn test_education_gender_rates_sorted_by_male() {
        let (educations, series) = rate_by_education_and_gender(&sample());
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "Female");
        assert_eq!(series[1].label, "Male");
        let male = &series[1].values;
        assert!(male.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(educations.len(), male.len());
        // Masters holders are the executives, all of whom earn >50K
        let masters = educations.iter().position(|e| e == "Masters").unwrap();
        assert_eq!(male[masters], 100.0);
    }
}
