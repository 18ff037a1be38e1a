use std::collections::{BTreeMap, HashSet};

use crate::data::{Dataset, FilterCriteria, Record};

/// Year -> Country -> mean life expectancy.
pub type AggregatedSeries = BTreeMap<i32, BTreeMap<String, f64>>;

/// Country -> mean life expectancy over the filtered range.
pub type AggregatedTotals = BTreeMap<String, f64>;

/// Keep every record whose country is selected and whose year lies in the
/// inclusive range. Source order is preserved.
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> Dataset {
    if criteria.is_vacuous() {
        return Dataset::default();
    }
    let filtered: Dataset = dataset
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect();
    log::debug!(
        "filter {}..={} over {} countries kept {} of {} rows",
        criteria.start_year,
        criteria.end_year,
        criteria.countries.len(),
        filtered.len(),
        dataset.len()
    );
    filtered
}

/// Running sum/count pair for an unweighted mean.
#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Mean per distinct (year, country) pair. Absent pairs stay absent.
pub fn mean_by_year_and_country(dataset: &Dataset) -> AggregatedSeries {
    let mut groups: BTreeMap<i32, BTreeMap<String, Mean>> = BTreeMap::new();
    for record in dataset {
        groups
            .entry(record.year)
            .or_default()
            .entry(record.country.clone())
            .or_default()
            .push(record.life_expectancy);
    }

    groups
        .into_iter()
        .map(|(year, by_country)| {
            let means = by_country
                .into_iter()
                .map(|(country, mean)| (country, mean.value()))
                .collect();
            (year, means)
        })
        .collect()
}

/// Mean per country across every row, ignoring the year.
pub fn mean_by_country(dataset: &Dataset) -> AggregatedTotals {
    let mut groups: BTreeMap<String, Mean> = BTreeMap::new();
    for record in dataset {
        groups
            .entry(record.country.clone())
            .or_default()
            .push(record.life_expectancy);
    }

    groups
        .into_iter()
        .map(|(country, mean)| (country, mean.value()))
        .collect()
}

/// Time series of one country, ready for a line chart.
#[derive(Debug, Clone, PartialEq)]
pub struct CountrySeries {
    pub country: String,
    /// (year, life expectancy), ascending by year
    pub points: Vec<(f64, f64)>,
}

/// One series per requested country, in the requested order.
///
/// Countries without any rows are left out; repeated names get one line.
pub fn line_series(dataset: &Dataset, countries: &[String]) -> Vec<CountrySeries> {
    let mut seen = HashSet::new();
    countries
        .iter()
        .filter(|country| seen.insert(*country))
        .filter_map(|country| {
            let mut rows: Vec<&Record> = dataset
                .iter()
                .filter(|record| &record.country == country)
                .collect();
            if rows.is_empty() {
                log::debug!("no rows for '{}', skipping line", country);
                return None;
            }
            rows.sort_by_key(|record| record.year);
            Some(CountrySeries {
                country: country.clone(),
                points: rows
                    .into_iter()
                    .map(|record| (record.year as f64, record.life_expectancy))
                    .collect(),
            })
        })
        .collect()
}

/// A pie wedge and its share of the whole.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub country: String,
    pub value: f64,
    /// Exact percentage of the total
    pub share: f64,
    /// `share` rounded to one decimal place, as printed on the chart
    pub percent: f64,
}

impl PieSlice {
    pub fn label(&self) -> String {
        format!("{} ({:.1}%)", self.country, self.percent)
    }
}

/// Turn per-country totals into wedges.
///
/// Only positive, finite values get a wedge; the others are dropped with a
/// warning and do not count towards the percentages.
pub fn pie_slices(totals: &AggregatedTotals) -> Vec<PieSlice> {
    let (kept, dropped): (Vec<_>, Vec<_>) = totals
        .iter()
        .partition(|(_, value)| value.is_finite() && **value > 0.0);
    for (country, value) in &dropped {
        log::warn!("no pie wedge for '{}': value {} is not a positive number", country, value);
    }

    let sum: f64 = kept.iter().map(|(_, value)| **value).sum();
    if !(sum > 0.0) {
        return Vec::new();
    }

    kept.into_iter()
        .map(|(country, &value)| {
            let share = value / sum * 100.0;
            PieSlice {
                country: country.clone(),
                value,
                share,
                percent: round_one_decimal(share),
            }
        })
        .collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
