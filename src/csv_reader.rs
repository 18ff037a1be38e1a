// CSV loading for the life-expectancy dataset

use crate::data::{Dataset, Record};
use crate::error::DataLoadError;
use std::io::Read;
use std::path::Path;

pub const COUNTRY_COLUMN: &str = "Country";
pub const YEAR_COLUMN: &str = "Year";
pub const LIFE_EXPECTANCY_COLUMN: &str = "Life Expectancy";

/// Cell texts read as a missing value, in addition to the empty cell
const MISSING_TOKENS: [&str; 6] = ["NA", "N/A", "NaN", "nan", "null", "NULL"];

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || MISSING_TOKENS.contains(&cell)
}

/// Load the dataset from a CSV file on disk.
pub fn load_dataset(path: &Path) -> Result<Dataset, DataLoadError> {
    let reader = builder()
        .from_path(path)
        .map_err(|source| DataLoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let dataset = collect_records(reader)?;
    log::info!("loaded {} records from {}", dataset.len(), path.display());
    Ok(dataset)
}

/// Load the dataset from any reader (stdin, in-memory buffers).
pub fn read_dataset<R: Read>(input: R) -> Result<Dataset, DataLoadError> {
    collect_records(builder().from_reader(input))
}

fn builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).trim(csv::Trim::All);
    builder
}

/// Column positions of the required fields within the header row.
struct ColumnIndex {
    country: usize,
    year: usize,
    life_expectancy: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, DataLoadError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(DataLoadError::MissingColumn(name))
        };
        Ok(Self {
            country: find(COUNTRY_COLUMN)?,
            year: find(YEAR_COLUMN)?,
            life_expectancy: find(LIFE_EXPECTANCY_COLUMN)?,
        })
    }
}

fn collect_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Dataset, DataLoadError> {
    let columns = ColumnIndex::from_headers(reader.headers()?)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        let row_number = idx + 1;

        let country = row.get(columns.country).unwrap_or("");
        let year = row.get(columns.year).unwrap_or("");
        let value = row.get(columns.life_expectancy).unwrap_or("");

        // Missing values drop the row rather than failing the load
        if is_missing(year) || is_missing(value) {
            skipped += 1;
            continue;
        }

        let year = year.parse::<i32>().map_err(|_| DataLoadError::InvalidValue {
            row: row_number,
            column: YEAR_COLUMN,
            value: year.to_string(),
        })?;
        let life_expectancy = value.parse::<f64>().map_err(|_| DataLoadError::InvalidValue {
            row: row_number,
            column: LIFE_EXPECTANCY_COLUMN,
            value: value.to_string(),
        })?;

        // inf/-inf (and any NaN spelling not listed above) parse but cannot be averaged
        if !life_expectancy.is_finite() {
            skipped += 1;
            continue;
        }

        records.push(Record::new(country, year, life_expectancy));
    }

    if skipped > 0 {
        log::warn!("skipped {} rows with a missing or non-finite Year or Life Expectancy", skipped);
    }

    Ok(Dataset::new(records))
}
