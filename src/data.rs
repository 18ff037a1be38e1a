use std::collections::HashSet;

/// One (Country, Year, Life Expectancy) observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub country: String,
    pub year: i32,
    pub life_expectancy: f64,
}

impl Record {
    pub fn new(country: impl Into<String>, year: i32, life_expectancy: f64) -> Self {
        Self {
            country: country.into(),
            year,
            life_expectancy,
        }
    }
}

/// Ordered, read-only collection of records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Country set plus inclusive year range.
///
/// `start_year > end_year` is accepted and matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub countries: HashSet<String>,
    pub start_year: i32,
    pub end_year: i32,
}

impl FilterCriteria {
    pub fn new<I, S>(countries: I, start_year: i32, end_year: i32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            countries: countries.into_iter().map(Into::into).collect(),
            start_year,
            end_year,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.start_year <= record.year
            && record.year <= self.end_year
            && self.countries.contains(&record.country)
    }

    pub fn is_vacuous(&self) -> bool {
        self.start_year > self.end_year || self.countries.is_empty()
    }
}
