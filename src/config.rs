//! Report configuration
//!
//! Every field is optional in the JSON file; missing values fall back to the
//! stock line/bar/pie reports reading `life_expectancy.csv`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::report::{ChartKind, ReportSpec};
use crate::{FigureSize, RenderOptions};

pub const DEFAULT_DATA_PATH: &str = "life_expectancy.csv";

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// CSV input path
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Directory receiving the PNG files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub render: RenderOptions,

    #[serde(default = "default_reports")]
    pub reports: Vec<ReportEntry>,
}

fn default_data_path() -> PathBuf { PathBuf::from(DEFAULT_DATA_PATH) }
fn default_output_dir() -> PathBuf { PathBuf::from(".") }

fn default_reports() -> Vec<ReportEntry> {
    ChartKind::ALL.into_iter().map(ReportEntry::new).collect()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            output_dir: default_output_dir(),
            render: RenderOptions::default(),
            reports: default_reports(),
        }
    }
}

/// One report as written in the config file. Unset fields take the stock
/// values for its `kind`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReportEntry {
    pub kind: ChartKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub countries: Option<Vec<String>>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub figure: Option<FigureSize>,
}

impl ReportEntry {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            title: None,
            countries: None,
            start_year: None,
            end_year: None,
            output: None,
            figure: None,
        }
    }

    pub fn to_spec(&self) -> ReportSpec {
        let base = ReportSpec::default_for(self.kind);
        ReportSpec {
            kind: self.kind,
            title: self.title.clone().unwrap_or(base.title),
            countries: self.countries.clone().unwrap_or(base.countries),
            start_year: self.start_year.unwrap_or(base.start_year),
            end_year: self.end_year.unwrap_or(base.end_year),
            output: self.output.clone().unwrap_or(base.output),
            figure: self.figure.unwrap_or(base.figure),
        }
    }
}

impl ReportConfig {
    /// Read a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Resolved report definitions, optionally restricted to `only`.
    pub fn specs(&self, only: &[ChartKind]) -> Vec<ReportSpec> {
        self.reports
            .iter()
            .filter(|entry| only.is_empty() || only.contains(&entry.kind))
            .map(ReportEntry::to_spec)
            .collect()
    }
}
