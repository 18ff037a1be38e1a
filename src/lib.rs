// Library exports for life-expectancy-reports

pub mod config;
pub mod csv_reader;
pub mod data;
pub mod error;
pub mod graph;
pub mod output;
pub mod palette;
pub mod report;
pub mod transform;

pub use data::{Dataset, FilterCriteria, Record};
pub use error::{ConfigError, DataLoadError, RenderError};
pub use report::{ChartKind, ReportSpec};

use serde::Deserialize;

/// Resolution settings shared by every chart.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RenderOptions {
    #[serde(default = "default_dpi")]
    pub dpi: u32,
}

fn default_dpi() -> u32 { 300 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self { dpi: default_dpi() }
    }
}

/// Physical figure size in inches.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct FigureSize {
    pub width: f64,
    pub height: f64,
}

impl FigureSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Pixel dimensions of the figure at the given resolution.
    pub fn pixels(&self, dpi: u32) -> (u32, u32) {
        let to_px = |inches: f64| (inches * dpi as f64).round().max(0.0) as u32;
        (to_px(self.width), to_px(self.height))
    }
}
