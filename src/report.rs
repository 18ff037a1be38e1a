// Report driver: binds a report definition to filter -> aggregate -> render

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::{Dataset, FilterCriteria};
use crate::error::RenderError;
use crate::graph::{AxisLabels, Canvas};
use crate::output;
use crate::transform;
use crate::{FigureSize, RenderOptions};

pub const DEFAULT_COUNTRIES: [&str; 6] = [
    "India",
    "United Kingdom",
    "United States",
    "Brazil",
    "Mexico",
    "Australia",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Line, ChartKind::Bar, ChartKind::Pie];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to produce one chart file
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSpec {
    pub kind: ChartKind,
    pub title: String,
    pub countries: Vec<String>,
    pub start_year: i32,
    pub end_year: i32,
    /// Output file, relative to the output directory unless absolute
    pub output: PathBuf,
    pub figure: FigureSize,
}

impl ReportSpec {
    /// The stock report for `kind`.
    pub fn default_for(kind: ChartKind) -> Self {
        let (title, start_year, end_year, output, figure) = match kind {
            ChartKind::Line => (
                "Life Expectancy Over Time",
                1802,
                2016,
                "line_plot.png",
                FigureSize::new(12.0, 6.0),
            ),
            ChartKind::Bar => (
                "Average Life Expectancy 2010-2016",
                2010,
                2016,
                "bar_graph.png",
                FigureSize::new(12.0, 4.0),
            ),
            ChartKind::Pie => (
                "Total Life Expectancy by Country 1802-2016",
                1802,
                2016,
                "pie_chart.png",
                FigureSize::new(8.0, 8.0),
            ),
        };

        Self {
            kind,
            title: title.to_string(),
            countries: DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            start_year,
            end_year,
            output: PathBuf::from(output),
            figure,
        }
    }

    /// Line, bar, and pie reports with their stock parameters
    pub fn defaults() -> Vec<Self> {
        ChartKind::ALL.into_iter().map(Self::default_for).collect()
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(self.countries.iter().cloned(), self.start_year, self.end_year)
    }
}

/// Filter, aggregate, and draw one report into PNG bytes. No file I/O.
pub fn render_report(
    dataset: &Dataset,
    spec: &ReportSpec,
    options: &RenderOptions,
) -> Result<Vec<u8>, RenderError> {
    let filtered = transform::filter(dataset, &spec.criteria());
    let mut canvas = Canvas::new(spec.figure, options.dpi, spec.title.as_str())?;

    match spec.kind {
        ChartKind::Line => {
            let series = transform::line_series(&filtered, &spec.countries);
            canvas.draw_line_chart(&series, &AxisLabels::new("Year", "Life Expectancy"))?;
        }
        ChartKind::Bar => {
            let series = transform::mean_by_year_and_country(&filtered);
            canvas.draw_grouped_bars(&series, &AxisLabels::new("Year", "Average Life Expectancy"))?;
        }
        ChartKind::Pie => {
            let slices = transform::pie_slices(&transform::mean_by_country(&filtered));
            for slice in &slices {
                log::debug!("pie: {}", slice.label());
            }
            canvas.draw_pie(&slices)?;
        }
    }

    canvas.render()
}

/// Render one report and write it under `out_dir`. Returns the written path.
pub fn run_report(
    dataset: &Dataset,
    spec: &ReportSpec,
    options: &RenderOptions,
    out_dir: &Path,
) -> Result<PathBuf, RenderError> {
    let png_bytes = render_report(dataset, spec, options)?;
    let path = out_dir.join(&spec.output);
    output::write_atomic(&path, &png_bytes)?;
    Ok(path)
}

/// Result of one report within a batch
#[derive(Debug)]
pub struct ReportOutcome {
    pub kind: ChartKind,
    pub result: Result<PathBuf, RenderError>,
}

impl ReportOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run every report; one failure never stops the others.
pub fn run_all(
    dataset: &Dataset,
    specs: &[ReportSpec],
    options: &RenderOptions,
    out_dir: &Path,
) -> Vec<ReportOutcome> {
    specs
        .iter()
        .map(|spec| {
            let result = run_report(dataset, spec, options, out_dir);
            if let Err(e) = &result {
                log::error!("{} report failed: {}", spec.kind, e);
            }
            ReportOutcome {
                kind: spec.kind,
                result,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;
    use std::fs;

    fn options() -> RenderOptions {
        RenderOptions { dpi: 30 }
    }

    fn sample() -> Dataset {
        let mut records = Vec::new();
        for (i, country) in DEFAULT_COUNTRIES.iter().enumerate() {
            for year in 2008..=2016 {
                records.push(Record::new(*country, year, 60.0 + i as f64 + (year - 2008) as f64 * 0.3));
            }
        }
        records.push(Record::new("Germany", 2012, 80.5));
        Dataset::new(records)
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ler-report-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_specs() {
        let specs = ReportSpec::defaults();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].output, PathBuf::from("line_plot.png"));
        assert_eq!((specs[0].start_year, specs[0].end_year), (1802, 2016));
        assert_eq!(specs[1].output, PathBuf::from("bar_graph.png"));
        assert_eq!((specs[1].start_year, specs[1].end_year), (2010, 2016));
        assert_eq!(specs[2].output, PathBuf::from("pie_chart.png"));
        assert!(specs.iter().all(|s| s.countries.len() == 6));
    }

    #[test]
    fn test_criteria_excludes_unlisted_country() {
        let spec = ReportSpec::default_for(ChartKind::Pie);
        let filtered = transform::filter(&sample(), &spec.criteria());
        assert!(filtered.iter().all(|r| r.country != "Germany"));
        assert_eq!(filtered.len(), 6 * 9);
    }

    #[test]
    fn test_render_each_kind() {
        let dataset = sample();
        for spec in ReportSpec::defaults() {
            let png_bytes = render_report(&dataset, &spec, &options()).unwrap();
            let img = image::load_from_memory(&png_bytes).unwrap();
            assert_eq!((img.width(), img.height()), spec.figure.pixels(30));
        }
    }

    #[test]
    fn test_nan_rows_do_not_empty_the_pie() {
        let mut text = String::from("Country,Year,Life Expectancy\n");
        for country in DEFAULT_COUNTRIES {
            for year in 2010..=2016 {
                text.push_str(&format!("\"{}\",{},{}\n", country, year, 60.0 + (year - 2010) as f64));
            }
        }
        text.push_str("India,2012,NaN\nBrazil,2013,inf\nChina,2014,NA\n");
        let dataset = crate::csv_reader::read_dataset(text.as_bytes()).unwrap();
        assert_eq!(dataset.len(), DEFAULT_COUNTRIES.len() * 7);

        for kind in ChartKind::ALL {
            let spec = ReportSpec::default_for(kind);
            let png_bytes = render_report(&dataset, &spec, &options()).unwrap();
            assert!(image::load_from_memory(&png_bytes).is_ok());
        }

        let totals = transform::mean_by_country(&dataset);
        let slices = transform::pie_slices(&totals);
        assert_eq!(slices.len(), DEFAULT_COUNTRIES.len());
        assert!(slices.iter().all(|s| s.percent.is_finite() && s.percent > 0.0));
    }

    #[test]
    fn test_unknown_country_yields_empty_data() {
        let dataset = sample();
        for kind in ChartKind::ALL {
            let mut spec = ReportSpec::default_for(kind);
            spec.countries = vec!["Atlantis".to_string()];
            let err = render_report(&dataset, &spec, &options()).unwrap_err();
            assert!(matches!(err, RenderError::EmptyData(k) if k == kind));
        }
    }

    #[test]
    fn test_inverted_range_yields_empty_data() {
        let mut spec = ReportSpec::default_for(ChartKind::Bar);
        spec.start_year = 2016;
        spec.end_year = 2010;
        let err = render_report(&sample(), &spec, &options()).unwrap_err();
        assert!(matches!(err, RenderError::EmptyData(ChartKind::Bar)));
    }

    #[test]
    fn test_run_report_writes_file() {
        let dir = scratch_dir("writes");
        let spec = ReportSpec::default_for(ChartKind::Bar);
        let path = run_report(&sample(), &spec, &options(), &dir).unwrap();
        assert_eq!(path, dir.join("bar_graph.png"));
        assert!(fs::metadata(&path).unwrap().len() > 8);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_failed_report_leaves_no_file() {
        let dir = scratch_dir("nofile");
        let mut spec = ReportSpec::default_for(ChartKind::Pie);
        spec.countries = vec!["Germany".to_string()];
        spec.start_year = 1900;
        spec.end_year = 1950;
        assert!(run_report(&sample(), &spec, &options(), &dir).is_err());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_run_all_isolates_failures() {
        let dir = scratch_dir("isolation");
        let mut broken = ReportSpec::default_for(ChartKind::Line);
        broken.countries = vec!["Atlantis".to_string()];
        let specs = vec![
            broken,
            ReportSpec::default_for(ChartKind::Bar),
            ReportSpec::default_for(ChartKind::Pie),
        ];

        let outcomes = run_all(&sample(), &specs, &options(), &dir);

        assert_eq!(outcomes.len(), 3);
        assert!(!outcomes[0].is_ok());
        assert!(outcomes[1].is_ok());
        assert!(outcomes[2].is_ok());
        assert!(!dir.join("line_plot.png").exists());
        assert!(dir.join("bar_graph.png").exists());
        assert!(dir.join("pie_chart.png").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unwritable_output_dir() {
        let dir = scratch_dir("unwritable").join("missing");
        let spec = ReportSpec::default_for(ChartKind::Pie);
        let err = run_report(&sample(), &spec, &options(), &dir).unwrap_err();
        assert!(matches!(err, RenderError::Write { .. }));
    }

    #[test]
    fn test_chart_kind_deserialize() {
        let kind: ChartKind = serde_json::from_str("\"bar\"").unwrap();
        assert_eq!(kind, ChartKind::Bar);
        assert_eq!(ChartKind::Pie.to_string(), "pie");
    }
}
