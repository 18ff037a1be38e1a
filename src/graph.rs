use std::collections::BTreeSet;
use std::ops::Range;

use plotters::element::Pie;
use plotters::prelude::*;

use crate::error::RenderError;
use crate::palette::series_color;
use crate::report::ChartKind;
use crate::transform::{AggregatedSeries, CountrySeries, PieSlice};
use crate::FigureSize;

const FONT: &str = "sans-serif";

// Sizes in typographic points, converted to pixels through the DPI
const TITLE_PT: f64 = 12.0;
const LABEL_PT: f64 = 10.0;
const TICK_PT: f64 = 9.0;
const LINE_PT: f64 = 1.5;
const MARGIN_PT: f64 = 8.0;

/// Largest canvas we agree to allocate (about 300 MB of RGB)
pub const MAX_PIXELS: u64 = 100_000_000;

/// Heading of the bar chart legend
const LEGEND_TITLE: &str = "Country";

/// Pie start angle in degrees
const PIE_START_ANGLE: f64 = 140.0;

/// Axis captions for cartesian charts
#[derive(Debug, Clone)]
pub struct AxisLabels {
    pub x: String,
    pub y: String,
}

impl AxisLabels {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

/// Pixel sizes derived once per chart
#[derive(Debug, Clone, Copy)]
struct Metrics {
    title: f64,
    label: f64,
    tick: f64,
    stroke: u32,
    margin: u32,
    x_label_area: u32,
    y_label_area: u32,
    swatch: i32,
}

/// An RGB raster the size of one figure, drawn once and encoded as PNG
pub struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
    dpi: u32,
    title: String,
}

impl Canvas {
    /// Allocate a white-to-be canvas of `figure` inches at `dpi`.
    pub fn new(figure: FigureSize, dpi: u32, title: impl Into<String>) -> Result<Self, RenderError> {
        let (width, height) = figure.pixels(dpi);
        if width == 0 || height == 0 || width as u64 * height as u64 > MAX_PIXELS {
            return Err(RenderError::InvalidFigure { width, height });
        }

        let buffer = vec![0u8; width as usize * height as usize * 3];

        Ok(Canvas {
            buffer,
            width,
            height,
            dpi,
            title: title.into(),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn px(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }

    fn metrics(&self) -> Metrics {
        let tick = self.px(TICK_PT);
        Metrics {
            title: self.px(TITLE_PT),
            label: self.px(LABEL_PT),
            tick,
            stroke: self.px(LINE_PT).round().max(1.0) as u32,
            margin: self.px(MARGIN_PT).round() as u32,
            x_label_area: (tick * 3.5).round() as u32,
            y_label_area: (tick * 5.0).round() as u32,
            swatch: (tick * 1.5).round() as i32,
        }
    }

    /// One polyline per country, x = year, y = value.
    pub fn draw_line_chart(
        &mut self,
        series: &[CountrySeries],
        axes: &AxisLabels,
    ) -> Result<(), RenderError> {
        if series.iter().all(|s| s.points.is_empty()) {
            return Err(RenderError::EmptyData(ChartKind::Line));
        }

        // An unbounded axis never settles on tick positions
        let finite = series
            .iter()
            .flat_map(|s| s.points.iter())
            .all(|&(x, y)| x.is_finite() && y.is_finite());
        if !finite {
            return Err(RenderError::NonFiniteData(ChartKind::Line));
        }

        let x_range = padded_range(series.iter().flat_map(|s| s.points.iter().map(|p| p.0)));
        let y_range = padded_range(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)));
        let m = self.metrics();

        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(|e| RenderError::draw("filling background", e))?;

        let mut chart = ChartBuilder::on(&root)
            .margin(m.margin)
            .caption(&self.title, (FONT, m.title))
            .x_label_area_size(m.x_label_area)
            .y_label_area_size(m.y_label_area)
            .build_cartesian_2d(x_range, y_range)
            .map_err(|e| RenderError::draw("building chart", e))?;

        chart
            .configure_mesh()
            .x_desc(axes.x.as_str())
            .y_desc(axes.y.as_str())
            .label_style((FONT, m.tick))
            .axis_desc_style((FONT, m.label))
            .x_label_formatter(&|x| format!("{:.0}", x))
            .draw()
            .map_err(|e| RenderError::draw("drawing mesh", e))?;

        for (idx, country) in series.iter().enumerate() {
            let color = series_color(idx);
            let stroke = m.stroke;
            let swatch = m.swatch;

            chart
                .draw_series(LineSeries::new(
                    country.points.iter().copied(),
                    color.stroke_width(stroke),
                ))
                .map_err(|e| RenderError::draw("drawing line series", e))?
                .label(country.country.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + swatch, y)], color.stroke_width(stroke))
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font((FONT, m.tick))
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(|e| RenderError::draw("drawing legend", e))?;

        root.present().map_err(|e| RenderError::draw("presenting drawing", e))?;

        Ok(())
    }

    /// One cluster per year, one bar per country inside it.
    ///
    /// Countries missing from a year leave their slot in the cluster empty.
    pub fn draw_grouped_bars(
        &mut self,
        series: &AggregatedSeries,
        axes: &AxisLabels,
    ) -> Result<(), RenderError> {
        let years: Vec<i32> = series.keys().copied().collect();
        let countries: Vec<&String> = series
            .values()
            .flat_map(|by_country| by_country.keys())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if years.is_empty() || countries.is_empty() {
            return Err(RenderError::EmptyData(ChartKind::Bar));
        }

        let values = || series.values().flat_map(|by_country| by_country.values().copied());
        if !values().all(f64::is_finite) {
            return Err(RenderError::NonFiniteData(ChartKind::Bar));
        }
        let y_range = bar_value_range(values());
        let num_categories = years.len();
        let num_series = countries.len() as f64;
        let m = self.metrics();

        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(|e| RenderError::draw("filling background", e))?;

        // Cluster i is centred on x = i
        let x_range = -0.5..(num_categories as f64 - 0.5);

        let mut chart = ChartBuilder::on(&root)
            .margin(m.margin)
            .caption(&self.title, (FONT, m.title))
            .x_label_area_size(m.x_label_area)
            .y_label_area_size(m.y_label_area)
            .build_cartesian_2d(x_range, y_range)
            .map_err(|e| RenderError::draw("building chart", e))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(num_categories)
            .x_label_formatter(&|x| category_label(&years, *x))
            .x_desc(axes.x.as_str())
            .y_desc(axes.y.as_str())
            .label_style((FONT, m.tick))
            .axis_desc_style((FONT, m.label))
            .draw()
            .map_err(|e| RenderError::draw("drawing mesh", e))?;

        // Legend heading: an entry with no swatch, listed first
        chart
            .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())
            .map_err(|e| RenderError::draw("drawing legend heading", e))?
            .label(LEGEND_TITLE)
            .legend(|(x, y)| EmptyElement::at((x, y)));

        // Side-by-side bars, 80% of each cluster slot
        let bar_width = 0.8 / num_series;

        for (series_idx, &country) in countries.iter().enumerate() {
            let color = series_color(series_idx);
            let offset = (series_idx as f64 - (num_series - 1.0) / 2.0) * bar_width;
            let swatch = m.swatch;

            let bars = years.iter().enumerate().filter_map(|(cat_idx, year)| {
                let value = *series.get(year)?.get(country)?;
                let x_center = cat_idx as f64 + offset;
                Some(Rectangle::new(
                    [
                        (x_center - bar_width / 2.0, 0.0),
                        (x_center + bar_width / 2.0, value),
                    ],
                    color.filled(),
                ))
            });

            chart
                .draw_series(bars)
                .map_err(|e| RenderError::draw("drawing bars", e))?
                .label(country.as_str())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - swatch / 2), (x + swatch, y + swatch / 2)], color.filled())
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font((FONT, m.tick))
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(|e| RenderError::draw("drawing legend", e))?;

        root.present().map_err(|e| RenderError::draw("presenting drawing", e))?;

        Ok(())
    }

    /// One wedge per slice, labelled with its rounded percentage.
    pub fn draw_pie(&mut self, slices: &[PieSlice]) -> Result<(), RenderError> {
        if slices.is_empty() {
            return Err(RenderError::EmptyData(ChartKind::Pie));
        }

        let m = self.metrics();

        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(|e| RenderError::draw("filling background", e))?;

        let area = root
            .titled(&self.title, (FONT, m.title))
            .map_err(|e| RenderError::draw("drawing title", e))?;

        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        // Leave room around the circle for the outside labels
        let radius = w.min(h) as f64 * 0.32;

        let sizes: Vec<f64> = slices.iter().map(|s| s.value).collect();
        let colors: Vec<RGBColor> = (0..slices.len()).map(series_color).collect();
        let labels: Vec<String> = slices.iter().map(PieSlice::label).collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(PIE_START_ANGLE);
        pie.label_style((FONT, m.label).into_font().color(&BLACK));

        area.draw(&pie).map_err(|e| RenderError::draw("drawing pie", e))?;
        root.present().map_err(|e| RenderError::draw("presenting drawing", e))?;

        Ok(())
    }

    /// Finalize and encode the canvas as PNG, recording the DPI in `pHYs`
    pub fn render(self) -> Result<Vec<u8>, RenderError> {
        let ppm = pixels_per_meter(self.dpi);
        let mut png_bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_bytes, self.width, self.height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_pixel_dims(Some(png::PixelDimensions {
                xppu: ppm,
                yppu: ppm,
                unit: png::Unit::Meter,
            }));
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.buffer)?;
            writer.finish()?;
        }

        Ok(png_bytes)
    }
}

pub fn pixels_per_meter(dpi: u32) -> u32 {
    (dpi as f64 / 0.0254).round() as u32
}

/// Data extent plus 5% padding; single values get a unit margin
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

/// Bars grow from zero, so zero is always inside the value axis
fn bar_value_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min == max {
        return 0.0..1.0;
    }
    let padding = (max - min) * 0.05;
    let low = if min < 0.0 { min - padding } else { 0.0 };
    let high = if max > 0.0 { max + padding } else { 0.0 };
    low..high
}

/// Tick label for the cluster at integer position `x`, blank elsewhere
fn category_label(years: &[i32], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    years
        .get(idx as usize)
        .map(|year| year.to_string())
        .unwrap_or_default()
}
