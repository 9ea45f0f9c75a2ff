//! Chart models and rendering through plotters.

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Default colour cycle (tab10)
pub const TAB10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Five named colours: blue, green, red, orange, purple
pub const NAMED5: [RGBColor; 5] = [
    RGBColor(0, 0, 255),
    RGBColor(0, 128, 0),
    RGBColor(255, 0, 0),
    RGBColor(255, 165, 0),
    RGBColor(128, 0, 128),
];

/// Single-letter colours: b, g, r, c, m, y, k
pub const BASIC7: [RGBColor; 7] = [
    RGBColor(0, 0, 255),
    RGBColor(0, 128, 0),
    RGBColor(255, 0, 0),
    RGBColor(0, 191, 191),
    RGBColor(191, 0, 191),
    RGBColor(191, 191, 0),
    RGBColor(0, 0, 0),
];

pub fn cycle_color(palette: &[RGBColor], idx: usize) -> RGBColor {
    palette[idx % palette.len()]
}

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ImageFormat {
    #[default]
    Svg,
    Png,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }

    /// Format that will actually be written with the compiled feature set
    pub fn resolve(self) -> Self {
        if self == ImageFormat::Png && !cfg!(feature = "png") {
            tracing::warn!("PNG output needs the `png` cargo feature, writing SVG instead");
            ImageFormat::Svg
        } else {
            self
        }
    }
}

/// Anything that can draw itself onto a plotters drawing area
pub trait Chart {
    /// Image size in pixels
    fn size(&self) -> (u32, u32);

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static;
}

/// Render `chart` to `dir/stem.<ext>`, overwriting any existing file
pub fn render<C: Chart>(chart: &C, dir: &Path, stem: &str, format: ImageFormat) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    let path = dir.join(format!("{}.{}", stem, format.extension()));

    match format {
        ImageFormat::Svg => {
            let root = SVGBackend::new(&path, chart.size()).into_drawing_area();
            chart.draw(&root)?;
            root.present()
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        ImageFormat::Png => render_png(chart, &path)?,
    }

    Ok(path)
}

#[cfg(feature = "png")]
fn render_png<C: Chart>(chart: &C, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, chart.size()).into_drawing_area();
    chart.draw(&root)?;
    root.present()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(not(feature = "png"))]
fn render_png<C: Chart>(_chart: &C, path: &Path) -> Result<()> {
    anyhow::bail!(
        "Cannot write {}: built without the `png` feature",
        path.display()
    )
}

/// Line pattern of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// Point marker of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    None,
    Circle,
    Cross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPosition {
    UpperLeft,
    UpperRight,
}

/// One polyline on a [`LineChart`]
#[derive(Debug, Clone)]
pub struct Series {
    pub label: Option<String>,
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
    pub line: LineStyle,
    pub marker: Marker,
}

impl Series {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self {
            label: None,
            points,
            color: TAB10[0],
            line: LineStyle::Solid,
            marker: Marker::None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn color(mut self, color: RGBColor) -> Self {
        self.color = color;
        self
    }

    pub fn dashed(mut self) -> Self {
        self.line = LineStyle::Dashed;
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.marker = marker;
        self
    }
}

/// Cartesian line chart with optional legend
#[derive(Debug, Clone)]
pub struct LineChart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub series: Vec<Series>,
    /// Label only these x positions (integers only, e.g. thread counts)
    pub x_ticks: Option<Vec<f64>>,
    pub scientific_y: bool,
    pub y_from_zero: bool,
    pub legend: LegendPosition,
    /// Heading drawn as the first legend entry
    pub legend_title: Option<String>,
    pub size: (u32, u32),
}

impl LineChart {
    pub fn new(title: impl Into<String>, x_desc: impl Into<String>, y_desc: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_desc: x_desc.into(),
            y_desc: y_desc.into(),
            series: Vec::new(),
            x_ticks: None,
            scientific_y: false,
            y_from_zero: false,
            legend: LegendPosition::UpperRight,
            legend_title: None,
            size: (1000, 600),
        }
    }

    pub fn push(&mut self, series: Series) {
        self.series.push(series);
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_x_ticks(mut self, ticks: Vec<f64>) -> Self {
        self.x_ticks = Some(ticks);
        self
    }

    pub fn scientific_y(mut self) -> Self {
        self.scientific_y = true;
        self
    }

    pub fn y_from_zero(mut self) -> Self {
        self.y_from_zero = true;
        self
    }

    pub fn legend(mut self, position: LegendPosition) -> Self {
        self.legend = position;
        self
    }

    pub fn legend_title(mut self, title: impl Into<String>) -> Self {
        self.legend_title = Some(title.into());
        self
    }

    /// True when no series has any point
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }

    fn ranges(&self) -> (Range<f64>, Range<f64>) {
        let xs = self.series.iter().flat_map(|s| s.points.iter().map(|p| p.0));
        let ys = self.series.iter().flat_map(|s| s.points.iter().map(|p| p.1));
        let ticks = self.x_ticks.iter().flatten().copied();
        (padded_range(xs.chain(ticks), false), padded_range(ys, self.y_from_zero))
    }

    fn integer_ticks(&self) -> Option<Vec<f64>> {
        let ticks = self.x_ticks.as_ref()?;
        if ticks.is_empty() || ticks.iter().any(|t| !t.is_finite() || t.fract() != 0.0) {
            return None;
        }
        let mut ticks = ticks.clone();
        ticks.sort_by(f64::total_cmp);
        ticks.dedup();
        Some(ticks)
    }
}

/// Data range padded by 5% on each side; `0..1` when there is no finite value
pub fn padded_range(values: impl Iterator<Item = f64>, include_zero: bool) -> Range<f64> {
    let (mut lo, mut hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    let span = hi - lo;
    let pad = if span > 0.0 {
        span * 0.05
    } else if hi != 0.0 {
        hi.abs() * 0.05
    } else {
        1.0
    };
    (lo - pad)..(hi + pad)
}

/// Enough x labels for plotters to step by one across `range`
fn x_label_count(range: &Range<f64>) -> usize {
    (range.end - range.start).ceil().max(0.0) as usize + 2
}

fn scientific_label(y: &f64) -> String {
    format!("{:.1e}", y)
}

fn draw_line_chart<DB>(spec: &LineChart, area: &DrawingArea<DB, Shift>, caption_px: u32) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (x_range, y_range) = spec.ranges();
    let ticks = spec.integer_ticks();
    let tick_label = |x: &f64| match &ticks {
        Some(t) if t.iter().any(|v| (v - x).abs() < 1e-6) => format!("{:.0}", x),
        _ => String::new(),
    };

    let mut chart = ChartBuilder::on(area)
        .caption(&spec.title, ("sans-serif", caption_px))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range.clone(), y_range.clone())?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(spec.x_desc.as_str()).y_desc(spec.y_desc.as_str());
        if ticks.is_some() {
            mesh.x_labels(x_label_count(&x_range))
                .x_label_formatter(&tick_label)
                .disable_x_mesh();
        }
        if spec.scientific_y {
            mesh.y_label_formatter(&scientific_label);
        }
        mesh.draw()?;
    }

    // Grid lines only at the labelled positions
    if let Some(ticks) = &ticks {
        let grid = BLACK.mix(0.15);
        chart.draw_series(ticks.iter().map(|&t| {
            PathElement::new(vec![(t, y_range.start), (t, y_range.end)], grid)
        }))?;
    }

    let labelled = spec.series.iter().any(|s| s.label.is_some());
    if let (true, Some(title)) = (labelled, &spec.legend_title) {
        chart.draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?
            .label(title.as_str())
            .legend(|(x, y)| EmptyElement::at((x, y)));
    }

    for series in &spec.series {
        let style = series.color.stroke_width(2);

        match series.marker {
            Marker::None => {}
            Marker::Circle => {
                chart.draw_series(series.points.iter().map(|&p| Circle::new(p, 4, style.filled())))?;
            }
            Marker::Cross => {
                chart.draw_series(series.points.iter().map(|&p| Cross::new(p, 4, style)))?;
            }
        }

        let anno = match series.line {
            LineStyle::Solid => chart.draw_series(LineSeries::new(series.points.iter().copied(), style))?,
            LineStyle::Dashed => chart.draw_series(DashedLineSeries::new(
                series.points.iter().copied(),
                8,
                5,
                style,
            ))?,
        };

        if let Some(label) = &series.label {
            let color = series.color;
            anno.label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
    }

    if labelled {
        let position = match spec.legend {
            LegendPosition::UpperLeft => SeriesLabelPosition::UpperLeft,
            LegendPosition::UpperRight => SeriesLabelPosition::UpperRight,
        };
        chart.configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .position(position)
            .draw()?;
    }

    Ok(())
}

impl Chart for LineChart {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        draw_line_chart(self, root, 30)
    }
}

/// Line charts stacked vertically in one image
#[derive(Debug, Clone)]
pub struct Panels {
    pub charts: Vec<LineChart>,
    pub size: (u32, u32),
}

impl Panels {
    pub fn new(charts: Vec<LineChart>) -> Self {
        let height = 500 * charts.len().max(1) as u32;
        Self {
            charts,
            size: (1000, height),
        }
    }
}

impl Chart for Panels {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let areas = root.split_evenly((self.charts.len().max(1), 1));
        for (chart, area) in self.charts.iter().zip(areas.iter()) {
            draw_line_chart(chart, area, 22)?;
        }
        Ok(())
    }
}

/// One filled cell of a heat map, in data coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatCell {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub value: f64,
}

/// Colour-mapped grid with a colour bar, origin at the bottom left
#[derive(Debug, Clone)]
pub struct HeatMapChart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub colorbar_desc: String,
    pub extent: (f64, f64),
    pub value_range: (f64, f64),
    pub cells: Vec<HeatCell>,
    pub size: (u32, u32),
}

impl HeatMapChart {
    pub fn new(title: impl Into<String>, extent: (f64, f64), value_range: (f64, f64), cells: Vec<HeatCell>) -> Self {
        Self {
            title: title.into(),
            x_desc: "X".to_string(),
            y_desc: "Y".to_string(),
            colorbar_desc: String::new(),
            extent,
            value_range,
            cells,
            size: (800, 700),
        }
    }

    pub fn colorbar_desc(mut self, desc: impl Into<String>) -> Self {
        self.colorbar_desc = desc.into();
        self
    }

    fn normalize(&self, value: f64) -> f64 {
        let (lo, hi) = self.value_range;
        if hi > lo {
            (value - lo) / (hi - lo)
        } else {
            0.5
        }
    }
}

/// The `hot` colormap: black, red, yellow, white
pub fn hot(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    RGBColor(
        channel(t / 0.365),
        channel((t - 0.365) / 0.381),
        channel((t - 0.746) / 0.254),
    )
}

impl Chart for HeatMapChart {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let (width, _) = root.dim_in_pixel();
        let (main, bar) = root.split_horizontally((width as i32 - 120).max(1));

        let mut chart = ChartBuilder::on(&main)
            .caption(&self.title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..self.extent.0, 0f64..self.extent.1)?;

        chart.configure_mesh()
            .disable_mesh()
            .x_desc(self.x_desc.as_str())
            .y_desc(self.y_desc.as_str())
            .draw()?;

        chart.draw_series(self.cells.iter().map(|c| {
            Rectangle::new(
                [(c.x.0, c.y.0), (c.x.1, c.y.1)],
                hot(self.normalize(c.value)).filled(),
            )
        }))?;

        let (lo, hi) = self.value_range;
        let mut scale = ChartBuilder::on(&bar)
            .margin(10)
            .margin_top(50)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(0f64..1f64, lo..hi)?;

        scale.configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .y_desc(self.colorbar_desc.as_str())
            .draw()?;

        const STEPS: usize = 128;
        scale.draw_series((0..STEPS).map(|i| {
            let a = lo + (hi - lo) * i as f64 / STEPS as f64;
            let b = lo + (hi - lo) * (i + 1) as f64 / STEPS as f64;
            Rectangle::new([(0.0, a), (1.0, b)], hot((i as f64 + 0.5) / STEPS as f64).filled())
        }))?;

        Ok(())
    }
}
