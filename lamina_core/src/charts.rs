//! # Charts
//!
//! A small x-y chart model and its Typst rendering. Charts are drawn with
//! Typst primitives (`curve`, `line`, `circle`) inside a fixed-size box, so
//! the report needs no plotting backend or image files.
//!
//! ## Example
//!
//! ```rust
//! use lamina_core::charts::{Chart, LineStyle, Marker, Series, SeriesStyle};
//!
//! let chart = Chart::new("Beam deflection", "Blade length (m)", "Deflection (mm)")
//!     .with_series(Series::new(
//!         "Tip load",
//!         vec![(0.0, 0.0), (0.15, -5.0), (0.3, -16.0)],
//!         SeriesStyle::line("#1f77b4", LineStyle::Solid),
//!     ));
//!
//! let markup = chart.to_typst(400.0, 240.0);
//! assert!(markup.contains("curve("));
//! ```

use serde::{Deserialize, Serialize};

use crate::pdf::escape_typst;

// Plot area margins inside the chart box (pt)
const MARGIN_LEFT: f64 = 48.0;
const MARGIN_RIGHT: f64 = 12.0;
const MARGIN_TOP: f64 = 16.0;
const MARGIN_BOTTOM: f64 = 34.0;

const TARGET_TICKS: f64 = 6.0;
const MARKER_HALF: f64 = 2.5;

/// Stroke pattern of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    Solid,
    Dashed,
    /// Markers only
    None,
}

/// Marker drawn at each data point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    None,
    Plus,
    Dot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStyle {
    /// Hex color, e.g. "#d62728"
    pub color: String,
    pub line: LineStyle,
    pub marker: Marker,
}

impl SeriesStyle {
    pub fn line(color: &str, line: LineStyle) -> Self {
        SeriesStyle {
            color: color.to_string(),
            line,
            marker: Marker::None,
        }
    }

    pub fn markers(color: &str, marker: Marker) -> Self {
        SeriesStyle {
            color: color.to_string(),
            line: LineStyle::None,
            marker,
        }
    }
}

/// One labelled data series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub style: SeriesStyle,
}

impl Series {
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>, style: SeriesStyle) -> Self {
        Series {
            label: label.into(),
            points,
            style,
        }
    }
}

/// An x-y line chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    /// Draw a horizontal reference line at y = 0
    pub zero_line: bool,
}

/// Axis range with tick positions
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub ticks: Vec<f64>,
    /// Decimals for tick labels
    pub decimals: usize,
}

impl Axis {
    /// Build an axis covering `[lo, hi]` with rounded tick steps.
    ///
    /// Degenerate ranges (all values equal, or no values) are widened so the
    /// axis always has a positive span.
    pub fn covering(lo: f64, hi: f64) -> Self {
        let (mut lo, mut hi) = if lo.is_finite() && hi.is_finite() { (lo, hi) } else { (0.0, 1.0) };

        if (hi - lo).abs() <= f64::EPSILON * hi.abs().max(lo.abs()).max(1e-300) {
            let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
            lo -= pad;
            hi += pad;
        }

        let step = nice_step((hi - lo) / TARGET_TICKS);
        let min = (lo / step).floor() * step;
        let max = (hi / step).ceil() * step;

        let count = ((max - min) / step).round() as usize;
        let ticks = (0..=count).map(|k| min + step * k as f64).collect();

        let decimals = if step >= 1.0 {
            0
        } else {
            (-step.log10().floor()) as usize
        };

        Axis { min, max, ticks, decimals }
    }

    fn span(&self) -> f64 {
        self.max - self.min
    }

    fn format_tick(&self, value: f64) -> String {
        // Avoid "-0.00"
        let value = if value.abs() < 1e-12 * self.span() { 0.0 } else { value };
        format!("{:.*}", self.decimals, value)
    }
}

/// Round a raw step up to 1, 2 or 5 times a power of ten.
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

impl Chart {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Chart {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            series: Vec::new(),
            zero_line: false,
        }
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_zero_line(mut self) -> Self {
        self.zero_line = true;
        self
    }

    /// Data bounds over all finite points: (x_min, x_max, y_min, y_max)
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self
            .series
            .iter()
            .flat_map(|s| s.points.iter())
            .filter(|(x, y)| x.is_finite() && y.is_finite());

        let &(x0, y0) = points.next()?;
        let init = (x0, x0, y0, y0);
        Some(points.fold(init, |(x_lo, x_hi, y_lo, y_hi), &(x, y)| {
            (x_lo.min(x), x_hi.max(x), y_lo.min(y), y_hi.max(y))
        }))
    }

    /// Axes covering the data, with y = 0 included when a zero line is drawn.
    pub fn axes(&self) -> (Axis, Axis) {
        let (x_lo, x_hi, mut y_lo, mut y_hi) = self.bounds().unwrap_or((0.0, 1.0, 0.0, 1.0));
        if self.zero_line {
            y_lo = y_lo.min(0.0);
            y_hi = y_hi.max(0.0);
        }
        (Axis::covering(x_lo, x_hi), Axis::covering(y_lo, y_hi))
    }

    /// Render the chart as Typst markup: a titled block holding the plot box
    /// followed by a legend row.
    pub fn to_typst(&self, width_pt: f64, height_pt: f64) -> String {
        let (x_axis, y_axis) = self.axes();

        let plot_w = width_pt - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = height_pt - MARGIN_TOP - MARGIN_BOTTOM;

        let px = |x: f64| MARGIN_LEFT + (x - x_axis.min) / x_axis.span() * plot_w;
        let py = |y: f64| MARGIN_TOP + (y_axis.max - y) / y_axis.span() * plot_h;

        let mut out = String::new();

        out.push_str(&format!(
            "#align(center)[#text(size: 11pt, weight: \"bold\")[{}]]\n",
            escape_typst(&self.title)
        ));
        out.push_str(&format!("#align(center)[#box(width: {width_pt:.1}pt, height: {height_pt:.1}pt, {{\n"));

        // Grid and tick labels
        for &tick in &x_axis.ticks {
            let x = px(tick);
            out.push_str(&format!(
                "  place(top + left, line(start: ({x:.2}pt, {top:.2}pt), end: ({x:.2}pt, {bottom:.2}pt), stroke: 0.25pt + luma(220)))\n",
                top = MARGIN_TOP,
                bottom = MARGIN_TOP + plot_h,
            ));
            out.push_str(&format!(
                "  place(top + left, dx: {dx:.2}pt, dy: {dy:.2}pt, box(width: 40pt, align(center, text(size: 7pt)[{label}])))\n",
                dx = x - 20.0,
                dy = MARGIN_TOP + plot_h + 3.0,
                label = x_axis.format_tick(tick),
            ));
        }
        for &tick in &y_axis.ticks {
            let y = py(tick);
            out.push_str(&format!(
                "  place(top + left, line(start: ({left:.2}pt, {y:.2}pt), end: ({right:.2}pt, {y:.2}pt), stroke: 0.25pt + luma(220)))\n",
                left = MARGIN_LEFT,
                right = MARGIN_LEFT + plot_w,
            ));
            out.push_str(&format!(
                "  place(top + left, dx: 0pt, dy: {dy:.2}pt, box(width: {w:.2}pt, align(right, text(size: 7pt)[{label}])))\n",
                dy = y - 4.0,
                w = MARGIN_LEFT - 4.0,
                label = y_axis.format_tick(tick),
            ));
        }

        // Frame
        out.push_str(&format!(
            "  place(top + left, dx: {MARGIN_LEFT:.2}pt, dy: {MARGIN_TOP:.2}pt, rect(width: {plot_w:.2}pt, height: {plot_h:.2}pt, stroke: 0.5pt))\n"
        ));

        if self.zero_line && y_axis.min < 0.0 && y_axis.max > 0.0 {
            let y = py(0.0);
            out.push_str(&format!(
                "  place(top + left, line(start: ({left:.2}pt, {y:.2}pt), end: ({right:.2}pt, {y:.2}pt), stroke: 0.5pt + gray))\n",
                left = MARGIN_LEFT,
                right = MARGIN_LEFT + plot_w,
            ));
        }

        // Axis labels
        out.push_str(&format!(
            "  place(top + left, dx: {MARGIN_LEFT:.2}pt, dy: {dy:.2}pt, box(width: {plot_w:.2}pt, align(center, text(size: 8pt)[{label}])))\n",
            dy = height_pt - 12.0,
            label = escape_typst(&self.x_label),
        ));
        out.push_str(&format!(
            "  place(top + left, dx: 0pt, dy: 0pt, text(size: 8pt)[{}])\n",
            escape_typst(&self.y_label)
        ));

        for series in &self.series {
            let points: Vec<(f64, f64)> = series
                .points
                .iter()
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .map(|&(x, y)| (px(x), py(y)))
                .collect();
            out.push_str(&series_typst(&points, &series.style));
        }

        out.push_str("})]\n");
        out.push_str(&self.legend_typst());
        out
    }

    fn legend_typst(&self) -> String {
        if self.series.is_empty() {
            return String::new();
        }

        let entries: Vec<String> = self
            .series
            .iter()
            .map(|s| {
                let color = &s.style.color;
                let swatch = match (s.style.line, s.style.marker) {
                    (LineStyle::Solid, _) => format!("box(line(length: 16pt, stroke: 1pt + rgb(\"{color}\")))"),
                    (LineStyle::Dashed, _) => format!(
                        "box(line(length: 16pt, stroke: (paint: rgb(\"{color}\"), thickness: 1pt, dash: \"dashed\")))"
                    ),
                    (LineStyle::None, Marker::Plus) => format!("text(fill: rgb(\"{color}\"))[\\+]"),
                    (LineStyle::None, _) => format!("box(circle(radius: 2pt, fill: rgb(\"{color}\"), stroke: none))"),
                };
                format!("[#{swatch} #text(size: 8pt)[{}]]", escape_typst(&s.label))
            })
            .collect();

        format!(
            "#align(center)[#grid(columns: {}, column-gutter: 12pt, align: horizon, {})]\n",
            entries.len(),
            entries.join(", ")
        )
    }
}

fn series_typst(points: &[(f64, f64)], style: &SeriesStyle) -> String {
    let mut out = String::new();
    let color = &style.color;

    let stroke = match style.line {
        LineStyle::Solid => Some(format!("(paint: rgb(\"{color}\"), thickness: 1pt)")),
        LineStyle::Dashed => Some(format!("(paint: rgb(\"{color}\"), thickness: 1pt, dash: \"dashed\")")),
        LineStyle::None => None,
    };

    if let (Some(stroke), Some(((x0, y0), rest))) = (stroke, points.split_first()) {
        if !rest.is_empty() {
            out.push_str(&format!("  place(top + left, curve(stroke: {stroke}, curve.move(({x0:.2}pt, {y0:.2}pt))"));
            for (x, y) in rest {
                out.push_str(&format!(", curve.line(({x:.2}pt, {y:.2}pt))"));
            }
            out.push_str("))\n");
        }
    }

    for &(x, y) in points {
        match style.marker {
            Marker::None => {}
            Marker::Plus => {
                out.push_str(&format!(
                    "  place(top + left, line(start: ({:.2}pt, {y:.2}pt), end: ({:.2}pt, {y:.2}pt), stroke: 0.75pt + rgb(\"{color}\")))\n",
                    x - MARKER_HALF,
                    x + MARKER_HALF,
                ));
                out.push_str(&format!(
                    "  place(top + left, line(start: ({x:.2}pt, {:.2}pt), end: ({x:.2}pt, {:.2}pt), stroke: 0.75pt + rgb(\"{color}\")))\n",
                    y - MARKER_HALF,
                    y + MARKER_HALF,
                ));
            }
            Marker::Dot => {
                out.push_str(&format!(
                    "  place(top + left, dx: {:.2}pt, dy: {:.2}pt, circle(radius: 1.5pt, fill: rgb(\"{color}\"), stroke: none))\n",
                    x - 1.5,
                    y - 1.5,
                ));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tip_chart() -> Chart {
        Chart::new("Beam deflection", "Blade length (m)", "Deflection (mm)")
            .with_series(Series::new(
                "Tip load",
                vec![(0.0, 0.0), (0.1, -2.2), (0.2, -8.3), (0.3, -16.0)],
                SeriesStyle::line("#1f77b4", LineStyle::Solid),
            ))
            .with_zero_line()
    }

    #[test]
    fn test_nice_step() {
        assert!((nice_step(0.047) - 0.05).abs() < 1e-12);
        assert!((nice_step(3.0) - 5.0).abs() < 1e-12);
        assert!((nice_step(0.0011) - 0.002).abs() < 1e-12);
        assert!((nice_step(7.5) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_axis_covers_range() {
        let axis = Axis::covering(-16.0, 0.0);
        assert!(axis.min <= -16.0);
        assert!(axis.max >= 0.0);
        assert!(axis.ticks.len() >= 3, "too few ticks: {:?}", axis.ticks);
    }

    #[test]
    fn test_degenerate_axis_is_widened() {
        let flat = Axis::covering(0.0, 0.0);
        assert!(flat.max > flat.min);

        let constant = Axis::covering(-2.0, -2.0);
        assert!(constant.max > constant.min);
        assert!(constant.min <= -2.0 && constant.max >= -2.0);
    }

    #[test]
    fn test_tiny_values_keep_precision() {
        // Micrometre-scale deflections in metres
        let axis = Axis::covering(-3.2e-6, 0.0);
        assert!(axis.max > axis.min);
        assert!(axis.decimals >= 6);
    }

    #[test]
    fn test_bounds_skip_non_finite() {
        let chart = Chart::new("t", "x", "y").with_series(Series::new(
            "s",
            vec![(0.0, 1.0), (1.0, f64::NAN), (2.0, -1.0)],
            SeriesStyle::line("#000000", LineStyle::Solid),
        ));
        assert_eq!(chart.bounds(), Some((0.0, 2.0, -1.0, 1.0)));
    }

    #[test]
    fn test_to_typst_contains_series_and_legend() {
        let markup = tip_chart().to_typst(400.0, 240.0);
        assert!(markup.contains("Beam deflection"));
        assert!(markup.contains("curve.move"));
        assert!(markup.contains("curve.line"));
        assert!(markup.contains("Tip load"));
        assert!(markup.contains("#1f77b4"));
    }

    #[test]
    fn test_markers_rendered() {
        let chart = Chart::new("Fit", "x", "y").with_series(Series::new(
            "Linear fit",
            vec![(0.0, 0.0), (1.0, 1.0)],
            SeriesStyle::markers("#d62728", Marker::Dot),
        ));
        let markup = chart.to_typst(300.0, 200.0);
        assert_eq!(markup.matches("circle(radius: 1.5pt").count(), 2);
        assert!(!markup.contains("curve("));
    }

    #[test]
    fn test_empty_chart_renders() {
        let markup = Chart::new("Empty", "x", "y").to_typst(300.0, 200.0);
        assert!(markup.contains("box(width: 300.0pt"));
    }

    #[test]
    fn test_labels_escaped() {
        let chart = Chart::new("Case #1", "x_m", "y");
        let markup = chart.to_typst(300.0, 200.0);
        assert!(markup.contains("Case \\#1"));
        assert!(markup.contains("x\\_m"));
    }
}
