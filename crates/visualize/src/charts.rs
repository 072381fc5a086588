//! Chart Primitives
//!
//! Pie, bar, histogram, box and scatter charts drawn onto a [`Canvas`].
//! Each function lays out its own frame from the canvas size and the
//! measured label widths, so callers only choose the canvas dimensions.

use crate::canvas::{hex, Align, Canvas, AXIS, BLACK, GRID, WHITE};
use feature_engine::{quantile_sorted, ColumnStats};
use image::Rgba;

pub const BLUE: &str = "#3498db";
pub const RED: &str = "#e74c3c";

/// Qualitative palette used for grouped series and box plots
pub const SET2: [&str; 8] = [
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494", "#b3b3b3",
];

const TITLE_SIZE: f32 = 22.0;
const LABEL_SIZE: f32 = 18.0;
const TICK_SIZE: f32 = 14.0;
const ANNOTATION_SIZE: f32 = 16.0;

const MARGIN_TOP: f32 = 60.0;
const MARGIN_RIGHT: f32 = 30.0;
const MARGIN_BOTTOM: f32 = 80.0;
const MARGIN_LEFT: f32 = 90.0;

/// Palette colour `i`, cycling
pub fn palette(i: usize) -> Rgba<u8> {
    hex(SET2[i % SET2.len()])
}

/// One named series of bar values, aligned with the chart's categories
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub color: Rgba<u8>,
    pub values: Vec<f64>,
}

/// Point cloud drawn in one colour
#[derive(Debug, Clone)]
pub struct ScatterSeries {
    pub label: String,
    pub color: Rgba<u8>,
    pub points: Vec<(f64, f64)>,
}

/// Pie appearance
#[derive(Debug, Clone)]
pub struct PieStyle {
    /// Slice colours, cycled
    pub colors: Vec<Rgba<u8>>,
    /// Radial offset of every slice as a fraction of the radius
    pub explode: f32,
    /// Print each slice's label next to it
    pub slice_labels: bool,
    /// Print each slice's share inside it
    pub percentages: bool,
    /// Legend entries; drawn to the right when slices are unlabelled
    pub legend: Option<Vec<String>>,
    /// Separator drawn between slices
    pub edge: Option<Rgba<u8>>,
}

/// Data rectangle in pixels
#[derive(Debug, Clone, Copy)]
struct Frame {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

impl Frame {
    fn inset(canvas: &Canvas, left: f32, bottom: f32) -> Self {
        Self {
            left,
            top: MARGIN_TOP,
            width: (canvas.width() as f32 - left - MARGIN_RIGHT).max(1.0),
            height: (canvas.height() as f32 - MARGIN_TOP - bottom).max(1.0),
        }
    }

    fn right(&self) -> f32 {
        self.left + self.width
    }

    fn bottom(&self) -> f32 {
        self.top + self.height
    }

    fn x(&self, value: f64, (lo, hi): (f64, f64)) -> f32 {
        let t = if hi > lo { (value - lo) / (hi - lo) } else { 0.0 };
        self.left + (t.clamp(0.0, 1.0) as f32) * self.width
    }

    fn y(&self, value: f64, (lo, hi): (f64, f64)) -> f32 {
        let t = if hi > lo { (value - lo) / (hi - lo) } else { 0.0 };
        self.bottom() - (t.clamp(0.0, 1.0) as f32) * self.height
    }
}

/// Tick values covering `[lo, hi]` at a round step, about `target` of them
pub fn ticks(lo: f64, hi: f64, target: usize) -> Vec<f64> {
    if !(hi > lo) || target == 0 {
        return vec![lo];
    }
    let raw = (hi - lo) / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = match raw / magnitude {
        n if n <= 1.0 => 1.0,
        n if n <= 2.0 => 2.0,
        n if n <= 2.5 => 2.5,
        n if n <= 5.0 => 5.0,
        _ => 10.0,
    } * magnitude;

    let first = (lo / step).ceil();
    (0..)
        .map(|k| (first + k as f64) * step)
        .take_while(|v| *v <= hi + step * 1e-9)
        .collect()
}

fn tick_label(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Smallest and largest finite value
fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Widen a range by `fraction` of its span on both ends
fn padded((lo, hi): (f64, f64), fraction: f64) -> (f64, f64) {
    let span = if hi > lo { hi - lo } else { 1.0 };
    (lo - span * fraction, hi + span * fraction)
}

fn title(canvas: &mut Canvas, text: &str) {
    let x = canvas.width() as f32 / 2.0;
    canvas.text(x, MARGIN_TOP / 2.0, TITLE_SIZE, BLACK, Align::Center, text);
}

fn axis_labels(canvas: &mut Canvas, frame: &Frame, x_label: &str, x_offset: f32, y_label: &str) {
    let cx = frame.left + frame.width / 2.0;
    canvas.text(cx, frame.bottom() + x_offset, LABEL_SIZE, BLACK, Align::Center, x_label);
    canvas.text_vertical(22.0, frame.top + frame.height / 2.0, LABEL_SIZE, BLACK, false, y_label);
}

/// Vertical grid lines with value labels under the frame
fn x_value_axis(canvas: &mut Canvas, frame: &Frame, range: (f64, f64), target: usize) {
    for tick in ticks(range.0, range.1, target) {
        let x = frame.x(tick, range);
        canvas.line((x, frame.top), (x, frame.bottom()), GRID);
        canvas.text(x, frame.bottom() + 14.0, TICK_SIZE, BLACK, Align::Center, &tick_label(tick));
    }
}

/// Horizontal grid lines with value labels left of the frame
fn y_value_axis(canvas: &mut Canvas, frame: &Frame, range: (f64, f64), target: usize) {
    for tick in ticks(range.0, range.1, target) {
        let y = frame.y(tick, range);
        canvas.line((frame.left, y), (frame.right(), y), GRID);
        canvas.text(frame.left - 8.0, y, TICK_SIZE, BLACK, Align::Right, &tick_label(tick));
    }
}

fn border(canvas: &mut Canvas, frame: &Frame) {
    canvas.stroke_rect(frame.left, frame.top, frame.width, frame.height, AXIS);
}

fn legend_size(canvas: &Canvas, entries: &[(String, Rgba<u8>)], heading: Option<&str>) -> (f32, f32) {
    let text_w = entries
        .iter()
        .map(|(label, _)| canvas.text_size(TICK_SIZE, label).0)
        .max()
        .unwrap_or(0) as f32;
    let heading_w = heading.map_or(0, |h| canvas.text_size(TICK_SIZE, h).0) as f32;
    let rows = entries.len() + usize::from(heading.is_some());
    ((text_w + 34.0).max(heading_w) + 16.0, rows as f32 * 22.0 + 12.0)
}

/// Boxed legend with its top-left corner at `(left, top)`
fn legend(canvas: &mut Canvas, left: f32, top: f32, entries: &[(String, Rgba<u8>)], heading: Option<&str>) {
    let (w, h) = legend_size(canvas, entries, heading);
    canvas.fill_rect(left, top, w, h, WHITE);
    canvas.stroke_rect(left, top, w, h, GRID);

    let mut y = top + 17.0;
    if let Some(heading) = heading {
        canvas.text(left + w / 2.0, y, TICK_SIZE, BLACK, Align::Center, heading);
        y += 22.0;
    }
    for (label, color) in entries {
        canvas.fill_rect(left + 8.0, y - 7.0, 20.0, 14.0, *color);
        canvas.text(left + 36.0, y, TICK_SIZE, BLACK, Align::Left, label);
        y += 22.0;
    }
}

fn legend_top_right(canvas: &mut Canvas, frame: &Frame, entries: &[(String, Rgba<u8>)], heading: Option<&str>) {
    let (w, _) = legend_size(canvas, entries, heading);
    legend(canvas, frame.right() - w - 10.0, frame.top + 10.0, entries, heading);
}

/// Pie chart starting at twelve o'clock and running counter-clockwise
pub fn pie(canvas: &mut Canvas, heading: &str, slices: &[(String, f64)], style: &PieStyle) {
    title(canvas, heading);
    let total: f64 = slices.iter().map(|(_, v)| v.max(0.0)).sum();
    if total <= 0.0 || style.colors.is_empty() {
        return;
    }

    let entries: Vec<(String, Rgba<u8>)> = style
        .legend
        .iter()
        .flatten()
        .enumerate()
        .map(|(i, label)| (label.clone(), style.colors[i % style.colors.len()]))
        .collect();
    let legend_outside = !entries.is_empty() && !style.slice_labels;
    let legend_w = if legend_outside {
        legend_size(canvas, &entries, None).0 + 30.0
    } else {
        0.0
    };

    let area_w = canvas.width() as f32 - legend_w;
    let area_h = canvas.height() as f32 - MARGIN_TOP;
    let (cx, cy) = (area_w / 2.0, MARGIN_TOP + area_h / 2.0);
    let radius = area_w.min(area_h) * 0.36;

    let mut start = 0.0f64;
    for (i, (label, value)) in slices.iter().enumerate() {
        let share = value.max(0.0) / total;
        let end = start + share;
        let color = style.colors[i % style.colors.len()];

        let mid = std::f64::consts::FRAC_PI_2 + (start + end) * std::f64::consts::PI;
        let (dir_x, dir_y) = (mid.cos() as f32, -(mid.sin() as f32));
        let (sx, sy) = (
            cx + dir_x * radius * style.explode,
            cy + dir_y * radius * style.explode,
        );
        fill_wedge(canvas, (sx, sy), radius, (start, end), color);

        if style.percentages {
            let text = format!("{:.1}%", share * 100.0);
            let (px, py) = (sx + dir_x * radius * 0.6, sy + dir_y * radius * 0.6);
            canvas.text(px, py, ANNOTATION_SIZE, BLACK, Align::Center, &text);
        }
        if style.slice_labels {
            let (lx, ly) = (sx + dir_x * radius * 1.1, sy + dir_y * radius * 1.1);
            let align = if dir_x >= 0.0 { Align::Left } else { Align::Right };
            canvas.text(lx, ly, ANNOTATION_SIZE, BLACK, align, label);
        }
        start = end;
    }

    if let Some(edge) = style.edge {
        let mut boundary = 0.0f64;
        for (_, value) in slices {
            let angle = std::f64::consts::FRAC_PI_2 + boundary * std::f64::consts::TAU;
            let to = (
                cx + angle.cos() as f32 * radius,
                cy - angle.sin() as f32 * radius,
            );
            canvas.thick_line((cx, cy), to, 2.0, edge);
            boundary += value.max(0.0) / total;
        }
    }

    if legend_outside {
        let (_, h) = legend_size(canvas, &entries, None);
        legend(canvas, area_w, cy - h / 2.0, &entries, None);
    } else if !entries.is_empty() {
        let (w, _) = legend_size(canvas, &entries, None);
        legend(canvas, canvas.width() as f32 - w - 12.0, MARGIN_TOP, &entries, None);
    }
}

/// Fill the part of a disk between two fractions of a full turn
fn fill_wedge(canvas: &mut Canvas, (cx, cy): (f32, f32), radius: f32, (from, to): (f64, f64), color: Rgba<u8>) {
    let r2 = radius * radius;
    let (x0, x1) = ((cx - radius).floor() as i64, (cx + radius).ceil() as i64);
    let (y0, y1) = ((cy - radius).floor() as i64, (cy + radius).ceil() as i64);
    for py in y0..=y1 {
        for px in x0..=x1 {
            let (dx, dy) = (px as f32 - cx, py as f32 - cy);
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let angle = (-dy as f64).atan2(dx as f64).to_degrees();
            let turn = (angle - 90.0).rem_euclid(360.0) / 360.0;
            if turn >= from && turn < to {
                canvas.put(px, py, color);
            }
        }
    }
}

/// Horizontal bars, first category at the bottom, values on `[0, x_max]`
///
/// Several series are drawn side by side within each category, the first
/// series lowest, with a legend.
pub fn horizontal_bars(
    canvas: &mut Canvas,
    heading: &str,
    (x_label, y_label): (&str, &str),
    categories: &[String],
    series: &[Series],
    x_max: f64,
    legend_heading: Option<&str>,
) {
    title(canvas, heading);
    let label_w = categories
        .iter()
        .map(|c| canvas.text_size(TICK_SIZE, c).0)
        .max()
        .unwrap_or(0) as f32;
    let frame = Frame::inset(canvas, label_w + 60.0, MARGIN_BOTTOM);
    let range = (0.0, x_max);

    x_value_axis(canvas, &frame, range, 5);
    if !categories.is_empty() && !series.is_empty() {
        let slot = frame.height / categories.len() as f32;
        let group = slot * 0.5;
        let bar = group / series.len() as f32;
        for (i, category) in categories.iter().enumerate() {
            let center = frame.bottom() - (i as f32 + 0.5) * slot;
            for (j, s) in series.iter().enumerate() {
                let value = s.values.get(i).copied().unwrap_or(0.0);
                let top = center + group / 2.0 - (j as f32 + 1.0) * bar;
                let length = frame.x(value, range) - frame.left;
                canvas.fill_rect(frame.left, top, length, bar, s.color);
            }
            canvas.text(frame.left - 8.0, center, TICK_SIZE, BLACK, Align::Right, category);
        }
    }
    border(canvas, &frame);
    axis_labels(canvas, &frame, x_label, 50.0, y_label);

    if series.len() > 1 {
        let entries: Vec<(String, Rgba<u8>)> =
            series.iter().map(|s| (s.label.clone(), s.color)).collect();
        legend_top_right(canvas, &frame, &entries, legend_heading);
    }
}

/// Vertical bars with vertical category labels
///
/// `y_max` fixes the value axis; otherwise it is fitted to the data.
pub fn vertical_bars(
    canvas: &mut Canvas,
    heading: &str,
    (x_label, y_label): (&str, &str),
    bars: &[(String, f64)],
    color: Rgba<u8>,
    y_max: Option<f64>,
) {
    title(canvas, heading);
    let label_h = bars
        .iter()
        .map(|(c, _)| canvas.text_size(TICK_SIZE, c).0)
        .max()
        .unwrap_or(0) as f32;
    let frame = Frame::inset(canvas, MARGIN_LEFT, label_h + 60.0);
    let top = y_max.unwrap_or_else(|| {
        extent(bars.iter().map(|(_, v)| *v)).map_or(1.0, |(_, hi)| (hi * 1.05).max(1.0))
    });
    let range = (0.0, top);

    y_value_axis(canvas, &frame, range, 5);
    if !bars.is_empty() {
        let slot = frame.width / bars.len() as f32;
        for (i, (category, value)) in bars.iter().enumerate() {
            let center = frame.left + (i as f32 + 0.5) * slot;
            let y = frame.y(*value, range);
            canvas.fill_rect(center - slot * 0.25, y, slot * 0.5, frame.bottom() - y, color);
            canvas.text_vertical(center, frame.bottom() + 8.0, TICK_SIZE, BLACK, true, category);
        }
    }
    border(canvas, &frame);
    axis_labels(canvas, &frame, x_label, label_h + 35.0, y_label);
}

/// Bin edges and counts over the data range
pub fn histogram_counts(values: &[f64], bins: usize) -> (Vec<f64>, Vec<usize>) {
    let Some((lo, hi)) = extent(values.iter().copied()) else {
        return (Vec::new(), Vec::new());
    };
    let bins = bins.max(1);
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + i as f64 * width).collect();

    let mut counts = vec![0usize; bins];
    for &v in values.iter().filter(|v| v.is_finite()) {
        // The last bin is closed on the right
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    (edges, counts)
}

/// Gaussian kernel density at each of `points`, bandwidth by Scott's rule
pub fn gaussian_kde(values: &[f64], points: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0; points.len()];
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let bandwidth = var.sqrt() * (n as f64).powf(-0.2);
    if bandwidth <= 0.0 {
        return vec![0.0; points.len()];
    }

    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    points
        .iter()
        .map(|&x| {
            values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm
        })
        .collect()
}

/// Histogram with an optional density curve scaled to counts
pub fn histogram(
    canvas: &mut Canvas,
    heading: &str,
    (x_label, y_label): (&str, &str),
    values: &[f64],
    bins: usize,
    color: Rgba<u8>,
    kde: bool,
) {
    title(canvas, heading);
    let frame = Frame::inset(canvas, MARGIN_LEFT, MARGIN_BOTTOM);
    let (edges, counts) = histogram_counts(values, bins);
    let (Some(&lo), Some(&hi)) = (edges.first(), edges.last()) else {
        border(canvas, &frame);
        axis_labels(canvas, &frame, x_label, 50.0, y_label);
        return;
    };

    let max_count = counts.iter().copied().max().unwrap_or(0) as f64;
    let y_range = (0.0, (max_count * 1.05).max(1.0));
    let x_range = padded((lo, hi), 0.02);

    x_value_axis(canvas, &frame, x_range, 6);
    y_value_axis(canvas, &frame, y_range, 5);
    for (i, &count) in counts.iter().enumerate() {
        let (x0, x1) = (frame.x(edges[i], x_range), frame.x(edges[i + 1], x_range));
        let y = frame.y(count as f64, y_range);
        canvas.fill_rect(x0, y, x1 - x0, frame.bottom() - y, color);
        canvas.stroke_rect(x0, y, x1 - x0, frame.bottom() - y, WHITE);
    }

    if kde {
        let bin_width = edges[1] - edges[0];
        let n = values.len() as f64;
        let steps = 200;
        let xs: Vec<f64> = (0..=steps)
            .map(|i| lo + (hi - lo) * i as f64 / steps as f64)
            .collect();
        let density = gaussian_kde(values, &xs);
        let curve: Vec<(f32, f32)> = xs
            .iter()
            .zip(&density)
            .map(|(&x, &d)| (frame.x(x, x_range), frame.y(d * n * bin_width, y_range)))
            .collect();
        let line = darken(color, 0.7);
        for pair in curve.windows(2) {
            canvas.thick_line(pair[0], pair[1], 2.5, line);
        }
    }
    border(canvas, &frame);
    axis_labels(canvas, &frame, x_label, 50.0, y_label);
}

fn darken(color: Rgba<u8>, factor: f32) -> Rgba<u8> {
    let scale = |c: u8| (c as f32 * factor).round() as u8;
    Rgba([scale(color[0]), scale(color[1]), scale(color[2]), color[3]])
}

/// Five-number summary with whiskers at the furthest points within 1.5 IQR
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let stats = ColumnStats::compute(values);
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let low_fence = stats.q1 - 1.5 * stats.iqr();
        let high_fence = stats.q3 + 1.5 * stats.iqr();
        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|v| *v >= low_fence)
            .unwrap_or(stats.q1);
        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= high_fence)
            .unwrap_or(stats.q3);

        Some(Self {
            lower_whisker,
            q1: stats.q1,
            median: quantile_sorted(&sorted, 0.5),
            q3: stats.q3,
            upper_whisker,
        })
    }
}

/// Box plot per group, outliers not drawn
pub fn box_plot(
    canvas: &mut Canvas,
    heading: &str,
    (x_label, y_label): (&str, &str),
    groups: &[(String, Vec<f64>)],
) {
    title(canvas, heading);
    let label_h = groups
        .iter()
        .map(|(c, _)| canvas.text_size(TICK_SIZE, c).0)
        .max()
        .unwrap_or(0) as f32;
    let frame = Frame::inset(canvas, MARGIN_LEFT, label_h + 60.0);

    let boxes: Vec<Option<BoxStats>> = groups.iter().map(|(_, v)| BoxStats::from_values(v)).collect();
    let range = extent(
        boxes
            .iter()
            .flatten()
            .flat_map(|b| [b.lower_whisker, b.upper_whisker]),
    )
    .map_or((0.0, 1.0), |r| padded(r, 0.05));

    y_value_axis(canvas, &frame, range, 6);
    if !groups.is_empty() {
        let slot = frame.width / groups.len() as f32;
        for (i, ((label, _), stats)) in groups.iter().zip(&boxes).enumerate() {
            let center = frame.left + (i as f32 + 0.5) * slot;
            if let Some(b) = stats {
                let half = slot * 0.4;
                let (q1, q3) = (frame.y(b.q1, range), frame.y(b.q3, range));
                let (lo, hi) = (frame.y(b.lower_whisker, range), frame.y(b.upper_whisker, range));
                let median = frame.y(b.median, range);

                canvas.line((center, hi), (center, q3), AXIS);
                canvas.line((center, q1), (center, lo), AXIS);
                canvas.line((center - half / 2.0, hi), (center + half / 2.0, hi), AXIS);
                canvas.line((center - half / 2.0, lo), (center + half / 2.0, lo), AXIS);
                canvas.fill_rect(center - half, q3, half * 2.0, q1 - q3, palette(i));
                canvas.stroke_rect(center - half, q3, half * 2.0, q1 - q3, AXIS);
                canvas.thick_line((center - half, median), (center + half, median), 2.0, AXIS);
            }
            canvas.text_vertical(center, frame.bottom() + 8.0, TICK_SIZE, BLACK, true, label);
        }
    }
    border(canvas, &frame);
    axis_labels(canvas, &frame, x_label, label_h + 35.0, y_label);
}

/// Scatter plot with translucent markers and a legend
pub fn scatter(
    canvas: &mut Canvas,
    heading: &str,
    (x_label, y_label): (&str, &str),
    series: &[ScatterSeries],
    alpha: f32,
    legend_heading: Option<&str>,
) {
    title(canvas, heading);
    let frame = Frame::inset(canvas, MARGIN_LEFT, MARGIN_BOTTOM);
    let points = || series.iter().flat_map(|s| s.points.iter());
    let x_range = extent(points().map(|p| p.0)).map_or((0.0, 1.0), |r| padded(r, 0.05));
    let y_range = extent(points().map(|p| p.1)).map_or((0.0, 1.0), |r| padded(r, 0.05));

    x_value_axis(canvas, &frame, x_range, 6);
    y_value_axis(canvas, &frame, y_range, 6);
    for s in series {
        for &(x, y) in &s.points {
            canvas.blend_disk(frame.x(x, x_range), frame.y(y, y_range), 3.5, s.color, alpha);
        }
    }
    border(canvas, &frame);
    axis_labels(canvas, &frame, x_label, 50.0, y_label);

    let entries: Vec<(String, Rgba<u8>)> = series.iter().map(|s| (s.label.clone(), s.color)).collect();
    if !entries.is_empty() {
        legend_top_right(canvas, &frame, &entries, legend_heading);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_color(canvas: &Canvas, color: Rgba<u8>) -> usize {
        canvas.image().pixels().filter(|p| **p == color).count()
    }

    #[test]
    fn test_ticks_round_steps() {
        assert_eq!(ticks(0.0, 100.0, 5), vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
        assert_eq!(ticks(0.0, 50.0, 5), vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0]);
        let t = ticks(17.0, 90.0, 6);
        assert_eq!(t.first(), Some(&20.0));
        assert_eq!(t.last(), Some(&80.0));
        assert_eq!(ticks(3.0, 3.0, 5), vec![3.0]);
    }

    #[test]
    fn test_histogram_counts_cover_all_values() {
        let values: Vec<f64> = (17..=90).map(f64::from).collect();
        let (edges, counts) = histogram_counts(&values, 20);
        assert_eq!(edges.len(), 21);
        assert_eq!(counts.iter().sum::<usize>(), values.len());
        assert_eq!(edges[0], 17.0);
        assert!((edges[20] - 90.0).abs() < 1e-9);
        // Maximum lands in the last bin
        assert!(counts[19] > 0);
    }

    #[test]
    fn test_histogram_constant_values() {
        let (edges, counts) = histogram_counts(&[5.0, 5.0, 5.0], 4);
        assert_eq!(edges.len(), 5);
        assert_eq!(counts.iter().sum::<usize>(), 3);
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let values = [1.0, 2.0, 2.5, 3.0, 7.0, 8.0];
        let xs: Vec<f64> = (0..=2000).map(|i| -20.0 + i as f64 * 0.025).collect();
        let density = gaussian_kde(&values, &xs);
        let area: f64 = density.iter().sum::<f64>() * 0.025;
        assert!((area - 1.0).abs() < 1e-3, "area = {}", area);
        assert!(density.iter().all(|d| *d >= 0.0));
    }

    #[test]
    fn test_kde_degenerate_input() {
        assert_eq!(gaussian_kde(&[1.0], &[0.0, 1.0]), vec![0.0, 0.0]);
        assert_eq!(gaussian_kde(&[2.0, 2.0], &[2.0]), vec![0.0]);
    }

    #[test]
    fn test_box_stats_whiskers_exclude_outliers() {
        let mut values: Vec<f64> = (1..=20).map(f64::from).collect();
        values.push(100.0);
        let b = BoxStats::from_values(&values).unwrap();
        assert_eq!(b.median, 11.0);
        assert_eq!(b.q1, 6.0);
        assert_eq!(b.q3, 16.0);
        assert_eq!(b.lower_whisker, 1.0);
        assert_eq!(b.upper_whisker, 20.0);
        assert!(BoxStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_pie_draws_both_slices() {
        let mut canvas = Canvas::new(400, 300, None);
        let style = PieStyle {
            colors: vec![hex(BLUE), hex(RED)],
            explode: 0.05,
            slice_labels: true,
            percentages: true,
            legend: None,
            edge: None,
        };
        let slices = vec![("a".to_string(), 3.0), ("b".to_string(), 1.0)];
        pie(&mut canvas, "Pie", &slices, &style);

        let blue = count_color(&canvas, hex(BLUE)) as f64;
        let red = count_color(&canvas, hex(RED)) as f64;
        assert!(red > 0.0);
        let ratio = blue / red;
        assert!((ratio - 3.0).abs() < 0.2, "ratio = {}", ratio);
    }

    #[test]
    fn test_pie_first_slice_starts_at_top() {
        let mut canvas = Canvas::new(300, 360, None);
        let style = PieStyle {
            colors: vec![hex(BLUE), hex(RED)],
            explode: 0.0,
            slice_labels: false,
            percentages: false,
            legend: None,
            edge: None,
        };
        pie(&mut canvas, "", &[("a".into(), 1.0), ("b".into(), 3.0)], &style);
        // Counter-clockwise from twelve o'clock: the first quarter is upper left
        let (cx, cy) = (150, 60 + 150);
        assert_eq!(*canvas.image().get_pixel(cx - 40, cy - 40), hex(BLUE));
        assert_eq!(*canvas.image().get_pixel(cx + 40, cy - 40), hex(RED));
    }

    #[test]
    fn test_horizontal_bar_lengths_scale() {
        let mut canvas = Canvas::new(600, 400, None);
        let categories = vec!["long".to_string(), "short".to_string()];
        let series = vec![Series {
            label: ">50K".to_string(),
            color: hex(BLUE),
            values: vec![80.0, 20.0],
        }];
        horizontal_bars(&mut canvas, "", ("x", "y"), &categories, &series, 100.0, None);

        let frame = Frame::inset(&canvas, 60.0, MARGIN_BOTTOM);
        let slot = frame.height / 2.0;
        let row = |i: f32| (frame.bottom() - (i + 0.5) * slot) as u32;
        let width_at = |y: u32| {
            (0..canvas.width())
                .filter(|&x| *canvas.image().get_pixel(x, y) == hex(BLUE))
                .count() as f32
        };
        let (long, short) = (width_at(row(0.0)), width_at(row(1.0)));
        assert!((long / short - 4.0).abs() < 0.1, "{} vs {}", long, short);
    }

    #[test]
    fn test_empty_inputs_do_not_panic() {
        let mut canvas = Canvas::new(300, 200, None);
        histogram(&mut canvas, "", ("", ""), &[], 20, hex(BLUE), true);
        box_plot(&mut canvas, "", ("", ""), &[]);
        scatter(&mut canvas, "", ("", ""), &[], 0.5, None);
        vertical_bars(&mut canvas, "", ("", ""), &[], hex(BLUE), None);
        horizontal_bars(&mut canvas, "", ("", ""), &[], &[], 100.0, None);
        let style = PieStyle {
            colors: Vec::new(),
            explode: 0.0,
            slice_labels: false,
            percentages: false,
            legend: None,
            edge: None,
        };
        pie(&mut canvas, "", &[], &style);
    }

    #[test]
    fn test_scatter_blends_overlaps() {
        let mut canvas = Canvas::new(300, 300, None);
        let series = vec![ScatterSeries {
            label: "a".to_string(),
            color: hex(RED),
            points: vec![(0.0, 0.0), (1.0, 1.0), (1.0, 1.0)],
        }];
        scatter(&mut canvas, "", ("", ""), &series, 0.5, None);
        assert!(canvas.image().pixels().any(|p| p[1] < 140 && p[0] > 200));
    }
}
