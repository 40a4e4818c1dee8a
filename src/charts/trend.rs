// Net worth trend: two polylines (total and liquid assets) over time

use serde::Serialize;
use std::fmt;

use super::{coord, escape_xml, placeholder_svg, Dimensions, LinearScale, Margin, Point};
use crate::entities::NetWorthSnapshot;
use crate::format::{format_currency, format_month_year};
use crate::net_worth::sort_by_date;

pub const TREND_MARGIN: Margin = Margin {
    top: 20.0,
    right: 30.0,
    bottom: 40.0,
    left: 60.0,
};

pub const DEFAULT_TREND_SIZE: Dimensions = Dimensions {
    width: 600.0,
    height: 300.0,
};

/// Intervals between horizontal gridlines (lines = intervals + 1)
pub const GRID_INTERVALS: usize = 5;

pub const MAX_DATE_LABELS: usize = 6;

pub const TOTAL_COLOR: &str = "#3b82f6";
pub const LIQUID_COLOR: &str = "#10b981";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLine {
    pub value: f64,
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateLabel {
    /// Index into the date-sorted snapshots
    pub index: usize,
    pub x: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendGeometry {
    pub dimensions: Dimensions,
    pub margin: Margin,
    pub total_points: Vec<Point>,
    pub liquid_points: Vec<Point>,
    pub grid_lines: Vec<GridLine>,
    pub date_labels: Vec<DateLabel>,
    pub min_value: f64,
    pub max_value: f64,
    /// Series values of the most recent snapshot
    pub latest_total: f64,
    pub latest_liquid: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrendChart {
    /// Fewer than two snapshots: nothing to draw
    Placeholder { dimensions: Dimensions },
    Plot(TrendGeometry),
}

impl TrendChart {
    pub const PLACEHOLDER_MESSAGE: &'static str = "Need at least 2 data points to show trend";

    /// Lay out the chart; snapshots are sorted by date first
    pub fn build(snapshots: &[NetWorthSnapshot], dimensions: Dimensions) -> Self {
        if snapshots.len() < 2 {
            return TrendChart::Placeholder { dimensions };
        }

        let sorted = sort_by_date(snapshots);
        let margin = TREND_MARGIN;
        let Dimensions { width, height } = dimensions;

        let min_time = sorted[0].date.timestamp_millis() as f64;
        let max_time = sorted[sorted.len() - 1].date.timestamp_millis() as f64;
        let x_scale = LinearScale::new((min_time, max_time), (margin.left, width - margin.right));

        let (min_value, max_value) = sorted
            .iter()
            .flat_map(|s| [s.total_assets, s.liquid_assets])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let y_scale = LinearScale::new((min_value, max_value), (height - margin.bottom, margin.top));

        let project = |s: &NetWorthSnapshot, value: f64| Point {
            x: x_scale.apply(s.date.timestamp_millis() as f64),
            y: y_scale.apply(value),
        };

        let total_points = sorted.iter().map(|s| project(s, s.total_assets)).collect();
        let liquid_points = sorted.iter().map(|s| project(s, s.liquid_assets)).collect();

        let grid_lines = if y_scale.is_degenerate() {
            vec![GridLine {
                value: min_value,
                y: y_scale.apply(min_value),
                label: format_currency(min_value),
            }]
        } else {
            (0..=GRID_INTERVALS)
                .map(|i| {
                    let value = min_value + (max_value - min_value) * i as f64 / GRID_INTERVALS as f64;
                    GridLine {
                        value,
                        y: y_scale.apply(value),
                        label: format_currency(value),
                    }
                })
                .collect()
        };

        let n = sorted.len();
        let label_count = MAX_DATE_LABELS.min(n);
        let date_labels = (0..label_count)
            .map(|i| {
                let index = i * (n - 1) / (label_count - 1);
                let snapshot = &sorted[index];
                DateLabel {
                    index,
                    x: x_scale.apply(snapshot.date.timestamp_millis() as f64),
                    label: format_month_year(&snapshot.date),
                }
            })
            .collect();

        let latest = &sorted[n - 1];

        TrendChart::Plot(TrendGeometry {
            dimensions,
            margin,
            total_points,
            liquid_points,
            grid_lines,
            date_labels,
            min_value,
            max_value,
            latest_total: latest.total_assets,
            latest_liquid: latest.liquid_assets,
        })
    }

    pub fn geometry(&self) -> Option<&TrendGeometry> {
        match self {
            TrendChart::Plot(geometry) => Some(geometry),
            TrendChart::Placeholder { .. } => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, TrendChart::Placeholder { .. })
    }

    pub fn to_svg(&self) -> String {
        match self {
            TrendChart::Placeholder { dimensions } => {
                placeholder_svg(dimensions.width, dimensions.height, Self::PLACEHOLDER_MESSAGE)
            }
            TrendChart::Plot(geometry) => geometry.to_svg(),
        }
    }
}

impl TrendGeometry {
    pub fn total_path(&self) -> String {
        line_path(&self.total_points)
    }

    pub fn liquid_path(&self) -> String {
        line_path(&self.liquid_points)
    }

    pub fn to_svg(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TrendGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Dimensions { width, height } = self.dimensions;
        let m = self.margin;

        write!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = coord(width),
            h = coord(height),
        )?;

        // Grid lines and value labels
        for line in &self.grid_lines {
            write!(
                f,
                r##"<line x1="{x1}" y1="{y}" x2="{x2}" y2="{y}" stroke="#e5e7eb" stroke-width="1"/>"##,
                x1 = coord(m.left),
                x2 = coord(width - m.right),
                y = coord(line.y),
            )?;
            write!(
                f,
                r##"<text x="{x}" y="{y}" text-anchor="end" font-size="12" fill="#6b7280">{label}</text>"##,
                x = coord(m.left - 10.0),
                y = coord(line.y + 4.0),
                label = escape_xml(&line.label),
            )?;
        }

        for label in &self.date_labels {
            write!(
                f,
                r##"<text x="{x}" y="{y}" text-anchor="middle" font-size="12" fill="#6b7280">{label}</text>"##,
                x = coord(label.x),
                y = coord(height - 10.0),
                label = escape_xml(&label.label),
            )?;
        }

        // Axes
        write!(
            f,
            r##"<line x1="{x}" y1="{top}" x2="{x}" y2="{bottom}" stroke="#d1d5db" stroke-width="2"/>"##,
            x = coord(m.left),
            top = coord(m.top),
            bottom = coord(height - m.bottom),
        )?;
        write!(
            f,
            r##"<line x1="{left}" y1="{y}" x2="{right}" y2="{y}" stroke="#d1d5db" stroke-width="2"/>"##,
            left = coord(m.left),
            right = coord(width - m.right),
            y = coord(height - m.bottom),
        )?;

        for (path, color) in [(self.total_path(), TOTAL_COLOR), (self.liquid_path(), LIQUID_COLOR)] {
            write!(
                f,
                r#"<path d="{path}" stroke="{color}" stroke-width="3" fill="none" stroke-linecap="round" stroke-linejoin="round"/>"#,
            )?;
        }

        for (points, color) in [(&self.total_points, TOTAL_COLOR), (&self.liquid_points, LIQUID_COLOR)] {
            for p in points {
                write!(
                    f,
                    r#"<circle cx="{x}" cy="{y}" r="4" fill="{color}"/>"#,
                    x = coord(p.x),
                    y = coord(p.y),
                )?;
            }
        }

        // Legend
        write!(
            f,
            r##"<circle cx="{x1}" cy="10" r="5" fill="{TOTAL_COLOR}"/><text x="{t1}" y="14" font-size="12" fill="#374151">Total Assets {total}</text><circle cx="{x2}" cy="10" r="5" fill="{LIQUID_COLOR}"/><text x="{t2}" y="14" font-size="12" fill="#374151">Liquid Assets {liquid}</text>"##,
            x1 = coord(m.left + 5.0),
            t1 = coord(m.left + 14.0),
            x2 = coord(m.left + 205.0),
            t2 = coord(m.left + 214.0),
            total = escape_xml(&format_currency(self.latest_total)),
            liquid = escape_xml(&format_currency(self.latest_liquid)),
        )?;

        f.write_str("</svg>")
    }
}

/// `M x y L x y ...` through the points in order
fn line_path(points: &[Point]) -> String {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} {} {}", if i == 0 { 'M' } else { 'L' }, coord(p.x), coord(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}
