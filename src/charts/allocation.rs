// Asset allocation donut
//
// Slices keep the input order and cycle through a fixed palette by index.

use serde::Serialize;
use std::f64::consts::PI;
use std::fmt;

use super::{coord, escape_xml, placeholder_svg, Dimensions, Point};
use crate::entities::Asset;
use crate::format::{format_currency, format_percentage};

pub const PALETTE: [&str; 10] = [
    "#3b82f6", // blue
    "#10b981", // green
    "#f59e0b", // amber
    "#ef4444", // red
    "#8b5cf6", // violet
    "#06b6d4", // cyan
    "#84cc16", // lime
    "#f97316", // orange
    "#ec4899", // pink
    "#6366f1", // indigo
];

pub const DEFAULT_ALLOCATION_SIZE: Dimensions = Dimensions {
    width: 400.0,
    height: 300.0,
};

/// Space left around the pie for labels
const RADIUS_INSET: f64 = 60.0;

/// Donut hole radius relative to the pie radius
const HOLE_RATIO: f64 = 0.3;

const FULL_TURN: f64 = 2.0 * PI;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
    pub percentage: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub color: &'static str,
}

impl PieSlice {
    pub fn span(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    /// SVG large-arc flag: set when the slice covers more than half the circle
    pub fn large_arc(&self) -> bool {
        self.span() > PI
    }

    /// Closed wedge path from the arc back to the center
    pub fn arc_path(&self, center: Point, radius: f64) -> String {
        let start = polar_to_cartesian(center, radius, self.start_angle);
        let end = polar_to_cartesian(center, radius, self.end_angle);
        let r = coord(radius);

        if self.span() >= FULL_TURN - 1e-9 {
            // Start and end coincide; a single arc command would draw nothing
            let mid = polar_to_cartesian(center, radius, self.start_angle + PI);
            return format!(
                "M {} {} A {r} {r} 0 1 1 {} {} A {r} {r} 0 1 1 {} {} Z",
                coord(start.x),
                coord(start.y),
                coord(mid.x),
                coord(mid.y),
                coord(end.x),
                coord(end.y),
            );
        }

        format!(
            "M {} {} A {r} {r} 0 {} 1 {} {} L {} {} Z",
            coord(start.x),
            coord(start.y),
            if self.large_arc() { 1 } else { 0 },
            coord(end.x),
            coord(end.y),
            coord(center.x),
            coord(center.y),
        )
    }
}

pub fn polar_to_cartesian(center: Point, radius: f64, angle: f64) -> Point {
    Point {
        x: center.x + radius * angle.cos(),
        y: center.y + radius * angle.sin(),
    }
}

/// Why there is nothing to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyAllocation {
    NoAssets,
    NoPositiveValues,
}

impl EmptyAllocation {
    pub fn message(&self) -> &'static str {
        match self {
            EmptyAllocation::NoAssets => "No assets to display",
            EmptyAllocation::NoPositiveValues => "No assets with positive values",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationGeometry {
    pub dimensions: Dimensions,
    pub center: Point,
    pub radius: f64,
    pub hole_radius: f64,
    pub total: f64,
    pub slices: Vec<PieSlice>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AllocationChart {
    Placeholder {
        dimensions: Dimensions,
        reason: EmptyAllocation,
    },
    Donut(AllocationGeometry),
}

impl AllocationChart {
    pub fn build(assets: &[Asset], dimensions: Dimensions) -> Self {
        if assets.is_empty() {
            return AllocationChart::Placeholder {
                dimensions,
                reason: EmptyAllocation::NoAssets,
            };
        }

        let positive: Vec<&Asset> = assets.iter().filter(|a| a.value > 0.0).collect();
        if positive.is_empty() {
            return AllocationChart::Placeholder {
                dimensions,
                reason: EmptyAllocation::NoPositiveValues,
            };
        }

        let total: f64 = positive.iter().map(|a| a.value).sum();

        let mut current_angle = 0.0;
        let slices = positive
            .iter()
            .enumerate()
            .map(|(index, asset)| {
                let percentage = asset.value / total * 100.0;
                let start_angle = current_angle;
                let end_angle = start_angle + percentage / 100.0 * FULL_TURN;
                current_angle = end_angle;

                PieSlice {
                    name: asset.name.clone(),
                    value: asset.value,
                    percentage,
                    start_angle,
                    end_angle,
                    color: PALETTE[index % PALETTE.len()],
                }
            })
            .collect();

        let center = Point {
            x: dimensions.width / 2.0,
            y: dimensions.height / 2.0,
        };
        let radius = (center.x.min(center.y) - RADIUS_INSET).max(0.0);

        AllocationChart::Donut(AllocationGeometry {
            dimensions,
            center,
            radius,
            hole_radius: radius * HOLE_RATIO,
            total,
            slices,
        })
    }

    pub fn geometry(&self) -> Option<&AllocationGeometry> {
        match self {
            AllocationChart::Donut(geometry) => Some(geometry),
            AllocationChart::Placeholder { .. } => None,
        }
    }

    pub fn to_svg(&self) -> String {
        match self {
            AllocationChart::Placeholder { dimensions, reason } => {
                placeholder_svg(dimensions.width, dimensions.height, reason.message())
            }
            AllocationChart::Donut(geometry) => geometry.to_svg(),
        }
    }
}

impl AllocationGeometry {
    /// Legend rows: name, formatted value, formatted percentage, color
    pub fn legend(&self) -> Vec<(String, String, String, &'static str)> {
        self.slices
            .iter()
            .map(|s| {
                (
                    s.name.clone(),
                    format_currency(s.value),
                    format_percentage(s.percentage),
                    s.color,
                )
            })
            .collect()
    }

    pub fn to_svg(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AllocationGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Dimensions { width, height } = self.dimensions;

        write!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = coord(width),
            h = coord(height),
        )?;

        for slice in &self.slices {
            write!(
                f,
                r##"<path d="{d}" fill="{color}" stroke="#ffffff" stroke-width="2"><title>{name} {pct}</title></path>"##,
                d = slice.arc_path(self.center, self.radius),
                color = slice.color,
                name = escape_xml(&slice.name),
                pct = format_percentage(slice.percentage),
            )?;
        }

        write!(
            f,
            r##"<circle cx="{cx}" cy="{cy}" r="{r}" fill="#ffffff" stroke="#e5e7eb" stroke-width="1"/>"##,
            cx = coord(self.center.x),
            cy = coord(self.center.y),
            r = coord(self.hole_radius),
        )?;
        write!(
            f,
            r##"<text x="{x}" y="{y1}" text-anchor="middle" font-size="14" font-weight="bold" fill="#374151">{total}</text><text x="{x}" y="{y2}" text-anchor="middle" font-size="12" fill="#6b7280">Total Assets</text>"##,
            x = coord(self.center.x),
            y1 = coord(self.center.y - 5.0),
            y2 = coord(self.center.y + 10.0),
            total = escape_xml(&format_currency(self.total)),
        )?;

        f.write_str("</svg>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn asset(name: &str, value: f64) -> Asset {
        Asset::new(name, value, false, Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_placeholders() {
        let chart = AllocationChart::build(&[], DEFAULT_ALLOCATION_SIZE);
        assert!(matches!(
            chart,
            AllocationChart::Placeholder { reason: EmptyAllocation::NoAssets, .. }
        ));
        assert!(chart.to_svg().contains("No assets to display"));

        let chart = AllocationChart::build(&[asset("Old", 0.0), asset("Neg", -5.0)], DEFAULT_ALLOCATION_SIZE);
        assert!(matches!(
            chart,
            AllocationChart::Placeholder { reason: EmptyAllocation::NoPositiveValues, .. }
        ));
        assert!(chart.geometry().is_none());
    }

    #[test]
    fn test_slices_keep_input_order() {
        let assets = vec![asset("Small", 25.0), asset("Zero", 0.0), asset("Big", 75.0)];
        let chart = AllocationChart::build(&assets, DEFAULT_ALLOCATION_SIZE);
        let g = chart.geometry().unwrap();

        assert_eq!(g.total, 100.0);
        assert_eq!(g.slices.len(), 2);
        assert_eq!(g.slices[0].name, "Small");
        assert_eq!(g.slices[0].start_angle, 0.0);
        assert!((g.slices[0].end_angle - PI / 2.0).abs() < 1e-12);
        assert_eq!(g.slices[1].start_angle, g.slices[0].end_angle);
        assert!((g.slices[1].percentage - 75.0).abs() < 1e-12);

        assert!(!g.slices[0].large_arc());
        assert!(g.slices[1].large_arc());
    }

    #[test]
    fn test_colors_cycle_through_palette() {
        let assets: Vec<_> = (0..12).map(|i| asset(&format!("A{}", i), 1.0)).collect();
        let chart = AllocationChart::build(&assets, DEFAULT_ALLOCATION_SIZE);
        let g = chart.geometry().unwrap();

        assert_eq!(g.slices[0].color, PALETTE[0]);
        assert_eq!(g.slices[9].color, PALETTE[9]);
        assert_eq!(g.slices[10].color, PALETTE[0]);
        assert_eq!(g.slices[11].color, PALETTE[1]);
    }

    #[test]
    fn test_radius_and_hole() {
        let chart = AllocationChart::build(&[asset("A", 1.0)], DEFAULT_ALLOCATION_SIZE);
        let g = chart.geometry().unwrap();

        assert_eq!(g.center, Point { x: 200.0, y: 150.0 });
        assert_eq!(g.radius, 90.0);
        assert!((g.hole_radius - 27.0).abs() < 1e-12);
    }

    #[test]
    fn test_radius_clamped_on_tiny_canvas() {
        let chart = AllocationChart::build(&[asset("A", 1.0)], Dimensions::new(80.0, 80.0));
        assert_eq!(chart.geometry().unwrap().radius, 0.0);
    }

    #[test]
    fn test_arc_path_quarter() {
        let slice = PieSlice {
            name: "Q".to_string(),
            value: 1.0,
            percentage: 25.0,
            start_angle: 0.0,
            end_angle: PI / 2.0,
            color: PALETTE[0],
        };

        let path = slice.arc_path(Point { x: 200.0, y: 150.0 }, 90.0);
        assert_eq!(path, "M 290 150 A 90 90 0 0 1 200 240 L 200 150 Z");
    }

    #[test]
    fn test_single_asset_draws_full_circle() {
        let chart = AllocationChart::build(&[asset("Everything", 10.0)], DEFAULT_ALLOCATION_SIZE);
        let g = chart.geometry().unwrap();
        let path = g.slices[0].arc_path(g.center, g.radius);

        assert_eq!(path.matches(" A ").count(), 2);
        assert!(path.contains("110 150"));
    }

    #[test]
    fn test_svg_shows_total() {
        let assets = vec![asset("Primary Home", 450000.0), asset("Savings Account", 25000.0)];
        let svg = AllocationChart::build(&assets, DEFAULT_ALLOCATION_SIZE).to_svg();

        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("€475,000"));
        assert!(svg.contains("Total Assets"));
    }

    #[test]
    fn test_legend_rows() {
        let assets = vec![asset("Home", 75.0), asset("Cash", 25.0)];
        let chart = AllocationChart::build(&assets, DEFAULT_ALLOCATION_SIZE);
        let legend = chart.geometry().unwrap().legend();

        assert_eq!(legend[0], ("Home".to_string(), "€75".to_string(), "75.0%".to_string(), PALETTE[0]));
        assert_eq!(legend[1].2, "25.0%");
    }

    proptest! {
        #[test]
        fn prop_slices_cover_full_circle(values in prop::collection::vec(0.01f64..1e6, 1..30)) {
            let assets: Vec<_> = values.iter().map(|v| asset("A", *v)).collect();
            let chart = AllocationChart::build(&assets, DEFAULT_ALLOCATION_SIZE);
            let g = chart.geometry().unwrap();

            let spans: f64 = g.slices.iter().map(|s| s.span()).sum();
            let percentages: f64 = g.slices.iter().map(|s| s.percentage).sum();

            prop_assert!((spans - FULL_TURN).abs() < 1e-9);
            prop_assert!((percentages - 100.0).abs() < 1e-9);
            prop_assert!((g.slices.last().unwrap().end_angle - FULL_TURN).abs() < 1e-9);
        }
    }
}
