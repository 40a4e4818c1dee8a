// 📊 Chart Geometry
//
// Pure transforms from snapshots/assets to 2-D plotting geometry, plus SVG
// rendering of that geometry. Nothing here touches storage.

pub mod allocation;
pub mod trend;

pub use allocation::{AllocationChart, AllocationGeometry, EmptyAllocation, PieSlice, PALETTE};
pub use trend::{DateLabel, GridLine, TrendChart, TrendGeometry};

use serde::Serialize;

/// Pixel size of a chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Dimensions { width, height }
    }
}

/// Inner padding between the SVG edge and the plot area
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Linear map from a data domain onto a pixel range.
///
/// A zero-width domain maps every input to the middle of the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        LinearScale { domain, range }
    }

    pub fn is_degenerate(&self) -> bool {
        (self.domain.1 - self.domain.0).abs() < f64::EPSILON
    }

    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if self.is_degenerate() {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }
}

/// Compact coordinate for SVG output: at most two decimals, no trailing zeros
pub(crate) fn coord(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

pub(crate) fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Centered message in an otherwise empty chart
pub(crate) fn placeholder_svg(width: f64, height: f64, message: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><text x="{x}" y="{y}" text-anchor="middle" font-size="14" fill="#6b7280">{msg}</text></svg>"##,
        w = coord(width),
        h = coord(height),
        x = coord(width / 2.0),
        y = coord(height / 2.0),
        msg = escape_xml(message),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_scale_maps_endpoints() {
        let scale = LinearScale::new((0.0, 100.0), (260.0, 20.0));
        assert_eq!(scale.apply(0.0), 260.0);
        assert_eq!(scale.apply(100.0), 20.0);
        assert_eq!(scale.apply(50.0), 140.0);
    }

    #[test]
    fn test_degenerate_scale_uses_midpoint() {
        let scale = LinearScale::new((5.0, 5.0), (260.0, 20.0));
        assert!(scale.is_degenerate());
        assert_eq!(scale.apply(5.0), 140.0);
        assert!(scale.apply(1e9).is_finite());
    }

    #[test]
    fn test_coord_formatting() {
        assert_eq!(coord(60.0), "60");
        assert_eq!(coord(12.5), "12.5");
        assert_eq!(coord(1.0 / 3.0), "0.33");
        assert_eq!(coord(-0.001), "0");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("R&D <fund>"), "R&amp;D &lt;fund&gt;");
    }
}
