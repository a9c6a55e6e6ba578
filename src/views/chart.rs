//! Renders a (timestamp, value) series as an SVG line chart with `plotters`.

use crate::error::{ErrorType, IntoResult};
use crate::views::trend::TrendPoint;
use crate::Result;
use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use plotters::prelude::*;
use plotters::style::FontTransform;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 480;
const FONT: &str = "sans-serif";

/// Describes a line chart with a fixed y range.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub y_min: f64,
    pub y_max: f64,
}

impl LineChart {
    /// The gas consumption chart. The y range is the band the gas meter counter lives in for this
    /// deployment.
    pub fn gas() -> Self {
        Self {
            title: "Gas Consumption Over Time".into(),
            x_label: "Date".into(),
            y_label: "Gas".into(),
            y_min: 45000.0,
            y_max: 58000.0,
        }
    }

    /// Renders `points`, which must be sorted by time, as an SVG document: a line through all
    /// points with a circle at each one and x labels rotated by 90 degrees. An empty series renders
    /// only the axes.
    pub fn render_svg(&self, points: &[(DateTime<Utc>, f64)]) -> Result<String> {
        let mut svg = String::new();
        self.draw(points, &mut svg)
            .map_err(|e| anyhow!("Unable to draw '{}': {e}", self.title))
            .pub_result(ErrorType::Service)?;
        Ok(svg)
    }

    /// Renders a gas series.
    pub fn render_trend(&self, series: &[TrendPoint]) -> Result<String> {
        let points: Vec<(DateTime<Utc>, f64)> = series.iter().map(|p| (p.date, p.gas)).collect();
        self.render_svg(&points)
    }

    fn draw(
        &self,
        points: &[(DateTime<Utc>, f64)],
        svg: &mut String,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let root = SVGBackend::with_string(svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, (FONT, 20))
            .margin(12)
            .x_label_area_size(110)
            .y_label_area_size(70)
            .build_cartesian_2d(RangedDateTime::from(time_range(points)), self.y_min..self.y_max)?;

        chart
            .configure_mesh()
            .x_desc(&self.x_label)
            .y_desc(&self.y_label)
            .x_labels(points.len().clamp(2, 20))
            .x_label_formatter(&|t: &DateTime<Utc>| t.format("%Y-%m-%d").to_string())
            .x_label_style((FONT, 11).into_font().transform(FontTransform::Rotate90))
            .draw()?;

        chart.draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))?;
        chart.draw_series(
            points
                .iter()
                .map(|&(t, v)| Circle::new((t, v), 3, BLUE.filled())),
        )?;

        root.present()?;
        Ok(())
    }
}

/// The x range covering `points`. A single point or an empty series gets a day of padding on each
/// side so the range is never empty.
fn time_range(points: &[(DateTime<Utc>, f64)]) -> std::ops::Range<DateTime<Utc>> {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if first.0 < last.0 => first.0..last.0,
        (Some(only), _) => only.0 - Duration::days(1)..only.0 + Duration::days(1),
        _ => {
            let now = Utc::now();
            now - Duration::days(1)..now + Duration::days(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_one_marker_per_point() {
        let svg = LineChart::gas()
            .render_svg(&[(day(1), 50000.0), (day(2), 50100.0), (day(9), 51000.0)])
            .unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("Gas Consumption Over Time"));
        assert!(svg.contains("rotate("));
    }

    #[test]
    fn test_axis_descriptions() {
        let svg = LineChart::gas().render_svg(&[(day(1), 50000.0)]).unwrap();
        assert!(svg.contains(">Date<"));
        assert!(svg.contains(">Gas<"));
        // Ticks fall somewhere in the padded range around the single point.
        assert!(svg.contains("2024-01-0") || svg.contains("2023-12-31"));
    }

    #[test]
    fn test_empty_series() {
        let svg = LineChart::gas().render_svg(&[]).unwrap();
        assert_eq!(svg.matches("<circle").count(), 0);
        assert!(svg.contains("Gas Consumption Over Time"));
    }

    #[test]
    fn test_time_range_is_never_empty() {
        let single = time_range(&[(day(5), 1.0)]);
        assert_eq!(single.start, day(4));
        assert_eq!(single.end, day(6));

        let many = time_range(&[(day(1), 1.0), (day(9), 1.0)]);
        assert_eq!(many, day(1)..day(9));

        let empty = time_range(&[]);
        assert!(empty.start < empty.end);
    }

    #[test]
    fn test_render_trend() {
        let series = vec![TrendPoint {
            date: day(1),
            gas: 50000.0,
        }];
        let svg = LineChart::gas().render_trend(&series).unwrap();
        assert_eq!(svg.matches("<circle").count(), 1);
    }
}
