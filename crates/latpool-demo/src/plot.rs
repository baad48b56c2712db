//! Static SVG charts for both demos.

use crate::compare::sweep::ComparisonPoint;
use anyhow::Context;
use latpool::TimingSeries;
use plotters::prelude::*;
use std::path::Path;

const CHART_SIZE: (u32, u32) = (800, 400);

/// Draws one line of per-task processing time (seconds) against the request
/// index and writes it to `path`.
///
/// # Errors
///
/// Returns an error if the chart cannot be rendered or the file cannot be
/// written.
pub fn plot_processing_times(series: &TimingSeries, path: &Path) -> anyhow::Result<()> {
    let secs = series.as_secs_f64();
    let points: Vec<(f64, f64)> = secs
        .iter()
        .enumerate()
        .map(|(i, &y)| (i as f64, y))
        .collect();

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Request Processing Times", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_extent(points.len()), 0f64..y_extent(&secs))?;

    chart
        .configure_mesh()
        .x_desc("Request ID")
        .y_desc("Time (seconds)")
        .draw()?;

    chart.draw_series(LineSeries::new(points, &BLUE))?;

    root.present()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Draws total batch time (seconds) against batch size for the sequential
/// baseline and the worker pool, and writes the chart to `path`.
///
/// # Errors
///
/// Returns an error if the chart cannot be rendered or the file cannot be
/// written.
pub fn plot_latency_comparison(points: &[ComparisonPoint], path: &Path) -> anyhow::Result<()> {
    let sequential: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (p.batch_size as f64, p.sequential_ms / 1_000.0))
        .collect();
    let pooled: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (p.batch_size as f64, p.pool_ms / 1_000.0))
        .collect();

    let x_max = points.iter().map(|p| p.batch_size).max().unwrap_or(0);
    let y_values: Vec<f64> = sequential.iter().chain(&pooled).map(|&(_, y)| y).collect();

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Latency Comparison", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_extent(x_max), 0f64..y_extent(&y_values))?;

    chart
        .configure_mesh()
        .x_desc("Number of Requests")
        .y_desc("Total Time (seconds)")
        .draw()?;

    chart
        .draw_series(LineSeries::new(sequential, &RED))?
        .label("Sequential")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

    chart
        .draw_series(LineSeries::new(pooled, &BLUE))?
        .label("Worker Pool")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

// Plotters rejects empty ranges, so both axes get a minimum extent.
fn x_extent(len: usize) -> f64 {
    len.max(1) as f64
}

fn y_extent(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max > 0.0 { max * 1.1 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("latpool-plot-{}-{name}.svg", std::process::id()))
    }

    #[test]
    fn writes_processing_chart() {
        let path = temp_path("processing");
        let series = TimingSeries::from(vec![
            Duration::from_millis(12),
            Duration::from_millis(8),
            Duration::from_millis(15),
        ]);

        plot_processing_times(&series, &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Request Processing Times"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn writes_empty_processing_chart() {
        let path = temp_path("empty");
        plot_processing_times(&TimingSeries::empty(), &path).unwrap();
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn writes_comparison_chart() {
        let path = temp_path("comparison");
        let points = vec![
            ComparisonPoint::new(100, Duration::from_millis(500), Duration::from_millis(60)),
            ComparisonPoint::new(200, Duration::from_millis(1_000), Duration::from_millis(110)),
        ];

        plot_latency_comparison(&points, &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Latency Comparison"));
        assert!(svg.contains("Worker Pool"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let path = temp_path("missing-dir").join("chart.svg");
        assert!(plot_processing_times(&TimingSeries::empty(), &path).is_err());
    }

    #[test]
    fn extents_never_collapse() {
        assert_eq!(x_extent(0), 1.0);
        assert_eq!(y_extent(&[]), 1.0);
        assert!((y_extent(&[2.0, 1.0]) - 2.2).abs() < 1e-9);
    }
}
