use core::time::Duration;
use latpool::{WorkerPool, Workload, run_sequential};
use serde::Serialize;
use std::{fs::File, io::BufWriter, path::Path, time::Instant};

/// Wall-clock totals for one batch size under both execution models.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub batch_size: usize,
    pub sequential_ms: f64,
    pub pool_ms: f64,
    pub speedup: f64,
}

impl ComparisonPoint {
    pub fn new(batch_size: usize, sequential: Duration, pooled: Duration) -> Self {
        let sequential_ms = sequential.as_secs_f64() * 1_000.0;
        let pool_ms = pooled.as_secs_f64() * 1_000.0;
        let speedup = if pool_ms > 0.0 {
            sequential_ms / pool_ms
        } else {
            f64::INFINITY
        };
        Self {
            batch_size,
            sequential_ms,
            pool_ms,
            speedup,
        }
    }
}

/// Runs each batch size once sequentially and once through `pool`, in that
/// order, and returns the totals.
///
/// `workload` must match the pool's workload for the comparison to be fair.
///
/// # Errors
///
/// Propagates the first error from either execution model.
pub async fn run_sweep(
    pool: &WorkerPool,
    workload: &Workload,
    batch_sizes: &[usize],
) -> latpool::Result<Vec<ComparisonPoint>> {
    let mut points = Vec::with_capacity(batch_sizes.len());

    for &batch_size in batch_sizes {
        let sequential = run_sequential(workload, batch_size).await?;

        let start = Instant::now();
        let series = pool.run_batch(batch_size, None).await?;
        let pooled = start.elapsed();

        let point = ComparisonPoint::new(batch_size, sequential.elapsed, pooled);
        tracing::info!(
            batch_size,
            tasks = series.len(),
            sequential_ms = point.sequential_ms,
            pool_ms = point.pool_ms,
            "Batch compared"
        );
        println!(
            "N={batch_size} sequential={:.2}ms pool={:.2}ms speedup={:.1}x",
            point.sequential_ms, point.pool_ms, point.speedup
        );
        points.push(point);
    }

    Ok(points)
}

/// Writes the sweep results to `path` as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_report(points: &[ComparisonPoint], path: &Path) -> anyhow::Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, points)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use latpool::PoolConfig;

    #[test]
    fn speedup_is_ratio_of_totals() {
        let point = ComparisonPoint::new(10, Duration::from_millis(300), Duration::from_millis(100));
        assert!((point.speedup - 3.0).abs() < 1e-9);
        assert!((point.sequential_ms - 300.0).abs() < 1e-9);

        let instant = ComparisonPoint::new(0, Duration::ZERO, Duration::ZERO);
        assert!(instant.speedup.is_infinite());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn pool_wins_once_batches_outgrow_the_workers() {
        let workload = Workload::sleep(Duration::from_millis(2), Duration::from_millis(4));
        let pool = WorkerPool::new(
            PoolConfig::new(workload.clone())
                .with_num_workers(10)
                .with_queue_capacity(100),
        )
        .unwrap();

        let points = run_sweep(&pool, &workload, &[20, 40]).await.unwrap();

        assert_eq!(points.len(), 2);
        for point in &points {
            assert!(
                point.pool_ms < point.sequential_ms,
                "N={}: pool {}ms vs sequential {}ms",
                point.batch_size,
                point.pool_ms,
                point.sequential_ms
            );
        }
    }

    #[test]
    fn report_is_json_array() {
        let path = std::env::temp_dir().join(format!("latpool-report-{}.json", std::process::id()));
        let points = vec![ComparisonPoint::new(100, Duration::from_millis(400), Duration::from_millis(50))];

        write_report(&points, &path).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed[0]["batch_size"], 100);
        let speedup = parsed[0]["speedup"].as_f64().unwrap();
        assert!((speedup - 8.0).abs() < 1e-6);
        let _ = std::fs::remove_file(&path);
    }
}
