use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use latpool::{DEFAULT_NUM_WORKERS, MAX_BATCH_SIZE_LIMIT, PoolConfig, Workload};
use std::path::PathBuf;

/// Runtime configuration for the `latpool-compare` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "latpool-compare",
    version,
    about = "Compares sequential execution with a worker pool across batch sizes"
)]
pub struct CompareArgs {
    /// Number of workers in the pool.
    #[arg(long, env = "NUM_WORKERS", default_value_t = DEFAULT_NUM_WORKERS)]
    pub workers: usize,

    /// Capacity of the pool's task queue. Sized to the largest batch by
    /// default so dispatch never waits.
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = 1_000)]
    pub queue_capacity: usize,

    /// First batch size of the sweep.
    #[arg(long, default_value_t = 100)]
    pub start: usize,

    /// Last batch size of the sweep (inclusive).
    #[arg(long, default_value_t = 1_000)]
    pub end: usize,

    /// Increment between batch sizes.
    #[arg(long, default_value_t = 100)]
    pub step: usize,

    /// Shortest simulated I/O wait per task, in milliseconds.
    #[arg(long, default_value_t = 1)]
    pub min_sleep_ms: u64,

    /// Longest simulated I/O wait per task, in milliseconds.
    #[arg(long, default_value_t = 5)]
    pub max_sleep_ms: u64,

    /// Where the comparison chart is written.
    #[arg(long, env = "PLOT_PATH", default_value = "latency_comparison.svg")]
    pub plot_path: PathBuf,

    /// Optional JSON file receiving one entry per batch size.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CompareConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub batch_sizes: Vec<usize>,
    pub workload: Workload,
    pub plot_path: PathBuf,
    pub report: Option<PathBuf>,
}

impl CompareConfig {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.workload.clone())
            .with_num_workers(self.workers)
            .with_queue_capacity(self.queue_capacity)
            .with_max_batch_size(self.batch_sizes.iter().copied().max().unwrap_or(1))
    }
}

impl TryFrom<CompareArgs> for CompareConfig {
    type Error = anyhow::Error;

    fn try_from(args: CompareArgs) -> Result<Self, Self::Error> {
        if args.workers == 0 {
            bail!("--workers must be greater than 0");
        }

        if args.queue_capacity == 0 {
            bail!("--queue-capacity must be greater than 0");
        }

        if args.step == 0 {
            bail!("--step must be greater than 0");
        }

        if args.start == 0 || args.start > args.end {
            bail!(
                "invalid sweep range {}..={} (start must be positive and not exceed end)",
                args.start,
                args.end
            );
        }

        if args.end > MAX_BATCH_SIZE_LIMIT {
            bail!("--end ({}) exceeds the batch size limit of {MAX_BATCH_SIZE_LIMIT}", args.end);
        }

        if args.min_sleep_ms > args.max_sleep_ms {
            bail!(
                "--min-sleep-ms ({}) exceeds --max-sleep-ms ({})",
                args.min_sleep_ms,
                args.max_sleep_ms
            );
        }

        Ok(Self {
            workers: args.workers,
            queue_capacity: args.queue_capacity,
            batch_sizes: (args.start..=args.end).step_by(args.step).collect(),
            workload: Workload::sleep(
                Duration::from_millis(args.min_sleep_ms),
                Duration::from_millis(args.max_sleep_ms),
            ),
            plot_path: args.plot_path,
            report: args.report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-backed flags are pinned unless the test sets them.
    const PINNED: &[(&str, &str)] = &[
        ("--workers", "10"),
        ("--queue-capacity", "1000"),
        ("--plot-path", "latency_comparison.svg"),
    ];

    fn parse(args: &[&str]) -> anyhow::Result<CompareConfig> {
        let mut argv = vec!["latpool-compare"];
        argv.extend_from_slice(args);
        for &(flag, value) in PINNED {
            if !args.contains(&flag) {
                argv.extend([flag, value]);
            }
        }
        CompareConfig::try_from(CompareArgs::try_parse_from(argv)?)
    }

    #[test]
    fn default_sweep() {
        let config = parse(&[]).unwrap();
        assert_eq!(
            config.batch_sizes,
            vec![100, 200, 300, 400, 500, 600, 700, 800, 900, 1_000]
        );
        assert_eq!(config.report, None);
        assert_eq!(config.pool_config().max_batch_size, 1_000);
    }

    #[test]
    fn custom_sweep_includes_start_and_stops_before_overshooting() {
        let config = parse(&["--start", "5", "--end", "20", "--step", "7"]).unwrap();
        assert_eq!(config.batch_sizes, vec![5, 12, 19]);
    }

    #[test]
    fn rejects_bad_ranges() {
        assert!(parse(&["--step", "0"]).is_err());
        assert!(parse(&["--start", "0"]).is_err());
        assert!(parse(&["--start", "10", "--end", "5"]).is_err());
        assert!(parse(&["--min-sleep-ms", "9", "--max-sleep-ms", "3"]).is_err());
        assert!(parse(&["--workers", "0"]).is_err());
        let too_big = (MAX_BATCH_SIZE_LIMIT + 1).to_string();
        assert!(parse(&["--end", &too_big]).is_err());
    }
}
