use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use latpool::{
    DEFAULT_MAX_BATCH_SIZE, DEFAULT_NUM_WORKERS, DEFAULT_QUEUE_CAPACITY, MAX_BATCH_SIZE_LIMIT,
    PoolConfig, Workload,
};
use std::path::PathBuf;

/// Runtime configuration for the `latpool-server` binary.
///
/// All values are parsed from CLI arguments or environment variables. The
/// defaults reproduce the classic demo: ten workers, a queue of 200, and ten
/// thousand primality checks per task.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "latpool-server",
    version,
    about = "An HTTP endpoint that times synthetic work through a worker pool"
)]
pub struct CliArgs {
    /// Number of long-lived workers draining the shared task queue.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = DEFAULT_NUM_WORKERS)]
    pub num_workers: usize,

    /// Capacity of the shared task queue.
    ///
    /// Requests for more tasks than this still succeed; dispatch simply waits
    /// for workers to free up space.
    ///
    /// Environment variable: `QUEUE_CAPACITY`
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Largest `num` accepted by `/process`. Larger requests get a 400.
    ///
    /// Environment variable: `MAX_BATCH_SIZE`
    #[arg(long, env = "MAX_BATCH_SIZE", default_value_t = DEFAULT_MAX_BATCH_SIZE)]
    pub max_batch_size: usize,

    /// Upper bound, in seconds, on how long a single request may wait for its
    /// batch. Unset means wait indefinitely.
    ///
    /// Environment variable: `BATCH_TIMEOUT_SECS`
    #[arg(long, env = "BATCH_TIMEOUT_SECS")]
    pub batch_timeout_secs: Option<u64>,

    /// Seconds to let in-flight batches finish once shutdown begins.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT_SECS`
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value_t = 3)]
    pub shutdown_timeout_secs: u64,

    /// Random candidates tested for primality per task.
    ///
    /// Environment variable: `PRIME_ITERATIONS`
    #[arg(long, env = "PRIME_ITERATIONS", default_value_t = latpool::workload::DEFAULT_PRIME_ITERATIONS)]
    pub prime_iterations: usize,

    /// Exclusive upper bound of the random candidates.
    ///
    /// Environment variable: `PRIME_UPPER_BOUND`
    #[arg(long, env = "PRIME_UPPER_BOUND", default_value_t = latpool::workload::DEFAULT_PRIME_UPPER_BOUND)]
    pub prime_upper_bound: u64,

    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8082"))]
    pub server_addr: String,

    /// Where the processing-time chart is written after each request.
    ///
    /// Environment variable: `PLOT_PATH`
    #[arg(long, env = "PLOT_PATH", default_value = "processing_times.svg")]
    pub plot_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub num_workers: usize,
    pub queue_capacity: usize,
    pub max_batch_size: usize,
    pub batch_timeout: Option<Duration>,
    pub shutdown_timeout: Duration,
    pub workload: Workload,
    pub server_addr: String,
    pub plot_path: PathBuf,
}

impl ServerConfig {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.workload.clone())
            .with_num_workers(self.num_workers)
            .with_queue_capacity(self.queue_capacity)
            .with_max_batch_size(self.max_batch_size)
            .with_shutdown_timeout(self.shutdown_timeout)
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        if args.queue_capacity == 0 {
            bail!("QUEUE_CAPACITY must be greater than 0");
        }

        if args.max_batch_size == 0 || args.max_batch_size > MAX_BATCH_SIZE_LIMIT {
            bail!(
                "MAX_BATCH_SIZE must be between 1 and {MAX_BATCH_SIZE_LIMIT}, got {}",
                args.max_batch_size
            );
        }

        if args.prime_upper_bound < 2 {
            bail!(
                "PRIME_UPPER_BOUND ({}) leaves no candidates that could be prime",
                args.prime_upper_bound
            );
        }

        if args.batch_timeout_secs == Some(0) {
            bail!("BATCH_TIMEOUT_SECS must be greater than 0 when set");
        }

        Ok(Self {
            num_workers: args.num_workers,
            queue_capacity: args.queue_capacity,
            max_batch_size: args.max_batch_size,
            batch_timeout: args.batch_timeout_secs.map(Duration::from_secs),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
            workload: Workload::primes(args.prime_iterations, args.prime_upper_bound),
            server_addr: args.server_addr,
            plot_path: args.plot_path,
        })
    }
}
