//! Synthetic workloads executed by the workers.
//!
//! None of these do useful work. They stand in for a request handler so that
//! the pool has something to time: a CPU-bound primality sweep, an I/O-like
//! randomized sleep, or a caller-supplied blocking closure.

use crate::task::TaskId;
use core::{fmt, time::Duration};
use rand::Rng;
use std::sync::Arc;

/// Number of random candidates tested per task by the default CPU workload.
pub const DEFAULT_PRIME_ITERATIONS: usize = 10_000;

/// Exclusive upper bound of the random candidates.
pub const DEFAULT_PRIME_UPPER_BOUND: u64 = 100_000;

/// Blocking closure run on Tokio's blocking pool. Receives the task id.
pub type CustomWork = Arc<dyn Fn(TaskId) + Send + Sync>;

/// The unit of synthetic work every task performs.
#[derive(Clone)]
pub enum Workload {
    /// Trial-division primality tests over `iterations` random integers in
    /// `0..upper_bound`. Runs on the blocking pool.
    Primes { iterations: usize, upper_bound: u64 },

    /// Sleeps for a uniformly random duration in `min..=max`.
    Sleep { min: Duration, max: Duration },

    /// Runs an arbitrary blocking closure.
    Custom(CustomWork),
}

impl Workload {
    pub const fn primes(iterations: usize, upper_bound: u64) -> Self {
        Self::Primes {
            iterations,
            upper_bound,
        }
    }

    pub const fn sleep(min: Duration, max: Duration) -> Self {
        Self::Sleep { min, max }
    }

    pub fn custom<F>(work: F) -> Self
    where
        F: Fn(TaskId) + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(work))
    }

    /// Performs the workload once for `task`.
    ///
    /// # Errors
    ///
    /// Returns the failure cause if the blocking work panicked or was
    /// cancelled by the runtime.
    pub async fn execute(&self, task: TaskId) -> Result<(), String> {
        match self {
            Self::Primes {
                iterations,
                upper_bound,
            } => {
                let (iterations, upper_bound) = (*iterations, *upper_bound);
                tokio::task::spawn_blocking(move || {
                    core::hint::black_box(heavy_computation(iterations, upper_bound));
                })
                .await
                .map_err(join_error_cause)
            }
            Self::Sleep { min, max } => {
                tokio::time::sleep(random_between(*min, *max)).await;
                Ok(())
            }
            Self::Custom(work) => {
                let work = Arc::clone(work);
                tokio::task::spawn_blocking(move || work(task))
                    .await
                    .map_err(join_error_cause)
            }
        }
    }
}

impl Default for Workload {
    fn default() -> Self {
        Self::primes(DEFAULT_PRIME_ITERATIONS, DEFAULT_PRIME_UPPER_BOUND)
    }
}

impl fmt::Debug for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primes {
                iterations,
                upper_bound,
            } => f
                .debug_struct("Primes")
                .field("iterations", iterations)
                .field("upper_bound", upper_bound)
                .finish(),
            Self::Sleep { min, max } => f
                .debug_struct("Sleep")
                .field("min", min)
                .field("max", max)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Trial division. Deliberately naive.
pub fn is_prime(n: u64) -> bool {
    if n <= 1 {
        return false;
    }
    let mut i = 2;
    while i <= n / i {
        if n % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}

/// Tests `iterations` random candidates below `upper_bound` for primality and
/// returns how many were prime.
pub fn heavy_computation(iterations: usize, upper_bound: u64) -> usize {
    if upper_bound == 0 {
        return 0;
    }
    let mut rng = rand::rng();
    (0..iterations)
        .filter(|_| is_prime(rng.random_range(0..upper_bound)))
        .count()
}

fn random_between(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    rand::rng().random_range(min..=max)
}

fn join_error_cause(err: tokio::task::JoinError) -> String {
    if err.is_panic() {
        let payload = err.into_panic();
        if let Some(msg) = payload.downcast_ref::<&str>() {
            return format!("worker panicked: {msg}");
        }
        if let Some(msg) = payload.downcast_ref::<String>() {
            return format!("worker panicked: {msg}");
        }
        return "worker panicked".to_string();
    }
    format!("worker task cancelled: {err}")
}
