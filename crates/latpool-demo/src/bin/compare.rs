use clap::Parser;
use latpool::WorkerPool;
use latpool_demo::{
    compare::{
        config::{CompareArgs, CompareConfig},
        sweep::{run_sweep, write_report},
    },
    plot::plot_latency_comparison,
    telemetry::init_telemetry,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = CompareArgs::parse();
    let config = CompareConfig::try_from(args)?;

    init_telemetry()?;

    tracing::info!(
        "Comparing sequential execution with {} workers over batch sizes {:?}",
        config.workers,
        config.batch_sizes
    );

    let pool = WorkerPool::new(config.pool_config())?;
    let points = run_sweep(&pool, &config.workload, &config.batch_sizes).await?;
    pool.shutdown().await?;

    plot_latency_comparison(&points, &config.plot_path)?;
    println!("Plot saved to {}", config.plot_path.display());

    if let Some(report) = &config.report {
        write_report(&points, report)?;
        println!("Report saved to {}", report.display());
    }

    Ok(())
}
