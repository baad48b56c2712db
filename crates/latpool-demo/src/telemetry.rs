//! Console logging shared by both binaries.
//!
//! Events are printed through `tracing_subscriber::fmt`, filtered by
//! `RUST_LOG` (default `info`). Per-task worker lines are emitted at `debug`,
//! so run with `RUST_LOG=debug` to see which worker handled which task.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true),
        )
        .try_init()?;

    Ok(())
}
