use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_logger::{log_info, AsyncWriter, Dispatch, LogError, LoggerConfig};
use tracing_subscriber::EnvFilter;

const BATCH: usize = 1_000_000;
const ROUNDS: usize = 10;

#[cfg(target_os = "linux")]
fn limit_address_space() {
    use nix::sys::resource::{setrlimit, Resource};

    const ONE_GB: u64 = 1000 * 1024 * 1024;
    if let Err(e) = setrlimit(Resource::RLIMIT_AS, 2 * ONE_GB, 2 * ONE_GB) {
        tracing::warn!("failed to limit address space: {}", e);
    }
}

#[cfg(not(target_os = "linux"))]
fn limit_address_space() {}

fn bench(long_log: bool) {
    let long_text = format!("{} ", "X".repeat(3000));
    let padding = if long_log { long_text.as_str() } else { " " };

    let mut count: u64 = 0;
    for _ in 0..ROUNDS {
        let start = Instant::now();
        for _ in 0..BATCH {
            log_info!("Hello 0123456789", " abcdefghijklmnopqrstuvwxyz ", padding, count);
            count += 1;
        }
        println!("{} records in {:?}", BATCH, start.elapsed());
    }
}

fn main() -> Result<(), LogError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    limit_address_space();
    println!("pid = {}", std::process::id());

    let mut config = LoggerConfig::from_env()?;
    if env::var_os("ASYNC_LOGGER_BASENAME").is_none() {
        if let Some(name) = env::args()
            .next()
            .as_deref()
            .and_then(|arg| Path::new(arg).file_name())
            .and_then(|name| name.to_str())
        {
            config.basename = name.to_string();
        }
    }

    let dispatch = Dispatch::global();
    dispatch.apply_config(&config);

    let writer = Arc::new(AsyncWriter::from_config(&config));
    writer.start()?;
    AsyncWriter::install(&writer, dispatch);

    bench(env::args().len() > 1);

    writer.stop()?;
    dispatch.reset_hooks();
    println!("Done");
    Ok(())
}
