//! Vanity - CLI Entry Point
//!
//! Accepts the classic Go-style single-dash flags as well as standard
//! double-dash ones:
//! - `-http :80` / `--http :80`
//! - `-resolver 8.8.8.8:53` / `--resolver 8.8.8.8:53`
//! - `-refresh 15m` / `--refresh 15m`

// Use mimalloc as global allocator for better p99 latency
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vanity::{Config, Server, VERSION};

/// Config file read when `-config` is not given; may be absent
const DEFAULT_CONFIG: &str = "vanity.yaml";

/// Go-style long options that use single dash (Go's flag package behavior)
/// These need to be converted to double-dash for clap compatibility
const GO_STYLE_LONG_OPTIONS: &[&str] = &[
    "-http",
    "-resolver",
    "-refresh",
    "-config",
    "-log-level",
    "-test",
];

/// Convert Go-style CLI arguments to standard double-dash format
///
/// `-resolver=1.1.1.1:53` is handled as well as `-resolver 1.1.1.1:53`.
fn normalize_args<I: IntoIterator<Item = String>>(args: I) -> Vec<String> {
    args.into_iter()
        .map(|arg| {
            if arg.starts_with('-') && !arg.starts_with("--") {
                let name = arg.split('=').next().unwrap_or(&arg);
                if GO_STYLE_LONG_OPTIONS.contains(&name) {
                    return format!("-{}", arg);
                }
            }
            arg
        })
        .collect()
}

#[derive(Parser, Debug)]
#[command(name = "vanity")]
#[command(version = VERSION)]
#[command(about = "Serves go-import meta redirects for vanity domains")]
struct Args {
    /// Path to configuration file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// HTTP listen address (overrides config)
    #[arg(long = "http")]
    http: Option<String>,

    /// DNS resolver address (overrides config)
    #[arg(long = "resolver")]
    resolver: Option<String>,

    /// Refresh period, e.g. 15m (overrides config)
    #[arg(long = "refresh", value_parser = humantime::parse_duration)]
    refresh: Option<Duration>,

    /// Log level (overrides config)
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Test configuration and exit
    #[arg(short = 't', long = "test")]
    test: bool,
}

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get().max(2))
        .enable_all()
        .thread_name("vanity-worker")
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    let args = Args::parse_from(normalize_args(std::env::args()));

    // Load configuration; only an explicitly named file has to exist
    let mut config = match &args.config {
        Some(path) => Config::load_async(path).await?,
        None if std::path::Path::new(DEFAULT_CONFIG).exists() => {
            Config::load_async(DEFAULT_CONFIG).await?
        }
        None => Config::default(),
    };

    // Apply CLI overrides
    if let Some(http) = args.http {
        config.http = http;
    }
    if let Some(resolver) = args.resolver {
        config.dns.resolver = resolver;
    }
    if let Some(refresh) = args.refresh {
        config.dns.refresh = refresh;
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level);
    }

    // Initialize logging
    let level = config.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("vanity={}", level).parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Vanity v{}", VERSION);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    // Test mode
    if args.test {
        info!("Configuration test passed");
        return Ok(());
    }

    let server = match Server::new(config).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
