use std::fmt::Display;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use db_testbed::bootstrap;
use db_testbed::BootstrapConfig;
use db_testbed::CaseDiscovery;
use db_testbed::EmptySuite;
use db_testbed::Error;
use db_testbed::ProcessEngine;
use db_testbed::Result;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[derive(Parser, Debug)]
#[command(author, version, about = "Bootstrap an ephemeral test database instance and prepare the test suite against it", long_about = None)]
struct Cli {
    /// Database cluster directory (default ~/.dbtestbed)
    #[arg(short = 'D', long = "data-dir")]
    data_dir: Option<PathBuf>,

    /// Directory to start test discovery from
    #[arg(short = 's', long = "start-directory")]
    start_directory: Option<PathBuf>,

    /// Number of parallel setup jobs (defaults to CPU count)
    #[arg(short = 'j', long = "jobs")]
    jobs: Option<usize>,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => die(e),
    };

    let _guard = match init_observability(&config.cluster.log_dir) {
        Ok(guard) => guard,
        Err(e) => die(e),
    };

    println!(
        "Bootstrapping test database instance in {}...",
        config.cluster.data_dir.display()
    );

    // Test-case discovery is supplied by the embedding harness; the
    // standalone binary bootstraps an empty, ready-to-populate instance.
    let discovery = EmptySuite;
    let cases = match discovery.discover(&config.discovery.start_dir) {
        Ok(cases) => cases,
        Err(e) => die(e),
    };

    let engine = ProcessEngine::new(config.engine.clone(), config.cluster.listen_address);

    match bootstrap(config, engine, cases).await {
        Ok(summary) => {
            println!(
                "Initialized and populated test database instance in {} ({} cases, {:.2?})",
                summary.data_dir.display(),
                summary.cases_run,
                summary.elapsed
            );
        }
        Err(e) => {
            if let Error::Setup(ref aggregate) = e {
                for failure in &aggregate.failures {
                    eprintln!("  {}: {}", failure.id, failure.cause);
                }
            }
            die(e);
        }
    }
}

fn die(msg: impl Display) -> ! {
    error!("bootstrap failed: {msg}");
    eprintln!("FATAL: {msg}");
    std::process::exit(1);
}

fn load_config(cli: &Cli) -> Result<BootstrapConfig> {
    let mut config = BootstrapConfig::new()?;

    // CLI flags take precedence over config file and environment.
    if let Some(data_dir) = &cli.data_dir {
        config.cluster.data_dir = data_dir.clone();
    }
    if let Some(start_dir) = &cli.start_directory {
        config.discovery.start_dir = start_dir.clone();
    }
    if let Some(jobs) = cli.jobs {
        config.dispatch.jobs = jobs;
    }

    config.validate()
}

fn init_observability(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("bootstrap.log"))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();

    info!("observability initialized");
    Ok(guard)
}
