use std::io;
use std::process::exit;

use clap::Parser;
use log::{error, info};

use pgrep::cli::{Options, RunPlan};
use pgrep::{Result, ThreadPool};

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    // Exits with usage before any pool exists if the arguments are bad.
    let options = Options::parse();

    if let Err(e) = run(options) {
        error!("{}", e);
        exit(1);
    }
}

fn run(options: Options) -> Result<()> {
    info!("pgrep {}", env!("CARGO_PKG_VERSION"));

    let pool = ThreadPool::new(options.worker_count())?;
    info!("Started {} workers", pool.worker_count());
    info!("Searching {:?} for {:?}", options.root, options.pattern);

    let plan = RunPlan {
        workers: pool.worker_count(),
        options,
    };
    let (_, rendered) = pool.submit(move || serde_json::to_string_pretty(&plan));
    let rendered = rendered.wait()?.map_err(io::Error::from)?;
    println!("{}", rendered);

    pool.shutdown();
    Ok(())
}
