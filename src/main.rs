// src/main.rs

use mirrorsync::config::load_and_validate;
use mirrorsync::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("mirrorsync error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    // Config comes first: it may name the log level and log file.
    let cfg = load_and_validate(&args.config)?;
    logging::init_logging(args.log_level, Some(cfg.log_level), cfg.log_file.as_deref())?;
    run(args, cfg).await
}
