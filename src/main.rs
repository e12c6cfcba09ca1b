use anyhow::{Context, Error};
use clap::Parser;
use log::info;

use fqoverlap::options::Options;
use fqoverlap::pipeline::run;

fn main() -> Result<(), Error> {
    let opts = Options::parse();

    env_logger::Builder::new()
        .filter_level(opts.log_level())
        .init();

    let args: Vec<String> = std::env::args().collect();
    info!("command: {}", args.join(" "));
    info!(
        "{}",
        serde_json::to_string(&opts).context("can't serialize options")?
    );

    run(&opts.to_run_config())?;
    Ok(())
}
