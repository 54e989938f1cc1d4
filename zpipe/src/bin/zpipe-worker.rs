//! Start a pool of PULL workers that count incoming messages until killed.

use clap::Parser;
use zpipe::cli::WorkerArgs;
use zpipe::pool::WorkerPool;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = WorkerArgs::parse();
    zpipe::logging::init(&args.log_level);

    let config = args.into_config()?;
    let pool = WorkerPool::spawn(config)?;
    pool.join()?;
    Ok(())
}
