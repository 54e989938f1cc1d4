//! Bind a PUSH socket and send `--count` messages (or replay a directory).

use clap::Parser;
use zpipe::cli::SenderArgs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = SenderArgs::parse();
    zpipe::logging::init(&args.log_level);

    let config = args.into_config()?;
    let runtime = compio::runtime::Runtime::new()?;
    runtime.block_on(zpipe::sender::run(config))?;
    Ok(())
}
