use clap::Parser;
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod commands;
mod config;
mod conversation;
mod core;
mod display;
mod functions;
mod input;
mod providers;
mod session;
mod system;
mod utils;

#[cfg(test)]
mod testing;

use crate::app::Application;
use crate::cli::Args;
use crate::config::Config;
use crate::core::error::ChatError;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "chainchat=debug" } else { "chainchat=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), ChatError> {
    dotenv().ok();

    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::load()?;
    let mut app = Application::new(args, config)?;
    app.run().await
}
