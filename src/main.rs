use angela::cli::{self, Cli};
use angela::logging::{LogConfig, Logger};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_config = if cfg!(debug_assertions) { LogConfig::development() } else { LogConfig::production() };
    let _ = Logger::init(log_config);

    if let Err(err) = cli::run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
