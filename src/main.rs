use clap::Parser;

use photobooth::cli::{self, Args};
use photobooth::config::Config;

#[tokio::main]
async fn main() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = cli::dispatch(args, &config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
