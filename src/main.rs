use cidr_subnet_calc::cli::{self, Cli};
use cidr_subnet_calc::config::Config;
use cidr_subnet_calc::logging;
use clap::Parser;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    logging::init(&config.log_config)?;
    log::info!("#Start main()");

    let cli = Cli::parse();
    cli::run(&cli, &config)
}
