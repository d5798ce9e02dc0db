mod cli;
mod progress;

use clap::Parser;
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = cli::Cli::parse();

    // Initialize logger
    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if args.debug {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    if args.version {
        println!("raindump {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    match cli::run(&args) {
        Ok(summary) => {
            println!("Collections: {}", summary.collections_path.display());
            match &summary.bookmarks_path {
                Some(path) => println!("Bookmarks:   {}", path.display()),
                None => println!("Bookmarks:   none found, no file written"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
