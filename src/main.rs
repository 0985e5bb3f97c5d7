use clap::Parser;
use phyloworld::app::{AppConfig, PhyloWorldApp};

fn main() {
    let _ = env_logger::builder().format_timestamp(None).try_init();

    let config = AppConfig::parse();
    if let Err(err) = PhyloWorldApp::run(&config) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
