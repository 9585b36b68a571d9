//! Carto CLI - multi-language code knowledge graph extractor

use clap::Parser;

fn main() {
    carto_cli::logging::init();
    let cli = carto_cli::Cli::parse();
    std::process::exit(carto_cli::run(cli));
}
