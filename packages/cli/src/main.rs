use clap::Parser;

use repotree_cli::Args;

fn main() {
    let args = Args::parse();

    if let Err(e) = repotree_cli::run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
