use clap::Parser;
use presences_cli::cli_args::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = presences_cli::dispatch(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
