//! pycodeadvisor CLI entry point.

use clap::Parser;
use pycodeadvisor::cli::{self, Cli, Commands, EXIT_ERROR};
use pycodeadvisor::Settings;

fn main() {
    let cli = Cli::parse();

    // init must work without a loadable settings file
    let result = if let Commands::Init(args) = &cli.command {
        cli::init_tracing(&Settings::default(), cli.verbose);
        cli::run_init(args)
    } else {
        let (settings, source) = match Settings::load(cli.config.as_deref()) {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("Error: invalid settings: {}", e);
                std::process::exit(EXIT_ERROR);
            }
        };
        cli::init_tracing(&settings, cli.verbose);

        match &cli.command {
            Commands::Analyze(args) => cli::run_analyze(args, &settings, source.as_deref()),
            Commands::Chat(args) => cli::run_chat(args, &settings),
            Commands::Validate(args) => cli::run_validate(args),
            Commands::Models => cli::run_models(&settings),
            Commands::Serve(args) => cli::run_serve(args, &settings),
            Commands::Init(args) => cli::run_init(args),
        }
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
