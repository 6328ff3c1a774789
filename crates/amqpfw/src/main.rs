mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    let profile_flag = cli.global.profile.clone();

    if let Err(err) = run(cli).await {
        // Name the profile whose credentials were rejected
        let profile = profile_flag
            .or_else(|| config::load_config_or_default().default_profile)
            .unwrap_or_else(|| "default".into());
        let err = err.for_profile(&profile);
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "amqpfw", &mut std::io::stdout());
            Ok(())
        }

        Command::Firewall(args) => {
            tracing::debug!(command = ?args.command, "dispatching command");
            commands::firewall::handle(args, &cli.global).await
        }
    }
}
