mod cli;
mod commands;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use tasker_core::LinkConfig;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
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
        // Shell completions need no device connection.
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "tasker", &mut std::io::stdout());
            Ok(())
        }

        command => {
            let link = build_link_config(&cli.global)?;
            tracing::debug!(host = %link.host, port = link.port, "dispatching command");
            commands::dispatch(command, link, &cli.global).await
        }
    }
}

/// Build a `LinkConfig` from the config file profile plus CLI overrides.
fn build_link_config(global: &cli::GlobalOpts) -> Result<LinkConfig, CliError> {
    let cfg = tasker_config::load_config_or_default();
    let profile_name = tasker_config::active_profile_name(global.profile.as_deref(), &cfg);

    let mut link = match tasker_config::resolve_profile(&cfg, &profile_name) {
        Ok(link) => link,
        // No profile on disk is fine as long as --host was given.
        Err(tasker_config::ConfigError::UnknownProfile { .. }) => match &global.host {
            Some(host) => LinkConfig::new(host.clone()),
            None => {
                return Err(CliError::NoDevice {
                    config_path: tasker_config::config_path().display().to_string(),
                });
            }
        },
        Err(e) => return Err(e.into()),
    };

    if let Some(ref host) = global.host {
        link.host.clone_from(host);
    }
    if let Some(port) = global.port {
        link.port = port;
    }
    if let Some(ref token) = global.token {
        link.api_key = Some(SecretString::from(token.clone()));
    }
    if let Some(secs) = global.timeout {
        link.request_timeout = Duration::from_secs(secs);
    }

    link.validate()?;
    Ok(link)
}
