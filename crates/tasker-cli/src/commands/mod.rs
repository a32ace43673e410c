//! Command handlers, one module per resource.

pub mod bus;
pub mod files;
pub mod globals;
pub mod import;
pub mod profiles;
pub mod scenes;
pub mod stats;
pub mod tasks;
pub mod watch;

use tasker_api::{TaskerClient, TransportConfig};
use tasker_core::LinkConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Build a one-shot API client from a resolved link config.
pub fn client(link: &LinkConfig) -> Result<TaskerClient, CliError> {
    let transport = TransportConfig {
        timeout: link.effective_timeout(),
    };
    TaskerClient::new(&link.host, link.port, link.api_key.clone(), &transport)
        .map_err(CliError::from)
}

/// Route a parsed command to its handler.
pub async fn dispatch(
    command: Command,
    link: LinkConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match command {
        Command::Auth(args) => {
            let client = client(&link)?;
            client.authenticate(args.refresh).await?;
            match client.api_key() {
                Some(key) => {
                    use secrecy::ExposeSecret;
                    println!("{}", key.expose_secret());
                }
                None => println!("(no token issued)"),
            }
            Ok(())
        }
        Command::Stats => stats::handle(&client(&link)?, global).await,
        Command::Profile(cmd) => profiles::handle(cmd, &client(&link)?, global).await,
        Command::Task(cmd) => tasks::handle(cmd, &client(&link)?, global).await,
        Command::Scene(cmd) => scenes::handle(cmd, &client(&link)?, global).await,
        Command::Global(cmd) => globals::handle(cmd, &client(&link)?, global).await,
        Command::Commands(cmd) => bus::handle(cmd, &client(&link)?).await,
        Command::Import(args) => import::handle(args, &client(&link)?).await,
        Command::File(cmd) => files::handle(cmd, &client(&link)?).await,
        Command::Watch(args) => watch::handle(args, link).await,
        // Completions are handled in main (no connection needed).
        Command::Completions(_) => Ok(()),
    }
}
