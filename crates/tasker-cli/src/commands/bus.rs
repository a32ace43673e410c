//! `tasker commands ...` -- the fired-command bus.

use tasker_api::TaskerClient;

use crate::cli::CommandsCommand;
use crate::error::CliError;

pub async fn handle(command: CommandsCommand, client: &TaskerClient) -> Result<(), CliError> {
    match command {
        CommandsCommand::Drain { keep } => {
            let commands = client.commands(!keep).await?;
            for command in commands {
                println!("{command}");
            }
            Ok(())
        }
        CommandsCommand::Send { commands } => {
            let count = client.send_commands(&commands).await?;
            println!("accepted {count}");
            Ok(())
        }
    }
}
