//! `tasker file ...`

use std::io::Write;

use tasker_api::TaskerClient;

use crate::cli::FileCommand;
use crate::error::CliError;

pub async fn handle(command: FileCommand, client: &TaskerClient) -> Result<(), CliError> {
    match command {
        FileCommand::Get { path, out } => {
            let (bytes, _charset) = client.fetch_file(&path).await?;
            match out {
                Some(local) => {
                    std::fs::write(&local, &bytes)?;
                    eprintln!("wrote {} bytes to {}", bytes.len(), local.display());
                }
                None => std::io::stdout().write_all(&bytes)?,
            }
            Ok(())
        }
        FileCommand::Rm { path } => {
            client.delete_file(&path).await?;
            Ok(())
        }
    }
}
