//! `tasker import`

use tasker_api::TaskerClient;

use crate::cli::ImportArgs;
use crate::error::CliError;
use crate::output::print_json;

pub async fn handle(args: ImportArgs, client: &TaskerClient) -> Result<(), CliError> {
    let xml = std::fs::read_to_string(&args.path)?;
    let reply = client.import_task(&xml, args.name.as_deref()).await?;
    print_json(&reply)
}
