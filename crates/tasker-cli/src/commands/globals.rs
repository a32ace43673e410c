//! `tasker global ...`

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use tasker_api::{GlobalVar, TaskerClient};

use crate::cli::{GlobalCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{OutputFormat, print_json, print_rows, print_value};

#[derive(Tabled, Serialize)]
struct GlobalRow {
    name: String,
    value: String,
}

impl From<GlobalVar> for GlobalRow {
    fn from(g: GlobalVar) -> Self {
        Self {
            name: g.name,
            value: g.value,
        }
    }
}

pub async fn handle(
    command: GlobalCommand,
    client: &TaskerClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match command {
        GlobalCommand::List => {
            let rows: Vec<GlobalRow> = client
                .globals(None, false)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            print_rows(global.output, &rows)
        }
        GlobalCommand::Get { name } => {
            let var = client
                .global(&name, true)
                .await?
                .ok_or(CliError::NotFound {
                    kind: "global",
                    name,
                })?;
            show(global.output, &var)
        }
        GlobalCommand::Set { name, value } => {
            let var = client
                .set_global(&name, &Value::String(value), true)
                .await?;
            show(global.output, &var)
        }
    }
}

fn show(format: OutputFormat, var: &GlobalVar) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => print_json(var),
        OutputFormat::Table => match &var.structured {
            Some(structured) => print_value(structured),
            None => {
                println!("{}", var.value);
                Ok(())
            }
        },
    }
}
